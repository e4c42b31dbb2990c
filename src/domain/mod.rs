mod classify;
mod connectivity;
mod dashboard;
mod filter;
mod group;
mod parse;
mod split;
mod star;
mod theme;
mod types;
mod version;

pub use classify::*;
pub use connectivity::*;
pub use dashboard::*;
pub use filter::*;
pub use group::*;
pub use parse::*;
pub use split::*;
pub use star::*;
pub use theme::*;
pub use types::*;
pub use version::*;
