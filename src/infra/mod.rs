mod api;
mod config;
mod preferences;
mod stars;
mod worker;

pub use api::*;
pub use config::*;
pub use preferences::*;
pub use stars::*;
pub use worker::*;
