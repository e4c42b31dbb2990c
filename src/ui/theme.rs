use crate::domain::{BadgeTone, RowTone, ThemeMode, ThemePalette, ThemeState, TileTone};
use ratatui::style::{Color, Modifier, Style};

/// Resolved colors for one mode + palette pair. Surfaces come from the mode,
/// the accent from the palette; state colors are shared by every palette.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Palette {
    pub bg: Color,
    pub surface: Color,
    pub bar_bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub dim: Color,
    pub border: Color,
    pub accent: Color,
    pub accent_bg: Color,
    pub success: Color,
    pub error: Color,
    pub waiting: Color,
    pub working: Color,
    pub thinking: Color,
    pub idle: Color,
}

struct Surfaces {
    bg: Color,
    surface: Color,
    bar_bg: Color,
    fg: Color,
    muted: Color,
    dim: Color,
    border: Color,
}

const DARK: Surfaces = Surfaces {
    bg: Color::Rgb(11, 13, 16),
    surface: Color::Rgb(17, 21, 27),
    bar_bg: Color::Rgb(14, 18, 24),
    fg: Color::Rgb(229, 231, 235),
    muted: Color::Rgb(156, 163, 175),
    dim: Color::Rgb(107, 114, 128),
    border: Color::Rgb(55, 65, 81),
};

const LIGHT: Surfaces = Surfaces {
    bg: Color::Rgb(250, 250, 249),
    surface: Color::Rgb(241, 241, 239),
    bar_bg: Color::Rgb(231, 229, 228),
    fg: Color::Rgb(28, 25, 23),
    muted: Color::Rgb(87, 83, 78),
    dim: Color::Rgb(120, 113, 108),
    border: Color::Rgb(214, 211, 209),
};

/// (accent on dark, accent on light)
fn accent(palette: ThemePalette) -> (Color, Color) {
    match palette {
        ThemePalette::Ember => (Color::Rgb(255, 159, 26), Color::Rgb(194, 65, 12)),
        ThemePalette::Ocean => (Color::Rgb(56, 189, 248), Color::Rgb(3, 105, 161)),
        ThemePalette::Forest => (Color::Rgb(74, 222, 128), Color::Rgb(21, 128, 61)),
        ThemePalette::Rose => (Color::Rgb(251, 113, 133), Color::Rgb(190, 18, 60)),
        ThemePalette::Violet => (Color::Rgb(167, 139, 250), Color::Rgb(109, 40, 217)),
        ThemePalette::Amber => (Color::Rgb(251, 191, 36), Color::Rgb(180, 83, 9)),
        ThemePalette::Slate => (Color::Rgb(148, 163, 184), Color::Rgb(51, 65, 85)),
        ThemePalette::Nord => (Color::Rgb(136, 192, 208), Color::Rgb(94, 129, 172)),
        ThemePalette::Mono => (Color::Rgb(229, 231, 235), Color::Rgb(23, 23, 23)),
    }
}

fn tint(color: Color, over: Color) -> Color {
    match (color, over) {
        (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) => Color::Rgb(
            ((r as u16 + 4 * br as u16) / 5) as u8,
            ((g as u16 + 4 * bg as u16) / 5) as u8,
            ((b as u16 + 4 * bb as u16) / 5) as u8,
        ),
        (color, _) => color,
    }
}

impl Palette {
    pub fn resolve(theme: ThemeState) -> Self {
        let (dark_accent, light_accent) = accent(theme.palette);
        let (surfaces, accent) = match theme.mode {
            ThemeMode::Dark => (DARK, dark_accent),
            ThemeMode::Light => (LIGHT, light_accent),
        };
        let dark = theme.mode == ThemeMode::Dark;

        Self {
            bg: surfaces.bg,
            surface: surfaces.surface,
            bar_bg: surfaces.bar_bg,
            fg: surfaces.fg,
            muted: surfaces.muted,
            dim: surfaces.dim,
            border: surfaces.border,
            accent,
            accent_bg: tint(accent, surfaces.bg),
            success: if dark {
                Color::Rgb(134, 239, 172)
            } else {
                Color::Rgb(22, 163, 74)
            },
            error: if dark {
                Color::Rgb(248, 113, 113)
            } else {
                Color::Rgb(220, 38, 38)
            },
            waiting: if dark {
                Color::Rgb(250, 204, 21)
            } else {
                Color::Rgb(202, 138, 4)
            },
            working: if dark {
                Color::Rgb(96, 165, 250)
            } else {
                Color::Rgb(37, 99, 235)
            },
            thinking: if dark {
                Color::Rgb(192, 132, 252)
            } else {
                Color::Rgb(147, 51, 234)
            },
            idle: surfaces.dim,
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Popups sit on the raised surface color.
    pub fn overlay(&self) -> Style {
        Style::default().fg(self.fg).bg(self.surface)
    }

    pub fn badge(&self, tone: BadgeTone) -> Style {
        let fg = match tone {
            BadgeTone::Waiting => self.waiting,
            BadgeTone::Working => self.working,
            BadgeTone::Thinking => self.thinking,
            BadgeTone::Idle => self.idle,
            BadgeTone::Neutral => self.muted,
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }

    /// Left edge marker of an active tile.
    pub fn tile(&self, tone: TileTone) -> Style {
        let fg = match tone {
            TileTone::Attention => self.waiting,
            TileTone::Busy => self.working,
            TileTone::Pondering => self.thinking,
            TileTone::Resting => self.idle,
            TileTone::Plain => self.border,
        };
        Style::default().fg(fg)
    }

    pub fn row(&self, tone: RowTone) -> Style {
        match tone {
            RowTone::Default => Style::default().fg(self.muted),
            RowTone::Waiting => Style::default().fg(self.fg).bg(tint(self.waiting, self.bg)),
            RowTone::Idle => Style::default().fg(self.muted),
            RowTone::Active => Style::default().fg(self.fg),
        }
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .bg(self.accent_bg)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_palette_resolves_in_both_modes() {
        for palette in ThemePalette::ALL {
            let dark = Palette::resolve(ThemeState {
                mode: ThemeMode::Dark,
                palette,
            });
            let light = Palette::resolve(ThemeState {
                mode: ThemeMode::Light,
                palette,
            });
            assert_ne!(dark.bg, light.bg);
            assert_ne!(dark.accent, dark.bg);
            assert_ne!(light.accent, light.bg);
        }
    }

    #[test]
    fn waiting_rows_stand_out() {
        let palette = Palette::resolve(ThemeState::default());
        assert_ne!(palette.row(RowTone::Waiting), palette.row(RowTone::Default));
        assert_ne!(
            palette.badge(BadgeTone::Waiting),
            palette.badge(BadgeTone::Neutral)
        );
    }
}
