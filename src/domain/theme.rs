#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ThemePalette {
    #[default]
    Ember,
    Ocean,
    Forest,
    Rose,
    Violet,
    Amber,
    Slate,
    Nord,
    Mono,
}

impl ThemePalette {
    pub const ALL: [ThemePalette; 9] = [
        Self::Ember,
        Self::Ocean,
        Self::Forest,
        Self::Rose,
        Self::Violet,
        Self::Amber,
        Self::Slate,
        Self::Nord,
        Self::Mono,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|palette| palette.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ember => "ember",
            Self::Ocean => "ocean",
            Self::Forest => "forest",
            Self::Rose => "rose",
            Self::Violet => "violet",
            Self::Amber => "amber",
            Self::Slate => "slate",
            Self::Nord => "nord",
            Self::Mono => "mono",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|palette| *palette == self)
            .unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ThemeState {
    pub mode: ThemeMode,
    pub palette: ThemePalette,
}

impl ThemeState {
    /// Stored strings that no longer name a variant fall back to the default.
    pub fn from_stored(mode: Option<&str>, palette: Option<&str>) -> Self {
        Self {
            mode: mode.and_then(ThemeMode::parse).unwrap_or_default(),
            palette: palette.and_then(ThemePalette::parse).unwrap_or_default(),
        }
    }

    pub fn with_mode_toggled(self) -> Self {
        Self {
            mode: self.mode.toggle(),
            ..self
        }
    }

    pub fn with_next_palette(self) -> Self {
        Self {
            palette: self.palette.next(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_names_round_trip() {
        for palette in ThemePalette::ALL {
            assert_eq!(ThemePalette::parse(palette.as_str()), Some(palette));
        }
        assert_eq!(ThemePalette::parse(" NORD "), Some(ThemePalette::Nord));
        assert_eq!(ThemePalette::parse("neon"), None);
    }

    #[test]
    fn next_palette_cycles_through_all_nine() {
        let mut palette = ThemePalette::default();
        let mut seen = Vec::new();
        for _ in 0..ThemePalette::ALL.len() {
            seen.push(palette);
            palette = palette.next();
        }
        assert_eq!(palette, ThemePalette::default());
        assert_eq!(seen, ThemePalette::ALL.to_vec());
    }

    #[test]
    fn stored_values_fall_back_to_defaults() {
        let theme = ThemeState::from_stored(Some("light"), Some("purple"));
        assert_eq!(theme.mode, ThemeMode::Light);
        assert_eq!(theme.palette, ThemePalette::Ember);

        assert_eq!(ThemeState::from_stored(None, None), ThemeState::default());
    }

    #[test]
    fn toggling_mode_keeps_palette() {
        let theme = ThemeState {
            mode: ThemeMode::Dark,
            palette: ThemePalette::Forest,
        };
        let toggled = theme.with_mode_toggled();
        assert_eq!(toggled.mode, ThemeMode::Light);
        assert_eq!(toggled.palette, ThemePalette::Forest);
        assert_eq!(toggled.with_mode_toggled(), theme);
    }
}
