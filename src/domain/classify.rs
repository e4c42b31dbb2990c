use crate::domain::SessionState;
use serde::Serialize;

/// Style tags serialize to the class names scripts and themes key on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum BadgeTone {
    #[serde(rename = "badge-waiting")]
    Waiting,
    #[serde(rename = "badge-working")]
    Working,
    #[serde(rename = "badge-thinking")]
    Thinking,
    #[serde(rename = "badge-idle")]
    Idle,
    #[serde(rename = "badge-neutral")]
    Neutral,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TileTone {
    #[serde(rename = "tile-attention")]
    Attention,
    #[serde(rename = "tile-busy")]
    Busy,
    #[serde(rename = "tile-pondering")]
    Pondering,
    #[serde(rename = "tile-resting")]
    Resting,
    #[serde(rename = "tile-plain")]
    Plain,
}

/// `Default` means no row accent.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum RowTone {
    #[serde(rename = "row-default")]
    Default,
    #[serde(rename = "row-waiting")]
    Waiting,
    #[serde(rename = "row-idle")]
    Idle,
    #[serde(rename = "row-active")]
    Active,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Classification {
    pub label: &'static str,
    pub badge: BadgeTone,
    pub tile: TileTone,
    pub row: RowTone,
}

pub fn classify(state: Option<SessionState>, is_running: bool) -> Classification {
    Classification {
        label: state_label(state),
        badge: badge_tone(state),
        tile: tile_tone(state),
        row: row_tone(state, is_running),
    }
}

pub fn state_label(state: Option<SessionState>) -> &'static str {
    match state {
        Some(SessionState::Waiting) => "⏳ Waiting",
        Some(SessionState::Working) => "⚙ Working",
        Some(SessionState::Thinking) => "💭 Thinking",
        Some(SessionState::Idle) => "💤 Idle",
        Some(SessionState::Unknown) | None => "",
    }
}

pub fn badge_tone(state: Option<SessionState>) -> BadgeTone {
    match state {
        Some(SessionState::Waiting) => BadgeTone::Waiting,
        Some(SessionState::Working) => BadgeTone::Working,
        Some(SessionState::Thinking) => BadgeTone::Thinking,
        Some(SessionState::Idle) => BadgeTone::Idle,
        Some(SessionState::Unknown) | None => BadgeTone::Neutral,
    }
}

pub fn tile_tone(state: Option<SessionState>) -> TileTone {
    match state {
        Some(SessionState::Waiting) => TileTone::Attention,
        Some(SessionState::Working) => TileTone::Busy,
        Some(SessionState::Thinking) => TileTone::Pondering,
        Some(SessionState::Idle) => TileTone::Resting,
        Some(SessionState::Unknown) | None => TileTone::Plain,
    }
}

/// Only running sessions get a row accent.
pub fn row_tone(state: Option<SessionState>, is_running: bool) -> RowTone {
    if !is_running {
        return RowTone::Default;
    }
    match state {
        Some(SessionState::Waiting) => RowTone::Waiting,
        Some(SessionState::Idle) => RowTone::Idle,
        _ => RowTone::Active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(value: impl Serialize) -> String {
        serde_json::to_value(value)
            .expect("json")
            .as_str()
            .expect("string tag")
            .to_string()
    }

    #[test]
    fn tables_are_total_over_known_states() {
        for state in SessionState::ALL {
            let class = classify(Some(state), true);
            assert!(tag(class.badge).starts_with("badge-"));
            assert!(tag(class.tile).starts_with("tile-"));
            assert!(tag(class.row).starts_with("row-"));
            if state == SessionState::Unknown {
                assert_eq!(class.label, "");
            } else {
                assert!(class.label.contains(' '), "{state:?}");
            }
        }
    }

    #[test]
    fn absent_state_behaves_like_unknown() {
        assert_eq!(
            classify(None, false),
            classify(Some(SessionState::Unknown), false)
        );
        assert_eq!(classify(None, true).row, RowTone::Active);
    }

    #[test]
    fn labels_carry_the_state_word() {
        assert!(state_label(Some(SessionState::Waiting)).ends_with("Waiting"));
        assert!(state_label(Some(SessionState::Working)).ends_with("Working"));
        assert!(state_label(Some(SessionState::Thinking)).ends_with("Thinking"));
        assert!(state_label(Some(SessionState::Idle)).ends_with("Idle"));
    }

    #[test]
    fn non_running_rows_are_always_default() {
        for state in SessionState::ALL {
            assert_eq!(row_tone(Some(state), false), RowTone::Default);
            assert_eq!(tag(row_tone(Some(state), false)), "row-default");
        }
        assert_eq!(row_tone(None, false), RowTone::Default);
    }

    #[test]
    fn running_rows_split_waiting_idle_and_active() {
        assert_eq!(row_tone(Some(SessionState::Waiting), true), RowTone::Waiting);
        assert_eq!(row_tone(Some(SessionState::Idle), true), RowTone::Idle);
        assert_eq!(row_tone(Some(SessionState::Working), true), RowTone::Active);
        assert_eq!(row_tone(Some(SessionState::Thinking), true), RowTone::Active);
        assert_eq!(row_tone(Some(SessionState::Unknown), true), RowTone::Active);
    }

    #[test]
    fn serializes_as_style_tags() {
        let value = serde_json::to_value(classify(Some(SessionState::Idle), false)).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "label": "💤 Idle",
                "badge": "badge-idle",
                "tile": "tile-resting",
                "row": "row-default"
            })
        );
    }

    #[test]
    fn badge_and_tile_ignore_running_flag() {
        for state in SessionState::ALL {
            let running = classify(Some(state), true);
            let stopped = classify(Some(state), false);
            assert_eq!(running.badge, stopped.badge);
            assert_eq!(running.tile, stopped.tile);
            assert_eq!(running.label, stopped.label);
        }
    }
}
