//! Fixed mood vocabulary attached to entries.

use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_MOOD_COLOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Bad,
    Awful,
}

/// Presentation attributes of a mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodStyle {
    pub emoji: &'static str,
    /// Hex color, `#rrggbb`.
    pub color: &'static str,
    pub label: &'static str,
}

impl Mood {
    /// Picker order, best to worst.
    pub const ALL: [Mood; 5] = [Mood::Great, Mood::Good, Mood::Neutral, Mood::Bad, Mood::Awful];

    pub fn style(self) -> MoodStyle {
        match self {
            Mood::Great => MoodStyle {
                emoji: "😄",
                color: "#4CAF50",
                label: "Great",
            },
            Mood::Good => MoodStyle {
                emoji: "🙂",
                color: "#8BC34A",
                label: "Good",
            },
            Mood::Neutral => MoodStyle {
                emoji: "😐",
                color: "#9E9E9E",
                label: "Neutral",
            },
            Mood::Bad => MoodStyle {
                emoji: "😕",
                color: "#FF9800",
                label: "Bad",
            },
            Mood::Awful => MoodStyle {
                emoji: "😢",
                color: "#F44336",
                label: "Awful",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Bad => "bad",
            Mood::Awful => "awful",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color for an optional mood, falling back to the neutral brown.
pub fn mood_color(mood: Option<Mood>) -> &'static str {
    mood.map(|m| m.style().color).unwrap_or(FALLBACK_MOOD_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for mood in Mood::ALL {
            assert_eq!(Mood::parse(mood.as_str()), Some(mood));
        }
        assert_eq!(Mood::parse("ecstatic"), None);
    }

    #[test]
    fn test_colors() {
        assert_eq!(mood_color(Some(Mood::Awful)), "#F44336");
        assert_eq!(mood_color(None), FALLBACK_MOOD_COLOR);
    }

    #[test]
    fn test_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Mood::Neutral).unwrap(), "\"neutral\"");
        assert!(serde_json::from_str::<Mood>("\"Neutral\"").is_err());
    }
}
