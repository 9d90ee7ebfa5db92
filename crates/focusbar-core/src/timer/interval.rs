use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The three fixed interval presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntervalKind {
    Work,
    ShortRest,
    LongRest,
}

impl IntervalKind {
    pub const ALL: [IntervalKind; 3] = [Self::Work, Self::ShortRest, Self::LongRest];

    /// Duration in minutes.
    pub fn duration_min(self) -> u64 {
        match self {
            Self::Work => 25,
            Self::ShortRest => 5,
            Self::LongRest => 15,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(self) -> u64 {
        self.duration_min() * 60
    }

    pub fn is_rest(self) -> bool {
        !matches!(self, Self::Work)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::ShortRest => "short-rest",
            Self::LongRest => "long-rest",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for IntervalKind {
    type Err = CoreError;

    /// Accepts `work`, `short-rest`, `long-rest` with either `-` or `_`,
    /// case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidTransition(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_durations() {
        assert_eq!(IntervalKind::Work.duration_secs(), 1500);
        assert_eq!(IntervalKind::ShortRest.duration_secs(), 300);
        assert_eq!(IntervalKind::LongRest.duration_secs(), 900);
    }

    #[test]
    fn parse_accepts_both_separators() {
        assert_eq!("short_rest".parse::<IntervalKind>().unwrap(), IntervalKind::ShortRest);
        assert_eq!("Long-Rest".parse::<IntervalKind>().unwrap(), IntervalKind::LongRest);
        assert_eq!(" work ".parse::<IntervalKind>().unwrap(), IntervalKind::Work);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "nap".parse::<IntervalKind>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition(ref s) if s == "nap"));
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&IntervalKind::ShortRest).unwrap();
        assert_eq!(json, "\"short-rest\"");
    }
}
