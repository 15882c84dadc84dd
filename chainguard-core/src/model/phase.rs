use serde::{Deserialize, Serialize};

/// Where a project currently sits in its own lifecycle (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Planning,
    Implementation,
    Testing,
    Review,
    Done,
    Unknown,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Unknown
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Planning => "planning",
            Phase::Implementation => "implementation",
            Phase::Testing => "testing",
            Phase::Review => "review",
            Phase::Done => "done",
            Phase::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown() {
        assert_eq!(Phase::default(), Phase::Unknown);
    }

    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&Phase::Implementation).unwrap();
        assert_eq!(json, "\"implementation\"");
        let back: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Phase::Implementation);
    }
}
