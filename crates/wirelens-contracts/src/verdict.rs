use serde::{Deserialize, Serialize};

/// Label the upstream model uses for a conforming assembly.
pub const LABEL_NORMAL: &str = "정상";
/// Label the upstream model uses for a non-conforming assembly.
pub const LABEL_ABNORMAL: &str = "비정상";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Normal,
    Abnormal,
    Indeterminate,
}

impl Judgment {
    /// Maps an upstream free-text label onto the closed judgment set.
    /// Anything outside the two known labels collapses to
    /// `Indeterminate` rather than guessing.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            LABEL_NORMAL => Judgment::Normal,
            LABEL_ABNORMAL => Judgment::Abnormal,
            _ => Judgment::Indeterminate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Judgment::Normal => "normal",
            Judgment::Abnormal => "abnormal",
            Judgment::Indeterminate => "indeterminate",
        }
    }
}

/// Classification outcome of one inspection. An `Indeterminate`
/// judgment is a valid terminal business outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub judgment: Judgment,
    pub reason: String,
}

impl Verdict {
    pub fn new(judgment: Judgment, reason: impl Into<String>) -> Self {
        Self {
            judgment,
            reason: reason.into(),
        }
    }

    pub fn indeterminate(reason: impl Into<String>) -> Self {
        Self::new(Judgment::Indeterminate, reason)
    }
}
