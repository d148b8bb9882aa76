//! Agent routing tag

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HistoryError;

/// Specialist that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Planning,
    Focus,
    Emotion,
    Organize,
    Learning,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Planning,
        AgentKind::Focus,
        AgentKind::Emotion,
        AgentKind::Organize,
        AgentKind::Learning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Planning => "planning",
            AgentKind::Focus => "focus",
            AgentKind::Emotion => "emotion",
            AgentKind::Organize => "organize",
            AgentKind::Learning => "learning",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| HistoryError::InvalidArgument(format!("unknown agent: {}", s)))
    }
}
