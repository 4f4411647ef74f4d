//! Interaction targets.

use serde::{Deserialize, Serialize};

/// One entity eligible for an interaction, as produced by the scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionTarget {
    pub id: String,
    #[serde(alias = "displayName")]
    pub display_name: String,
    /// Opaque handle the performer uses to reach the target.
    #[serde(default, alias = "profileRef")]
    pub profile_ref: serde_json::Value,
}

impl InteractionTarget {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            profile_ref: serde_json::Value::Null,
        }
    }

    pub fn with_profile_ref(mut self, profile_ref: serde_json::Value) -> Self {
        self.profile_ref = profile_ref;
        self
    }

    /// First whitespace-separated word of the display name.
    pub fn first_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.display_name)
    }
}
