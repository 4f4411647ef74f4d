//! Flat option set sent by the UI layer.

use serde::{Deserialize, Serialize};

use crate::schema::Config;

/// Recognized runtime options. Absent fields leave the current value untouched.
///
/// Field names follow the camelCase JSON the settings panels send:
///
/// ```json
/// { "maxPerHour": 10, "interactionDelayMs": 3000, "messageTemplates": ["Hi {name}"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_hour: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_day: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_from_last: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_templates: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_cap_per_scope: Option<usize>,
}

impl Config {
    /// Overlay runtime options on top of file configuration.
    pub fn apply(&mut self, options: &RuntimeOptions) {
        if let Some(v) = options.max_per_hour {
            self.rate_limit.max_per_hour = v;
        }
        if let Some(v) = options.max_per_day {
            self.rate_limit.max_per_day = v;
        }
        if let Some(v) = options.interaction_delay_ms {
            self.rate_limit.interaction_delay_ms = v;
        }
        if let Some(v) = options.continue_from_last {
            self.run.continue_from_last = v;
        }
        if let Some(ref v) = options.message_templates {
            self.messages.templates = v.clone();
        }
        if let Some(v) = options.history_cap_per_scope {
            self.history.cap_per_scope = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case() {
        let options: RuntimeOptions = serde_json::from_str(
            r#"{"maxPerHour": 4, "continueFromLast": false, "messageTemplates": ["a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(options.max_per_hour, Some(4));
        assert_eq!(options.continue_from_last, Some(false));
        assert_eq!(options.message_templates.as_ref().map(Vec::len), Some(2));
        assert!(options.max_per_day.is_none());
    }

    #[test]
    fn test_apply_overrides_only_present_fields() {
        let mut config = Config::default();
        let options = RuntimeOptions {
            max_per_day: Some(40),
            history_cap_per_scope: Some(50),
            ..Default::default()
        };
        config.apply(&options);

        assert_eq!(config.rate_limit.max_per_day, 40);
        assert_eq!(config.history.cap_per_scope, 50);
        assert_eq!(config.rate_limit.max_per_hour, 15);
        assert!(config.run.continue_from_last);
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let options = RuntimeOptions {
            interaction_delay_ms: Some(100),
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"interactionDelayMs":100}"#);
    }
}
