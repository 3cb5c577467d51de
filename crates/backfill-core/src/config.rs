//! Runtime configuration for backfill planning.
//!
//! Every field has a default so a partial (or empty) JSON document is valid.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Maximum units (days or fire instants) enumerated for one target.
    pub max_fire_instants: usize,

    /// Maximum entries in an explicit schedule date list.
    pub max_schedule_date_list: usize,

    /// Worker group used when neither the request nor a dependent edge names one.
    pub default_worker_group: String,

    /// chrono format for window boundaries in command params.
    pub date_format: String,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            max_fire_instants: 10_000,
            max_schedule_date_list: 100,
            default_worker_group: "default".to_string(),
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl BackfillConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_reasonable() {
        let config = BackfillConfig::default();
        assert_eq!(config.max_schedule_date_list, 100);
        assert_eq!(config.default_worker_group, "default");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = BackfillConfig::from_json(r#"{ "default_worker_group": "etl" }"#).unwrap();
        assert_eq!(config.default_worker_group, "etl");
        assert_eq!(config.max_fire_instants, 10_000);
    }
}
