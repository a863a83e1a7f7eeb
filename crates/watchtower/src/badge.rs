//! Shields.io endpoint badge for a target's last known status.

use serde::{Deserialize, Serialize};

use crate::model::TargetStatus;

/// JSON document read by a Shields.io endpoint badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub schema_version: u8,
    pub label: String,
    pub message: String,
    pub color: String,
}

impl Badge {
    const LABEL: &'static str = "STATUS";

    pub fn for_status(status: TargetStatus) -> Self {
        let color = match status {
            TargetStatus::Up => "GREEN",
            TargetStatus::Degraded => "ORANGE",
            TargetStatus::Down | TargetStatus::Unknown => "RED",
        };

        Self::new(status.as_str().to_uppercase(), color)
    }

    /// Badge served for a URL that is not monitored
    pub fn unknown_target() -> Self {
        Self::new("UNKNOWN".into(), "RED")
    }

    fn new(message: String, color: &str) -> Self {
        Self { schema_version: 1, label: Self::LABEL.into(), message, color: color.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_follow_status() {
        assert_eq!(Badge::for_status(TargetStatus::Up).color, "GREEN");
        assert_eq!(Badge::for_status(TargetStatus::Degraded).color, "ORANGE");
        assert_eq!(Badge::for_status(TargetStatus::Down).color, "RED");
        assert_eq!(Badge::for_status(TargetStatus::Unknown).color, "RED");
    }

    #[test]
    fn test_serializes_shields_schema() {
        let value = serde_json::to_value(Badge::for_status(TargetStatus::Degraded)).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "schemaVersion": 1,
                "label": "STATUS",
                "message": "DEGRADED",
                "color": "ORANGE",
            })
        );
    }

    #[test]
    fn test_unknown_target() {
        let badge = Badge::unknown_target();
        assert_eq!(badge.message, "UNKNOWN");
        assert_eq!(badge.color, "RED");
    }
}
