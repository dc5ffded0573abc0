//! Persisted records: the user profile and saved plants.

use crate::features::reminders::ScheduleHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name shown before onboarding has stored a profile
pub const VISITOR_NAME: &str = "Visitante";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

impl User {
    /// Placeholder returned when no profile has been saved yet
    pub fn visitor() -> Self {
        Self {
            name: VISITOR_NAME.to_string(),
            picture: String::new(),
        }
    }
}

/// Recurrence unit of a watering frequency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RepeatEvery {
    Week,
    Day,
    /// Unit not understood by this crate, kept verbatim
    Other(String),
}

impl RepeatEvery {
    pub fn as_str(&self) -> &str {
        match self {
            RepeatEvery::Week => "week",
            RepeatEvery::Day => "day",
            RepeatEvery::Other(raw) => raw,
        }
    }
}

impl From<String> for RepeatEvery {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "week" => RepeatEvery::Week,
            "day" => RepeatEvery::Day,
            _ => RepeatEvery::Other(raw),
        }
    }
}

impl From<RepeatEvery> for String {
    fn from(unit: RepeatEvery) -> Self {
        match unit {
            RepeatEvery::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RepeatEvery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a plant wants water: `times` per `repeat_every`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub times: u32,
    pub repeat_every: RepeatEvery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub water_tips: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub environments: BTreeSet<String>,
    pub frequency: Frequency,
    /// `HH:mm` of the reminder, filled in on load
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hour: String,
    #[serde(rename = "dateTimeNotification")]
    pub date_time_notification: DateTime<Utc>,
}

/// A saved plant together with the handle of its reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlant {
    pub data: Plant,
    #[serde(rename = "notificationId")]
    pub notification_id: ScheduleHandle,
}

/// Every saved plant, keyed by plant id
pub type PlantCollection = BTreeMap<String, StoredPlant>;

/// Catalog ids arrive as numbers or strings; both become strings.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_every_round_trips_unknown_units() {
        let unit: RepeatEvery = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(unit, RepeatEvery::Week);

        let unit: RepeatEvery = serde_json::from_str("\"fortnight\"").unwrap();
        assert_eq!(unit, RepeatEvery::Other("fortnight".to_string()));
        assert_eq!(serde_json::to_string(&unit).unwrap(), "\"fortnight\"");
    }

    #[test]
    fn test_stored_plant_wire_shape() {
        let raw = r#"{
            "data": {
                "id": 3,
                "name": "Aningapara",
                "about": "Gosta de sombra",
                "water_tips": "Mantenha a terra sempre úmida",
                "photo": "https://example.com/aninga.svg",
                "environments": ["living_room", "kitchen"],
                "frequency": { "times": 2, "repeat_every": "week" },
                "dateTimeNotification": "2024-04-02T10:30:00.000Z"
            },
            "notificationId": "d4b0"
        }"#;

        let stored: StoredPlant = serde_json::from_str(raw).unwrap();
        assert_eq!(stored.data.id, "3");
        assert_eq!(stored.data.frequency.times, 2);
        assert!(stored.data.environments.contains("kitchen"));
        assert_eq!(stored.notification_id.as_str(), "d4b0");
        assert!(stored.data.hour.is_empty());

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["notificationId"], "d4b0");
        assert_eq!(json["data"]["frequency"]["repeat_every"], "week");
        assert!(json["data"].get("dateTimeNotification").is_some());
        assert!(json["data"].get("hour").is_none());
    }

    #[test]
    fn test_visitor_profile() {
        let visitor = User::visitor();
        assert_eq!(visitor.name, "Visitante");
        assert_eq!(visitor.picture, "");
    }
}
