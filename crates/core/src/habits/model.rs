//! Habit and completion domain models.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned to habits created without an explicit one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Canonical list of habit categories.
pub const ALL_CATEGORIES: [&str; 4] = ["Spiritual", "Health", "Finances", "General"];

/// Generate a fresh client-side habit id.
pub fn new_habit_id() -> String {
    Uuid::new_v4().to_string()
}

/// A tracked habit.
///
/// `id` is immutable once created and generated client-side; the habit list
/// is ordered most-recent-first and reordered explicitly by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    /// Whether the habit tracks independent morning and evening slots.
    pub morning_evening: bool,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "crate::utils::today_local")]
    pub start_date: NaiveDate,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Payload for creating a habit; omitted fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    pub name: String,
    #[serde(default)]
    pub morning_evening: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Partial update payload for an existing habit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_evening: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Tri-state completion value, cycled by repeated user action.
///
/// Serialized as its bare integer on every wire and cache format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SlotValue {
    #[default]
    Neutral,
    Done,
    Failed,
}

impl SlotValue {
    /// Advance to the next state: neutral → done → failed → neutral.
    pub fn cycle(self) -> Self {
        match self {
            SlotValue::Neutral => SlotValue::Done,
            SlotValue::Done => SlotValue::Failed,
            SlotValue::Failed => SlotValue::Neutral,
        }
    }
}

impl From<SlotValue> for u8 {
    fn from(value: SlotValue) -> Self {
        match value {
            SlotValue::Neutral => 0,
            SlotValue::Done => 1,
            SlotValue::Failed => 2,
        }
    }
}

impl TryFrom<u8> for SlotValue {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SlotValue::Neutral),
            1 => Ok(SlotValue::Done),
            2 => Ok(SlotValue::Failed),
            other => Err(format!("invalid completion value {}", other)),
        }
    }
}

/// An independently cyclable slot within a day's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Morning,
    Evening,
    Single,
}

/// One calendar day's completion entry for a habit.
///
/// A split habit holds only `morning`/`evening`; a non-split habit holds only
/// `single`. An entry with all fields absent is equivalent to no entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionDay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<SlotValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening: Option<SlotValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<SlotValue>,
}

impl CompletionDay {
    pub fn get(&self, slot: Slot) -> Option<SlotValue> {
        match slot {
            Slot::Morning => self.morning,
            Slot::Evening => self.evening,
            Slot::Single => self.single,
        }
    }

    pub fn set(&mut self, slot: Slot, value: SlotValue) {
        match slot {
            Slot::Morning => self.morning = Some(value),
            Slot::Evening => self.evening = Some(value),
            Slot::Single => self.single = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.morning.is_none() && self.evening.is_none() && self.single.is_none()
    }
}

/// Per-habit completion entries keyed by calendar date.
pub type HabitCompletions = BTreeMap<NaiveDate, CompletionDay>;

/// Completion entries for all habits, keyed by habit id.
pub type CompletionMap = HashMap<String, HabitCompletions>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_has_period_three() {
        for value in [SlotValue::Neutral, SlotValue::Done, SlotValue::Failed] {
            assert_eq!(value.cycle().cycle().cycle(), value);
        }
    }

    #[test]
    fn habit_serialization_matches_document_contract() {
        let habit = Habit {
            id: "h1".to_string(),
            name: "Read".to_string(),
            morning_evening: true,
            category: DEFAULT_CATEGORY.to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        };
        let json = serde_json::to_value(&habit).expect("serialize habit");
        assert_eq!(
            json,
            serde_json::json!({
                "id": "h1",
                "name": "Read",
                "morningEvening": true,
                "category": "General",
                "startDate": "2024-01-15",
            })
        );
    }

    #[test]
    fn completion_day_skips_absent_slots() {
        let day = CompletionDay {
            morning: Some(SlotValue::Done),
            ..Default::default()
        };
        let json = serde_json::to_string(&day).expect("serialize day");
        assert_eq!(json, r#"{"morning":1}"#);
    }

    #[test]
    fn slot_value_rejects_out_of_domain_integers() {
        assert!(serde_json::from_str::<SlotValue>("2").is_ok());
        assert!(serde_json::from_str::<SlotValue>("3").is_err());
    }

    #[test]
    fn completion_map_round_trips_with_date_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut map = CompletionMap::new();
        map.entry("h1".to_string()).or_default().insert(
            date,
            CompletionDay {
                single: Some(SlotValue::Failed),
                ..Default::default()
            },
        );
        let json = serde_json::to_string(&map).expect("serialize map");
        assert!(json.contains(r#""2024-02-01":{"single":2}"#));
        let back: CompletionMap = serde_json::from_str(&json).expect("deserialize map");
        assert_eq!(back, map);
    }
}
