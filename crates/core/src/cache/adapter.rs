//! Cache adapter for habits, completions, and sync metadata.
//!
//! Pure serialization over a [`LocalCache`]; corrupt or legacy-shaped data is
//! converted or discarded here so the engine only ever sees current shapes.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::warn;
use serde_json::Value;

use super::local_cache::LocalCache;
use crate::habits::{new_habit_id, CompletionDay, CompletionMap, Habit, DEFAULT_CATEGORY};
use crate::sync::SyncMeta;
use crate::utils::today_local;

/// Cache key for the habit list.
pub const HABITS_KEY: &str = "habits";

/// Cache key for the completion map.
pub const COMPLETIONS_KEY: &str = "habits.completions";

/// Cache key for sync metadata.
pub const META_KEY: &str = "habits.meta";

/// Reserved for the calendar UI; the engine never reads or writes it.
pub const CALENDAR_EDITABLE_KEY: &str = "calendar.editable";

/// Typed access to the engine's three cache slots. Each save is a full
/// overwrite of its slot.
#[derive(Clone)]
pub struct HabitCache {
    store: Arc<dyn LocalCache>,
}

impl HabitCache {
    pub fn new(store: Arc<dyn LocalCache>) -> Self {
        Self { store }
    }

    /// Load the habit list, tolerating the legacy on-disk shape that carried
    /// separate `morning`/`evening` booleans. Unreadable data yields an empty
    /// list.
    pub fn load_habits(&self) -> Vec<Habit> {
        let Some(raw) = self.store.get(HABITS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => values.iter().filter_map(habit_from_cached).collect(),
            Err(e) => {
                warn!("Discarding unreadable cached habit list: {}", e);
                Vec::new()
            }
        }
    }

    pub fn save_habits(&self, habits: &[Habit]) {
        match serde_json::to_string(habits) {
            Ok(raw) => self.store.set(HABITS_KEY, &raw),
            Err(e) => warn!("Failed to serialize habit list: {}", e),
        }
    }

    /// Load the completion map, relocating legacy flat entries (slot fields
    /// directly under the habit id, no date level) under today's date.
    pub fn load_completions(&self) -> CompletionMap {
        let Some(raw) = self.store.get(COMPLETIONS_KEY) else {
            return CompletionMap::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => completions_from_cached(&value),
            Err(e) => {
                warn!("Discarding unreadable cached completions: {}", e);
                CompletionMap::new()
            }
        }
    }

    pub fn save_completions(&self, completions: &CompletionMap) {
        match serde_json::to_string(completions) {
            Ok(raw) => self.store.set(COMPLETIONS_KEY, &raw),
            Err(e) => warn!("Failed to serialize completions: {}", e),
        }
    }

    /// Load sync metadata; missing or corrupt data reads as epoch zero.
    pub fn load_meta(&self) -> SyncMeta {
        self.store
            .get(META_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn save_meta(&self, meta: &SyncMeta) {
        match serde_json::to_string(meta) {
            Ok(raw) => self.store.set(META_KEY, &raw),
            Err(e) => warn!("Failed to serialize sync metadata: {}", e),
        }
    }
}

fn habit_from_cached(value: &Value) -> Option<Habit> {
    if value.get("morningEvening").is_some_and(Value::is_boolean) {
        return serde_json::from_value(value.clone()).ok();
    }

    // Legacy records carried separate morning/evening booleans.
    let record = value.as_object()?;
    let morning = record.get("morning").and_then(Value::as_bool).unwrap_or(false);
    let evening = record.get("evening").and_then(Value::as_bool).unwrap_or(false);
    Some(Habit {
        id: record
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(new_habit_id),
        name: record
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        morning_evening: morning && evening,
        category: DEFAULT_CATEGORY.to_string(),
        start_date: today_local(),
    })
}

fn completions_from_cached(value: &Value) -> CompletionMap {
    let Some(map) = value.as_object() else {
        return CompletionMap::new();
    };
    let today = today_local();
    let mut out = CompletionMap::new();
    for (habit_id, per_habit) in map {
        let days = if is_flat_day_entry(per_habit) {
            match serde_json::from_value::<CompletionDay>(per_habit.clone()) {
                Ok(day) => BTreeMap::from([(today, day)]),
                Err(_) => BTreeMap::new(),
            }
        } else {
            serde_json::from_value(per_habit.clone()).unwrap_or_default()
        };
        out.insert(habit_id.clone(), days);
    }
    out
}

fn is_flat_day_entry(value: &Value) -> bool {
    value.as_object().is_some_and(|record| {
        ["morning", "evening", "single"]
            .iter()
            .any(|slot| record.get(*slot).is_some_and(Value::is_number))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::habits::SlotValue;
    use serde_json::json;

    fn cache_with(key: &str, raw: &str) -> HabitCache {
        let store = Arc::new(MemoryCache::new());
        store.set(key, raw);
        HabitCache::new(store)
    }

    #[test]
    fn current_habit_shape_loads_unchanged() {
        let raw = json!([{
            "id": "h1",
            "name": "Read",
            "morningEvening": true,
            "category": "Health",
            "startDate": "2024-01-15",
        }])
        .to_string();
        let habits = cache_with(HABITS_KEY, &raw).load_habits();
        assert_eq!(habits.len(), 1);
        assert!(habits[0].morning_evening);
        assert_eq!(habits[0].category, "Health");
    }

    #[test]
    fn legacy_habit_booleans_collapse_to_conjunction() {
        let raw = json!([
            { "id": "h1", "name": "Stretch", "morning": true, "evening": true },
            { "id": "h2", "name": "Walk", "morning": true, "evening": false },
        ])
        .to_string();
        let habits = cache_with(HABITS_KEY, &raw).load_habits();
        assert_eq!(habits.len(), 2);
        assert!(habits[0].morning_evening);
        assert!(!habits[1].morning_evening);
        assert_eq!(habits[0].category, DEFAULT_CATEGORY);
    }

    #[test]
    fn legacy_habit_without_id_gets_a_fresh_one() {
        let raw = json!([{ "name": "Run", "morning": false, "evening": false }]).to_string();
        let habits = cache_with(HABITS_KEY, &raw).load_habits();
        assert_eq!(habits.len(), 1);
        assert!(!habits[0].id.is_empty());
    }

    #[test]
    fn corrupt_habit_list_falls_back_to_empty() {
        let habits = cache_with(HABITS_KEY, "not json {").load_habits();
        assert!(habits.is_empty());
    }

    #[test]
    fn flat_completions_relocate_under_today() {
        let raw = json!({ "h1": { "single": 1 } }).to_string();
        let completions = cache_with(COMPLETIONS_KEY, &raw).load_completions();
        let day = completions["h1"][&today_local()];
        assert_eq!(day.single, Some(SlotValue::Done));
    }

    #[test]
    fn dated_completions_load_in_place() {
        let raw = json!({ "h1": { "2024-01-02": { "morning": 2, "evening": 0 } } }).to_string();
        let completions = cache_with(COMPLETIONS_KEY, &raw).load_completions();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(completions["h1"][&date].morning, Some(SlotValue::Failed));
    }

    #[test]
    fn meta_round_trips_and_defaults_to_zero() {
        let store = Arc::new(MemoryCache::new());
        let cache = HabitCache::new(store);
        assert_eq!(cache.load_meta().updated_at, 0);
        cache.save_meta(&SyncMeta { updated_at: 1234 });
        assert_eq!(cache.load_meta().updated_at, 1234);
    }
}
