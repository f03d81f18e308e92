//! Stateful habit store façade.
//!
//! Each mutation commits the in-memory transition, persists the affected
//! cache slots, then dispatches any remote sync effect. Reads are pure.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use super::completion::day_state;
use super::model::{
    new_habit_id, CompletionMap, Habit, HabitPatch, NewHabit, Slot, SlotValue, DEFAULT_CATEGORY,
};
use super::state::{HabitState, SharedState};
use crate::cache::{HabitCache, LocalCache};
use crate::sync::{IdentityProvider, RemoteDocumentStore, SyncCoordinator};
use crate::utils::today_local;

/// Owner of all habit and completion state.
///
/// Construction loads the persisted state from the local cache; the engine
/// is immediately usable offline. Call [`sync`](Self::sync) to reach the
/// coordinator for sign-in reconciliation and explicit flushes.
pub struct HabitStore {
    state: SharedState,
    cache: HabitCache,
    sync: SyncCoordinator,
}

impl HabitStore {
    pub fn new(
        local: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteDocumentStore>,
        identity: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let cache = HabitCache::new(local);
        let state: SharedState = Arc::new(Mutex::new(HabitState {
            habits: cache.load_habits(),
            completions: cache.load_completions(),
        }));
        let sync = SyncCoordinator::new(state.clone(), cache.clone(), remote, identity);
        Self { state, cache, sync }
    }

    /// The remote sync coordinator bound to this store.
    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    fn lock_state(&self) -> MutexGuard<'_, HabitState> {
        self.state.lock().expect("habit state lock")
    }

    /// Snapshot of the ordered habit list.
    pub fn habits(&self) -> Vec<Habit> {
        self.lock_state().habits.clone()
    }

    /// Snapshot of the completion map.
    pub fn completions(&self) -> CompletionMap {
        self.lock_state().completions.clone()
    }

    /// Create a habit. `category` defaults to [`DEFAULT_CATEGORY`] and
    /// `start_date` to today; the habit is prepended (most-recent-first) and
    /// pushed to the remote immediately when signed in.
    pub fn add_habit(&self, draft: NewHabit) -> Habit {
        let habit = Habit {
            id: new_habit_id(),
            name: draft.name,
            morning_evening: draft.morning_evening,
            category: draft
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            start_date: draft.start_date.unwrap_or_else(today_local),
        };
        {
            let mut state = self.lock_state();
            state.add(habit.clone());
            self.cache.save_habits(&state.habits);
            self.cache.save_completions(&state.completions);
        }
        self.sync.schedule_write(true);
        habit
    }

    /// Remove a habit and its entire completion sub-map, then ask the remote
    /// to drop it (targeted field delete with full-overwrite fallback).
    pub fn remove_habit(&self, habit_id: &str) {
        let removed = {
            let mut state = self.lock_state();
            let removed = state.remove(habit_id);
            if removed {
                self.cache.save_habits(&state.habits);
                self.cache.save_completions(&state.completions);
            }
            removed
        };
        if removed {
            self.sync.push_remove(habit_id);
        }
    }

    /// Flip the morning/evening flag only. Completions are not migrated;
    /// shape migration runs through [`update_habit`](Self::update_habit).
    pub fn toggle_morning_evening(&self, habit_id: &str) {
        let mut state = self.lock_state();
        if state.toggle_shape(habit_id) {
            self.cache.save_habits(&state.habits);
        }
    }

    /// Apply a partial update. When the morning/evening flag changes, every
    /// date entry for the habit is migrated to the new shape. Pushes the
    /// updated habits array to the remote immediately.
    pub fn update_habit(&self, habit_id: &str, patch: HabitPatch) {
        let applied = {
            let mut state = self.lock_state();
            let outcome = state.apply_patch(habit_id, &patch);
            if outcome.applied {
                self.cache.save_habits(&state.habits);
                if outcome.migrated {
                    self.cache.save_completions(&state.completions);
                }
            }
            outcome.applied
        };
        if applied {
            self.sync.push_habits();
        }
    }

    /// Move a habit between list positions. `to` is clamped into bounds and
    /// an out-of-range `from` is a no-op. Does not trigger a remote write;
    /// the caller decides when to flush.
    pub fn reorder_habit(&self, from: usize, to: usize) {
        let mut state = self.lock_state();
        if state.reorder(from, to) {
            self.cache.save_habits(&state.habits);
        }
    }

    /// Cycle one slot of a day entry (today when `date` is omitted). Local
    /// only; remote propagation is batched by the caller.
    pub fn cycle_completion(&self, habit_id: &str, slot: Slot, date: Option<NaiveDate>) {
        let date = date.unwrap_or_else(today_local);
        let mut state = self.lock_state();
        state.cycle_slot(habit_id, slot, date);
        self.cache.save_completions(&state.completions);
    }

    /// Read one slot's value (today when `date` is omitted).
    pub fn get_completion(&self, habit_id: &str, slot: Slot, date: Option<NaiveDate>) -> SlotValue {
        let date = date.unwrap_or_else(today_local);
        self.lock_state().completion(habit_id, slot, date)
    }

    /// Single-gesture cycle for calendar UIs: advances the slot(s) matching
    /// the habit's shape and clears stale fields of the other shape.
    pub fn cycle_completion_by_date(&self, habit_id: &str, date: NaiveDate) {
        let mut state = self.lock_state();
        state.cycle_day(habit_id, date);
        self.cache.save_completions(&state.completions);
    }

    /// Rolled-up day state for calendar display; missing entries are neutral.
    pub fn get_day_state(&self, habit_id: &str, date: NaiveDate) -> SlotValue {
        self.lock_state()
            .day(habit_id, date)
            .map(|day| day_state(&day))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::errors::RemoteStoreError;
    use crate::sync::RemoteDocument;
    use async_trait::async_trait;

    /// Remote stub for store tests; every operation succeeds and is dropped.
    struct NullRemote;

    #[async_trait]
    impl RemoteDocumentStore for NullRemote {
        async fn fetch(
            &self,
            _user_id: &str,
        ) -> Result<Option<RemoteDocument>, RemoteStoreError> {
            Ok(None)
        }

        async fn merge_fields(
            &self,
            _user_id: &str,
            _fields: serde_json::Value,
        ) -> Result<i64, RemoteStoreError> {
            Ok(1)
        }

        async fn merge_completions(
            &self,
            _user_id: &str,
            _completions: serde_json::Value,
        ) -> Result<i64, RemoteStoreError> {
            Ok(1)
        }

        async fn update_fields(
            &self,
            _user_id: &str,
            _set: serde_json::Value,
            _delete_paths: &[String],
        ) -> Result<i64, RemoteStoreError> {
            Ok(1)
        }
    }

    fn store() -> HabitStore {
        HabitStore::new(Arc::new(MemoryCache::new()), Arc::new(NullRemote), None)
    }

    fn store_on(cache: Arc<MemoryCache>) -> HabitStore {
        HabitStore::new(cache, Arc::new(NullRemote), None)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_habit_applies_defaults() {
        let store = store();
        let habit = store.add_habit(NewHabit {
            name: "Read".to_string(),
            ..Default::default()
        });
        assert_eq!(habit.category, DEFAULT_CATEGORY);
        assert_eq!(habit.start_date, today_local());
        assert!(!habit.id.is_empty());
        assert_eq!(store.habits()[0].id, habit.id);
    }

    #[test]
    fn add_habit_prepends_most_recent_first() {
        let store = store();
        store.add_habit(NewHabit {
            name: "first".to_string(),
            ..Default::default()
        });
        let second = store.add_habit(NewHabit {
            name: "second".to_string(),
            ..Default::default()
        });
        assert_eq!(store.habits()[0].id, second.id);
    }

    #[test]
    fn remove_habit_erases_list_entry_and_completions() {
        let store = store();
        let habit = store.add_habit(NewHabit {
            name: "Read".to_string(),
            ..Default::default()
        });
        let day = date(2024, 1, 1);
        store.cycle_completion(&habit.id, Slot::Single, Some(day));
        assert_eq!(store.get_day_state(&habit.id, day), SlotValue::Done);

        store.remove_habit(&habit.id);
        assert!(store.habits().is_empty());
        assert_eq!(store.get_day_state(&habit.id, day), SlotValue::Neutral);
    }

    #[test]
    fn shape_change_round_trip_matches_migration_rules() {
        let store = store();
        let habit = store.add_habit(NewHabit {
            name: "Read".to_string(),
            ..Default::default()
        });
        let day = date(2024, 1, 1);
        store.cycle_completion(&habit.id, Slot::Single, Some(day));
        assert_eq!(
            store.get_completion(&habit.id, Slot::Single, Some(day)),
            SlotValue::Done
        );

        store.update_habit(
            &habit.id,
            HabitPatch {
                morning_evening: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(
            store.get_completion(&habit.id, Slot::Morning, Some(day)),
            SlotValue::Done
        );
        assert_eq!(
            store.get_completion(&habit.id, Slot::Evening, Some(day)),
            SlotValue::Done
        );
        assert_eq!(
            store.get_completion(&habit.id, Slot::Single, Some(day)),
            SlotValue::Neutral
        );

        store.update_habit(
            &habit.id,
            HabitPatch {
                morning_evening: Some(false),
                ..Default::default()
            },
        );
        assert_eq!(
            store.get_completion(&habit.id, Slot::Single, Some(day)),
            SlotValue::Done
        );
    }

    #[test]
    fn toggle_morning_evening_flips_flag_without_migration() {
        let store = store();
        let habit = store.add_habit(NewHabit {
            name: "Read".to_string(),
            ..Default::default()
        });
        let day = date(2024, 1, 1);
        store.cycle_completion(&habit.id, Slot::Single, Some(day));

        store.toggle_morning_evening(&habit.id);
        assert!(store.habits()[0].morning_evening);
        // entry keeps its old shape until update_habit migrates it
        assert_eq!(
            store.get_completion(&habit.id, Slot::Single, Some(day)),
            SlotValue::Done
        );
        assert_eq!(
            store.get_completion(&habit.id, Slot::Morning, Some(day)),
            SlotValue::Neutral
        );
    }

    #[test]
    fn reorder_clamps_target_index() {
        let store = store();
        for name in ["a", "b", "c"] {
            store.add_habit(NewHabit {
                name: name.to_string(),
                ..Default::default()
            });
        }
        let first = store.habits()[0].id.clone();
        store.reorder_habit(0, 5);
        let habits = store.habits();
        assert_eq!(habits[2].id, first);
        assert_eq!(habits.len(), 3);
    }

    #[test]
    fn cycle_by_date_respects_habit_shape() {
        let store = store();
        let split = store.add_habit(NewHabit {
            name: "split".to_string(),
            morning_evening: true,
            ..Default::default()
        });
        let day = date(2024, 1, 1);
        store.cycle_completion_by_date(&split.id, day);
        assert_eq!(
            store.get_completion(&split.id, Slot::Morning, Some(day)),
            SlotValue::Done
        );
        assert_eq!(
            store.get_completion(&split.id, Slot::Evening, Some(day)),
            SlotValue::Done
        );
        assert_eq!(
            store.get_completion(&split.id, Slot::Single, Some(day)),
            SlotValue::Neutral
        );
    }

    #[test]
    fn day_state_rolls_up_with_failure_precedence() {
        let store = store();
        let habit = store.add_habit(NewHabit {
            name: "split".to_string(),
            morning_evening: true,
            ..Default::default()
        });
        let day = date(2024, 1, 1);
        store.cycle_completion(&habit.id, Slot::Morning, Some(day));
        assert_eq!(store.get_day_state(&habit.id, day), SlotValue::Done);
        store.cycle_completion(&habit.id, Slot::Evening, Some(day));
        store.cycle_completion(&habit.id, Slot::Evening, Some(day));
        assert_eq!(store.get_day_state(&habit.id, day), SlotValue::Failed);
    }

    #[test]
    fn state_survives_restart_via_local_cache() {
        let cache = Arc::new(MemoryCache::new());
        let habit = {
            let store = store_on(cache.clone());
            let habit = store.add_habit(NewHabit {
                name: "Read".to_string(),
                ..Default::default()
            });
            store.cycle_completion(&habit.id, Slot::Single, Some(date(2024, 1, 1)));
            habit
        };

        let reopened = store_on(cache);
        assert_eq!(reopened.habits()[0].id, habit.id);
        assert_eq!(
            reopened.get_completion(&habit.id, Slot::Single, Some(date(2024, 1, 1))),
            SlotValue::Done
        );
    }
}
