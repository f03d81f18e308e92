//! Pure in-memory state transitions for habits and completions.
//!
//! Everything here is synchronous and side-effect free; the store façade
//! commits a transition first, then persists and dispatches sync effects.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::completion::migrate_shape;
use super::model::{CompletionDay, CompletionMap, Habit, HabitPatch, Slot, SlotValue};

/// In-memory habit and completion state.
#[derive(Debug, Clone, Default)]
pub struct HabitState {
    pub habits: Vec<Habit>,
    pub completions: CompletionMap,
}

/// Shared handle to the engine state, owned jointly by the store façade and
/// the sync coordinator. Held only for short synchronous sections.
pub type SharedState = Arc<Mutex<HabitState>>;

/// Result of applying a habit patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    /// The habit existed and the patch was applied.
    pub applied: bool,
    /// The shape flag changed and completions were migrated.
    pub migrated: bool,
}

impl HabitState {
    /// Prepend a habit (most-recent-first) and initialize its completion map.
    pub fn add(&mut self, habit: Habit) {
        self.completions.entry(habit.id.clone()).or_default();
        self.habits.insert(0, habit);
    }

    /// Remove a habit and its entire completion sub-map.
    pub fn remove(&mut self, habit_id: &str) -> bool {
        let before = self.habits.len();
        self.habits.retain(|h| h.id != habit_id);
        self.completions.remove(habit_id);
        self.habits.len() != before
    }

    /// Flip the morning/evening flag. Does not migrate completions.
    pub fn toggle_shape(&mut self, habit_id: &str) -> bool {
        match self.habits.iter_mut().find(|h| h.id == habit_id) {
            Some(habit) => {
                habit.morning_evening = !habit.morning_evening;
                true
            }
            None => false,
        }
    }

    /// Apply a partial update; when the shape flag changes, migrate every
    /// date entry for the habit to the new shape.
    pub fn apply_patch(&mut self, habit_id: &str, patch: &HabitPatch) -> PatchOutcome {
        let Some(habit) = self.habits.iter_mut().find(|h| h.id == habit_id) else {
            return PatchOutcome::default();
        };

        let was_split = habit.morning_evening;
        if let Some(name) = &patch.name {
            habit.name = name.clone();
        }
        if let Some(flag) = patch.morning_evening {
            habit.morning_evening = flag;
        }
        if let Some(category) = &patch.category {
            habit.category = category.clone();
        }
        if let Some(start_date) = patch.start_date {
            habit.start_date = start_date;
        }
        let will_be_split = habit.morning_evening;

        let migrated = patch.morning_evening.is_some() && was_split != will_be_split;
        if migrated {
            if let Some(days) = self.completions.get_mut(habit_id) {
                for day in days.values_mut() {
                    *day = migrate_shape(day, was_split, will_be_split);
                }
            }
        }

        PatchOutcome {
            applied: true,
            migrated,
        }
    }

    /// Move a habit from `from` to `to`, clamping `to` into bounds.
    /// An out-of-range `from` is a no-op.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.habits.len() {
            return false;
        }
        let to = to.min(self.habits.len() - 1);
        if from != to {
            let habit = self.habits.remove(from);
            self.habits.insert(to, habit);
        }
        true
    }

    /// Cycle one slot of the (habit, date) entry, creating it if absent.
    pub fn cycle_slot(&mut self, habit_id: &str, slot: Slot, date: NaiveDate) {
        let day = self
            .completions
            .entry(habit_id.to_string())
            .or_default()
            .entry(date)
            .or_default();
        let next = day.get(slot).unwrap_or_default().cycle();
        day.set(slot, next);
    }

    /// Single-gesture cycle for calendar UIs: advances both slots together
    /// for a split habit, or `single` otherwise, clearing stale fields of
    /// the other shape.
    pub fn cycle_day(&mut self, habit_id: &str, date: NaiveDate) {
        let split = self
            .habits
            .iter()
            .find(|h| h.id == habit_id)
            .map(|h| h.morning_evening)
            .unwrap_or(false);
        let day = self
            .completions
            .entry(habit_id.to_string())
            .or_default()
            .entry(date)
            .or_default();
        let current = day.single.or(day.morning).or(day.evening).unwrap_or_default();
        let next = current.cycle();
        if split {
            *day = CompletionDay {
                morning: Some(next),
                evening: Some(next),
                single: None,
            };
        } else {
            *day = CompletionDay {
                single: Some(next),
                morning: None,
                evening: None,
            };
        }
    }

    /// Read one slot's value; missing entries read as neutral.
    pub fn completion(&self, habit_id: &str, slot: Slot, date: NaiveDate) -> SlotValue {
        self.completions
            .get(habit_id)
            .and_then(|days| days.get(&date))
            .and_then(|day| day.get(slot))
            .unwrap_or_default()
    }

    /// Day entry for a (habit, date) pair, if any.
    pub fn day(&self, habit_id: &str, date: NaiveDate) -> Option<CompletionDay> {
        self.completions
            .get(habit_id)
            .and_then(|days| days.get(&date))
            .copied()
    }
}
