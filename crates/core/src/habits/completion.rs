//! Pure completion logic: day-state rollup and shape migration.

use super::model::{CompletionDay, SlotValue};

/// Roll a day's entry up to a single value for calendar display.
///
/// Failure dominates, then success, then neutral, regardless of how many
/// slots are present. A missing or empty entry reads as neutral.
pub fn day_state(day: &CompletionDay) -> SlotValue {
    let mut state = SlotValue::Neutral;
    for value in [day.single, day.morning, day.evening].into_iter().flatten() {
        if value == SlotValue::Failed {
            return SlotValue::Failed;
        }
        if value == SlotValue::Done {
            state = SlotValue::Done;
        }
    }
    state
}

/// Transform one day's entry when a habit's shape changes.
///
/// Splitting copies the prior `single` value into both new slots. Merging is
/// lossy: any failed slot wins, otherwise any done slot counts as done,
/// otherwise neutral. Without a shape change the entry is normalized to the
/// fields valid for the current shape, values untouched.
pub fn migrate_shape(day: &CompletionDay, was_split: bool, will_be_split: bool) -> CompletionDay {
    match (was_split, will_be_split) {
        (false, true) => {
            let single = day.single.unwrap_or_default();
            CompletionDay {
                morning: Some(single),
                evening: Some(single),
                single: None,
            }
        }
        (true, false) => {
            let morning = day.morning.unwrap_or_default();
            let evening = day.evening.unwrap_or_default();
            let merged = if morning == SlotValue::Failed || evening == SlotValue::Failed {
                SlotValue::Failed
            } else if morning == SlotValue::Done || evening == SlotValue::Done {
                SlotValue::Done
            } else {
                SlotValue::Neutral
            };
            CompletionDay {
                single: Some(merged),
                morning: None,
                evening: None,
            }
        }
        (true, true) => CompletionDay {
            morning: day.morning,
            evening: day.evening,
            single: None,
        },
        (false, false) => CompletionDay {
            single: day.single,
            morning: None,
            evening: None,
        },
    }
}
