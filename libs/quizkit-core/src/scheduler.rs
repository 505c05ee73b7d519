//! Leitner-box mastery scheduling.
//!
//! Each item sits in one of five boxes. A correct answer moves it up one box,
//! a wrong answer sends it back to box 1. The due-ness clock is the subject's
//! sitting counter, not wall time: an item in box `b` is due once
//! `intervals[b - 1]` sittings have started since it was last answered.

use crate::types::{
    Item, ItemMasteryRecord, MasteryStats, ScheduledItem, SubjectScheduleState,
};
use chrono::{DateTime, Utc};

/// Highest box; items here count as mastered.
pub const MAX_BOX: u8 = 5;

/// Review interval in sittings for boxes 1 through 5.
pub const DEFAULT_INTERVALS: [u32; 5] = [1, 2, 4, 8, 16];

/// Leitner scheduler with configurable intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leitner {
    pub intervals: [u32; 5],
}

impl Default for Leitner {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_INTERVALS,
        }
    }
}

impl Leitner {
    /// Required sittings between reviews for a box.
    pub fn interval(&self, leitner_box: u8) -> u32 {
        self.intervals[usize::from(clamp_box(leitner_box)) - 1]
    }

    /// Advance the due-ness clock for a new sitting.
    ///
    /// Must run once per sitting before [`Leitner::prioritize`].
    pub fn begin_session(&self, state: &mut SubjectScheduleState) -> u32 {
        state.session_count = state.session_count.saturating_add(1);
        state.session_count
    }

    /// Apply one answer to an item's record, creating it on first sight.
    pub fn record_answer<'a>(
        &self,
        state: &'a mut SubjectScheduleState,
        item_id: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> &'a ItemMasteryRecord {
        let session = state.session_count;
        let record = state.items.entry(item_id.to_string()).or_default();

        if correct {
            record.correct_count = record.correct_count.saturating_add(1);
            record.leitner_box = (clamp_box(record.leitner_box) + 1).min(MAX_BOX);
        } else {
            // No partial credit: any miss restarts the item
            record.wrong_count = record.wrong_count.saturating_add(1);
            record.leitner_box = 1;
        }
        record.last_seen_session = record.last_seen_session.max(session);
        record.last_answered_at = Some(now);

        record
    }

    /// Whether a record's review interval has elapsed.
    pub fn is_due(&self, state: &SubjectScheduleState, record: &ItemMasteryRecord) -> bool {
        let since = state.session_count.saturating_sub(record.last_seen_session);
        since >= self.interval(record.leitner_box)
    }

    /// Box, due flag, and priority of an item; unseen items count as box 1.
    fn standing(&self, state: &SubjectScheduleState, item_id: &str) -> (u8, bool, u32) {
        let fresh = ItemMasteryRecord::default();
        let record = state.items.get(item_id).unwrap_or(&fresh);
        let leitner_box = clamp_box(record.leitner_box);
        let due = self.is_due(state, record);
        let weight = u32::from(MAX_BOX + 1 - leitner_box);

        (leitner_box, due, if due { weight * 100 } else { weight })
    }

    pub fn priority(&self, state: &SubjectScheduleState, item_id: &str) -> u32 {
        self.standing(state, item_id).2
    }

    /// Annotate one item with its box, due flag, and priority.
    pub fn annotate(&self, state: &SubjectScheduleState, item: &Item) -> ScheduledItem {
        let (leitner_box, due, priority) = self.standing(state, &item.id);
        ScheduledItem {
            item: item.clone(),
            leitner_box,
            priority,
            due,
        }
    }

    /// Annotate items and sort by descending priority.
    ///
    /// Due low-box items come first; among items that are not due, a lower
    /// box still outranks a higher one. Ties keep input order.
    pub fn prioritize(&self, state: &SubjectScheduleState, items: &[Item]) -> Vec<ScheduledItem> {
        let mut scheduled: Vec<ScheduledItem> =
            items.iter().map(|item| self.annotate(state, item)).collect();
        scheduled.sort_by(|a, b| b.priority.cmp(&a.priority));
        scheduled
    }

    /// Aggregate boxes into learning stages.
    pub fn mastery_stats(&self, state: &SubjectScheduleState, total_items: usize) -> MasteryStats {
        let mut stats = MasteryStats {
            unseen: total_items.saturating_sub(state.items.len()),
            ..MasteryStats::default()
        };
        for record in state.items.values() {
            match clamp_box(record.leitner_box) {
                1 | 2 => stats.learning += 1,
                3 | 4 => stats.reviewing += 1,
                _ => stats.mastered += 1,
            }
        }
        stats
    }
}

fn clamp_box(leitner_box: u8) -> u8 {
    leitner_box.clamp(1, MAX_BOX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn state_with(session_count: u32, records: &[(&str, u8, u32)]) -> SubjectScheduleState {
        let mut state = SubjectScheduleState {
            session_count,
            ..Default::default()
        };
        for (id, leitner_box, last_seen) in records {
            state.items.insert(
                id.to_string(),
                ItemMasteryRecord {
                    leitner_box: *leitner_box,
                    last_seen_session: *last_seen,
                    ..Default::default()
                },
            );
        }
        state
    }

    #[test]
    fn fresh_item_correct_moves_to_box_two() {
        let leitner = Leitner::default();
        let mut state = SubjectScheduleState::default();
        leitner.begin_session(&mut state);

        let record = leitner.record_answer(&mut state, "q1", true, now());
        assert_eq!(record.leitner_box, 2);
        assert_eq!(record.correct_count, 1);
        assert_eq!(record.last_seen_session, 1);
    }

    #[test]
    fn wrong_answer_resets_to_box_one() {
        let leitner = Leitner::default();
        let mut state = state_with(3, &[("q1", 4, 2)]);

        let record = leitner.record_answer(&mut state, "q1", false, now());
        assert_eq!(record.leitner_box, 1);
        assert_eq!(record.wrong_count, 1);
        assert_eq!(record.last_seen_session, 3);
    }

    #[test]
    fn box_caps_at_five() {
        let leitner = Leitner::default();
        let mut state = SubjectScheduleState::default();
        for _ in 0..5 {
            leitner.begin_session(&mut state);
            leitner.record_answer(&mut state, "q1", true, now());
        }
        assert_eq!(state.items["q1"].leitner_box, 5);

        leitner.record_answer(&mut state, "q1", true, now());
        assert_eq!(state.items["q1"].leitner_box, 5);
        assert_eq!(state.items["q1"].correct_count, 6);
    }

    #[test]
    fn last_seen_never_decreases() {
        let leitner = Leitner::default();
        let mut state = state_with(2, &[("q1", 1, 7)]);
        leitner.record_answer(&mut state, "q1", true, now());
        assert_eq!(state.items["q1"].last_seen_session, 7);
    }

    #[test]
    fn begin_session_advances_clock() {
        let leitner = Leitner::default();
        let mut state = SubjectScheduleState::default();
        assert_eq!(leitner.begin_session(&mut state), 1);
        assert_eq!(leitner.begin_session(&mut state), 2);
    }

    #[test]
    fn due_box_one_outranks_due_box_four() {
        let leitner = Leitner::default();
        let state = state_with(20, &[("hard", 4, 1), ("easy", 1, 1)]);
        let items = vec![Item::new("hard"), Item::new("easy")];

        let ranked = leitner.prioritize(&state, &items);
        assert_eq!(ranked[0].item.id, "easy");
        assert_eq!(ranked[0].priority, 500);
        assert_eq!(ranked[1].priority, 200);
        assert!(ranked.iter().all(|s| s.due));
    }

    #[test]
    fn due_box_one_outranks_fresh_seen_box_one() {
        let leitner = Leitner::default();
        let state = state_with(5, &[("seen_now", 1, 5), ("stale", 1, 3)]);
        let items = vec![Item::new("seen_now"), Item::new("stale")];

        let ranked = leitner.prioritize(&state, &items);
        assert_eq!(ranked[0].item.id, "stale");
        assert!(ranked[0].due);
        assert!(!ranked[1].due);
        assert_eq!(ranked[1].priority, 5);
    }

    #[test]
    fn lower_box_wins_among_not_due() {
        let leitner = Leitner::default();
        let state = state_with(4, &[("b4", 4, 4), ("b2", 2, 4)]);
        let items = vec![Item::new("b4"), Item::new("b2")];

        let ranked = leitner.prioritize(&state, &items);
        assert_eq!(ranked[0].item.id, "b2");
        assert_eq!(ranked[0].priority, 4);
        assert_eq!(ranked[1].priority, 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let leitner = Leitner::default();
        let state = state_with(1, &[]);
        let items: Vec<Item> = ["a", "b", "c"].iter().map(|id| Item::new(*id)).collect();

        let ranked = leitner.prioritize(&state, &items);
        let ids: Vec<&str> = ranked.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(ranked.iter().all(|s| s.due && s.leitner_box == 1));
    }

    #[test]
    fn interval_table() {
        let leitner = Leitner::default();
        let intervals: Vec<u32> = (1..=5).map(|b| leitner.interval(b)).collect();
        assert_eq!(intervals, vec![1, 2, 4, 8, 16]);
        assert_eq!(leitner.interval(0), 1);
        assert_eq!(leitner.interval(9), 16);
    }

    #[test]
    fn stats_group_boxes() {
        let leitner = Leitner::default();
        let state = state_with(
            3,
            &[("a", 1, 0), ("b", 2, 0), ("c", 3, 0), ("d", 4, 0), ("e", 5, 0)],
        );

        let stats = leitner.mastery_stats(&state, 8);
        assert_eq!(
            stats,
            MasteryStats {
                unseen: 3,
                learning: 2,
                reviewing: 2,
                mastered: 1,
            }
        );

        assert_eq!(leitner.mastery_stats(&state, 2).unseen, 0);
    }
}
