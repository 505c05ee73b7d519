//! Session selection: which items a sitting presents, in what order.
//!
//! Practice sittings sample a capped, topic-balanced set weighted by mastery
//! and shuffle it. Exam sittings serve everything in a fixed didactic order.

use crate::scheduler::Leitner;
use crate::types::{
    Choices, EffectiveSettings, Item, ScheduledItem, SessionRotationState, SittingMode,
    SubjectScheduleState,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Build the ordered item sequence for one sitting.
///
/// `rotation` is the subject's rotation counter for this sitting; the caller
/// advances it afterwards. The pool is never modified: output items are
/// copies, with multiple-choice options reshuffled in practice mode.
pub fn select<R: Rng + ?Sized>(
    pool: &[Item],
    mode: SittingMode,
    settings: &EffectiveSettings,
    schedule: &SubjectScheduleState,
    rotation: SessionRotationState,
    leitner: &Leitner,
    rng: &mut R,
) -> Vec<ScheduledItem> {
    match mode {
        SittingMode::Practice => practice(pool, settings, schedule, rotation, leitner, rng),
        SittingMode::Exam => exam_order(pool, settings)
            .into_iter()
            .map(|item| leitner.annotate(schedule, item))
            .collect(),
    }
}

fn practice<R: Rng + ?Sized>(
    pool: &[Item],
    settings: &EffectiveSettings,
    schedule: &SubjectScheduleState,
    rotation: SessionRotationState,
    leitner: &Leitner,
    rng: &mut R,
) -> Vec<ScheduledItem> {
    let chosen: Vec<&Item> = match settings.session_cap {
        Some(cap) if cap < pool.len() => {
            sample_by_topic(pool, cap, schedule, rotation, leitner, rng)
        }
        _ => pool.iter().collect(),
    };

    let mut scheduled: Vec<ScheduledItem> = chosen
        .into_iter()
        .map(|item| leitner.annotate(schedule, item))
        .collect();
    scheduled.shuffle(rng);
    if let Some(cap) = settings.session_cap {
        scheduled.truncate(cap);
    }

    for entry in &mut scheduled {
        if let Some(choices) = entry.item.choices.as_mut() {
            shuffle_choices(choices, rng);
        }
    }

    scheduled
}

/// Pick `cap` items spread evenly across topic groups.
///
/// Groups are taken in rotation order starting at `session_num % groups`.
/// Each contributes `cap / groups` items and the first `cap % groups` one
/// extra. A short group is not topped up from other groups; only untagged
/// items fill the remaining slots.
fn sample_by_topic<'a, R: Rng + ?Sized>(
    pool: &'a [Item],
    cap: usize,
    schedule: &SubjectScheduleState,
    rotation: SessionRotationState,
    leitner: &Leitner,
    rng: &mut R,
) -> Vec<&'a Item> {
    let mut groups: Vec<(&str, Vec<&Item>)> = Vec::new();
    let mut ungrouped: Vec<&Item> = Vec::new();

    for item in pool {
        match item.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(topic) => match groups.iter_mut().find(|(name, _)| *name == topic) {
                Some((_, members)) => members.push(item),
                None => groups.push((topic, vec![item])),
            },
            None => ungrouped.push(item),
        }
    }

    let mut chosen = Vec::with_capacity(cap);

    if !groups.is_empty() {
        let count = groups.len();
        let start = rotation.session_num as usize % count;
        let base = cap / count;
        let remainder = cap % count;

        for offset in 0..count {
            let (_, members) = &groups[(start + offset) % count];
            let quota = base + usize::from(offset < remainder);
            chosen.extend(
                rank_candidates(members, schedule, leitner, rng)
                    .into_iter()
                    .take(quota),
            );
        }
    }

    if chosen.len() < cap {
        let needed = cap - chosen.len();
        chosen.extend(
            rank_candidates(&ungrouped, schedule, leitner, rng)
                .into_iter()
                .take(needed),
        );
    }

    chosen
}

/// Shuffle, then order by scheduler priority so due low-box items are
/// sampled first and equal priorities come out in random order.
fn rank_candidates<'a, R: Rng + ?Sized>(
    candidates: &[&'a Item],
    schedule: &SubjectScheduleState,
    leitner: &Leitner,
    rng: &mut R,
) -> Vec<&'a Item> {
    let mut ranked = candidates.to_vec();
    ranked.shuffle(rng);
    ranked.sort_by_cached_key(|item| Reverse(leitner.priority(schedule, &item.id)));
    ranked
}

fn shuffle_choices<R: Rng + ?Sized>(choices: &mut Choices, rng: &mut R) {
    let mut order: Vec<usize> = (0..choices.options.len()).collect();
    order.shuffle(rng);

    if let Some(correct) = order.iter().position(|&i| i == choices.correct) {
        choices.correct = correct;
    }
    choices.options = order
        .iter()
        .map(|&i| choices.options[i].clone())
        .collect();
}

/// Exam order: pool order, or the configured phases followed by unlisted items.
///
/// A listed id brings every pool item carrying it, in pool order, the first
/// time it appears in the phases.
fn exam_order<'a>(pool: &'a [Item], settings: &EffectiveSettings) -> Vec<&'a Item> {
    let order = match &settings.exam_order {
        Some(order) if !settings.preserve_order => order,
        _ => return pool.iter().collect(),
    };

    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, item) in pool.iter().enumerate() {
        positions.entry(item.id.as_str()).or_default().push(index);
    }

    let mut emitted = vec![false; pool.len()];
    let mut ordered = Vec::with_capacity(pool.len());

    for id in order.ids() {
        for &index in positions.get(id).into_iter().flatten() {
            if !emitted[index] {
                emitted[index] = true;
                ordered.push(&pool[index]);
            }
        }
    }
    for (index, item) in pool.iter().enumerate() {
        if !emitted[index] {
            ordered.push(item);
        }
    }

    ordered
}
