//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use quizkit_core::Item;
use quizkit_engine::{MemoryStore, StudyEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const SUBJECT: &str = "geography";

/// An engine over a fresh in-memory store.
pub fn engine() -> StudyEngine<MemoryStore> {
    StudyEngine::new(MemoryStore::new())
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A free-text item with one reference answer.
pub fn item(id: &str, topic: &str, answer: &str) -> Item {
    Item {
        question: format!("What is {id}?"),
        ..Item::new(id).with_topic(topic).with_answer(answer)
    }
}

/// Three topics of four items each.
pub fn topic_pool() -> Vec<Item> {
    ["europe", "asia", "africa"]
        .iter()
        .flat_map(|topic| (1..=4).map(move |n| item(&format!("{topic}-{n}"), topic, "answer")))
        .collect()
}
