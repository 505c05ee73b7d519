//! Study engine: sittings, answer checks, and mastery bookkeeping over a store.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use quizkit_core::{
    check, check_keywords, normalize, select, EffectiveSettings, GlobalSettings, Item,
    ItemMasteryRecord, Leitner, MasteryStats, MatchOptions, MatchVerdict, SessionRotationState,
    SittingMode, SubjectScheduleState, SubjectSettings, SynonymTable,
};
use rand::Rng;
use tracing::{debug, warn};

use crate::db::KeyValueStore;
use crate::error::Result;
use crate::grader::{CachedGrade, GradeRequest, SemanticCache, SemanticGrader};
use crate::persist::{self, rotation_key, schedule_key, SEMANTIC_CACHE_KEY};
use crate::sitting::{AnswerCheck, Sitting, SittingTally, VerdictSource};

/// Deterministic verdicts scoring at least this are never escalated.
const CONFIDENT_SCORE: f64 = 0.9;

const DEFAULT_CACHE_TTL_DAYS: i64 = 7;

/// Runs sittings for any number of subjects against one store.
pub struct StudyEngine<S> {
    store: Arc<Mutex<S>>,
    grader: Option<Arc<dyn SemanticGrader>>,
    cache: Arc<Mutex<SemanticCache>>,
    synonyms: SynonymTable,
    leitner: Leitner,
    settings: GlobalSettings,
    cache_ttl: Duration,
}

impl<S> StudyEngine<S>
where
    S: KeyValueStore + Send + 'static,
{
    /// Create an engine, loading the persisted grading cache.
    pub fn new(store: S) -> Self {
        let cache = match persist::load::<SemanticCache, _>(&store, SEMANTIC_CACHE_KEY) {
            Ok(loaded) => loaded.value,
            Err(e) => {
                warn!(error = %e, "could not load grading cache, starting empty");
                SemanticCache::default()
            }
        };

        Self {
            store: Arc::new(Mutex::new(store)),
            grader: None,
            cache: Arc::new(Mutex::new(cache)),
            synonyms: SynonymTable::default(),
            leitner: Leitner::default(),
            settings: GlobalSettings::default(),
            cache_ttl: Duration::days(DEFAULT_CACHE_TTL_DAYS),
        }
    }

    pub fn with_grader(mut self, grader: Arc<dyn SemanticGrader>) -> Self {
        self.grader = Some(grader);
        self
    }

    pub fn with_settings(mut self, settings: GlobalSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn with_leitner(mut self, leitner: Leitner) -> Self {
        self.leitner = leitner;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    /// Start a sitting with a thread-local RNG.
    pub fn start_sitting(
        &self,
        subject: &str,
        pool: &[Item],
        mode: SittingMode,
        subject_settings: Option<&SubjectSettings>,
    ) -> Result<Sitting> {
        self.start_sitting_with_rng(subject, pool, mode, subject_settings, &mut rand::thread_rng())
    }

    /// Start a sitting: advance the mastery clock, then compose the item list.
    ///
    /// Practice sittings also advance the topic rotation; the rotation value
    /// from before the advance drives this sitting.
    pub fn start_sitting_with_rng<R: Rng + ?Sized>(
        &self,
        subject: &str,
        pool: &[Item],
        mode: SittingMode,
        subject_settings: Option<&SubjectSettings>,
        rng: &mut R,
    ) -> Result<Sitting> {
        let settings = EffectiveSettings::merge(&self.settings, subject_settings);

        let (schedule, rotation) = {
            let store = self.lock_store();
            let (schedule, session_count) = persist::update(
                &*store,
                &schedule_key(subject),
                |state: &mut SubjectScheduleState| self.leitner.begin_session(state),
            )?;
            debug!(subject, session_count, "mastery clock advanced");

            let rotation = match mode {
                SittingMode::Practice => {
                    let (_, previous) = persist::update(
                        &*store,
                        &rotation_key(subject),
                        |rotation: &mut SessionRotationState| {
                            let previous = *rotation;
                            rotation.session_num = rotation.session_num.wrapping_add(1);
                            previous
                        },
                    )?;
                    previous
                }
                SittingMode::Exam => SessionRotationState::default(),
            };
            (schedule, rotation)
        };

        let items = select(pool, mode, &settings, &schedule, rotation, &self.leitner, rng);
        let time_limit = match mode {
            SittingMode::Exam => settings
                .exam_duration_minutes
                .map(|minutes| std::time::Duration::from_secs(u64::from(minutes) * 60)),
            SittingMode::Practice => None,
        };

        debug!(
            subject,
            ?mode,
            pool = pool.len(),
            selected = items.len(),
            rotation = rotation.session_num,
            "sitting composed"
        );

        Ok(Sitting {
            subject: subject.to_string(),
            mode,
            session_count: schedule.session_count,
            items,
            settings,
            time_limit,
            tally: SittingTally::default(),
        })
    }

    /// Check an answer, escalating to the semantic grader when unsure.
    ///
    /// Never fails: grader trouble is logged and the deterministic verdict
    /// stands. The grader call runs on its own task and caches its result
    /// even if this future is dropped.
    pub async fn check_answer(
        &self,
        sitting: &Sitting,
        item: &Item,
        user_answer: &str,
    ) -> AnswerCheck {
        let options = MatchOptions::from_settings(&sitting.settings);
        let synonyms = if item.synonyms.is_empty() {
            Cow::Borrowed(&self.synonyms)
        } else {
            Cow::Owned(self.synonyms.clone().augment(&item.synonyms))
        };

        let (verdict, keywords) = if !item.answers.is_empty() {
            (check(user_answer, &item.answers, &options, &synonyms), None)
        } else if !item.keywords.is_empty() {
            let report = check_keywords(user_answer, &item.keywords, &options, &synonyms);
            (report.verdict(), Some(report))
        } else {
            (MatchVerdict::none(0.0), None)
        };

        let deterministic = AnswerCheck {
            verdict,
            source: VerdictSource::Deterministic,
            feedback: None,
            keywords,
        };

        if verdict.matched && verdict.score >= CONFIDENT_SCORE {
            return deterministic;
        }
        if !sitting.settings.semantic_fallback {
            return deterministic;
        }
        // Blank answers and items without references are definite misses
        let expected = expected_answer(item);
        if normalize(user_answer).is_empty() || normalize(&expected).is_empty() {
            return deterministic;
        }
        let Some(grader) = self.grader.clone() else {
            return deterministic;
        };

        let key = SemanticCache::key(user_answer, &expected, &item.question);

        let cached = self
            .lock_cache()
            .get(&key, Utc::now(), self.cache_ttl)
            .cloned();
        if let Some(hit) = cached {
            debug!(item = %item.id, "semantic cache hit");
            return AnswerCheck {
                verdict: hit.verdict,
                source: VerdictSource::Cache,
                feedback: hit.feedback,
                ..deterministic
            };
        }

        let request = GradeRequest {
            user_answer: user_answer.to_string(),
            expected_answer: expected,
            question: item.question.clone(),
        };
        let grader_name = grader.name().to_string();
        let store = Arc::clone(&self.store);
        let cache = Arc::clone(&self.cache);

        let task = tokio::spawn(async move {
            let response = grader.grade(&request).await?;
            let grade = CachedGrade {
                timestamp: Utc::now(),
                verdict: response.verdict(),
                feedback: response.feedback.clone(),
            };
            remember(&store, &cache, key, grade.clone());
            Ok::<_, crate::grader::GradeError>(grade)
        });

        match task.await {
            Ok(Ok(grade)) => {
                debug!(
                    item = %item.id,
                    grader = %grader_name,
                    matched = grade.verdict.matched,
                    "semantic verdict"
                );
                AnswerCheck {
                    verdict: grade.verdict,
                    source: VerdictSource::Semantic,
                    feedback: grade.feedback,
                    ..deterministic
                }
            }
            Ok(Err(e)) => {
                warn!(
                    item = %item.id,
                    grader = %grader_name,
                    error = %e,
                    "semantic grading failed, keeping local verdict"
                );
                deterministic
            }
            Err(e) => {
                warn!(item = %item.id, error = %e, "semantic grading task aborted");
                deterministic
            }
        }
    }

    /// Persist one answer and count it toward the sitting.
    pub fn record_answer(
        &self,
        sitting: &mut Sitting,
        item_id: &str,
        correct: bool,
    ) -> Result<ItemMasteryRecord> {
        let store = self.lock_store();
        let now = Utc::now();
        let (_, record) = persist::update(
            &*store,
            &schedule_key(&sitting.subject),
            |state: &mut SubjectScheduleState| {
                self.leitner.record_answer(state, item_id, correct, now).clone()
            },
        )?;
        sitting.tally.record(correct);

        debug!(
            subject = %sitting.subject,
            item = item_id,
            correct,
            leitner_box = record.leitner_box,
            "answer recorded"
        );
        Ok(record)
    }

    pub fn load_schedule(&self, subject: &str) -> Result<SubjectScheduleState> {
        let store = self.lock_store();
        Ok(persist::load(&*store, &schedule_key(subject))?.value)
    }

    pub fn mastery_stats(&self, subject: &str, total_items: usize) -> Result<MasteryStats> {
        let schedule = self.load_schedule(subject)?;
        Ok(self.leitner.mastery_stats(&schedule, total_items))
    }

    /// Forget a subject's mastery and rotation state.
    pub fn reset_subject(&self, subject: &str) -> Result<()> {
        let store = self.lock_store();
        store.remove(&schedule_key(subject))?;
        store.remove(&rotation_key(subject))?;
        Ok(())
    }

    fn lock_store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, SemanticCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The reference answer sent to the grader.
fn expected_answer(item: &Item) -> String {
    match item.answers.first() {
        Some(answer) => answer.clone(),
        None => item.keywords.join(", "),
    }
}

/// Record a grade in memory and in the store.
fn remember<S: KeyValueStore>(
    store: &Mutex<S>,
    cache: &Mutex<SemanticCache>,
    key: String,
    grade: CachedGrade,
) {
    let store = store.lock().unwrap_or_else(PoisonError::into_inner);
    let written = persist::update(&*store, SEMANTIC_CACHE_KEY, |stored: &mut SemanticCache| {
        stored.insert(key.clone(), grade.clone());
    });

    let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
    match written {
        Ok((stored, ())) => *cache = stored,
        Err(e) => {
            warn!(error = %e, "could not persist grading cache");
            cache.insert(key, grade);
        }
    }
}
