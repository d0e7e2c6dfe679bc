use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::CallerScope;
use crate::cancel::CancelSignal;
use crate::config::CurriculumConfig;
use crate::db::{AttemptOutcome, CurriculumState, Store, UnitRating};
use crate::error::CurriculumError;
use crate::services::phonemes::WordTable;
use crate::services::selection::NextPrompt;
use crate::services::{elo, feedback, selection};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReport {
    pub curriculum: CurriculumState,
    pub ratings: Vec<UnitRating>,
}

/// Entry point for the transport layer: one shared instance per process.
#[derive(Clone)]
pub struct CurriculumEngine {
    store: Arc<dyn Store>,
    config: Arc<CurriculumConfig>,
    words: Arc<WordTable>,
}

impl CurriculumEngine {
    pub fn new(store: Arc<dyn Store>, config: CurriculumConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            words: Arc::new(WordTable::default()),
        }
    }

    pub fn with_word_table(mut self, words: WordTable) -> Self {
        self.words = Arc::new(words);
        self
    }

    pub fn config(&self) -> &CurriculumConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    pub async fn update_ratings(
        &self,
        child_id: Uuid,
        target_units: &[String],
        score: i32,
        cancel: &CancelSignal,
    ) -> Result<Vec<UnitRating>, CurriculumError> {
        elo::update_ratings(
            self.store.as_ref(),
            &self.config.elo,
            child_id,
            target_units,
            score,
            cancel,
        )
        .await
    }

    pub async fn get_next_prompt(
        &self,
        child_id: Uuid,
        cancel: &CancelSignal,
    ) -> Result<NextPrompt, CurriculumError> {
        selection::get_next_prompt(
            self.store.as_ref(),
            &self.config.selection,
            &self.words,
            child_id,
            cancel,
        )
        .await
    }

    pub async fn apply_feedback(
        &self,
        caller: &CallerScope,
        child_id: Uuid,
        score: i32,
        weak_units: &[String],
        cancel: &CancelSignal,
    ) -> Result<CurriculumState, CurriculumError> {
        feedback::apply_feedback(
            self.store.as_ref(),
            &self.config.retry,
            caller,
            child_id,
            score,
            weak_units,
            cancel,
        )
        .await
    }

    /// Feedback first, then ratings for the practised units. A rating
    /// failure does not undo the committed feedback.
    pub async fn record_attempt(
        &self,
        caller: &CallerScope,
        outcome: &AttemptOutcome,
        cancel: &CancelSignal,
    ) -> Result<AttemptReport, CurriculumError> {
        let curriculum = self
            .apply_feedback(
                caller,
                outcome.child_id,
                outcome.score,
                &outcome.weak_units,
                cancel,
            )
            .await?;

        let ratings = self
            .update_ratings(outcome.child_id, &outcome.target_units, outcome.score, cancel)
            .await?;

        Ok(AttemptReport { curriculum, ratings })
    }

    pub async fn curriculum_snapshot(
        &self,
        caller: &CallerScope,
        child_id: Uuid,
        cancel: &CancelSignal,
    ) -> Result<CurriculumState, CurriculumError> {
        caller.authorize_child(child_id)?;
        cancel
            .guard(self.store.get_curriculum(child_id))
            .await?
            .ok_or_else(|| CurriculumError::NotFound(format!("no curriculum for child {child_id}")))
    }

    pub async fn ratings_for_child(
        &self,
        caller: &CallerScope,
        child_id: Uuid,
        cancel: &CancelSignal,
    ) -> Result<HashMap<String, UnitRating>, CurriculumError> {
        caller.authorize_child(child_id)?;
        cancel.guard(self.store.get_ratings_for_child(child_id)).await
    }
}
