#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use speech_curriculum::config::CurriculumConfig;
use speech_curriculum::db::memory::MemoryStore;
use speech_curriculum::db::{
    CurriculumState, CurriculumStore, PrerequisiteEdge, PrerequisiteGraph, RatingStore, StoreError,
    UnitRating,
};
use speech_curriculum::CurriculumEngine;

pub fn units(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|unit| unit.to_string()).collect()
}

pub fn memory_engine(store: Arc<MemoryStore>) -> CurriculumEngine {
    CurriculumEngine::new(store, CurriculumConfig::default())
}

/// Wraps a [`MemoryStore`], injecting curriculum conflicts and rating
/// failures, and counting writes.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    conflicts_remaining: AtomicUsize,
    fail_rating_write_at: Option<usize>,
    yield_after_read: bool,
    pub curriculum_writes: AtomicUsize,
    pub rating_writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflicts(conflicts: usize) -> Self {
        Self {
            conflicts_remaining: AtomicUsize::new(conflicts),
            ..Self::default()
        }
    }

    /// The `n`-th rating write (1-based) fails.
    pub fn failing_rating_write(n: usize) -> Self {
        Self {
            fail_rating_write_at: Some(n),
            ..Self::default()
        }
    }

    /// Every curriculum read yields to the scheduler before returning, so
    /// concurrent read-modify-write cycles interleave.
    pub fn yielding() -> Self {
        Self {
            yield_after_read: true,
            ..Self::default()
        }
    }

    pub fn curriculum_writes(&self) -> usize {
        self.curriculum_writes.load(Ordering::SeqCst)
    }

    pub fn rating_writes(&self) -> usize {
        self.rating_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RatingStore for FlakyStore {
    async fn get_rating(&self, child_id: Uuid, unit: &str) -> Result<Option<UnitRating>, StoreError> {
        self.inner.get_rating(child_id, unit).await
    }

    async fn get_ratings_for_child(
        &self,
        child_id: Uuid,
    ) -> Result<HashMap<String, UnitRating>, StoreError> {
        self.inner.get_ratings_for_child(child_id).await
    }

    async fn upsert_rating(&self, rating: &UnitRating) -> Result<(), StoreError> {
        let n = self.rating_writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_rating_write_at == Some(n) {
            return Err(StoreError::Unavailable("injected rating failure".to_string()));
        }
        self.inner.upsert_rating(rating).await
    }
}

#[async_trait]
impl PrerequisiteGraph for FlakyStore {
    async fn get_prerequisites_for(&self, units: &[String]) -> Result<Vec<PrerequisiteEdge>, StoreError> {
        self.inner.get_prerequisites_for(units).await
    }
}

#[async_trait]
impl CurriculumStore for FlakyStore {
    async fn get_curriculum(&self, child_id: Uuid) -> Result<Option<CurriculumState>, StoreError> {
        let state = self.inner.get_curriculum(child_id).await?;
        if self.yield_after_read {
            tokio::task::yield_now().await;
        }
        Ok(state)
    }

    async fn upsert_curriculum(&self, state: &CurriculumState) -> Result<CurriculumState, StoreError> {
        self.curriculum_writes.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .conflicts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Conflict {
                child_id: state.child_id,
            });
        }
        self.inner.upsert_curriculum(state).await
    }
}
