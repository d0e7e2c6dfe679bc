pub mod config;
pub mod memory;
pub mod models;
pub mod schema;
pub mod sqlite;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use models::{AttemptOutcome, CurriculumState, PrerequisiteEdge, UnitRating};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("curriculum for child {child_id} was modified concurrently")]
    Conflict { child_id: Uuid },
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn get_rating(&self, child_id: Uuid, unit: &str) -> Result<Option<UnitRating>, StoreError>;

    async fn get_ratings_for_child(
        &self,
        child_id: Uuid,
    ) -> Result<HashMap<String, UnitRating>, StoreError>;

    async fn upsert_rating(&self, rating: &UnitRating) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PrerequisiteGraph: Send + Sync {
    /// Edges whose source unit is one of `units`.
    async fn get_prerequisites_for(&self, units: &[String]) -> Result<Vec<PrerequisiteEdge>, StoreError>;
}

#[async_trait]
pub trait CurriculumStore: Send + Sync {
    async fn get_curriculum(&self, child_id: Uuid) -> Result<Option<CurriculumState>, StoreError>;

    /// Writes `state` if its `version` still matches the stored row
    /// (`0` = must not exist yet) and returns the persisted record.
    async fn upsert_curriculum(&self, state: &CurriculumState) -> Result<CurriculumState, StoreError>;
}

pub trait Store: RatingStore + PrerequisiteGraph + CurriculumStore {}

impl<T> Store for T where T: RatingStore + PrerequisiteGraph + CurriculumStore {}
