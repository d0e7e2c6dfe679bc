use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::{
    CurriculumState, CurriculumStore, PrerequisiteEdge, PrerequisiteGraph, RatingStore, StoreError,
    UnitRating,
};

#[derive(Debug, Default)]
struct Tables {
    curricula: HashMap<Uuid, CurriculumState>,
    ratings: HashMap<(Uuid, String), UnitRating>,
    prerequisites: Vec<PrerequisiteEdge>,
}

/// Process-local store with the same optimistic-concurrency contract as
/// the SQL store. Locks are only held for the duration of a map access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prerequisites(edges: impl IntoIterator<Item = PrerequisiteEdge>) -> Self {
        let store = Self::new();
        for edge in edges {
            store.add_prerequisite(edge);
        }
        store
    }

    pub fn add_prerequisite(&self, edge: PrerequisiteEdge) {
        let mut tables = self.tables.write();
        if !tables.prerequisites.contains(&edge) {
            tables.prerequisites.push(edge);
        }
    }

    pub fn rating_count(&self) -> usize {
        self.tables.read().ratings.len()
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn get_rating(&self, child_id: Uuid, unit: &str) -> Result<Option<UnitRating>, StoreError> {
        let tables = self.tables.read();
        Ok(tables.ratings.get(&(child_id, unit.to_string())).cloned())
    }

    async fn get_ratings_for_child(
        &self,
        child_id: Uuid,
    ) -> Result<HashMap<String, UnitRating>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .ratings
            .values()
            .filter(|rating| rating.child_id == child_id)
            .map(|rating| (rating.unit.clone(), rating.clone()))
            .collect())
    }

    async fn upsert_rating(&self, rating: &UnitRating) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        tables
            .ratings
            .insert((rating.child_id, rating.unit.clone()), rating.clone());
        Ok(())
    }
}

#[async_trait]
impl PrerequisiteGraph for MemoryStore {
    async fn get_prerequisites_for(&self, units: &[String]) -> Result<Vec<PrerequisiteEdge>, StoreError> {
        if units.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.tables.read();
        Ok(tables
            .prerequisites
            .iter()
            .filter(|edge| units.contains(&edge.unit))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CurriculumStore for MemoryStore {
    async fn get_curriculum(&self, child_id: Uuid) -> Result<Option<CurriculumState>, StoreError> {
        Ok(self.tables.read().curricula.get(&child_id).cloned())
    }

    async fn upsert_curriculum(&self, state: &CurriculumState) -> Result<CurriculumState, StoreError> {
        let mut tables = self.tables.write();
        let stored_version = tables.curricula.get(&state.child_id).map(|row| row.version);

        let expected = if state.version == 0 { None } else { Some(state.version) };
        if stored_version != expected {
            return Err(StoreError::Conflict {
                child_id: state.child_id,
            });
        }

        let mut persisted = state.clone();
        persisted.version = state.version + 1;
        tables.curricula.insert(state.child_id, persisted.clone());
        Ok(persisted)
    }
}
