use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::config::SelectionConfig;
use crate::db::models::MIN_DIFFICULTY;
use crate::db::{CurriculumStore, PrerequisiteGraph, RatingStore};
use crate::error::CurriculumError;
use crate::services::phonemes::WordTable;
use crate::services::prerequisites::{PrerequisiteIndex, RatingLookup};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextPrompt {
    pub words: Vec<String>,
    pub units: Vec<String>,
    pub difficulty: i32,
}

/// Picks up to `config.max_candidates` units from `pool`, weakest first.
///
/// Units whose prerequisites are unmet are skipped unless that would leave
/// nothing, in which case the whole pool is ranked instead.
pub fn select_candidates(
    pool: &[String],
    ratings: &RatingLookup,
    prerequisites: &PrerequisiteIndex,
    config: &SelectionConfig,
) -> Vec<String> {
    let mut candidates: Vec<&String> = pool
        .iter()
        .filter(|unit| prerequisites.is_satisfied(unit, ratings, config.mastery_threshold))
        .collect();

    if candidates.is_empty() {
        if !pool.is_empty() {
            tracing::debug!(pool = ?pool, "no unit has its prerequisites met, ranking full pool");
        }
        candidates = pool.iter().collect();
    }

    // stable: equal ratings keep pool order
    candidates.sort_by(|a, b| ratings.rating_of(a).total_cmp(&ratings.rating_of(b)));

    candidates
        .into_iter()
        .take(config.max_candidates)
        .cloned()
        .collect()
}

/// Distinct units of the focus set, or the configured default pool when the
/// child has none.
pub fn candidate_pool(focus_units: Option<&[String]>, config: &SelectionConfig) -> Vec<String> {
    let source = match focus_units {
        Some(units) if !units.is_empty() => units,
        _ => config.default_focus.as_slice(),
    };

    let mut pool: Vec<String> = Vec::with_capacity(source.len());
    for unit in source {
        if !pool.contains(unit) {
            pool.push(unit.clone());
        }
    }
    pool
}

pub async fn get_next_prompt<S>(
    store: &S,
    config: &SelectionConfig,
    word_table: &WordTable,
    child_id: Uuid,
    cancel: &CancelSignal,
) -> Result<NextPrompt, CurriculumError>
where
    S: CurriculumStore + RatingStore + PrerequisiteGraph + ?Sized,
{
    let (curriculum, ratings) = tokio::try_join!(
        cancel.guard(store.get_curriculum(child_id)),
        cancel.guard(store.get_ratings_for_child(child_id)),
    )?;

    let pool = candidate_pool(
        curriculum.as_ref().map(|state| state.focus_units.as_slice()),
        config,
    );
    let difficulty = curriculum
        .as_ref()
        .map(|state| state.difficulty)
        .unwrap_or(MIN_DIFFICULTY);

    let lookup = RatingLookup::new(
        ratings
            .into_iter()
            .map(|(unit, rating)| (unit, rating.rating))
            .collect(),
        config.default_rating,
    );
    let prerequisites = PrerequisiteIndex::load(store, &pool, cancel).await?;

    let units = select_candidates(&pool, &lookup, &prerequisites, config);
    let words = units
        .iter()
        .map(|unit| word_table.word_for(unit).to_string())
        .collect();

    tracing::debug!(%child_id, units = ?units, difficulty, "next prompt selected");

    Ok(NextPrompt {
        words,
        units,
        difficulty,
    })
}
