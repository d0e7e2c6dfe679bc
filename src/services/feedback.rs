use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::CallerScope;
use crate::cancel::CancelSignal;
use crate::db::models::{MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::db::{CurriculumState, CurriculumStore};
use crate::error::CurriculumError;
use crate::services::phonemes::normalize_phoneme;
use crate::services::retry::{retry_on_conflict, RetryPolicy};
use crate::services::validate_score;

pub const SUCCESS_THRESHOLD: i32 = 80;
pub const ADVANCE_DIFFICULTY_THRESHOLD: i32 = 90;
pub const REDUCE_DIFFICULTY_THRESHOLD: i32 = 70;

/// Keeps vocabulary symbols (normalised, first occurrence wins).
///
/// A non-empty input with no valid symbol is rejected; an empty input is
/// accepted and leaves the focus set untouched.
pub fn validate_weak_units(raw: &[String]) -> Result<Vec<String>, CurriculumError> {
    let mut valid: Vec<String> = Vec::with_capacity(raw.len());
    for symbol in raw {
        if let Some(symbol) = normalize_phoneme(symbol) {
            if !valid.contains(&symbol) {
                valid.push(symbol);
            }
        }
    }

    if !raw.is_empty() && valid.is_empty() {
        return Err(CurriculumError::Validation(
            "no valid phoneme symbols provided".to_string(),
        ));
    }
    Ok(valid)
}

/// Applies one scored attempt to `state` in place.
pub fn apply_outcome(state: &mut CurriculumState, score: i32, weak_units: &[String], now: DateTime<Utc>) {
    if score >= SUCCESS_THRESHOLD {
        state.success_streak = state.success_streak.saturating_add(1);
    } else {
        state.success_streak = 0;
    }

    // independent guards, not an if/else chain
    if score >= ADVANCE_DIFFICULTY_THRESHOLD && state.difficulty < MAX_DIFFICULTY {
        state.difficulty += 1;
    }
    if score < REDUCE_DIFFICULTY_THRESHOLD && state.difficulty > MIN_DIFFICULTY {
        state.difficulty -= 1;
    }

    if !weak_units.is_empty() {
        state.focus_units = weak_units.to_vec();
    }

    state.updated_at = now;
}

/// Authorizes, validates, then runs the read-modify-write on the child's
/// curriculum under `policy`, returning the persisted state.
pub async fn apply_feedback<S>(
    store: &S,
    policy: &RetryPolicy,
    caller: &CallerScope,
    child_id: Uuid,
    score: i32,
    weak_units: &[String],
    cancel: &CancelSignal,
) -> Result<CurriculumState, CurriculumError>
where
    S: CurriculumStore + ?Sized,
{
    caller.authorize_child(child_id)?;
    validate_score(score)?;
    let weak_units = validate_weak_units(weak_units)?;

    let persisted = retry_on_conflict(policy, cancel, "apply_feedback", |attempt| {
        let weak_units = &weak_units;
        async move {
            let mut state = cancel
                .guard(store.get_curriculum(child_id))
                .await?
                .unwrap_or_else(|| CurriculumState::new(child_id));

            apply_outcome(&mut state, score, weak_units, Utc::now());

            let persisted = cancel.guard(store.upsert_curriculum(&state)).await?;
            tracing::debug!(%child_id, attempt, version = persisted.version, "curriculum write committed");
            Ok(persisted)
        }
    })
    .await?;

    tracing::info!(
        %child_id,
        score,
        difficulty = persisted.difficulty,
        streak = persisted.success_streak,
        focus = %persisted.focus_csv(),
        "feedback applied"
    );

    Ok(persisted)
}
