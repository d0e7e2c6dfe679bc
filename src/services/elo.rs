use chrono::Utc;
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::config::EloConfig;
use crate::db::{RatingStore, UnitRating};
use crate::error::CurriculumError;
use crate::services::validate_score;

/// Maps a 0–100 score onto `[-1, 1]`; non-finite results become `0`.
pub fn normalize_performance(score: i32) -> f64 {
    let perf = (score as f64 - 50.0) / 50.0;
    if perf.is_finite() {
        perf.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Probability of success against the fixed task baseline.
pub fn expected_score(rating: f64, baseline: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((baseline - rating) / 400.0))
}

pub fn adjusted_rating(rating: f64, perf: f64, config: &EloConfig) -> f64 {
    let expected = expected_score(rating, config.baseline_rating);
    let actual = (perf + 1.0) / 2.0;
    rating + config.k_factor * (actual - expected)
}

/// Distinct, trimmed, upper-cased, non-empty units in first-seen order.
///
/// Spelling matches `normalize_phoneme` so ratings land under the keys that
/// focus sets and selection use; symbols outside the vocabulary are kept.
pub fn distinct_units(units: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(units.len());
    for unit in units {
        let unit = unit.trim().to_ascii_uppercase();
        if !unit.is_empty() && !out.contains(&unit) {
            out.push(unit);
        }
    }
    out
}

/// Adjusts and persists one rating per distinct target unit.
///
/// Units are written one at a time; a failing write stops the loop and is
/// returned, while ratings already written stay in place.
pub async fn update_ratings<S>(
    store: &S,
    config: &EloConfig,
    child_id: Uuid,
    target_units: &[String],
    score: i32,
    cancel: &CancelSignal,
) -> Result<Vec<UnitRating>, CurriculumError>
where
    S: RatingStore + ?Sized,
{
    validate_score(score)?;

    let units = distinct_units(target_units);
    if units.is_empty() {
        return Ok(Vec::new());
    }

    let perf = normalize_performance(score);
    let mut updated = Vec::with_capacity(units.len());

    for unit in units {
        let mut rating = cancel
            .guard(store.get_rating(child_id, &unit))
            .await?
            .unwrap_or_else(|| UnitRating::new(child_id, unit.as_str(), config.default_rating));

        let previous = rating.rating;
        rating.rating = adjusted_rating(previous, perf, config);
        rating.updated_at = Utc::now();

        if let Err(err) = cancel.guard(store.upsert_rating(&rating)).await {
            tracing::warn!(%child_id, unit = %rating.unit, error = %err, "rating write failed");
            return Err(err);
        }

        tracing::debug!(
            %child_id,
            unit = %rating.unit,
            previous,
            rating = rating.rating,
            "unit rating updated"
        );
        updated.push(rating);
    }

    Ok(updated)
}
