//! Property-based tests for the curriculum rules
//!
//! - Difficulty stays within 1..=5, rises on >= 90, falls on < 70, else holds
//! - Success streak either grows by one or resets to zero
//! - Rating updates are monotonic in score and bounded by K
//! - Selection never returns an empty prompt for a non-empty pool

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use speech_curriculum::config::{EloConfig, SelectionConfig};
use speech_curriculum::db::models::{MAX_DIFFICULTY, MIN_DIFFICULTY};
use speech_curriculum::db::{CurriculumState, PrerequisiteEdge};
use speech_curriculum::services::elo::{adjusted_rating, normalize_performance};
use speech_curriculum::services::feedback::apply_outcome;
use speech_curriculum::services::phonemes::VALID_PHONEMES;
use speech_curriculum::services::prerequisites::{PrerequisiteIndex, RatingLookup};
use speech_curriculum::services::selection::{candidate_pool, select_candidates};

// ============================================================================
// Generators
// ============================================================================

fn arb_score() -> impl Strategy<Value = i32> {
    0i32..=100
}

fn arb_phoneme() -> impl Strategy<Value = String> {
    proptest::sample::select(VALID_PHONEMES.to_vec()).prop_map(str::to_string)
}

fn arb_rating() -> impl Strategy<Value = f64> {
    (800u32..=1200u32).prop_map(f64::from)
}

fn arb_ratings() -> impl Strategy<Value = HashMap<String, f64>> {
    proptest::collection::hash_map(arb_phoneme(), arb_rating(), 0..12)
}

fn arb_edges() -> impl Strategy<Value = Vec<PrerequisiteEdge>> {
    proptest::collection::vec(
        (arb_phoneme(), arb_phoneme()).prop_map(|(unit, requires)| PrerequisiteEdge::new(unit, requires)),
        0..10,
    )
}

fn arb_state() -> impl Strategy<Value = CurriculumState> {
    (MIN_DIFFICULTY..=MAX_DIFFICULTY, 0i64..50).prop_map(|(difficulty, streak)| {
        let mut state = CurriculumState::new(Uuid::new_v4());
        state.difficulty = difficulty;
        state.success_streak = streak;
        state
    })
}

// ============================================================================
// Feedback
// ============================================================================

proptest! {
    #[test]
    fn prop_difficulty_follows_score_bands(
        mut state in arb_state(),
        scores in proptest::collection::vec(arb_score(), 1..30),
    ) {
        for score in scores {
            let before = state.difficulty;
            apply_outcome(&mut state, score, &[], Utc::now());

            prop_assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&state.difficulty));
            prop_assert!((state.difficulty - before).abs() <= 1);
            let expected = if score >= 90 && before < MAX_DIFFICULTY {
                before + 1
            } else if score < 70 && before > MIN_DIFFICULTY {
                before - 1
            } else {
                before
            };
            prop_assert_eq!(state.difficulty, expected);
        }
    }

    #[test]
    fn prop_streak_grows_or_resets(mut state in arb_state(), score in arb_score()) {
        let before = state.success_streak;
        apply_outcome(&mut state, score, &[], Utc::now());

        if score >= 80 {
            prop_assert_eq!(state.success_streak, before + 1);
        } else {
            prop_assert_eq!(state.success_streak, 0);
        }
    }

    #[test]
    fn prop_empty_weak_units_keep_focus(
        mut state in arb_state(),
        focus in proptest::collection::vec(arb_phoneme(), 0..5),
        score in arb_score(),
    ) {
        state.focus_units = focus.clone();
        apply_outcome(&mut state, score, &[], Utc::now());
        prop_assert_eq!(state.focus_units, focus);
    }
}

// ============================================================================
// Ratings
// ============================================================================

proptest! {
    #[test]
    fn prop_rating_monotonic_in_score(rating in arb_rating(), a in arb_score(), b in arb_score()) {
        let config = EloConfig::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        let after_low = adjusted_rating(rating, normalize_performance(low), &config);
        let after_high = adjusted_rating(rating, normalize_performance(high), &config);
        prop_assert!(after_low <= after_high);
    }

    #[test]
    fn prop_rating_step_bounded_by_k(rating in arb_rating(), score in arb_score()) {
        let config = EloConfig::default();
        let updated = adjusted_rating(rating, normalize_performance(score), &config);

        prop_assert!(updated.is_finite());
        prop_assert!((updated - rating).abs() <= 2.0 * config.k_factor);
    }

    #[test]
    fn prop_performance_is_clamped(score in any::<i32>()) {
        let perf = normalize_performance(score);
        prop_assert!((-1.0..=1.0).contains(&perf));
    }
}

// ============================================================================
// Selection
// ============================================================================

proptest! {
    #[test]
    fn prop_selection_non_empty_and_ascending(
        focus in proptest::collection::vec(arb_phoneme(), 1..8),
        ratings in arb_ratings(),
        edges in arb_edges(),
    ) {
        let config = SelectionConfig::default();
        let pool = candidate_pool(Some(focus.as_slice()), &config);
        let lookup = RatingLookup::new(ratings, config.default_rating);
        let index = PrerequisiteIndex::from_edges(edges);

        let picked = select_candidates(&pool, &lookup, &index, &config);

        prop_assert!(!picked.is_empty());
        prop_assert!(picked.len() <= config.max_candidates);
        prop_assert!(picked.iter().all(|unit| pool.contains(unit)));
        for pair in picked.windows(2) {
            prop_assert!(lookup.rating_of(&pair[0]) <= lookup.rating_of(&pair[1]));
        }
    }

    #[test]
    fn prop_pool_has_no_duplicates(focus in proptest::collection::vec(arb_phoneme(), 0..12)) {
        let config = SelectionConfig::default();
        let pool = candidate_pool(Some(focus.as_slice()), &config);

        prop_assert!(!pool.is_empty());
        for (i, unit) in pool.iter().enumerate() {
            prop_assert!(!pool[i + 1..].contains(unit));
        }
    }
}
