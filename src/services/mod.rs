pub mod elo;
pub mod feedback;
pub mod phonemes;
pub mod prerequisites;
pub mod retry;
pub mod selection;

use crate::error::CurriculumError;

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

pub fn validate_score(score: i32) -> Result<(), CurriculumError> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(CurriculumError::Validation(format!(
            "score must be within {MIN_SCORE}..={MAX_SCORE}, got {score}"
        )))
    }
}
