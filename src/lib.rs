pub mod auth;
pub mod cancel;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod seed;
pub mod services;

pub use engine::{AttemptReport, CurriculumEngine};
pub use error::CurriculumError;
