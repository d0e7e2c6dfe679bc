use std::collections::HashMap;

use crate::cancel::CancelSignal;
use crate::db::{PrerequisiteEdge, PrerequisiteGraph};
use crate::error::CurriculumError;

/// Current rating per unit for one child; unrated units read as `default`.
#[derive(Debug, Clone)]
pub struct RatingLookup {
    ratings: HashMap<String, f64>,
    default: f64,
}

impl RatingLookup {
    pub fn new(ratings: HashMap<String, f64>, default: f64) -> Self {
        Self { ratings, default }
    }

    pub fn rating_of(&self, unit: &str) -> f64 {
        self.ratings.get(unit).copied().unwrap_or(self.default)
    }
}

/// Requirement edges grouped by source unit.
///
/// Satisfaction is a single-level check against the direct requirements,
/// so a cyclic edge set cannot cause non-termination.
#[derive(Debug, Clone, Default)]
pub struct PrerequisiteIndex {
    requires: HashMap<String, Vec<String>>,
}

impl PrerequisiteIndex {
    pub fn from_edges(edges: impl IntoIterator<Item = PrerequisiteEdge>) -> Self {
        let mut requires: HashMap<String, Vec<String>> = HashMap::new();
        for edge in edges {
            let entry = requires.entry(edge.unit).or_default();
            if !entry.contains(&edge.requires) {
                entry.push(edge.requires);
            }
        }
        Self { requires }
    }

    pub async fn load<G>(graph: &G, units: &[String], cancel: &CancelSignal) -> Result<Self, CurriculumError>
    where
        G: PrerequisiteGraph + ?Sized,
    {
        let edges = cancel.guard(graph.get_prerequisites_for(units)).await?;
        Ok(Self::from_edges(edges))
    }

    pub fn requirements(&self, unit: &str) -> &[String] {
        self.requires.get(unit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every required unit is rated at or above `threshold`.
    pub fn is_satisfied(&self, unit: &str, ratings: &RatingLookup, threshold: f64) -> bool {
        self.requirements(unit)
            .iter()
            .all(|required| ratings.rating_of(required) >= threshold)
    }

    pub fn unmet<'a>(&'a self, unit: &str, ratings: &RatingLookup, threshold: f64) -> Vec<&'a str> {
        self.requirements(unit)
            .iter()
            .filter(|required| ratings.rating_of(required) < threshold)
            .map(String::as_str)
            .collect()
    }
}
