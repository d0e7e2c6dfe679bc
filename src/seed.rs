use crate::db::sqlite::SqliteStore;
use crate::db::{PrerequisiteEdge, StoreError};

/// Developmental ordering used when a fresh database is provisioned:
/// `(unit, requires)`.
pub const DEFAULT_PREREQUISITES: &[(&str, &str)] = &[
    ("CH", "SH"),
    ("CH", "T"),
    ("JH", "D"),
    ("JH", "ZH"),
    ("SH", "S"),
    ("ZH", "Z"),
    ("TH", "T"),
    ("DH", "D"),
    ("ER", "R"),
    ("NG", "N"),
];

pub fn default_prerequisites() -> Vec<PrerequisiteEdge> {
    DEFAULT_PREREQUISITES
        .iter()
        .map(|(unit, requires)| PrerequisiteEdge::new(*unit, *requires))
        .collect()
}

/// Inserts the default edges, skipping any already present. Returns the
/// number of edges added.
pub async fn seed_prerequisites(store: &SqliteStore) -> Result<usize, StoreError> {
    let mut inserted = 0;
    for edge in default_prerequisites() {
        if store.insert_prerequisite(&edge).await? {
            inserted += 1;
        } else {
            tracing::debug!(unit = %edge.unit, requires = %edge.requires, "prerequisite already seeded");
        }
    }

    if inserted > 0 {
        tracing::info!(inserted, "seeded prerequisite edges");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(seed_prerequisites(&store).await.unwrap(), DEFAULT_PREREQUISITES.len());
        assert_eq!(seed_prerequisites(&store).await.unwrap(), 0);
    }

    #[test]
    fn defaults_reference_known_phonemes() {
        use crate::services::phonemes::is_valid_phoneme;
        for (unit, requires) in DEFAULT_PREREQUISITES {
            assert!(is_valid_phoneme(unit), "{unit}");
            assert!(is_valid_phoneme(requires), "{requires}");
            assert_ne!(unit, requires);
        }
    }
}
