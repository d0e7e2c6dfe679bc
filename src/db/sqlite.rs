use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::config::DbConfig;
use crate::db::models::millis_to_datetime;
use crate::db::schema::{split_sql_statements, SCHEMA_SQL};
use crate::db::{
    CurriculumState, CurriculumStore, PrerequisiteEdge, PrerequisiteGraph, RatingStore, StoreError,
    UnitRating,
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(config.sqlite.journal_mode)
            .synchronous(config.sqlite.synchronous)
            .busy_timeout(config.sqlite.busy_timeout)
            .foreign_keys(config.sqlite.foreign_keys);

        let pool = pool_options(config).connect_with(options).await?;

        Ok(Self { pool })
    }

    /// Fresh migrated in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let store = Self::connect(&DbConfig::in_memory()).await?;
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        for stmt in split_sql_statements(SCHEMA_SQL) {
            sqlx::query(&stmt).execute(&self.pool).await?;
        }
        tracing::debug!("curriculum schema applied");
        Ok(())
    }

    /// Returns `true` when the edge was not present before.
    pub async fn insert_prerequisite(&self, edge: &PrerequisiteEdge) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"INSERT INTO "unit_prerequisites" ("unit", "requires") VALUES ($1, $2)
               ON CONFLICT ("unit", "requires") DO NOTHING"#,
        )
        .bind(&edge.unit)
        .bind(&edge.requires)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RatingStore for SqliteStore {
    async fn get_rating(&self, child_id: Uuid, unit: &str) -> Result<Option<UnitRating>, StoreError> {
        let row = sqlx::query(
            r#"SELECT "child_id", "unit", "rating", "volatility", "updated_at"
               FROM "unit_ratings"
               WHERE "child_id" = $1 AND "unit" = $2"#,
        )
        .bind(child_id.to_string())
        .bind(unit)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| map_rating_row(&row)).transpose()
    }

    async fn get_ratings_for_child(
        &self,
        child_id: Uuid,
    ) -> Result<HashMap<String, UnitRating>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT "child_id", "unit", "rating", "volatility", "updated_at"
               FROM "unit_ratings"
               WHERE "child_id" = $1"#,
        )
        .bind(child_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut out = HashMap::with_capacity(rows.len());
        for row in &rows {
            let rating = map_rating_row(row)?;
            out.insert(rating.unit.clone(), rating);
        }
        Ok(out)
    }

    async fn upsert_rating(&self, rating: &UnitRating) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO "unit_ratings" ("child_id", "unit", "rating", "volatility", "updated_at")
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT ("child_id", "unit") DO UPDATE SET
                 "rating" = excluded."rating",
                 "volatility" = excluded."volatility",
                 "updated_at" = excluded."updated_at""#,
        )
        .bind(rating.child_id.to_string())
        .bind(&rating.unit)
        .bind(rating.rating)
        .bind(rating.volatility)
        .bind(rating.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PrerequisiteGraph for SqliteStore {
    async fn get_prerequisites_for(&self, units: &[String]) -> Result<Vec<PrerequisiteEdge>, StoreError> {
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT "unit", "requires" FROM "unit_prerequisites" WHERE "unit" IN ("#,
        );
        {
            let mut sep = qb.separated(", ");
            for unit in units {
                sep.push_bind(unit);
            }
        }
        qb.push(r#") ORDER BY "unit", "requires""#);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut edges = Vec::with_capacity(rows.len());
        for row in &rows {
            edges.push(PrerequisiteEdge {
                unit: row.try_get("unit")?,
                requires: row.try_get("requires")?,
            });
        }
        Ok(edges)
    }
}

#[async_trait]
impl CurriculumStore for SqliteStore {
    async fn get_curriculum(&self, child_id: Uuid) -> Result<Option<CurriculumState>, StoreError> {
        let row = sqlx::query(
            r#"SELECT "child_id", "focus_units", "difficulty", "success_streak", "version", "updated_at"
               FROM "child_curricula"
               WHERE "child_id" = $1"#,
        )
        .bind(child_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| map_curriculum_row(&row)).transpose()
    }

    async fn upsert_curriculum(&self, state: &CurriculumState) -> Result<CurriculumState, StoreError> {
        let next_version = state.version + 1;

        let result = if state.is_persisted() {
            sqlx::query(
                r#"UPDATE "child_curricula"
                   SET "focus_units" = $2, "difficulty" = $3, "success_streak" = $4,
                       "version" = $5, "updated_at" = $6
                   WHERE "child_id" = $1 AND "version" = $7"#,
            )
            .bind(state.child_id.to_string())
            .bind(state.focus_csv())
            .bind(state.difficulty)
            .bind(state.success_streak)
            .bind(next_version)
            .bind(state.updated_at.timestamp_millis())
            .bind(state.version)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"INSERT INTO "child_curricula"
                   ("child_id", "focus_units", "difficulty", "success_streak", "version", "updated_at")
                   VALUES ($1, $2, $3, $4, $5, $6)
                   ON CONFLICT ("child_id") DO NOTHING"#,
            )
            .bind(state.child_id.to_string())
            .bind(state.focus_csv())
            .bind(state.difficulty)
            .bind(state.success_streak)
            .bind(next_version)
            .bind(state.updated_at.timestamp_millis())
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                child_id: state.child_id,
            });
        }

        let mut persisted = state.clone();
        persisted.version = next_version;
        Ok(persisted)
    }
}

/// In-memory databases keep one connection open for the pool's lifetime;
/// recycling it would drop the schema and every row.
fn pool_options(config: &DbConfig) -> SqlitePoolOptions {
    let options = SqlitePoolOptions::new().max_connections(config.sqlite.max_connections);
    if config.is_in_memory() {
        options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options
    }
}

fn parse_child_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|err| StoreError::Unavailable(format!("corrupt child id {raw:?}: {err}")))
}

fn map_rating_row(row: &SqliteRow) -> Result<UnitRating, StoreError> {
    let child_id: String = row.try_get("child_id")?;
    Ok(UnitRating {
        child_id: parse_child_id(&child_id)?,
        unit: row.try_get("unit")?,
        rating: row.try_get("rating")?,
        volatility: row.try_get("volatility")?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?),
    })
}

fn map_curriculum_row(row: &SqliteRow) -> Result<CurriculumState, StoreError> {
    let child_id: String = row.try_get("child_id")?;
    let focus: String = row.try_get("focus_units")?;
    Ok(CurriculumState {
        child_id: parse_child_id(&child_id)?,
        focus_units: CurriculumState::parse_focus_csv(&focus),
        difficulty: row.try_get("difficulty")?,
        success_streak: row.try_get("success_streak")?,
        version: row.try_get("version")?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?),
    })
}
