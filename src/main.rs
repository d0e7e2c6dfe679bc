use std::sync::Arc;

use uuid::Uuid;

use speech_curriculum::cancel::CancelSignal;
use speech_curriculum::config::Config;
use speech_curriculum::db::config::DbConfig;
use speech_curriculum::db::memory::MemoryStore;
use speech_curriculum::db::sqlite::SqliteStore;
use speech_curriculum::db::Store;
use speech_curriculum::logging::init_tracing;
use speech_curriculum::seed::{default_prerequisites, seed_prerequisites};
use speech_curriculum::CurriculumEngine;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.logging);

    let store = match open_store().await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "failed to open curriculum store");
            std::process::exit(1);
        }
    };

    let engine = CurriculumEngine::new(store, config.curriculum);
    let mut failed = false;

    for arg in std::env::args().skip(1) {
        let child_id = match Uuid::parse_str(&arg) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(arg = %arg, error = %err, "skipping invalid child id");
                failed = true;
                continue;
            }
        };

        match engine.get_next_prompt(child_id, &CancelSignal::never()).await {
            Ok(prompt) => match serde_json::to_string_pretty(&prompt) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    tracing::error!(%child_id, error = %err, "failed to encode prompt");
                    failed = true;
                }
            },
            Err(err) => {
                tracing::error!(%child_id, error = %err, "next prompt failed");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

async fn open_store() -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    let db_config = match DbConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "database not configured, using in-memory store");
            return Ok(Arc::new(MemoryStore::with_prerequisites(default_prerequisites())));
        }
    };

    let store = SqliteStore::connect(&db_config).await?;
    store.migrate().await?;
    if db_config.seed_prerequisites {
        seed_prerequisites(&store).await?;
    }
    tracing::info!(url = %db_config.url, "curriculum store ready");

    Ok(Arc::new(store))
}
