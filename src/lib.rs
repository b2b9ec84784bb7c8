pub mod assessment;
mod cli;
pub mod db;
pub mod decision;
pub mod emotion;
pub mod error;
pub mod models;
pub mod reaction;
pub mod remote;
pub mod scoring;
pub mod settings;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::mpsc;

use assessment::{AssessmentController, SessionServices};
use db::Database;
use models::SessionContext;
use remote::HttpBackend;
use settings::SettingsStore;

pub use error::{EngineError, EngineResult};

const DATA_DIR_ENV: &str = "MINDGAMES_DATA_DIR";
const DEBUG_ENV: &str = "MINDGAMES_DEBUG";

fn debug_mode() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::data_dir()
        .map(|dir| dir.join("mindgames"))
        .unwrap_or_else(|| PathBuf::from(".mindgames"))
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(if debug_mode() {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    info!("Mind Games starting up...");

    if let Err(err) = run_terminal_session() {
        log::error!("Session failed: {err:?}");
        std::process::exit(1);
    }
}

fn run_terminal_session() -> Result<()> {
    let app_data_dir = data_dir();
    std::fs::create_dir_all(&app_data_dir)
        .with_context(|| format!("failed to create {}", app_data_dir.display()))?;

    let settings = SettingsStore::new(app_data_dir.join("settings.json"))?
        .settings()
        .with_env_overrides();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let mut context = SessionContext::anonymous();
        let outbox = match Database::new(app_data_dir.join("outbox.sqlite3")) {
            Ok(outbox) => {
                let pending = outbox.pending_count().await?;
                if pending > 0 {
                    warn!("{pending} finished session(s) waiting in the local outbox");
                }
                if let Some(last_login) = outbox.record_login(context.started_at).await? {
                    info!("Last login {}", last_login.to_rfc3339());
                    context = context.with_last_login(last_login);
                }
                Some(outbox)
            }
            Err(err) => {
                warn!("Local outbox unavailable; failed submissions will not be kept: {err:?}");
                None
            }
        };

        let backend = Arc::new(HttpBackend::new(settings.remote.base_url.clone()));
        info!("Using backend at {}", backend.base_url());

        let (presenter, events) = mpsc::unbounded_channel();
        let mut services = SessionServices::new(backend.clone(), backend, Arc::new(presenter));
        if let Some(outbox) = outbox {
            services = services.with_outbox(outbox);
        }

        let controller = AssessmentController::start(context, settings, services);
        let snapshot = cli::run_session(controller, events).await?;
        info!(
            "Session {} finished in {}",
            snapshot.session_id,
            snapshot.stage.as_str()
        );
        Ok::<(), anyhow::Error>(())
    })
}
