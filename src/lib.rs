//! Kairos — appointment scheduling core for clinical record systems.
//!
//! The crate is organized around four collaborators:
//! - `authorization` — privilege-tier access guard plus the status-reset gate
//! - `validation` — pluggable, non-fail-fast validator pipelines
//! - `db` — SQLite persistence and the append-only audit trail
//! - `lifecycle` — the engine composing the above into create / change-status /
//!   undo operations, each an all-or-nothing unit of work
//!
//! Transport, notification, and scheduling-optimization concerns live in the
//! adapters that embed this crate.

pub mod authorization;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod validation;

use tracing_subscriber::EnvFilter;

/// Install a tracing subscriber for hosts that do not bring their own.
///
/// Honors `RUST_LOG` when set; otherwise falls back to the crate default.
/// Safe to call more than once.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .ok();
}
