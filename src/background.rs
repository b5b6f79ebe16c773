//! Host-ownable background sweeps.
//!
//! Two periodic tasks keep the store healthy without blocking foreground
//! retrieval: embedding regeneration (fills pending owners in small
//! batches) and location familiarity decay. The host owns the tokio
//! runtime and the shutdown signal; cadences come from configuration.
//!
//! Sweep errors are logged and swallowed — a failing provider or a locked
//! database must never kill the loop.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::watch;

use crate::config::{BackgroundConfig, LifecycleConfig, LocationConfig};
use crate::embedding::Embedder;
use crate::lifecycle::{regenerate_batch, Space};
use crate::location::decay::apply_familiarity_decay;

/// Periodically regenerate pending embeddings in both spaces.
///
/// Runs until `shutdown` flips to `true`. Each tick embeds at most one
/// batch per space, so a large backlog drains gradually without starving
/// foreground writers of the connection.
pub async fn run_regeneration_sweep(
    db: Arc<Mutex<Connection>>,
    embedder: Arc<dyn Embedder>,
    background: BackgroundConfig,
    lifecycle: LifecycleConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = std::time::Duration::from_secs(background.regen_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let conn = db.lock().expect("database mutex poisoned");
                for space in [Space::Text, Space::Visual] {
                    match regenerate_batch(&conn, embedder.as_ref(), space, lifecycle.regen_batch_size) {
                        Ok(0) => {}
                        Ok(count) => {
                            tracing::info!(?space, count, "background regeneration batch");
                        }
                        Err(e) => {
                            tracing::warn!(?space, error = %e, "regeneration sweep failed");
                        }
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::debug!("regeneration sweep shutting down");
                    break;
                }
            }
        }
    }
}

/// Periodically apply location familiarity decay.
///
/// The decay pass is idempotent within a stale window, so the cadence only
/// bounds how quickly staleness is noticed.
pub async fn run_decay_sweep(
    db: Arc<Mutex<Connection>>,
    background: BackgroundConfig,
    location: LocationConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = std::time::Duration::from_secs(background.decay_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let conn = db.lock().expect("database mutex poisoned");
                match apply_familiarity_decay(&conn, &location) {
                    Ok(0) => {}
                    Ok(changed) => {
                        tracing::info!(changed, "background decay sweep");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "decay sweep failed");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::debug!("decay sweep shutting down");
                    break;
                }
            }
        }
    }
}
