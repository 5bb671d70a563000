//! Background mutation task
//!
//! Every `mutation_interval` the task changes a random subset of the source
//! table and hands the changed items to the registry for fan-out. It is the
//! only writer of item values; subscriptions only ever add items.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::state::ServerState;

/// Run the mutator until `cancel` fires
pub async fn run_mutator(state: Arc<ServerState>, cancel: CancellationToken) {
    let interval = state.config.mutation_interval;
    let mut rng = StdRng::from_entropy();

    let items = state.table.snapshot().await;
    tracing::info!(
        "Starting mutator (interval: {:?}, {} items)",
        interval,
        items.len()
    );
    for item in &items {
        tracing::debug!(item = item.name.as_str(), value = item.value, "Initial {}", item);
    }

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                run_cycle(&state, &mut rng).await;
            }
            _ = cancel.cancelled() => {
                tracing::info!("Mutator shutting down");
                break;
            }
        }
    }
}

/// One mutate-then-notify cycle. Returns the number of items changed.
pub async fn run_cycle<R: Rng>(state: &ServerState, rng: &mut R) -> usize {
    let changed = state.table.mutate_random_subset(rng).await;
    for item in &changed {
        tracing::debug!(item = item.name.as_str(), value = item.value, "{}", item);
    }

    let dispatched = state.registry.notify(&changed).await;
    if !changed.is_empty() {
        tracing::debug!(changed = changed.len(), dispatched, "Mutation cycle complete");
    }
    changed.len()
}
