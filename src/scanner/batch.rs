// DANS : src/scanner/batch.rs

use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{error, info};

/// Exécute `task` sur chaque élément, par lots concurrents de `batch_size`,
/// avec une pause de `delay` entre deux lots.
/// Le résultat garde l'ordre des entrées ; une tâche qui panique est journalisée et vaut `None`.
pub async fn run_in_batches<T, R, F, Fut>(items: Vec<T>, batch_size: usize, delay: Duration, task: F) -> Vec<Option<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let batch_size = batch_size.max(1);
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut pending = items.into_iter().peekable();
    let mut batch_index = 0;

    while pending.peek().is_some() {
        let handles: Vec<_> = pending.by_ref().take(batch_size).map(|item| tokio::spawn(task(item))).collect();
        batch_index += 1;
        info!(batch = batch_index, size = handles.len(), total, "[Batch] Lot lancé.");

        for joined in futures_util::future::join_all(handles).await {
            match joined {
                Ok(result) => results.push(Some(result)),
                Err(e) => {
                    error!(error = %e, "[Batch] Une tâche a échoué.");
                    results.push(None);
                }
            }
        }

        if pending.peek().is_some() && !delay.is_zero() {
            sleep(delay).await;
        }
    }

    results
}
