use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::Semaphore;

use crate::ide::plugin::IdePlugin;
use crate::ide::registry::Ide;
use crate::verification::engine::VerificationEngine;
use crate::verification::result::{IneligibleReason, VerificationResult};

/// One plugin to verify against one IDE
#[derive(Debug, Clone)]
pub struct VerificationTask {
    pub plugin: Arc<IdePlugin>,
    pub ide: Ide,
}

impl VerificationTask {
    pub fn new(plugin: Arc<IdePlugin>, ide: Ide) -> Self {
        Self { plugin, ide }
    }
}

/// Runs every task on the blocking pool, at most `parallelism` at a time,
/// and returns the results in task order. A task that panics yields a
/// not-applicable result instead of failing the batch.
pub async fn verify_batch(
    engine: Arc<VerificationEngine>,
    tasks: Vec<VerificationTask>,
) -> Vec<VerificationResult> {
    let permits = engine.config().parallelism.max(1);
    let semaphore = Arc::new(Semaphore::new(permits));
    debug!("Running {} verifications with {} permits", tasks.len(), permits);

    let mut handles = Vec::with_capacity(tasks.len());
    for task in tasks {
        let plugin_id = task.plugin.id().to_string();
        let target = task.ide.version().clone();
        let engine = Arc::clone(&engine);
        let semaphore = Arc::clone(&semaphore);

        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| e.to_string())?;
            tokio::task::spawn_blocking(move || engine.verify(&task.plugin, &task.ide))
                .await
                .map_err(|e| e.to_string())
        });
        handles.push((plugin_id, target, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (plugin_id, target, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(e.to_string()),
        };
        let result = outcome.unwrap_or_else(|message| {
            warn!("Verification of {} against {} aborted: {}", plugin_id, target, message);
            VerificationResult::not_applicable(&plugin_id, target, IneligibleReason::Aborted { message })
        });
        results.push(result);
    }
    results
}
