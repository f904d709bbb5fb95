//! Guarded sequence execution.
//!
//! The host's selected layer, active channel and active document are global
//! mutable state that this process can change but never lock. Every
//! sequence, and every single command that moves that state, therefore runs
//! under one process-side guard so they never interleave.
//!
//! Guarded work runs on its own task holding an owned guard. Dropping the
//! caller's future detaches that task instead of cancelling it, so a started
//! sequence always reaches its restoration step before the guard is freed.

use std::sync::Arc;

use psbridge_core::{
    BridgeError, CommandResult, RestoreFailure, RestoreOutcome, SequenceAbort, SequenceFailure,
    Transport,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::dispatcher::Dispatcher;
use crate::sequence::{Sequence, SubCommand};

/// Mutual exclusion over the host's targeting state.
#[derive(Debug, Default)]
pub struct HostTargetGuard {
    lock: Arc<Mutex<()>>,
}

impl HostTargetGuard {
    /// Create an unheld guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other guarded work is in flight.
    ///
    /// The guard is released when the returned value is dropped; it may be
    /// moved into a spawned task.
    pub async fn acquire(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.lock).lock_owned().await
    }

    /// Whether guarded work currently holds the guard.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

/// Why the primary steps stopped early.
enum StepFailure {
    Rejected {
        step: usize,
        operation: String,
        result: CommandResult,
    },
    Failed {
        step: usize,
        operation: String,
        error: BridgeError,
    },
}

/// Executes sequences one at a time through a dispatcher.
///
/// Clones share the same guard.
pub struct SequenceRunner<T: ?Sized> {
    dispatcher: Dispatcher<T>,
    guard: Arc<HostTargetGuard>,
}

impl<T: ?Sized> Clone for SequenceRunner<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<T> SequenceRunner<T>
where
    T: Transport + ?Sized,
{
    /// Create a runner with its own guard.
    #[must_use]
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Self::with_guard(dispatcher, Arc::new(HostTargetGuard::new()))
    }

    /// Create a runner sharing an existing guard.
    #[must_use]
    pub const fn with_guard(dispatcher: Dispatcher<T>, guard: Arc<HostTargetGuard>) -> Self {
        Self { dispatcher, guard }
    }

    /// The guard this runner serialises on.
    #[must_use]
    pub const fn guard(&self) -> &Arc<HostTargetGuard> {
        &self.guard
    }

    /// Run a sequence without interleaving with any other guarded work.
    ///
    /// Steps run strictly in order and stop at the first failure. The
    /// restoration step, if declared, is issued afterwards in every case,
    /// including when the caller stops polling once the guard is acquired.
    ///
    /// # Errors
    /// - `Validation` if the sequence has no steps (nothing is sent)
    /// - `SequenceAborted` if the host rejected a step
    /// - `SequenceFailed` if a round trip failed and a restoration step was
    ///   declared; without one, the transport's error unchanged
    /// - `RestoreFailed` if every step succeeded but the restoration did not
    pub async fn run(&self, sequence: Sequence) -> Result<CommandResult, BridgeError> {
        if sequence.is_empty() {
            return Err(BridgeError::Validation(
                "sequence must contain at least one step".to_string(),
            ));
        }

        let dispatcher = self.dispatcher.clone();
        self.hold_until_done(async move { execute(&dispatcher, &sequence).await })
            .await
    }

    /// Send one command that moves host targeting state, under the guard.
    ///
    /// # Errors
    /// As [`Dispatcher::dispatch`].
    pub async fn exclusive(
        &self,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<CommandResult, BridgeError> {
        let dispatcher = self.dispatcher.clone();
        let operation = operation.to_string();
        self.hold_until_done(async move { dispatcher.dispatch(&operation, params).await })
            .await
    }

    async fn hold_until_done<F>(&self, work: F) -> Result<CommandResult, BridgeError>
    where
        F: Future<Output = Result<CommandResult, BridgeError>> + Send + 'static,
    {
        let held = self.guard.acquire().await;
        let task = tokio::spawn(async move {
            let outcome = work.await;
            drop(held);
            outcome
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(BridgeError::Interrupted(e.to_string())),
        }
    }
}

async fn execute<T>(
    dispatcher: &Dispatcher<T>,
    sequence: &Sequence,
) -> Result<CommandResult, BridgeError>
where
    T: Transport + ?Sized,
{
    let outcome = run_steps(dispatcher, sequence.steps()).await;
    let restore = match sequence.restore() {
        Some(step) => restore(dispatcher, step).await,
        None => RestoreOutcome::NotApplicable,
    };
    let restored = matches!(
        restore,
        RestoreOutcome::Succeeded | RestoreOutcome::NotApplicable
    );

    match outcome {
        Ok(result) if restored => Ok(result),
        Ok(result) => {
            let failure = RestoreFailure { result, restore };
            tracing::error!("{failure}");
            Err(failure.into())
        }
        Err(StepFailure::Rejected {
            step,
            operation,
            result,
        }) => {
            let abort = SequenceAbort {
                step,
                operation,
                result,
                restore,
            };
            tracing::warn!("{abort}");
            Err(abort.into())
        }
        Err(StepFailure::Failed { step, error, .. })
            if restore == RestoreOutcome::NotApplicable =>
        {
            tracing::warn!(step, "Sequence step failed: {error}");
            Err(error)
        }
        Err(StepFailure::Failed {
            step,
            operation,
            error,
        }) => {
            let failure = SequenceFailure {
                step,
                operation,
                error,
                restore,
            };
            tracing::warn!("{failure}");
            Err(failure.into())
        }
    }
}

async fn run_steps<T>(
    dispatcher: &Dispatcher<T>,
    steps: &[SubCommand],
) -> Result<CommandResult, StepFailure>
where
    T: Transport + ?Sized,
{
    let mut last = None;
    for (step, command) in steps.iter().enumerate() {
        tracing::debug!(step, operation = %command.operation, "Running sequence step");

        let result = dispatcher
            .dispatch(&command.operation, command.params.clone())
            .await
            .map_err(|error| StepFailure::Failed {
                step,
                operation: command.operation.clone(),
                error,
            })?;

        if !result.is_success() {
            return Err(StepFailure::Rejected {
                step,
                operation: command.operation.clone(),
                result,
            });
        }
        last = Some(result);
    }

    Ok(last.unwrap_or(CommandResult::Success(serde_json::Value::Null)))
}

async fn restore<T>(dispatcher: &Dispatcher<T>, step: &SubCommand) -> RestoreOutcome
where
    T: Transport + ?Sized,
{
    match dispatcher
        .dispatch(&step.operation, step.params.clone())
        .await
    {
        Ok(CommandResult::Success(_)) => RestoreOutcome::Succeeded,
        Ok(CommandResult::Error(message)) => {
            tracing::error!("Restoration step rejected by host: {message}");
            RestoreOutcome::Failed { message }
        }
        Err(e) => {
            tracing::error!("Restoration step round trip failed: {e}");
            RestoreOutcome::Attempted {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use psbridge_core::EnvelopeBuilder;
    use psbridge_transport::{MemoryTransport, Reply};
    use serde_json::json;

    use super::*;
    use crate::target::{self, Channel, LayerId};

    fn runner(host: &Arc<MemoryTransport>) -> SequenceRunner<MemoryTransport> {
        SequenceRunner::new(Dispatcher::new(
            EnvelopeBuilder::new("photoshop"),
            Arc::clone(host),
        ))
    }

    fn mask_edit(id: u32) -> Sequence {
        Sequence::targeting(LayerId(id))
            .then(target::select_channel(Channel::Mask))
            .then(SubCommand::new("drawGradient", json!({"layerId": id})))
            .restore_with(target::select_channel(Channel::Rgb))
    }

    #[tokio::test]
    async fn test_returns_final_step_result() {
        let host = Arc::new(
            MemoryTransport::new().on("drawGradient", Reply::Success(json!({"drawn": true}))),
        );

        let result = runner(&host).run(mask_edit(3)).await.unwrap();
        assert_eq!(result.response(), Some(&json!({"drawn": true})));
        assert_eq!(host.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_rejected_step_aborts_and_restores() {
        let host = Arc::new(MemoryTransport::new().on(
            "drawGradient",
            Reply::Error("Could not complete the gradient".to_string()),
        ));

        let err = runner(&host).run(mask_edit(3)).await.unwrap_err();
        let BridgeError::SequenceAborted(abort) = err else {
            panic!("expected abort, got {err:?}");
        };
        assert_eq!(abort.step, 2);
        assert_eq!(abort.operation, "drawGradient");
        assert_eq!(abort.restore, RestoreOutcome::Succeeded);

        let sent = host.requests();
        assert_eq!(sent.len(), 4);
        assert_eq!(
            sent[3].params(),
            &target::select_channel(Channel::Rgb).params
        );
    }

    #[tokio::test]
    async fn test_failed_restore_reported_alongside() {
        let rgb = target::select_channel(Channel::Rgb).params;
        let host = Arc::new(
            MemoryTransport::new()
                .when(
                    move |e| e.params() == &rgb,
                    Reply::Error("channel unavailable".to_string()),
                )
                .on("drawGradient", Reply::Error("no mask".to_string())),
        );

        let err = runner(&host).run(mask_edit(3)).await.unwrap_err();
        let BridgeError::SequenceAborted(abort) = err else {
            panic!("expected abort, got {err:?}");
        };
        assert_eq!(abort.result.error(), Some("no mask"));
        assert_eq!(
            abort.restore,
            RestoreOutcome::Failed {
                message: "channel unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure_carries_restore() {
        let host = Arc::new(MemoryTransport::new().on("drawGradient", Reply::Unreachable));
        let runner = runner(&host);

        let err = runner.run(mask_edit(3)).await.unwrap_err();
        assert!(err.is_transport_class());
        let BridgeError::SequenceFailed(failure) = err else {
            panic!("expected failure, got {err:?}");
        };
        assert_eq!(failure.step, 2);
        assert!(matches!(failure.error, BridgeError::Transport { .. }));
        assert_eq!(failure.restore, RestoreOutcome::Succeeded);
        assert!(!runner.guard().is_held());
        assert_eq!(host.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_transport_failure_without_restore_unchanged() {
        let host = Arc::new(MemoryTransport::new().on("drawGradient", Reply::Unreachable));
        let sequence = Sequence::targeting(LayerId(3))
            .then(SubCommand::new("drawGradient", json!({"layerId": 3})));

        let err = runner(&host).run(sequence).await.unwrap_err();
        assert!(matches!(err, BridgeError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_failed_restore_after_success_is_an_error() {
        let rgb = target::select_channel(Channel::Rgb).params;
        let host = Arc::new(MemoryTransport::new().when(
            move |e| e.params() == &rgb,
            Reply::Error("channel unavailable".to_string()),
        ));

        let err = runner(&host).run(mask_edit(3)).await.unwrap_err();
        let BridgeError::RestoreFailed(failure) = err else {
            panic!("expected restore failure, got {err:?}");
        };
        assert!(failure.result.is_success());
        assert_eq!(
            failure.restore,
            RestoreOutcome::Failed {
                message: "channel unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_sequence_rejected() {
        let host = Arc::new(MemoryTransport::new());
        let err = runner(&host).run(Sequence::new()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
        assert!(host.requests().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_caller_still_restores() {
        let host = Arc::new(MemoryTransport::new().on(
            "drawGradient",
            Reply::Slow(std::time::Duration::from_millis(100)),
        ));
        let runner = runner(&host);

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            runner.run(mask_edit(3)),
        )
        .await;
        assert!(pending.is_err());
        assert!(runner.guard().is_held());

        // The detached run finishes on its own and frees the guard.
        tokio::time::timeout(std::time::Duration::from_secs(1), runner.guard().acquire())
            .await
            .unwrap();
        let sent = host.requests();
        assert_eq!(sent.len(), 4);
        assert_eq!(
            sent[3].params(),
            &target::select_channel(Channel::Rgb).params
        );
    }

    #[tokio::test]
    async fn test_exclusive_waits_for_running_sequence() {
        let host = Arc::new(MemoryTransport::new().on("drawGradient", Reply::Hang));
        let runner = runner(&host);

        let stuck = tokio::spawn({
            let runner = runner.clone();
            async move { runner.run(mask_edit(3)).await }
        });
        while host.requests().len() < 3 {
            tokio::task::yield_now().await;
        }

        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            runner.exclusive("mergeDown", json!({"layerId": 5})),
        )
        .await;
        assert!(blocked.is_err());
        assert_eq!(host.requests().len(), 3);
        stuck.abort();
    }
}
