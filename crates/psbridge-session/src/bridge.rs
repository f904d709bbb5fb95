//! The bridge facade and the process-wide bridge.

use std::sync::{Arc, OnceLock};

use psbridge_core::{BridgeError, CommandResult, EnvelopeBuilder, Session, Transport, session};
use psbridge_transport::HttpTransport;
use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::passthrough::passthrough_sequence;
use crate::runner::SequenceRunner;
use crate::sequence::Sequence;
use crate::target::LayerId;

static BRIDGE: OnceLock<Bridge> = OnceLock::new();

/// Single commands, guarded sequences and raw passthrough over one transport.
pub struct Bridge<T: ?Sized = HttpTransport> {
    dispatcher: Dispatcher<T>,
    runner: SequenceRunner<T>,
}

impl<T: ?Sized> Clone for Bridge<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            runner: self.runner.clone(),
        }
    }
}

impl Bridge<HttpTransport> {
    /// Create an HTTP bridge for `session`.
    ///
    /// # Errors
    /// Returns `BridgeError::Config` if the HTTP client cannot be built.
    pub fn connect(session: &Session) -> Result<Self, BridgeError> {
        let transport = HttpTransport::new(session)?;
        Ok(Self::new(session.app(), Arc::new(transport)))
    }
}

impl<T> Bridge<T>
where
    T: Transport + ?Sized,
{
    /// Create a bridge stamping envelopes with `app`.
    #[must_use]
    pub fn new(app: impl Into<String>, transport: Arc<T>) -> Self {
        let dispatcher = Dispatcher::new(EnvelopeBuilder::new(app), transport);
        let runner = SequenceRunner::new(dispatcher.clone());
        Self { dispatcher, runner }
    }

    /// The unguarded dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// The guarded sequence runner.
    #[must_use]
    pub const fn runner(&self) -> &SequenceRunner<T> {
        &self.runner
    }

    /// Send one command without taking the guard.
    ///
    /// Only for queries: commands that change the selected layer, channel or
    /// document go through [`Bridge::call_exclusive`].
    ///
    /// # Errors
    /// See [`Dispatcher::dispatch`].
    pub async fn dispatch(
        &self,
        operation: &str,
        params: Value,
    ) -> Result<CommandResult, BridgeError> {
        self.dispatcher.dispatch(operation, params).await
    }

    /// Send one command and unwrap its payload.
    ///
    /// # Errors
    /// As [`Bridge::dispatch`], plus `Application` when the host answers
    /// with an ERROR.
    pub async fn call(&self, operation: &str, params: Value) -> Result<Value, BridgeError> {
        self.dispatch(operation, params).await?.into_result()
    }

    /// Send one state-changing command under the guard and unwrap its
    /// payload.
    ///
    /// # Errors
    /// As [`Bridge::call`].
    pub async fn call_exclusive(&self, operation: &str, params: Value) -> Result<Value, BridgeError> {
        self.runner.exclusive(operation, params).await?.into_result()
    }

    /// Run a sequence under the guard.
    ///
    /// # Errors
    /// See [`SequenceRunner::run`].
    pub async fn run(&self, sequence: Sequence) -> Result<CommandResult, BridgeError> {
        self.runner.run(sequence).await
    }

    /// Forward raw descriptors, optionally after selecting `target`.
    ///
    /// # Errors
    /// Returns `Validation` for an empty descriptor list, otherwise see
    /// [`SequenceRunner::run`].
    pub async fn passthrough(
        &self,
        descriptors: Vec<Value>,
        target: Option<LayerId>,
    ) -> Result<CommandResult, BridgeError> {
        self.run(passthrough_sequence(descriptors, target)?).await
    }
}

/// The process-wide bridge, built on first use from the configured session.
///
/// # Errors
/// Returns `BridgeError::Config` if no session has been configured.
pub fn global() -> Result<&'static Bridge, BridgeError> {
    if let Some(bridge) = BRIDGE.get() {
        return Ok(bridge);
    }

    let bridge = Bridge::connect(session::current()?)?;
    Ok(BRIDGE.get_or_init(|| bridge))
}
