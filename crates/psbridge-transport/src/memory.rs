//! In-memory scripted host.
//!
//! Useful for tests and development without a running host application.
//! Envelopes are recorded in arrival order and answered by the first rule
//! that matches them.

use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use psbridge_core::{BridgeError, CommandEnvelope, CommandResult, Transport};
use serde_json::Value;
use uuid::Uuid;

const MEMORY_ENDPOINT: &str = "memory://host";

/// Scripted answer to an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// SUCCESS with the given payload.
    Success(Value),
    /// ERROR with the given message.
    Error(String),
    /// The round trip fails as if the host were down.
    Unreachable,
    /// No answer ever arrives.
    Hang,
    /// An empty SUCCESS after the given delay.
    Slow(Duration),
}

type Matcher = Box<dyn Fn(&CommandEnvelope) -> bool + Send + Sync>;

struct Rule {
    matches: Matcher,
    reply: Reply,
}

/// In-memory transport implementation.
pub struct MemoryTransport {
    rules: Vec<Rule>,
    fallback: Reply,
    jitter: Option<Duration>,
    requests: Mutex<Vec<CommandEnvelope>>,
}

impl MemoryTransport {
    /// Create a host that answers every envelope with an empty SUCCESS.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Reply::Success(Value::Object(serde_json::Map::new())),
            jitter: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer envelopes for `operation` with `reply`.
    #[must_use]
    pub fn on(self, operation: impl Into<String>, reply: Reply) -> Self {
        let operation = operation.into();
        self.when(move |envelope| envelope.operation() == operation, reply)
    }

    /// Answer envelopes accepted by `predicate` with `reply`.
    #[must_use]
    pub fn when<F>(mut self, predicate: F, reply: Reply) -> Self
    where
        F: Fn(&CommandEnvelope) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            matches: Box::new(predicate),
            reply,
        });
        self
    }

    /// Answer unmatched envelopes with `reply`.
    #[must_use]
    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    /// Delay every answer by a random duration up to `max`.
    #[must_use]
    pub const fn with_jitter(mut self, max: Duration) -> Self {
        self.jitter = Some(max);
        self
    }

    /// Envelopes received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<CommandEnvelope> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Operation names received so far, in arrival order.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|envelope| envelope.operation().to_string())
            .collect()
    }

    fn reply_for(&self, envelope: &CommandEnvelope) -> Reply {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(envelope))
            .map_or_else(|| self.fallback.clone(), |rule| rule.reply.clone())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn random_delay(max: Duration) -> Duration {
    let max_micros = u64::try_from(max.as_micros()).unwrap_or(u64::MAX);
    if max_micros == 0 {
        return Duration::ZERO;
    }
    let (high, _) = Uuid::new_v4().as_u64_pair();
    Duration::from_micros(high % max_micros)
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, envelope: &CommandEnvelope) -> Result<CommandResult, BridgeError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope.clone());

        if let Some(max) = self.jitter {
            tokio::time::sleep(random_delay(max)).await;
        }

        match self.reply_for(envelope) {
            Reply::Success(payload) => Ok(CommandResult::Success(payload)),
            Reply::Error(message) => Ok(CommandResult::Error(message)),
            Reply::Unreachable => Err(BridgeError::Transport {
                endpoint: MEMORY_ENDPOINT.to_string(),
                message: "connection refused".to_string(),
            }),
            Reply::Hang => std::future::pending().await,
            Reply::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(CommandResult::Success(Value::Object(serde_json::Map::new())))
            }
        }
    }
}
