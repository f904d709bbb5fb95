//! Correlated request envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::BridgeError;

/// Correlation token linking one request to its one response.
pub type CorrelationId = Uuid;

/// A single command addressed to the host application.
///
/// Serialises to exactly the request body the host expects:
/// `{"id": ..., "app": ..., "operation": ..., "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    id: CorrelationId,
    app: String,
    operation: String,
    params: Value,
}

impl CommandEnvelope {
    /// Correlation id of this envelope.
    #[must_use]
    pub const fn id(&self) -> CorrelationId {
        self.id
    }

    /// Session tag of the host integration.
    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Host-recognised action name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Operation parameters (always a JSON object).
    #[must_use]
    pub const fn params(&self) -> &Value {
        &self.params
    }
}

/// Builds envelopes for one session tag.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    app: String,
}

impl EnvelopeBuilder {
    /// Create a builder stamping every envelope with `app`.
    #[must_use]
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    /// Session tag used for built envelopes.
    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Build a new envelope with a fresh correlation id.
    ///
    /// `params` is moved into the envelope, so nothing the caller still holds
    /// can alias it.
    ///
    /// # Errors
    /// Returns `BridgeError::Validation` if `operation` is blank or `params`
    /// is not a JSON object.
    pub fn build(
        &self,
        operation: impl Into<String>,
        params: Value,
    ) -> Result<CommandEnvelope, BridgeError> {
        let operation = operation.into();
        if operation.trim().is_empty() {
            return Err(BridgeError::Validation(
                "operation name cannot be empty".to_string(),
            ));
        }
        if !params.is_object() {
            return Err(BridgeError::Validation(format!(
                "params for '{operation}' must be a JSON object"
            )));
        }

        Ok(CommandEnvelope {
            id: Uuid::new_v4(),
            app: self.app.clone(),
            operation,
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_build_stamps_app_and_operation() {
        let builder = EnvelopeBuilder::new("photoshop");
        let envelope = builder
            .build("getDocumentInfo", json!({}))
            .unwrap();

        assert_eq!(envelope.app(), "photoshop");
        assert_eq!(envelope.operation(), "getDocumentInfo");
        assert_eq!(envelope.params(), &json!({}));
    }

    #[test]
    fn test_ids_are_unique() {
        let builder = EnvelopeBuilder::new("photoshop");
        let ids: HashSet<_> = (0..1000)
            .map(|_| builder.build("getLayers", json!({})).unwrap().id())
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_rejects_blank_operation() {
        let builder = EnvelopeBuilder::new("photoshop");
        let err = builder.build("  ", json!({})).unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
    }

    #[test]
    fn test_rejects_non_object_params() {
        let builder = EnvelopeBuilder::new("photoshop");
        for params in [Value::Null, json!([1, 2]), json!("layer")] {
            let err = builder.build("deleteLayer", params).unwrap_err();
            assert!(matches!(err, BridgeError::Validation(_)));
        }
    }

    #[test]
    fn test_serializes_to_request_body() {
        let builder = EnvelopeBuilder::new("photoshop");
        let envelope = builder
            .build("setActiveDocument", json!({"documentId": 3}))
            .unwrap();

        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["id"], json!(envelope.id().to_string()));
        assert_eq!(body["app"], "photoshop");
        assert_eq!(body["operation"], "setActiveDocument");
        assert_eq!(body["params"]["documentId"], 3);
    }
}
