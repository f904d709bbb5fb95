//! Fake host proxy for end-to-end tests.
//!
//! Serves the host's JSON protocol on a random local port and answers by
//! operation name:
//! - `getDocumentInfo` - SUCCESS `{width: 800, height: 600}`
//! - `getLayers` - ERROR "no document open"
//! - `hang` - never answers
//! - `garbage` - a body that is not a response object
//! - `wrongId` - SUCCESS echoing someone else's id
//! - anything else - SUCCESS echoing the operation name

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use axum::{
    Extension, Json, Router,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

type Received = Arc<Mutex<Vec<Value>>>;

/// A running fake host; stopped on drop.
pub struct FakeHost {
    addr: SocketAddr,
    received: Received,
    server: JoinHandle<()>,
}

impl FakeHost {
    pub async fn spawn() -> Result<Self> {
        let received = Received::default();
        let app = Router::new()
            .route("/", post(answer))
            .layer(Extension(Arc::clone(&received)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind fake host")?;
        let addr = listener.local_addr().context("fake host address")?;

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("fake host stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            received,
            server,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request bodies received so far, in arrival order.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Drop for FakeHost {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn answer(Extension(received): Extension<Received>, Json(body): Json<Value>) -> Response {
    if let Ok(mut log) = received.lock() {
        log.push(body.clone());
    }

    let id = body["id"].clone();
    match body["operation"].as_str().unwrap_or_default() {
        "getDocumentInfo" => Json(json!({
            "id": id,
            "status": "SUCCESS",
            "response": {"width": 800, "height": 600}
        }))
        .into_response(),
        "getLayers" => Json(json!({
            "id": id,
            "status": "ERROR",
            "error": "no document open"
        }))
        .into_response(),
        "hang" => std::future::pending().await,
        "garbage" => "<html>proxy exploded</html>".into_response(),
        "wrongId" => Json(json!({
            "id": "00000000-0000-4000-8000-000000000000",
            "status": "SUCCESS",
            "response": {}
        }))
        .into_response(),
        operation => Json(json!({
            "status": "SUCCESS",
            "response": {"operation": operation}
        }))
        .into_response(),
    }
}
