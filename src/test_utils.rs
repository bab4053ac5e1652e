// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API server responses.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock API server that returns predefined responses based on request paths
/// and remembers every request URI it was sent.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<String, (u16, String)>>>,
    requests: Arc<Mutex<Vec<String>>>,
    hanging: Arc<Mutex<Vec<String>>>,
    // One clone per unanswered hanging request
    in_flight: Arc<()>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            hanging: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(()),
        }
    }

    /// Never answer GET requests whose path starts with `path`
    pub fn hang_on_get(self, path: &str) -> Self {
        self.hanging.lock().unwrap().push(path.to_string());
        self
    }

    /// Number of hanging requests whose response future is still alive
    pub fn hanging_in_flight(&self) -> usize {
        Arc::strong_count(&self.in_flight) - 1
    }

    /// Add a response for GET requests whose path is `path` or starts with it
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Build a kube Client, keeping this handle to inspect requests
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Path and query of every request received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn find_response(&self, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(path) {
            return Some(resp.clone());
        }

        // Longest registered prefix wins
        responses
            .iter()
            .filter(|(p, _)| path.starts_with(p.as_str()))
            .max_by_key(|(p, _)| p.len())
            .map(|(_, resp)| resp.clone())
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path().to_string();
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| path.clone());
        self.requests.lock().unwrap().push(path_and_query);

        let hangs = req.method() == http::Method::GET
            && self
                .hanging
                .lock()
                .unwrap()
                .iter()
                .any(|p| path.starts_with(p.as_str()));
        if hangs {
            let held = self.in_flight.clone();
            return Box::pin(async move {
                let _held = held;
                std::future::pending::<Result<Response<Body>, tower::BoxError>>().await
            });
        }

        let response = if req.method() == http::Method::GET {
            self.find_response(&path)
        } else {
            None
        };

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("path", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// A Service selecting `app=cost-analyzer` whose port 9090 targets `target_port`
pub fn service_json(name: &str, target_port: Option<u16>) -> String {
    let mut port = serde_json::json!({"name": "http", "port": 9090});
    if let Some(target) = target_port {
        port["targetPort"] = serde_json::json!(target);
    }
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {"name": name, "namespace": "kubecost"},
        "spec": {
            "selector": {"app": "cost-analyzer"},
            "ports": [port]
        }
    })
    .to_string()
}

/// A PodList with one pod per `(name, phase)`
pub fn pod_list_json(pods: &[(&str, &str)]) -> String {
    let items: Vec<_> = pods
        .iter()
        .map(|(name, phase)| {
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {"name": name, "namespace": "kubecost", "labels": {"app": "cost-analyzer"}},
                "spec": {"containers": [{"name": "cost-model"}]},
                "status": {"phase": phase}
            })
        })
        .collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "PodList",
        "metadata": {"resourceVersion": "1"},
        "items": items
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}
