//! Common test utilities and helpers

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use processos_api::api::{build_router, AppState};
use processos_api::config::CorsPolicy;
use processos_api::models::{MonetaryValue, Process};
use processos_api::store::InMemoryProcessStore;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Test application builder wiring the real router to an in-memory store
pub struct TestAppBuilder {
    processes: Vec<Process>,
    connected: bool,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            connected: true,
        }
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.processes.push(process);
        self
    }

    pub fn with_processes(mut self, processes: impl IntoIterator<Item = Process>) -> Self {
        self.processes.extend(processes);
        self
    }

    /// Leave the database unattached, as before the connection completes
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    pub fn build(self) -> TestApp {
        let store = InMemoryProcessStore::with_processes(self.processes);
        let state = AppState::new();
        if self.connected {
            state.attach(Arc::new(store.clone()));
        }
        TestApp {
            router: build_router(state.clone(), &CorsPolicy::AllowAll),
            store,
            state,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryProcessStore,
    pub state: AppState,
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }
}

/// Process with the fields most tests care about
pub fn process(nup: &str) -> Process {
    Process {
        nup: Some(nup.to_string()),
        numero_processo: Some(format!("PROC-{nup}")),
        credenciado: Some("Hospital Central".to_string()),
        ..Default::default()
    }
}

pub fn assigned(nup: &str, responsavel: &str, valor: MonetaryValue) -> Process {
    Process {
        responsavel: Some(responsavel.to_string()),
        valor_capa: Some(valor),
        ..process(nup)
    }
}
