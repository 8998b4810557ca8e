//! Shared test fixtures: a scripted mock transport and a wired-up harness.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use tillpoint_core::config::ReplayConfig;
use tillpoint_core::errors::{GatewayError, TillpointResult};
use tillpoint_core::models::{RequestRecord, TransportReply};
use tillpoint_core::traits::ITransport;
use tillpoint_store::LocalStore;
use tillpoint_sync::{ConnectivityState, ReplayReport, Replayer, RequestGateway, SyncController};

/// One scripted behavior for the mock transport.
#[derive(Debug, Clone)]
pub enum Script {
    /// Respond with this status and optional JSON body.
    Reply(u16, Option<Value>),
    /// Simulate a transport-level failure (no response at all).
    NetworkDown,
}

struct MockInner {
    /// Exact-path responses, checked first. Served repeatedly.
    routes: Mutex<HashMap<String, Script>>,
    /// One-shot scripted responses, consumed in order after the route map.
    script: Mutex<VecDeque<Script>>,
    /// Behavior when nothing is scripted.
    fallback: Mutex<Script>,
    /// Artificial latency per call, for concurrency tests.
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<RequestRecord>>,
}

/// Cheaply cloneable scripted transport. One clone goes to the gateway, the
/// test keeps another to script responses and inspect recorded calls.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    /// A transport that answers 200-with-no-body unless told otherwise.
    pub fn new() -> Self {
        Self::with_fallback(Script::Reply(200, None))
    }

    /// A transport where every unscripted call fails at the network level.
    pub fn down() -> Self {
        Self::with_fallback(Script::NetworkDown)
    }

    fn with_fallback(fallback: Script) -> Self {
        Self {
            inner: Arc::new(MockInner {
                routes: Mutex::new(HashMap::new()),
                script: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(fallback),
                delay: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Serve this response for every call to the exact path.
    pub fn route(&self, path: &str, status: u16, body: Option<Value>) {
        self.inner
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Script::Reply(status, body));
    }

    /// Queue a one-shot response.
    pub fn push_reply(&self, status: u16, body: Option<Value>) {
        self.inner
            .script
            .lock()
            .unwrap()
            .push_back(Script::Reply(status, body));
    }

    /// Queue a one-shot network failure.
    pub fn push_network_down(&self) {
        self.inner
            .script
            .lock()
            .unwrap()
            .push_back(Script::NetworkDown);
    }

    /// Change the unscripted-call behavior.
    pub fn set_fallback(&self, script: Script) {
        *self.inner.fallback.lock().unwrap() = script;
    }

    /// Add artificial latency to every call.
    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    /// Every request the transport has seen, in order.
    pub fn calls(&self) -> Vec<RequestRecord> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }
}

impl ITransport for MockTransport {
    fn send(&self, request: &RequestRecord) -> TillpointResult<TransportReply> {
        self.inner.calls.lock().unwrap().push(request.clone());

        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let script = {
            let routes = self.inner.routes.lock().unwrap();
            if let Some(script) = routes.get(&request.path) {
                script.clone()
            } else {
                drop(routes);
                let mut queue = self.inner.script.lock().unwrap();
                queue
                    .pop_front()
                    .unwrap_or_else(|| self.inner.fallback.lock().unwrap().clone())
            }
        };

        match script {
            Script::Reply(status, body) => Ok(TransportReply { status, body }),
            Script::NetworkDown => Err(GatewayError::Network {
                reason: "connection refused".to_string(),
            }
            .into()),
        }
    }
}

/// Everything wired together over an in-memory store.
pub struct Harness {
    pub transport: MockTransport,
    pub store: Arc<LocalStore>,
    pub connectivity: ConnectivityState,
    pub gateway: Arc<RequestGateway<MockTransport>>,
    pub replayer: Arc<Replayer<MockTransport>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_replay_config(ReplayConfig::default())
    }

    pub fn with_replay_config(config: ReplayConfig) -> Self {
        let transport = MockTransport::new();
        let store = Arc::new(LocalStore::open_in_memory().unwrap());
        let connectivity = ConnectivityState::new(true);
        let gateway = Arc::new(RequestGateway::new(
            transport.clone(),
            Arc::clone(&store),
            connectivity.clone(),
        ));
        let replayer = Arc::new(Replayer::new(
            Arc::clone(&gateway),
            Arc::clone(&store),
            connectivity.clone(),
            &config,
        ));
        Self {
            transport,
            store,
            connectivity,
            gateway,
            replayer,
        }
    }

    /// Build a controller over this harness.
    pub fn controller(&self) -> Arc<SyncController<MockTransport>> {
        Arc::new(SyncController::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.replayer),
            Arc::clone(&self.store),
            self.connectivity.clone(),
        ))
    }

    pub fn go_offline(&self) {
        self.connectivity.set_online(false);
    }

    pub fn go_online(&self) {
        self.connectivity.set_online(true);
    }
}

/// Zero report, for asserting no-op replay passes.
pub fn empty_report() -> ReplayReport {
    ReplayReport::default()
}

/// Opt into log output for a test run (`RUST_LOG=debug cargo test -- --nocapture`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
