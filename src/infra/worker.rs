use crate::domain::{Snapshot, VersionInfo};
use crate::infra::{ApiClient, ApiError, PROBE_TIMEOUT, READY_PROBE_TIMEOUT};
use std::io;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::JoinHandle;

/// The calls a worker can make against the backend.
pub trait Backend: Send + 'static {
    fn fetch_snapshot(&self) -> Result<Snapshot, ApiError>;
    fn probe(&self) -> Result<(), ApiError>;
    fn fetch_version(&self) -> Result<VersionInfo, ApiError>;
    fn trigger_update(&self) -> Result<(), ApiError>;
    fn probe_ready(&self) -> Result<(), ApiError>;
}

impl Backend for ApiClient {
    fn fetch_snapshot(&self) -> Result<Snapshot, ApiError> {
        ApiClient::fetch_snapshot(self)
    }

    fn probe(&self) -> Result<(), ApiError> {
        ApiClient::probe(self, PROBE_TIMEOUT)
    }

    fn fetch_version(&self) -> Result<VersionInfo, ApiError> {
        ApiClient::fetch_version(self)
    }

    fn trigger_update(&self) -> Result<(), ApiError> {
        ApiClient::trigger_update(self)
    }

    fn probe_ready(&self) -> Result<(), ApiError> {
        ApiClient::probe(self, READY_PROBE_TIMEOUT)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApiRequest {
    FetchSnapshot,
    /// Liveness probe; the id comes back with the result.
    Probe(u64),
    FetchVersion,
    TriggerUpdate,
    /// Readiness probe for the update wait with this id.
    ProbeReady(u64),
}

#[derive(Debug)]
pub enum ApiResponse {
    Snapshot(Result<Snapshot, ApiError>),
    Probe {
        probe: u64,
        result: Result<(), ApiError>,
    },
    Version(Result<VersionInfo, ApiError>),
    UpdateTriggered(Result<(), ApiError>),
    Ready {
        wait: u64,
        result: Result<(), ApiError>,
    },
}

/// A background thread that runs backend calls in submission order.
///
/// Stopping (or dropping) the worker closes both channel ends. A call that is
/// still in flight finishes on its own thread and its result is discarded.
#[derive(Debug)]
pub struct ApiWorker {
    tx: Option<Sender<ApiRequest>>,
    rx: Option<Receiver<ApiResponse>>,
    handle: Option<JoinHandle<()>>,
}

impl ApiWorker {
    pub fn spawn<B: Backend>(name: &str, backend: B) -> io::Result<Self> {
        let (request_tx, request_rx) = channel::<ApiRequest>();
        let (response_tx, response_rx) = channel::<ApiResponse>();

        let handle = std::thread::Builder::new()
            .name(format!("ccdash-{name}"))
            .spawn(move || {
                while let Ok(request) = request_rx.recv() {
                    let response = run_request(&backend, request);
                    if response_tx.send(response).is_err() {
                        return;
                    }
                }
            })?;

        Ok(Self {
            tx: Some(request_tx),
            rx: Some(response_rx),
            handle: Some(handle),
        })
    }

    /// Returns `false` once the worker is stopped.
    pub fn submit(&self, request: ApiRequest) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok())
    }

    pub fn try_recv(&self) -> Option<ApiResponse> {
        self.rx.as_ref().and_then(|rx| rx.try_recv().ok())
    }

    pub fn stop(&mut self) {
        self.tx = None;
        self.rx = None;
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for ApiWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_request<B: Backend>(backend: &B, request: ApiRequest) -> ApiResponse {
    match request {
        ApiRequest::FetchSnapshot => ApiResponse::Snapshot(backend.fetch_snapshot()),
        ApiRequest::Probe(probe) => ApiResponse::Probe {
            probe,
            result: backend.probe(),
        },
        ApiRequest::FetchVersion => ApiResponse::Version(backend.fetch_version()),
        ApiRequest::TriggerUpdate => ApiResponse::UpdateTriggered(backend.trigger_update()),
        ApiRequest::ProbeReady(wait) => ApiResponse::Ready {
            wait,
            result: backend.probe_ready(),
        },
    }
}
