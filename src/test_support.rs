//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard as StdMutexGuard, PoisonError};

use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError, TransportFuture};

/// Scripted transport that returns pre-seeded outcomes in FIFO order and
/// records every request it receives.
///
/// Clones share the same script and request log, so a test can hand one
/// clone to the code under test and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Debug, Default)]
struct ScriptState {
    outcomes: VecDeque<Result<ApiResponse, TransportError>>,
    requests: Vec<ApiRequest>,
}

impl ScriptedTransport {
    /// Creates a transport with no queued outcomes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StdMutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a complete response.
    pub fn push_response(&self, response: ApiResponse) {
        self.lock().outcomes.push_back(Ok(response));
    }

    /// Queues a response with an empty body.
    pub fn push_status(&self, status: StatusCode) {
        self.push_response(ApiResponse::new(status, Vec::new()));
    }

    /// Queues a response with a JSON body.
    pub fn push_json(&self, status: StatusCode, body: &Value) {
        self.push_response(ApiResponse::json(status, body));
    }

    /// Queues a transport-level failure.
    pub fn push_error(&self, error: TransportError) {
        self.lock().outcomes.push_back(Err(error));
    }

    /// Returns a snapshot of all requests recorded so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// Returns how many requests have been sent.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_, ApiResponse> {
        let outcome = {
            let mut state = self.lock();
            let method = request.method.to_string();
            let url = request.url.clone();
            state.requests.push(request);
            state
                .outcomes
                .pop_front()
                .unwrap_or_else(|| {
                    Err(TransportError::Request {
                        method,
                        url,
                        message: String::from("no scripted response available"),
                    })
                })
        };
        Box::pin(async move { outcome })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets and removes environment variables while holding a global mutex.
    ///
    /// Pairs with a `None` value are removed for the lifetime of the guard.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Produces a minimal host detail payload as returned by
/// `GET /api/v1/assets/hosts/{id}/`.
#[must_use]
pub fn host_detail_json(id: &str, name: &str, ip: &str, platform: &str) -> Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "ip": ip,
        "platform": platform,
        "nodes_display": ["/Default"],
        "protocols": [{"name": "ssh", "port": 22}],
        "comment": "",
    })
}
