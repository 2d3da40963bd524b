//! Blocking HTTP GET with courteous 429 backoff.
//!
//! Uses async reqwest internally on a shared tokio runtime, but presents a
//! sync interface: every request blocks the run until it returns.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::header::{ACCEPT, RETRY_AFTER, USER_AGENT};

use crate::error::HttpError;
use crate::retry::RetryPolicy;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identification sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(
    "bibharvest/",
    env!("CARGO_PKG_VERSION"),
    " (publication metadata and figure harvester)"
);

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Status, `Retry-After` and body of one request, before any policy is applied.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: Vec<u8>,
}

/// Sends exactly one GET. Swapped for a scripted fake in tests.
pub trait Transport {
    fn send(&self, url: &str, user_agent: &str) -> Result<RawResponse, HttpError>;
}

/// Source of backoff waits. Swapped for a recording fake in tests.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// reqwest-backed transport on [`SHARED_RUNTIME`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self {
            client: SHARED_CLIENT.clone(),
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, url: &str, user_agent: &str) -> Result<RawResponse, HttpError> {
        SHARED_RUNTIME.handle().block_on(async {
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, user_agent)
                .header(ACCEPT, "*/*")
                .send()
                .await
                .map_err(|e| HttpError::from_reqwest(&e))?;

            let status = response.status();
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            // Error bodies are never used
            let body = if status.is_success() {
                response
                    .bytes()
                    .await
                    .map_err(|e| HttpError::from_reqwest(&e))?
                    .to_vec()
            } else {
                Vec::new()
            };

            Ok(RawResponse {
                status: status.as_u16(),
                retry_after,
                body,
            })
        })
    }
}

/// Anything that can GET a URL and hand back the body.
///
/// Pipelines depend on this rather than on [`HttpClient`] so they can be
/// driven by an in-memory fake.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError>;

    /// GET decoded as UTF-8, invalid sequences replaced
    fn get_text(&self, url: &str) -> Result<String, HttpError> {
        let bytes = self.get(url)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// HTTP client applying a [`RetryPolicy`] to 429 responses.
///
/// Any other non-success status, and a 429 on the last allowed attempt,
/// is returned as an error immediately.
pub struct HttpClient<T = ReqwestTransport, C = SystemClock> {
    transport: T,
    clock: C,
    policy: RetryPolicy,
    user_agent: String,
}

impl HttpClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_parts(ReqwestTransport::default(), SystemClock, policy)
    }
}

impl<T: Transport, C: Clock> HttpClient<T, C> {
    pub fn with_parts(transport: T, clock: C, policy: RetryPolicy) -> Self {
        Self {
            transport,
            clock,
            policy,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<T: Transport, C: Clock> Fetch for HttpClient<T, C> {
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let mut attempt = 0u32;
        loop {
            let response = self.transport.send(url, &self.user_agent)?;
            match response.status {
                200..=299 => return Ok(response.body),
                429 if self.policy.can_retry(attempt) => {
                    let delay = self.policy.delay(attempt, response.retry_after.as_deref());
                    log::warn!(
                        "Rate limited (attempt {}/{}), waiting {:.1}s",
                        attempt + 1,
                        self.policy.max_attempts,
                        delay.as_secs_f64()
                    );
                    self.clock.sleep(delay);
                    attempt += 1;
                }
                429 => {
                    log::error!("Rate limited {} times, giving up: {url}", attempt + 1);
                    return Err(HttpError::RateLimited {
                        attempts: attempt + 1,
                        url: url.to_string(),
                    });
                }
                status => {
                    return Err(HttpError::Status {
                        status,
                        url: url.to_string(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    #[derive(Default)]
    struct ScriptedTransport {
        responses: RefCell<VecDeque<RawResponse>>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<RawResponse>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                calls: RefCell::default(),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, url: &str, user_agent: &str) -> Result<RawResponse, HttpError> {
            self.calls
                .borrow_mut()
                .push((url.to_string(), user_agent.to_string()));
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| HttpError::Transport {
                    message: "script exhausted".to_string(),
                })
        }
    }

    #[derive(Default)]
    struct RecordingClock {
        sleeps: RefCell<Vec<Duration>>,
    }

    impl Clock for RecordingClock {
        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    fn ok(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            retry_after: None,
            body: body.as_bytes().to_vec(),
        }
    }

    fn too_many(retry_after: Option<&str>) -> RawResponse {
        RawResponse {
            status: 429,
            retry_after: retry_after.map(str::to_string),
            body: Vec::new(),
        }
    }

    fn client(responses: Vec<RawResponse>) -> HttpClient<ScriptedTransport, RecordingClock> {
        HttpClient::with_parts(
            ScriptedTransport::new(responses),
            RecordingClock::default(),
            RetryPolicy::default(),
        )
    }

    #[test]
    fn success_returns_body() {
        let client = client(vec![ok("hello")]);
        assert_eq!(client.get("https://x/").unwrap(), b"hello");
        assert!(client.clock().sleeps.borrow().is_empty());
    }

    #[test]
    fn sends_user_agent() {
        let client = client(vec![ok("")]).with_user_agent("test-agent/1");
        client.get("https://x/").unwrap();
        let calls = client.transport().calls.borrow();
        assert_eq!(calls[0].1, "test-agent/1");
    }

    #[test]
    fn honors_retry_after() {
        let client = client(vec![too_many(Some("2")), ok("done")]);
        assert_eq!(client.get_text("https://x/").unwrap(), "done");
        assert_eq!(*client.clock().sleeps.borrow(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn backoff_without_header_grows_per_attempt() {
        let client = client(vec![too_many(None), too_many(None), ok("done")]);
        client.get("https://x/").unwrap();
        assert_eq!(
            *client.clock().sleeps.borrow(),
            vec![Duration::from_millis(1500), Duration::from_secs(3)]
        );
    }

    #[test]
    fn gives_up_after_four_attempts() {
        let client = client(vec![
            too_many(None),
            too_many(None),
            too_many(None),
            too_many(None),
            ok("never"),
        ]);
        let err = client.get("https://x/").unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(client.transport().calls.borrow().len(), 4);
        assert_eq!(client.clock().sleeps.borrow().len(), 3);
    }

    #[test]
    fn other_status_fails_without_retry() {
        let client = client(vec![
            RawResponse {
                status: 503,
                retry_after: Some("1".to_string()),
                body: Vec::new(),
            },
            ok("never"),
        ]);
        let err = client.get("https://x/").unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(client.transport().calls.borrow().len(), 1);
        assert!(client.clock().sleeps.borrow().is_empty());
    }

    #[test]
    fn transport_error_propagates() {
        let client = client(Vec::new());
        let err = client.get("https://x/").unwrap_err();
        assert_eq!(err.status(), None);
    }
}
