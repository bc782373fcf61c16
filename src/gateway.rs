use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::RetrySettings;
use crate::error::TransportError;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const LOGGED_BODY_BYTES: usize = 200;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("rift_ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")
    })
}

/// One GET against the network: status code and raw body.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: &[(String, String)])
    -> Result<(u16, Vec<u8>), TransportError>;
}

pub struct ReqwestTransport {
    client: &'static Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
        })
    }
}

impl Transport for ReqwestTransport {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<(u16, Vec<u8>), TransportError> {
        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }
        let resp = req.send().map_err(|err| TransportError::Request {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let status = resp.status().as_u16();
        let body = resp.bytes().map_err(|err| TransportError::Body {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        Ok((status, body.to_vec()))
    }
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub cooldown: Duration,
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            cooldown: settings.cooldown(),
        }
    }
}

/// Idempotent GET with fixed-cooldown retries.
///
/// Every non-200 response or transport error is followed by one cooldown
/// before the next attempt. When attempts run out the result is `None`, so
/// callers treat it as "no data" and keep going.
pub struct RequestGateway {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RequestGateway {
    pub fn new(
        transport: Box<dyn Transport>,
        sleeper: Box<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Result<Self> {
        Ok(Self::new(
            Box::new(ReqwestTransport::new()?),
            Box::new(ThreadSleeper),
            RetryPolicy::from(settings),
        ))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn fetch(&self, url: &str, headers: &[(String, String)]) -> Option<Vec<u8>> {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.transport.get(url, headers) {
                Ok((200, body)) => {
                    debug!(url, attempt, bytes = body.len(), "request ok");
                    return Some(body);
                }
                Ok((status, body)) => {
                    let shown = &body[..body.len().min(LOGGED_BODY_BYTES)];
                    warn!(
                        url,
                        attempt,
                        status,
                        body = %String::from_utf8_lossy(shown),
                        "non-success status"
                    );
                }
                Err(err) => {
                    warn!(url, attempt, error = %err, "request failed");
                }
            }
            if attempt < attempts {
                self.sleeper.sleep(self.policy.cooldown);
            }
        }
        warn!(url, attempts, "giving up after retries");
        None
    }
}
