//! Single HTTP probe of a robot's health path, reduced to pass/fail.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tracing::{Instrument, debug, debug_span};

use fleet_core::RobotConfig;

/// Result of a single health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeResult {
    /// The health endpoint returned 2xx.
    Healthy,
    /// The health endpoint returned non-2xx.
    Unhealthy,
    /// The probe could not be executed (connection error or timeout).
    Failed,
}

impl ProbeResult {
    pub fn passed(&self) -> bool {
        matches!(self, ProbeResult::Healthy)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbeResult::Healthy => "healthy",
            ProbeResult::Unhealthy => "unhealthy",
            ProbeResult::Failed => "unreachable",
        }
    }
}

/// Boxed future returned by [`Prober::probe`].
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = ProbeResult> + Send + 'a>>;

/// Probes one robot's health endpoint.
pub trait Prober: Send + Sync {
    fn probe<'a>(&'a self, robot: &'a RobotConfig) -> ProbeFuture<'a>;
}

/// Prober that issues a real HTTP request to `http://host:port<path>`.
#[derive(Debug, Clone)]
pub struct HttpProber {
    path: String,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }
}

impl Prober for HttpProber {
    fn probe<'a>(&'a self, robot: &'a RobotConfig) -> ProbeFuture<'a> {
        let span = debug_span!("probe", robot = %robot.id);
        Box::pin(http_probe(robot.address(), &self.path, self.timeout).instrument(span))
    }
}

type ProbeError = Box<dyn std::error::Error + Send + Sync>;

/// Status code of one `GET` on a fresh HTTP/1 connection.
async fn get_status(address: &str, uri: &str) -> Result<http::StatusCode, ProbeError> {
    let stream = tokio::net::TcpStream::connect(address).await?;
    let (mut sender, conn) =
        hyper::client::conn::http1::handshake(hyper_util::rt::TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = http::Request::get(uri)
        .header(http::header::HOST, address)
        .header(http::header::USER_AGENT, "fleet-health/0.1")
        .body(http_body_util::Empty::<bytes::Bytes>::new())?;
    Ok(sender.send_request(req).await?.status())
}

/// Probe `http://<address><path>` once.
///
/// 2xx is `Healthy` and any other status `Unhealthy`. A connection error or
/// running past `timeout` is `Failed`.
pub async fn http_probe(address: String, path: &str, timeout: Duration) -> ProbeResult {
    let uri = format!("http://{address}{path}");
    match tokio::time::timeout(timeout, get_status(&address, &uri)).await {
        Ok(Ok(status)) if status.is_success() => ProbeResult::Healthy,
        Ok(Ok(status)) => {
            debug!(%uri, %status, "robot answered with an error status");
            ProbeResult::Unhealthy
        }
        Ok(Err(e)) => {
            debug!(%uri, error = %e, "robot unreachable");
            ProbeResult::Failed
        }
        Err(_) => {
            debug!(%uri, ?timeout, "robot did not answer in time");
            ProbeResult::Failed
        }
    }
}
