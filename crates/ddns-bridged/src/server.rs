//! HTTP front-end
//!
//! Accepts dyndns-style update requests on any path, as GET query strings
//! or POST form bodies, and answers with one plain-text outcome line per
//! domain.

use anyhow::{Context, Result};
use bytes::Bytes;
use ddns_bridge_core::SessionOrchestrator;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::params::{BasicCredentials, RequestParams};

/// Answer when no domain candidate parameter is set
pub const NO_DOMAIN_MESSAGE: &str = "No domain parameter provided";

/// How long in-flight requests may take to finish after shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Largest form body accepted
const MAX_FORM_BODY: usize = 16 * 1024;

/// Pause after a failed accept, e.g. when out of file descriptors
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Run every domain of a request and render the response body
pub async fn render_response(
    orchestrator: &SessionOrchestrator,
    params: &RequestParams,
    basic: Option<&BasicCredentials>,
) -> String {
    let domains = params.domain_list();
    if domains.is_empty() {
        debug!("Request without domain parameter");
        return format!("{}\n", NO_DOMAIN_MESSAGE);
    }

    let raw = params.normalize(basic);
    let outcomes = orchestrator.process_batch(&raw, &domains).await;

    outcomes
        .iter()
        .map(|o| format!("{}\n", o.outcome))
        .collect()
}

fn is_form(req: &Request<Incoming>) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}

fn text_response(status: StatusCode, text: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(text.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Read a form body of at most [`MAX_FORM_BODY`] bytes
///
/// On failure the error response to send is returned instead.
async fn read_form_body<B>(body: B) -> Result<String, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_FORM_BODY).collect().await {
        Ok(collected) => Ok(String::from_utf8_lossy(&collected.to_bytes()).into_owned()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Rejected form body larger than {} bytes", MAX_FORM_BODY);
            Err(text_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large\n",
            ))
        }
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            Err(text_response(StatusCode::BAD_REQUEST, "Unreadable request body\n"))
        }
    }
}

/// Handle an HTTP request
///
/// Only form POST bodies are read, and at most [`MAX_FORM_BODY`] bytes.
async fn handle_request(
    orchestrator: Arc<SessionOrchestrator>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    info!("HTTP request: {} {}", req.method(), req.uri().path());

    let query = req.uri().query().map(str::to_string);
    let basic = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(BasicCredentials::from_header);
    let form = req.method() == Method::POST && is_form(&req);

    let form_body = if form {
        match read_form_body(req.into_body()).await {
            Ok(body) => Some(body),
            Err(response) => return Ok(response),
        }
    } else {
        None
    };

    let params = RequestParams::from_parts(query.as_deref(), form_body.as_deref());
    let text = render_response(&orchestrator, &params, basic.as_ref()).await;

    Ok(text_response(StatusCode::OK, text))
}

/// Log a failed accept and wait before the next attempt
async fn back_off_after_accept_error(e: &io::Error) {
    error!("Failed to accept connection: {}", e);
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

/// Serve connections until `shutdown` resolves
///
/// Requests already being handled get [`SHUTDOWN_GRACE`] to finish.
pub async fn serve(
    listener: TcpListener,
    orchestrator: Arc<SessionOrchestrator>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("HTTP server listening on http://{}", local_addr);

    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    back_off_after_accept_error(&e).await;
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        // Reap finished connections
        while connections.try_join_next().is_some() {}

        let orchestrator = orchestrator.clone();
        connections.spawn(async move {
            let service = service_fn(move |req| handle_request(orchestrator.clone(), req));
            let io = TokioIo::new(stream);

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Connection error from {}: {}", remote_addr, e);
            }
        });
    }

    info!("Stopped accepting connections");
    drop(listener);

    let drain = async { while connections.join_next().await.is_some() {} };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        warn!(
            "{} connection(s) still open after {:?}, aborting",
            connections.len(),
            SHUTDOWN_GRACE
        );
        connections.abort_all();
    }

    Ok(())
}
