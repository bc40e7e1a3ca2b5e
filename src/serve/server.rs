//! A loopback HTTP server that lives exactly as long as one job.
//!
//! The listener is bound on the calling thread so the job receives a port that is
//! already accepting connections; the axum service runs on a dedicated thread with its
//! own small tokio runtime and is shut down once the job returns, fails or panics.

use std::{
    borrow::Cow,
    io,
    net::{Ipv4Addr, TcpListener},
    ops::RangeInclusive,
    panic::{AssertUnwindSafe, catch_unwind, resume_unwind},
    sync::Arc,
    thread,
};

use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rand::Rng as _;
use tokio::sync::watch;

use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub content_type: Cow<'static, str>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(content_type: impl Into<Cow<'static, str>>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            content_type: Cow::Borrowed("text/plain; charset=utf-8"),
            body: format!("not found: {path}\n").into_bytes(),
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type.into_owned())],
            self.body,
        )
            .into_response()
    }
}

/// Answers one request. Called from a blocking worker, so implementations may do
/// synchronous IO and CPU work.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, method: &Method, path: &str) -> HttpResponse;
}

impl<F> RequestHandler for F
where
    F: Fn(&Method, &str) -> HttpResponse + Send + Sync + 'static,
{
    fn handle(&self, method: &Method, path: &str) -> HttpResponse {
        self(method, path)
    }
}

pub struct EphemeralJobServer<H> {
    handler: Arc<H>,
    ports: RangeInclusive<u16>,
}

impl<H: RequestHandler> EphemeralJobServer<H> {
    /// `ports` must satisfy `1 <= min <= max`.
    pub fn new(handler: H, ports: RangeInclusive<u16>) -> ReelResult<Self> {
        if *ports.start() == 0 || ports.start() > ports.end() {
            return Err(ReelError::config(format!(
                "port range {}..={} must satisfy 1 <= min <= max",
                ports.start(),
                ports.end()
            )));
        }
        Ok(Self {
            handler: Arc::new(handler),
            ports,
        })
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Serve on a random port from the range while `job` runs on this thread.
    ///
    /// The server is always stopped before returning. A job error or panic takes
    /// precedence over a server failure.
    pub fn run<T>(&self, job: impl FnOnce(u16) -> ReelResult<T>) -> ReelResult<T> {
        let ports = self.ports.clone();
        let mut rng = rand::rng();
        self.run_with_picker(move || rng.random_range(ports.clone()), job)
    }

    pub(crate) fn run_with_picker<T>(
        &self,
        pick: impl FnMut() -> u16,
        job: impl FnOnce(u16) -> ReelResult<T>,
    ) -> ReelResult<T> {
        let listener = bind_loopback(pick)?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handler = Arc::clone(&self.handler);
        let server = thread::Builder::new()
            .name("frame-server".to_owned())
            .spawn(move || serve(listener, handler, shutdown_rx))
            .map_err(|e| ReelError::server(format!("spawn server thread: {e}")))?;
        tracing::info!(port, "server listening on 127.0.0.1");

        let outcome = catch_unwind(AssertUnwindSafe(|| job(port)));

        let _ = shutdown_tx.send(true);
        let served = server.join();
        tracing::debug!(port, "server stopped");

        match outcome {
            Err(panic) => resume_unwind(panic),
            Ok(Err(e)) => Err(e),
            Ok(Ok(value)) => match served {
                Ok(Ok(())) => Ok(value),
                Ok(Err(e)) => Err(e),
                Err(panic) => resume_unwind(panic),
            },
        }
    }
}

fn is_port_collision(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable | io::ErrorKind::PermissionDenied
    )
}

/// Retries with a fresh port for as long as binding fails because of the port itself.
fn bind_loopback(mut pick: impl FnMut() -> u16) -> ReelResult<TcpListener> {
    loop {
        let port = pick();
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)) {
            Ok(listener) => return Ok(listener),
            Err(e) if is_port_collision(&e) => {
                tracing::debug!(port, error = %e, "port unavailable, picking another");
            }
            Err(e) => return Err(ReelError::server(format!("bind 127.0.0.1:{port}: {e}"))),
        }
    }
}

fn serve<H: RequestHandler>(
    listener: TcpListener,
    handler: Arc<H>,
    mut shutdown: watch::Receiver<bool>,
) -> ReelResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("frame-server-worker")
        .enable_all()
        .build()
        .map_err(|e| ReelError::server(format!("start runtime: {e}")))?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::from_std(listener)
            .map_err(|e| ReelError::server(format!("register listener: {e}")))?;
        let app = Router::new().fallback(dispatch::<H>).with_state(handler);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while !*shutdown.borrow_and_update() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await
            .map_err(|e| ReelError::server(format!("serve: {e}")))
    })
}

async fn dispatch<H: RequestHandler>(
    State(handler): State<Arc<H>>,
    method: Method,
    uri: Uri,
) -> Response {
    let path = uri.path().to_owned();
    tracing::trace!(%method, path = %path, "request");
    match tokio::task::spawn_blocking(move || handler.handle(&method, &path)).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "request handler failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "handler failed\n").into_response()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/serve/server.rs"]
mod tests;
