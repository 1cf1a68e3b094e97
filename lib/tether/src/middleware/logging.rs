//! Request/response logging middleware.
//!
//! Every log line of a call carries its call id, so client and server logs
//! can be joined on it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tether_core::CallId;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, Request, Response, Result};

/// Layer that adds request/response logging.
///
/// # Example
///
/// ```ignore
/// use tether::middleware::LoggingLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::new())
///     .service(client);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level, with headers.
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let method = request.method();
        let url = request.url().to_string();
        let call_id = request
            .extensions()
            .get::<CallId>()
            .map(ToString::to_string)
            .unwrap_or_default();
        let level = self.level;

        let span = span!(Level::INFO, "http_request", %method, %url, %call_id);

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => {
                        debug!(headers = ?request.headers(), "sending request");
                    }
                    LogLevel::Info => info!("sending request"),
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() => {
                        info!(status = response.status(), elapsed_ms, "request completed");
                    }
                    Ok(response) => {
                        warn!(
                            status = response.status(),
                            elapsed_ms,
                            "request failed with HTTP error"
                        );
                    }
                    Err(err) => warn!(error = %err, elapsed_ms, "request failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderMap;
    use tower::ServiceExt;
    use tower::service_fn;

    use super::*;
    use crate::Method;

    #[test]
    fn logging_layer_levels() {
        assert_eq!(LoggingLayer::new().level, LogLevel::Info);
        assert_eq!(LoggingLayer::debug().level, LogLevel::Debug);
    }

    #[tokio::test]
    async fn logging_passes_requests_through() {
        let echo = service_fn(|request: Request<Bytes>| async move {
            let status = if request.extensions().get::<CallId>().is_some() { 200 } else { 500 };
            Ok::<_, Error>(Response::new(status, HeaderMap::new(), Bytes::new()))
        });
        let service = LoggingLayer::debug().layer(echo);

        let url = url::Url::parse("http://localhost/ping").expect("url");
        let request = Request::builder(Method::Get, url)
            .extension(CallId::new())
            .build();
        let response = service.oneshot(request).await.expect("response");

        assert_eq!(response.status(), 200);
    }
}
