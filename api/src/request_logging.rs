use poem::{Endpoint, IntoResponse, Middleware, Request, Response};
use std::time::Instant;

/// Logs every request with method, path, query string, status and duration.
///
/// Search endpoints carry their filters in the query string, so it is logged
/// alongside the path.
pub struct RequestLogging;

impl<E: Endpoint> Middleware<E> for RequestLogging {
    type Output = RequestLoggingEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RequestLoggingEndpoint { inner: ep }
    }
}

pub struct RequestLoggingEndpoint<E> {
    inner: E,
}

impl<E: Endpoint> Endpoint for RequestLoggingEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or_default().to_string();

        let result = self.inner.call(req).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(resp) => {
                let resp = resp.into_response();
                let status = resp.status().as_u16();
                if resp.status().is_success() {
                    tracing::info!(%method, %path, %query, status, duration_ms, "request completed");
                } else {
                    tracing::warn!(%method, %path, %query, status, duration_ms, "request failed");
                }
                Ok(resp)
            }
            Err(err) => {
                let status = err.status().as_u16();
                tracing::error!(
                    %method,
                    %path,
                    %query,
                    status,
                    duration_ms,
                    error = %err,
                    "request error"
                );
                Err(err)
            }
        }
    }
}
