//! Failure taxonomy and status classification.
//!
//! # Responsibilities
//! - Represent every dispatch failure as one of a closed set of kinds
//! - Unwrap aggregate failures to their first genuine cause
//! - Map each kind to an HTTP status code and a log severity
//!
//! # Design Decisions
//! - Collaborator failures that fit no kind land in `Unexpected` (500)
//! - Transport churn (resets, cancellation) is expected and logged quietly

use axum::http::{Method, StatusCode};
use std::io;
use thiserror::Error;

/// Boxed error raised by collaborator code outside the gateway.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raised when a handler or filter tries to change status or headers after
/// the response has been committed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("response has already started")]
pub struct ResponseStarted;

/// Errors that can occur while dispatching a request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller supplied an invalid argument.
    #[error("{0}")]
    InvalidArgument(String),

    /// Authentication or authorization failed.
    #[error("{0}")]
    Unauthorized(String),

    /// No route, file or resource matched.
    #[error("{0}")]
    NotFound(String),

    /// The route exists but does not accept this verb.
    #[error("Method {0} is not allowed")]
    MethodNotAllowed(Method),

    /// A service the handler depends on is unreachable.
    #[error("{0}")]
    UpstreamUnavailable(String),

    /// The transport cancelled the dispatch.
    #[error("Request was cancelled")]
    Cancelled,

    /// I/O failure from the body, the filesystem or the socket.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Several failures raised together; the first one is the real cause.
    #[error("{} errors occurred", .0.len())]
    Aggregate(Vec<GatewayError>),

    #[error(transparent)]
    ResponseStarted(#[from] ResponseStarted),

    /// Anything else escaping from collaborator code.
    #[error("{0}")]
    Unexpected(BoxError),
}

impl GatewayError {
    /// Wrap an arbitrary collaborator error.
    pub fn unexpected<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Unexpected(err.into())
    }

    /// Follow aggregate failures down to their first inner cause.
    pub fn root_cause(&self) -> &GatewayError {
        match self {
            Self::Aggregate(inner) => match inner.first() {
                Some(first) => first.root_cause(),
                None => self,
            },
            other => other,
        }
    }
}

/// How loudly a failure is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected client or security failure: message only.
    Expected,
    /// Network churn or cancellation: debug at most.
    Churn,
    /// Bug or unknown collaborator failure: full detail.
    Unexpected,
}

/// Map a failure to the status code written to the client.
pub fn classify(err: &GatewayError) -> StatusCode {
    match err.root_cause() {
        GatewayError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        GatewayError::Io(e) if e.kind() == io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Decide how a failure should be logged.
pub fn severity(err: &GatewayError) -> Severity {
    match err.root_cause() {
        GatewayError::InvalidArgument(_)
        | GatewayError::Unauthorized(_)
        | GatewayError::NotFound(_)
        | GatewayError::MethodNotAllowed(_)
        | GatewayError::UpstreamUnavailable(_) => Severity::Expected,
        GatewayError::Cancelled => Severity::Churn,
        GatewayError::Io(e) if is_churn(e.kind()) => Severity::Churn,
        GatewayError::Io(e) if e.kind() == io::ErrorKind::NotFound => Severity::Expected,
        _ => Severity::Unexpected,
    }
}

fn is_churn(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::Interrupted
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status() {
        let cases = [
            (GatewayError::InvalidArgument("bad".into()), 400),
            (GatewayError::Unauthorized("no".into()), 401),
            (GatewayError::NotFound("gone".into()), 404),
            (GatewayError::MethodNotAllowed(Method::PATCH), 405),
            (GatewayError::UpstreamUnavailable("down".into()), 502),
            (GatewayError::Cancelled, 500),
            (GatewayError::unexpected("boom"), 500),
        ];
        for (err, status) in cases {
            assert_eq!(classify(&err).as_u16(), status, "{err:?}");
        }
    }

    #[test]
    fn io_not_found_is_404() {
        let err = GatewayError::from(io::Error::new(
            io::ErrorKind::NotFound,
            "/opt/media/web/missing.html",
        ));
        assert_eq!(classify(&err), StatusCode::NOT_FOUND);
        assert_eq!(severity(&err), Severity::Expected);
    }

    #[test]
    fn aggregate_unwraps_recursively() {
        let err = GatewayError::Aggregate(vec![
            GatewayError::Aggregate(vec![GatewayError::Unauthorized("token".into())]),
            GatewayError::NotFound("second".into()),
        ]);
        assert_eq!(classify(&err), StatusCode::UNAUTHORIZED);
        assert!(matches!(err.root_cause(), GatewayError::Unauthorized(_)));
    }

    #[test]
    fn empty_aggregate_is_unexpected() {
        let err = GatewayError::Aggregate(Vec::new());
        assert_eq!(classify(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(severity(&err), Severity::Unexpected);
    }

    #[test]
    fn socket_reset_is_churn() {
        let err = GatewayError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(severity(&err), Severity::Churn);
        assert_eq!(severity(&GatewayError::Cancelled), Severity::Churn);
    }
}
