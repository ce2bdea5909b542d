//! Purpose: Single error type shared by the client library and the `dbrest` CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Keep transport, remote and data-shape failures distinguishable by kind.
//! Invariants: Exit codes per kind are stable once published.
//! Invariants: Data-shape failures (`Format`) never collapse into transport failures (`Io`).
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    AlreadyExists,
    Busy,
    Permission,
    Format,
    Remote,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    status: Option<u16>,
    error_code: Option<String>,
    endpoint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            status: None,
            error_code: None,
            endpoint: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Databricks `error_code` from the error envelope (e.g. `RESOURCE_DOES_NOT_EXIST`).
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(error_code) = &self.error_code {
            write!(f, " (error_code: {error_code})")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        if let Some(endpoint) = &self.endpoint {
            write!(f, " (endpoint: {endpoint})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::AlreadyExists => 4,
        ErrorKind::Busy => 5,
        ErrorKind::Permission => 6,
        ErrorKind::Format => 7,
        ErrorKind::Remote => 8,
        ErrorKind::Io => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use std::error::Error as _;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::AlreadyExists, 4),
            (ErrorKind::Busy, 5),
            (ErrorKind::Permission, 6),
            (ErrorKind::Format, 7),
            (ErrorKind::Remote, 8),
            (ErrorKind::Io, 9),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_remote_context() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("Cluster 0123 does not exist")
            .with_error_code("RESOURCE_DOES_NOT_EXIST")
            .with_status(404)
            .with_endpoint("/api/2.0/clusters/get");
        let text = err.to_string();
        assert!(text.starts_with("NotFound: Cluster 0123 does not exist"));
        assert!(text.contains("(error_code: RESOURCE_DOES_NOT_EXIST)"));
        assert!(text.contains("(status: 404)"));
        assert!(text.contains("(endpoint: /api/2.0/clusters/get)"));
    }

    #[test]
    fn source_is_exposed() {
        let io = std::io::Error::other("connection reset");
        let err = Error::new(ErrorKind::Io).with_source(io);
        assert_eq!(
            err.source().map(|source| source.to_string()),
            Some("connection reset".to_string())
        );
    }
}
