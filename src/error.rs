// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error and Result implementations.

use std::fmt;

use reqwest::StatusCode;

/// Kind of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failure
    ///
    /// Maps to HTTP 401.
    AuthenticationFailed,

    /// Access denied.
    ///
    /// Maps to HTTP 403.
    AccessDenied,

    /// Requested resource was not found.
    ///
    /// Roughly maps to HTTP 404 and 410.
    ResourceNotFound,

    /// Request returned more items than expected.
    TooManyItems,

    /// Invalid value passed to one of paremeters.
    ///
    /// May be result of HTTP 400.
    InvalidInput,

    /// Configuration is missing or cannot be used.
    InvalidConfig,

    /// Conflict in the request.
    Conflict,

    /// Operation has reached the specified time out.
    OperationTimedOut,

    /// Operation failed to complete.
    OperationFailed,

    /// The operation is not supported by CloudSigma.
    NotSupported,

    /// Protocol-level error reported by underlying HTTP library.
    ProtocolError,

    /// Response received from the server is malformed.
    InvalidResponse,

    /// Internal server error.
    ///
    /// Maps to HTTP 5xx codes.
    InternalServerError,
}

/// Error from a CloudSigma call.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    status: Option<StatusCode>,
    message: Option<String>,
}

/// Result of a CloudSigma call.
pub type Result<T> = ::std::result::Result<T, Error>;

impl Error {
    /// Create a new error of the provided kind.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            status: None,
            message: Some(message.into()),
        }
    }

    /// Create with providing all details.
    pub fn new_with_details(
        kind: ErrorKind,
        status: Option<StatusCode>,
        message: Option<String>,
    ) -> Error {
        Error {
            kind,
            status,
            message,
        }
    }

    /// Create an error from an unexpected HTTP status.
    ///
    /// The message includes the reason phrase and the response body, if any.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Error {
        let kind = match status {
            StatusCode::UNAUTHORIZED => ErrorKind::AuthenticationFailed,
            StatusCode::FORBIDDEN => ErrorKind::AccessDenied,
            StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::ResourceNotFound,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            c if c.is_client_error() => ErrorKind::InvalidInput,
            c if c.is_server_error() => ErrorKind::InternalServerError,
            _ => ErrorKind::InvalidResponse,
        };

        let reason = status.canonical_reason().unwrap_or("Unknown status");
        let body = body.trim();
        let message = if body.is_empty() {
            reason.to_string()
        } else {
            format!("{}: {}", reason, body)
        };

        Error::new_with_details(kind, Some(status), Some(message))
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status code (if any).
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Error message (if any).
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Helper - error of kind NotSupported.
    pub(crate) fn not_supported<S: AsRef<str>>(what: S) -> Error {
        Error::new(
            ErrorKind::NotSupported,
            format!("CloudSigma does not support {}", what.as_ref()),
        )
    }
}

impl ErrorKind {
    /// Short description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailed => "Failed to authenticate",
            ErrorKind::AccessDenied => "Access to the resource is denied",
            ErrorKind::ResourceNotFound => "Requested resource was not found",
            ErrorKind::TooManyItems => "Request returned too many items",
            ErrorKind::InvalidInput => "Input value(s) are invalid or missing",
            ErrorKind::InvalidConfig => "Configuration is invalid or missing",
            ErrorKind::Conflict => "Requested cannot be fulfilled due to a conflict",
            ErrorKind::OperationTimedOut => "Time out reached while waiting for the operation",
            ErrorKind::OperationFailed => "Requested operation has failed",
            ErrorKind::NotSupported => "Requested operation is not supported",
            ErrorKind::ProtocolError => "Error when accessing the server",
            ErrorKind::InvalidResponse => "Received invalid response",
            ErrorKind::InternalServerError => "Internal server error or bad gateway",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ref status) = self.status {
            write!(f, " (HTTP {})", status.as_u16())?;
        }

        if let Some(ref msg) = self.message {
            write!(f, ": {}", msg)
        } else {
            Ok(())
        }
    }
}

impl ::std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let msg = value.to_string();
        let kind = match value.status() {
            Some(StatusCode::UNAUTHORIZED) => ErrorKind::AuthenticationFailed,
            Some(StatusCode::FORBIDDEN) => ErrorKind::AccessDenied,
            Some(StatusCode::NOT_FOUND) => ErrorKind::ResourceNotFound,
            Some(StatusCode::CONFLICT) => ErrorKind::Conflict,
            Some(c) if c.is_client_error() => ErrorKind::InvalidInput,
            Some(c) if c.is_server_error() => ErrorKind::InternalServerError,
            None if value.is_decode() => ErrorKind::InvalidResponse,
            None if value.is_builder() => ErrorKind::InvalidInput,
            None => ErrorKind::ProtocolError,
            _ => ErrorKind::InvalidResponse,
        };

        Error::new_with_details(kind, value.status(), Some(msg))
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(value: reqwest::header::InvalidHeaderValue) -> Error {
        Error::new(ErrorKind::InvalidInput, value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::new(
            ErrorKind::InvalidResponse,
            format!("Cannot parse JSON: {}", value),
        )
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Error {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot parse configuration: {}", value),
        )
    }
}
