//! The `{status, message, data?}` result envelope shared by the HTTP API and
//! the CLI's `--json` output.

use serde::{Deserialize, Serialize};
use crate::{Error, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = serde_json::Value> {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            error_kind: None,
            data: Some(data),
        }
    }

    pub fn failure(error: &Error) -> Self {
        Self {
            status: Status::Error,
            message: error.to_string(),
            error_kind: Some(error.kind()),
            data: None,
        }
    }

    /// Wrap an operation result; `message` is only built on success.
    pub fn from_result(result: crate::Result<T>, message: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(data) => {
                let message = message(&data);
                Self::success(message, data)
            }
            Err(e) => Self::failure(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
