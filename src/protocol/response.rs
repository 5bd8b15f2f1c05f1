//! Response definitions
//!
//! Represents responses to clients.

use std::fmt;

/// Response status keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
    Error,
    Data,
}

impl Status {
    /// The keyword used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Failed => "FAILED",
            Status::Error => "ERROR",
            Status::Data => "DATA",
        }
    }

    /// Look up a keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "OK" => Some(Status::Ok),
            "FAILED" => Some(Status::Failed),
            "ERROR" => Some(Status::Error),
            "DATA" => Some(Status::Data),
            _ => None,
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Command succeeded
    Ok,

    /// Recoverable failure, the session continues
    Failed(String),

    /// Fatal failure, the server closes the connection
    Error(String),

    /// A value (reply to TOP)
    Data(String),
}

impl Response {
    /// Create a FAILED response
    pub fn failed(message: impl Into<String>) -> Self {
        Response::Failed(message.into())
    }

    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(message.into())
    }

    /// Get the status keyword
    pub fn status(&self) -> Status {
        match self {
            Response::Ok => Status::Ok,
            Response::Failed(_) => Status::Failed,
            Response::Error(_) => Status::Error,
            Response::Data(_) => Status::Data,
        }
    }

    /// Message or value carried by the response, if any
    pub fn payload(&self) -> Option<&str> {
        match self {
            Response::Ok => None,
            Response::Failed(text) | Response::Error(text) | Response::Data(text) => Some(text),
        }
    }
}

impl fmt::Display for Response {
    /// Wire form without the terminating newline
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload() {
            Some(payload) => write!(f, "{} {}", self.status().as_str(), payload),
            None => f.write_str(self.status().as_str()),
        }
    }
}
