//  MESSAGE.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 10:11:48
//  Last edited:
//    16 Oct 2026, 10:47:03
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the messages flowing through the pipeline.
//

use std::fmt::{Display, Formatter, Result as FResult};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};


/***** CONSTANTS *****/
/// The field in which the raw token (before verification) or the claims (after verification) are
/// found.
pub const TOKEN_FIELD: &str = "token";

/// The field in which rejected messages carry their [`MessageError`].
pub const ERROR_FIELD: &str = "error";

/// The field carrying the (free-form) payload of the message.
pub const PAYLOAD_FIELD: &str = "payload";

/// The field carrying the HTTP request that spawned the message, if any.
pub const REQUEST_FIELD: &str = "req";

/// The field in the [`REQUEST_FIELD`] that carries its headers.
pub const HEADERS_FIELD: &str = "headers";





/***** AUXILLARY *****/
/// Machine-readable reason for rejecting a message.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No token could be found in the message.
    MissingToken,
    /// A token was found, but it did not verify.
    VerifyFailed,
}
impl Display for ErrorCode {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::MissingToken => write!(f, "MISSING_TOKEN"),
            Self::VerifyFailed => write!(f, "VERIFY_FAILED"),
        }
    }
}

/// The error attached to rejected messages.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MessageError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Machine-readable description of what went wrong.
    pub code:    ErrorCode,
}
impl MessageError {
    /// Constructor for a MessageError with the [`ErrorCode::MissingToken`] code.
    ///
    /// # Arguments
    /// - `message`: Some human-readable description of the problem.
    ///
    /// # Returns
    /// A new MessageError.
    #[inline]
    pub fn missing_token(message: impl Into<String>) -> Self { Self { message: message.into(), code: ErrorCode::MissingToken } }

    /// Constructor for a MessageError with the [`ErrorCode::VerifyFailed`] code.
    ///
    /// # Arguments
    /// - `message`: Some human-readable description of the problem.
    ///
    /// # Returns
    /// A new MessageError.
    #[inline]
    pub fn verify_failed(message: impl Into<String>) -> Self { Self { message: message.into(), code: ErrorCode::VerifyFailed } }
}





/***** LIBRARY *****/
/// A single message in the pipeline.
///
/// Messages are free-form JSON objects. Only a handful of fields are read (`req.headers`, `token`)
/// or written (`token`, `error`); the rest is carried along untouched.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Message(pub Map<String, Value>);
impl Message {
    /// Constructor for an empty Message.
    #[inline]
    pub fn new() -> Self { Self(Map::new()) }

    /// Returns the value at the given (nested) path, if any.
    ///
    /// # Arguments
    /// - `path`: A list of field names, where every next name is looked up in the object found by
    ///   the previous one.
    ///
    /// # Returns
    /// The [`Value`] at the end of the path, or [`None`] if any of the fields is missing or not an
    /// object.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut value: &Value = self.0.get(*first)?;
        for field in rest {
            value = value.as_object()?.get(*field)?;
        }
        Some(value)
    }

    /// Returns the raw `token` field of the message, if any.
    #[inline]
    pub fn token(&self) -> Option<&Value> { self.0.get(TOKEN_FIELD) }

    /// Returns the `token` field of the message as a claim set, if it is one.
    #[inline]
    pub fn claims(&self) -> Option<&Map<String, Value>> { self.token()?.as_object() }

    /// Replaces the `token` field with the given (verified) claims.
    ///
    /// # Arguments
    /// - `claims`: The claims to write.
    #[inline]
    pub fn set_claims(&mut self, claims: Map<String, Value>) { self.0.insert(TOKEN_FIELD.into(), Value::Object(claims)); }

    /// Returns the `error` field of the message, if it is a [`MessageError`].
    #[inline]
    pub fn error(&self) -> Option<MessageError> { serde_json::from_value(self.0.get(ERROR_FIELD)?.clone()).ok() }

    /// Attaches the given error to the message.
    ///
    /// # Arguments
    /// - `error`: The [`MessageError`] to write to the `error` field.
    pub fn set_error(&mut self, error: MessageError) {
        let value: Value = Value::Object(Map::from_iter([
            ("message".to_string(), Value::String(error.message)),
            ("code".to_string(), Value::String(error.code.to_string())),
        ]));
        self.0.insert(ERROR_FIELD.into(), value);
    }
}
impl From<Map<String, Value>> for Message {
    #[inline]
    fn from(value: Map<String, Value>) -> Self { Self(value) }
}
impl From<Message> for Value {
    #[inline]
    fn from(value: Message) -> Self { Value::Object(value.0) }
}
impl TryFrom<Value> for Message {
    type Error = Value;

    /// Attempts to interpret the given value as a message.
    ///
    /// # Errors
    /// Gives back the given value if it isn't an object.
    #[inline]
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}



/***** TESTS *****/
