//  STATUS.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 10:49:27
//  Last edited:
//    15 Oct 2026, 14:31:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the operator-facing status indicator and the sink that
//!   receives it.
//

use std::fmt::{Display, Formatter, Result as FResult};
use std::sync::Arc;

use serde::{Deserialize, Serialize};


/***** AUXILLARY *****/
/// The colour of the status indicator.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    Red,
    Green,
    Blue,
}

/// The shape of the status indicator.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Ring,
}

/// The severity of a status update.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Error,
}

/// The short code shown next to the status indicator.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusText {
    /// Resolving the key set (through the OIDC discovery document) failed.
    InvalidOidcConfig,
    /// The key set was resolved and messages are being accepted.
    Initialized,
    /// A message arrived before the key set was resolved.
    NotInitialized,
    /// A message arrived without a token.
    MissingToken,
    /// A message's token verified.
    Verified,
    /// A message's token failed to verify.
    VerifyFailed,
}
impl StatusText {
    /// Returns the severity associated with this code.
    #[inline]
    pub const fn level(&self) -> StatusLevel {
        match self {
            Self::Initialized | Self::Verified => StatusLevel::Info,
            Self::InvalidOidcConfig | Self::NotInitialized | Self::MissingToken | Self::VerifyFailed => StatusLevel::Error,
        }
    }

    /// Returns the colour associated with this code.
    #[inline]
    pub const fn fill(&self) -> Fill {
        match self {
            Self::Initialized => Fill::Blue,
            Self::Verified => Fill::Green,
            Self::InvalidOidcConfig | Self::NotInitialized | Self::MissingToken | Self::VerifyFailed => Fill::Red,
        }
    }
}
impl Display for StatusText {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::InvalidOidcConfig => write!(f, "invalid-oidc-config"),
            Self::Initialized => write!(f, "initialized"),
            Self::NotInitialized => write!(f, "not-initialized"),
            Self::MissingToken => write!(f, "missing-token"),
            Self::Verified => write!(f, "verified"),
            Self::VerifyFailed => write!(f, "verify-failed"),
        }
    }
}



/// A single update of the status indicator.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct StatusUpdate {
    /// The colour of the indicator.
    pub fill:  Fill,
    /// The shape of the indicator.
    pub shape: Shape,
    /// The code shown next to it.
    pub text:  StatusText,
}
impl StatusUpdate {
    /// Returns the severity of this update.
    #[inline]
    pub const fn level(&self) -> StatusLevel { self.text.level() }
}
impl From<StatusText> for StatusUpdate {
    #[inline]
    fn from(value: StatusText) -> Self { Self { fill: value.fill(), shape: Shape::Ring, text: value } }
}





/***** LIBRARY *****/
/// Receives status updates. This is purely a side-channel for operators; nothing may depend on it.
pub trait StatusSink {
    /// Reports a new status.
    ///
    /// # Arguments
    /// - `update`: The new [`StatusUpdate`] to show.
    fn status(&self, update: StatusUpdate);
}
impl<T: ?Sized + StatusSink> StatusSink for &T {
    #[inline]
    fn status(&self, update: StatusUpdate) { (**self).status(update) }
}
impl<T: ?Sized + StatusSink> StatusSink for Arc<T> {
    #[inline]
    fn status(&self, update: StatusUpdate) { (**self).status(update) }
}



/***** TESTS *****/
