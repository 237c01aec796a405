//  GATE.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 14:37:53
//  Last edited:
//    16 Oct 2026, 13:58:20
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides the actual [`MessageGate`] implementation.
//

use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use error_trace::ErrorTrace as _;
use http::header::AUTHORIZATION;
use jsonwebtoken::{Algorithm, Header, Validation};
use serde_json::{Map, Value};
use specifications::message::{MessageError, HEADERS_FIELD, REQUEST_FIELD};
use specifications::status::{StatusSink, StatusText};
use specifications::{Message, MessageGate, Outcome};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, span, Level};

use crate::keyresolver::KeyResolver;


/***** CONSTANTS *****/
/// The only algorithm tokens may be signed with.
pub const ALGORITHM: Algorithm = Algorithm::ES256;

/// The scheme that must precede the token in the authorization header.
pub const BEARER_SCHEME: &str = "Bearer";

/// The message attached to messages without a token.
const MISSING_TOKEN_MESSAGE: &str = "No token found in Bearer header";





/***** ERRORS *****/
/// Describes why a token failed to verify.
///
/// The full description ends up in the rejected message, so every variant includes its cause.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token was signed with another algorithm than [`ALGORITHM`].
    #[error("Algorithm {alg:?} not allowed")]
    AlgorithmNotAllowed { alg: Algorithm },
    /// The token is not a compact JWT (or its header is garbage).
    #[error("Illegal JWT ({err})")]
    IllegalJwt { err: jsonwebtoken::errors::Error },
    /// The key set had no (unique) key for the token.
    #[error("{err}")]
    KeyResolve { err: Box<dyn 'static + Send + Sync + Error> },
    /// The key set could not be obtained.
    #[error("Key set unavailable ({err})")]
    KeySetUnavailable { err: Box<dyn 'static + Send + Sync + Error> },
    /// A time claim is there, but isn't a number.
    #[error("Invalid JWT (\"{claim}\" claim must be a number)")]
    IllegalTimeClaim { claim: &'static str },
    /// A time claim is a number we had to check ourselves, and it failed.
    #[error("Invalid JWT (\"{claim}\" claim check failed)")]
    TimeClaimFailed { claim: &'static str },
    /// The signature or the claims did not validate.
    #[error("Invalid JWT ({err})")]
    JwtValidate { err: jsonwebtoken::errors::Error },
    /// The `token` field is set, but to something other than a compact JWT.
    #[error("Compact JWS must be a string, got {kind}")]
    TokenNotAString { kind: &'static str },
}





/***** AUXILLARY *****/
/// Something in a message that is supposed to be a token.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Candidate<'m> {
    /// A (hopefully) compact JWT.
    Jwt(&'m str),
    /// A `token` field that is set, but not to a string. Typically the claims of an earlier
    /// verification.
    NotAString(&'m Value),
}





/***** HELPER FUNCTIONS *****/
/// Decides whether a field is "there". Empty strings, zeroes, `false` and `null` are not.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Names the JSON type of a value, for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Given the value of an `Authorization`-header, attempts to extract the JWT from it.
///
/// The value must consist of exactly [`BEARER_SCHEME`] and a non-empty token, separated by a
/// single space.
fn parse_bearer(raw: &str) -> Option<&str> {
    let mut parts = raw.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Attempts to find the token to verify in the given message.
///
/// The places searched are, in order:
/// 1. The `req.headers.authorization` field. If it is there at all, it is the only place
///    searched, even if it isn't a valid bearer header.
/// 2. The `token` field, if it is set to anything but an empty string, `0`, `false` or `null`.
///    Anything but a string there is returned as [`Candidate::NotAString`], and fails
///    verification.
///
/// The `payload` field is never searched, even if it is a string. Payloads are free-form, and
/// treating arbitrary text as a bearer token is not something to do by accident.
///
/// # Arguments
/// - `msg`: The [`Message`] to search.
///
/// # Returns
/// The token [`Candidate`], or [`None`] if there is none.
pub fn extract_token(msg: &Message) -> Option<Candidate<'_>> {
    match msg.get_path(&[REQUEST_FIELD, HEADERS_FIELD, AUTHORIZATION.as_str()]) {
        Some(header) if is_present(header) => parse_bearer(header.as_str()?).map(Candidate::Jwt),
        _ => match msg.token() {
            Some(Value::String(token)) if !token.is_empty() => Some(Candidate::Jwt(token)),
            Some(token) if is_present(token) => Some(Candidate::NotAString(token)),
            _ => None,
        },
    }
}

/// Builds the claim validation for tokens.
///
/// # Arguments
/// - `audience`: If given, the `aud` claim must be present and contain this.
///
/// # Returns
/// A [`Validation`] that only accepts [`ALGORITHM`], checks `exp` and `nbf` without leeway if the
/// token has them, and checks `aud` only if `audience` is given.
fn validation(audience: Option<&str>) -> Validation {
    let mut validation = Validation::new(ALGORITHM);
    validation.required_spec_claims.clear();
    validation.validate_nbf = true;
    validation.leeway = 0;
    match audience {
        Some(audience) => {
            validation.set_audience(&[audience]);
            validation.required_spec_claims.insert("aud".into());
        },
        None => validation.validate_aud = false,
    }
    validation
}

/// Checks that `exp` and `nbf`, if given, are numbers.
///
/// [`jsonwebtoken`] only checks claims it can parse as unsigned integers, and silently skips the
/// rest unless they are required. Other numbers (fractional or negative) are checked here instead.
///
/// # Arguments
/// - `claims`: The claims of a token whose signature is already verified.
///
/// # Errors
/// This function errors if either claim is not a number, or is a number that fails its check.
fn check_time_claims(claims: &Map<String, Value>) -> Result<(), VerifyError> {
    let now: f64 = jsonwebtoken::get_current_timestamp() as f64;
    for claim in ["exp", "nbf"] {
        let Some(value) = claims.get(claim) else { continue };
        let Value::Number(number) = value else { return Err(VerifyError::IllegalTimeClaim { claim }) };
        if number.as_u64().is_some() {
            continue;
        }
        let time: f64 = number.as_f64().ok_or(VerifyError::IllegalTimeClaim { claim })?;
        if (claim == "exp" && time < now) || (claim == "nbf" && time > now) {
            return Err(VerifyError::TimeClaimFailed { claim });
        }
    }
    Ok(())
}





/***** LIBRARY *****/
/// Authenticates pipeline messages by verifying the JWTs they carry.
///
/// Until the key set is resolved (see [`VerifyGate::new()`]), every message is dropped.
#[derive(Debug)]
pub struct VerifyGate<K, S> {
    /// The key set to verify against. Set (once) when resolved.
    keys:       Arc<OnceCell<K>>,
    /// How the claims are validated.
    validation: Validation,
    /// Where we report our status.
    sink:       S,
}
impl<K, S> VerifyGate<K, S> {
    /// Constructor for a VerifyGate that waits for a key set to be resolved elsewhere.
    ///
    /// # Arguments
    /// - `audience`: The audience tokens must be issued for, if any.
    /// - `keys`: A cell that will (maybe) be populated with the key set at some point. The gate only
    ///   ever reads it.
    /// - `sink`: Some [`StatusSink`] that receives a status update for every message.
    ///
    /// # Returns
    /// A new VerifyGate.
    #[inline]
    pub fn new(audience: Option<&str>, keys: Arc<OnceCell<K>>, sink: S) -> Self { Self { keys, validation: validation(audience), sink } }

    /// Constructor for a VerifyGate with an already resolved key set.
    ///
    /// # Arguments
    /// - `audience`: The audience tokens must be issued for, if any.
    /// - `keys`: The [`KeyResolver`] to find keys with.
    /// - `sink`: Some [`StatusSink`] that receives a status update for every message.
    ///
    /// # Returns
    /// A new VerifyGate that is ready immediately.
    #[inline]
    pub fn with_keys(audience: Option<&str>, keys: K, sink: S) -> Self { Self::new(audience, Arc::new(OnceCell::new_with(Some(keys))), sink) }

    /// Returns whether the key set has been resolved.
    #[inline]
    pub fn is_ready(&self) -> bool { self.keys.initialized() }
}
impl<K, S> VerifyGate<K, S>
where
    K: KeyResolver,
{
    /// Verifies a raw token against the given key set.
    ///
    /// # Returns
    /// The token's claims.
    ///
    /// # Errors
    /// This function errors if the token is malformed, uses the wrong algorithm, has no key in the
    /// set or does not validate against it.
    async fn verify(&self, keys: &K, token: &str) -> Result<Map<String, Value>, VerifyError> {
        // Fetch the header from the JWT
        let header: Header = jsonwebtoken::decode_header(token).map_err(|err| VerifyError::IllegalJwt { err })?;
        debug!("JWT header: {header:?}");
        if header.alg != ALGORITHM {
            return Err(VerifyError::AlgorithmNotAllowed { alg: header.alg });
        }

        // Check if the key makes sense
        debug!("Resolving key in key set...");
        let decoding_key = match keys.resolve_key(&header).await {
            Ok(Ok(key)) => key,
            Ok(Err(err)) => return Err(VerifyError::KeyResolve { err: Box::new(err) }),
            Err(err) => {
                error!("{}", err.trace());
                return Err(VerifyError::KeySetUnavailable { err: Box::new(err) });
            },
        };

        debug!("Validating JWT with {ALGORITHM:?}...");
        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &decoding_key, &self.validation)
            .map_err(|err| VerifyError::JwtValidate { err })?;
        check_time_claims(&data.claims)?;
        Ok(data.claims)
    }
}
impl<K, S> MessageGate for VerifyGate<K, S>
where
    K: Send + Sync + KeyResolver,
    S: Send + Sync + StatusSink,
{
    fn process(&self, mut msg: Message) -> impl Send + Future<Output = Outcome> {
        async move {
            let _span = span!(Level::INFO, "VerifyGate::process");

            // Nothing to verify against (yet); this is not the message's fault, so it goes nowhere
            let keys: &K = match self.keys.get() {
                Some(keys) => keys,
                None => {
                    self.sink.status(StatusText::NotInitialized.into());
                    error!("Gate not initialized (JWKS URL not resolved yet); dropping message");
                    return Outcome::Dropped(msg);
                },
            };

            // Fetch the JWT from the message
            let token: Result<String, VerifyError> = match extract_token(&msg) {
                Some(Candidate::Jwt(token)) => Ok(token.into()),
                Some(Candidate::NotAString(token)) => Err(VerifyError::TokenNotAString { kind: json_kind(token) }),
                None => {
                    info!("No token found in message");
                    msg.set_error(MessageError::missing_token(MISSING_TOKEN_MESSAGE));
                    self.sink.status(StatusText::MissingToken.into());
                    return Outcome::Rejected(msg);
                },
            };
            let res: Result<Map<String, Value>, VerifyError> = match token {
                Ok(token) => {
                    debug!("Received JWT: {token:?}");
                    self.verify(keys, &token).await
                },
                Err(err) => Err(err),
            };

            match res {
                Ok(claims) => {
                    debug!("Validating OK");
                    msg.set_claims(claims);
                    self.sink.status(StatusText::Verified.into());
                    Outcome::Authenticated(msg)
                },
                Err(err) => {
                    info!("{}", err.trace());
                    msg.set_error(MessageError::verify_failed(format!("JWT Verification failed: {err}")));
                    self.sink.status(StatusText::VerifyFailed.into());
                    Outcome::Rejected(msg)
                },
            }
        }
    }
}



/***** TESTS *****/
