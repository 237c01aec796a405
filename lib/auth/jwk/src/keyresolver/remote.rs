//  REMOTE.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 11:31:09
//  Last edited:
//    16 Oct 2026, 10:05:44
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a resolver that finds keys in a remote, lazily fetched
//!   and cached JSON Web Key Set (JWKS).
//

use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey, Header};
use specifications::fetcher::HttpFetcher;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, span, Level};
use url::Url;

use super::KeyResolver;


/***** CONSTANTS *****/
/// How long a fetched key set is trusted before it is fetched again.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// How long after a fetch we refuse to re-fetch the key set because a token names a key we don't
/// know.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);





/***** ERRORS *****/
/// Defines the errors originating from the [`RemoteJwkSet`] which are the key set's fault.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to deserialize the fetched key set.
    #[error("Failed to deserialize key set from {url:?}")]
    Deserialize {
        url: String,
        #[source]
        err: serde_json::Error,
    },
    /// Failed to reach the key set endpoint.
    #[error("Failed to fetch key set from {url:?}")]
    Fetch {
        url: String,
        #[source]
        err: Box<dyn 'static + Send + Sync + Error>,
    },
    /// The key set endpoint replied with a non-success code.
    #[error("Key set endpoint {url:?} replied with {status}")]
    Status { url: String, status: StatusCode },
}

/// Defines the errors originating from the [`RemoteJwkSet`] which are the token's fault.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The key found for the token could not be turned into a decoding key.
    #[error("Key {kid:?} in key set cannot be used for verification: {err}")]
    KeyUnusable { kid: Option<String>, err: jsonwebtoken::errors::Error },
    /// More than one key in the set could verify the token.
    #[error("Multiple keys in key set match key ID {kid:?} and algorithm {alg:?}")]
    MultipleMatchingKeys { kid: Option<String>, alg: Algorithm },
    /// None of the keys in the set can verify the token.
    #[error("No applicable key in key set for key ID {kid:?} and algorithm {alg:?}")]
    NoApplicableKey { kid: Option<String>, alg: Algorithm },
}





/***** HELPER FUNCTIONS *****/
/// Checks whether the given key parameters can be used with the given algorithm.
fn key_fits_algorithm(params: &AlgorithmParameters, alg: Algorithm) -> bool {
    match alg {
        Algorithm::ES256 => matches!(params, AlgorithmParameters::EllipticCurve(ec) if matches!(ec.curve, EllipticCurve::P256)),
        Algorithm::ES384 => matches!(params, AlgorithmParameters::EllipticCurve(ec) if matches!(ec.curve, EllipticCurve::P384)),
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 | Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => {
            matches!(params, AlgorithmParameters::RSA(_))
        },
        Algorithm::EdDSA => matches!(params, AlgorithmParameters::OctetKeyPair(okp) if matches!(okp.curve, EllipticCurve::Ed25519)),
        // Symmetric keys are never published
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => false,
    }
}

/// Checks whether the `alg` advertised by a key matches the one of the token.
#[rustfmt::skip]
fn key_algorithm_matches(key_alg: &KeyAlgorithm, alg: Algorithm) -> bool {
    matches!(
        (key_alg, alg),
        (KeyAlgorithm::ES256, Algorithm::ES256)
            | (KeyAlgorithm::ES384, Algorithm::ES384)
            | (KeyAlgorithm::RS256, Algorithm::RS256)
            | (KeyAlgorithm::RS384, Algorithm::RS384)
            | (KeyAlgorithm::RS512, Algorithm::RS512)
            | (KeyAlgorithm::PS256, Algorithm::PS256)
            | (KeyAlgorithm::PS384, Algorithm::PS384)
            | (KeyAlgorithm::PS512, Algorithm::PS512)
            | (KeyAlgorithm::EdDSA, Algorithm::EdDSA)
    )
}

/// Finds the one key in the given set that may verify a token with the given header.
///
/// A key is a candidate if:
/// - it has the header's key ID (if the header names one);
/// - its type and curve fit the header's algorithm;
/// - it is meant for signatures (or doesn't say); and
/// - it is meant for the header's algorithm (or doesn't say).
///
/// # Arguments
/// - `set`: The [`JwkSet`] to search.
/// - `header`: The JWT [`Header`] to find a key for.
///
/// # Returns
/// A copy of the only candidate [`Jwk`].
///
/// # Errors
/// This function errors if there are no candidates, or more than one.
pub(crate) fn select_key(set: &JwkSet, header: &Header) -> Result<Jwk, ClientError> {
    let mut candidates = set.keys.iter().filter(|jwk| {
        header.kid.as_ref().map_or(true, |kid| jwk.common.key_id.as_ref() == Some(kid))
            && key_fits_algorithm(&jwk.algorithm, header.alg)
            && matches!(jwk.common.public_key_use, None | Some(PublicKeyUse::Signature))
            && jwk.common.key_algorithm.as_ref().map_or(true, |key_alg| key_algorithm_matches(key_alg, header.alg))
    });
    match (candidates.next(), candidates.next()) {
        (Some(jwk), None) => Ok(jwk.clone()),
        (None, _) => Err(ClientError::NoApplicableKey { kid: header.kid.clone(), alg: header.alg }),
        (Some(_), Some(_)) => Err(ClientError::MultipleMatchingKeys { kid: header.kid.clone(), alg: header.alg }),
    }
}





/***** AUXILLARY *****/
/// A key set together with when we got it.
#[derive(Debug)]
struct CachedJwks {
    keys:       Arc<JwkSet>,
    fetched_at: Instant,
}





/***** LIBRARY *****/
/// Resolves keys for JWTs from a remote key set.
///
/// Nothing is fetched on construction. The set is fetched on the first lookup, and then cached for
/// [`DEFAULT_MAX_AGE`]. If a token asks for a key that isn't in the set, the set is fetched again
/// unless it was fetched less than [`DEFAULT_COOLDOWN`] ago.
#[derive(Debug)]
pub struct RemoteJwkSet<F> {
    /// Where the key set lives.
    url:      Url,
    /// The fetcher used to get it.
    fetcher:  F,
    /// How long a fetched set is used before it's fetched again.
    max_age:  Duration,
    /// How long after fetching we ignore requests for keys we don't know.
    cooldown: Duration,
    /// The set, once fetched.
    cache:    RwLock<Option<CachedJwks>>,
}
impl<F> RemoteJwkSet<F> {
    /// Constructor for the RemoteJwkSet.
    ///
    /// # Arguments
    /// - `url`: The URL where the key set may be found.
    /// - `fetcher`: Some [`HttpFetcher`] that is used to fetch it.
    ///
    /// # Returns
    /// A new RemoteJwkSet that hasn't fetched anything yet.
    #[inline]
    pub fn new(url: Url, fetcher: F) -> Self {
        Self { url, fetcher, max_age: DEFAULT_MAX_AGE, cooldown: DEFAULT_COOLDOWN, cache: RwLock::new(None) }
    }

    /// Changes how long a fetched key set is used.
    #[inline]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Changes how long after fetching requests for unknown keys are ignored.
    #[inline]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Returns the URL of the key set.
    #[inline]
    pub fn url(&self) -> &Url { &self.url }
}
impl<F: HttpFetcher> RemoteJwkSet<F> {
    /// Downloads the key set.
    async fn fetch(&self) -> Result<JwkSet, ServerError> {
        info!("Fetching key set from {:?}...", self.url.as_str());
        let res = self.fetcher.get(self.url.as_str()).await.map_err(|err| ServerError::Fetch { url: self.url.to_string(), err: Box::new(err) })?;
        if !res.is_ok() {
            return Err(ServerError::Status { url: self.url.to_string(), status: res.status });
        }
        let set: JwkSet = res.json().map_err(|err| ServerError::Deserialize { url: self.url.to_string(), err })?;
        debug!("Key set {:?} has {} key(s)", self.url.as_str(), set.keys.len());
        Ok(set)
    }

    /// Returns the key set, fetching it if necessary.
    ///
    /// # Arguments
    /// - `refresh`: If true, ask for a new set because the current one misses a key. This is only
    ///   honoured if the cooldown has passed.
    ///
    /// # Returns
    /// The (possibly cached) [`JwkSet`].
    ///
    /// # Errors
    /// This function errors if the key set had to be fetched but that failed.
    async fn keys(&self, refresh: bool) -> Result<Arc<JwkSet>, ServerError> {
        if !refresh {
            if let Some(cached) = self.cache.read().await.as_ref() {
                if cached.fetched_at.elapsed() < self.max_age {
                    return Ok(cached.keys.clone());
                }
            }
        }

        // Only one fetch at a time; whoever waited on it uses its result
        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref() {
            let age: Duration = cached.fetched_at.elapsed();
            if age < if refresh { self.cooldown } else { self.max_age } {
                debug!("Not fetching key set {:?} again (fetched {}ms ago)", self.url.as_str(), age.as_millis());
                return Ok(cached.keys.clone());
            }
        }
        let keys: Arc<JwkSet> = Arc::new(self.fetch().await?);
        *cache = Some(CachedJwks { keys: keys.clone(), fetched_at: Instant::now() });
        Ok(keys)
    }
}
impl<F: Sync + HttpFetcher> KeyResolver for RemoteJwkSet<F> {
    type ClientError = ClientError;
    type ServerError = ServerError;


    fn resolve_key(&self, header: &Header) -> impl Send + Future<Output = Result<Result<DecodingKey, Self::ClientError>, Self::ServerError>> {
        async move {
            let _span = span!(Level::INFO, "RemoteJwkSet::resolve_key");

            // Find the key, giving the remote one chance to tell us about new keys
            debug!("Finding key with ID {:?} for {:?}...", header.kid, header.alg);
            let keys: Arc<JwkSet> = self.keys(false).await?;
            let jwk: Jwk = match select_key(&keys, header) {
                Ok(jwk) => jwk,
                Err(ClientError::NoApplicableKey { .. }) => {
                    debug!("No applicable key in cached key set; refreshing it...");
                    let keys: Arc<JwkSet> = self.keys(true).await?;
                    match select_key(&keys, header) {
                        Ok(jwk) => jwk,
                        Err(err) => return Ok(Err(err)),
                    }
                },
                Err(err) => return Ok(Err(err)),
            };
            debug!("Key ID {:?}: {:?}", jwk.common.key_id, jwk.algorithm);

            // Now return that as decoding key
            Ok(DecodingKey::from_jwk(&jwk).map_err(|err| ClientError::KeyUnusable { kid: jwk.common.key_id.clone(), err }))
        }
    }
}



/***** TESTS *****/
