//  RESOLVER.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 13:55:12
//  Last edited:
//    15 Oct 2026, 17:26:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Resolves the configured info URL to a key set, following OIDC
//!   discovery documents where necessary.
//

use std::error::Error;

use http::StatusCode;
use serde::Deserialize;
use specifications::fetcher::HttpFetcher;
use thiserror::Error;
use tracing::{debug, info, span, Level};
use url::Url;

use crate::keyresolver::RemoteJwkSet;


/***** CONSTANTS *****/
/// Any info URL containing this is treated as an OIDC discovery document instead of a key set.
pub const DISCOVERY_MARKER: &str = ".well-known/openid-configuration";





/***** ERRORS *****/
/// Defines the errors that may occur when resolving the key set.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The discovery document was not valid JSON (or its `jwks_uri` wasn't a string).
    #[error("Failed to deserialize OIDC configuration from {url:?}")]
    DiscoveryDeserialize {
        url: String,
        #[source]
        err: serde_json::Error,
    },
    /// The discovery document could not be fetched.
    #[error("Failed to fetch OIDC configuration from {url:?}")]
    DiscoveryFetch {
        url: String,
        #[source]
        err: Box<dyn 'static + Send + Sync + Error>,
    },
    /// The discovery endpoint replied, but not with success.
    #[error("OIDC configuration endpoint {url:?} replied with {status}")]
    DiscoveryStatus { url: String, status: StatusCode },
    /// The resolved key set URL is not a valid (absolute) URL.
    #[error("Illegal JWKS URL {raw:?}")]
    IllegalJwksUrl {
        raw: String,
        #[source]
        err: url::ParseError,
    },
    /// The discovery document does not advertise a key set.
    #[error("OIDC configuration from {url:?} has no \"jwks_uri\" field")]
    MissingJwksUri { url: String },
}





/***** HELPERS *****/
/// The part of the OIDC discovery document we care about.
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    #[serde(default)]
    jwks_uri: Option<String>,
}

/// Returns whether the given info URL points to an OIDC discovery document.
#[inline]
pub fn is_discovery_url(url: &str) -> bool { url.contains(DISCOVERY_MARKER) }





/***** LIBRARY *****/
/// Turns an info URL into a [`RemoteJwkSet`].
///
/// The info URL is either the key set's URL itself, or the URL of an OIDC discovery document that
/// tells us where the key set lives.
#[derive(Clone, Debug)]
pub struct KeySetResolver<F> {
    fetcher: F,
}
impl<F> KeySetResolver<F> {
    /// Constructor for the KeySetResolver.
    ///
    /// # Arguments
    /// - `fetcher`: Some [`HttpFetcher`] used to fetch discovery documents (and, later, the key
    ///   set itself).
    ///
    /// # Returns
    /// A new KeySetResolver.
    #[inline]
    pub const fn new(fetcher: F) -> Self { Self { fetcher } }
}
impl<F: HttpFetcher> KeySetResolver<F> {
    /// Finds the URL of the key set.
    ///
    /// Only discovery URLs (see [`is_discovery_url()`]) cause any network traffic.
    ///
    /// # Arguments
    /// - `info_url`: The configured info URL.
    ///
    /// # Returns
    /// The [`Url`] of the key set.
    ///
    /// # Errors
    /// This function errors if the discovery document could not be fetched or does not advertise
    /// a key set, or if the found URL isn't a valid URL.
    pub async fn locate(&self, info_url: &str) -> Result<Url, ResolveError> {
        let _span = span!(Level::INFO, "KeySetResolver::locate", info_url);

        let raw: String = if is_discovery_url(info_url) {
            self.discover(info_url).await?
        } else {
            debug!("Treating {info_url:?} as JWKS URL");
            info_url.into()
        };
        Url::parse(&raw).map_err(|err| ResolveError::IllegalJwksUrl { raw, err })
    }

    /// Fetches the discovery document at the given URL and returns its `jwks_uri`.
    async fn discover(&self, url: &str) -> Result<String, ResolveError> {
        info!("Fetching OIDC configuration from {url:?}...");
        let res = self.fetcher.get(url).await.map_err(|err| ResolveError::DiscoveryFetch { url: url.into(), err: Box::new(err) })?;
        if !res.is_ok() {
            return Err(ResolveError::DiscoveryStatus { url: url.into(), status: res.status });
        }
        let doc: DiscoveryDocument = res.json().map_err(|err| ResolveError::DiscoveryDeserialize { url: url.into(), err })?;
        let jwks_uri: String = doc.jwks_uri.ok_or_else(|| ResolveError::MissingJwksUri { url: url.into() })?;
        debug!("OIDC configuration {url:?} advertises JWKS URL {jwks_uri:?}");
        Ok(jwks_uri)
    }

    /// Resolves the info URL to a key set.
    ///
    /// Note that the key set itself isn't fetched yet; that happens on the first lookup.
    ///
    /// # Arguments
    /// - `info_url`: The configured info URL.
    ///
    /// # Returns
    /// A [`RemoteJwkSet`] that uses this resolver's fetcher.
    ///
    /// # Errors
    /// This function errors in the same cases as [`KeySetResolver::locate()`].
    pub async fn resolve(self, info_url: &str) -> Result<RemoteJwkSet<F>, ResolveError> {
        let url: Url = self.locate(info_url).await?;
        Ok(RemoteJwkSet::new(url, self.fetcher))
    }
}



/***** TESTS *****/
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::MockFetcher;

    const DISCOVERY_URL: &str = "https://idm.example.com/.well-known/openid-configuration";
    const JWKS_URL: &str = "https://idm.example.com/jwks.json";

    #[test]
    fn test_is_discovery_url() {
        assert!(is_discovery_url(DISCOVERY_URL));
        assert!(is_discovery_url("https://idm.example.com/oauth2/openid/app/.well-known/openid-configuration"));
        assert!(!is_discovery_url(JWKS_URL));
        assert!(!is_discovery_url("https://idm.example.com"));
    }

    #[tokio::test]
    async fn test_direct_url_is_not_fetched() {
        let fetcher = MockFetcher::new();
        let url = KeySetResolver::new(fetcher.clone()).locate(JWKS_URL).await.unwrap();
        assert_eq!(url.as_str(), JWKS_URL);
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_discovery() {
        let fetcher = MockFetcher::new().with_json(DISCOVERY_URL, &json!({ "issuer": "https://idm.example.com", "jwks_uri": JWKS_URL }));
        let set = KeySetResolver::new(fetcher.clone()).resolve(DISCOVERY_URL).await.unwrap();
        assert_eq!(set.url().as_str(), JWKS_URL);
        assert_eq!(fetcher.calls(DISCOVERY_URL), 1);
        // The key set itself is only fetched when needed
        assert_eq!(fetcher.calls(JWKS_URL), 0);
    }

    #[tokio::test]
    async fn test_discovery_failures() {
        // Unreachable
        let fetcher = MockFetcher::new();
        assert!(matches!(KeySetResolver::new(fetcher).locate(DISCOVERY_URL).await, Err(ResolveError::DiscoveryFetch { .. })));

        // Not OK
        let fetcher = MockFetcher::new().with_status(DISCOVERY_URL, StatusCode::NOT_FOUND);
        assert!(matches!(
            KeySetResolver::new(fetcher).locate(DISCOVERY_URL).await,
            Err(ResolveError::DiscoveryStatus { status: StatusCode::NOT_FOUND, .. })
        ));

        // Not JSON
        let fetcher = MockFetcher::new().with_body(DISCOVERY_URL, "<html>Hello there</html>");
        assert!(matches!(KeySetResolver::new(fetcher).locate(DISCOVERY_URL).await, Err(ResolveError::DiscoveryDeserialize { .. })));

        // JSON, but the wrong type
        let fetcher = MockFetcher::new().with_json(DISCOVERY_URL, &json!({ "jwks_uri": 42 }));
        assert!(matches!(KeySetResolver::new(fetcher).locate(DISCOVERY_URL).await, Err(ResolveError::DiscoveryDeserialize { .. })));

        // JSON, but no key set
        let fetcher = MockFetcher::new().with_json(DISCOVERY_URL, &json!({ "issuer": "https://idm.example.com" }));
        assert!(matches!(KeySetResolver::new(fetcher).locate(DISCOVERY_URL).await, Err(ResolveError::MissingJwksUri { .. })));

        // A key set, but not a URL
        let fetcher = MockFetcher::new().with_json(DISCOVERY_URL, &json!({ "jwks_uri": "/jwks.json" }));
        assert!(matches!(KeySetResolver::new(fetcher).locate(DISCOVERY_URL).await, Err(ResolveError::IllegalJwksUrl { .. })));
    }

    #[tokio::test]
    async fn test_illegal_direct_url() {
        let fetcher = MockFetcher::new();
        assert!(matches!(KeySetResolver::new(fetcher.clone()).locate("idm.example.com/jwks.json").await, Err(ResolveError::IllegalJwksUrl { .. })));
        assert_eq!(fetcher.total_calls(), 0);
    }
}
