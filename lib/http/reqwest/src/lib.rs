//  LIB.rs
//    by Lut99
//
//  Created:
//    13 Oct 2026, 13:02:51
//  Last edited:
//    15 Oct 2026, 10:18:37
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the [`HttpFetcher`] on top of [`reqwest`].
//

use std::future::Future;
use std::time::Duration;

use http::header::ACCEPT;
use specifications::fetcher::{FetchResponse, HttpFetcher};
use thiserror::Error;
use tracing::{debug, span, Level};


/***** CONSTANTS *****/
/// The time any single request may take before it's aborted.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);





/***** ERRORS *****/
/// Defines the errors originating from the [`ReqwestFetcher`].
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to build the underlying client.
    #[error("Failed to build HTTP client")]
    ClientBuild {
        #[source]
        err: reqwest::Error,
    },
    /// Failed to download the body of a response.
    #[error("Failed to download body of response from {url:?}")]
    ResponseBody {
        url: String,
        #[source]
        err: reqwest::Error,
    },
    /// Failed to send a request (or timed out doing so).
    #[error("Failed to send GET-request to {url:?}")]
    RequestSend {
        url: String,
        #[source]
        err: reqwest::Error,
    },
}





/***** LIBRARY *****/
/// Fetches resources using a [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}
impl ReqwestFetcher {
    /// Constructor for the ReqwestFetcher that uses the [`DEFAULT_TIMEOUT`].
    ///
    /// # Returns
    /// A new ReqwestFetcher.
    ///
    /// # Errors
    /// This function errors if the underlying client failed to build (e.g., no TLS backend).
    #[inline]
    pub fn new() -> Result<Self, Error> { Self::with_timeout(DEFAULT_TIMEOUT) }

    /// Constructor for the ReqwestFetcher that aborts requests after the given time.
    ///
    /// # Arguments
    /// - `timeout`: The maximum time any single request (including its body) may take.
    ///
    /// # Returns
    /// A new ReqwestFetcher.
    ///
    /// # Errors
    /// This function errors if the underlying client failed to build (e.g., no TLS backend).
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|err| Error::ClientBuild { err })?;
        Ok(Self { client })
    }

    /// Constructor for the ReqwestFetcher that uses an existing client.
    ///
    /// # Arguments
    /// - `client`: The [`reqwest::Client`] to send requests with.
    ///
    /// # Returns
    /// A new ReqwestFetcher.
    #[inline]
    pub const fn with_client(client: reqwest::Client) -> Self { Self { client } }
}
impl HttpFetcher for ReqwestFetcher {
    type Error = Error;

    fn get(&self, url: &str) -> impl Send + Future<Output = Result<FetchResponse, Self::Error>> {
        async move {
            let _span = span!(Level::DEBUG, "ReqwestFetcher::get", url);

            debug!("Sending GET-request to {url:?}...");
            let res = self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(|err| Error::RequestSend { url: url.into(), err })?;
            let status = res.status();
            debug!("Remote {url:?} replied with {status}");

            let body = res.bytes().await.map_err(|err| Error::ResponseBody { url: url.into(), err })?;
            Ok(FetchResponse::new(status, body.to_vec()))
        }
    }
}



/***** TESTS *****/
