//  FETCHER.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 09:48:02
//  Last edited:
//    14 Oct 2026, 16:20:51
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines an interface to some HTTP client that can retrieve discovery
//!   documents and key sets.
//

use std::error::Error;
use std::future::Future;

use http::StatusCode;
use serde::de::DeserializeOwned;


/***** AUXILLARY *****/
/// The (fully buffered) response to a GET-request issued by an [`HttpFetcher`].
#[derive(Clone, Debug)]
pub struct FetchResponse {
    /// The status code returned by the remote.
    pub status: StatusCode,
    /// The raw body returned by the remote.
    pub body:   Vec<u8>,
}
impl FetchResponse {
    /// Constructor for the FetchResponse.
    ///
    /// # Arguments
    /// - `status`: The [`StatusCode`] returned by the remote.
    /// - `body`: The raw bytes of the body returned by the remote.
    ///
    /// # Returns
    /// A new FetchResponse.
    #[inline]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self { Self { status, body: body.into() } }

    /// Returns whether the remote reported success (i.e., any 2xx code).
    #[inline]
    pub fn is_ok(&self) -> bool { self.status.is_success() }

    /// Parses the body of the response as JSON.
    ///
    /// # Returns
    /// The body, deserialized as `T`.
    ///
    /// # Errors
    /// This function errors if the body was not valid JSON for `T`.
    #[inline]
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> { serde_json::from_slice(&self.body) }
}





/***** LIBRARY *****/
/// Defines how the library performs HTTP GET-requests.
///
/// Note that the HttpFetcher is intended to be shared between the resolver and any key sets. As
/// such, any reference to `self` is done immutably only.
pub trait HttpFetcher {
    /// The type of errors returned by the fetcher.
    type Error: 'static + Send + Sync + Error;


    /// Retrieves the resource at the given URL.
    ///
    /// # Arguments
    /// - `url`: The URL of the resource to retrieve.
    ///
    /// # Returns
    /// A [`FetchResponse`] with the status and body returned by the remote.
    ///
    /// # Errors
    /// This function may error if the remote could not be reached at all. Note that non-2xx status
    /// codes are _not_ errors at this level.
    fn get(&self, url: &str) -> impl Send + Future<Output = Result<FetchResponse, Self::Error>>;
}



/***** TESTS *****/
