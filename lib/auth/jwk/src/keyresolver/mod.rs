//  KEYRESOLVER.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 11:20:43
//  Last edited:
//    15 Oct 2026, 09:12:08
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides resolvers for JWT keys.
//

// Modules
pub mod remote;

// Imports
use std::error::Error;
use std::future::Future;

use jsonwebtoken::{DecodingKey, Header};
pub use remote::RemoteJwkSet;


/***** LIBRARY *****/
/// The trait implemented by various key sources.
///
/// Note that the KeyResolver is shared by every message passing the gate. As such, any reference
/// to `self` is done immutably only, and implementations are expected to do their own caching and
/// locking.
pub trait KeyResolver {
    /// Client-side errors produced by the KeyResolver (i.e., the token's fault).
    type ClientError: 'static + Send + Sync + Error;
    /// Server-side errors produced by the KeyResolver (i.e., the key set's fault).
    type ServerError: 'static + Send + Sync + Error;


    /// Provides the correct key to decode the JWT with based on its header.
    ///
    /// # Arguments
    /// - `header`: The JWT [`Header`] that tells us which key to find.
    ///
    /// # Returns
    /// A [`DecodingKey`] that can be used to verify the JWT.
    ///
    /// # Errors
    /// This function may error if we failed to obtain the key somehow.
    ///
    /// There are two levels at which it can do so:
    /// - The _outer_ [`Result`] is used to indicate _server_ errors (e.g., key set unreachable,
    ///   etc); and
    /// - The _inner_ [`Result`] is used to indicate _token_ errors (e.g., no key, wrong key, etc).
    ///
    /// Both reject the message. Server errors are additionally logged at `error` level, and the
    /// message reports the key set as unavailable.
    fn resolve_key(&self, header: &Header) -> impl Send + Future<Output = Result<Result<DecodingKey, Self::ClientError>, Self::ServerError>>;
}
