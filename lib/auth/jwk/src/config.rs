//  CONFIG.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 13:21:37
//  Last edited:
//    15 Oct 2026, 11:44:02
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines how a verifying node is configured.
//

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;


/***** ERRORS *****/
/// Defines the errors that may occur when loading a [`VerifyConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to deserialize the config file.
    #[error("Failed to deserialize config file {:?}", path.display())]
    FileDeserialize {
        path: PathBuf,
        #[source]
        err:  serde_json::Error,
    },
    /// Failed to read the config file to memory.
    #[error("Failed to read config file {:?}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        err:  std::io::Error,
    },
}





/***** LIBRARY *****/
/// The configuration of a verifying node. Fixed once the node is started.
///
/// Any other fields in the serialized form (e.g., the host's `id` or `wires`) are ignored.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyConfig {
    /// Either the URL of the JWKS itself, or of an OIDC discovery document pointing to it.
    pub info_url: String,
    /// The audience tokens must be issued for. Not checked if omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}
impl VerifyConfig {
    /// Constructor for the VerifyConfig.
    ///
    /// # Arguments
    /// - `info_url`: The URL of the JWKS or of an OIDC discovery document.
    /// - `audience`: The expected `aud` claim, if any.
    ///
    /// # Returns
    /// A new VerifyConfig.
    #[inline]
    pub fn new(info_url: impl Into<String>, audience: Option<String>) -> Self { Self { info_url: info_url.into(), audience } }

    /// Loads the VerifyConfig from a JSON file.
    ///
    /// # Arguments
    /// - `path`: The path of the file to load.
    ///
    /// # Returns
    /// A new VerifyConfig with the file's contents.
    ///
    /// # Errors
    /// This function can fail if it failed to read the file (e.g., it does not exist) or if it
    /// wasn't parsable as a config.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path: &Path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::FileRead { path: path.into(), err })?;
        serde_json::from_str(&raw).map_err(|err| ConfigError::FileDeserialize { path: path.into(), err })
    }

    /// Returns the audience to check, if any. An empty audience counts as none.
    #[inline]
    pub fn audience(&self) -> Option<&str> { self.audience.as_deref().filter(|aud| !aud.is_empty()) }
}



/***** TESTS *****/
