//  LIB.rs
//    by Lut99
//
//  Created:
//    18 Oct 2024, 17:31:50
//  Last edited:
//    14 Oct 2026, 09:48:12
//  Auto updated?
//    Yes
//
//  Description:
//!   Verifies bearer JSON Web Tokens (JWTs) carried by pipeline messages
//!   against a remote key set, which may be found through OIDC
//!   discovery.
//

// Import the libraries
pub mod auth {
    #[cfg(feature = "jwk-verify")]
    pub use jwk_verify as jwk;
}

pub mod http {
    #[cfg(feature = "reqwest-fetcher")]
    pub use reqwest_fetcher as reqwest;
}

pub use specifications as spec;
