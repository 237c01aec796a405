//  LIB.rs
//    by Lut99
//
//  Created:
//    23 Oct 2024, 10:37:34
//  Last edited:
//    16 Oct 2026, 14:50:02
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a JSON Web Token (JWT) / JSON Web Key (JWK)-based
//!   [`MessageGate`](specifications::MessageGate) that finds its keys
//!   through a remote key set or OIDC discovery.
//

// Modules
mod config;
mod gate;
pub mod keyresolver;
mod node;
mod resolver;
pub mod status;
#[cfg(test)]
mod testing;

// Use some of it into the main namespace
pub use config::*;
pub use gate::*;
pub use node::*;
pub use resolver::*;
