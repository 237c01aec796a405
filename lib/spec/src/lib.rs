//  LIB.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 09:41:17
//  Last edited:
//    16 Oct 2026, 11:02:45
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides public interfaces for things to be compatible with the
//!   bearer-verify library.
//

// Declare modules
pub mod fetcher;
pub mod gate;
pub mod message;
pub mod outcome;
pub mod status;

// Import some things into the main scope
pub use fetcher::{FetchResponse, HttpFetcher};
pub use gate::MessageGate;
pub use message::Message;
pub use outcome::Outcome;
pub use status::StatusSink;
