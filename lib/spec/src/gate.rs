//  GATE.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 10:05:33
//  Last edited:
//    14 Oct 2026, 09:58:12
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`MessageGate`] trait, which takes an inbound message
//!   and decides where it goes.
//

use std::future::Future;

use crate::message::Message;
use crate::outcome::Outcome;


/***** LIBRARY *****/
/// A gate that takes an inbound pipeline message and (hopefully) authenticates it.
///
/// Note that the MessageGate is intended to be used by a host that may dispatch messages from
/// multiple tasks. As such, any reference to `self` is done immutably only.
pub trait MessageGate {
    /// Processes a single inbound message.
    ///
    /// # Arguments
    /// - `msg`: The [`Message`] to process.
    ///
    /// # Returns
    /// An [`Outcome`] that tells the host on which output (if any) the message should be emitted.
    ///
    /// Note that this function never fails. Anything that goes wrong is encoded in the outcome.
    fn process(&self, msg: Message) -> impl Send + Future<Output = Outcome>;
}
