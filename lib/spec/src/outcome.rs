//  OUTCOME.rs
//    by Lut99
//
//  Created:
//    12 Oct 2026, 10:32:19
//  Last edited:
//    15 Oct 2026, 14:10:56
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines what a [`MessageGate`](crate::MessageGate) decides about a
//!   message.
//

use crate::message::Message;


/***** CONSTANTS *****/
/// The index of the output receiving authenticated messages.
pub const SUCCESS_OUTPUT: usize = 0;
/// The index of the output receiving rejected messages.
pub const FAILURE_OUTPUT: usize = 1;





/***** LIBRARY *****/
/// The result of processing a single message.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The message was authenticated and should be sent to the success output.
    Authenticated(Message),
    /// The message was rejected and should be sent, annotated with an error, to the failure output.
    Rejected(Message),
    /// The message could not be processed at all and should not be sent anywhere.
    ///
    /// The message is carried along only so hosts can log or inspect it.
    Dropped(Message),
}
impl Outcome {
    /// Returns the index of the output this outcome should be sent to.
    ///
    /// # Returns
    /// [`SUCCESS_OUTPUT`] or [`FAILURE_OUTPUT`], or [`None`] if the message shouldn't be emitted.
    #[inline]
    pub fn output(&self) -> Option<usize> {
        match self {
            Self::Authenticated(_) => Some(SUCCESS_OUTPUT),
            Self::Rejected(_) => Some(FAILURE_OUTPUT),
            Self::Dropped(_) => None,
        }
    }

    /// Returns the message carried by this outcome, regardless of where it goes.
    #[inline]
    pub fn message(&self) -> &Message {
        match self {
            Self::Authenticated(msg) | Self::Rejected(msg) | Self::Dropped(msg) => msg,
        }
    }

    /// Spreads this outcome over the two outputs.
    ///
    /// # Returns
    /// An array with one slot per output, where at most one of them is populated.
    #[inline]
    pub fn into_outputs(self) -> [Option<Message>; 2] {
        match self {
            Self::Authenticated(msg) => [Some(msg), None],
            Self::Rejected(msg) => [None, Some(msg)],
            Self::Dropped(_) => [None, None],
        }
    }
}



/***** TESTS *****/
