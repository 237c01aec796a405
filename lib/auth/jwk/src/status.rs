//  STATUS.rs
//    by Lut99
//
//  Created:
//    13 Oct 2026, 11:02:45
//  Last edited:
//    15 Oct 2026, 16:20:13
//  Auto updated?
//    Yes
//
//  Description:
//!   Some ready-made [`StatusSink`]s.
//

use specifications::status::{StatusLevel, StatusSink, StatusUpdate};
use tokio::sync::watch;
use tracing::{info, warn};


/***** LIBRARY *****/
/// A [`StatusSink`] that writes every update to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;
impl StatusSink for LogSink {
    #[inline]
    fn status(&self, update: StatusUpdate) {
        match update.level() {
            StatusLevel::Info => info!("Status: {} ({:?} {:?})", update.text, update.fill, update.shape),
            StatusLevel::Error => warn!("Status: {} ({:?} {:?})", update.text, update.fill, update.shape),
        }
    }
}



/// A [`StatusSink`] that only keeps the latest update, which can be observed through a
/// [`watch::Receiver`].
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<Option<StatusUpdate>>,
}
impl WatchSink {
    /// Constructor for the WatchSink.
    ///
    /// # Returns
    /// A tuple of the new WatchSink and a receiver that sees [`None`] until the first update.
    #[inline]
    pub fn new() -> (Self, watch::Receiver<Option<StatusUpdate>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }

    /// Returns the latest update, if any.
    #[inline]
    pub fn latest(&self) -> Option<StatusUpdate> { *self.tx.borrow() }
}
impl StatusSink for WatchSink {
    #[inline]
    fn status(&self, update: StatusUpdate) {
        // Nobody listening is fine
        self.tx.send_replace(Some(update));
    }
}



/***** TESTS *****/
