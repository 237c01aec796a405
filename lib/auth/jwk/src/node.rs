//  NODE.rs
//    by Lut99
//
//  Created:
//    13 Oct 2026, 16:12:08
//  Last edited:
//    16 Oct 2026, 14:41:55
//  Auto updated?
//    Yes
//
//  Description:
//!   Wires a [`VerifyGate`] into a pipeline: resolves the key set in the
//!   background and routes every incoming message to one of two outputs.
//

use std::sync::Arc;

use error_trace::trace;
use specifications::fetcher::HttpFetcher;
use specifications::outcome::{FAILURE_OUTPUT, SUCCESS_OUTPUT};
use specifications::status::{StatusSink, StatusText};
use specifications::{Message, MessageGate, Outcome};
use thiserror::Error;
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, span, Level};

use crate::config::VerifyConfig;
use crate::gate::VerifyGate;
use crate::keyresolver::RemoteJwkSet;
use crate::resolver::KeySetResolver;


/***** ERRORS *****/
/// Defines the errors that may occur when emitting messages.
#[derive(Debug, Error)]
pub enum WireError {
    /// Nobody is listening on the output anymore.
    #[error("Output {output} is closed")]
    Closed { output: usize },
}





/***** AUXILLARY *****/
/// The two outputs of a verifying node.
#[derive(Clone, Debug)]
pub struct Wires {
    /// Receives authenticated messages.
    pub success: mpsc::Sender<Message>,
    /// Receives rejected messages.
    pub failure: mpsc::Sender<Message>,
}
impl Wires {
    /// Creates a new pair of outputs.
    ///
    /// # Arguments
    /// - `capacity`: The number of messages each output buffers.
    ///
    /// # Returns
    /// A tuple of the new Wires, the receiving end of the success output and the receiving end of
    /// the failure output.
    #[inline]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Message>, mpsc::Receiver<Message>) {
        let (success, success_rx) = mpsc::channel(capacity);
        let (failure, failure_rx) = mpsc::channel(capacity);
        (Self { success, failure }, success_rx, failure_rx)
    }

    /// Sends the message in the given outcome to the output it belongs to.
    ///
    /// Dropped messages are not sent anywhere.
    ///
    /// # Arguments
    /// - `outcome`: The [`Outcome`] to route.
    ///
    /// # Errors
    /// This function errors if the output the message belongs to has been closed.
    pub async fn route(&self, outcome: Outcome) -> Result<(), WireError> {
        match outcome {
            Outcome::Authenticated(msg) => self.success.send(msg).await.map_err(|_| WireError::Closed { output: SUCCESS_OUTPUT }),
            Outcome::Rejected(msg) => self.failure.send(msg).await.map_err(|_| WireError::Closed { output: FAILURE_OUTPUT }),
            Outcome::Dropped(_) => Ok(()),
        }
    }
}





/***** LIBRARY *****/
/// A verifying pipeline node.
///
/// On start, the configured info URL is resolved to a key set in the background. Messages arriving
/// before that has succeeded are dropped. If it fails, it is not retried, and every message is
/// dropped for as long as the node lives.
#[derive(Debug)]
pub struct VerifyNode<F, S> {
    /// The gate doing the actual work.
    gate:     Arc<VerifyGate<RemoteJwkSet<F>, Arc<S>>>,
    /// The background task resolving the key set, if we haven't waited for it yet.
    resolver: Option<JoinHandle<()>>,
}
impl<F, S> VerifyNode<F, S>
where
    F: 'static + Send + Sync + HttpFetcher,
    S: 'static + Send + Sync + StatusSink,
{
    /// Starts a new VerifyNode.
    ///
    /// Note that this must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// - `config`: The [`VerifyConfig`] to start with.
    /// - `fetcher`: Some [`HttpFetcher`] used to find and fetch the key set.
    /// - `sink`: Some [`StatusSink`] that is kept up-to-date on what the node does.
    ///
    /// # Returns
    /// A new VerifyNode which isn't ready yet.
    pub fn start(config: &VerifyConfig, fetcher: F, sink: S) -> Self {
        let sink: Arc<S> = Arc::new(sink);
        let keys: Arc<OnceCell<RemoteJwkSet<F>>> = Arc::new(OnceCell::new());
        let gate = Arc::new(VerifyGate::new(config.audience(), keys.clone(), sink.clone()));

        let info_url: String = config.info_url.clone();
        let resolver = tokio::spawn(async move {
            let _span = span!(Level::INFO, "VerifyNode::resolve", info_url = info_url.as_str());
            match KeySetResolver::new(fetcher).resolve(&info_url).await {
                Ok(set) => {
                    info!("Resolved JWKS URL {:?}", set.url().as_str());
                    if keys.set(set).is_err() {
                        error!("Key set was already resolved");
                        return;
                    }
                    sink.status(StatusText::Initialized.into());
                },
                Err(err) => {
                    error!("{}", trace!(("Failed to resolve JWKS URL from {info_url:?}"), err));
                    sink.status(StatusText::InvalidOidcConfig.into());
                },
            }
        });

        Self { gate, resolver: Some(resolver) }
    }

    /// Waits until the background resolution has finished.
    ///
    /// # Returns
    /// Whether the node is ready to verify messages. If not, it never will be.
    pub async fn initialized(&mut self) -> bool {
        if let Some(resolver) = self.resolver.take() {
            if let Err(err) = resolver.await {
                error!("{}", trace!(("Key set resolver task failed"), err));
            }
        }
        self.gate.is_ready()
    }

    /// Processes messages until the input closes.
    ///
    /// Messages are handled one at a time, in the order they arrive. Once an output closes, the
    /// messages meant for it are discarded.
    ///
    /// # Arguments
    /// - `inputs`: The receiving end of the channel delivering messages.
    /// - `wires`: The [`Wires`] to route the results to.
    pub async fn run(self, mut inputs: mpsc::Receiver<Message>, wires: Wires) {
        let _span = span!(Level::INFO, "VerifyNode::run");
        while let Some(msg) = inputs.recv().await {
            let outcome: Outcome = self.gate.process(msg).await;
            debug!("Routing message to output {:?}", outcome.output());
            if let Err(err) = wires.route(outcome).await {
                debug!("{err}");
            }
        }
        debug!("Input closed");
    }
}
impl<F, S> VerifyNode<F, S> {
    /// Returns the gate of this node, e.g., to process messages without channels.
    #[inline]
    pub fn gate(&self) -> &VerifyGate<RemoteJwkSet<F>, Arc<S>> { &self.gate }

    /// Returns whether the key set has been resolved.
    #[inline]
    pub fn is_ready(&self) -> bool { self.gate.is_ready() }
}
impl<F, S> Drop for VerifyNode<F, S> {
    #[inline]
    fn drop(&mut self) {
        if let Some(resolver) = self.resolver.take() {
            resolver.abort();
        }
    }
}



/***** TESTS *****/
#[cfg(test)]
mod tests {
    use serde_json::json;
    use specifications::message::ErrorCode;

    use super::*;
    use crate::testing::{claims, jwks, MockFetcher, RecordingSink, TestKey};

    const ISSUER: &str = "https://idm.example.com";
    const DISCOVERY_URL: &str = "https://idm.example.com/.well-known/openid-configuration";
    const JWKS_URL: &str = "https://idm.example.com/jwks.json";

    fn bearer(token: &str) -> Message { Message::try_from(json!({ "req": { "headers": { "authorization": format!("Bearer {token}") } } })).unwrap() }

    #[tokio::test]
    async fn test_wires_route() {
        let (wires, mut success, mut failure) = Wires::new(4);
        wires.route(Outcome::Authenticated(Message::new())).await.unwrap();
        wires.route(Outcome::Rejected(Message::new())).await.unwrap();
        wires.route(Outcome::Dropped(Message::new())).await.unwrap();
        drop(wires);

        assert!(success.recv().await.is_some());
        assert!(success.recv().await.is_none());
        assert!(failure.recv().await.is_some());
        assert!(failure.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_wires_closed() {
        let (wires, success, _failure) = Wires::new(1);
        drop(success);
        assert!(matches!(wires.route(Outcome::Authenticated(Message::new())).await, Err(WireError::Closed { output: SUCCESS_OUTPUT })));
    }

    #[tokio::test]
    async fn test_start_with_discovery() {
        let key = TestKey::generate(Some("test-key-id"));
        let fetcher = MockFetcher::new().with_json(DISCOVERY_URL, &json!({ "jwks_uri": JWKS_URL })).with_json(JWKS_URL, &jwks(&[&key]));
        let sink = RecordingSink::default();
        let mut node = VerifyNode::start(&VerifyConfig::new(DISCOVERY_URL, None), fetcher.clone(), sink.clone());

        assert!(node.initialized().await);
        assert!(node.is_ready());
        assert_eq!(sink.texts(), vec![StatusText::Initialized]);
        assert_eq!(fetcher.calls(DISCOVERY_URL), 1);
        assert_eq!(fetcher.calls(JWKS_URL), 0);

        let outcome = node.gate().process(bearer(&key.sign(&claims(ISSUER, 7200)))).await;
        assert_eq!(outcome.message().claims().unwrap()["iss"], ISSUER);
        assert_eq!(fetcher.calls(JWKS_URL), 1);
    }

    #[tokio::test]
    async fn test_start_failed_discovery() {
        let fetcher = MockFetcher::new().with_json(DISCOVERY_URL, &json!({ "issuer": ISSUER }));
        let sink = RecordingSink::default();
        let mut node = VerifyNode::start(&VerifyConfig::new(DISCOVERY_URL, None), fetcher, sink.clone());

        assert!(!node.initialized().await);
        assert_eq!(sink.texts(), vec![StatusText::InvalidOidcConfig]);

        // Every message is dropped from now on
        let key = TestKey::generate(None);
        let outcome = node.gate().process(bearer(&key.sign(&claims(ISSUER, 7200)))).await;
        assert!(matches!(outcome, Outcome::Dropped(_)));
        assert_eq!(sink.texts(), vec![StatusText::InvalidOidcConfig, StatusText::NotInitialized]);
    }

    #[tokio::test]
    async fn test_run_routes() {
        let key = TestKey::generate(Some("test-key-id"));
        let fetcher = MockFetcher::new().with_json(JWKS_URL, &jwks(&[&key]));
        let mut node = VerifyNode::start(&VerifyConfig::new(JWKS_URL, None), fetcher, RecordingSink::default());
        assert!(node.initialized().await);

        let (input, inputs) = mpsc::channel(4);
        let (wires, mut success, mut failure) = Wires::new(4);
        let handle = tokio::spawn(node.run(inputs, wires));

        input.send(bearer(&key.sign(&claims(ISSUER, 7200)))).await.unwrap();
        input.send(Message::try_from(json!({ "payload": "foo" })).unwrap()).await.unwrap();
        drop(input);
        handle.await.unwrap();

        let ok: Message = success.recv().await.unwrap();
        assert_eq!(ok.claims().unwrap()["iss"], ISSUER);
        let err: Message = failure.recv().await.unwrap();
        assert_eq!(err.error().unwrap().code, ErrorCode::MissingToken);
        assert!(success.recv().await.is_none());
        assert!(failure.recv().await.is_none());
    }
}
