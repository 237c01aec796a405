//  MOD.rs
//    by Lut99
//
//  Created:
//    14 Oct 2026, 10:20:31
//  Last edited:
//    16 Oct 2026, 11:03:18
//  Auto updated?
//    Yes
//
//  Description:
//!   Shared fixtures for the integration tests.
//

use base64ct::{Base64UrlUnpadded, Encoding as _};
use bearer_verify::auth::jwk::status::WatchSink;
use bearer_verify::auth::jwk::{VerifyConfig, VerifyNode, Wires};
use bearer_verify::http::reqwest::ReqwestFetcher;
use bearer_verify::spec::Message;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use p256::SecretKey;
use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use p256::pkcs8::EncodePrivateKey as _;
use rand::rngs::OsRng;
use serde_json::{Value, json};
use tokio::sync::mpsc;


/***** CONSTANTS *****/
/// The issuer used in all tokens.
pub const ISSUER: &str = "https://idm.example.com";





/***** KEYS *****/
/// An ES256 key pair.
pub struct TestKey {
    kid:      String,
    encoding: EncodingKey,
    jwk:      Value,
}
impl TestKey {
    pub fn generate(kid: &str) -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let der = secret.to_pkcs8_der().unwrap();
        let point = secret.public_key().to_encoded_point(false);
        Self {
            kid:      kid.into(),
            encoding: EncodingKey::from_ec_der(der.as_bytes()),
            jwk:      json!({
                "kty": "EC",
                "crv": "P-256",
                "x": Base64UrlUnpadded::encode_string(point.x().unwrap()),
                "y": Base64UrlUnpadded::encode_string(point.y().unwrap()),
                "kid": kid,
                "use": "sig",
                "alg": "ES256",
            }),
        }
    }

    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.kid.clone());
        jsonwebtoken::encode(&header, claims, &self.encoding).unwrap()
    }
}

/// Builds a key set with the given keys.
pub fn jwks(keys: &[&TestKey]) -> Value { json!({ "keys": keys.iter().map(|key| key.jwk.clone()).collect::<Vec<Value>>() }) }

/// Builds claims issued by [`ISSUER`] that expire in two hours.
pub fn claims() -> Value {
    let now: i64 = chrono::Utc::now().timestamp();
    json!({ "urn:example:claim": true, "iss": ISSUER, "iat": now, "exp": now + 7200 })
}

/// Builds a message with the given token in its authorization header.
pub fn bearer(token: &str) -> Message {
    Message::try_from(json!({ "payload": "foo", "req": { "headers": { "authorization": format!("Bearer {token}") } } })).unwrap()
}





/***** NODES *****/
/// Starts a node with a real HTTP client.
pub fn start(config: &VerifyConfig) -> (VerifyNode<ReqwestFetcher, WatchSink>, tokio::sync::watch::Receiver<Option<bearer_verify::spec::status::StatusUpdate>>) {
    let (sink, status) = WatchSink::new();
    (VerifyNode::start(config, ReqwestFetcher::new().unwrap(), sink), status)
}

/// Runs all messages through the node.
///
/// # Returns
/// Everything emitted on the success output, and everything emitted on the failure output.
pub async fn run(node: VerifyNode<ReqwestFetcher, WatchSink>, msgs: Vec<Message>) -> (Vec<Message>, Vec<Message>) {
    let (input, inputs) = mpsc::channel(msgs.len().max(1));
    let (wires, mut success, mut failure) = Wires::new(msgs.len().max(1));
    for msg in msgs {
        input.send(msg).await.unwrap();
    }
    drop(input);
    node.run(inputs, wires).await;

    let (mut ok, mut err) = (vec![], vec![]);
    while let Some(msg) = success.recv().await {
        ok.push(msg);
    }
    while let Some(msg) = failure.recv().await {
        err.push(msg);
    }
    (ok, err)
}
