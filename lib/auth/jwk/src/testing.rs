//  TESTING.rs
//    by Lut99
//
//  Created:
//    13 Oct 2026, 15:40:22
//  Last edited:
//    16 Oct 2026, 10:11:31
//  Auto updated?
//    Yes
//
//  Description:
//!   Shared fixtures for the unit tests: an in-memory fetcher, real
//!   ES256 keys and a status sink that remembers everything.
//

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use base64ct::{Base64UrlUnpadded, Encoding as _};
use http::StatusCode;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use p256::pkcs8::EncodePrivateKey as _;
use p256::SecretKey;
use rand::rngs::OsRng;
use serde_json::{json, Map, Value};
use specifications::fetcher::{FetchResponse, HttpFetcher};
use specifications::status::{StatusSink, StatusText, StatusUpdate};
use thiserror::Error;


/***** FETCHER *****/
/// Returned by the [`MockFetcher`] for URLs it doesn't know.
#[derive(Debug, Error)]
#[error("Unexpected fetch to {url:?}")]
pub struct UnexpectedFetch {
    url: String,
}

/// An [`HttpFetcher`] that serves canned responses and counts what was asked.
#[derive(Clone, Debug, Default)]
pub struct MockFetcher {
    routes: Arc<Mutex<HashMap<String, FetchResponse>>>,
    calls:  Arc<Mutex<Vec<String>>>,
}
impl MockFetcher {
    #[inline]
    pub fn new() -> Self { Self::default() }

    pub fn with_json(self, url: &str, body: &Value) -> Self {
        self.set_json(url, body);
        self
    }

    pub fn with_status(self, url: &str, status: StatusCode) -> Self {
        self.routes.lock().unwrap().insert(url.into(), FetchResponse::new(status, "{}"));
        self
    }

    pub fn with_body(self, url: &str, body: &str) -> Self {
        self.routes.lock().unwrap().insert(url.into(), FetchResponse::new(StatusCode::OK, body));
        self
    }

    pub fn set_json(&self, url: &str, body: &Value) {
        self.routes.lock().unwrap().insert(url.into(), FetchResponse::new(StatusCode::OK, serde_json::to_vec(body).unwrap()));
    }

    /// Returns how often the given URL was fetched.
    pub fn calls(&self, url: &str) -> usize { self.calls.lock().unwrap().iter().filter(|call| *call == url).count() }

    /// Returns how often anything was fetched.
    pub fn total_calls(&self) -> usize { self.calls.lock().unwrap().len() }
}
impl HttpFetcher for MockFetcher {
    type Error = UnexpectedFetch;

    fn get(&self, url: &str) -> impl Send + Future<Output = Result<FetchResponse, Self::Error>> {
        self.calls.lock().unwrap().push(url.into());
        let res: Option<FetchResponse> = self.routes.lock().unwrap().get(url).cloned();
        let url: String = url.into();
        async move { res.ok_or(UnexpectedFetch { url }) }
    }
}





/***** KEYS *****/
/// An ES256 key pair that can sign tokens and describe itself as a JWK.
pub struct TestKey {
    kid:      Option<String>,
    encoding: EncodingKey,
    x:        String,
    y:        String,
}
impl TestKey {
    /// Generates a new P-256 key pair.
    pub fn generate(kid: Option<&str>) -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let der = secret.to_pkcs8_der().unwrap();
        let point = secret.public_key().to_encoded_point(false);
        Self {
            kid:      kid.map(String::from),
            encoding: EncodingKey::from_ec_der(der.as_bytes()),
            x:        Base64UrlUnpadded::encode_string(point.x().unwrap()),
            y:        Base64UrlUnpadded::encode_string(point.y().unwrap()),
        }
    }

    #[inline]
    pub fn kid(&self) -> Option<&str> { self.kid.as_deref() }

    /// Returns the public half as a JWK.
    pub fn jwk(&self) -> Value {
        let mut jwk: Map<String, Value> = Map::from_iter([
            ("kty".to_string(), json!("EC")),
            ("crv".to_string(), json!("P-256")),
            ("x".to_string(), json!(self.x)),
            ("y".to_string(), json!(self.y)),
            ("use".to_string(), json!("sig")),
            ("alg".to_string(), json!("ES256")),
        ]);
        if let Some(kid) = &self.kid {
            jwk.insert("kid".into(), json!(kid));
        }
        Value::Object(jwk)
    }

    /// Signs the given claims with ES256, naming this key's ID in the header.
    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = self.kid.clone();
        jsonwebtoken::encode(&header, claims, &self.encoding).unwrap()
    }
}

/// Builds a key set out of the given keys.
pub fn jwks(keys: &[&TestKey]) -> Value { json!({ "keys": keys.iter().map(|key| key.jwk()).collect::<Vec<Value>>() }) }

/// Builds a claim set issued by `iss` that expires `expires_in` seconds from now.
pub fn claims(iss: &str, expires_in: i64) -> Value {
    let now: i64 = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    json!({ "urn:example:claim": true, "iss": iss, "iat": now, "exp": now + expires_in })
}





/***** SINKS *****/
/// A [`StatusSink`] that remembers every update.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    updates: Arc<Mutex<Vec<StatusUpdate>>>,
}
impl RecordingSink {
    /// Returns the codes of all updates so far, in order.
    pub fn texts(&self) -> Vec<StatusText> { self.updates.lock().unwrap().iter().map(|update| update.text).collect() }
}
impl StatusSink for RecordingSink {
    fn status(&self, update: StatusUpdate) { self.updates.lock().unwrap().push(update); }
}
