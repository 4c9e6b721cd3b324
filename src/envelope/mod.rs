//! Signed request/response envelope.
//!
//! Every call travels as a single HS256 token whose `jwt_info` claim holds the
//! serialized [`CallDescriptor`], and every reply comes back as a token signed
//! with the same API key. A reply is never read until its signature, signing
//! family and expiry have been checked.
//!
//! Per call: build descriptor → sign ([`encode`]) → transmit → verify and
//! unwrap ([`decode`] / [`decode_for`]). Any failed check rejects the reply.

pub mod wire;

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::node::Chain;
use crate::error::{AuthError, EncodingError, SdkError, ShapeError};
use crate::shared::ApiKey;

pub use wire::{OutboundClaims, JWT_INFO, RESULT};
use wire::InboundClaims;

/// Algorithm used for outbound credentials.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Reply algorithms accepted by the verifier (the HMAC family).
pub const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

// ─── Params ──────────────────────────────────────────────────────────────────

/// Parameters of a remote procedure.
///
/// Serializes untagged, so the wire form is the bare map, array or scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Map(Map<String, Value>),
    Seq(Vec<Value>),
    Int(i64),
    Str(String),
}

impl Params {
    /// `{}`: the parameter value of argument-less methods.
    pub fn empty() -> Self {
        Params::Map(Map::new())
    }

    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Params::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Params::Seq(items.into_iter().collect())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── CallDescriptor ──────────────────────────────────────────────────────────

/// What is being asked of which node. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub network: String,
    pub chain: Chain,
    pub method: String,
    pub params: Params,
}

impl CallDescriptor {
    pub fn new(network: &str, chain: Chain, method: &str, params: Params) -> Self {
        Self {
            network: network.to_string(),
            chain,
            method: method.to_string(),
            params,
        }
    }
}

// ─── Encode ──────────────────────────────────────────────────────────────────

/// Sign `call` into an outbound credential expiring `ttl` from now.
pub fn encode(
    secret: &ApiKey,
    call: &CallDescriptor,
    ttl: Duration,
) -> Result<String, EncodingError> {
    if secret.is_empty() {
        return Err(EncodingError::EmptySecret);
    }

    let exp = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| Utc::now().timestamp().checked_add(secs))
        .ok_or(EncodingError::TtlOutOfRange(ttl))?;

    let claims = OutboundClaims {
        jwt_info: serde_json::to_string(call)?,
        exp,
    };

    let token = jsonwebtoken::encode(
        &Header::new(SIGNING_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

// ─── Decode ──────────────────────────────────────────────────────────────────

/// Verify a reply credential and return its `result`.
///
/// `status = false` is the node's "no data" answer: `Ok(None)`, and the token
/// is not looked at.
pub fn decode(secret: &ApiKey, token: &str, status: bool) -> Result<Option<Value>, SdkError> {
    if !status {
        return Ok(None);
    }
    let info = verify(secret, token)?;
    unwrap_result(info).map(Some)
}

/// [`decode`], additionally requiring any echoed `network`, `chain` or
/// `method` in the reply to match `call`.
pub fn decode_for(
    secret: &ApiKey,
    token: &str,
    status: bool,
    call: &CallDescriptor,
) -> Result<Option<Value>, SdkError> {
    if !status {
        return Ok(None);
    }
    let info = verify(secret, token)?;
    check_echo(&info, call)?;
    unwrap_result(info).map(Some)
}

/// Check signature, algorithm family and expiry, then return `jwt_info`.
fn verify(secret: &ApiKey, token: &str) -> Result<Map<String, Value>, SdkError> {
    let header =
        jsonwebtoken::decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
    if !HMAC_ALGORITHMS.contains(&header.alg) {
        return Err(AuthError::AlgorithmMismatch(format!("{:?}", header.alg)).into());
    }

    let mut validation = Validation::new(header.alg);
    validation.algorithms = HMAC_ALGORITHMS.to_vec();
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<InboundClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(auth_error)?;

    match data.claims.jwt_info {
        Some(Value::Object(info)) => Ok(info),
        // Some nodes nest the reply as a JSON string, like the outbound claim.
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(info)) => Ok(info),
            _ => Err(ShapeError::MissingField(JWT_INFO).into()),
        },
        _ => Err(ShapeError::MissingField(JWT_INFO).into()),
    }
}

fn unwrap_result(mut info: Map<String, Value>) -> Result<Value, SdkError> {
    info.remove(RESULT)
        .ok_or_else(|| ShapeError::MissingField(RESULT).into())
}

fn check_echo(info: &Map<String, Value>, call: &CallDescriptor) -> Result<(), AuthError> {
    let expected = [
        ("network", call.network.as_str()),
        ("chain", call.chain.as_str()),
        ("method", call.method.as_str()),
    ];

    for (field, want) in expected {
        let Some(got) = info.get(field) else {
            continue;
        };
        let got = match got {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if got != want {
            return Err(AuthError::EchoMismatch {
                field,
                expected: want.to_string(),
                actual: got,
            });
        }
    }
    Ok(())
}

fn auth_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAlgorithm => AuthError::AlgorithmMismatch(e.to_string()),
        _ => AuthError::Malformed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(30);

    fn key(s: &str) -> ApiKey {
        ApiKey::new(s)
    }

    fn height_call() -> CallDescriptor {
        CallDescriptor::new("mainnet", Chain::Mainchain, "getnodestate", Params::empty())
    }

    /// Sign a reply the way a node does.
    fn sign_reply(secret: &str, alg: Algorithm, claims: Value) -> String {
        jsonwebtoken::encode(
            &Header::new(alg),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn fresh_exp() -> i64 {
        Utc::now().timestamp() + 60
    }

    fn outbound_claims(secret: &str, token: &str) -> OutboundClaims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<OutboundClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .unwrap()
        .claims
    }

    #[test]
    fn test_encode_embeds_descriptor_as_json_string() {
        let call = CallDescriptor::new(
            "testnet",
            Chain::Eth,
            "eth_getBlockByNumber",
            Params::seq([json!("0x3039"), json!(true)]),
        );
        let token = encode(&key("k"), &call, TTL).unwrap();

        let claims = outbound_claims("k", &token);
        assert_eq!(
            claims.jwt_info,
            r#"{"network":"testnet","chain":"eth","method":"eth_getBlockByNumber","params":["0x3039",true]}"#
        );
        let back: CallDescriptor = serde_json::from_str(&claims.jwt_info).unwrap();
        assert_eq!(back, call);
    }

    #[test]
    fn test_encode_sets_expiry_within_ttl() {
        let before = Utc::now().timestamp();
        let token = encode(&key("k"), &height_call(), TTL).unwrap();
        let claims = outbound_claims("k", &token);
        assert!(claims.exp >= before + 30);
        assert!(claims.exp <= Utc::now().timestamp() + 30);
    }

    #[test]
    fn test_encode_rejects_ttl_past_timestamp_range() {
        for ttl in [Duration::from_secs(u64::MAX), Duration::from_secs(i64::MAX as u64)] {
            let err = encode(&key("k"), &height_call(), ttl).unwrap_err();
            assert!(matches!(err, EncodingError::TtlOutOfRange(d) if d == ttl));
        }
    }

    #[test]
    fn test_encode_uses_hs256() {
        let token = encode(&key("k"), &height_call(), TTL).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_encode_rejects_empty_secret() {
        let err = encode(&key(""), &height_call(), TTL).unwrap_err();
        assert!(matches!(err, EncodingError::EmptySecret));
    }

    #[test]
    fn test_outbound_token_fails_under_other_secret() {
        let token = encode(&key("s1"), &height_call(), TTL).unwrap();
        let validation = Validation::new(Algorithm::HS256);
        let err = jsonwebtoken::decode::<OutboundClaims>(
            &token,
            &DecodingKey::from_secret(b"s2"),
            &validation,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn test_decode_unwraps_result() {
        let reply = sign_reply(
            "k",
            Algorithm::HS256,
            json!({"jwt_info": {"result": {"height": 12345.0}}, "exp": fresh_exp()}),
        );
        let value = decode(&key("k"), &reply, true).unwrap();
        assert_eq!(value, Some(json!({"height": 12345.0})));
    }

    #[test]
    fn test_decode_accepts_whole_hmac_family() {
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let reply = sign_reply("k", alg, json!({"jwt_info": {"result": "0x1a"}}));
            assert_eq!(decode(&key("k"), &reply, true).unwrap(), Some(json!("0x1a")));
        }
    }

    #[test]
    fn test_decode_accepts_string_encoded_jwt_info() {
        let reply = sign_reply(
            "k",
            Algorithm::HS256,
            json!({"jwt_info": r#"{"result": [1, 2]}"#, "exp": fresh_exp()}),
        );
        assert_eq!(decode(&key("k"), &reply, true).unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn test_decode_preserves_null_result() {
        let reply = sign_reply("k", Algorithm::HS256, json!({"jwt_info": {"result": null}}));
        assert_eq!(decode(&key("k"), &reply, true).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_decode_rejects_mismatched_secret() {
        let reply = sign_reply("s1", Algorithm::HS256, json!({"jwt_info": {"result": 1}}));
        let err = decode(&key("s2"), &reply, true).unwrap_err();
        assert!(matches!(err, SdkError::Auth(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let reply = sign_reply(
            "k",
            Algorithm::HS256,
            json!({"jwt_info": {"result": 1}, "exp": Utc::now().timestamp() - 5}),
        );
        let err = decode(&key("k"), &reply, true).unwrap_err();
        assert!(matches!(err, SdkError::Auth(AuthError::TokenExpired)));
    }

    #[test]
    fn test_decode_rejects_expired_token_with_bad_signature() {
        let reply = sign_reply(
            "other",
            Algorithm::HS256,
            json!({"jwt_info": {"result": 1}, "exp": Utc::now().timestamp() - 5}),
        );
        assert!(matches!(
            decode(&key("k"), &reply, true),
            Err(SdkError::Auth(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_hmac_algorithm() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"jwt_info":{"result":1}}"#);
        let token = format!("{}.{}.{}", header, payload, URL_SAFE_NO_PAD.encode("sig"));

        let err = decode(&key("k"), &token, true).unwrap_err();
        assert!(matches!(
            err,
            SdkError::Auth(AuthError::AlgorithmMismatch(ref alg)) if alg == "RS256"
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(&key("k"), "not-a-token", true).unwrap_err();
        assert!(matches!(err, SdkError::Auth(AuthError::Malformed(_))));
    }

    #[test]
    fn test_decode_status_false_short_circuits() {
        // Never inspected, so garbage is fine.
        assert_eq!(decode(&key("k"), "not-a-token", false).unwrap(), None);
        assert_eq!(decode(&key(""), "", false).unwrap(), None);
        assert_eq!(
            decode_for(&key("k"), "???", false, &height_call()).unwrap(),
            None
        );
    }

    #[test]
    fn test_decode_missing_jwt_info_is_shape_error() {
        let reply = sign_reply("k", Algorithm::HS256, json!({"exp": fresh_exp()}));
        let err = decode(&key("k"), &reply, true).unwrap_err();
        assert!(matches!(err, SdkError::Shape(ShapeError::MissingField("jwt_info"))));
    }

    #[test]
    fn test_decode_missing_result_is_shape_error() {
        let reply = sign_reply("k", Algorithm::HS256, json!({"jwt_info": {"other": 1}}));
        let err = decode(&key("k"), &reply, true).unwrap_err();
        assert!(matches!(err, SdkError::Shape(ShapeError::MissingField("result"))));
    }

    #[test]
    fn test_decode_for_accepts_matching_echo() {
        let reply = sign_reply(
            "k",
            Algorithm::HS256,
            json!({"jwt_info": {
                "network": "mainnet",
                "chain": "mainchain",
                "method": "getnodestate",
                "result": {"height": 7.0}
            }}),
        );
        let value = decode_for(&key("k"), &reply, true, &height_call()).unwrap();
        assert_eq!(value, Some(json!({"height": 7.0})));
    }

    #[test]
    fn test_decode_for_rejects_mismatched_echo() {
        let reply = sign_reply(
            "k",
            Algorithm::HS256,
            json!({"jwt_info": {"method": "getmininginfo", "result": {}}}),
        );
        let err = decode_for(&key("k"), &reply, true, &height_call()).unwrap_err();
        match err {
            SdkError::Auth(AuthError::EchoMismatch {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "method");
                assert_eq!(expected, "getnodestate");
                assert_eq!(actual, "getmininginfo");
            }
            other => panic!("expected echo mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_through_simulated_node() {
        let secret = key("shared");
        let call = CallDescriptor::new(
            "mainnet",
            Chain::Token,
            "getreceivedbyaddress",
            Params::map([("address", json!("EfZ6oNo4oKgefbuX3t2dVrH9ME2mR4ZZka"))]),
        );
        let token = encode(&secret, &call, TTL).unwrap();

        // Node side: verify, read the descriptor, answer with an echo.
        let received: CallDescriptor =
            serde_json::from_str(&outbound_claims("shared", &token).jwt_info).unwrap();
        let reply = sign_reply(
            "shared",
            Algorithm::HS256,
            json!({"jwt_info": {
                "network": received.network,
                "chain": received.chain,
                "method": received.method,
                "result": {"ELA": "1.5"}
            }, "exp": fresh_exp()}),
        );

        let value = decode_for(&secret, &reply, true, &call).unwrap();
        assert_eq!(value, Some(json!({"ELA": "1.5"})));
    }

    #[test]
    fn test_params_wire_forms() {
        assert_eq!(serde_json::to_string(&Params::empty()).unwrap(), "{}");
        assert_eq!(serde_json::to_string(&Params::Int(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&Params::Str("latest".into())).unwrap(),
            r#""latest""#
        );
        assert_eq!(
            serde_json::to_string(&Params::map([("start", json!(0)), ("state", json!("all"))]))
                .unwrap(),
            r#"{"start":0,"state":"all"}"#
        );
    }
}
