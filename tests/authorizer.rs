//! End-to-end authorization of edge requests with real RS256 tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::{crypto, Algorithm, EncodingKey};
use paywarden::authorizer::{API_KEY_HEADER, SUBSCRIBER_HEADER};
use paywarden::http::response::UNAUTHORIZED_BODY;
use paywarden::{
    Clock, Decision, EdgeRequest, EdgeResponse, Outcome, PaywallConfig, RejectReason,
    RequestAuthorizer, ResourceRequest,
};
use serde_json::json;
use std::sync::Arc;
use std::thread;

const NOW: i64 = 1_736_942_400;
const SIGNER_A: &str = include_str!("fixtures/signer_a.pem");
const SIGNER_B: &str = include_str!("fixtures/signer_b.pem");
const SIGNER_A_PUB: &str = include_str!("fixtures/signer_a.pub.pem");
const JWKS: &str = include_str!("fixtures/jwks.json");
const API_KEY: &str = "origin-shared-secret";

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap()
    }
}

/// Only K1 is trusted; signer B's key is deliberately absent.
fn authorizer() -> RequestAuthorizer {
    let config = json!({
        "keys": { "K1": SIGNER_A_PUB },
        "products": { "product-a": "A", "product-b": "B" },
        "origin_api_key": API_KEY,
    });
    let config = PaywallConfig::from_json(&config.to_string()).unwrap();
    RequestAuthorizer::with_clock(Arc::new(config), Arc::new(FixedClock(NOW))).unwrap()
}

fn encode_json(value: &serde_json::Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string())
}

fn sign(pem: &str, signing_input: &str) -> String {
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    crypto::sign(signing_input.as_bytes(), &key, Algorithm::RS256).unwrap()
}

fn mint_with(pem: &str, header: serde_json::Value, claims: serde_json::Value) -> String {
    let signing_input = format!("{}.{}", encode_json(&header), encode_json(&claims));
    let signature = sign(pem, &signing_input);
    format!("{}.{}", signing_input, signature)
}

fn mint(kid: &str, exp: i64, subs: &str) -> String {
    mint_with(
        SIGNER_A,
        json!({ "kid": kid, "alg": "RS256" }),
        json!({ "exp": exp, "custom:subs": subs, "sub": "user-1" }),
    )
}

fn get(path: &str, token: &str) -> ResourceRequest {
    ResourceRequest::new("GET", path).with_cookie(format!("jwt={}", token))
}

fn forwarded(outcome: Outcome<ResourceRequest>) -> ResourceRequest {
    match outcome {
        Outcome::Forward(request) => request,
        Outcome::Respond(response) => panic!("expected forward, got {:?}", response),
    }
}

fn assert_rejected(outcome: Outcome<ResourceRequest>) {
    match outcome {
        Outcome::Respond(response) => {
            assert_eq!(response, EdgeResponse::unauthorized());
            assert_eq!(response.body, UNAUTHORIZED_BODY);
        }
        Outcome::Forward(request) => panic!("expected rejection, forwarded {:?}", request),
    }
}

#[test]
fn subscriber_forwarded_with_true_header() {
    let token = mint("K1", NOW + 3600, "A,B");
    let request = forwarded(authorizer().authorize(get("/product-a/content/123", &token)));

    assert_eq!(request.header(SUBSCRIBER_HEADER), Some("true"));
    assert_eq!(request.header(API_KEY_HEADER), Some(API_KEY));
    assert_eq!(request.path, "/product-a/content/123");
}

#[test]
fn non_subscriber_forwarded_with_false_header() {
    let token = mint("K1", NOW + 3600, "B");
    let request = forwarded(authorizer().authorize(get("/product-a/content/123", &token)));

    assert_eq!(request.header(SUBSCRIBER_HEADER), Some("false"));
    assert_eq!(request.header(API_KEY_HEADER), Some(API_KEY));
}

#[test]
fn unmapped_product_forwarded_unchanged() {
    let token = mint("K1", NOW + 3600, "A,B");
    let original = get("/product-c/content/5", &token);
    let request = forwarded(authorizer().authorize(original.clone()));

    assert_eq!(request, original);
    assert_eq!(request.header(SUBSCRIBER_HEADER), None);
    assert_eq!(request.header(API_KEY_HEADER), None);
}

#[test]
fn expired_token_rejected_regardless_of_subscriptions() {
    let token = mint("K1", NOW - 1, "A,B");
    let request = get("/product-a/content/123", &token);

    assert_eq!(
        authorizer().decide(&request),
        Decision::Rejected(RejectReason::Expired)
    );
    assert_rejected(authorizer().authorize(request));
}

#[test]
fn cookie_without_jwt_prefix_rejected_as_missing() {
    let request = ResourceRequest::new("GET", "/product-a/content/123").with_cookie("foo=bar");

    assert_eq!(
        authorizer().decide(&request),
        Decision::Rejected(RejectReason::MissingToken)
    );
    assert_rejected(authorizer().authorize(request));
}

#[test]
fn no_cookies_rejected_even_on_unmapped_path() {
    let request = ResourceRequest::new("GET", "/product-c/content/5");
    assert_eq!(
        authorizer().decide(&request),
        Decision::Rejected(RejectReason::MissingToken)
    );
}

#[test]
fn bit_flipped_signature_rejected() {
    let token = mint("K1", NOW + 3600, "A,B");
    let (signing_input, signature) = token.rsplit_once('.').unwrap();
    let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
    bytes[0] ^= 0x80;
    let tampered = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(bytes));

    let request = get("/product-a/content/123", &tampered);
    assert_eq!(
        authorizer().decide(&request),
        Decision::Rejected(RejectReason::InvalidSignature)
    );
    assert_rejected(authorizer().authorize(request));
}

#[test]
fn tampered_payload_rejected() {
    let token = mint("K1", NOW + 3600, "B");
    let (header, rest) = token.split_once('.').unwrap();
    let (_, signature) = rest.split_once('.').unwrap();
    let upgraded = encode_json(&json!({ "exp": NOW + 3600, "custom:subs": "A,B" }));
    let tampered = format!("{}.{}.{}", header, upgraded, signature);

    assert_eq!(
        authorizer().decide(&get("/product-a/x", &tampered)),
        Decision::Rejected(RejectReason::InvalidSignature)
    );
}

#[test]
fn key_absent_from_key_set_rejected() {
    // Signer B is valid RS256 but its key is not trusted.
    let token = mint_with(
        SIGNER_B,
        json!({ "kid": "K2" }),
        json!({ "exp": NOW + 3600, "custom:subs": "A" }),
    );
    assert_eq!(
        authorizer().decide(&get("/product-a/x", &token)),
        Decision::Rejected(RejectReason::InvalidSignature)
    );
}

#[test]
fn untrusted_signer_using_trusted_kid_rejected() {
    let token = mint_with(
        SIGNER_B,
        json!({ "kid": "K1" }),
        json!({ "exp": NOW + 3600, "custom:subs": "A" }),
    );
    assert_rejected(authorizer().authorize(get("/product-a/x", &token)));
}

#[test]
fn alg_none_token_rejected_as_malformed() {
    let header = encode_json(&json!({ "kid": "K1", "alg": "none" }));
    let claims = encode_json(&json!({ "exp": NOW + 3600, "custom:subs": "A" }));
    let token = format!("{}.{}.c2ln", header, claims);

    assert_eq!(
        authorizer().decide(&get("/product-a/x", &token)),
        Decision::Rejected(RejectReason::MalformedToken)
    );
}

#[test]
fn malformed_subscriptions_degrade_to_non_subscriber() {
    let token = mint_with(
        SIGNER_A,
        json!({ "kid": "K1" }),
        json!({ "exp": NOW + 3600, "custom:subs": { "A": true } }),
    );
    let request = forwarded(authorizer().authorize(get("/product-a/x", &token)));
    assert_eq!(request.header(SUBSCRIBER_HEADER), Some("false"));
}

#[test]
fn product_slug_match_ignores_case() {
    let token = mint("K1", NOW + 3600, "A");
    let request = forwarded(authorizer().authorize(get("/PRODUCT-A/content/1", &token)));
    assert_eq!(request.header(SUBSCRIBER_HEADER), Some("true"));
}

#[test]
fn mutating_methods_bypass_without_headers() {
    for method in ["POST", "PUT", "DELETE", "OPTIONS"] {
        let original = ResourceRequest::new(method, "/product-a/content/123");
        assert_eq!(authorizer().decide(&original), Decision::Bypass);
        assert_eq!(
            authorizer().authorize(original.clone()),
            Outcome::Forward(original)
        );
    }
}

#[test]
fn client_supplied_trust_headers_are_overwritten() {
    let token = mint("K1", NOW + 3600, "B");
    let request = get("/product-a/x", &token)
        .with_header("x-is-subscriber", "true")
        .with_header("X-Api-Key", "guess");
    let request = forwarded(authorizer().authorize(request));

    assert_eq!(request.header(SUBSCRIBER_HEADER), Some("false"));
    assert_eq!(request.header(API_KEY_HEADER), Some(API_KEY));
    assert_eq!(request.headers.len(), 2);
}

#[test]
fn conflicting_jwt_cookies_rejected() {
    let good = mint("K1", NOW + 3600, "A");
    let other = mint("K1", NOW + 3600, "B");
    let request = ResourceRequest::new("GET", "/product-a/x")
        .with_cookie(format!("jwt={}", other))
        .with_cookie(format!("theme=dark; jwt={}", good));

    assert_eq!(
        authorizer().decide(&request),
        Decision::Rejected(RejectReason::ConflictingTokens)
    );
}

#[test]
fn token_among_other_cookies_found() {
    let token = mint("K1", NOW + 3600, "A");
    let request = ResourceRequest::new("GET", "/product-a/x")
        .with_cookie(format!("session=xyz; jwt={}; theme=dark", token));
    let request = forwarded(authorizer().authorize(request));
    assert_eq!(request.header(SUBSCRIBER_HEADER), Some("true"));
}

#[test]
fn evaluation_is_idempotent() {
    let authorizer = authorizer();
    let token = mint("K1", NOW + 3600, "A");
    let request = get("/product-a/content/123", &token);

    let first = authorizer.decide(&request);
    let second = authorizer.decide(&request);
    assert_eq!(first, second);
    assert_eq!(
        authorizer.authorize(request.clone()),
        authorizer.authorize(request)
    );
}

#[test]
fn rejection_body_identical_for_every_cause() {
    let authorizer = authorizer();
    let expired = mint("K1", NOW - 1, "A");
    let unknown_kid = mint("K7", NOW + 3600, "A");

    let responses: Vec<_> = [
        ResourceRequest::new("GET", "/product-a/x"),
        get("/product-a/x", "one.two"),
        get("/product-a/x", &expired),
        get("/product-a/x", &unknown_kid),
    ]
    .into_iter()
    .map(|request| match authorizer.authorize(request) {
        Outcome::Respond(response) => response,
        Outcome::Forward(_) => panic!("expected rejection"),
    })
    .collect();

    assert!(responses.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn jwks_config_accepts_both_signers() {
    let config = json!({
        "keys": serde_json::from_str::<serde_json::Value>(JWKS).unwrap(),
        "products": { "product-b": "B" },
        "origin_api_key": API_KEY,
    });
    let config = PaywallConfig::from_json(&config.to_string()).unwrap();
    let authorizer =
        RequestAuthorizer::with_clock(Arc::new(config), Arc::new(FixedClock(NOW))).unwrap();

    let token = mint_with(
        SIGNER_B,
        json!({ "kid": "K2", "alg": "RS256" }),
        json!({ "exp": NOW + 60, "custom:subs": "B" }),
    );
    assert_eq!(
        authorizer.decide(&get("/product-b/feed", &token)),
        Decision::Authorized {
            product_code: "B".to_string(),
            is_subscriber: true
        }
    );
}

#[test]
fn concurrent_invocations_agree() {
    let authorizer = Arc::new(authorizer());
    let token = Arc::new(mint("K1", NOW + 3600, "A"));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let authorizer = Arc::clone(&authorizer);
            let token = Arc::clone(&token);
            thread::spawn(move || {
                let path = if i % 2 == 0 { "/product-a/x" } else { "/product-b/x" };
                authorizer.decide(&get(path, &token))
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let expected = i % 2 == 0;
        assert!(matches!(
            handle.join().unwrap(),
            Decision::Authorized { is_subscriber, .. } if is_subscriber == expected
        ));
    }
}
