//! Integration tests for `GeminiClient` using wiremock HTTP mocks.

use leadgen_core::{
    BrandSearchPreference, DraftKind, Lead, LeadCandidate, LeadOrigin, TargetPreference,
    TargetType,
};
use leadgen_discovery::{DiscoveryClient, DiscoveryError, GeminiClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn test_client(base_url: &str) -> GeminiClient {
    GeminiClient::with_base_url("test-key", "gemini-test", 30, base_url)
        .expect("client construction should not fail")
}

fn reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "groundingMetadata": {
                "groundingChunks": [
                    { "web": { "uri": "https://www.producthunt.com", "title": "Product Hunt" } }
                ]
            }
        }]
    })
}

fn preference() -> BrandSearchPreference {
    BrandSearchPreference {
        target_type: TargetPreference::Both,
        niche: "SaaS".to_string(),
    }
}

fn lead() -> Lead {
    Lead::from_candidate(
        LeadCandidate {
            name: "Acme".into(),
            tagline: "Rockets".into(),
            website: "https://acme.com".into(),
            description: "Makes rockets".into(),
            industry: "Aerospace".into(),
            target_type: Some(TargetType::B2b),
            source_url: String::new(),
            is_ph_verified: true,
            is_active: true,
        },
        LeadOrigin::Discovery,
    )
}

#[tokio::test]
async fn discover_sends_grounded_request_and_parses_candidates() {
    let server = MockServer::start().await;

    let text = "```json\n[\
        {\"name\": \"Acme[1]\", \"website\": \"acme.com\", \"targetType\": \"B2B\", \"isActive\": true},\
        {\"name\": \"Gone\", \"website\": \"gone.io\", \"isActive\": false}\
    ]\n```";

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "tools": [{ "google_search": {} }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(text)))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .discover("AI Productivity Tools", &preference())
        .await
        .expect("discover should succeed");

    assert_eq!(result.leads.len(), 1);
    assert_eq!(result.leads[0].name, "Acme");
    assert_eq!(result.leads[0].target_type, Some(TargetType::B2b));
    assert_eq!(result.sources.len(), 1);
}

#[tokio::test]
async fn discover_with_prose_only_reply_is_empty_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(reply("Sorry, I found nothing relevant.")),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .discover("Design tools", &preference())
        .await
        .expect("unparseable text is not an error");

    assert!(result.leads.is_empty());
}

#[tokio::test]
async fn discover_surfaces_http_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .discover("Design tools", &preference())
        .await
        .expect_err("503 should be an error");

    assert!(
        matches!(err, DiscoveryError::UnexpectedStatus { status: 503, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_envelope_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.lookup("Acme").await.expect_err("html is not JSON");
    assert!(matches!(err, DiscoveryError::Deserialize { .. }), "got: {err:?}");
}

#[tokio::test]
async fn lookup_applies_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "{\"name\": \"Notion\", \"website\": \"notion.so\", \"tagline\": \"All-in-one workspace\"}",
        )))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.lookup("Notion").await.expect("lookup should succeed");
    let candidate = result.lead.expect("brand should be found");

    assert_eq!(candidate.name, "Notion");
    assert!(candidate.is_active);
    assert!(!candidate.is_ph_verified);
    assert_eq!(candidate.target_type, Some(TargetType::D2c));
}

#[tokio::test]
async fn lookup_without_object_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("No such brand.")))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.lookup("Nonexistent").await.expect("not an error");
    assert!(result.lead.is_none());
}

#[tokio::test]
async fn find_contact_falls_back_to_email_scan() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "The best address appears to be partnerships@acme.com according to their site.",
        )))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .find_contact("Acme", "https://acme.com")
        .await
        .expect("contact lookup should succeed");

    assert_eq!(result.contact.name, "Founder");
    assert_eq!(result.contact.email, "partnerships@acme.com");
    assert_eq!(result.contact.source, "Semantic Fallback");
}

#[tokio::test]
async fn draft_email_returns_trimmed_text_without_search_tool() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("\n  Hi there!  \n")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let draft = client
        .draft_email(&lead(), "Sam", DraftKind::Initial)
        .await
        .expect("draft should succeed");
    assert_eq!(draft, "Hi there!");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("request body is JSON");
    assert!(body.get("tools").is_none());
}

#[tokio::test]
async fn empty_draft_uses_fallback_sentence() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": []
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let draft = client
        .draft_email(&lead(), "Sam", DraftKind::FollowUp)
        .await
        .expect("empty reply is not an error");
    assert_eq!(draft, "Failed to generate pitch.");
}
