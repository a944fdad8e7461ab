//! Integration tests for `BackendClient` using wiremock HTTP mocks.

use backend::{AnalysisStore, BackendClient, BackendError};
use ingest::model::{InstagramData, MetricPoint};
use ingest::{Aggregate, Network};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "6f1c8a9e-2d4b-4c1a-9f3e-1a2b3c4d5e6f";
const ANALYSIS_ID: &str = "0b7e3c55-8f0e-4a57-9d7b-5d1a7e0c2f11";

fn client_for(base_url: &str) -> BackendClient {
    BackendClient::new(base_url, "anon-key", 30).expect("client construction should not fail")
}

fn token_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "user-jwt",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh",
        "user": { "id": USER_ID, "email": "me@example.com" }
    })
}

async fn signed_in(server: &MockServer) -> BackendClient {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(server)
        .await;

    let client = client_for(&server.uri());
    client
        .sign_in("me@example.com", "secret")
        .await
        .expect("sign-in should succeed");
    client
}

fn instagram() -> Aggregate {
    let mut data = InstagramData {
        visualizacoes: vec![MetricPoint::new("2024-01-01", 100.0)],
        ..InstagramData::default()
    };
    data.recompute_resumo();
    Aggregate::Instagram(data)
}

#[tokio::test]
async fn test_sign_in_stores_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_partial_json(serde_json::json!({ "email": "me@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert!(client.current_session().await.is_none());

    let session = client.sign_in("me@example.com", "secret").await.unwrap();
    assert_eq!(session.access_token, "user-jwt");
    assert_eq!(session.user.id.to_string(), USER_ID);
    assert_eq!(client.current_session().await, Some(session));
}

#[tokio::test]
async fn test_sign_in_with_bad_password_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.sign_in("me@example.com", "wrong").await.unwrap_err();
    match err {
        BackendError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(client.current_session().await.is_none());
}

#[tokio::test]
async fn test_sign_up_pending_confirmation_returns_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": USER_ID,
            "email": "me@example.com",
            "confirmation_sent_at": "2024-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let session = client.sign_up("me@example.com", "secret").await.unwrap();
    assert!(session.is_none());
    assert!(client.current_session().await.is_none());
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.sign_out().await.unwrap();
    assert!(client.current_session().await.is_none());
}

#[tokio::test]
async fn test_current_user_requires_session() {
    let server = MockServer::start().await;
    let client = client_for(&server.uri());
    assert!(matches!(
        client.current_user().await,
        Err(BackendError::NotSignedIn)
    ));
}

#[tokio::test]
async fn test_analyses_require_sign_in() {
    let server = MockServer::start().await;
    let client = client_for(&server.uri());
    assert!(matches!(
        client.list_analyses(Network::Instagram).await,
        Err(BackendError::NotSignedIn)
    ));
}

#[tokio::test]
async fn test_create_analysis_posts_to_platform_table() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/instagram_analyses"))
        .and(header("prefer", "return=representation"))
        .and(header("authorization", "Bearer user-jwt"))
        .and(body_partial_json(serde_json::json!({
            "user_id": USER_ID,
            "name": "Janeiro",
            "data": { "resumo": { "totalVisualizacoes": 100.0 } }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
            { "id": ANALYSIS_ID, "name": "Janeiro", "created_at": "2024-02-01T12:00:00+00:00" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let saved = client
        .create_analysis(Network::Instagram, "Janeiro", &instagram())
        .await
        .unwrap();
    assert_eq!(saved.id.to_string(), ANALYSIS_ID);
    assert_eq!(saved.name, "Janeiro");
}

#[tokio::test]
async fn test_list_analyses_filters_by_user_newest_first() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/youtube_analyses"))
        .and(query_param("user_id", format!("eq.{USER_ID}")))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": ANALYSIS_ID, "name": "Fevereiro", "created_at": "2024-03-01T00:00:00Z" },
            { "id": Uuid::nil(), "name": "Janeiro", "created_at": "2024-02-01T00:00:00Z" }
        ])))
        .mount(&server)
        .await;

    let analyses = client.list_analyses(Network::Youtube).await.unwrap();
    assert_eq!(analyses.len(), 2);
    assert_eq!(analyses[0].name, "Fevereiro");
}

#[tokio::test]
async fn test_fetch_analysis_reads_payload_for_network() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;
    let aggregate = instagram();

    Mock::given(method("GET"))
        .and(path("/rest/v1/instagram_analyses"))
        .and(query_param("id", format!("eq.{ANALYSIS_ID}")))
        .and(query_param("select", "data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "data": aggregate }])),
        )
        .mount(&server)
        .await;

    let id: Uuid = ANALYSIS_ID.parse().unwrap();
    let fetched = client.fetch_analysis(Network::Instagram, id).await.unwrap();
    assert_eq!(fetched, aggregate);
}

#[tokio::test]
async fn test_fetch_missing_analysis_is_not_found() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tiktok_analyses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let id = Uuid::new_v4();
    assert!(matches!(
        client.fetch_analysis(Network::Tiktok, id).await,
        Err(BackendError::NotFound { id: missing }) if missing == id
    ));
}
