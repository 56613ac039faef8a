// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use petshop_server::application::MutationCoordinator;
use petshop_server::domain::audit::{AuditRecord, OperationKind};
use petshop_server::domain::identity::Identity;
use petshop_server::domain::pet::PetId;
use petshop_server::domain::repository::{AuditTrailRecorder, AuditWriteError, PetRepository};
use petshop_server::infrastructure::auth::{AuthResolver, AuthTokenVerifier};
use petshop_server::infrastructure::repositories::{InMemoryAuditTrail, InMemoryPetRepository};
use petshop_server::presentation::api::{app, AppState};

const TEST_SECRET: &str = "integration-test-secret";

/// Router over in-memory storage, plus handles for audit inspection and
/// credential minting.
fn test_app() -> (Router, InMemoryAuditTrail, Arc<AuthTokenVerifier>) {
    let verifier = Arc::new(AuthTokenVerifier::new(TEST_SECRET));
    let resolver = AuthResolver::new(verifier.clone(), "authToken", 3600);
    let pets: Arc<dyn PetRepository> = Arc::new(InMemoryPetRepository::new());
    let audit = InMemoryAuditTrail::new();

    let state = AppState {
        pets: pets.clone(),
        mutations: Arc::new(MutationCoordinator::new(pets, Arc::new(audit.clone()))),
        auth: resolver,
    };

    (app(state), audit, verifier)
}

fn sample_pet_body() -> Value {
    json!({ "species": "cat", "name": "Whiskers", "age": 3, "gender": "female" })
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Insert a sample pet anonymously and return its id
async fn insert_sample_pet(app: &Router) -> String {
    let response = send(app, json_request("PUT", "/api/pet/new", sample_pet_body())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    body["petId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_insert_and_get_round_trip() {
    let (app, _audit, _verifier) = test_app();

    let response = send(&app, json_request("PUT", "/api/pet/new", sample_pet_body())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Pet inserted.");
    let pet_id = body["petId"].as_str().unwrap().to_string();

    let response = send(&app, get_request(&format!("/api/pet/{}", pet_id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let pet = read_json(response).await;
    assert_eq!(pet["petId"], pet_id.as_str());
    assert_eq!(pet["species"], "cat");
    assert_eq!(pet["name"], "Whiskers");
    assert_eq!(pet["age"], 3);
    assert_eq!(pet["gender"], "female");
}

#[tokio::test]
async fn test_list_returns_inserted_pets() {
    let (app, _audit, _verifier) = test_app();

    insert_sample_pet(&app).await;
    send(
        &app,
        json_request(
            "PUT",
            "/api/pet/new",
            json!({ "species": "dog", "name": "Rex", "age": 5, "gender": "male" }),
        ),
    )
    .await;

    let response = send(&app, get_request("/api/pet/list")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let pets = read_json(response).await;
    assert_eq!(pets.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_missing_pet_is_404() {
    let (app, _audit, _verifier) = test_app();
    let missing = PetId::new();

    let response = send(&app, get_request(&format!("/api/pet/{}", missing))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], format!("{} Pet not found", missing));
}

#[tokio::test]
async fn test_invalid_pet_id_is_400() {
    let (app, _audit, _verifier) = test_app();

    let response = send(&app, get_request("/api/pet/not-a-uuid")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "not-a-uuid is not a valid petId");
}

#[tokio::test]
async fn test_insert_with_bearer_records_actor() {
    let (app, audit, verifier) = test_app();
    let token = verifier.sign(&Identity::new("alice", 3600)).unwrap();

    let mut request = json_request("PUT", "/api/pet/new", sample_pet_body());
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let pet_id: uuid::Uuid = body["petId"].as_str().unwrap().parse().unwrap();

    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, OperationKind::Insert);
    assert_eq!(records[0].collection, "pets");
    assert_eq!(records[0].target, PetId(pet_id));
    assert_eq!(records[0].actor.as_ref().map(|a| a.sub.as_str()), Some("alice"));
    assert_eq!(records[0].payload.as_ref().unwrap()["name"], "Whiskers");
}

#[tokio::test]
async fn test_anonymous_insert_records_no_actor() {
    let (app, audit, _verifier) = test_app();

    insert_sample_pet(&app).await;

    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].actor.is_none());
}

#[tokio::test]
async fn test_update_applies_patch_and_audits_it() {
    let (app, audit, _verifier) = test_app();
    let pet_id = insert_sample_pet(&app).await;

    let response = send(
        &app,
        json_request("PUT", &format!("/api/pet/{}", pet_id), json!({ "age": 4 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Pet updated!");
    assert_eq!(body["petId"], pet_id.as_str());

    // Unpatched fields survive
    let pet = read_json(send(&app, get_request(&format!("/api/pet/{}", pet_id))).await).await;
    assert_eq!(pet["age"], 4);
    assert_eq!(pet["name"], "Whiskers");

    // The audited payload is the patch, not the resulting state
    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].operation, OperationKind::Update);
    assert_eq!(records[1].payload, Some(json!({ "age": 4 })));
}

#[tokio::test]
async fn test_update_missing_pet_is_404_and_unaudited() {
    let (app, audit, _verifier) = test_app();
    let missing = PetId::new();

    let response = send(
        &app,
        json_request("PUT", &format!("/api/pet/{}", missing), json!({ "age": 4 })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], format!("{} Pet not found", missing));
    assert!(audit.records().is_empty());
}

#[tokio::test]
async fn test_delete_removes_pet_and_audits_payloadless() {
    let (app, audit, _verifier) = test_app();
    let pet_id = insert_sample_pet(&app).await;

    let response = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/pet/{}", pet_id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Pet Deleted!");

    let response = send(&app, get_request(&format!("/api/pet/{}", pet_id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].operation, OperationKind::Delete);
    assert!(records[1].payload.is_none());
}

#[tokio::test]
async fn test_malformed_body_is_400_and_unaudited() {
    let (app, audit, _verifier) = test_app();

    let request = Request::builder()
        .method("PUT")
        .uri("/api/pet/new")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"].as_str().is_some());
    assert!(audit.records().is_empty());
}

#[tokio::test]
async fn test_incomplete_insert_body_is_400() {
    let (app, _audit, _verifier) = test_app();

    let response = send(
        &app,
        json_request("PUT", "/api/pet/new", json!({ "species": "cat" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_insert_field_is_400() {
    let (app, _audit, _verifier) = test_app();

    let mut body = sample_pet_body();
    body["color"] = json!("blue");
    let response = send(&app, json_request("PUT", "/api/pet/new", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cookie_credential_resolves_and_refreshes() {
    let (app, audit, verifier) = test_app();
    let token = verifier.sign(&Identity::new("alice", 3600)).unwrap();

    let mut request = json_request("PUT", "/api/pet/new", sample_pet_body());
    request.headers_mut().insert(
        header::COOKIE,
        format!("authToken={}", token).parse().unwrap(),
    );
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("verified cookie should be re-issued")
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with(&format!("authToken={}", token)));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=3600"));

    let records = audit.records();
    assert_eq!(records[0].actor.as_ref().map(|a| a.sub.as_str()), Some("alice"));
}

#[tokio::test]
async fn test_garbage_header_suppresses_valid_cookie() {
    let (app, audit, verifier) = test_app();
    let token = verifier.sign(&Identity::new("alice", 3600)).unwrap();

    let mut request = json_request("PUT", "/api/pet/new", sample_pet_body());
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "garbage".parse().unwrap());
    request.headers_mut().insert(
        header::COOKIE,
        format!("authToken={}", token).parse().unwrap(),
    );
    let response = send(&app, request).await;

    // Fail-open: the mutation succeeds, but anonymously and with no refresh
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(audit.records()[0].actor.is_none());
}

#[tokio::test]
async fn test_bearer_credential_sets_no_cookie() {
    let (app, _audit, verifier) = test_app();
    let token = verifier.sign(&Identity::new("alice", 3600)).unwrap();

    let mut request = json_request("PUT", "/api/pet/new", sample_pet_body());
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_expired_bearer_proceeds_anonymous() {
    let (app, audit, verifier) = test_app();
    let token = verifier.sign(&Identity::new("alice", -3600)).unwrap();

    let mut request = json_request("PUT", "/api/pet/new", sample_pet_body());
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(audit.records()[0].actor.is_none());
}

struct FailingAuditTrail;

#[async_trait]
impl AuditTrailRecorder for FailingAuditTrail {
    async fn append(&self, _record: &AuditRecord) -> Result<(), AuditWriteError> {
        Err(AuditWriteError::Database("audit store offline".to_string()))
    }
}

#[tokio::test]
async fn test_audit_failure_leaves_response_unchanged() {
    let verifier = Arc::new(AuthTokenVerifier::new(TEST_SECRET));
    let resolver = AuthResolver::new(verifier, "authToken", 3600);
    let pets: Arc<dyn PetRepository> = Arc::new(InMemoryPetRepository::new());
    let state = AppState {
        pets: pets.clone(),
        mutations: Arc::new(MutationCoordinator::new(pets, Arc::new(FailingAuditTrail))),
        auth: resolver,
    };
    let app = app(state);

    let response = send(&app, json_request("PUT", "/api/pet/new", sample_pet_body())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Pet inserted.");

    // The primary write stands even though every audit append failed
    let pet_id = body["petId"].as_str().unwrap();
    let response = send(&app, get_request(&format!("/api/pet/{}", pet_id))).await;
    assert_eq!(response.status(), StatusCode::OK);
}
