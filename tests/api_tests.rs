use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode, header},
    routing::get,
};
use careerdesk::{
    AppConfig, AppState, create_router,
    documents::{DocumentError, DocumentService, DocumentState, HttpDocumentService},
    models::{CoverLetterDocument, EditorView, QuestionPayload},
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

// --- Stub Backend ---

const TOKEN: &str = "secret-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn stub_get(headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if id == "missing" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "id": id,
        "title": "Frontend Developer",
        "questions": [
            { "title": "Motivation", "content": "Because." },
            { "title": "Strengths", "content": null }
        ]
    })))
}

async fn stub_create(
    headers: HeaderMap,
    Json(mut doc): Json<CoverLetterDocument>,
) -> Result<Json<CoverLetterDocument>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    doc.id = Some("new-1".to_string());
    Ok(Json(doc))
}

async fn stub_update(
    headers: HeaderMap,
    Path(_id): Path<String>,
    Json(doc): Json<CoverLetterDocument>,
) -> Result<Json<CoverLetterDocument>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(doc))
}

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn spawn_backend() -> String {
    let router = Router::new()
        .route("/cover-letters", axum::routing::post(stub_create))
        .route("/cover-letters/{id}", get(stub_get).put(stub_update));
    spawn(router).await
}

fn client_for(base: &str) -> HttpDocumentService {
    HttpDocumentService::new(base, Duration::from_secs(5)).unwrap()
}

// --- HttpDocumentService ---

#[tokio::test]
async fn test_load_maps_nulls_and_keeps_order() {
    let backend = spawn_backend().await;
    let doc = client_for(&backend).load("12", Some(TOKEN)).await.unwrap();

    assert_eq!(doc.id.as_deref(), Some("12"));
    assert_eq!(doc.questions.len(), 2);
    assert_eq!(doc.questions[0].title, "Motivation");
    assert_eq!(doc.questions[1].content, "");
}

#[tokio::test]
async fn test_load_missing_document() {
    let backend = spawn_backend().await;
    let err = client_for(&backend).load("missing", Some(TOKEN)).await.unwrap_err();
    assert!(matches!(err, DocumentError::NotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_load_without_token_reports_status() {
    let backend = spawn_backend().await;
    let err = client_for(&backend).load("12", None).await.unwrap_err();
    assert!(matches!(err, DocumentError::Status { status: 401 }));
}

#[tokio::test]
async fn test_save_creates_then_updates() {
    let backend = spawn_backend().await;
    let client = client_for(&backend);
    let draft = CoverLetterDocument {
        id: None,
        title: "Draft".to_string(),
        questions: vec![QuestionPayload {
            title: "Q".to_string(),
            content: "A".to_string(),
        }],
    };

    let created = client.save(&draft, Some(TOKEN)).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("new-1"));

    let updated = client.save(&created, Some(TOKEN)).await.unwrap();
    assert_eq!(updated, created);
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = client_for(&format!("http://127.0.0.1:{port}"))
        .load("12", Some(TOKEN))
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::Network(_)));
}

// --- End to End ---

#[tokio::test]
async fn test_editor_loads_through_real_backend_client() {
    let backend = spawn_backend().await;
    let documents = Arc::new(client_for(&backend)) as DocumentState;
    let config = AppConfig {
        backend_url: backend.clone(),
        ..AppConfig::default()
    };
    let address = spawn(create_router(AppState::new(documents, config))).await;

    let response = reqwest::Client::new()
        .post(format!("{address}/editors"))
        .header(
            header::COOKIE.as_str(),
            format!("userId=31; userRole=USER; accessToken={TOKEN}"),
        )
        .json(&json!({ "document_id": "77" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status().as_u16(), 201);
    assert!(response.headers().contains_key("x-request-id"));
    let view: EditorView = response.json().await.unwrap();
    assert_eq!(view.document_id.as_deref(), Some("77"));
    assert_eq!(view.questions.len(), 2);
    assert_eq!(view.title, "Frontend Developer");
}
