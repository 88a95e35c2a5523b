use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use characters_core::{
    Character, DeleteResult, HttpRequest, HttpResponse, HttpTransport, InMemoryDocumentStore,
    Info, Location, Status, TransportError, UpstreamClient,
};
use characters_server::{app, ApiErrorBody, AppState};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Answers every upstream request with the same status and body.
struct StubUpstream {
    status: u16,
    body: &'static str,
    seen: Mutex<Vec<String>>,
}

impl StubUpstream {
    fn new(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl HttpTransport for StubUpstream {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.url);
        Ok(HttpResponse {
            status: self.status,
            headers: Vec::new(),
            body: self.body.to_string(),
        })
    }
}

fn test_app(upstream: Arc<StubUpstream>) -> Router {
    let state = AppState::new(
        UpstreamClient::new("http://upstream.test/api"),
        upstream,
        Arc::new(InMemoryDocumentStore::new()),
    );
    app(state, &[])
}

fn store_app() -> Router {
    test_app(StubUpstream::new(500, "unused"))
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn delete(uri: &str) -> Request<String> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(String::new())
        .unwrap()
}

const CHARACTER_PAGE: &str = r#"{
    "info": {"count": 1, "pages": 1, "next": null, "prev": null},
    "results": [{"id": 2, "name": "Morty Smith", "status": "Alive", "species": "Human", "type": "",
                 "gender": "Male", "origin": {"name": "unknown", "url": ""},
                 "location": {"name": "Citadel of Ricks", "url": ""}, "image": "",
                 "episode": [], "url": "", "created": "2017-11-04T18:50:21.651Z"}]
}"#;

const LOCATION_PAGE: &str = r#"{
    "info": {"count": 1, "pages": 1, "next": null, "prev": null},
    "results": [{"id": 1, "name": "Earth (C-137)", "type": "Planet", "dimension": "Dimension C-137",
                 "residents": [], "url": "", "created": "2017-11-10T12:42:04.162Z"}]
}"#;

// --- upstream proxy ---

#[tokio::test]
async fn external_passes_query_through() {
    let upstream = StubUpstream::new(200, CHARACTER_PAGE);
    let resp = test_app(upstream.clone())
        .oneshot(get("/characters/external?name=morty&page=1&gender=male"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Info<Character> = body_json(resp).await;
    assert_eq!(page.results[0].name, "Morty Smith");
    assert_eq!(
        upstream.seen.lock().unwrap().as_slice(),
        ["http://upstream.test/api/character?page=1&name=morty&gender=male"]
    );
}

#[tokio::test]
async fn external_without_query_sends_none() {
    let upstream = StubUpstream::new(200, CHARACTER_PAGE);
    test_app(upstream.clone())
        .oneshot(get("/characters/external"))
        .await
        .unwrap();
    assert_eq!(
        upstream.seen.lock().unwrap().as_slice(),
        ["http://upstream.test/api/character"]
    );
}

#[tokio::test]
async fn external_no_match_is_empty_200() {
    let upstream = StubUpstream::new(404, r#"{"error":"There is nothing here"}"#);
    let resp = test_app(upstream)
        .oneshot(get("/characters/external?name=zzz"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({"results": []}));
}

#[tokio::test]
async fn external_upstream_failure_is_5xx() {
    let upstream = StubUpstream::new(500, r#"{"error":"upstream exploded"}"#);
    let resp = test_app(upstream)
        .oneshot(get("/characters/external"))
        .await
        .unwrap();

    assert!(resp.status().is_server_error());
    let body: ApiErrorBody = body_json(resp).await;
    assert_eq!(body.error, "upstream_error");
    assert!(body.message.contains("upstream exploded"));
}

#[tokio::test]
async fn locations_are_proxied() {
    let upstream = StubUpstream::new(200, LOCATION_PAGE);
    let resp = test_app(upstream.clone())
        .oneshot(get("/characters/locations"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Info<Location> = body_json(resp).await;
    assert_eq!(page.results[0].dimension, "Dimension C-137");
    assert_eq!(
        upstream.seen.lock().unwrap().as_slice(),
        ["http://upstream.test/api/location"]
    );
}

#[tokio::test]
async fn locations_upstream_failure_is_5xx() {
    let resp = test_app(StubUpstream::new(503, "down for maintenance"))
        .oneshot(get("/characters/locations"))
        .await
        .unwrap();
    assert!(resp.status().is_server_error());
}

// --- stored characters ---

#[tokio::test]
async fn list_empty() {
    let resp = store_app().oneshot(get("/characters")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let characters: Vec<Character> = body_json(resp).await;
    assert!(characters.is_empty());
}

#[tokio::test]
async fn create_returns_201_with_defaults() {
    let resp = store_app()
        .oneshot(json_request("POST", "/characters", r#"{"name":"Morty"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(body["name"], "Morty");
    assert_eq!(body["status"], "unknown");
    assert_eq!(body["gender"], "unknown");
    assert_eq!(body["origin"], serde_json::json!({"name": "", "url": ""}));
    assert_eq!(body["location"], serde_json::json!({"name": "", "url": ""}));
    assert_eq!(body["episode"], serde_json::json!([]));
    assert_eq!(body["url"], "");
    assert_eq!(body["type"], "");
}

#[tokio::test]
async fn create_rejects_invalid_status() {
    let resp = store_app()
        .oneshot(json_request("POST", "/characters", r#"{"status":"zombie"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_missing_is_404_with_id() {
    let resp = store_app().oneshot(get("/characters/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ApiErrorBody = body_json(resp).await;
    assert_eq!(body.error, "not_found");
    assert!(body.message.contains("nope"));
}

#[tokio::test]
async fn update_missing_is_404() {
    let resp = store_app()
        .oneshot(json_request("PATCH", "/characters/nope", r#"{"name":"x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_missing_is_404() {
    let resp = store_app().oneshot(delete("/characters/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = store_app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/characters",
            r#"{"name":"Rick","species":"Human","status":"Alive"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Character = body_json(resp).await;
    let id = created.id.clone();

    // list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/characters"))
        .await
        .unwrap();
    let characters: Vec<Character> = body_json(resp).await;
    assert_eq!(characters, vec![created.clone()]);

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/characters/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Character = body_json(resp).await;
    assert_eq!(fetched, created);

    // partial update
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PATCH",
            &format!("/characters/{id}"),
            r#"{"status":"Dead"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Character = body_json(resp).await;
    assert_eq!(updated.id, id);
    assert_eq!(updated.name, "Rick");
    assert_eq!(updated.species, "Human");
    assert_eq!(updated.status, Status::Dead);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(delete(&format!("/characters/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let result: DeleteResult = body_json(resp).await;
    assert!(result.success);

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/characters/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/characters"))
        .await
        .unwrap();
    let characters: Vec<Character> = body_json(resp).await;
    assert!(characters.is_empty());
}

#[tokio::test]
async fn health_is_ok() {
    let resp = store_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
