use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use offload_core::config::offload::OffloadSettings;
use offload_core::config::worker::WorkerConfig;
use offload_core::error::AppError;
use offload_core::result::AppResult;
use offload_core::traits::settings::StaticSettings;
use offload_core::traits::storage::{RemoteStore, UploadReceipt};
use offload_core::traits::tenant::NoopTenantContext;
use offload_core::types::clock::ManualClock;
use offload_core::types::id::{ResourceId, TenantId};
use offload_database::memory::{MemoryQueueStore, MemoryResourceStore};
use offload_database::store::{QueueStore, ResourceStore};
use offload_worker::{IntakeHook, OffloadControl, OffloadProcessor, UrlResolver};

use crate::{AppState, build_router};

const TOKEN: &str = "admin-secret";

#[derive(Debug)]
struct AcceptingRemote;

#[async_trait]
impl RemoteStore for AcceptingRemote {
    fn provider_type(&self) -> &str {
        "accepting"
    }

    fn remote_key(&self, settings: &OffloadSettings, file_path: &Path) -> AppResult<String> {
        file_path
            .strip_prefix(&settings.uploads_root)
            .map(|p| p.to_string_lossy().into_owned())
            .map_err(|_| AppError::validation("outside uploads root"))
    }

    async fn upload(
        &self,
        settings: &OffloadSettings,
        _file_path: &Path,
        remote_key: &str,
    ) -> AppResult<UploadReceipt> {
        Ok(UploadReceipt {
            remote_key: remote_key.to_string(),
            public_url: settings.public_url(remote_key),
            bytes: 1,
        })
    }
}

struct TestApp {
    clock: Arc<ManualClock>,
    queue: Arc<MemoryQueueStore>,
    resources: Arc<MemoryResourceStore>,
    settings: Arc<StaticSettings>,
    router: Router,
}

fn app() -> TestApp {
    let clock = Arc::new(ManualClock::default());
    let queue = Arc::new(MemoryQueueStore::new(clock.clone()));
    let resources = Arc::new(MemoryResourceStore::new(clock.clone()));
    let settings = Arc::new(StaticSettings::new(OffloadSettings {
        api_key: "key".into(),
        storage_zone: "zone".into(),
        cdn_url: "https://cdn.example.net".into(),
        uploads_root: "/uploads".into(),
        ..OffloadSettings::default()
    }));

    let processor = Arc::new(OffloadProcessor::new(
        queue.clone(),
        resources.clone(),
        Arc::new(AcceptingRemote),
        settings.clone(),
        Arc::new(NoopTenantContext),
        WorkerConfig::default(),
    ));
    let state = AppState::new(
        OffloadControl::new(processor),
        IntakeHook::new(queue.clone(), resources.clone(), settings.clone()),
        UrlResolver::new(resources.clone(), settings.clone()),
        Some(TOKEN.to_string()),
    );

    TestApp {
        clock,
        queue,
        resources,
        settings,
        router: build_router(state),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_triggers_require_admin_token() {
    let app = app();
    app.queue
        .enqueue(TenantId(1), ResourceId(1), "/uploads/a.png", chrono::Duration::zero())
        .await
        .unwrap();

    for token in [None, Some("wrong")] {
        let (status, body) = send(&app.router, post("/api/offload/process", token, json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");

        let (status, _) = send(&app.router, post("/api/offload/retry-failed", token, json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app.router, get("/api/offload/status", token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    assert_eq!(app.queue.count_by_status(None).await.unwrap().pending, 1);
}

#[tokio::test]
async fn test_process_now_offloads_due_jobs() {
    let app = app();
    app.queue
        .enqueue(TenantId(1), ResourceId(7), "/uploads/2024/a.png", chrono::Duration::zero())
        .await
        .unwrap();

    let (status, body) = send(&app.router, post("/api/offload/process", Some(TOKEN), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("1 offloaded"));

    let record = app
        .resources
        .find(TenantId(1), ResourceId(7))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.cdn_url.as_deref(), Some("https://cdn.example.net/2024/a.png"));
    assert_eq!(app.queue.count_by_status(None).await.unwrap().total(), 0);
}

#[tokio::test]
async fn test_process_now_without_body_and_with_incomplete_settings() {
    let app = app();
    app.settings.replace(OffloadSettings::default());

    let request = Request::post("/api/offload/process")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("incomplete"));
}

#[tokio::test]
async fn test_status_counts_scoped_by_tenant() {
    let app = app();
    for tenant in [1, 1, 2] {
        app.queue
            .enqueue(TenantId(tenant), ResourceId(1), "/uploads/a.png", chrono::Duration::zero())
            .await
            .unwrap();
    }

    let (status, body) = send(&app.router, get("/api/offload/status", Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pending"], 3);
    assert_eq!(body["data"]["total"], 3);

    let (_, body) = send(&app.router, get("/api/offload/status?tenant_id=2", Some(TOKEN))).await;
    assert_eq!(body["data"]["pending"], 1);
    assert_eq!(body["data"]["failed"], 0);
}

#[tokio::test]
async fn test_retry_failed_reports_nothing_to_retry() {
    let app = app();
    let (status, body) = send(
        &app.router,
        post("/api/offload/retry-failed", Some(TOKEN), json!({ "tenant_id": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "There were no failed files to retry");
}

#[tokio::test]
async fn test_upload_hook_enqueues_original_and_variants() {
    let app = app();
    let event = json!({
        "tenant_id": 3,
        "resource_id": 11,
        "file_path": "/uploads/photo.jpg",
        "variants": [
            { "name": "thumbnail", "file_path": "/uploads/photo-150x150.jpg" }
        ]
    });

    let (status, body) = send(&app.router, post("/api/offload/uploads", Some(TOKEN), event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["decision"], "enqueued");
    assert_eq!(body["data"]["job_ids"].as_array().unwrap().len(), 2);

    let counts = app.queue.count_by_status(Some(TenantId(3))).await.unwrap();
    assert_eq!(counts.pending, 2);
    assert!(app.queue.fetch_due(None, 10).await.unwrap().is_empty());
    app.clock.advance(chrono::Duration::seconds(300));
    assert_eq!(app.queue.fetch_due(None, 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_hook_rejects_relative_path_and_anonymous_caller() {
    let app = app();
    let event = json!({ "tenant_id": 1, "resource_id": 1, "file_path": "photo.jpg" });
    let (status, body) = send(&app.router, post("/api/offload/uploads", Some(TOKEN), event.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _) = send(&app.router, post("/api/offload/uploads", None, event)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.queue.count_by_status(None).await.unwrap().total(), 0);
}

#[tokio::test]
async fn test_upload_hook_rejects_overlong_path() {
    let app = app();
    let file_path = format!("/uploads/{}.jpg", "x".repeat(300));
    let event = json!({ "tenant_id": 1, "resource_id": 1, "file_path": file_path });

    let (status, body) = send(&app.router, post("/api/offload/uploads", Some(TOKEN), event)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(app.queue.count_by_status(None).await.unwrap().total(), 0);
}

#[tokio::test]
async fn test_resolve_url_prefers_cdn_copy() {
    let app = app();
    let local = "http://site.example/uploads/a.png";
    let uri = format!("/api/offload/resolve?tenant_id=1&resource_id=5&local_url={local}");

    let (status, body) = send(&app.router, get(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["url"], local);

    app.resources
        .mark_offloaded(TenantId(1), ResourceId(5), "http://cdn.example.net/a.png", "a.png")
        .await
        .unwrap();
    let (_, body) = send(&app.router, get(&uri, None)).await;
    assert_eq!(body["data"]["url"], "https://cdn.example.net/a.png");
}

#[tokio::test]
async fn test_health_without_database() {
    let app = app();
    let (status, body) = send(&app.router, get("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "not configured");
}

#[test]
fn test_blank_admin_token_disables_privilege() {
    let clock = Arc::new(ManualClock::default());
    let queue = Arc::new(MemoryQueueStore::new(clock.clone()));
    let resources = Arc::new(MemoryResourceStore::new(clock));
    let settings = Arc::new(StaticSettings::new(OffloadSettings::default()));
    let processor = Arc::new(OffloadProcessor::new(
        queue.clone(),
        resources.clone(),
        Arc::new(AcceptingRemote),
        settings.clone(),
        Arc::new(NoopTenantContext),
        WorkerConfig::default(),
    ));
    let state = AppState::new(
        OffloadControl::new(processor),
        IntakeHook::new(queue, resources.clone(), settings.clone()),
        UrlResolver::new(resources, settings),
        Some("   ".to_string()),
    );
    assert!(state.admin_token.is_none());
}
