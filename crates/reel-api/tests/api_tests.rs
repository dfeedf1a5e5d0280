//! API integration tests against scripted collaborators.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use reel_api::{create_router, ApiConfig, AppState};
use reel_clients::{
    ClientError, ClientResult, CompletionRequest, RenderedVideo, SceneRenderer, StillFrame, TextCompletion,
    VisionCompletion, VisionRequest,
};
use reel_models::{Background, ImageRef, ImageRole, Motion, Scene, SceneType, Typography, VideoSpec};
use reel_pipeline::{GenerationService, PipelineConfig};
use reel_progress::JobRegistry;

const STRATEGY: &str = r#"{"corePromise":"Every deadline under control","hookIntent":"recognition",
"emotionalArc":["stress","relief"],"differentiator":"AI triage"}"#;
const ART: &str = r##"{"designPack":"clean_saas","palette":{"primary":"#2563EB","secondary":"#0F172A","accent":"#22C55E"},
"mood":"calm","shots":[{"shotType":"hook","effects":["kinetic_type"]}]}"##;
const SCENES: &str = r#"{"scenes":[
  {"sceneType":"hook","headline":"Deadlines slipping?"},
  {"sceneType":"solution","headline":"Meet Tasky"},
  {"sceneType":"cta","headline":"Start free"}
]}"#;

struct Text(Mutex<VecDeque<String>>);

impl Text {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self(Mutex::new(replies.iter().map(|s| s.to_string()).collect())))
    }
}

#[async_trait]
impl TextCompletion for Text {
    async fn complete(&self, _request: &CompletionRequest) -> ClientResult<String> {
        self.0
            .lock()
            .pop_front()
            .ok_or_else(|| ClientError::request_failed("script exhausted"))
    }
}

struct Vision;

#[async_trait]
impl VisionCompletion for Vision {
    async fn analyze_image(&self, _request: &VisionRequest) -> ClientResult<String> {
        Ok(r#"{"verdict":"premium","issues":[],"confidence":0.9}"#.to_string())
    }
}

struct Renderer;

#[async_trait]
impl SceneRenderer for Renderer {
    async fn render_still(&self, _spec: &VideoSpec, _scene_index: usize) -> ClientResult<StillFrame> {
        Ok(StillFrame {
            image_data: "iVBORw0KGgo=".to_string(),
        })
    }

    async fn render_video(&self, _spec: &VideoSpec) -> ClientResult<RenderedVideo> {
        Ok(RenderedVideo {
            output_url: Some("https://cdn.test/out.mp4".to_string()),
            duration_secs: Some(9.0),
        })
    }
}

fn test_config() -> ApiConfig {
    ApiConfig {
        stream_close_grace: Duration::from_millis(10),
        ..ApiConfig::default()
    }
}

fn create_test_app(replies: &[&str]) -> (Router, JobRegistry) {
    let registry = JobRegistry::new();
    let service = GenerationService::new(
        Text::new(replies),
        Arc::new(Vision),
        Arc::new(Renderer),
        registry.clone(),
        PipelineConfig::default(),
    );
    let state = AppState::with_service(test_config(), service);
    (create_router(state, None), registry)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app(&[]);
    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_ready_without_renderer() {
    let (app, _) = create_test_app(&[]);
    let response = app.oneshot(get("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["checks"]["renderer"]["status"], "skipped");
}

#[tokio::test]
async fn test_missing_prompt_is_rejected_without_job() {
    let (app, registry) = create_test_app(&[STRATEGY]);
    let response = app
        .oneshot(post_json("/api/generate", json!({"tone": "calm"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_blank_prompt_is_rejected_without_job() {
    let (app, registry) = create_test_app(&[STRATEGY]);
    let response = app
        .oneshot(post_json("/api/generate", json!({"prompt": " \u{0007} "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid_input");
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_generate_without_refinement() {
    let (app, registry) = create_test_app(&[STRATEGY, ART, SCENES]);
    let response = app
        .oneshot(post_json(
            "/api/generate",
            json!({"prompt": "Task manager for busy teams", "jobId": "job-sync", "refine": false}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["jobId"], "job-sync");
    assert_eq!(body["spec"]["scenes"].as_array().unwrap().len(), 3);
    assert_eq!(body["refinement"]["iterations"], 0);
    assert_eq!(body["strategy"]["corePromise"], "Every deadline under control");

    let record = registry.get(&"job-sync".into()).unwrap();
    assert_eq!(record.progress, 100);
}

#[tokio::test]
async fn test_generate_with_refinement_reports_summary() {
    let (app, _) = create_test_app(&[STRATEGY, ART, SCENES]);
    let response = app
        .oneshot(post_json(
            "/api/generate",
            json!({"prompt": "Task manager", "maxIterations": 2}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // hook and solution are reviewed, both accepted on the first pass
    let scenes = body["refinement"]["scenes"].as_array().unwrap();
    assert_eq!(scenes.len(), 2);
    assert!(scenes.iter().all(|s| s["iterations"] == 1 && s["wasModified"] == false));
    assert_eq!(body["refinement"]["iterations"], 2);
}

#[tokio::test]
async fn test_stage_failure_maps_to_bad_gateway() {
    let (app, registry) = create_test_app(&[STRATEGY, "no json here"]);
    let response = app
        .oneshot(post_json("/api/generate", json!({"prompt": "Task manager", "jobId": "job-bad"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "stage_failed");
    assert_eq!(body["stage"], "art_director");
    assert_eq!(body["rawOutput"], "no json here");

    let record = registry.get(&"job-bad".into()).unwrap();
    assert_eq!(record.status, reel_models::JobStatus::Error);
}

#[tokio::test]
async fn test_duplicate_job_id_conflicts() {
    let (app, registry) = create_test_app(&[]);
    registry.create(Some("taken".into())).unwrap();

    let response = app
        .oneshot(post_json("/api/jobs", json!({"prompt": "Task manager", "jobId": "taken"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_background_job_lifecycle() {
    let (app, _) = create_test_app(&[STRATEGY, ART, SCENES]);
    let response = app
        .clone()
        .oneshot(post_json("/api/jobs", json!({"prompt": "Task manager", "refine": false})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let created = body_json(response).await;
    let job_id = created["jobId"].as_str().unwrap().to_string();
    assert_eq!(created["streamUrl"], format!("/api/jobs/{}/stream", job_id));

    let mut status = Value::Null;
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/jobs/{}", job_id)))
            .await
            .unwrap();
        status = body_json(response).await;
        if status["status"] == "complete" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(status["status"], "complete");
    assert_eq!(status["progress"], 100);
    assert_eq!(status["stage"], "complete");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/jobs/{}/history?since=2", job_id)))
        .await
        .unwrap();
    let history = body_json(response).await;
    let entries = history["entries"].as_array().unwrap();
    assert!(entries.iter().all(|e| e["seq"].as_u64().unwrap() > 2));
    assert_eq!(entries.last().unwrap()["stage"], "complete");
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let (app, _) = create_test_app(&[]);
    let response = app.clone().oneshot(get("/api/jobs/missing-job")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "not_found");

    let response = app.oneshot(get("/api/jobs/missing-job/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sse_stream_of_finished_job_closes() {
    let (app, registry) = create_test_app(&[]);
    let id = registry.create(Some("job-done".into())).unwrap().id;
    registry
        .transition(&id, reel_models::JobStage::Initializing, "start")
        .unwrap();
    registry.complete(&id, "all done").unwrap();

    let response = app.oneshot(get("/api/jobs/job-done/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let bytes = tokio::time::timeout(Duration::from_secs(5), to_bytes(response.into_body(), usize::MAX))
        .await
        .unwrap()
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: progress"));
    assert!(text.contains("\"status\":\"complete\""));
    assert!(text.contains("event: close"));
}

fn renderable_scene(scene_type: SceneType, headline: &str) -> Scene {
    let mut scene = Scene::new(scene_type, headline);
    scene.background = Some(Background::solid("#FFFFFF"));
    scene.typography = Some(Typography::default());
    scene.motion = Some(Motion {
        entry: "fade_in".to_string(),
        exit: "fade_out".to_string(),
        hold: None,
        entry_frames: None,
        exit_frames: None,
    });
    scene
}

#[tokio::test]
async fn test_render_rejects_unknown_images() {
    let (app, _) = create_test_app(&[]);
    let mut scene = renderable_scene(SceneType::Solution, "Meet Tasky");
    scene.images.push(ImageRef::new("img-404", ImageRole::Hero));
    let spec = VideoSpec::new(30, 1080, 1920, vec![scene]);

    let response = app
        .oneshot(post_json("/api/render", json!({"spec": spec, "images": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "validation_failed");
    assert!(body["errors"][0].as_str().unwrap().contains("img-404"));
}

#[tokio::test]
async fn test_render_passes_valid_spec_through() {
    let (app, _) = create_test_app(&[]);
    let spec = VideoSpec::new(30, 1080, 1920, vec![renderable_scene(SceneType::Cta, "Start free")]);

    let response = app
        .oneshot(post_json("/api/render", json!({ "spec": spec })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["outputUrl"], "https://cdn.test/out.mp4");
}
