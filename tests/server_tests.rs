//! # HTTP Backend Tests
//!
//! Requests go straight into the router with `tower::ServiceExt::oneshot`;
//! no socket is opened.

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use fieldpress::config::Config;
use fieldpress::data::{Dataset, Row};
use fieldpress::field::{Color, Field};
use fieldpress::render::{QrError, QrGenerator};
use fieldpress::server::{AppState, router};
use fieldpress::template::Template;
use fieldpress::text::FontBook;
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(AppState::new(
        Config::default(),
        Arc::new(FontBook::builtin()),
    )))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_font_catalog() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/fonts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"display_name": "Spleen Mono", "family": "spleen"}]));
}

#[tokio::test]
async fn test_click_then_name_creates_selected_field() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/editor/pointer",
        Some(json!({"phase": "down", "x": 30, "y": 40})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["outcome"], "name_requested");
    assert_eq!(body["editor"]["state"]["state"], "typing_field_name");
    assert_eq!(body["editor"]["selected"], -1);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/editor/name",
        Some(json!({"name": "greeting"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 0);
    assert_eq!(body["editor"]["selected"], 0);
    assert_eq!(body["editor"]["fields"][0]["name"], "greeting");
    assert_eq!(body["editor"]["fields"][0]["kind"], "text");
    assert_eq!(body["editor"]["bindings"], json!({"greeting": null}));
}

#[tokio::test]
async fn test_field_update_and_delete() {
    let app = app();
    call(&app, Method::POST, "/api/editor/tool", Some(json!({"kind": "qr"}))).await;
    call(
        &app,
        Method::POST,
        "/api/editor/pointer",
        Some(json!({"phase": "down", "x": 0, "y": 0})),
    )
    .await;
    call(&app, Method::POST, "/api/editor/name", Some(json!({"name": "code"}))).await;

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/fields/0",
        Some(json!({"size": 999, "transparent_background": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["editor"]["fields"][0]["module_size_px"], 200);
    assert_eq!(body["editor"]["fields"][0]["background"], Value::Null);

    let (status, body) = call(&app, Method::DELETE, "/api/fields/3", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::DELETE, "/api/fields/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["editor"]["fields"], json!([]));
    assert_eq!(body["editor"]["selected"], -1);
}

#[tokio::test]
async fn test_export_refused_without_inputs() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/api/export", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("template"));

    let (_, status_body) = call(&app, Method::GET, "/api/export/status", None).await;
    assert_eq!(status_body["status"], "idle");

    let (status, _) = call(&app, Method::GET, "/api/export/download", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preview_needs_template() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/preview", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_layout_put_then_get() {
    let app = app();
    let layout = json!({
        "fields": [
            {"name": "greeting", "x": 10.0, "y": 10.0, "demo_value": "", "kind": "text",
             "font_size_px": 20, "font_family": "spleen", "color": "#000000", "align": "left"}
        ],
        "bindings": {"greeting": "name"},
        "naming": {"source_column": "name", "include_sequence_number": false}
    });
    let (status, _) = call(&app, Method::PUT, "/api/layout", Some(layout.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, "/api/layout", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, layout);
}

/// Generator whose worker dies mid-run.
struct PanickingQr;

#[async_trait]
impl QrGenerator for PanickingQr {
    async fn generate(
        &self,
        _text: &str,
        _size_px: u32,
        _foreground: Color,
        _background: Option<Color>,
    ) -> Result<RgbaImage, QrError> {
        panic!("qr worker died");
    }
}

/// Poll the status endpoint until the run is no longer `running`.
async fn wait_for_export(app: &Router) -> Value {
    for _ in 0..200 {
        let (_, body) = call(app, Method::GET, "/api/export/status", None).await;
        if body["status"] != "running" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("export never left the running state");
}

#[tokio::test]
async fn test_crashed_export_frees_the_slot() {
    let state = Arc::new(
        AppState::new(Config::default(), Arc::new(FontBook::builtin()))
            .with_qr(Arc::new(PanickingQr)),
    );
    {
        let mut editor = state.editor.write().await;
        editor.load_template(
            Template::from_image(RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]))),
            100.0,
            100.0,
        );
        editor.load_dataset(Dataset::new(
            vec!["url".to_string()],
            vec![Row::new([("url", "https://example.com")])],
        ));
        editor.add_field(Field::qr("code", 10.0, 10.0).with_demo("x")).unwrap();
    }
    let app = router(state);

    let (status, _) = call(&app, Method::POST, "/api/export", None).await;
    assert_eq!(status, StatusCode::OK);

    let body = wait_for_export(&app).await;
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().unwrap().contains("aborted"));

    let (status, _) = call(&app, Method::POST, "/api/export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wait_for_export(&app).await["status"], "failed");
}
