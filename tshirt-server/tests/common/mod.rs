//! Test harness for integration tests.
//!
//! Builds the real application router around in-memory mailers and drives
//! it with `tower::ServiceExt::oneshot`, no sockets involved.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use tshirt_renderer::{encode_data_uri, ExportConfig};
use tshirt_server::{
    router, web_exporter, AppState, DesignMailer, DesignMessage, MailError, MailSettings,
};

/// Seller address used by every test app.
pub const SELLER: &str = "seller@example.com";

/// Sender address used by every test app.
pub const SENDER: &str = "studio@example.com";

/// Keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<DesignMessage>>,
}

impl RecordingMailer {
    /// Messages sent so far.
    pub fn sent(&self) -> Vec<DesignMessage> {
        self.sent.lock().expect("lock").clone()
    }
}

#[async_trait]
impl DesignMailer for RecordingMailer {
    async fn send(&self, message: &DesignMessage) -> Result<(), MailError> {
        self.sent.lock().expect("lock").push(message.clone());
        Ok(())
    }
}

/// Rejects every message.
pub struct FailingMailer;

#[async_trait]
impl DesignMailer for FailingMailer {
    async fn send(&self, _message: &DesignMessage) -> Result<(), MailError> {
        Err(MailError::Rejected("smtp unavailable".to_string()))
    }

    async fn ready(&self) -> bool {
        false
    }
}

/// A response with its body collected.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

/// The application under test.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// App with the given mailer and a font-less exporter.
    pub fn with_mailer(mailer: Arc<dyn DesignMailer>) -> Self {
        let exporter = web_exporter(ExportConfig {
            system_fonts: false,
            ..ExportConfig::default()
        });
        let state = AppState::new(
            exporter,
            mailer,
            MailSettings {
                from: SENDER.to_string(),
                to: SELLER.to_string(),
            },
        );
        Self {
            router: router(state, 9474),
        }
    }

    /// App backed by a recording mailer, returned alongside it.
    pub fn recording() -> (Self, Arc<RecordingMailer>) {
        let mailer = Arc::new(RecordingMailer::default());
        (Self::with_mailer(Arc::clone(&mailer) as Arc<dyn DesignMailer>), mailer)
    }

    /// Send one request through the router.
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// POST a JSON body.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.request(request).await
    }

    /// GET a path.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::get(path).body(Body::empty()).expect("request");
        self.request(request).await
    }
}

/// Encode a solid-color PNG.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("encode png");
    out
}

/// A complete, valid send-design body.
pub fn valid_submission() -> serde_json::Value {
    serde_json::json!({
        "designImage": encode_data_uri("image/png", &solid_png(2, 2, [255, 0, 0, 255])),
        "userDetails": {
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "555-0100"
        },
        "deliveryDetails": {
            "address": "12 Analytical Way",
            "city": "London",
            "state": "Greater London",
            "postalCode": "N1 9GU",
            "country": "UK"
        }
    })
}
