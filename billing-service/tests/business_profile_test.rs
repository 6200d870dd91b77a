//! Business profile read and update.

mod common;

use common::{sample_bill, TestApp};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn default_profile_is_served() {
    let app = TestApp::spawn().await;

    let body: Value = app.get("/business").await.json().await.unwrap();
    assert_eq!(body["name"], "Sharma Electronics");
    assert_eq!(body["payment_method"], "UPI");
}

#[tokio::test]
async fn updated_profile_is_used_for_next_bill() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .put(format!("{}/business", app.http_address))
        .json(&json!({
            "name": "Gupta General Store",
            "address": "12 MG Road, Bengaluru - 560001",
            "phone": "+91 80 4123 4567",
            "email": "hello@guptastore.in",
            "gst_number": "GST29AABCG5678H1Z2"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    app.post_bill(&sample_bill("INV-400001")).await;

    let payloads = app.webhook_payloads().await;
    assert_eq!(payloads[0]["brand"], "Gupta General Store");
    assert_eq!(payloads[0]["store_location"], "12 MG Road, Bengaluru - 560001");
    assert_eq!(payloads[0]["payment_method"], "UPI");
}

#[tokio::test]
async fn invalid_profile_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .put(format!("{}/business", app.http_address))
        .json(&json!({
            "name": "",
            "address": "Somewhere",
            "phone": "123",
            "email": "not-an-email",
            "gst_number": "GST"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = app.get("/business").await.json().await.unwrap();
    assert_eq!(body["name"], "Sharma Electronics");
}
