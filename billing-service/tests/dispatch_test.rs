//! Channel isolation: one failing notification never hides the other.

mod common;

use common::{sample_bill, TestApp, TestOptions};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn email_failure_still_delivers_sms_and_records_bill() {
    let app = TestApp::spawn_with(TestOptions {
        email_enabled: false,
        ..TestOptions::default()
    })
    .await;

    let response = app.post_bill(&sample_bill("INV-200001")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["delivery"]["email"]["success"], false);
    assert_eq!(
        body["delivery"]["email"]["message"],
        "Failed to send email. Please check the email address and try again."
    );
    assert_eq!(body["delivery"]["sms"]["success"], true);
    assert_eq!(body["record"]["status"], "sent");
    assert_eq!(app.sms.send_count(), 1);
}

#[tokio::test]
async fn sms_failure_reports_channel_error_text() {
    let app = TestApp::spawn_with(TestOptions {
        sms_enabled: false,
        ..TestOptions::default()
    })
    .await;

    let response = app.post_bill(&sample_bill("INV-200002")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["delivery"]["email"]["success"], true);
    assert_eq!(body["delivery"]["sms"]["success"], false);
    assert!(body["delivery"]["sms"]["message"]
        .as_str()
        .unwrap()
        .contains("not enabled"));
}

#[tokio::test]
async fn email_only_bill_skips_sms_entirely() {
    let app = TestApp::spawn().await;
    let mut bill = sample_bill("INV-200003");
    bill["channel"] = json!("email");
    bill["customer_phone"] = Value::Null;

    let response = app.post_bill(&bill).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["delivery"]["email"]["success"], true);
    assert!(body["delivery"].get("sms").is_none());
    assert_eq!(app.sms.send_count(), 0);
}

#[tokio::test]
async fn sms_only_bill_accepts_delivery_method_alias() {
    let app = TestApp::spawn().await;
    let bill = json!({
        "bill_number": "INV-200004",
        "customer_name": "Priya Sharma",
        "customer_phone": "87654 32109",
        "delivery_method": "sms",
        "items": [{ "description": "Extension board", "quantity": 1, "price": 450 }]
    });

    let response = app.post_bill(&bill).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert!(body["delivery"].get("email").is_none());
    assert_eq!(body["delivery"]["sms"]["success"], true);
    assert_eq!(app.email.send_count(), 0);
}
