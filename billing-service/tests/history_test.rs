//! Bill history listing and lookup.

mod common;

use common::{sample_bill, TestApp, TestOptions};
use reqwest::StatusCode;
use serde_json::Value;

async fn seeded() -> TestApp {
    TestApp::spawn_with(TestOptions {
        seed_fixtures: true,
        ..TestOptions::default()
    })
    .await
}

#[tokio::test]
async fn fixtures_are_listed() {
    let app = seeded().await;

    let response = app.get("/bills").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Vec<Value> = response.json().await.unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["customer_name"], "Rajesh Kumar");
    assert_eq!(body[0]["amount"], "2360.00");
}

#[tokio::test]
async fn new_bill_is_listed_first() {
    let app = seeded().await;
    app.post_bill(&sample_bill("INV-300001")).await;

    let body: Vec<Value> = app.get("/bills").await.json().await.unwrap();
    assert_eq!(body.len(), 3);
    assert_eq!(body[0]["bill_number"], "INV-300001");
}

#[tokio::test]
async fn search_matches_email_case_insensitively() {
    let app = seeded().await;

    let body: Vec<Value> = app
        .get("/bills?search=YAHOO.COM")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["customer_name"], "Priya Sharma");
}

#[tokio::test]
async fn status_filter() {
    let app = seeded().await;

    let all: Vec<Value> = app.get("/bills?status=all").await.json().await.unwrap();
    assert_eq!(all.len(), 2);

    let failed: Vec<Value> = app.get("/bills?status=failed").await.json().await.unwrap();
    assert!(failed.is_empty());

    let unknown = app.get("/bills?status=archived").await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lookup_by_bill_number() {
    let app = seeded().await;

    let found = app.get("/bills/TXN_002").await;
    assert_eq!(found.status(), StatusCode::OK);
    let body: Value = found.json().await.unwrap();
    assert_eq!(body["file_name"], "receipt_002.jpg");

    let missing = app.get("/bills/INV-404404").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lookup_returns_the_full_bill() {
    let app = TestApp::spawn().await;
    let response = app.post_bill(&sample_bill("INV-300002")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = app.get("/bills/INV-300002").await.json().await.unwrap();

    assert_eq!(body["bill_number"], "INV-300002");
    assert_eq!(body["file_name"], "INV-300002.pdf");
    assert_eq!(body["amount"], "2360.00");
    assert!(body["issue_date"].is_string());
    assert!(body["subtotal"].is_string());
    assert!(body["tax_amount"].is_string());

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"], 2);
}
