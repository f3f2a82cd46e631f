use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bay_street::config::PortfolioConfig;
use bay_street::deal_router;
use bay_street::scoring::ScoringEngine;
use bay_street::service::DealService;
use bay_street::universe::{DealStore, StoreError, StoredDeal};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<StoredDeal>>,
}

impl DealStore for MemoryStore {
    fn append(&self, deals: &[StoredDeal]) -> Result<(), StoreError> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .extend_from_slice(deals);
        Ok(())
    }

    fn load(&self) -> Result<Vec<StoredDeal>, StoreError> {
        Ok(self.rows.lock().expect("store mutex poisoned").clone())
    }
}

fn router() -> Router {
    let service = DealService::new(
        Arc::new(MemoryStore::default()),
        ScoringEngine::default(),
        PortfolioConfig::default(),
    );
    deal_router(Arc::new(service))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializable body")))
        .expect("request builds")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

fn harbourfront() -> Value {
    json!({
        "id": "Harbourfront Hotel",
        "region": "Americas",
        "projected_irr": 12.0,
        "coc_yield": 6.0,
        "volatility": 10.0,
        "illiquidity_premium": 2.0,
        "esg_score": 3,
        "sponsor_coinvest": 5.0
    })
}

#[tokio::test]
async fn score_route_returns_breakdown_without_storing() {
    let router = router();

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/deals/score", harbourfront()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!((body["aha"].as_f64().expect("aha") - 2.0).abs() < 1e-9);
    assert!((body["bay_score"].as_f64().expect("score") - 56.4167).abs() < 1e-3);
    assert_eq!(body["components"].as_array().expect("components").len(), 9);

    let listing = router
        .oneshot(
            Request::get("/api/v1/deals")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("response");
    let body = body_json(listing).await;
    assert!(body["deals"].as_array().expect("deals").is_empty());
}

#[tokio::test]
async fn added_deals_are_listed_by_rank() {
    let router = router();

    let mut stronger = harbourfront();
    stronger["id"] = json!("Lisbon Platform");
    stronger["projected_irr"] = json!(16.0);

    for deal in [harbourfront(), stronger] {
        let response = router
            .clone()
            .oneshot(json_request("POST", "/api/v1/deals", deal))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = router
        .oneshot(
            Request::get("/api/v1/deals")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("response");
    let body = body_json(response).await;
    let ids: Vec<&str> = body["deals"]
        .as_array()
        .expect("deals")
        .iter()
        .map(|deal| deal["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["Lisbon Platform", "Harbourfront Hotel"]);
}

#[tokio::test]
async fn import_route_reports_missing_columns() {
    let response = router()
        .oneshot(json_request(
            "POST",
            "/api/v1/deals/import",
            json!({ "csv": "Deal,IRR,Volatility\nHarbourfront,12,10\n" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let missing: Vec<&str> = body["missing_columns"]
        .as_array()
        .expect("missing columns")
        .iter()
        .map(|value| value.as_str().expect("column name"))
        .collect();
    assert!(missing.contains(&"CoC Yield"));
    assert!(missing.contains(&"Illiquidity Premium"));
    assert!(!missing.contains(&"IRR"));
}

#[tokio::test]
async fn import_route_rejects_malformed_rows() {
    let csv = "Deal,IRR,CoC Yield,Volatility,LSD,ESG,Sponsor Co-Invest,OpLev,BrandRep,MgmtTrans\n\
Harbourfront,twelve,6,10,2,3,5,n,n,n\n";

    let response = router()
        .oneshot(json_request(
            "POST",
            "/api/v1/deals/import",
            json!({ "csv": csv }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn allocate_route_reports_status_for_every_outcome() {
    let router = router();
    let csv = include_str!("../sample_deals.csv");

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/deals/import",
            json!({ "csv": csv }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["imported"], json!(6));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/portfolio/allocate",
            json!({ "max_volatility": 12.0, "max_illiquidity": 2.5, "objective": "bay_score" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("optimal"));
    assert_eq!(body["objective"], json!("bay_score"));
    assert!(!body["holdings"].as_array().expect("holdings").is_empty());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/portfolio/allocate",
            json!({ "min_bay_score": 99.0 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("no_eligible_deals"));
    assert!(body["holdings"].as_array().expect("holdings").is_empty());
}
