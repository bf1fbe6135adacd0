#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;

use tradelog::adapters::memory_adapter::MemoryAdapter;
use tradelog::adapters::web::AppState;

pub fn test_state() -> AppState {
    AppState {
        store: Arc::new(MemoryAdapter::new()),
        starting_capital: "50000".parse().unwrap(),
    }
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn trade_payload(instrument: &str, exit_price: Option<&str>, entry_time: &str) -> Value {
    let mut payload = json!({
        "instrument": instrument,
        "type": "buy",
        "entryPrice": "1.1000",
        "size": "1000",
        "entryTime": entry_time,
    });
    if let Some(exit) = exit_price {
        payload["exitPrice"] = json!(exit);
    }
    payload
}

pub fn plan_payload(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Buy strength, sell weakness",
        "riskPercentage": "1.5",
    })
}
