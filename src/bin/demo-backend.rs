//! A small origin for trying the balancer locally.
//!
//! Serves `/health`, `/api/v1/some-data` and an in-memory `/db/<key>` store.
//!
//! ```text
//! demo-backend --port 8081 &
//! demo-backend --port 8082 &
//! least-bytes-lb --trace --backend 127.0.0.1:8081 --backend 127.0.0.1:8082
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Parser)]
#[command(name = "demo-backend")]
#[command(about = "Demo origin for the least-bytes load balancer", long_about = None)]
struct Cli {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

type Store = Arc<RwLock<HashMap<String, String>>>;

#[derive(Deserialize)]
struct PutValue {
    value: String,
}

#[derive(Serialize)]
struct Entry {
    key: String,
    value: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let store: Store = Arc::default();

    let app = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route(
            "/api/v1/some-data",
            get(|| async { Json(serde_json::json!(["1", "2"])) }),
        )
        .route("/db/{key}", get(get_value).post(put_value))
        .with_state(store);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    println!("demo-backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn get_value(State(store): State<Store>, Path(key): Path<String>) -> impl IntoResponse {
    match store.read().await.get(&key) {
        Some(value) => Json(Entry {
            key,
            value: value.clone(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn put_value(
    State(store): State<Store>,
    Path(key): Path<String>,
    body: Result<Json<PutValue>, axum::extract::rejection::JsonRejection>,
) -> StatusCode {
    match body {
        Ok(Json(put)) => {
            store.write().await.insert(key, put.value);
            StatusCode::CREATED
        }
        Err(_) => StatusCode::BAD_REQUEST,
    }
}
