use crate::data::{TimetableRequest, TimetableResponse};
use crate::solver;
use axum::{Json, Router, routing::post};
use log::{info, warn};

async fn generate_handler(
    Json(input): Json<TimetableRequest>,
) -> Result<Json<TimetableResponse>, (axum::http::StatusCode, String)> {
    match solver::solve(&input) {
        Ok(output) => Ok(Json(output)),
        Err(e) => {
            warn!("Rejected timetable request: {}", e);
            Err((axum::http::StatusCode::BAD_REQUEST, e))
        }
    }
}

pub fn app() -> Router {
    Router::new().route("/v1/timetable/generate", post(generate_handler))
}

pub async fn run_server(bind_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app()).await
}
