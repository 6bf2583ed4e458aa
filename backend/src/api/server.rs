//! HTTP server for SLO extraction.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                                     |
//! |--------|----------------|-------------------------------------------------|
//! | GET    | `/health`      | Health check                                    |
//! | POST   | `/api/extract` | One `grades` + one `questions` file → CSV       |
//! | POST   | `/api/batch`   | Many `grades` / `questions` files → JSON report |
//! | GET    | `/api/logs`    | SSE stream for real-time logs                   |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, BatchResponse};
use crate::error::{BatchError, ServerError};
use crate::transform::batch::{process_batch, BatchOutcome, SectionFile};
use crate::transform::pipeline::{extract_to_csv, ExtractOptions};

/// File name of the single-section download.
pub const OUTPUT_FILE: &str = "slo_grades.csv";

type SharedOptions = Arc<ExtractOptions>;

/// Build the router.
pub fn router(options: ExtractOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/extract", post(extract))
        .route("/api/batch", post(batch))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(options))
}

/// Start the HTTP server
pub async fn start_server(port: u16, options: ExtractOptions) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 sloscore server running on http://localhost:{}", port);
    println!("   POST /api/extract - grades + questions CSV → SLO CSV");
    println!("   POST /api/batch   - many section files → combined roster");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(options)).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sloscore",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "extract": "POST /api/extract",
            "batch": "POST /api/batch",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Files of a multipart upload, split by field name.
#[derive(Debug, Default)]
struct Uploads {
    grades: Vec<SectionFile>,
    questions: Vec<SectionFile>,
}

async fn read_uploads(mut multipart: Multipart) -> Result<Uploads, ServerError> {
    let mut uploads = Uploads::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;

        let file = SectionFile::new(file_name, bytes.to_vec());
        match name.as_str() {
            "grades" => uploads.grades.push(file),
            "questions" => uploads.questions.push(file),
            _ => {}
        }
    }

    Ok(uploads)
}

fn reject(err: ServerError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Extract(_) | ServerError::Batch(BatchError::NoData) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServerError::Batch(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    eprintln!("❌ {}", err);
    (status, Json(error_response(&err.to_string())))
}

async fn extract(
    State(options): State<SharedOptions>,
    multipart: Multipart,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let uploads = read_uploads(multipart).await.map_err(reject)?;

    let (Some(grades), Some(questions)) = (uploads.grades.first(), uploads.questions.first()) else {
        return Err(reject(ServerError::BadRequest(
            "Both a 'grades' and a 'questions' file are required".to_string(),
        )));
    };

    log_info(format!("📄 Upload: {} + {}", grades.name, questions.name));
    let (csv, _) = extract_to_csv(&grades.bytes, &questions.bytes, &options)
        .map_err(|e| reject(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", OUTPUT_FILE),
            ),
        ],
        csv,
    )
        .into_response())
}

async fn batch(
    State(options): State<SharedOptions>,
    multipart: Multipart,
) -> Result<Json<BatchResponse>, (StatusCode, Json<Value>)> {
    let uploads = read_uploads(multipart).await.map_err(reject)?;
    if uploads.grades.is_empty() && uploads.questions.is_empty() {
        return Err(reject(ServerError::BadRequest("No files provided".to_string())));
    }

    log_info(format!(
        "📦 Batch upload: {} grades file(s), {} questions file(s)",
        uploads.grades.len(),
        uploads.questions.len()
    ));
    let outcome = process_batch(uploads.grades, uploads.questions, &options);

    batch_response(&outcome, &options).map(Json).map_err(reject)
}

/// JSON report of a batch, or [`BatchError::NoData`] when nothing was combined.
fn batch_response(outcome: &BatchOutcome, options: &ExtractOptions) -> Result<BatchResponse, ServerError> {
    outcome.roster()?;
    Ok(BatchResponse::from_outcome(outcome, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTIONS: &str = "a\nb\nQ#,Question name\n1,SLO 1\n";

    #[test]
    fn test_batch_response_ready() {
        let opts = ExtractOptions::default();
        let outcome = process_batch(
            vec![SectionFile::new(
                "s1-grades.csv",
                "Last name,First name,ID number,Email address,Q. 1 /10\nDoe,Jane,1001,jane@x.edu,8\n",
            )],
            vec![SectionFile::new("s1-questionstats.csv", QUESTIONS)],
            &opts,
        );

        let response = batch_response(&outcome, &opts).unwrap();
        assert_eq!(response.status, "ready");
        assert!(response.combined_csv.is_some());
    }

    #[test]
    fn test_batch_without_results_is_unprocessable() {
        let opts = ExtractOptions::default();
        let outcome = process_batch(
            vec![SectionFile::new("s1-grades.csv", "Student,Q. 1 /10\nX,1\n")],
            vec![SectionFile::new("s1-questionstats.csv", QUESTIONS)],
            &opts,
        );

        let err = batch_response(&outcome, &opts).unwrap_err();
        assert!(matches!(err, ServerError::Batch(BatchError::NoData)));

        let (status, _) = reject(err);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
