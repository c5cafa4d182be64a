use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use ridgeline::config::{Mode, Params};
use ridgeline::error::Error;
use ridgeline::render::MAX_SURFACE_SIDE;
use ridgeline::subdivide::{SeedPolicy, checked_depth};
use ridgeline::{GenerateError, Shape, logging, render};

#[derive(Deserialize, Default)]
struct GenerateRequest {
    mode: Option<Mode>,
    width: Option<u32>,
    height: Option<u32>,
    depth: Option<i64>,
    mesh_depth: Option<i64>,
    seed: Option<u64>,
    seed_policy: Option<SeedPolicy>,
    baseline: Option<f64>,
    amplitude: Option<f64>,
    decay: Option<f64>,
    fill: Option<bool>,
    roughness: Option<f64>,
}

impl GenerateRequest {
    fn into_params(self) -> Result<Params, GenerateError> {
        let defaults = Params::default();
        let width = self.width.unwrap_or(defaults.width);
        let height = self.height.unwrap_or(defaults.height);
        if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
            return Err(GenerateError::InvalidInput(format!(
                "surface {width}x{height} exceeds {MAX_SURFACE_SIDE} pixels per side"
            )));
        }
        Ok(Params {
            mode: self.mode.unwrap_or(defaults.mode),
            width,
            height,
            depth: match self.depth {
                Some(d) => checked_depth(d)?,
                None => defaults.depth,
            },
            mesh_depth: match self.mesh_depth {
                Some(d) => checked_depth(d)?,
                None => defaults.mesh_depth,
            },
            seed: self.seed.unwrap_or(defaults.seed),
            seed_policy: self.seed_policy.unwrap_or(defaults.seed_policy),
            baseline: self.baseline.unwrap_or(defaults.baseline),
            amplitude: self.amplitude.unwrap_or(defaults.amplitude),
            decay: self.decay.unwrap_or(defaults.decay),
            fill: self.fill.unwrap_or(defaults.fill),
            roughness: self.roughness.unwrap_or(defaults.roughness),
        })
    }
}

#[derive(Serialize)]
struct GenerateResponse {
    #[serde(flatten)]
    shape: Shape,
    data_url: String,
    timings: Vec<TimingEntry>,
    width: u32,
    height: u32,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, msg: impl ToString) -> Response {
    (status, Json(ErrorBody { error: msg.to_string() })).into_response()
}

fn run(params: Params) -> Result<GenerateResponse, Error> {
    let (landscape, timings) = ridgeline::build(&params)?;
    let png = render::encode_png(&landscape.rgba, landscape.width, landscape.height)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);

    Ok(GenerateResponse {
        shape: landscape.shape,
        data_url: format!("data:image/png;base64,{}", b64),
        timings: timings
            .iter()
            .map(|t| TimingEntry {
                name: t.name.to_string(),
                ms: t.ms,
            })
            .collect(),
        width: landscape.width,
        height: landscape.height,
    })
}

async fn generate_handler(req: Result<Json<GenerateRequest>, JsonRejection>) -> Response {
    let Json(req) = match req {
        Ok(req) => req,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };
    let params = match req.into_params() {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match tokio::task::spawn_blocking(move || run(params)).await {
        Ok(Ok(resp)) => Json(resp).into_response(),
        Ok(Err(e @ (Error::Generate(_) | Error::Config(_)))) => {
            error_response(StatusCode::BAD_REQUEST, e)
        }
        Ok(Err(e)) => {
            tracing::error!("render failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
        Err(e) => {
            tracing::error!("generation task failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "generation task failed")
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    logging::init_logging(None);

    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/generate", post(generate_handler))
        .fallback_service(frontend)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("ridgeline server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    async fn error_of(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["error"].as_str().unwrap().to_string()
    }

    async fn parse(body: &'static str) -> Result<Json<GenerateRequest>, JsonRejection> {
        let req = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        Json::<GenerateRequest>::from_request(req, &()).await
    }

    #[test]
    fn negative_depth_is_invalid_input() {
        let req = GenerateRequest {
            depth: Some(-1),
            ..Default::default()
        };
        assert!(matches!(req.into_params(), Err(GenerateError::InvalidInput(_))));
    }

    #[test]
    fn oversized_surface_is_invalid_input() {
        let req = GenerateRequest {
            width: Some(MAX_SURFACE_SIDE + 1),
            ..Default::default()
        };
        assert!(matches!(req.into_params(), Err(GenerateError::InvalidInput(_))));
    }

    #[test]
    fn empty_request_uses_defaults() {
        let params = GenerateRequest::default().into_params().unwrap();
        assert_eq!(params, Params::default());
    }

    #[tokio::test]
    async fn zero_width_is_bad_request() {
        let resp = generate_handler(parse(r#"{"width": 0}"#).await).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(error_of(resp).await.starts_with("invalid input"));
    }

    #[tokio::test]
    async fn negative_depth_is_bad_request() {
        let resp = generate_handler(parse(r#"{"depth": -1}"#).await).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(error_of(resp).await.contains("non-negative"));
    }

    #[tokio::test]
    async fn malformed_body_gets_json_error() {
        let resp = generate_handler(parse(r#"{"depth": "x"}"#).await).await;
        assert!(resp.status().is_client_error());
        assert!(!error_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn small_profile_succeeds() {
        let body = r#"{"width": 32, "height": 32, "depth": 3}"#;
        let resp = generate_handler(parse(body).await).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["profile"].as_array().unwrap().len(), 9);
        assert!(json["data_url"].as_str().unwrap().starts_with("data:image/png;base64,"));
    }
}
