use actix_web::{HttpResponse, web};
use chrono::Utc;
use log::{error, info, warn};
use serde_json::json;
use shared::{HealthResponse, PredictionRequest, PredictionResponse};

use crate::ml::PredictionError;
use crate::ml::artifacts::{CLASSIFICATION_ALGORITHM, REGRESSION_ALGORITHM};
use crate::ml::service::ModelState;

pub const API_TITLE: &str = "Vehicle Price Prediction API";
pub const API_VERSION: &str = "1.0.0";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/model-info").route(web::get().to(model_info)));
}

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "message": API_TITLE,
        "data": { "version": API_VERSION }
    }))
}

async fn health(state: web::Data<ModelState>) -> HttpResponse {
    let loaded = state.is_loaded();
    let response = HealthResponse {
        status: if loaded { "healthy" } else { "unhealthy" }.to_string(),
        service_status: if loaded { "available" } else { "unavailable" }.to_string(),
        models_status: if loaded { "loaded" } else { "not loaded" }.to_string(),
        timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
    };
    HttpResponse::Ok().json(response)
}

async fn predict(
    state: web::Data<ModelState>,
    request: web::Json<PredictionRequest>,
) -> HttpResponse {
    info!("Prediction request received: {:?}", request.0);
    match state.service().and_then(|service| service.predict(&request)) {
        Ok(outcome) => {
            info!("Prediction completed: {}", outcome.predicted_price);
            HttpResponse::Ok().json(PredictionResponse {
                status: "success".to_string(),
                message: Some("prediction completed".to_string()),
                data: Some(outcome),
                error: None,
            })
        }
        Err(e) => error_response(e),
    }
}

async fn model_info(state: web::Data<ModelState>) -> HttpResponse {
    match state.service() {
        Ok(service) => HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "model information",
            "data": {
                "regression_model": REGRESSION_ALGORITHM,
                "classification_model": CLASSIFICATION_ALGORITHM,
                "preprocessor": service.preprocessor_summary(),
                "status": "loaded"
            }
        })),
        Err(e) => error_response(e),
    }
}

/// Single translation point from pipeline failures to HTTP status codes.
fn error_response(error: PredictionError) -> HttpResponse {
    let body = PredictionResponse {
        status: "error".to_string(),
        message: Some(match &error {
            PredictionError::Unavailable => {
                "prediction service is not ready; model artifacts are not loaded".to_string()
            }
            PredictionError::InvalidInput { field, .. } => {
                format!("invalid input in field {field}")
            }
            PredictionError::Inference(_) => "internal error during prediction".to_string(),
        }),
        data: None,
        error: Some(error.to_string()),
    };
    match error {
        PredictionError::Unavailable => {
            warn!("Rejected prediction request: service unavailable");
            HttpResponse::ServiceUnavailable().json(body)
        }
        PredictionError::InvalidInput { .. } => {
            warn!("Rejected prediction request: {error}");
            HttpResponse::BadRequest().json(body)
        }
        PredictionError::Inference(_) => {
            error!("Prediction failed: {error}");
            HttpResponse::InternalServerError().json(body)
        }
    }
}
