use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::history::{AssignerKind, AssignerRecord, SeatZone, StoreError};
use crate::orchestrator::Orchestrator;

pub const USER_HEADER: &str = "X-User-Id";

pub struct AppState {
    pub orchestrator: Orchestrator,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignerRequest {
    pub id: Option<String>,
    pub name: String,
    pub kind: AssignerKind,
    pub items: Vec<String>,
    #[serde(default)]
    pub zones: Vec<SeatZone>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub group_ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignerSummary {
    id: String,
    name: String,
    kind: AssignerKind,
    items: Vec<String>,
    zones: Vec<SeatZone>,
    version: u64,
    has_history: bool,
}

fn user_id(req: &HttpRequest) -> String {
    req.headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_string()
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "message": "Unauthorized"}))
}

/// Lowercase, dash-separated id derived from a display name
fn slug(name: &str) -> String {
    let mut out = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

// Create assigner endpoint
async fn create_assigner(
    req: HttpRequest,
    body: web::Json<CreateAssignerRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let owner = user_id(&req);
    if owner.is_empty() {
        return Ok(unauthorized());
    }

    let body = body.into_inner();
    if body.name.trim().is_empty() || body.items.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": "An assigner needs a name and at least one item"
        })));
    }
    let id = body
        .id
        .unwrap_or_else(|| format!("{}-{}", slug(&body.name), Utc::now().timestamp_millis()));
    let record = AssignerRecord::new(&id, &owner, body.name.trim(), body.kind, body.items).with_zones(body.zones);

    match state.orchestrator.store().create(record).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "id": id}))),
        Err(StoreError::AlreadyExists(_)) => Ok(HttpResponse::Conflict().json(serde_json::json!({
            "success": false,
            "message": format!("An assigner with id {} already exists", id)
        }))),
        Err(StoreError::InvalidId(_)) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": format!("Invalid assigner id: {}", id)
        }))),
        Err(e) => {
            tracing::error!(assigner_id = %id, error = %e, "Failed to create assigner");
            Err(actix_web::error::ErrorInternalServerError("Failed to create assigner"))
        }
    }
}

// Assigner summary endpoint
async fn get_assigner(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let owner = user_id(&req);
    if owner.is_empty() {
        return Ok(unauthorized());
    }

    let loaded = state.orchestrator.store().load(path.as_str()).await.map_err(|e| {
        tracing::error!(assigner_id = %path.as_str(), error = %e, "Failed to load assigner");
        actix_web::error::ErrorInternalServerError("Failed to load assigner")
    })?;

    match loaded.filter(|r| r.owner_id == owner) {
        Some(record) => Ok(HttpResponse::Ok().json(AssignerSummary {
            has_history: record.has_history(),
            id: record.id,
            name: record.name,
            kind: record.kind,
            items: record.items,
            zones: record.zones,
            version: record.version,
        })),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"success": false, "message": "Assigner not found"}))),
    }
}

// Run endpoint; validation failures come back as `success: false` in the body
async fn run_assigner(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<RunRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let response = state
        .orchestrator
        .run_assigner(&user_id(&req), &body.class_id, path.as_str(), &body.group_ids)
        .await;
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/assigners", web::post().to(create_assigner))
        .route("/api/assigners/{id}", web::get().to(get_assigner))
        .route("/api/assigners/{id}/run", web::post().to(run_assigner));
}

pub async fn start_server(port: u16, orchestrator: Orchestrator) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState { orchestrator });

    tracing::info!(port, "Starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
