use anyhow::Result;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::ServeDir;

use super::session::Session;
use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};
use crate::auth::AuthError;
use crate::catalog::{CatalogError, ImageUpload, PaintingForm};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct LoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
    username: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RateBody {
    pub rater_id: Option<String>,
    pub rating: Option<f64>,
}

fn error_body(message: impl Into<String>) -> Json<serde_json::Value> {
    Json(json!({ "error": message.into() }))
}

fn catalog_error_response(err: CatalogError) -> Response {
    match err {
        CatalogError::Validation(msg) => (StatusCode::BAD_REQUEST, error_body(msg)).into_response(),
        CatalogError::NotFound => {
            (StatusCode::NOT_FOUND, error_body("Painting not found")).into_response()
        }
        CatalogError::UploadRejected(msg) => {
            (StatusCode::BAD_REQUEST, error_body(msg)).into_response()
        }
        CatalogError::Blob(err) => {
            error!("Blob store failure: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(err.to_string()),
            )
                .into_response()
        }
        CatalogError::Store(err) => {
            error!("Catalog store failure: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(err.to_string()),
            )
                .into_response()
        }
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn list_paintings(State(catalog): State<GuardedCatalogService>) -> Response {
    match catalog.list_public() {
        Ok(paintings) => Json(paintings).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

/// Serve an uploaded image from the media directory, sniffing the content
/// type from the file bytes.
async fn get_image(State(state): State<ServerState>, Path(file): Path<String>) -> Response {
    // Single path segment only; anything trying to climb out is a miss.
    if file.contains("..") || file.contains('/') || file.contains('\\') {
        return StatusCode::NOT_FOUND.into_response();
    }

    let file_path = state.media_dir.join(&file);
    let buffer = match tokio::fs::read(&file_path).await {
        Ok(buffer) => buffer,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    if let Some(kind) = infer::get(&buffer) {
        if kind.mime_type().starts_with("image/") {
            return Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, kind.mime_type().to_string())
                .body(buffer.into())
                .unwrap();
        }
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn rate_painting(
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
    body: Result<Json<RateBody>, JsonRejection>,
) -> Response {
    // A missing or malformed body is the same as missing fields.
    let Json(body) = body.unwrap_or_else(|_| Json(RateBody::default()));

    let Some(rater_id) = body.rater_id.filter(|r| !r.is_empty()) else {
        return (StatusCode::BAD_REQUEST, error_body("rater_id required")).into_response();
    };
    let Some(rating) = body.rating else {
        return (StatusCode::BAD_REQUEST, error_body("rating required")).into_response();
    };

    match catalog.rate(id, &rater_id, rating) {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

async fn login(
    State(state): State<ServerState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Response {
    let Json(body) = body.unwrap_or_else(|_| Json(LoginBody::default()));
    debug!("login() called for user {:?}", body.username);

    let (Some(username), Some(password)) = (
        body.username.filter(|u| !u.is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            error_body("Username and password required"),
        )
            .into_response();
    };

    match state.admin_gate.login(&username, &password).await {
        Ok(issued) => {
            let cookie_value = HeaderValue::from_str(&format!(
                "session_token={}; Path=/; HttpOnly",
                issued.token
            ))
            .expect("session cookie value");

            let mut response = Json(LoginSuccessResponse {
                token: issued.token,
                username: issued.username,
            })
            .into_response();
            response
                .headers_mut()
                .insert(header::SET_COOKIE, cookie_value);
            response
        }
        Err(AuthError::InvalidCredentials) => {
            (StatusCode::UNAUTHORIZED, error_body("Invalid credentials")).into_response()
        }
        Err(err) => {
            error!("Login failed against auth gate: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(err.to_string()),
            )
                .into_response()
        }
    }
}

async fn verify_token(session: Session) -> impl IntoResponse {
    Json(json!({ "valid": true, "username": session.username }))
}

/// Pull painting form fields and the optional image file out of a multipart
/// request. A part named `image` carrying a filename is the upload; a plain
/// text `image` part is the caller-supplied reference string.
async fn read_painting_form(
    multipart: &mut Multipart,
) -> Result<(PaintingForm, Option<ImageUpload>), Response> {
    let mut form = PaintingForm::default();
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    error_body(format!("Malformed multipart request: {}", err)),
                )
                    .into_response())
            }
        };

        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };

        let file_name = field.file_name().filter(|f| !f.is_empty()).map(str::to_string);
        if name == "image" {
            if let Some(filename) = file_name {
                let data = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(err) => {
                        return Err((
                            StatusCode::BAD_REQUEST,
                            error_body(format!("Failed to read uploaded file: {}", err)),
                        )
                            .into_response())
                    }
                };
                // An empty file input is no upload at all.
                if !data.is_empty() {
                    upload = Some(ImageUpload { filename, data });
                }
                continue;
            }
        }

        let value = match field.text().await {
            Ok(value) => value,
            Err(err) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    error_body(format!("Malformed multipart field {:?}: {}", name, err)),
                )
                    .into_response())
            }
        };

        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value),
            "price" => form.price = Some(value),
            "image" => form.image = Some(value),
            "category" => form.category = Some(value),
            "featured" => form.featured = Some(value),
            "rating" => form.rating = Some(value),
            _ => {}
        }
    }

    Ok((form, upload))
}

async fn create_painting(
    _session: Session,
    State(catalog): State<GuardedCatalogService>,
    mut multipart: Multipart,
) -> Response {
    let (form, upload) = match read_painting_form(&mut multipart).await {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    match catalog.create(form, upload).await {
        Ok(painting) => (StatusCode::CREATED, Json(painting)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

async fn update_painting(
    _session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Response {
    let (form, upload) = match read_painting_form(&mut multipart).await {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    match catalog.update(id, form, upload).await {
        Ok(painting) => Json(painting).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

async fn delete_painting(
    _session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.delete(id) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog: GuardedCatalogService,
        admin_gate: GuardedAdminGate,
        media_dir: PathBuf,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog,
            admin_gate,
            media_dir,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog: GuardedCatalogService,
    admin_gate: GuardedAdminGate,
    media_dir: PathBuf,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), catalog, admin_gate, media_dir);

    let public_routes: Router = Router::new()
        .route("/paintings", get(list_paintings))
        .route("/paintings/{id}/rate", post(rate_painting))
        .with_state(state.clone());

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/verify", get(verify_token))
        .with_state(state.clone());

    // The body cap sits well above the upload policy limit so oversize
    // uploads get the policy rejection, not a transport 413.
    let body_cap = (config.max_upload_bytes as usize).saturating_mul(4);
    let admin_routes: Router = Router::new()
        .route("/paintings", post(create_painting))
        .route("/paintings/{id}", put(update_painting))
        .route("/paintings/{id}", delete(delete_painting))
        .layer(DefaultBodyLimit::max(body_cap))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let image_routes: Router = Router::new()
        .route("/paintings/{file}", get(get_image))
        .with_state(state.clone());

    let mut app: Router = home_router
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api", public_routes)
        .merge(image_routes);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

#[allow(clippy::too_many_arguments)]
pub async fn run_server(
    catalog: GuardedCatalogService,
    admin_gate: GuardedAdminGate,
    media_dir: PathBuf,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
    max_upload_bytes: u64,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
        max_upload_bytes,
    };
    let app = make_app(config, catalog, admin_gate, media_dir)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
