//! In-memory stand-in for the portfolio REST API.
//!
//! Serves the routes under `/api` with the same JSON shapes and
//! `{"detail": ...}` error envelope as the real backend. State lives in a
//! single `RwLock` and is lost when the process exits.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number, got {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            admin_email: "admin@example.com".to_string(),
            admin_password: "changeme".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => defaults.port,
        };
        Ok(Self {
            port,
            admin_email: std::env::var("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
        })
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    FullTime,
    Contract,
    OneOff,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    New,
    Accepted,
    InProgress,
    Completed,
    Rejected,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RequirementType,
    pub tech_stack: Option<String>,
    pub timeline: Option<String>,
    pub status: RequirementStatus,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateRequirement {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RequirementType,
    pub tech_stack: Option<String>,
    pub timeline: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: RequirementStatus,
}

#[derive(Deserialize)]
pub struct ProgressUpdate {
    pub progress: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub requirement_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateNote {
    pub content: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Technology {
    pub name: String,
    pub category: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metric {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GalleryItem {
    pub url: String,
    pub caption: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Visual {
    pub color: String,
    pub icon: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseStudy {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub role: String,
    pub description: String,
    pub industry: String,
    pub technologies: Vec<Technology>,
    pub featured: bool,
    pub metrics: Option<Vec<Metric>>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub role_description: Option<String>,
    pub key_features: Option<Vec<String>>,
    pub architecture: Option<String>,
    pub challenges: Option<String>,
    pub impact: Option<String>,
    pub gallery: Option<Vec<GalleryItem>>,
    pub visual: Visual,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_color() -> String {
    "primary".to_string()
}

fn default_icon() -> String {
    "code".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct CreateCaseStudy {
    pub slug: String,
    pub title: String,
    pub role: String,
    pub description: String,
    pub industry: String,
    #[serde(default)]
    pub technologies: Vec<Technology>,
    #[serde(default)]
    pub featured: bool,
    pub metrics: Option<Vec<Metric>>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub role_description: Option<String>,
    pub key_features: Option<Vec<String>>,
    pub architecture: Option<String>,
    pub challenges: Option<String>,
    pub impact: Option<String>,
    pub gallery: Option<Vec<GalleryItem>>,
    #[serde(default = "default_color")]
    pub visual_color: String,
    #[serde(default = "default_icon")]
    pub visual_icon: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Deserialize, Default)]
pub struct UpdateCaseStudy {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub technologies: Option<Vec<Technology>>,
    pub featured: Option<bool>,
    pub metrics: Option<Vec<Metric>>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub role_description: Option<String>,
    pub key_features: Option<Vec<String>>,
    pub architecture: Option<String>,
    pub challenges: Option<String>,
    pub impact: Option<String>,
    pub gallery: Option<Vec<GalleryItem>>,
    pub visual_color: Option<String>,
    pub visual_icon: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteContent {
    pub id: Uuid,
    pub key: String,
    pub title: Option<String>,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateSiteContent {
    pub key: String,
    pub title: Option<String>,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct UpdateSiteContent {
    pub key: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct SiteContentQuery {
    pub key: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: Uuid,
    pub author_name: String,
    pub author_role: String,
    pub author_company: String,
    pub author_initials: String,
    pub content: String,
    pub rating: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rejected request, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    detail: String,
}

impl ApiFailure {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything the server knows. Vectors keep insertion order.
#[derive(Default)]
pub struct Store {
    requirements: Vec<Requirement>,
    notes: Vec<Note>,
    case_studies: Vec<CaseStudy>,
    site_content: Vec<SiteContent>,
    services: Vec<Service>,
    testimonials: Vec<Testimonial>,
    tokens: HashSet<String>,
}

impl Store {
    fn seeded() -> Self {
        let now = Utc::now();
        let services = vec![
            Service {
                id: Uuid::new_v4(),
                slug: "backend-engineering".to_string(),
                title: "Backend Engineering".to_string(),
                description: "APIs, data pipelines and the infrastructure behind them.".to_string(),
                icon: "server".to_string(),
                tags: vec!["Rust".to_string(), "PostgreSQL".to_string()],
                created_at: now,
                updated_at: now,
            },
            Service {
                id: Uuid::new_v4(),
                slug: "frontend-development".to_string(),
                title: "Frontend Development".to_string(),
                description: "Fast, accessible interfaces.".to_string(),
                icon: "layout".to_string(),
                tags: vec!["TypeScript".to_string(), "React".to_string()],
                created_at: now,
                updated_at: now,
            },
        ];
        let testimonials = vec![Testimonial {
            id: Uuid::new_v4(),
            author_name: "Jane Doe".to_string(),
            author_role: "CTO".to_string(),
            author_company: "Acme".to_string(),
            author_initials: "JD".to_string(),
            content: "Delivered ahead of schedule.".to_string(),
            rating: 5,
            featured: true,
            created_at: now,
            updated_at: now,
        }];
        Self {
            services,
            testimonials,
            ..Self::default()
        }
    }

    fn requirement(&self, id: Uuid) -> Result<&Requirement, ApiFailure> {
        self.requirements
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiFailure::not_found("Requirement"))
    }

    fn case_study(&self, id: Uuid) -> Result<&CaseStudy, ApiFailure> {
        self.case_studies
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ApiFailure::not_found("Case study"))
    }

    fn requirement_mut(&mut self, id: Uuid) -> Result<&mut Requirement, ApiFailure> {
        self.requirements
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiFailure::not_found("Requirement"))
    }

    fn case_study_mut(&mut self, id: Uuid) -> Result<&mut CaseStudy, ApiFailure> {
        self.case_studies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ApiFailure::not_found("Case study"))
    }

    fn site_content_mut(&mut self, id: Uuid) -> Result<&mut SiteContent, ApiFailure> {
        self.site_content
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiFailure::not_found("Site content"))
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    db: Db,
}

pub fn app() -> Router {
    app_with_config(ServerConfig::default())
}

pub fn app_with_config(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(RwLock::new(Store::seeded())),
    };

    let public = Router::new()
        .route("/requirements", post(create_requirement))
        .route("/case-studies", get(list_case_studies))
        .route("/case-studies/{slug}", get(get_case_study))
        .route("/services", get(list_services))
        .route("/services/{slug}", get(get_service))
        .route("/testimonials", get(list_testimonials))
        .route("/site-content", get(list_site_content));

    let admin = Router::new()
        .route("/requirements", get(list_requirements))
        .route("/requirements/{id}", get(get_requirement))
        .route("/requirements/{id}/status", patch(update_status))
        .route("/requirements/{id}/progress", patch(update_progress))
        .route("/requirements/{id}/notes", get(list_notes).post(create_note))
        .route("/case-studies", get(list_case_studies_admin).post(create_case_study))
        .route(
            "/case-studies/{id}",
            get(get_case_study_admin)
                .patch(update_case_study)
                .delete(delete_case_study),
        )
        .route("/site-content", get(list_site_content_admin).post(create_site_content))
        .route(
            "/site-content/{id}",
            patch(update_site_content).delete(delete_site_content),
        )
        .route("/uploads", post(upload_file))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .nest("/api/public", public)
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_config(listener, ServerConfig::default()).await
}

pub async fn run_with_config(listener: TcpListener, config: ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_config(config)).await
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiFailure::new(StatusCode::FORBIDDEN, "Not authenticated"))?;
    if !state.db.read().await.tokens.contains(token) {
        return Err(ApiFailure::new(StatusCode::UNAUTHORIZED, "Invalid or expired token"));
    }
    Ok(next.run(request).await)
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiFailure> {
    if input.email != state.config.admin_email || input.password != state.config.admin_password {
        return Err(ApiFailure::new(StatusCode::UNAUTHORIZED, "Invalid email or password"));
    }
    let token = Uuid::new_v4().simple().to_string();
    state.db.write().await.tokens.insert(token.clone());
    info!(email = %input.email, "admin logged in");
    Ok(Json(LoginResponse { access_token: token }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Requirements and notes
// ---------------------------------------------------------------------------

async fn create_requirement(
    State(state): State<AppState>,
    Json(input): Json<CreateRequirement>,
) -> (StatusCode, Json<Requirement>) {
    let now = Utc::now();
    let requirement = Requirement {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
        company: input.company,
        title: input.title,
        description: input.description,
        kind: input.kind,
        tech_stack: input.tech_stack,
        timeline: input.timeline,
        status: RequirementStatus::New,
        progress: 0,
        created_at: now,
        updated_at: now,
    };
    state.db.write().await.requirements.push(requirement.clone());
    (StatusCode::CREATED, Json(requirement))
}

async fn list_requirements(State(state): State<AppState>) -> Json<Vec<Requirement>> {
    let db = state.db.read().await;
    Json(db.requirements.iter().rev().cloned().collect())
}

async fn get_requirement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Requirement>, ApiFailure> {
    let db = state.db.read().await;
    Ok(Json(db.requirement(id)?.clone()))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StatusUpdate>,
) -> Result<Json<Requirement>, ApiFailure> {
    let mut db = state.db.write().await;
    let requirement = db.requirement_mut(id)?;
    requirement.status = input.status;
    requirement.updated_at = Utc::now();
    Ok(Json(requirement.clone()))
}

async fn update_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProgressUpdate>,
) -> Result<Json<Requirement>, ApiFailure> {
    if !(0..=100).contains(&input.progress) {
        return Err(ApiFailure::bad_request("Progress must be between 0 and 100"));
    }
    let mut db = state.db.write().await;
    let requirement = db.requirement_mut(id)?;
    requirement.progress = input.progress;
    requirement.updated_at = Utc::now();
    Ok(Json(requirement.clone()))
}

async fn list_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Note>>, ApiFailure> {
    let db = state.db.read().await;
    db.requirement(id)?;
    let notes = db
        .notes
        .iter()
        .rev()
        .filter(|note| note.requirement_id == id)
        .cloned()
        .collect();
    Ok(Json(notes))
}

async fn create_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateNote>,
) -> Result<(StatusCode, Json<Note>), ApiFailure> {
    let mut db = state.db.write().await;
    db.requirement(id)?;
    let note = Note {
        id: Uuid::new_v4(),
        requirement_id: id,
        content: input.content,
        created_at: Utc::now(),
    };
    db.notes.push(note.clone());
    Ok((StatusCode::CREATED, Json(note)))
}

// ---------------------------------------------------------------------------
// Case studies
// ---------------------------------------------------------------------------

fn ordered(studies: impl Iterator<Item = CaseStudy>) -> Vec<CaseStudy> {
    let mut studies: Vec<CaseStudy> = studies.collect();
    studies.sort_by_key(|study| study.display_order);
    studies
}

async fn list_case_studies(State(state): State<AppState>) -> Json<Vec<CaseStudy>> {
    let db = state.db.read().await;
    Json(ordered(db.case_studies.iter().filter(|c| c.is_active).cloned()))
}

async fn get_case_study(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CaseStudy>, ApiFailure> {
    let db = state.db.read().await;
    db.case_studies
        .iter()
        .find(|c| c.is_active && c.slug == slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiFailure::not_found("Case study"))
}

async fn list_case_studies_admin(State(state): State<AppState>) -> Json<Vec<CaseStudy>> {
    let db = state.db.read().await;
    Json(ordered(db.case_studies.iter().cloned()))
}

async fn get_case_study_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseStudy>, ApiFailure> {
    let db = state.db.read().await;
    Ok(Json(db.case_study(id)?.clone()))
}

fn slug_taken(db: &Store, slug: &str) -> Result<(), ApiFailure> {
    if db.case_studies.iter().any(|c| c.slug == slug) {
        return Err(ApiFailure::bad_request(format!("Slug '{slug}' already exists")));
    }
    Ok(())
}

async fn create_case_study(
    State(state): State<AppState>,
    Json(input): Json<CreateCaseStudy>,
) -> Result<(StatusCode, Json<CaseStudy>), ApiFailure> {
    let mut db = state.db.write().await;
    slug_taken(&db, &input.slug)?;
    let now = Utc::now();
    let study = CaseStudy {
        id: Uuid::new_v4(),
        slug: input.slug,
        title: input.title,
        role: input.role,
        description: input.description,
        industry: input.industry,
        technologies: input.technologies,
        featured: input.featured,
        metrics: input.metrics.filter(|m| !m.is_empty()),
        problem: input.problem,
        solution: input.solution,
        role_description: input.role_description,
        key_features: input.key_features,
        architecture: input.architecture,
        challenges: input.challenges,
        impact: input.impact,
        gallery: input.gallery,
        visual: Visual {
            color: input.visual_color,
            icon: input.visual_icon,
        },
        display_order: input.display_order,
        is_active: input.is_active,
        created_at: now,
        updated_at: now,
    };
    db.case_studies.push(study.clone());
    Ok((StatusCode::CREATED, Json(study)))
}

async fn update_case_study(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCaseStudy>,
) -> Result<Json<CaseStudy>, ApiFailure> {
    let mut db = state.db.write().await;
    let current_slug = db.case_study_mut(id)?.slug.clone();
    if let Some(slug) = input.slug.as_deref().filter(|slug| *slug != current_slug) {
        slug_taken(&db, slug)?;
    }

    let study = db.case_study_mut(id)?;
    macro_rules! apply {
        ($target:ident, $source:ident; $($field:ident),* $(,)?) => {
            $(if let Some(value) = $source.$field { $target.$field = value; })*
        };
    }
    macro_rules! apply_optional {
        ($target:ident, $source:ident; $($field:ident),* $(,)?) => {
            $(if $source.$field.is_some() { $target.$field = $source.$field; })*
        };
    }
    apply!(study, input; slug, title, role, description, industry, technologies, featured, display_order, is_active);
    apply_optional!(
        study, input;
        metrics, problem, solution, role_description, key_features, architecture, challenges, impact, gallery,
    );
    if let Some(color) = input.visual_color {
        study.visual.color = color;
    }
    if let Some(icon) = input.visual_icon {
        study.visual.icon = icon;
    }
    study.updated_at = Utc::now();
    Ok(Json(study.clone()))
}

/// Soft delete: the study stays visible to admins as inactive.
async fn delete_case_study(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiFailure> {
    let mut db = state.db.write().await;
    let study = db.case_study_mut(id)?;
    study.is_active = false;
    study.updated_at = Utc::now();
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Site content
// ---------------------------------------------------------------------------

fn by_key(items: impl Iterator<Item = SiteContent>) -> Vec<SiteContent> {
    let mut items: Vec<SiteContent> = items.collect();
    items.sort_by(|a, b| a.key.cmp(&b.key));
    items
}

async fn list_site_content(
    State(state): State<AppState>,
    Query(query): Query<SiteContentQuery>,
) -> Json<Vec<SiteContent>> {
    let db = state.db.read().await;
    let items = db
        .site_content
        .iter()
        .filter(|item| query.key.as_deref().map_or(true, |key| item.key == key))
        .cloned();
    Json(by_key(items))
}

async fn list_site_content_admin(State(state): State<AppState>) -> Json<Vec<SiteContent>> {
    let db = state.db.read().await;
    Json(by_key(db.site_content.iter().cloned()))
}

fn key_taken(db: &Store, key: &str) -> Result<(), ApiFailure> {
    if db.site_content.iter().any(|item| item.key == key) {
        return Err(ApiFailure::bad_request(format!("Key '{key}' already exists")));
    }
    Ok(())
}

async fn create_site_content(
    State(state): State<AppState>,
    Json(input): Json<CreateSiteContent>,
) -> Result<(StatusCode, Json<SiteContent>), ApiFailure> {
    let mut db = state.db.write().await;
    key_taken(&db, &input.key)?;
    let now = Utc::now();
    let item = SiteContent {
        id: Uuid::new_v4(),
        key: input.key,
        title: input.title,
        content: input.content,
        metadata: input.metadata,
        created_at: now,
        updated_at: now,
    };
    db.site_content.push(item.clone());
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_site_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSiteContent>,
) -> Result<Json<SiteContent>, ApiFailure> {
    let mut db = state.db.write().await;
    let current_key = db.site_content_mut(id)?.key.clone();
    if let Some(key) = input.key.as_deref().filter(|key| *key != current_key) {
        key_taken(&db, key)?;
    }

    let item = db.site_content_mut(id)?;
    if let Some(key) = input.key {
        item.key = key;
    }
    if let Some(content) = input.content {
        item.content = content;
    }
    if input.title.is_some() {
        item.title = input.title;
    }
    if input.metadata.is_some() {
        item.metadata = input.metadata;
    }
    item.updated_at = Utc::now();
    Ok(Json(item.clone()))
}

async fn delete_site_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiFailure> {
    let mut db = state.db.write().await;
    let before = db.site_content.len();
    db.site_content.retain(|item| item.id != id);
    if db.site_content.len() == before {
        return Err(ApiFailure::not_found("Site content"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Read-only public entities
// ---------------------------------------------------------------------------

async fn list_services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.db.read().await.services.clone())
}

async fn get_service(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Service>, ApiFailure> {
    let db = state.db.read().await;
    db.services
        .iter()
        .find(|s| s.slug == slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiFailure::not_found("Service"))
}

async fn list_testimonials(State(state): State<AppState>) -> Json<Vec<Testimonial>> {
    Json(state.db.read().await.testimonials.clone())
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

async fn upload_file(mut multipart: Multipart) -> Result<(StatusCode, Json<UploadResponse>), ApiFailure> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .and_then(|name| name.rsplit(|c| c == '/' || c == '\\').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("upload")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiFailure::bad_request(e.body_text()))?;
        debug!(%file_name, size = bytes.len(), "received upload");
        let url = format!("/uploads/{}-{file_name}", Uuid::new_v4().simple());
        return Ok((StatusCode::CREATED, Json(UploadResponse { url })));
    }
    Err(ApiFailure::bad_request("No file provided"))
}
