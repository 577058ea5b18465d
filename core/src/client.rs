//! Request builder and response parser for the portfolio API.
//!
//! # Design
//! `PortfolioClient` holds the API base URL and a `Session` handle. Every
//! endpoint has a `build_*` method producing an `HttpRequest`; responses go
//! through [`parse_json`] or, for `204 No Content` endpoints,
//! [`parse_no_content`]. No method touches the network, so request shapes and
//! error mapping are testable as plain data.
//!
//! Headers are computed per request from the session, never cached: a login
//! between two builds is picked up by the second one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ClientError};
use crate::http::{FilePart, HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::session::Session;
use crate::types::{
    CaseStudyUpdate, LoginRequest, NewCaseStudy, NewRequirement, NewSiteContent, NoteInput,
    ProgressUpdate, RequirementStatus, SiteContentUpdate, StatusUpdate,
};

/// Form field the upload endpoint reads the file from.
pub const UPLOAD_FIELD: &str = "file";

/// Synchronous, I/O-free client for the portfolio API.
#[derive(Debug, Clone)]
pub struct PortfolioClient {
    base_url: String,
    session: Session,
}

impl PortfolioClient {
    pub fn new(base_url: &str, session: Session) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `Content-Type: application/json`, plus the bearer token when one is set.
    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        headers.extend(self.auth_header());
        headers
    }

    fn auth_header(&self) -> Option<(String, String)> {
        self.session
            .token()
            .filter(|token| !token.is_empty())
            .map(|token| ("Authorization".to_string(), format!("Bearer {token}")))
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: self.url(path),
            headers: self.headers(),
            body: None,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ClientError> {
        let body = serde_json::to_string(body).map_err(|e| ClientError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            body: Some(RequestBody::Json(body)),
            ..self.request(method, path)
        })
    }

    // -- public ------------------------------------------------------------

    pub fn build_submit_requirement(&self, input: &NewRequirement) -> Result<HttpRequest, ClientError> {
        self.json_request(HttpMethod::Post, "/public/requirements", input)
    }

    pub fn build_login(&self, email: &str, password: &str) -> Result<HttpRequest, ClientError> {
        self.json_request(HttpMethod::Post, "/auth/login", &LoginRequest { email, password })
    }

    pub fn build_list_case_studies(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/public/case-studies")
    }

    pub fn build_get_case_study(&self, slug: &str) -> HttpRequest {
        let path = format!("/public/case-studies/{}", urlencoding::encode(slug));
        self.request(HttpMethod::Get, &path)
    }

    pub fn build_list_services(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/public/services")
    }

    pub fn build_get_service(&self, slug: &str) -> HttpRequest {
        let path = format!("/public/services/{}", urlencoding::encode(slug));
        self.request(HttpMethod::Get, &path)
    }

    pub fn build_list_testimonials(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/public/testimonials")
    }

    /// Public site content, optionally narrowed to one key.
    pub fn build_list_site_content(&self, key: Option<&str>) -> HttpRequest {
        let path = match key {
            Some(key) => format!("/public/site-content?key={}", urlencoding::encode(key)),
            None => "/public/site-content".to_string(),
        };
        self.request(HttpMethod::Get, &path)
    }

    // -- admin: requirements -----------------------------------------------

    pub fn build_list_requirements(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin/requirements")
    }

    pub fn build_get_requirement(&self, id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/admin/requirements/{id}"))
    }

    pub fn build_update_requirement_status(
        &self,
        id: Uuid,
        status: RequirementStatus,
    ) -> Result<HttpRequest, ClientError> {
        let path = format!("/admin/requirements/{id}/status");
        self.json_request(HttpMethod::Patch, &path, &StatusUpdate { status })
    }

    pub fn build_update_requirement_progress(
        &self,
        id: Uuid,
        progress: i32,
    ) -> Result<HttpRequest, ClientError> {
        let path = format!("/admin/requirements/{id}/progress");
        self.json_request(HttpMethod::Patch, &path, &ProgressUpdate { progress })
    }

    pub fn build_list_notes(&self, requirement_id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/admin/requirements/{requirement_id}/notes"))
    }

    pub fn build_create_note(&self, requirement_id: Uuid, content: &str) -> Result<HttpRequest, ClientError> {
        let path = format!("/admin/requirements/{requirement_id}/notes");
        self.json_request(HttpMethod::Post, &path, &NoteInput { content })
    }

    // -- admin: case studies -----------------------------------------------

    pub fn build_list_case_studies_admin(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin/case-studies")
    }

    pub fn build_get_case_study_admin(&self, id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/admin/case-studies/{id}"))
    }

    pub fn build_create_case_study(&self, input: &NewCaseStudy) -> Result<HttpRequest, ClientError> {
        self.json_request(HttpMethod::Post, "/admin/case-studies", input)
    }

    pub fn build_update_case_study(&self, id: Uuid, input: &CaseStudyUpdate) -> Result<HttpRequest, ClientError> {
        self.json_request(HttpMethod::Patch, &format!("/admin/case-studies/{id}"), input)
    }

    /// The server answers a case-study delete by deactivating it.
    pub fn build_deactivate_case_study(&self, id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/admin/case-studies/{id}"))
    }

    // -- admin: site content -----------------------------------------------

    pub fn build_list_site_content_admin(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin/site-content")
    }

    pub fn build_create_site_content(&self, input: &NewSiteContent) -> Result<HttpRequest, ClientError> {
        self.json_request(HttpMethod::Post, "/admin/site-content", input)
    }

    pub fn build_update_site_content(
        &self,
        id: Uuid,
        input: &SiteContentUpdate,
    ) -> Result<HttpRequest, ClientError> {
        self.json_request(HttpMethod::Patch, &format!("/admin/site-content/{id}"), input)
    }

    pub fn build_delete_site_content(&self, id: Uuid) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/admin/site-content/{id}"))
    }

    // -- admin: uploads ----------------------------------------------------

    /// Multipart upload of one file. Carries only the auth header; the
    /// transport sets the multipart content type.
    pub fn build_upload_file(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<HttpRequest, ClientError> {
        let mime: mime::Mime = content_type
            .parse()
            .map_err(|e: mime::FromStrError| {
                ClientError::InvalidRequest(format!("content type {content_type:?}: {e}"))
            })?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url("/admin/uploads"),
            headers: self.auth_header().into_iter().collect(),
            body: Some(RequestBody::File(FilePart {
                field: UPLOAD_FIELD.to_string(),
                file_name: file_name.to_string(),
                content_type: mime.to_string(),
                bytes,
            })),
        })
    }
}

/// Turn a non-2xx response into the typed rejection.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let err = ApiError::from_response(response);
    debug!(status = response.status, message = err.message(), "request rejected");
    Err(err)
}

/// Parse a 2xx JSON body into `T`; non-2xx becomes `ClientError::Api`.
pub fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ClientError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Accept any 2xx without reading the body.
pub fn parse_no_content(response: &HttpResponse) -> Result<(), ClientError> {
    check_status(response)?;
    Ok(())
}
