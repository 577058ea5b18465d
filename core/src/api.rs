//! Async endpoint functions.
//!
//! `ApiClient` pairs a `PortfolioClient` with a `Transport`. Each method
//! builds the request, sends it once, and parses the result. Failures to
//! get a response become `ApiError` with status `0`, while a request the
//! transport could not build becomes `ClientError::InvalidRequest`. Nothing
//! is retried or cached, and the session is only touched by
//! `login_and_store`/`logout`.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::{parse_json, parse_no_content, PortfolioClient};
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport, TransportError};
use crate::types::{
    CaseStudy, CaseStudyUpdate, LoginResponse, NewCaseStudy, NewRequirement, NewSiteContent, Note,
    Requirement, RequirementStatus, Service, SiteContent, SiteContentUpdate, Testimonial,
    UploadResponse,
};

#[derive(Debug, Clone)]
pub struct ApiClient<T = ReqwestTransport> {
    routes: PortfolioClient,
    transport: T,
}

impl ApiClient<ReqwestTransport> {
    pub fn new(base_url: &str, session: Session) -> Self {
        Self::with_transport(base_url, session, ReqwestTransport::new())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url, config.session())
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(base_url: &str, session: Session, transport: T) -> Self {
        Self {
            routes: PortfolioClient::new(base_url, session),
            transport,
        }
    }

    /// The request builder, for callers that drive their own I/O.
    pub fn routes(&self) -> &PortfolioClient {
        &self.routes
    }

    pub fn session(&self) -> &Session {
        self.routes.session()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        match self.transport.send(request).await {
            Ok(response) => Ok(response),
            Err(TransportError::Unreachable(reason)) => {
                warn!(error = %reason, "no response from server");
                Err(ApiError::unreachable().into())
            }
            Err(TransportError::InvalidRequest(reason)) => {
                warn!(error = %reason, "request not sent");
                Err(ClientError::InvalidRequest(reason))
            }
        }
    }

    async fn fetch<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, ClientError> {
        let response = self.execute(request).await?;
        parse_json(&response)
    }

    async fn fetch_no_content(&self, request: HttpRequest) -> Result<(), ClientError> {
        let response = self.execute(request).await?;
        parse_no_content(&response)
    }

    // -- public ------------------------------------------------------------

    pub async fn submit_requirement(&self, input: &NewRequirement) -> Result<Requirement, ClientError> {
        self.fetch(self.routes.build_submit_requirement(input)?).await
    }

    /// Trade credentials for a token. Does not store it; see
    /// [`ApiClient::login_and_store`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        self.fetch(self.routes.build_login(email, password)?).await
    }

    pub async fn list_case_studies(&self) -> Result<Vec<CaseStudy>, ClientError> {
        self.fetch(self.routes.build_list_case_studies()).await
    }

    pub async fn get_case_study(&self, slug: &str) -> Result<CaseStudy, ClientError> {
        self.fetch(self.routes.build_get_case_study(slug)).await
    }

    pub async fn list_services(&self) -> Result<Vec<Service>, ClientError> {
        self.fetch(self.routes.build_list_services()).await
    }

    pub async fn get_service(&self, slug: &str) -> Result<Service, ClientError> {
        self.fetch(self.routes.build_get_service(slug)).await
    }

    pub async fn list_testimonials(&self) -> Result<Vec<Testimonial>, ClientError> {
        self.fetch(self.routes.build_list_testimonials()).await
    }

    pub async fn list_site_content(&self, key: Option<&str>) -> Result<Vec<SiteContent>, ClientError> {
        self.fetch(self.routes.build_list_site_content(key)).await
    }

    // -- session -----------------------------------------------------------

    /// Log in and keep the returned token for subsequent calls.
    pub async fn login_and_store(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let response = self.login(email, password).await?;
        self.session().set_token(Some(&response.access_token));
        Ok(response)
    }

    pub fn logout(&self) {
        self.session().clear();
    }

    // -- admin: requirements -----------------------------------------------

    pub async fn list_requirements(&self) -> Result<Vec<Requirement>, ClientError> {
        self.fetch(self.routes.build_list_requirements()).await
    }

    pub async fn get_requirement(&self, id: Uuid) -> Result<Requirement, ClientError> {
        self.fetch(self.routes.build_get_requirement(id)).await
    }

    pub async fn update_requirement_status(
        &self,
        id: Uuid,
        status: RequirementStatus,
    ) -> Result<Requirement, ClientError> {
        self.fetch(self.routes.build_update_requirement_status(id, status)?).await
    }

    pub async fn update_requirement_progress(&self, id: Uuid, progress: i32) -> Result<Requirement, ClientError> {
        self.fetch(self.routes.build_update_requirement_progress(id, progress)?).await
    }

    pub async fn list_notes(&self, requirement_id: Uuid) -> Result<Vec<Note>, ClientError> {
        self.fetch(self.routes.build_list_notes(requirement_id)).await
    }

    pub async fn create_note(&self, requirement_id: Uuid, content: &str) -> Result<Note, ClientError> {
        self.fetch(self.routes.build_create_note(requirement_id, content)?).await
    }

    // -- admin: case studies -----------------------------------------------

    pub async fn list_case_studies_admin(&self) -> Result<Vec<CaseStudy>, ClientError> {
        self.fetch(self.routes.build_list_case_studies_admin()).await
    }

    pub async fn get_case_study_admin(&self, id: Uuid) -> Result<CaseStudy, ClientError> {
        self.fetch(self.routes.build_get_case_study_admin(id)).await
    }

    pub async fn create_case_study(&self, input: &NewCaseStudy) -> Result<CaseStudy, ClientError> {
        self.fetch(self.routes.build_create_case_study(input)?).await
    }

    pub async fn update_case_study(&self, id: Uuid, input: &CaseStudyUpdate) -> Result<CaseStudy, ClientError> {
        self.fetch(self.routes.build_update_case_study(id, input)?).await
    }

    pub async fn deactivate_case_study(&self, id: Uuid) -> Result<(), ClientError> {
        self.fetch_no_content(self.routes.build_deactivate_case_study(id)).await
    }

    // -- admin: site content -----------------------------------------------

    pub async fn list_site_content_admin(&self) -> Result<Vec<SiteContent>, ClientError> {
        self.fetch(self.routes.build_list_site_content_admin()).await
    }

    pub async fn create_site_content(&self, input: &NewSiteContent) -> Result<SiteContent, ClientError> {
        self.fetch(self.routes.build_create_site_content(input)?).await
    }

    pub async fn update_site_content(&self, id: Uuid, input: &SiteContentUpdate) -> Result<SiteContent, ClientError> {
        self.fetch(self.routes.build_update_site_content(id, input)?).await
    }

    pub async fn delete_site_content(&self, id: Uuid) -> Result<(), ClientError> {
        self.fetch_no_content(self.routes.build_delete_site_content(id)).await
    }

    // -- admin: uploads ----------------------------------------------------

    pub async fn upload_file(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        self.fetch(self.routes.build_upload_file(file_name, content_type, bytes)?).await
    }
}
