//! Typed API client for the portfolio site and its admin back office.
//!
//! # Overview
//! Covers the public endpoints (requirement submission, case studies,
//! services, testimonials, site content), login, and the authenticated admin
//! endpoints (requirements and notes, case-study and site-content CRUD, file
//! upload). Every failure surfaces as one `ClientError`; the server's verdict
//! inside it is an `ApiError` with a message and an HTTP status, `0` meaning
//! no response was received.
//!
//! # Design
//! - `PortfolioClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern).
//! - `ApiClient` runs those through a `Transport`; `ReqwestTransport` is the
//!   production one, tests plug in scripted transports.
//! - The bearer token lives in an injected `Session`, read at request time,
//!   so independent clients never share state by accident.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use api::ApiClient;
pub use client::{parse_json, parse_no_content, PortfolioClient};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, CONNECTION_ERROR_MESSAGE};
pub use http::{FilePart, HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use session::{FileStorage, MemoryStorage, Session, StorageError, TokenStorage, TOKEN_KEY};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{
    CaseStudy, CaseStudyUpdate, EngagementType, GalleryItem, LoginResponse, Metric, NewCaseStudy,
    NewRequirement, NewSiteContent, Note, Requirement, RequirementStatus, Service, SiteContent,
    SiteContentUpdate, Technology, Testimonial, UploadResponse, Visual,
};
