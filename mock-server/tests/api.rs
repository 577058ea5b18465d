use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, CaseStudy, LoginResponse, Note, Requirement, RequirementStatus, SiteContent};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn detail(response: axum::response::Response) -> String {
    let body: serde_json::Value = body_json(response).await;
    body["detail"].as_str().unwrap().to_string()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

/// Log in as the default admin. `Router` clones share state.
async fn login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email":"admin@example.com","password":"changeme"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let login: LoginResponse = body_json(resp).await;
    login.access_token
}

const REQUIREMENT: &str =
    r#"{"name":"John","email":"j@test.com","title":"Test","description":"Desc","type":"contract"}"#;

// --- health / auth ---

#[tokio::test]
async fn health_is_ok() {
    let resp = app().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_with_wrong_password_returns_401() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email":"admin@example.com","password":"wrong"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Invalid email or password");
}

#[tokio::test]
async fn admin_without_header_returns_403() {
    let resp = app().oneshot(get("/api/admin/requirements", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(detail(resp).await, "Not authenticated");
}

#[tokio::test]
async fn admin_with_unknown_token_returns_401() {
    let resp = app()
        .oneshot(get("/api/admin/requirements", Some("forged")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Invalid or expired token");
}

// --- requirements ---

#[tokio::test]
async fn submit_requirement_returns_201_with_defaults() {
    let resp = app()
        .oneshot(json_request("POST", "/api/public/requirements", None, REQUIREMENT))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let requirement: Requirement = body_json(resp).await;
    assert_eq!(requirement.title, "Test");
    assert_eq!(requirement.status, RequirementStatus::New);
    assert_eq!(requirement.progress, 0);
}

#[tokio::test]
async fn submit_requirement_malformed_json_is_rejected() {
    let resp = app()
        .oneshot(json_request("POST", "/api/public/requirements", None, r#"{"name":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn requirement_lifecycle() {
    let app = app();
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/public/requirements", None, REQUIREMENT))
        .await
        .unwrap();
    let created: Requirement = body_json(resp).await;
    let id = created.id;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/admin/requirements/{id}/status"),
            Some(&token),
            r#"{"status":"in_progress"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Requirement = body_json(resp).await;
    assert_eq!(updated.status, RequirementStatus::InProgress);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/admin/requirements/{id}/progress"),
            Some(&token),
            r#"{"progress":150}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/admin/requirements/{id}/progress"),
            Some(&token),
            r#"{"progress":60}"#,
        ))
        .await
        .unwrap();
    let updated: Requirement = body_json(resp).await;
    assert_eq!(updated.progress, 60);

    for content in ["first", "second"] {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/admin/requirements/{id}/notes"),
                Some(&token),
                &format!(r#"{{"content":"{content}"}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app
        .clone()
        .oneshot(get(&format!("/api/admin/requirements/{id}/notes"), Some(&token)))
        .await
        .unwrap();
    let notes: Vec<Note> = body_json(resp).await;
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].content, "second");

    let resp = app
        .clone()
        .oneshot(get("/api/admin/requirements", Some(&token)))
        .await
        .unwrap();
    let all: Vec<Requirement> = body_json(resp).await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
}

#[tokio::test]
async fn unknown_requirement_returns_404_detail() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(get(
            "/api/admin/requirements/00000000-0000-0000-0000-000000000000/notes",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(detail(resp).await, "Requirement not found");
}

#[tokio::test]
async fn bad_uuid_returns_400() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(get("/api/admin/requirements/not-a-uuid", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- case studies ---

const CASE_STUDY: &str = r#"{"slug":"fintech","title":"Payments","role":"Lead","description":"D",
    "industry":"Finance","technologies":[{"name":"Rust","category":"Language"}],"featured":true,
    "metrics":[{"value":"60%","label":"Faster"}],"visual_color":"accent","visual_icon":"bolt",
    "display_order":1,"is_active":true}"#;

#[tokio::test]
async fn case_study_delete_deactivates() {
    let app = app();
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/admin/case-studies", Some(&token), CASE_STUDY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let study: CaseStudy = body_json(resp).await;
    assert_eq!(study.visual.color, "accent");

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/admin/case-studies", Some(&token), CASE_STUDY))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(resp).await, "Slug 'fintech' already exists");

    let resp = app
        .clone()
        .oneshot(get("/api/public/case-studies/fintech", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/admin/case-studies/{}", study.id))
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app
        .clone()
        .oneshot(get("/api/public/case-studies", None))
        .await
        .unwrap();
    let public: Vec<CaseStudy> = body_json(resp).await;
    assert!(public.is_empty());

    let resp = app
        .clone()
        .oneshot(get(&format!("/api/admin/case-studies/{}", study.id), Some(&token)))
        .await
        .unwrap();
    let admin_view: CaseStudy = body_json(resp).await;
    assert!(!admin_view.is_active);
}

#[tokio::test]
async fn case_study_partial_update() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/admin/case-studies", Some(&token), CASE_STUDY))
        .await
        .unwrap();
    let study: CaseStudy = body_json(resp).await;

    let resp = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/admin/case-studies/{}", study.id),
            Some(&token),
            r#"{"title":"Updated","visual_icon":"star"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: CaseStudy = body_json(resp).await;
    assert_eq!(updated.title, "Updated");
    assert_eq!(updated.visual.icon, "star");
    assert_eq!(updated.visual.color, "accent");
    assert_eq!(updated.slug, "fintech");
}

// --- site content ---

#[tokio::test]
async fn site_content_crud_and_key_filter() {
    let app = app();
    let token = login(&app).await;

    for key in ["hero", "about"] {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/admin/site-content",
                Some(&token),
                &format!(r#"{{"key":"{key}","content":"copy for {key}"}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app
        .clone()
        .oneshot(get("/api/public/site-content?key=hero", None))
        .await
        .unwrap();
    let hero: Vec<SiteContent> = body_json(resp).await;
    assert_eq!(hero.len(), 1);
    assert_eq!(hero[0].content, "copy for hero");

    let resp = app
        .clone()
        .oneshot(get("/api/admin/site-content", Some(&token)))
        .await
        .unwrap();
    let all: Vec<SiteContent> = body_json(resp).await;
    assert_eq!(all.iter().map(|i| i.key.as_str()).collect::<Vec<_>>(), ["about", "hero"]);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/admin/site-content/{}", hero[0].id),
            Some(&token),
            r#"{"key":"about"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let delete = |id: uuid::Uuid| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/site-content/{id}"))
            .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
            .body(String::new())
            .unwrap()
    };
    let resp = app.clone().oneshot(delete(hero[0].id)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = app.clone().oneshot(delete(hero[0].id)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- seeded public data ---

#[tokio::test]
async fn services_and_testimonials_are_seeded() {
    let app = app();
    let resp = app.clone().oneshot(get("/api/public/services", None)).await.unwrap();
    let services: Vec<serde_json::Value> = body_json(resp).await;
    assert!(!services.is_empty());

    let slug = services[0]["slug"].as_str().unwrap().to_string();
    let resp = app
        .clone()
        .oneshot(get(&format!("/api/public/services/{slug}"), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(get("/api/public/services/missing", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.oneshot(get("/api/public/testimonials", None)).await.unwrap();
    let testimonials: Vec<serde_json::Value> = body_json(resp).await;
    assert!(!testimonials.is_empty());
}

// --- uploads ---

#[tokio::test]
async fn upload_returns_url() {
    let app = app();
    let token = login(&app).await;
    let boundary = "X-BOUNDARY";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"logo.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
    );
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/uploads")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    http::header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = body_json(resp).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with("-logo.png"));
}
