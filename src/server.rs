//! JSON HTTP API.
//!
//! Serves the content graph to page renderers and client-side filter UIs.
//! Every request reads the content files again; loads run on tokio's
//! blocking pool.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/filters` | Filter vocabulary and project summaries |
//! | `GET`  | `/api/projects` | Filtered, searched, paginated listing |
//! | `GET`  | `/api/projects/{slug}` | One project with resolved tags |
//! | `GET`  | `/api/clients[/{slug}]` | Clients, or one client with its projects |
//! | `GET`  | `/api/technologies[/{slug}]` | Technologies, or one with its projects |
//! | `GET`  | `/api/tags[/{slug}]` | Tags, or one tag with its projects |
//! | `POST` | `/api/autolink` | Auto-link technology names in an HTML fragment |
//! | `GET`  | `/sitemap.xml` | Sitemap of every public page |
//!
//! `GET /api/projects` accepts `search`, `technology`, `category`,
//! `industry`, `client`, `tag` and `page`. A page outside the listing
//! answers `307` with the clamped page in `Location`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "project not found: shop" } }
//! ```

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::filter::ProjectFilter;
use crate::graph::ContentGraph;
use crate::models::{Client, Project, Tag, Technology};
use crate::paginate::{Page, Paginated};
use crate::urls;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub graph: Arc<ContentGraph>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: Arc::new(config.clone()),
            graph: Arc::new(ContentGraph::from_config(config)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/filters", get(handle_filters))
        .route("/api/projects", get(handle_projects))
        .route("/api/projects/{slug}", get(handle_project))
        .route("/api/clients", get(handle_clients))
        .route("/api/clients/{slug}", get(handle_client))
        .route("/api/technologies", get(handle_technologies))
        .route("/api/technologies/{slug}", get(handle_technology))
        .route("/api/tags", get(handle_tags))
        .route("/api/tags/{slug}", get(handle_tag))
        .route("/api/autolink", post(handle_autolink))
        .route("/sitemap.xml", get(handle_sitemap))
        .layer(cors)
        .with_state(state)
}

/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(AppState::new(config));

    tracing::info!(content = %config.content.root.display(), "serving on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Run a content load on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| internal(e.to_string()))?
        .map_err(|e| {
            tracing::error!("request failed: {:#}", e);
            internal(format!("{:#}", e))
        })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/filters ============

async fn handle_filters(State(state): State<AppState>) -> Result<Response, AppError> {
    let graph = state.graph.clone();
    let vocab = blocking(move || graph.filter_vocabulary()).await?;
    Ok(Json(vocab).into_response())
}

// ============ GET /api/projects ============

/// Listing query string. Kept flat so `page` parses as a number.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub technology: Option<String>,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub client: Option<String>,
    pub tag: Option<String>,
    pub page: Option<usize>,
}

impl ListingQuery {
    pub fn filter(&self) -> ProjectFilter {
        ProjectFilter {
            search: self.search.clone(),
            technology: self.technology.clone(),
            category: self.category.clone(),
            industry: self.industry.clone(),
            client: self.client.clone(),
            tag: self.tag.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub page: Page<Project>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug)]
pub enum ListingOutcome {
    Listing(ListingResponse),
    Redirect(String),
}

/// Resolve a listing request into a page of projects or a redirect target.
pub fn project_listing(
    graph: &ContentGraph,
    config: &Config,
    query: &ListingQuery,
) -> anyhow::Result<ListingOutcome> {
    let filter = query.filter();
    let requested = query.page.unwrap_or(1);
    let link = |page: usize| format!("/api{}", urls::listing_path(page, &filter));

    Ok(match graph.project_listing(&filter, config, requested)? {
        Paginated::Redirect { page } => ListingOutcome::Redirect(link(page)),
        Paginated::Page(page) => ListingOutcome::Listing(ListingResponse {
            prev: page.prev_page().map(link),
            next: page.next_page().map(link),
            page,
        }),
    })
}

async fn handle_projects(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Response, AppError> {
    let outcome = blocking(move || project_listing(&state.graph, &state.config, &query)).await?;
    Ok(match outcome {
        ListingOutcome::Listing(listing) => Json(listing).into_response(),
        ListingOutcome::Redirect(location) => Redirect::temporary(&location).into_response(),
    })
}

// ============ Single records ============

#[derive(Serialize)]
struct ProjectResponse {
    #[serde(flatten)]
    project: Project,
    resolved_tags: Vec<Tag>,
    canonical_url: String,
}

async fn handle_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let lookup = slug.clone();
    let found = blocking(move || {
        Ok(state.graph.project(&lookup).map(|project| ProjectResponse {
            resolved_tags: state.graph.project_tags(&project),
            canonical_url: urls::canonical_url(
                &state.config.site.base_url,
                &urls::project_path(&project.slug),
            ),
            project,
        }))
    })
    .await?;
    found
        .map(|p| Json(p).into_response())
        .ok_or_else(|| not_found(format!("project not found: {}", slug)))
}

#[derive(Serialize)]
struct WithProjects<T> {
    #[serde(flatten)]
    record: T,
    projects: Vec<Project>,
}

async fn handle_clients(State(state): State<AppState>) -> Result<Json<Vec<Client>>, AppError> {
    Ok(Json(blocking(move || state.graph.all_clients()).await?))
}

async fn handle_client(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let lookup = slug.clone();
    let found = blocking(move || {
        let Some(record) = state.graph.client(&lookup) else {
            return Ok(None);
        };
        let projects = state.graph.projects_by_client(&lookup)?;
        Ok(Some(WithProjects { record, projects }))
    })
    .await?;
    found
        .map(|c| Json(c).into_response())
        .ok_or_else(|| not_found(format!("client not found: {}", slug)))
}

async fn handle_technologies(
    State(state): State<AppState>,
) -> Result<Json<Vec<Technology>>, AppError> {
    Ok(Json(blocking(move || state.graph.all_technologies()).await?))
}

async fn handle_technology(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let lookup = slug.clone();
    let found = blocking(move || {
        let Some(record) = state.graph.technology(&lookup) else {
            return Ok(None);
        };
        let projects = state.graph.projects_by_technology(&lookup)?;
        Ok(Some(WithProjects { record, projects }))
    })
    .await?;
    found
        .map(|t| Json(t).into_response())
        .ok_or_else(|| not_found(format!("technology not found: {}", slug)))
}

async fn handle_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(blocking(move || state.graph.all_tags()).await?))
}

/// Tags always resolve, so this never answers 404.
async fn handle_tag(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let found = blocking(move || {
        let record = state.graph.tag(&slug);
        let projects = state.graph.projects_by_tag(&slug)?;
        Ok(WithProjects { record, projects })
    })
    .await?;
    Ok(Json(found).into_response())
}

// ============ POST /api/autolink ============

#[derive(Deserialize, Serialize)]
struct AutolinkBody {
    html: String,
}

async fn handle_autolink(
    State(state): State<AppState>,
    Json(body): Json<AutolinkBody>,
) -> Result<Json<AutolinkBody>, AppError> {
    let graph = state.graph.clone();
    let html = tokio::task::spawn_blocking(move || graph.autolink_fragment(&body.html))
        .await
        .map_err(|e| internal(e.to_string()))?
        .map_err(|e| bad_request(format!("{:#}", e)))?;
    Ok(Json(AutolinkBody { html }))
}

// ============ GET /sitemap.xml ============

async fn handle_sitemap(State(state): State<AppState>) -> Result<Response, AppError> {
    let xml = blocking(move || build_sitemap(&state.graph, &state.config.site.base_url)).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}

/// Sitemap of the home page, listings and every record page.
pub fn build_sitemap(graph: &ContentGraph, base_url: &str) -> anyhow::Result<String> {
    let mut entries: Vec<(String, Option<String>)> = vec![
        ("/".to_string(), None),
        ("/projects".to_string(), None),
    ];
    for p in graph.all_projects()? {
        let lastmod = p.update_date.unwrap_or(p.date).format("%Y-%m-%d").to_string();
        entries.push((urls::project_path(&p.slug), Some(lastmod)));
    }
    for c in graph.all_clients()? {
        entries.push((urls::client_path(&c.slug), None));
    }
    for t in graph.all_technologies()? {
        entries.push((urls::technology_path(&t.slug), None));
    }
    for t in graph.all_tags()? {
        entries.push((urls::tag_path(&t.slug), None));
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([(
            "xmlns",
            "http://www.sitemaps.org/schemas/sitemap/0.9",
        )]),
    ))?;
    for (path, lastmod) in entries {
        let loc = urls::canonical_url(base_url, &path);
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        writer.write_event(Event::Start(BytesStart::new("loc")))?;
        writer.write_event(Event::Text(BytesText::new(&loc)))?;
        writer.write_event(Event::End(BytesEnd::new("loc")))?;
        if let Some(lastmod) = lastmod {
            writer.write_event(Event::Start(BytesStart::new("lastmod")))?;
            writer.write_event(Event::Text(BytesText::new(&lastmod)))?;
            writer.write_event(Event::End(BytesEnd::new("lastmod")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn write(root: &std::path::Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, Config, ContentGraph) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "clients/acme.mdx", "---\nname: Acme\n---\n");
        write(root, "technologies/rust.mdx", "---\nname: Rust\n---\n");
        for (slug, date) in [("one", "2024-01-01"), ("two", "2024-02-01"), ("three", "2024-03-01")] {
            write(
                root,
                &format!("projects/{}/index.mdx", slug),
                &format!(
                    "---\ntitle: Project {}\ndate: {}\nclient: acme\npublished: true\ntechnologies: [rust]\n---\n",
                    slug, date
                ),
            );
        }
        let mut config = Config::for_root(root);
        config.listing.page_size = 2;
        config.site.base_url = "https://agency.dev".to_string();
        let graph = ContentGraph::from_config(&config);
        (tmp, config, graph)
    }

    #[test]
    fn test_listing_page_links() {
        let (_tmp, config, graph) = fixture();
        let query = ListingQuery {
            technology: Some("rust".into()),
            ..Default::default()
        };
        let ListingOutcome::Listing(listing) = project_listing(&graph, &config, &query).unwrap()
        else {
            panic!("expected listing");
        };
        assert_eq!(listing.page.items.len(), 2);
        assert_eq!(listing.page.total_pages, 2);
        assert_eq!(listing.prev, None);
        assert_eq!(
            listing.next.as_deref(),
            Some("/api/projects?technology=rust&page=2")
        );
    }

    #[test]
    fn test_listing_out_of_range_redirects() {
        let (_tmp, config, graph) = fixture();
        let query = ListingQuery {
            page: Some(5),
            ..Default::default()
        };
        match project_listing(&graph, &config, &query).unwrap() {
            ListingOutcome::Redirect(location) => assert_eq!(location, "/api/projects?page=2"),
            ListingOutcome::Listing(_) => panic!("expected redirect"),
        }
    }

    #[test]
    fn test_sitemap_lists_pages() {
        let (_tmp, config, graph) = fixture();
        let xml = build_sitemap(&graph, &config.site.base_url).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://agency.dev/</loc>"));
        assert!(xml.contains("<loc>https://agency.dev/projects/two</loc>"));
        assert!(xml.contains("<lastmod>2024-02-01</lastmod>"));
        assert!(xml.contains("<loc>https://agency.dev/technologies/rust</loc>"));
    }

    async fn send(config: &Config, request: Request<Body>) -> (StatusCode, Response) {
        let response = router(AppState::new(config))
            .oneshot(request)
            .await
            .expect("response");
        (response.status(), response)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("GET")
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_router_redirects_out_of_range_page() {
        let (_tmp, config, _graph) = fixture();
        let (status, response) = send(&config, get_request("/api/projects?technology=rust&page=9")).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/projects?technology=rust&page=2"
        );
    }

    #[tokio::test]
    async fn test_router_lists_page() {
        let (_tmp, config, _graph) = fixture();
        let (status, response) = send(&config, get_request("/api/projects?page=2")).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["current_page"], 2);
        assert_eq!(body["items"][0]["slug"], "one");
        assert_eq!(body["prev"], "/api/projects");
        assert!(body["next"].is_null());
    }

    #[tokio::test]
    async fn test_router_not_found_error_shape() {
        let (_tmp, config, _graph) = fixture();
        let (status, response) = send(&config, get_request("/api/projects/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "project not found: missing");
    }

    #[tokio::test]
    async fn test_router_rejects_encoded_traversal() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        write(&content, "clients/acme.mdx", "---\nname: Acme\n---\n");
        write(tmp.path(), "secret.mdx", "---\nname: Secret\n---\n");
        let config = Config::for_root(&content);

        let (status, _) = send(&config, get_request("/api/clients/acme")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, response) = send(&config, get_request("/api/clients/..%2F..%2Fsecret")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_router_autolink_keeps_entities() {
        let (_tmp, config, _graph) = fixture();
        let request = Request::builder()
            .uri("/api/autolink")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"html":"<p>Caf&eacute; &amp; Rust</p>"}"#))
            .expect("request");
        let (status, response) = send(&config, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(response).await["html"],
            r#"<p>Caf&eacute; &amp; <a href="/technologies/rust">Rust</a></p>"#
        );
    }
}
