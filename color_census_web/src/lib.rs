use std::path::PathBuf;
use std::time::Duration;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use color_census::core_modules::sampling;
use color_census::error::{CensusError, NamingError};
use color_census::naming::{NamingClient, NamingConfig};
use color_census::pipeline::{CensusConfig, CensusPipeline, MAX_CLUSTERS, MIN_CLUSTERS};
use leptos::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Directory whose raster files populate the image selector.
    pub image_dir: PathBuf,
    pub naming_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4334".to_string(),
            image_dir: PathBuf::from("img"),
            naming_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Reads overrides from `CENSUS_ADDR`, `CENSUS_IMAGE_DIR` and
    /// `CENSUS_NAMING_TIMEOUT_SECS`, keeping defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("CENSUS_ADDR") { if !addr.is_empty() { config.bind_addr = addr; } }
        if let Ok(dir) = std::env::var("CENSUS_IMAGE_DIR") { if !dir.is_empty() { config.image_dir = PathBuf::from(dir); } }
        if let Ok(secs) = std::env::var("CENSUS_NAMING_TIMEOUT_SECS") { if let Ok(secs) = secs.parse::<u64>() { config.naming_timeout = Duration::from_secs(secs); } }
        config
    }
}

#[derive(Clone)]
struct AppState {
    config: ServerConfig,
    namer: NamingClient,
}

pub fn build_router(config: ServerConfig) -> anyhow::Result<Router> {
    let namer = NamingClient::new(&NamingConfig {
        timeout: config.naming_timeout,
        ..NamingConfig::default()
    })?;
    let state = AppState { config, namer };
    Ok(Router::new()
        .route("/", get(index))
        .route("/app.js", get(client_js))
        .route("/api/census", get(census))
        .route("/images/:name", get(image_bytes))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state))
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let bind_addr = config.bind_addr.clone();
    let image_dir = config.image_dir.display().to_string();
    let app = build_router(config)?;
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("Census server listening on http://{bind_addr} (images from {image_dir})");
    axum::serve(listener, app).await?;
    Ok(())
}

// Leptos SSR shell. Selection state lives client-side in /app.js, which
// re-runs the census whenever either selector changes.
#[component]
fn App(images: Vec<String>) -> impl IntoView {
    let image_options = images
        .into_iter()
        .map(|name| view! { <option value=name.clone()>{name}</option> })
        .collect_view();
    let cluster_options = (MIN_CLUSTERS..=MAX_CLUSTERS)
        .map(|k| view! { <option value=k.to_string()>{k.to_string()}</option> })
        .collect_view();
    view! {
        <main style="display:flex; gap:24px; margin:16px; font-family:sans-serif;">
            <aside style="min-width:240px; display:flex; flex-direction:column; gap:12px;">
                <label>"Select a file"</label>
                <select id="image-select">{image_options}</select>
                <label>"Select number of clusters"</label>
                <select id="cluster-select">{cluster_options}</select>
            </aside>
            <section style="flex:1;">
                <h2>"KMeans Image Predominant Colors Detection"</h2>
                <span id="status" style="font-family:monospace; font-size:12px; color:#777">"idle"</span>
                <div id="results" style="margin-top:12px;"></div>
            </section>
            <script src="/app.js"></script>
        </main>
    }
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let images = sampling::list_images(&state.config.image_dir)?;
    let body = leptos::ssr::render_to_string(move || view! { <App images=images/> }).to_string();
    Ok(Html(page(&body)))
}

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset='utf-8'/><title>Color Census</title></head><body>{body}</body></html>"
    )
}

// Client script driving the selectors. Fetches a fresh census per change and
// renders one block per detected color.
const CLIENT_JS: &str = r#"(function(){
    const status = (t)=>{ const el=document.getElementById('status'); if(el) el.textContent=t; };
    const imageSelect = document.getElementById('image-select');
    const clusterSelect = document.getElementById('cluster-select');
    const results = document.getElementById('results');

    const block = (entry)=>{
        const row = document.createElement('div');
        row.style.cssText = 'display:flex; gap:12px; align-items:center; margin:8px 0;';
        const swatch = document.createElement('img');
        swatch.src = entry.swatch;
        swatch.width = 80; swatch.height = 80;
        swatch.alt = entry.name;
        const text = document.createElement('div');
        const share = (entry.share*100).toFixed(1);
        const match = entry.exact_match ? 'exact match' : ('closest named ' + entry.closest_named_hex);
        text.innerHTML = '<b>' + entry.name + '</b> ' + entry.hex + ' (' + share + '% of pixels, ' + match + ')<br/>'
            + entry.rgb_value + ' | ' + entry.hsl_value + ' | ' + entry.hsv_value;
        row.appendChild(swatch);
        row.appendChild(text);
        return row;
    };

    const render = (data)=>{
        results.innerHTML = '';
        const heading = document.createElement('p');
        heading.textContent = 'File ' + data.file + ' (' + data.width + 'x' + data.height + ')';
        results.appendChild(heading);
        const preview = document.createElement('img');
        preview.src = '/images/' + encodeURIComponent(imageSelect.value);
        preview.style.cssText = 'max-width:420px; display:block; margin:8px 0;';
        results.appendChild(preview);
        data.colors.forEach((entry)=> results.appendChild(block(entry)));
    };

    const run = ()=>{
        if(!imageSelect || !imageSelect.value){ status('no images available'); return; }
        status('analyzing...');
        const url = '/api/census?image=' + encodeURIComponent(imageSelect.value) + '&k=' + clusterSelect.value;
        fetch(url).then((resp)=>{
            if(!resp.ok){ return resp.json().then((err)=>{ throw new Error(err.message || resp.statusText); }); }
            return resp.json();
        }).then((data)=>{ render(data); status('done'); })
        .catch((e)=>{ status('failed: ' + e.message); });
    };

    if(imageSelect) imageSelect.onchange = run;
    if(clusterSelect) clusterSelect.onchange = run;
    run();
})();"#;

async fn client_js() -> Response {
    let mut resp = Response::new(axum::body::Body::from(CLIENT_JS));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/javascript"),
    );
    resp
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.kind,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<CensusError> for ApiError {
    fn from(err: CensusError) -> Self {
        let message = err.to_string();
        match err {
            CensusError::InvalidClusterCount { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_cluster_count", message)
            }
            CensusError::ImageLoad { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "image_load", message)
            }
            CensusError::EmptyImage => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "empty_image", message)
            }
            CensusError::DegenerateImage { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "degenerate_image", message)
            }
            CensusError::ImageDir { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "image_dir", message)
            }
            CensusError::Naming(_) => Self::new(StatusCode::BAD_GATEWAY, "naming_service", message),
        }
    }
}

impl From<NamingError> for ApiError {
    fn from(err: NamingError) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "naming_service", err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CensusQuery {
    image: String,
    k: usize,
}

#[derive(Debug, Serialize)]
struct CensusEntry {
    hex: String,
    rgb: [u8; 3],
    share: f32,
    name: String,
    closest_named_hex: String,
    exact_match: bool,
    rgb_value: String,
    hsl_value: String,
    hsv_value: String,
    swatch: String,
}

#[derive(Debug, Serialize)]
struct CensusResponse {
    file: String,
    width: u32,
    height: u32,
    colors: Vec<CensusEntry>,
}

async fn census(
    State(state): State<AppState>,
    Query(query): Query<CensusQuery>,
) -> Result<Json<CensusResponse>, ApiError> {
    let name = sanitize_image_name(&query.image)?;
    if !is_listed(&state, &name)? {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "unknown_image",
            format!("image {name:?} is not in the census directory"),
        ));
    }
    let path = state.config.image_dir.join(&name);
    let pipeline = CensusPipeline::new(CensusConfig {
        cluster_count: query.k,
        ..CensusConfig::default()
    });

    // The pipeline is pure CPU work, so it runs off the async workers.
    let census = tokio::task::spawn_blocking(move || pipeline.analyze_file(&path))
        .await
        .map_err(|err| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string()))??;

    let hexes: Vec<String> = census.colors.iter().map(|color| color.hex.clone()).collect();
    let named = state.namer.lookup_all(&hexes).await?;

    let colors = census
        .colors
        .iter()
        .zip(named)
        .map(|(color, named)| CensusEntry {
            hex: color.hex.clone(),
            rgb: [color.rgb.red, color.rgb.green, color.rgb.blue],
            share: color.share,
            name: named.name.value,
            closest_named_hex: named.name.closest_named_hex,
            exact_match: named.name.exact_match_name,
            rgb_value: named.rgb.value,
            hsl_value: named.hsl.value,
            hsv_value: named.hsv.value,
            swatch: named.image.bare,
        })
        .collect();

    Ok(Json(CensusResponse {
        file: census.file,
        width: census.width,
        height: census.height,
        colors,
    }))
}

fn sanitize_image_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    // With separators rejected, only the bare dot components can still
    // traverse; interior dots as in "dots..png" are legitimate filenames.
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".."
    {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "bad_image_name",
            format!("image name {name:?} is not a plain filename"),
        ));
    }
    Ok(name.to_string())
}

/// Whether `name` is one of the filenames the selector currently offers.
fn is_listed(state: &AppState, name: &str) -> Result<bool, ApiError> {
    let listed = sampling::list_images(&state.config.image_dir)?;
    Ok(listed.iter().any(|entry| entry == name))
}

async fn image_bytes(
    State(state): State<AppState>,
    UrlPath(name): UrlPath<String>,
) -> Result<Response, ApiError> {
    let name = sanitize_image_name(&name)?;
    if !is_listed(&state, &name)? {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "image_missing",
            format!("no image named {name:?}"),
        ));
    }
    let path = state.config.image_dir.join(&name);
    let bytes = tokio::fs::read(&path).await.map_err(|_| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "image_missing",
            format!("no image named {name:?}"),
        )
    })?;
    let mut resp = Response::new(axum::body::Body::from(bytes));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&name)),
    );
    Ok(resp)
}

fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    match lower.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_filenames_pass_sanitizing() {
        assert_eq!(sanitize_image_name(" photo.png ").unwrap(), "photo.png");
        assert_eq!(sanitize_image_name("Sea Shore.JPG").unwrap(), "Sea Shore.JPG");
        assert_eq!(sanitize_image_name("dots..png").unwrap(), "dots..png");
    }

    #[test]
    fn traversal_names_are_rejected() {
        for bad in ["", "  ", "../secret.png", "sub/dir.png", "back\\slash.png", ".", ".."] {
            let err = sanitize_image_name(bad).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.kind, "bad_image_name");
        }
    }

    #[test]
    fn every_listed_name_passes_sanitizing() {
        let dir = std::env::temp_dir().join(format!("census_web_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("dots..png"), b"stub").unwrap();
        std::fs::write(dir.join("plain.jpg"), b"stub").unwrap();

        let listed = sampling::list_images(&dir).unwrap();
        assert!(listed.contains(&"dots..png".to_string()));
        for name in &listed {
            assert!(
                sanitize_image_name(name).is_ok(),
                "listed {name:?} was refused"
            );
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn content_types_follow_the_extension() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.tiff"), "image/tiff");
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "image/jpeg");
    }

    #[test]
    fn census_errors_map_to_descriptive_statuses() {
        let err: ApiError = CensusError::InvalidClusterCount { requested: 99 }.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, "invalid_cluster_count");

        let err: ApiError = CensusError::EmptyImage.into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = CensusError::Naming(NamingError::Status { code: 503 }).into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.kind, "naming_service");
    }

    #[test]
    fn shell_lists_images_and_every_cluster_count() {
        let body = leptos::ssr::render_to_string(|| {
            view! { <App images=vec!["a.png".to_string(), "b.jpg".to_string()]/> }
        })
        .to_string();
        assert!(body.contains("image-select"));
        assert!(body.contains("cluster-select"));
        assert!(body.contains("a.png"));
        assert!(body.contains("b.jpg"));
        assert!(body.contains("KMeans Image Predominant Colors Detection"));
        for k in MIN_CLUSTERS..=MAX_CLUSTERS {
            assert!(body.contains(&format!("value=\"{k}\"")), "missing option for k={k}");
        }
    }
}
