mod config;
mod content;
mod db;
mod documents;
mod errors;
mod layout;
mod models;
mod render;
mod routes;
mod security;
mod state;
mod store;
mod verification;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::documents::{PdfSettings, ResumeService};
use crate::layout::LayoutConfig;
use crate::render::load_font;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{PgDocumentStore, PgIdentityProvider, S3BlobStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV signing API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let blobs = Arc::new(S3BlobStore::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // PDF settings: A4 layout, embedded TrueType font when configured
    let layout = LayoutConfig::default();
    layout.validate()?;
    let font = load_font(config.pdf_font_path.as_deref());
    info!(
        "PDF layout {}x{}pt, embedded font: {}",
        layout.page_width,
        layout.page_height,
        font.is_embedded()
    );
    let settings = PdfSettings {
        layout,
        font,
        institution: config.signing_institution.clone(),
    };

    let resumes = ResumeService::new(
        Arc::new(PgDocumentStore::new(db.clone())),
        blobs.clone(),
        Arc::new(PgIdentityProvider::new(db, blobs)),
        settings,
    );

    // Build app state
    let state = AppState {
        resumes: Arc::new(resumes),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "cvsign-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
