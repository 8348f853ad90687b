//! HTTP 服务 - 编排层
//!
//! ## 职责
//!
//! - 组装路由和各业务能力（照片、LLM、飞书）
//! - 每个请求独立走完自己的流水线，服务间不共享可变状态
//! - 把应用错误映射为 HTTP 状态码（见 `error.rs`）

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::Config;
use crate::services::{FeishuService, LlmService, PhotoService};

/// 上传请求体上限（与前端约定一致）
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// 路由共享的应用状态
///
/// 全部是只读服务句柄，请求之间没有需要协调的可变状态。
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub photos: Arc<PhotoService>,
    pub llm: Arc<LlmService>,
    pub feishu: Arc<FeishuService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            photos: Arc::new(PhotoService::new(&config)),
            llm: Arc::new(LlmService::new(&config)),
            feishu: Arc::new(FeishuService::new(&config)),
            config: Arc::new(config),
        }
    }
}

/// 组装路由
pub fn build_router(state: AppState) -> Router {
    let uploads_dir = state.config.uploads_dir.clone();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/upload-photos", post(handlers::upload_photos))
        .route("/api/generate-diary", post(handlers::generate_diary))
        .route("/api/export-word", post(handlers::export_word))
        .route("/api/preview", post(handlers::preview_diary))
        .route("/api/save-to-feishu", post(handlers::save_to_feishu))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 启动 HTTP 服务
pub async fn run(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(config);

    // 确保上传目录存在
    state.photos.ensure_uploads_dir()?;

    let router = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("服务器运行在 http://localhost:{}", port);
    axum::serve(listener, router).await?;

    Ok(())
}
