//! 应用错误类型
//!
//! 按业务域分组：LLM 调用、飞书接口、照片存储、文档渲染，
//! 统一收拢在 [`AppError`] 下，在服务端边界映射为 HTTP 状态码。
//! 核心组装流水线内部的占位符问题（缺照片、重复引用）不是错误，
//! 在组装层就地降级处理，不会出现在这里。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API Key 未配置，请在 .env 文件中设置 DEEPSEEK_API_KEY")]
    MissingApiKey,
    #[error("LLM API Key 格式不正确，应以 \"sk-\" 开头")]
    MalformedApiKey,
    #[error("LLM API 认证失败: {message}")]
    AuthRejected { message: String },
    #[error("LLM API 请求频率受限: {message}")]
    RateLimited { message: String },
    #[error("LLM API 调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 飞书接口错误
#[derive(Debug, Error)]
pub enum FeishuError {
    #[error("飞书配置不完整，请检查 FEISHU_APP_ID / FEISHU_APP_SECRET / FEISHU_APP_TOKEN / FEISHU_TABLE_ID")]
    ConfigIncomplete,
    #[error("飞书请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("飞书认证失败: code={code}, msg={msg}")]
    AuthFailed { code: i64, msg: String },
    #[error("飞书接口返回错误 ({endpoint}): code={code}, msg={msg}")]
    BadResponse {
        endpoint: String,
        code: i64,
        msg: String,
    },
}

/// 照片上传与存储错误
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("只支持图片格式 (jpeg, jpg, png, gif, webp): {name}")]
    UnsupportedFormat { name: String },
    #[error("创建上传目录失败 ({path}): {source}")]
    DirCreateFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("保存上传文件失败 ({path}): {source}")]
    SaveFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 文档渲染错误
///
/// 单张照片读不到字节不在此列：渲染器就地跳过并记一条警告，
/// 只有整份文档无法产出时才返回错误。
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("生成 Word 文档失败: {0}")]
    Docx(#[from] docx_rs::DocxError),
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    #[error("飞书错误: {0}")]
    Feishu(#[from] FeishuError),
    #[error("照片错误: {0}")]
    Photo(#[from] PhotoError),
    #[error("渲染错误: {0}")]
    Render(#[from] RenderError),
    #[error("{0}")]
    InvalidInput(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Photo(PhotoError::UnsupportedFormat { .. }) => StatusCode::BAD_REQUEST,
            AppError::Llm(LlmError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Feishu(FeishuError::AuthFailed { .. })
            | AppError::Feishu(FeishuError::RequestFailed { .. })
            | AppError::Feishu(FeishuError::BadResponse { .. }) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!("请求处理失败: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
