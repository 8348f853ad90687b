//! 路由处理函数

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::Local;
use serde_json::{json, Value};
use tracing::info;

use crate::compose::{assemble, FileSizeProbe, SurfaceLimits};
use crate::error::{AppError, AppResult};
use crate::models::{Diary, DiaryRequest, GenerationMode, PhotoRecord};
use crate::render::{DocxRenderer, HtmlRenderer};
use crate::server::AppState;

/// 单次最多上传的照片数
const MAX_PHOTOS_PER_REQUEST: usize = 10;

/// 地点缺省时照片记录用的兜底地点
const UNKNOWN_LOCATION: &str = "未知地点";

/// 健康检查
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 上传表单收集到的字段
#[derive(Default)]
struct DiaryForm {
    location: Option<String>,
    date: Option<String>,
    description: Option<String>,
    diary_style: Option<String>,
    style_description: Option<String>,
    mode: Option<String>,
    title: Option<String>,
    /// (原始文件名, MIME 类型, 内容)
    files: Vec<(String, Option<String>, Vec<u8>)>,
}

async fn read_diary_form(multipart: &mut Multipart) -> AppResult<DiaryForm> {
    let mut form = DiaryForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("解析上传表单失败: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photos" => {
                let original_name = field.file_name().unwrap_or("photo").to_string();
                let content_type = field.content_type().map(|t| t.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("读取上传文件失败: {e}")))?;
                form.files.push((original_name, content_type, bytes.to_vec()));
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("读取表单字段失败: {e}")))?;
                match name.as_str() {
                    "location" => form.location = Some(value),
                    "date" => form.date = Some(value),
                    "description" => form.description = Some(value),
                    "diaryStyle" => form.diary_style = Some(value),
                    "styleDescription" => form.style_description = Some(value),
                    "mode" => form.mode = Some(value),
                    "title" => form.title = Some(value),
                    _ => {}
                }
            }
        }
    }

    if form.files.len() > MAX_PHOTOS_PER_REQUEST {
        return Err(AppError::InvalidInput(format!(
            "最多上传 {MAX_PHOTOS_PER_REQUEST} 张照片"
        )));
    }

    Ok(form)
}

/// 落盘表单里的全部照片
fn store_photos(state: &AppState, form: &DiaryForm) -> AppResult<Vec<PhotoRecord>> {
    let default_location = form
        .location
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(UNKNOWN_LOCATION);

    let mut records = Vec::with_capacity(form.files.len());
    for (original_name, content_type, bytes) in &form.files {
        let record = state.photos.store(
            original_name,
            content_type.as_deref(),
            bytes,
            Some(default_location),
        )?;
        records.push(record);
    }
    Ok(records)
}

/// 单独的照片上传接口（编辑模式追加照片用）
pub async fn upload_photos(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let form = read_diary_form(&mut multipart).await?;
    let photos = store_photos(&state, &form)?;

    info!("上传 {} 张照片", photos.len());
    Ok(Json(json!({ "success": true, "photos": photos })))
}

/// 生成日记
pub async fn generate_diary(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let form = read_diary_form(&mut multipart).await?;

    let description = form.description.clone().unwrap_or_default();
    if description.trim().is_empty() {
        return Err(AppError::InvalidInput("请提供文字描述".to_string()));
    }

    let diary_style = form
        .diary_style
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "游记".to_string());
    let location = form.location.clone().unwrap_or_default();
    let display_location = if location.trim().is_empty() {
        "未指定".to_string()
    } else {
        location
    };
    let date = form
        .date
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());

    info!("收到生成请求: 风格={}, 地点={}", diary_style, display_location);

    let photos = store_photos(&state, &form)?;

    let request = DiaryRequest {
        mode: GenerationMode::parse(form.mode.as_deref().unwrap_or("ai")),
        title: form.title.clone().unwrap_or_default(),
        date: date.clone(),
        location: display_location.clone(),
        description,
        diary_style,
        style_description: form.style_description.clone().unwrap_or_default(),
        photos: photos.clone(),
    };

    let text = state.llm.compose_diary(&request).await?;

    let diary = Diary {
        title: text.title,
        date,
        location: display_location,
        content: text.content,
        photos,
    };

    Ok(Json(json!({ "success": true, "diary": diary })))
}

/// 导出 Word 文档
pub async fn export_word(
    State(state): State<AppState>,
    Json(diary): Json<Diary>,
) -> AppResult<impl IntoResponse> {
    info!("开始生成 Word 文档: {}", diary.title);

    let probe = FileSizeProbe::new(&state.config.uploads_dir);
    let tree = assemble(&diary, SurfaceLimits::DOCUMENT, probe);
    let bytes = DocxRenderer::new(&state.config.uploads_dir).render(&tree)?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                .to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"diary.docx\"".to_string(),
        ),
    ];
    Ok((headers, bytes))
}

/// 网页预览（交互展示面）
pub async fn preview_diary(
    State(state): State<AppState>,
    Json(diary): Json<Diary>,
) -> AppResult<Html<String>> {
    let probe = FileSizeProbe::new(&state.config.uploads_dir);
    let tree = assemble(&diary, SurfaceLimits::DISPLAY, probe);
    Ok(Html(HtmlRenderer.render(&tree)))
}

/// 保存到飞书多维表格
pub async fn save_to_feishu(
    State(state): State<AppState>,
    Json(diary): Json<Diary>,
) -> AppResult<Json<Value>> {
    if diary.title.trim().is_empty() || diary.content.trim().is_empty() {
        return Err(AppError::InvalidInput("标题和内容不能为空".to_string()));
    }

    let record_id = state.feishu.save_diary(&diary).await?;
    Ok(Json(json!({ "success": true, "recordId": record_id })))
}
