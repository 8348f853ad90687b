//! 飞书多维表格服务 - 业务能力层
//!
//! 只负责"把一篇日记存进飞书多维表格"能力：换取租户凭证、
//! 上传照片素材、写入记录。不关心日记怎么生成。

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use reqwest::multipart;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::FeishuError;
use crate::models::Diary;

/// 飞书多维表格服务
pub struct FeishuService {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    app_token: String,
    table_id: String,
    uploads_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    msg: String,
    tenant_access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    code: i64,
    msg: String,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    file_token: String,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    code: i64,
    msg: String,
    data: Option<RecordData>,
}

#[derive(Debug, Deserialize)]
struct RecordData {
    record: RecordInfo,
}

#[derive(Debug, Deserialize)]
struct RecordInfo {
    record_id: String,
}

impl FeishuService {
    /// 创建新的飞书服务
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.feishu_api_base_url.clone(),
            app_id: config.feishu_app_id.clone(),
            app_secret: config.feishu_app_secret.clone(),
            app_token: config.feishu_app_token.clone(),
            table_id: config.feishu_table_id.clone(),
            uploads_dir: PathBuf::from(&config.uploads_dir),
        }
    }

    /// 四项凭证是否配齐
    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty()
            && !self.app_secret.is_empty()
            && !self.app_token.is_empty()
            && !self.table_id.is_empty()
    }

    /// 把一篇日记写入多维表格
    ///
    /// # 参数
    /// - `diary`: 待保存的日记（照片按存储文件名在上传目录中查找）
    ///
    /// # 返回
    /// 返回新建记录的 record_id。本地文件已丢失的照片跳过不上传，
    /// 不影响记录写入。
    pub async fn save_diary(&self, diary: &Diary) -> Result<String, FeishuError> {
        if !self.is_configured() {
            return Err(FeishuError::ConfigIncomplete);
        }

        let token = self.tenant_access_token().await?;

        let mut photo_tokens = Vec::new();
        for photo in &diary.photos {
            let path = self.uploads_dir.join(&photo.filename);
            if !path.exists() {
                warn!("照片文件不存在，跳过上传: {}", path.display());
                continue;
            }
            let file_token = self.upload_image(&token, &path).await?;
            photo_tokens.push(json!({ "file_token": file_token }));
        }

        let fields = build_record_fields(diary, photo_tokens);
        debug!("写入多维表格的字段: {}", fields);

        let endpoint = format!(
            "bitable/v1/apps/{}/tables/{}/records",
            self.app_token, self.table_id
        );
        let url = format!("{}/{}", self.base_url, endpoint);

        let response: RecordResponse = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| FeishuError::RequestFailed {
                endpoint: endpoint.clone(),
                source: e,
            })?
            .json()
            .await
            .map_err(|e| FeishuError::RequestFailed {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if response.code != 0 {
            return Err(FeishuError::BadResponse {
                endpoint,
                code: response.code,
                msg: response.msg,
            });
        }

        let record_id = response
            .data
            .map(|d| d.record.record_id)
            .ok_or_else(|| FeishuError::BadResponse {
                endpoint: "bitable/v1/records".to_string(),
                code: 0,
                msg: "响应缺少 record 数据".to_string(),
            })?;

        info!("日记已写入飞书多维表格: {}", record_id);
        Ok(record_id)
    }

    /// 换取租户访问凭证
    async fn tenant_access_token(&self) -> Result<String, FeishuError> {
        let endpoint = "auth/v3/tenant_access_token/internal";
        let url = format!("{}/{}", self.base_url, endpoint);

        let response: TokenResponse = self
            .http
            .post(&url)
            .json(&json!({
                "app_id": self.app_id,
                "app_secret": self.app_secret,
            }))
            .send()
            .await
            .map_err(|e| FeishuError::RequestFailed {
                endpoint: endpoint.to_string(),
                source: e,
            })?
            .json()
            .await
            .map_err(|e| FeishuError::RequestFailed {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        if response.code != 0 {
            return Err(FeishuError::AuthFailed {
                code: response.code,
                msg: response.msg,
            });
        }

        response
            .tenant_access_token
            .ok_or_else(|| FeishuError::AuthFailed {
                code: response.code,
                msg: "响应缺少 tenant_access_token".to_string(),
            })
    }

    /// 上传一张照片素材，换取 file_token
    async fn upload_image(&self, token: &str, path: &Path) -> Result<String, FeishuError> {
        let endpoint = "drive/v1/medias/upload_all";
        let url = format!("{}/{}", self.base_url, endpoint);

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo")
            .to_string();
        let bytes = fs::read(path).map_err(|e| FeishuError::BadResponse {
            endpoint: endpoint.to_string(),
            code: -1,
            msg: format!("读取照片失败 ({}): {}", path.display(), e),
        })?;
        let size = bytes.len();

        let form = multipart::Form::new()
            .text("file_name", file_name.clone())
            .text("parent_type", "bitable_image")
            .text("parent_node", self.app_token.clone())
            .text("size", size.to_string())
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let response: UploadResponse = self
            .http
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| FeishuError::RequestFailed {
                endpoint: endpoint.to_string(),
                source: e,
            })?
            .json()
            .await
            .map_err(|e| FeishuError::RequestFailed {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        if response.code != 0 {
            return Err(FeishuError::BadResponse {
                endpoint: endpoint.to_string(),
                code: response.code,
                msg: response.msg,
            });
        }

        response
            .data
            .map(|d| d.file_token)
            .ok_or_else(|| FeishuError::BadResponse {
                endpoint: endpoint.to_string(),
                code: 0,
                msg: "响应缺少 file_token".to_string(),
            })
    }
}

/// 构建多维表格记录字段
///
/// 日期字段接收毫秒时间戳，解析失败时退回当前时间。
fn build_record_fields(diary: &Diary, photo_tokens: Vec<Value>) -> Value {
    json!({
        "标题": diary.title,
        "日期": date_to_millis(&diary.date),
        "地点": diary.location,
        "日记正文": diary.content,
        "照片": photo_tokens,
    })
}

fn date_to_millis(date: &str) -> i64 {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(d) => d
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_else(|| Utc::now().timestamp_millis()),
        Err(_) => {
            warn!("日期格式无法解析，使用当前时间: {}", date);
            Utc::now().timestamp_millis()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhotoRecord;

    fn diary() -> Diary {
        Diary {
            title: "西湖半日".to_string(),
            date: "2024-05-01".to_string(),
            location: "杭州".to_string(),
            content: "清晨出发。[图片1]".to_string(),
            photos: vec![PhotoRecord {
                filename: "x.jpg".to_string(),
                original_name: "断桥.jpg".to_string(),
                path: "/uploads/x.jpg".to_string(),
                location: None,
                width: None,
                height: None,
            }],
        }
    }

    #[test]
    fn test_is_configured() {
        let mut config = Config::default();
        assert!(!FeishuService::new(&config).is_configured());

        config.feishu_app_id = "cli_x".to_string();
        config.feishu_app_secret = "secret".to_string();
        config.feishu_app_token = "bascn".to_string();
        config.feishu_table_id = "tbl".to_string();
        assert!(FeishuService::new(&config).is_configured());
    }

    #[test]
    fn test_build_record_fields_keys() {
        let fields = build_record_fields(&diary(), vec![json!({"file_token": "ft_1"})]);
        assert_eq!(fields["标题"], "西湖半日");
        assert_eq!(fields["地点"], "杭州");
        assert_eq!(fields["日记正文"], "清晨出发。[图片1]");
        assert_eq!(fields["照片"][0]["file_token"], "ft_1");
        assert!(fields["日期"].is_i64());
    }

    #[test]
    fn test_date_to_millis() {
        // 2024-05-01 00:00:00 UTC
        assert_eq!(date_to_millis("2024-05-01"), 1_714_521_600_000);
        // 解析失败时退回当前时间，只验证量级
        assert!(date_to_millis("不是日期") > 1_600_000_000_000);
    }

    /// 测试飞书连通性
    ///
    /// 运行方式：
    /// ```bash
    /// FEISHU_APP_ID=... FEISHU_APP_SECRET=... FEISHU_APP_TOKEN=... FEISHU_TABLE_ID=... \
    ///     cargo test test_feishu_connectivity -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_feishu_connectivity() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let service = FeishuService::new(&config);
        assert!(service.is_configured(), "需要配置飞书凭证");

        let token = service.tenant_access_token().await.expect("换取凭证失败");
        assert!(!token.is_empty());
    }
}
