//! 照片服务 - 业务能力层
//!
//! 只负责"收下一张上传照片"能力：校验格式、落盘、尽力从 EXIF
//! 读出拍摄地点。不关心日记流程。

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use exif::{In, Tag, Value};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::PhotoError;
use crate::models::PhotoRecord;

/// 允许上传的图片扩展名
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// 照片服务
pub struct PhotoService {
    uploads_dir: PathBuf,
}

impl PhotoService {
    /// 创建新的照片服务
    pub fn new(config: &Config) -> Self {
        Self {
            uploads_dir: PathBuf::from(&config.uploads_dir),
        }
    }

    /// 确保上传目录存在
    pub fn ensure_uploads_dir(&self) -> Result<(), PhotoError> {
        fs::create_dir_all(&self.uploads_dir).map_err(|e| PhotoError::DirCreateFailed {
            path: self.uploads_dir.display().to_string(),
            source: e,
        })
    }

    /// 收下一张上传照片
    ///
    /// # 参数
    /// - `original_name`: 用户上传时的文件名，用于校验扩展名
    /// - `content_type`: 上传分片声明的 MIME 类型（可选）
    /// - `bytes`: 文件内容
    /// - `default_location`: EXIF 中读不到地点时的回退地点
    ///
    /// # 返回
    /// 返回新建的照片记录，宽高留待排版时再探测
    pub fn store(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
        default_location: Option<&str>,
    ) -> Result<PhotoRecord, PhotoError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let extension_ok = ALLOWED_EXTENSIONS.contains(&extension.as_str());
        let mime_ok = content_type.map_or(true, |t| t.starts_with("image/"));
        if !extension_ok || !mime_ok {
            return Err(PhotoError::UnsupportedFormat {
                name: original_name.to_string(),
            });
        }

        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let disk_path = self.uploads_dir.join(&filename);
        fs::write(&disk_path, bytes).map_err(|e| PhotoError::SaveFailed {
            path: disk_path.display().to_string(),
            source: e,
        })?;

        let location = read_gps_location(&disk_path)
            .or_else(|| default_location.map(|l| l.to_string()))
            .filter(|l| !l.trim().is_empty());

        debug!(
            "照片已保存: {} -> {} (地点: {:?})",
            original_name, filename, location
        );

        Ok(PhotoRecord {
            path: format!("/uploads/{filename}"),
            filename,
            original_name: original_name.to_string(),
            location,
            width: None,
            height: None,
        })
    }
}

/// 尽力从 EXIF 读出 GPS 坐标，格式 `纬度, 经度`（保留 6 位小数）
///
/// 没有 EXIF、没有 GPS 字段、字段残缺都返回 `None`，不算错误。
fn read_gps_location(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let data = exif::Reader::new().read_from_container(&mut reader).ok()?;

    let mut latitude = dms_to_degrees(data.get_field(Tag::GPSLatitude, In::PRIMARY)?)?;
    let mut longitude = dms_to_degrees(data.get_field(Tag::GPSLongitude, In::PRIMARY)?)?;

    if ref_is(&data, Tag::GPSLatitudeRef, "S") {
        latitude = -latitude;
    }
    if ref_is(&data, Tag::GPSLongitudeRef, "W") {
        longitude = -longitude;
    }

    Some(format!("{latitude:.6}, {longitude:.6}"))
}

/// 度分秒三元组换算成十进制度数
fn dms_to_degrees(field: &exif::Field) -> Option<f64> {
    match &field.value {
        Value::Rational(parts) if parts.len() == 3 => {
            Some(parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0)
        }
        _ => None,
    }
}

fn ref_is(data: &exif::Exif, tag: Tag, expected: &str) -> bool {
    data.get_field(tag, In::PRIMARY)
        .map(|f| f.display_value().to_string().trim_matches('"') == expected)
        .unwrap_or(false)
}
