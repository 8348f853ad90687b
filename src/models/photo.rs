use serde::{Deserialize, Serialize};

/// 上传成功后的照片记录
///
/// 由上传层创建，随所属日记一起在请求内传递。`width` / `height`
/// 在首次需要排版时才探测填充，除此之外创建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    /// 上传目录中的存储文件名
    pub filename: String,
    /// 用户上传时的原始文件名
    pub original_name: String,
    /// 对外访问路径（如 `/uploads/xxx.jpg`）
    pub path: String,
    /// 拍摄地点（EXIF 探测或用户填写）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// 原始像素宽度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// 原始像素高度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl PhotoRecord {
    /// 已知的原始像素尺寸，宽高均有值时返回
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}
