use serde::{Deserialize, Serialize};

use crate::models::photo::PhotoRecord;

/// 一篇日记
///
/// `content` 是照片排版的唯一依据：正文中的 `[图片n]` 占位符按
/// 1 起始的序号指向 `photos` 中的第 n 张照片。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diary {
    pub title: String,
    pub date: String,
    pub location: String,
    pub content: String,
    #[serde(default)]
    pub photos: Vec<PhotoRecord>,
}

/// 生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// 根据用户描述自动创作
    #[default]
    Generate,
    /// 润色用户已写好的原文
    Polish,
}

impl GenerationMode {
    /// 解析表单中的模式取值，未知值按自动创作处理
    pub fn parse(value: &str) -> Self {
        match value {
            "polish" => Self::Polish,
            _ => Self::Generate,
        }
    }
}

/// 一次日记生成请求的全部输入
#[derive(Debug, Clone)]
pub struct DiaryRequest {
    pub mode: GenerationMode,
    /// 润色模式下用户原定的标题，可为空
    pub title: String,
    pub date: String,
    pub location: String,
    pub description: String,
    pub diary_style: String,
    pub style_description: String,
    pub photos: Vec<PhotoRecord>,
}

/// 语言模型产出的标题与正文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryText {
    pub title: String,
    pub content: String,
}
