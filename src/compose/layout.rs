//! 排版解析 - 核心层
//!
//! 把占位符序号解析成具体照片，并在版面约束内计算保持宽高比的
//! 显示尺寸。所有导出面（Word、网页预览）共用这一份解析逻辑，
//! 渲染器不得自行重算尺寸或去重。

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::models::PhotoRecord;

/// 解析后的显示尺寸（版面单位由渲染面决定，宽高比跨面一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhotoSize {
    pub width: u32,
    pub height: u32,
}

/// 单个渲染面的版面约束
#[derive(Debug, Clone, Copy)]
pub struct SurfaceLimits {
    pub max_width: u32,
    pub max_height: u32,
    /// 原始尺寸不可得时的固定回退尺寸
    pub fallback: PhotoSize,
}

impl SurfaceLimits {
    /// Word 导出的页面宽度预算
    pub const DOCUMENT: Self = Self {
        max_width: 450,
        max_height: 600,
        fallback: PhotoSize {
            width: 450,
            height: 300,
        },
    };

    /// 网页预览的版面预算
    pub const DISPLAY: Self = Self {
        max_width: 400,
        max_height: 600,
        fallback: PhotoSize {
            width: 400,
            height: 300,
        },
    };
}

/// 在版面约束内计算显示尺寸
///
/// 宽度先顶满 `max_width`，按原始宽高比推算高度；高度超出
/// `max_height` 时以高度为准回推宽度。宽高比在整数舍入误差内
/// 精确保持。原始尺寸未知或为零时直接使用回退尺寸，不会出现
/// 除零或负数尺寸。
pub fn fit_within(intrinsic: Option<(u32, u32)>, limits: &SurfaceLimits) -> PhotoSize {
    let (w, h) = match intrinsic {
        Some((w, h)) if w > 0 && h > 0 => (w, h),
        _ => return limits.fallback,
    };

    let ratio = h as f64 / w as f64;
    let mut width = limits.max_width;
    let mut height = (width as f64 * ratio).round() as u32;
    if height > limits.max_height {
        height = limits.max_height;
        width = (height as f64 / ratio).round() as u32;
    }

    PhotoSize { width, height }
}

/// 尽力探测照片原始像素尺寸的能力
///
/// 探测策略收敛在这一个接口后面，失败返回 `None`，由排版层回退
/// 到固定尺寸。
pub trait SizeProbe {
    fn probe(&self, photo: &PhotoRecord) -> Option<(u32, u32)>;
}

/// 读取上传目录中图片文件头获取尺寸
pub struct FileSizeProbe {
    uploads_dir: PathBuf,
}

impl FileSizeProbe {
    pub fn new(uploads_dir: impl AsRef<Path>) -> Self {
        Self {
            uploads_dir: uploads_dir.as_ref().to_path_buf(),
        }
    }
}

impl SizeProbe for FileSizeProbe {
    fn probe(&self, photo: &PhotoRecord) -> Option<(u32, u32)> {
        let path = self.uploads_dir.join(&photo.filename);
        match image::image_dimensions(&path) {
            Ok(dimensions) => Some(dimensions),
            Err(e) => {
                debug!("读取图片尺寸失败 ({}): {}", path.display(), e);
                None
            }
        }
    }
}

/// 不做任何探测，总是回退到固定尺寸
pub struct NoProbe;

impl SizeProbe for NoProbe {
    fn probe(&self, _photo: &PhotoRecord) -> Option<(u32, u32)> {
        None
    }
}

/// 占位符序号的解析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 照片可用，按给定尺寸排版
    Placed(PhotoSize),
    /// 序号越界或照片缺失，跳过该占位符
    Missing,
    /// 同一照片已在前文排过，跳过该占位符
    Duplicate,
}

/// 单篇文档范围内的排版解析器
///
/// 同一照片在一篇文档里最多出现一次（首次引用生效），下游导出
/// 依赖这一行为，不要改动。照片原始尺寸在首次需要时探测，
/// 结果写回照片记录。
pub struct LayoutResolver<P: SizeProbe> {
    limits: SurfaceLimits,
    probe: P,
    used: HashSet<usize>,
}

impl<P: SizeProbe> LayoutResolver<P> {
    pub fn new(limits: SurfaceLimits, probe: P) -> Self {
        Self {
            limits,
            probe,
            used: HashSet::new(),
        }
    }

    /// 解析 1 起始的占位符序号
    pub fn resolve(&mut self, index: usize, photos: &mut [PhotoRecord]) -> Resolution {
        if index == 0 {
            return Resolution::Missing;
        }
        let pos = index - 1;
        if pos >= photos.len() {
            return Resolution::Missing;
        }
        if !self.used.insert(pos) {
            return Resolution::Duplicate;
        }

        let photo = &mut photos[pos];
        if photo.dimensions().is_none() {
            if let Some((w, h)) = self.probe.probe(photo) {
                photo.width = Some(w);
                photo.height = Some(h);
            }
        }

        Resolution::Placed(fit_within(photo.dimensions(), &self.limits))
    }
}
