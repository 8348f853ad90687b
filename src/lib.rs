//! # AuroDiary
//!
//! 一个把照片和文字变成图文日记的 Rust Web 应用
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 照片记录、日记等请求内传递的纯数据
//!
//! ### ② 核心层（Compose）
//! - `compose/` - 纯函数式的正文组装流水线，不做 I/O
//! - `tokenizer` - 按 `[图片n]` 占位符切分正文
//! - `layout` - 占位符到照片的解析与保持宽高比的尺寸计算
//! - `assembler` - 组装渲染无关的文档树
//!
//! ### ③ 业务能力层（Services / Render）
//! - `services/` - 描述"我能做什么"，只处理单篇日记
//! - `PhotoService` - 收下上传照片、EXIF 地点探测能力
//! - `LlmService` - 让语言模型写日记的能力
//! - `FeishuService` - 写入飞书多维表格的能力
//! - `render/` - 文档树的两个消费方：Word 导出与网页预览
//!
//! ### ④ 编排层（Server）
//! - `server/` - 路由与各能力的组装，每个请求独立走完流水线
//!
//! ## 模块结构

pub mod compose;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod server;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use compose::{assemble, Block, DocumentTree, SurfaceLimits};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Diary, DiaryRequest, PhotoRecord};
pub use render::{DocxRenderer, HtmlRenderer};
