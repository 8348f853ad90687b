//! 文档树的渲染器
//!
//! 每个渲染面只消费 [`crate::compose::DocumentTree`]，不得自行
//! 解析占位符或重算尺寸，保证各导出路径语义一致。

pub mod docx;
pub mod html;

pub use docx::DocxRenderer;
pub use html::HtmlRenderer;
