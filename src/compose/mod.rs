//! 正文组装核心：分词 → 排版解析 → 文档树
//!
//! 这一层是纯函数式的，不做任何 I/O（尺寸探测通过 [`layout::SizeProbe`]
//! 注入），同一输入永远产出同一棵文档树。

pub mod assembler;
pub mod layout;
pub mod tokenizer;

pub use assembler::{assemble, Block, DocumentTree};
pub use layout::{
    fit_within, FileSizeProbe, LayoutResolver, NoProbe, PhotoSize, Resolution, SizeProbe,
    SurfaceLimits,
};
pub use tokenizer::{tokenize, Segment};
