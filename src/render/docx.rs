//! Word 导出渲染器
//!
//! 只消费组装好的文档树，不重新解析占位符，也不重新计算尺寸。

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use docx_rs::{AlignmentType, Docx, Paragraph, Pic, Run};
use tracing::{info, warn};

use crate::compose::{Block, DocumentTree};
use crate::error::RenderError;

/// 像素到 EMU 的换算（96 DPI）
const EMU_PER_PX: u32 = 9525;

/// 把文档树渲染成 Word 二进制
pub struct DocxRenderer {
    uploads_dir: PathBuf,
}

impl DocxRenderer {
    pub fn new(uploads_dir: impl AsRef<Path>) -> Self {
        Self {
            uploads_dir: uploads_dir.as_ref().to_path_buf(),
        }
    }

    /// 渲染整棵文档树
    ///
    /// 单张照片读不到字节时记警告并跳过该块，文档其余部分照常
    /// 渲染，整体只在打包失败时报错。
    pub fn render(&self, tree: &DocumentTree) -> Result<Vec<u8>, RenderError> {
        let mut docx = Docx::new();

        for block in &tree.blocks {
            docx = match block {
                Block::Title(title) => docx.add_paragraph(
                    Paragraph::new()
                        .align(AlignmentType::Center)
                        .add_run(Run::new().add_text(title.as_str()).size(36).bold()),
                ),
                Block::Metadata { date, location } => docx.add_paragraph(
                    Paragraph::new().align(AlignmentType::Center).add_run(
                        Run::new()
                            .add_text(format!("📅 {date}    📍 {location}"))
                            .size(24)
                            .color("666666"),
                    ),
                ),
                Block::Text(line) => docx.add_paragraph(
                    Paragraph::new().add_run(Run::new().add_text(line.as_str()).size(28)),
                ),
                Block::Photo { photo, size } => {
                    let path = self.uploads_dir.join(&photo.filename);
                    match read_image_bytes(&path) {
                        Ok(bytes) => {
                            let pic = Pic::new(&bytes)
                                .size(size.width * EMU_PER_PX, size.height * EMU_PER_PX);
                            docx.add_paragraph(
                                Paragraph::new()
                                    .align(AlignmentType::Center)
                                    .add_run(Run::new().add_image(pic)),
                            )
                        }
                        Err(e) => {
                            warn!("读取照片失败，跳过该图片块 ({}): {}", path.display(), e);
                            docx
                        }
                    }
                }
                Block::Caption(location) => docx.add_paragraph(
                    Paragraph::new().align(AlignmentType::Center).add_run(
                        Run::new()
                            .add_text(format!("📍 {location}"))
                            .size(20)
                            .color("4FC3F7"),
                    ),
                ),
            };
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(docx_rs::DocxError::from)?;

        let bytes = cursor.into_inner();
        info!("Word 文档生成完成，共 {} 字节", bytes.len());
        Ok(bytes)
    }
}

/// 读取并校验照片字节
///
/// 嵌入前必须确认内容可以解码成图片，否则跳过该块。
fn read_image_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    image::load_from_memory(&bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(bytes)
}
