//! 文档组装 - 核心层
//!
//! 把切分后的片段序列组装成一棵渲染无关的文档树。所有渲染器
//! （Word 导出、网页预览）都只消费这棵树，块顺序和照片去重
//! 因此在各导出面上保持一致。

use tracing::debug;

use crate::compose::layout::{LayoutResolver, PhotoSize, Resolution, SizeProbe, SurfaceLimits};
use crate::compose::tokenizer::{tokenize, Segment};
use crate::models::{Diary, PhotoRecord};

/// 标题为空时的占位标题
const FALLBACK_TITLE: &str = "无标题";
/// 日期或地点为空时的占位文字
const FALLBACK_META: &str = "未设置";

/// 文档树中的块
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// 文档标题
    Title(String),
    /// 日期与地点
    Metadata { date: String, location: String },
    /// 一行正文
    Text(String),
    /// 一张照片及其解析好的显示尺寸
    Photo {
        photo: PhotoRecord,
        size: PhotoSize,
    },
    /// 紧随照片的地点说明
    Caption(String),
}

/// 有序的、渲染无关的文档树
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTree {
    pub blocks: Vec<Block>,
}

impl DocumentTree {
    /// 树中的照片块数量
    pub fn photo_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Photo { .. }))
            .count()
    }
}

/// 组装一篇日记的文档树
///
/// 先放标题块和元数据块（缺省时用占位文字），再按正文顺序放
/// 文本块和照片块。文本片段按换行拆成多个块，纯空白行丢弃。
/// 序号越界的占位符静默跳过，重复引用的照片只保留首次出现，
/// 整篇组装不会因个别占位符失败而中断。
pub fn assemble<P: SizeProbe>(diary: &Diary, limits: SurfaceLimits, probe: P) -> DocumentTree {
    let mut blocks = Vec::new();

    let title = diary.title.trim();
    blocks.push(Block::Title(if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title.to_string()
    }));

    blocks.push(Block::Metadata {
        date: fallback_if_empty(&diary.date),
        location: fallback_if_empty(&diary.location),
    });

    let mut photos = diary.photos.clone();
    let mut resolver = LayoutResolver::new(limits, probe);

    for segment in tokenize(&diary.content) {
        match segment {
            Segment::Text(text) => {
                for line in text.lines() {
                    let line = line.trim();
                    if !line.is_empty() {
                        blocks.push(Block::Text(line.to_string()));
                    }
                }
            }
            Segment::PhotoRef(index) => match resolver.resolve(index, &mut photos) {
                Resolution::Placed(size) => {
                    let photo = photos[index - 1].clone();
                    let caption = photo.location.clone().filter(|l| !l.trim().is_empty());
                    blocks.push(Block::Photo { photo, size });
                    if let Some(location) = caption {
                        blocks.push(Block::Caption(location));
                    }
                }
                Resolution::Missing => {
                    debug!("占位符 [图片{}] 没有对应照片，忽略", index);
                }
                Resolution::Duplicate => {
                    debug!("照片 {} 已在前文排过，忽略重复占位符", index);
                }
            },
        }
    }

    DocumentTree { blocks }
}

fn fallback_if_empty(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        FALLBACK_META.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::layout::NoProbe;

    fn photo(n: usize) -> PhotoRecord {
        PhotoRecord {
            filename: format!("{n}.jpg"),
            original_name: format!("原图{n}.jpg"),
            path: format!("/uploads/{n}.jpg"),
            location: None,
            width: None,
            height: None,
        }
    }

    fn diary(content: &str, photos: Vec<PhotoRecord>) -> Diary {
        Diary {
            title: "周末".to_string(),
            date: "2024-05-01".to_string(),
            location: "杭州".to_string(),
            content: content.to_string(),
            photos,
        }
    }

    fn body(tree: &DocumentTree) -> &[Block] {
        // 跳过固定的标题块和元数据块
        &tree.blocks[2..]
    }

    #[test]
    fn test_assemble_prepends_title_and_metadata() {
        let tree = assemble(&diary("正文", vec![]), SurfaceLimits::DOCUMENT, NoProbe);
        assert_eq!(tree.blocks[0], Block::Title("周末".to_string()));
        assert_eq!(
            tree.blocks[1],
            Block::Metadata {
                date: "2024-05-01".to_string(),
                location: "杭州".to_string(),
            }
        );
    }

    #[test]
    fn test_assemble_fallback_title_and_metadata() {
        let mut d = diary("正文", vec![]);
        d.title = "  ".to_string();
        d.date = String::new();
        d.location = String::new();
        let tree = assemble(&d, SurfaceLimits::DOCUMENT, NoProbe);
        assert_eq!(tree.blocks[0], Block::Title("无标题".to_string()));
        assert_eq!(
            tree.blocks[1],
            Block::Metadata {
                date: "未设置".to_string(),
                location: "未设置".to_string(),
            }
        );
    }

    #[test]
    fn test_assemble_text_only_splits_lines() {
        let tree = assemble(
            &diary("第一行\n\n  \n第二行", vec![photo(1)]),
            SurfaceLimits::DOCUMENT,
            NoProbe,
        );
        assert_eq!(
            body(&tree),
            &[
                Block::Text("第一行".to_string()),
                Block::Text("第二行".to_string()),
            ]
        );
        assert_eq!(tree.photo_count(), 0);
    }

    #[test]
    fn test_assemble_interleaves_text_and_photos() {
        let tree = assemble(
            &diary("你好[图片1]世界[图片2]再见", vec![photo(1), photo(2)]),
            SurfaceLimits::DOCUMENT,
            NoProbe,
        );
        let blocks = body(&tree);
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0], Block::Text("你好".to_string()));
        assert!(
            matches!(&blocks[1], Block::Photo { photo, .. } if photo.filename == "1.jpg")
        );
        assert_eq!(blocks[2], Block::Text("世界".to_string()));
        assert!(
            matches!(&blocks[3], Block::Photo { photo, .. } if photo.filename == "2.jpg")
        );
        assert_eq!(blocks[4], Block::Text("再见".to_string()));
    }

    #[test]
    fn test_assemble_duplicate_marker_keeps_first() {
        let tree = assemble(
            &diary("[图片1][图片1]", vec![photo(1)]),
            SurfaceLimits::DOCUMENT,
            NoProbe,
        );
        assert_eq!(tree.photo_count(), 1);
        assert_eq!(body(&tree).len(), 1);
    }

    #[test]
    fn test_assemble_out_of_range_marker_skipped() {
        let tree = assemble(
            &diary("开头[图片99]结尾", vec![photo(1), photo(2), photo(3)]),
            SurfaceLimits::DOCUMENT,
            NoProbe,
        );
        assert_eq!(tree.photo_count(), 0);
        assert_eq!(
            body(&tree),
            &[
                Block::Text("开头".to_string()),
                Block::Text("结尾".to_string()),
            ]
        );
    }

    #[test]
    fn test_assemble_unreferenced_photos_not_emitted() {
        let tree = assemble(
            &diary("只用第二张[图片2]", vec![photo(1), photo(2), photo(3)]),
            SurfaceLimits::DOCUMENT,
            NoProbe,
        );
        assert_eq!(tree.photo_count(), 1);
        assert!(tree.blocks.iter().any(
            |b| matches!(b, Block::Photo { photo, .. } if photo.filename == "2.jpg")
        ));
    }

    #[test]
    fn test_assemble_photo_location_becomes_caption() {
        let mut p = photo(1);
        p.location = Some("西湖".to_string());
        let tree = assemble(&diary("[图片1]", vec![p]), SurfaceLimits::DOCUMENT, NoProbe);
        let blocks = body(&tree);
        assert!(matches!(blocks[0], Block::Photo { .. }));
        assert_eq!(blocks[1], Block::Caption("西湖".to_string()));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let d = diary("你好[图片1]世界[图片2]", vec![photo(1), photo(2)]);
        let first = assemble(&d, SurfaceLimits::DOCUMENT, NoProbe);
        let second = assemble(&d, SurfaceLimits::DOCUMENT, NoProbe);
        assert_eq!(first, second);
    }
}
