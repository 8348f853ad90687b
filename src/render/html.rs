//! 网页预览渲染器
//!
//! 产出交互展示用的标记片段。块顺序和照片去重跟 Word 导出
//! 完全一致，因为两边消费同一棵文档树。

use crate::compose::{Block, DocumentTree};

/// 把文档树渲染成 HTML 片段
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn render(&self, tree: &DocumentTree) -> String {
        let mut html = String::from("<article class=\"diary\">\n");

        for block in &tree.blocks {
            match block {
                Block::Title(title) => {
                    html.push_str(&format!(
                        "  <h1 class=\"diary-title\">{}</h1>\n",
                        escape(title)
                    ));
                }
                Block::Metadata { date, location } => {
                    html.push_str(&format!(
                        "  <div class=\"diary-meta\"><span>📅 {}</span><span>📍 {}</span></div>\n",
                        escape(date),
                        escape(location)
                    ));
                }
                Block::Text(line) => {
                    html.push_str(&format!("  <p class=\"diary-text\">{}</p>\n", escape(line)));
                }
                Block::Photo { photo, size } => {
                    html.push_str(&format!(
                        "  <figure class=\"diary-photo\"><img src=\"{}\" width=\"{}\" height=\"{}\" alt=\"{}\"></figure>\n",
                        escape(&photo.path),
                        size.width,
                        size.height,
                        escape(&photo.original_name)
                    ));
                }
                Block::Caption(location) => {
                    html.push_str(&format!(
                        "  <p class=\"photo-caption\">📍 {}</p>\n",
                        escape(location)
                    ));
                }
            }
        }

        html.push_str("</article>\n");
        html
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::PhotoSize;
    use crate::models::PhotoRecord;

    #[test]
    fn test_render_escapes_text() {
        let tree = DocumentTree {
            blocks: vec![Block::Text("a < b & \"c\"".to_string())],
        };
        let html = HtmlRenderer.render(&tree);
        assert!(html.contains("a &lt; b &amp; &quot;c&quot;"));
    }

    #[test]
    fn test_render_photo_uses_resolved_size() {
        let tree = DocumentTree {
            blocks: vec![Block::Photo {
                photo: PhotoRecord {
                    filename: "x.jpg".to_string(),
                    original_name: "原图.jpg".to_string(),
                    path: "/uploads/x.jpg".to_string(),
                    location: None,
                    width: Some(1000),
                    height: Some(5000),
                },
                size: PhotoSize {
                    width: 120,
                    height: 600,
                },
            }],
        };
        let html = HtmlRenderer.render(&tree);
        assert!(html.contains("src=\"/uploads/x.jpg\""));
        assert!(html.contains("width=\"120\""));
        assert!(html.contains("height=\"600\""));
    }

    #[test]
    fn test_render_block_order_preserved() {
        let tree = DocumentTree {
            blocks: vec![
                Block::Title("标题".to_string()),
                Block::Metadata {
                    date: "2024-05-01".to_string(),
                    location: "杭州".to_string(),
                },
                Block::Text("正文".to_string()),
            ],
        };
        let html = HtmlRenderer.render(&tree);
        let title_at = html.find("diary-title").unwrap();
        let meta_at = html.find("diary-meta").unwrap();
        let text_at = html.find("diary-text").unwrap();
        assert!(title_at < meta_at && meta_at < text_at);
    }
}
