//! 占位符分词器
//!
//! 把正文按 `[图片n]` 占位符切分成有序的片段序列。
//! 占位符语法是对外稳定格式：已生成的日记正文必须永远可以
//! 按同一语法重新解析，不要扩展分隔符写法。

use std::sync::LazyLock;

use regex::Regex;

/// 占位符的固定语法，n 为 1 起始的照片序号
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[图片(\d+)\]").expect("占位符正则不合法"));

/// 正文切分后的片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// 普通文本，保持原样
    Text(String),
    /// 照片占位符，序号为占位符中的原始数字（1 起始）
    PhotoRef(usize),
}

/// 切分正文
///
/// 扫描是贪心且不重叠的：每个位置上第一个完整匹配的占位符生效。
/// 形似占位符但不合语法的内容（缺数字、数字超出可表示范围）
/// 按普通文本保留，任何非占位符内容都不会丢失。
pub fn tokenize(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pending = String::new();
    let mut cursor = 0;

    for caps in MARKER_RE.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        pending.push_str(&text[cursor..whole.start()]);
        cursor = whole.end();

        match caps[1].parse::<usize>() {
            Ok(index) => {
                if !pending.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut pending)));
                }
                segments.push(Segment::PhotoRef(index));
            }
            // 数字大到无法解析，当作普通文本
            Err(_) => pending.push_str(whole.as_str()),
        }
    }

    pending.push_str(&text[cursor..]);
    if !pending.is_empty() {
        segments.push(Segment::Text(pending));
    }

    segments
}
