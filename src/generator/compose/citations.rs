//! Worker输出中引用标记与来源列表的解析

use regex::Regex;
use std::sync::LazyLock;

/// 来源列表标题，如 "Sources Used:"、"### References"
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:sources\s+used|sources|references|bibliography)\b").unwrap()
});

/// 正文中的引用标记，支持 `[3]` 与 `[1, 4]`
pub static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+(?:[ \t]*,[ \t]*\d+)*)\]").unwrap());

/// 来源条目行：`[k] ...`、`- [k] ...`、`k. ...`
static ENTRY_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:[-*+][ \t]+)?(?:\[(\d+)\]|(\d+)[.)])[ \t]*(.*)$").unwrap()
});

/// 一行中内联的多个 `[k]` 条目
static INLINE_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(\d+)\]").unwrap());

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:https?://|www\.)[^\s<>()\[\]"']+"#).unwrap()
});

/// 来源列表中的一个条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Chunk内的局部编号
    pub local: u32,
    /// 编号之后的条目原文
    pub text: String,
    /// 条目中最后出现的URL
    pub url: Option<String>,
}

impl SourceEntry {
    pub fn new(local: u32, text: &str) -> Self {
        let text = text.trim().to_string();
        let url = URL_RE
            .find_iter(&text)
            .last()
            .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '*', '_']).to_string());
        Self { local, text, url }
    }

    /// 判定两个来源是否相同的依据：URL，缺失时使用规范化后的标题
    pub fn identity(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => normalize_title(&self.text),
        }
    }
}

fn normalize_title(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .trim_end_matches(['.', ',', ';', ':'])
        .to_string()
}

/// 一段正文及紧随其后的来源列表
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    pub body: String,
    pub sources: Vec<SourceEntry>,
}

impl Segment {
    pub fn source(&self, local: u32) -> Option<&SourceEntry> {
        self.sources.iter().find(|s| s.local == local)
    }
}

/// 标题所在位置：`start` 为需要从正文中移除的起点，`end` 为条目开始的位置
struct Header {
    start: usize,
    end: usize,
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len())
}

fn is_markup(c: char) -> bool {
    c.is_whitespace() || matches!(c, '#' | '*' | '_' | '>')
}

/// 从 `from` 开始查找下一个来源列表标题
fn find_header(text: &str, from: usize) -> Option<Header> {
    for m in HEADER_RE.find_iter(&text[from..]) {
        let (m_start, m_end) = (from + m.start(), from + m.end());
        let ls = line_start(text, m_start);
        let le = line_end(text, m_end);

        let prefix = &text[ls..m_start];
        let at_line_start = prefix.chars().all(is_markup);
        // 内联标题前紧邻的加粗等标记一并移除
        let inline_start = m_start - (prefix.len() - prefix.trim_end_matches(is_markup).len());

        let mut rest = &text[m_end..le];
        rest = rest.trim_start_matches(['*', '_', ' ', '\t']);
        let has_colon = rest.starts_with(':');
        if has_colon {
            rest = rest[1..].trim_start_matches(['*', '_', ' ', '\t']);
        }
        let consumed = le - m_end - rest.len();
        let rest_trimmed = rest.trim_end();

        let opens_entries = rest_trimmed.is_empty() || ENTRY_LINE_RE.is_match(rest_trimmed);
        if !opens_entries || !(at_line_start || has_colon) {
            continue;
        }
        if !rest_trimmed.is_empty() && !rest_trimmed.starts_with('[') && !at_line_start {
            continue;
        }

        let start = if at_line_start { ls } else { inline_start };
        return Some(Header {
            start,
            end: m_end + consumed,
        });
    }
    None
}

/// 把一行（可能包含多个内联条目）解析为条目，追加到 `entries`
fn push_inline_entries(line: &str, entries: &mut Vec<SourceEntry>) -> bool {
    let markers: Vec<_> = INLINE_ENTRY_RE.captures_iter(line).collect();
    let Some(first) = markers.first() else {
        return false;
    };
    if !line[..first.get(0).map(|m| m.start()).unwrap_or(0)]
        .trim()
        .trim_start_matches(['-', '*', '+'])
        .trim()
        .is_empty()
    {
        return false;
    }
    for (i, caps) in markers.iter().enumerate() {
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        let text_end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(line.len());
        if let Ok(local) = caps[1].parse::<u32>() {
            entries.push(SourceEntry::new(local, &line[whole.1..text_end]));
        }
    }
    true
}

fn parse_entry_line(line: &str, entries: &mut Vec<SourceEntry>) -> bool {
    let Some(caps) = ENTRY_LINE_RE.captures(line) else {
        return false;
    };
    if caps.get(1).is_some() {
        return push_inline_entries(line, entries);
    }
    // `k.` 形式容易与正文中的编号标题混淆，只在包含链接时视为条目
    let rest = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
    if !URL_RE.is_match(rest) {
        return false;
    }
    match caps[2].parse::<u32>() {
        Ok(local) => {
            entries.push(SourceEntry::new(local, rest));
            true
        }
        Err(_) => false,
    }
}

/// 缩进行或以链接开头的行属于上一条目
fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t']) || URL_RE.find(line.trim()).is_some_and(|m| m.start() == 0)
}

/// 从标题之后解析来源条目，返回条目与列表结束位置
fn parse_block(text: &str, start: usize) -> (Vec<SourceEntry>, usize) {
    let mut entries: Vec<SourceEntry> = Vec::new();
    let mut pos = start;
    let mut end = start;

    // 标题同一行剩余部分
    let first_end = line_end(text, pos);
    let first = text[pos..first_end].trim();
    if !first.is_empty() {
        parse_entry_line(first, &mut entries);
    }
    pos = first_end;
    end = end.max(first_end);

    let mut previous_blank = false;
    while pos < text.len() {
        let ls = pos + 1;
        if ls > text.len() {
            break;
        }
        let le = line_end(text, ls);
        let line = &text[ls..le];

        if line.trim().is_empty() {
            previous_blank = true;
            pos = le;
            continue;
        }

        if parse_entry_line(line, &mut entries) {
            end = le;
        } else if !previous_blank && !entries.is_empty() && is_continuation(line) {
            // 上一条目的续行
            if let Some(last) = entries.pop() {
                let merged = format!("{} {}", last.text, line.trim());
                entries.push(SourceEntry::new(last.local, &merged));
            }
            end = le;
        } else {
            break;
        }
        previous_blank = false;
        pos = le;
    }

    (entries, end)
}

/// 把一个Chunk切分为若干段，每段由正文与其后的来源列表组成。
/// 最后一个来源列表之后的文字成为没有来源的末段。
pub fn split_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some(header) = find_header(text, cursor) {
        let body = text[cursor..header.start].trim().to_string();
        let (mut sources, block_end) = parse_block(text, header.end);
        // 同一列表中重复的编号以首次出现为准
        let mut seen = std::collections::HashSet::new();
        sources.retain(|s| seen.insert(s.local));

        segments.push(Segment { body, sources });
        cursor = block_end;
        if cursor >= text.len() {
            break;
        }
    }

    let tail = text[cursor.min(text.len())..].trim();
    if !tail.is_empty() || segments.is_empty() {
        segments.push(Segment {
            body: tail.to_string(),
            sources: Vec::new(),
        });
    }

    segments
}

/// 在Chunk内为第 `segment` 段中的局部编号查找来源：
/// 先查本段，再查之后最近的段，最后查之前最近的段
pub fn resolve<'a>(segments: &'a [Segment], segment: usize, local: u32) -> Option<&'a SourceEntry> {
    if let Some(entry) = segments.get(segment).and_then(|s| s.source(local)) {
        return Some(entry);
    }
    let later = segments
        .iter()
        .skip(segment + 1)
        .find_map(|s| s.source(local));
    later.or_else(|| {
        segments[..segment.min(segments.len())]
            .iter()
            .rev()
            .find_map(|s| s.source(local))
    })
}
