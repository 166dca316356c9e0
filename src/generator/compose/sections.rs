//! 按章节标题切分Chunk正文

use regex::Regex;
use std::sync::LazyLock;

use crate::generator::compose::types::{BibliographyEntry, ReportSection};
use crate::types::{Batch, Section};

static NUMBER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:section\s+)?\d+\s*[.):]?\s*").unwrap());

/// 标题判定允许名称之后附加的最大长度，如 " (2020-2024)"
const HEADING_SLACK: usize = 30;

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(" and ", " & ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 判断一行是否为指定章节的标题
fn is_heading_for(line: &str, section: &Section) -> bool {
    let trimmed = line.trim();
    let decorated = trimmed.starts_with('#')
        || trimmed.starts_with("**")
        || trimmed.starts_with("__")
        || trimmed.starts_with(|c: char| c.is_ascii_digit());

    let stripped = trimmed.trim_start_matches(['#', '*', '_', ' ', '\t']);
    let stripped = NUMBER_PREFIX_RE.replace(&stripped.to_lowercase(), "").to_string();
    let stripped = normalize(stripped.trim_end_matches(['*', '_', ':', ' ', '\t']));
    let name = normalize(&section.name);

    if stripped == name {
        return true;
    }
    decorated && stripped.starts_with(&name) && stripped.len() <= name.len() + HEADING_SLACK
}

/// 把批次的正文按章节切分。标题之前的文字并入批次第一个章节，
/// 找不到标题或内容为空的章节写作 "Data unavailable"。
pub fn split_sections(batch: &Batch, body: &str) -> Vec<ReportSection> {
    let lines: Vec<&str> = body.lines().collect();

    // (章节下标, 标题所在行)
    let mut found: Vec<(usize, usize)> = Vec::new();
    let mut cursor = 0;
    for (i, section) in batch.sections.iter().enumerate() {
        if let Some(offset) = lines[cursor..]
            .iter()
            .position(|line| is_heading_for(line, section))
        {
            found.push((i, cursor + offset));
            cursor += offset + 1;
        }
    }

    let mut contents: Vec<String> = vec![String::new(); batch.sections.len()];
    let preamble_end = found.first().map(|(_, line)| *line).unwrap_or(lines.len());
    let preamble = lines[..preamble_end].join("\n").trim().to_string();

    for (k, (section_index, heading_line)) in found.iter().enumerate() {
        let end = found
            .get(k + 1)
            .map(|(_, line)| *line)
            .unwrap_or(lines.len());
        contents[*section_index] = lines[heading_line + 1..end].join("\n").trim().to_string();
    }

    if !preamble.is_empty() {
        if let Some(first) = contents.first_mut() {
            *first = if first.is_empty() {
                preamble
            } else {
                format!("{}\n\n{}", preamble, first)
            };
        }
    }

    batch
        .sections
        .iter()
        .zip(contents)
        .map(|(section, content)| ReportSection {
            ordinal: section.ordinal,
            name: section.name.clone(),
            content: if content.is_empty() {
                BibliographyEntry::UNAVAILABLE.to_string()
            } else {
                content
            },
        })
        .collect()
}
