use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 报告中的一个章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub ordinal: usize,
    pub name: String,
    pub content: String,
}

/// 参考文献条目，编号全局唯一且连续
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographyEntry {
    pub number: usize,
    pub text: String,
    pub url: Option<String>,
}

impl BibliographyEntry {
    pub const UNAVAILABLE: &'static str = "Data unavailable";

    pub fn is_unavailable(&self) -> bool {
        self.url.is_none() && self.text == Self::UNAVAILABLE
    }
}

/// 编译完成的品牌审计报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub brand: String,
    pub title: String,
    pub sections: Vec<ReportSection>,
    pub bibliography: Vec<BibliographyEntry>,
}

impl Report {
    /// 渲染为Markdown文档
    pub fn render(&self) -> String {
        let mut out = format!("# {}\n\n", self.title);

        for section in &self.sections {
            out.push_str(&format!(
                "## {}. {}\n\n{}\n\n",
                section.ordinal,
                section.name,
                section.content.trim()
            ));
        }

        out.push_str("## Bibliography\n\n");
        if self.bibliography.is_empty() {
            out.push_str("No sources were cited.\n");
        }
        for entry in &self.bibliography {
            out.push_str(&format!("[{}] {}\n", entry.number, entry.text));
        }

        out
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}
