use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::generator::compose::types::Report;

#[allow(async_fn_in_trait)]
pub trait Outlet {
    /// 保存报告并返回写入位置
    async fn save(&self, report: &Report) -> Result<PathBuf>;
}

/// 将品牌名转换为文件名片段，如 "Ben & Jerry's" -> "ben_jerry_s"
pub fn brand_slug(brand: &str) -> String {
    let mut slug = String::new();
    for c in brand.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        "brand".to_string()
    } else {
        slug
    }
}

/// 把报告以Markdown写入输出目录
pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn report_path(&self, brand: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_brand_audit.md", brand_slug(brand)))
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, report: &Report) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.output_dir.display()))?;

        let path = self.report_path(&report.brand);
        tokio::fs::write(&path, report.render())
            .await
            .with_context(|| format!("无法写入报告: {}", path.display()))?;

        tracing::info!("💾 已保存报告: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::compose::types::{BibliographyEntry, ReportSection};
    use tempfile::TempDir;

    fn report() -> Report {
        Report {
            brand: "Ben & Jerry's".to_string(),
            title: "Ben & Jerry's Brand Audit Report".to_string(),
            sections: vec![ReportSection {
                ordinal: 1,
                name: "Origin Story".to_string(),
                content: "Founded in 1978 [1].".to_string(),
            }],
            bibliography: vec![BibliographyEntry {
                number: 1,
                text: "History. https://benjerry.com/about".to_string(),
                url: Some("https://benjerry.com/about".to_string()),
            }],
        }
    }

    #[test]
    fn test_brand_slug() {
        assert_eq!(brand_slug("Ben & Jerry's"), "ben_jerry_s");
        assert_eq!(brand_slug("  Nike "), "nike");
        assert_eq!(brand_slug("H&M!"), "h_m");
        assert_eq!(brand_slug("???"), "brand");
    }

    #[tokio::test]
    async fn test_disk_outlet_writes_rendered_report() {
        let temp_dir = TempDir::new().unwrap();
        let outlet = DiskOutlet::new(temp_dir.path().join("reports"));

        let path = outlet.save(&report()).await.unwrap();

        assert_eq!(path, temp_dir.path().join("reports/ben_jerry_s_brand_audit.md"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report().render());
        assert!(written.contains("## 1. Origin Story"));
        assert!(written.contains("[1] History. https://benjerry.com/about"));
    }
}
