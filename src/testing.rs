//! 单元测试共用的替身实现

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::AuditResult;
use crate::generator::context::GeneratorContext;
use crate::generator::research::catalog;
use crate::llm::{ModelRole, TextGenerator};

type Handler = dyn Fn(ModelRole, &str, &str) -> AuditResult<String> + Send + Sync;

/// 按脚本返回结果的文本生成器，记录每次调用
pub struct ScriptedGenerator {
    handler: Box<Handler>,
    calls: Mutex<Vec<(ModelRole, String, String)>>,
}

impl ScriptedGenerator {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(ModelRole, &str, &str) -> AuditResult<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(ModelRole, String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, role: ModelRole) -> usize {
        self.calls().iter().filter(|(r, _, _)| *r == role).count()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        role: ModelRole,
        system_prompt: &str,
        user_prompt: &str,
    ) -> AuditResult<String> {
        self.calls.lock().unwrap().push((
            role,
            system_prompt.to_string(),
            user_prompt.to_string(),
        ));
        (self.handler)(role, system_prompt, user_prompt)
    }
}

/// 关闭缓存的测试配置
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.cache.enabled = false;
    config.llm.api_key = "test-key".to_string();
    config.llm.llm_brand_extraction = false;
    config
}

pub fn test_context(generator: Arc<ScriptedGenerator>) -> GeneratorContext {
    GeneratorContext::with_generator(test_config(), generator)
}

/// 模拟Worker输出：从请求中读出章节范围，为每个章节写一段带引用的正文
pub fn fake_research_output(user_prompt: &str) -> String {
    let range = user_prompt
        .trim_start_matches("Research and write sections ")
        .split_whitespace()
        .next()
        .unwrap_or("1-1");
    let (start, end) = range.split_once('-').unwrap_or(("1", "1"));
    let start = start.parse::<usize>().unwrap_or(1).max(1);
    let end: usize = end.parse().unwrap_or(start);

    let names = catalog::sections();
    let mut text = String::new();
    for ordinal in start..=end {
        let name = names
            .get(ordinal - 1)
            .map(|s| s.name.as_str())
            .unwrap_or("Section");
        text.push_str(&format!(
            "## {}. {}\nClaim for section {} [1]. Shared fact [2].\n\n",
            ordinal, name, ordinal
        ));
    }
    text.push_str(&format!(
        "Sources Used:\n[1] Batch source. https://example.com/{}\n[2] Shared. https://shared.example.com\n",
        start
    ));
    text
}
