use crate::config::{Config, LLMProvider};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "braudit.toml";

/// braudit - 由Rust与AI驱动的品牌审计报告生成器
#[derive(Parser, Debug)]
#[command(name = "braudit")]
#[command(
    about = "Conversational brand audit generator: researches an 18-section brand audit in parallel and compiles it into one cited report."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 会话ID，用于恢复之前的对话
    #[arg(short, long, default_value = "default")]
    pub session: String,

    /// 会话状态存储目录
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 只处理这一条消息后退出
    #[arg(short, long, conflicts_with = "brand")]
    pub message: Option<String>,

    /// 不进入对话，直接为该品牌生成报告
    #[arg(short, long)]
    pub brand: Option<String>,

    /// LLM Provider (openai, openrouter, anthropic, deepseek, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 章节调研模型
    #[arg(long)]
    pub model_research: Option<String>,

    /// 问候与品牌提取模型
    #[arg(long)]
    pub model_greeting: Option<String>,

    /// 追问模型
    #[arg(long)]
    pub model_followup: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 同时运行的Worker数量上限
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 是否禁用缓存
    #[arg(long)]
    pub no_cache: bool,

    /// 确认品牌后等待用户输入，而不是立即开始审计
    #[arg(long)]
    pub no_auto_continue: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 加载配置文件（显式指定或当前目录下的默认文件），再用CLI参数覆盖
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);
                if default_config_path.exists() {
                    Config::from_file(&default_config_path).with_context(|| {
                        format!("无法读取默认配置文件 {:?}", default_config_path)
                    })?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(output_path) = self.output_path {
            config.output_path = Some(output_path);
        }
        if let Some(state_dir) = self.state_dir {
            config.session.state_dir = state_dir;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => tracing::warn!(
                    "⚠️ 未知的provider: {}，使用 {}",
                    provider_str,
                    config.llm.provider
                ),
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_research) = self.model_research {
            config.llm.model_research = model_research;
        }
        if let Some(model_greeting) = self.model_greeting {
            config.llm.model_greeting = model_greeting;
        }
        if let Some(model_followup) = self.model_followup {
            config.llm.model_followup = model_followup;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }

        if self.no_cache {
            config.cache.enabled = false;
        }
        if self.no_auto_continue {
            config.session.auto_continue = false;
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}
