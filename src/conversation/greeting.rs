//! 问候与品牌提取

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::llm::{LLMClient, ModelRole};

/// 未识别到品牌时的回复
pub const ASK_FOR_BRAND: &str =
    "Hello! I'm your brand strategy assistant. What brand would you like me to analyze?";

/// 确认品牌后的回复
pub fn confirmation(brand: &str) -> String {
    format!("Great! I'll create a comprehensive brand audit for {}...", brand)
}

/// 品牌提取的结果：可能的品牌与给用户的回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub brand: Option<String>,
    pub reply: String,
}

impl Greeting {
    pub fn found(brand: impl Into<String>) -> Self {
        let brand = brand.into();
        Self {
            reply: confirmation(&brand),
            brand: Some(brand),
        }
    }

    pub fn not_found() -> Self {
        Self {
            brand: None,
            reply: ASK_FOR_BRAND.to_string(),
        }
    }
}

/// 从任意用户消息中提取品牌，永不失败
#[async_trait]
pub trait BrandExtractor: Send + Sync {
    async fn extract(&self, message: &str) -> Greeting;
}

/// 问候语与填充词，不会被当作品牌
const STOP_WORDS: &[&str] = &[
    "a", "about", "afternoon", "again", "an", "analyse", "analysis", "analyze", "another", "any",
    "are", "audit", "audits", "brand", "brands", "can", "company", "comprehensive", "could",
    "create", "do", "evening", "for", "full", "get", "give", "good", "greetings", "hello", "help",
    "hey", "hi", "hiya", "how", "i", "i'd", "i'm", "is", "it", "just", "let's", "like", "make",
    "me", "morning", "my", "need", "new", "next", "no", "now", "of", "ok", "okay", "on", "one",
    "please", "pls", "quick", "report", "research", "run", "some", "something", "start", "sure",
    "thank", "thanks", "that", "the", "there", "this", "to", "today", "u", "us", "want", "we",
    "what", "which", "will", "with", "would", "yes", "yo", "you",
];

/// 品牌名之后出现即截断的连接词
const BREAK_WORDS: &[&str] = &[
    "and", "because", "but", "compared", "for", "in", "instead", "next", "now", "please", "since",
    "so", "than", "that", "to", "today", "versus", "vs", "which", "who", "with",
];

/// 寒暄与疑问用词。没有提示词的片段中出现这些词时，整段都不是品牌
const CONVERSATIONAL_WORDS: &[&str] = &[
    "am", "been", "bye", "did", "does", "doing", "feeling", "fine", "going", "goodbye", "great",
    "how", "how's", "howdy", "hows", "nice", "sup", "things", "up", "was", "wassup", "weather",
    "well", "were", "what's", "whats", "when", "where", "who", "who's", "why", "you're", "your",
];

/// 品牌名最多包含的词数
const MAX_BRAND_WORDS: usize = 5;

/// 提示后面跟着品牌的短语
static CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:brand\s+audit\s+(?:for|of|on)|audit\s+(?:for|of|on)|audit|analy[sz]e|analysis\s+(?:of|for|on)|report\s+(?:on|for|about)|research|look\s+(?:at|into)|switch\s+to)\b",
    )
    .unwrap()
});

static CLAUSE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;!?\n]+|\.(?:\s+|$)").unwrap());

fn bare(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '&')
        .trim_matches('\'')
        .to_lowercase()
}

fn is_stop_word(word: &str) -> bool {
    let bare = bare(word);
    bare.is_empty() || STOP_WORDS.contains(&bare.as_str())
}

/// 从一段文字中清理出品牌名：去掉首尾的填充词，遇到连接词截断。
/// 保留原始大小写。
pub fn clean_brand(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.iter().position(|w| !is_stop_word(w))?;

    let mut taken: Vec<&str> = Vec::new();
    for word in words[start..].iter().copied() {
        if !taken.is_empty() && BREAK_WORDS.contains(&bare(word).as_str()) {
            break;
        }
        taken.push(word);
    }
    while taken.last().is_some_and(|w| is_stop_word(w)) {
        taken.pop();
    }
    if taken.is_empty() || taken.len() > MAX_BRAND_WORDS {
        return None;
    }

    let brand = taken
        .join(" ")
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '(' | ')' | '*' | ':' | '.'))
        .to_string();
    if brand.is_empty() { None } else { Some(brand) }
}

fn is_conversational(clause: &str) -> bool {
    clause
        .split_whitespace()
        .any(|word| CONVERSATIONAL_WORDS.contains(&bare(&word.replace('’', "'")).as_str()))
}

/// 没有提示词时的品牌候选：单个词，或每个词都以大写字母/数字开头，如 "Under Armour"
fn is_bare_brand(candidate: &str) -> bool {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    words.len() == 1
        || (words.len() <= 3
            && words.iter().all(|word| {
                *word == "&"
                    || word
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
            }))
}

/// 基于提示词与停用词表的品牌提取
#[derive(Debug, Default, Clone)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn extract_brand(message: &str) -> Option<String> {
        for clause in CLAUSE_SPLIT_RE.split(message) {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            let candidate = match CUE_RE.find(clause) {
                Some(cue) => clean_brand(&clause[cue.end()..]),
                None if is_conversational(clause) => None,
                None => clean_brand(clause).filter(|b| is_bare_brand(b)),
            };
            if candidate.is_some() {
                return candidate;
            }
        }
        None
    }
}

#[async_trait]
impl BrandExtractor for HeuristicExtractor {
    async fn extract(&self, message: &str) -> Greeting {
        match Self::extract_brand(message) {
            Some(brand) => Greeting::found(brand),
            None => Greeting::not_found(),
        }
    }
}

const EXTRACTION_PROMPT: &str = r#"You are a brand strategy assistant. Your job is to extract a brand name from ANY user message, even if the message contains greetings or extra words.

RULES:
- Look for any well-known company or brand name anywhere in the user's message, no matter what else is present.
- "hello, lululemon" -> "lululemon"
- "can you do a brand audit for nike" -> "nike"
- "good morning! analyze coca cola" -> "coca cola"
- "Hi there!" -> null
- If there are multiple possible brands, pick the first obvious one.
- Return the brand name only, never a whole sentence. Keep the user's spelling."#;

/// 结构化提取的结果
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BrandMention {
    /// 消息中提到的品牌名，没有时为null
    pub brand: Option<String>,
}

/// 模型明确回答没有品牌时直接采用，只有调用失败才退回启发式提取
fn greeting_from_mention(mention: anyhow::Result<BrandMention>, message: &str) -> Greeting {
    match mention {
        Ok(BrandMention { brand: Some(brand) }) if !brand.trim().is_empty() => {
            Greeting::found(brand.trim())
        }
        Ok(_) => Greeting::not_found(),
        Err(e) => {
            tracing::warn!("⚠️ 品牌提取失败，改用启发式提取: {:#}", e);
            match HeuristicExtractor::extract_brand(message) {
                Some(brand) => Greeting::found(brand),
                None => Greeting::not_found(),
            }
        }
    }
}

/// 使用问候模型做结构化提取
pub struct LlmBrandExtractor {
    client: LLMClient,
}

impl LlmBrandExtractor {
    pub fn new(client: LLMClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrandExtractor for LlmBrandExtractor {
    async fn extract(&self, message: &str) -> Greeting {
        let mention = self
            .client
            .extract::<BrandMention>(ModelRole::Greeting, EXTRACTION_PROMPT, message)
            .await;
        greeting_from_mention(mention, message)
    }
}
