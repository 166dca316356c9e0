use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use braudit::config::Config;
use braudit::conversation::{FileStateStore, HeuristicExtractor, Router, SessionManager};
use braudit::generator::context::GeneratorContext;
use braudit::llm::{ModelRole, TextGenerator};
use braudit::types::Stage;
use braudit::{AuditError, AuditResult, run_audit};

/// 模拟调研模型：每个章节一段带引用的正文，所有批次共享一个来源
#[derive(Default)]
struct MockResearcher {
    research_calls: AtomicUsize,
    followup_calls: AtomicUsize,
    fail_research: bool,
}

#[async_trait]
impl TextGenerator for MockResearcher {
    async fn generate(
        &self,
        role: ModelRole,
        system_prompt: &str,
        user_prompt: &str,
    ) -> AuditResult<String> {
        match role {
            ModelRole::Research => {
                self.research_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_research {
                    return Err(AuditError::GenerationFailure("search offline".to_string()));
                }
                Ok(research_output(system_prompt, user_prompt))
            }
            ModelRole::FollowUp => {
                self.followup_calls.fetch_add(1, Ordering::SeqCst);
                Ok(concat!(
                    "Key competitors include Adidas [1].\n\n",
                    "Sources:\n[1] https://news.example.com/rivals"
                )
                .to_string())
            }
            ModelRole::Greeting => Ok("Hello".to_string()),
        }
    }
}

/// 从系统提示中读出本批次的章节标题，按要求的格式输出
fn research_output(system_prompt: &str, user_prompt: &str) -> String {
    let brand = user_prompt
        .rsplit("brand audit for ")
        .next()
        .unwrap_or("")
        .trim_end_matches('.');
    let headings: Vec<&str> = system_prompt
        .lines()
        .filter(|line| {
            line.split_once(". ")
                .is_some_and(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
        .collect();

    let mut text = String::new();
    for heading in &headings {
        text.push_str(&format!(
            "### {}\n{} fact for this section [1]. Industry context [2].\n\n",
            heading, brand
        ));
    }
    let first = headings.first().copied().unwrap_or("0. none");
    let ordinal = first.split_once('.').map(|(n, _)| n).unwrap_or("0");
    text.push_str(&format!(
        "**Sources Used:**\n[1] {} report part {}. https://{}.example.com/part-{}\n[2] Industry overview. https://industry.example.com/overview\n",
        brand,
        ordinal,
        brand.to_lowercase(),
        ordinal
    ));
    text
}

fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.llm.api_key = "test-key".to_string();
    config.cache.enabled = false;
    config.session.state_dir = temp_dir.path().join("sessions");
    config.output_path = Some(temp_dir.path().join("reports"));
    config
}

fn sessions(config: &Config, generator: Arc<MockResearcher>) -> SessionManager {
    let context = GeneratorContext::with_generator(config.clone(), generator);
    let router = Router::new(context, Arc::new(HeuristicExtractor));
    let store = Arc::new(FileStateStore::new(&config.session.state_dir));
    SessionManager::new(router, store)
}

#[tokio::test]
async fn test_one_shot_audit_report() {
    let temp_dir = TempDir::new().unwrap();
    let generator = Arc::new(MockResearcher::default());
    let context = GeneratorContext::with_generator(test_config(&temp_dir), generator.clone());

    let report = run_audit(&context, "Lululemon").await.unwrap();

    assert_eq!(report.sections.len(), 18);
    assert_eq!(generator.research_calls.load(Ordering::SeqCst), 6);
    // 6个批次各自的来源 + 1个共享来源
    assert_eq!(report.bibliography.len(), 7);
    assert_eq!(
        report.bibliography[1].url.as_deref(),
        Some("https://industry.example.com/overview")
    );
    for section in &report.sections {
        assert!(
            section.content.starts_with("Lululemon fact for this section ["),
            "section {} was not located: {}",
            section.ordinal,
            section.content
        );
    }

    let rendered = report.render();
    assert!(rendered.contains("## 8. Media Partnerships & Agency Relationships"));
    assert!(rendered.contains("[7] Lululemon report part 16."));
    assert!(!rendered.contains("Sources Used"));
}

#[tokio::test]
async fn test_conversation_with_pivot_is_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);
    let generator = Arc::new(MockResearcher::default());

    let first = sessions(&config, generator.clone());
    let replies = first
        .handle_message("demo", "Good morning! Can you analyze Nike?")
        .await
        .unwrap();
    assert_eq!(replies.len(), 2);
    assert!(replies[1].starts_with("# Nike Brand Audit Report"));
    assert!(temp_dir.path().join("reports/nike_brand_audit.md").exists());
    assert!(temp_dir.path().join("sessions/demo.json").exists());

    // 新的进程从文件恢复同一会话
    let resumed = sessions(&config, generator.clone());
    let replies = resumed
        .handle_message("demo", "Who are their main competitors?")
        .await
        .unwrap();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Adidas"));
    assert_eq!(generator.followup_calls.load(Ordering::SeqCst), 1);

    let replies = resumed
        .handle_message("demo", "Audit PepsiCo next")
        .await
        .unwrap();
    assert_eq!(replies.len(), 3);
    assert!(replies[2].starts_with("# PepsiCo Brand Audit Report"));
    assert!(temp_dir.path().join("reports/pepsico_brand_audit.md").exists());

    let state = resumed.state("demo").await.unwrap();
    assert_eq!(state.brand.as_deref(), Some("PepsiCo"));
    assert_eq!(state.new_audit_requested, None);
    assert_eq!(state.stage, Stage::Auditing);
    assert!(state.final_report.is_some());
    assert_eq!(generator.research_calls.load(Ordering::SeqCst), 12);
}

#[tokio::test]
async fn test_failed_audit_can_be_retried() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let failing = Arc::new(MockResearcher {
        fail_research: true,
        ..Default::default()
    });
    let replies = sessions(&config, failing)
        .handle_message("retry", "audit Patagonia")
        .await
        .unwrap();
    assert_eq!(
        replies.last().map(String::as_str),
        Some("Sorry, the brand audit could not be completed, please try again.")
    );

    let working = Arc::new(MockResearcher::default());
    let manager = sessions(&config, working);
    let state = manager.state("retry").await.unwrap();
    assert_eq!(state.brand.as_deref(), Some("Patagonia"));
    assert_eq!(state.final_report, None);

    let replies = manager.handle_message("retry", "try again").await.unwrap();
    assert!(replies[0].starts_with("# Patagonia Brand Audit Report"));
}

#[tokio::test]
async fn test_small_talk_and_strategy_questions_keep_the_session() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);
    let generator = Arc::new(MockResearcher::default());
    let manager = sessions(&config, generator.clone());

    let replies = manager.handle_message("chat", "How are you doing?").await.unwrap();
    assert_eq!(replies.len(), 1);
    let state = manager.state("chat").await.unwrap();
    assert_eq!(state.brand, None);
    assert_eq!(generator.research_calls.load(Ordering::SeqCst), 0);

    let replies = manager.handle_message("chat", "audit Nike").await.unwrap();
    assert!(replies[1].starts_with("# Nike Brand Audit Report"));

    let replies = manager
        .handle_message("chat", "Can we switch to a different topic?")
        .await
        .unwrap();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Adidas"));

    let state = manager.state("chat").await.unwrap();
    assert_eq!(state.brand.as_deref(), Some("Nike"));
    assert_eq!(state.new_audit_requested, None);
    assert!(state.final_report.is_some());
    assert_eq!(generator.research_calls.load(Ordering::SeqCst), 6);
}
