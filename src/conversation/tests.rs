use std::sync::Arc;

use crate::config::Config;
use crate::conversation::greeting::{ASK_FOR_BRAND, HeuristicExtractor};
use crate::conversation::router::{AUDIT_FAILED, Dispatch, Router, route};
use crate::conversation::session::SessionManager;
use crate::conversation::store::MemoryStateStore;
use crate::error::AuditError;
use crate::generator::context::GeneratorContext;
use crate::llm::ModelRole;
use crate::testing::{ScriptedGenerator, fake_research_output, test_config};
use crate::types::{ChatMessage, ConversationState, Stage};

fn state(brand: Option<&str>, report: Option<&str>) -> ConversationState {
    ConversationState {
        brand: brand.map(str::to_string),
        final_report: report.map(str::to_string),
        ..Default::default()
    }
}

fn answering_generator() -> Arc<ScriptedGenerator> {
    ScriptedGenerator::new(|role, _, user| match role {
        ModelRole::Research => Ok(fake_research_output(user)),
        _ => Ok("Their main rivals are Adidas and Puma [1].".to_string()),
    })
}

fn router(generator: Arc<ScriptedGenerator>, config: Config) -> Router {
    let context = GeneratorContext::with_generator(config, generator);
    Router::new(context, Arc::new(HeuristicExtractor))
}

fn manager(generator: Arc<ScriptedGenerator>, config: Config) -> SessionManager {
    SessionManager::new(
        router(generator, config),
        Arc::new(MemoryStateStore::new()),
    )
}

#[test]
fn test_route_without_brand_greets() {
    let (next, dispatch) = route(state(None, None));

    assert_eq!(dispatch, Dispatch::Greeting { seed: None });
    assert_eq!(next.stage, Stage::Greeting);
}

#[test]
fn test_route_with_brand_runs_audit() {
    let (next, dispatch) = route(state(Some("nike"), None));

    assert_eq!(
        dispatch,
        Dispatch::Audit {
            brand: "nike".to_string()
        }
    );
    assert_eq!(next.stage, Stage::Auditing);
}

#[test]
fn test_route_with_report_answers_followup() {
    let (next, dispatch) = route(state(Some("nike"), Some("...")));

    assert_eq!(
        dispatch,
        Dispatch::FollowUp {
            brand: "nike".to_string()
        }
    );
    assert_eq!(next.stage, Stage::Completed);
}

#[test]
fn test_route_pivot_resets_and_seeds_greeting() {
    let mut current = state(Some("nike"), Some("..."));
    current.stage = Stage::Completed;
    current.new_audit_requested = Some("pepsi".to_string());
    current.history = vec![ChatMessage::user("audit pepsi next")];

    let (next, dispatch) = route(current);

    assert_eq!(
        dispatch,
        Dispatch::Greeting {
            seed: Some("pepsi".to_string())
        }
    );
    assert_eq!(next.brand, None);
    assert_eq!(next.final_report, None);
    assert_eq!(next.new_audit_requested, None);
    assert_eq!(next.stage, Stage::Greeting);
    assert_eq!(next.history.len(), 1);
}

#[test]
fn test_route_treats_blank_fields_as_absent() {
    let (_, dispatch) = route(state(Some("  "), None));
    assert_eq!(dispatch, Dispatch::Greeting { seed: None });

    let (_, dispatch) = route(state(Some("nike"), Some("")));
    assert!(matches!(dispatch, Dispatch::Audit { .. }));

    let mut blank_pivot = state(Some("nike"), Some("..."));
    blank_pivot.new_audit_requested = Some(" ".to_string());
    let (next, dispatch) = route(blank_pivot);
    assert!(matches!(dispatch, Dispatch::FollowUp { .. }));
    assert_eq!(next.new_audit_requested, None);
    assert_eq!(next.final_report.as_deref(), Some("..."));
}

#[tokio::test]
async fn test_greeting_turn_sets_brand() {
    let router = router(answering_generator(), test_config());

    let outcome = router
        .transition(ConversationState::default(), Some("hello, lululemon"))
        .await;

    assert_eq!(outcome.state.brand.as_deref(), Some("lululemon"));
    assert_eq!(
        outcome.reply,
        "Great! I'll create a comprehensive brand audit for lululemon..."
    );
    assert!(outcome.continue_chain);
    assert_eq!(outcome.state.history.len(), 2);
}

#[tokio::test]
async fn test_greeting_turn_without_brand_asks() {
    let router = router(answering_generator(), test_config());

    let outcome = router
        .transition(ConversationState::default(), Some("Hi there!"))
        .await;

    assert_eq!(outcome.state.brand, None);
    assert_eq!(outcome.reply, ASK_FOR_BRAND);
    assert!(!outcome.continue_chain);
}

#[tokio::test]
async fn test_small_talk_does_not_start_an_audit() {
    let generator = answering_generator();
    let router = router(generator.clone(), test_config());

    for message in ["How are you?", "hey, how's it going?", "Hi! What's up?"] {
        let outcome = router
            .transition(ConversationState::default(), Some(message))
            .await;

        assert_eq!(outcome.state.brand, None, "{}", message);
        assert_eq!(outcome.state.stage, Stage::Greeting);
        assert_eq!(outcome.reply, ASK_FOR_BRAND);
        assert!(!outcome.continue_chain);
    }
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_strategy_question_keeps_the_report() {
    let generator = answering_generator();
    let router = router(generator.clone(), test_config());
    let mut current = state(Some("Nike"), Some("# Nike Brand Audit Report"));
    current.stage = Stage::Completed;

    let outcome = router
        .transition(current, Some("How could Nike change to a subscription model?"))
        .await;

    assert_eq!(outcome.dispatch, Dispatch::FollowUp { brand: "Nike".to_string() });
    assert_eq!(outcome.state.new_audit_requested, None);
    assert_eq!(outcome.state.brand.as_deref(), Some("Nike"));
    assert_eq!(
        outcome.state.final_report.as_deref(),
        Some("# Nike Brand Audit Report")
    );
    assert!(!outcome.continue_chain);
    assert!(outcome.reply.contains("Adidas"));
    assert_eq!(generator.calls_for(ModelRole::FollowUp), 1);
}

#[tokio::test]
async fn test_audit_turn_stores_report() {
    let generator = answering_generator();
    let router = router(generator.clone(), test_config());

    let outcome = router.transition(state(Some("Nike"), None), None).await;

    let report = outcome.state.final_report.clone().unwrap();
    assert!(report.starts_with("# Nike Brand Audit Report"));
    assert_eq!(outcome.reply, report);
    assert!(!outcome.continue_chain);
    assert_eq!(generator.calls_for(ModelRole::Research), 6);
    // 没有用户输入时只记录回复
    assert_eq!(outcome.state.history.len(), 1);
}

#[tokio::test]
async fn test_failed_audit_leaves_report_unset() {
    let generator = ScriptedGenerator::new(|_, _, _| {
        Err(AuditError::GenerationFailure("offline".to_string()))
    });
    let router = router(generator, test_config());

    let outcome = router.transition(state(Some("Nike"), None), None).await;

    assert_eq!(outcome.reply, AUDIT_FAILED);
    assert_eq!(outcome.state.final_report, None);
    assert_eq!(outcome.state.brand.as_deref(), Some("Nike"));
    assert!(!outcome.continue_chain);
    // 下一轮会重新尝试审计
    let (_, dispatch) = route(outcome.state);
    assert!(matches!(dispatch, Dispatch::Audit { .. }));
}

#[tokio::test]
async fn test_followup_turn_detects_pivot() {
    let generator = answering_generator();
    let router = router(generator.clone(), test_config());

    let outcome = router
        .transition(state(Some("Nike"), Some("report")), Some("Audit PepsiCo next"))
        .await;

    assert_eq!(outcome.state.new_audit_requested.as_deref(), Some("PepsiCo"));
    assert_eq!(outcome.state.brand.as_deref(), Some("Nike"));
    assert!(outcome.continue_chain);
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_session_full_conversation() {
    let generator = answering_generator();
    let sessions = manager(generator.clone(), test_config());

    let replies = sessions.handle_message("s1", "hello, Nike").await.unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(
        replies[0],
        "Great! I'll create a comprehensive brand audit for Nike..."
    );
    assert!(replies[1].starts_with("# Nike Brand Audit Report"));

    let replies = sessions
        .handle_message("s1", "Who are the competitors?")
        .await
        .unwrap();
    assert_eq!(
        replies,
        vec!["Their main rivals are Adidas and Puma [1].".to_string()]
    );
    assert_eq!(generator.calls_for(ModelRole::FollowUp), 1);
    assert_eq!(sessions.state("s1").await.unwrap().stage, Stage::Completed);

    let replies = sessions
        .handle_message("s1", "Another brand: Pepsi")
        .await
        .unwrap();
    assert_eq!(replies.len(), 3);
    assert_eq!(
        replies[0],
        "I'll start a new brand audit for Pepsi. Let me begin the comprehensive analysis..."
    );
    assert_eq!(
        replies[1],
        "Great! I'll create a comprehensive brand audit for Pepsi..."
    );
    assert!(replies[2].starts_with("# Pepsi Brand Audit Report"));

    let state = sessions.state("s1").await.unwrap();
    assert_eq!(state.brand.as_deref(), Some("Pepsi"));
    assert_eq!(state.new_audit_requested, None);
    assert!(state.final_report.unwrap().starts_with("# Pepsi"));
    assert_eq!(generator.calls_for(ModelRole::Research), 12);
}

#[tokio::test]
async fn test_session_without_auto_continue_waits_for_input() {
    let mut config = test_config();
    config.session.auto_continue = false;
    let sessions = manager(answering_generator(), config);

    let replies = sessions.handle_message("s1", "audit Nike").await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(sessions.state("s1").await.unwrap().final_report, None);

    let replies = sessions.handle_message("s1", "go ahead").await.unwrap();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("# Nike Brand Audit Report"));
}

#[tokio::test]
async fn test_session_failure_does_not_retry_within_turn() {
    let generator = ScriptedGenerator::new(|role, _, _| match role {
        ModelRole::Research => Err(AuditError::GenerationFailure("quota".to_string())),
        _ => Ok("unused".to_string()),
    });
    let sessions = manager(generator.clone(), test_config());

    let replies = sessions.handle_message("s1", "audit Nike").await.unwrap();

    assert_eq!(replies.len(), 2);
    assert_eq!(replies[1], AUDIT_FAILED);
    assert_eq!(generator.calls_for(ModelRole::Research), 6);
    let state = sessions.state("s1").await.unwrap();
    assert_eq!(state.final_report, None);
    assert_eq!(state.brand.as_deref(), Some("Nike"));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let sessions = manager(answering_generator(), test_config());

    sessions.handle_message("a", "hello, Nike").await.unwrap();
    sessions.handle_message("b", "Hi there!").await.unwrap();

    assert_eq!(
        sessions.state("a").await.unwrap().brand.as_deref(),
        Some("Nike")
    );
    assert_eq!(sessions.state("b").await.unwrap().brand, None);
    assert!(sessions.handle_message("../x", "hi").await.is_err());
}

#[tokio::test]
async fn test_concurrent_turns_on_one_session_are_serialized() {
    let sessions = manager(answering_generator(), test_config());

    let (first, second) = tokio::join!(
        sessions.handle_message("s1", "hello"),
        sessions.handle_message("s1", "hi there")
    );
    first.unwrap();
    second.unwrap();

    // 两轮都被记录，没有互相覆盖
    assert_eq!(sessions.state("s1").await.unwrap().history.len(), 4);
}
