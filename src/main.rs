use anyhow::Result;
use braudit::cli::Args;
use braudit::conversation::{
    BrandExtractor, FileStateStore, HeuristicExtractor, LlmBrandExtractor, Router, SessionManager,
};
use braudit::generator::context::GeneratorContext;
use braudit::llm::LLMClient;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "/q"];

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let default_filter = if args.verbose {
        "braudit=debug"
    } else {
        "braudit=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let session_id = args.session.clone();
    let message = args.message.clone();
    let brand = args.brand.clone();
    let config = args.into_config()?;

    // 缺少凭据时在处理任何输入之前退出
    config.ensure_credentials()?;

    if let Some(brand) = brand {
        let report = braudit::launch(&config, &brand).await?;
        println!("{}", report);
        return Ok(());
    }

    let llm_client = LLMClient::new(config.clone())?;
    let extractor: Arc<dyn BrandExtractor> = if config.llm.llm_brand_extraction {
        Arc::new(LlmBrandExtractor::new(llm_client.clone()))
    } else {
        Arc::new(HeuristicExtractor)
    };
    let context = GeneratorContext::with_generator(config.clone(), Arc::new(llm_client));
    let store = Arc::new(FileStateStore::new(&config.session.state_dir));
    let sessions = SessionManager::new(Router::new(context, extractor), store);

    if let Some(message) = message {
        for reply in sessions.handle_message(&session_id, &message).await? {
            println!("{}\n", reply);
        }
        return Ok(());
    }

    let state = sessions.state(&session_id).await?;
    tracing::info!(
        session = %session_id,
        stage = %state.stage,
        brand = ?state.brand,
        "💬 进入对话模式，输入 exit 退出"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
            break;
        }

        for reply in sessions.handle_message(&session_id, line).await? {
            println!("\n{}\n", reply);
        }
    }

    Ok(())
}
