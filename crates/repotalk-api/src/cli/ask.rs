//! One-shot `ask` command: ingest, prompt, generate, print.

use repotalk_core::chat::build_prompt;
use repotalk_types::config::AppConfig;
use repotalk_types::repo::RepoRef;

use crate::state::{build_generator, build_ingest_service};

/// Run a single ingest + generate cycle outside any session.
pub async fn ask(config: &AppConfig, owner: &str, repo: &str, question: &str) -> anyhow::Result<()> {
    let ingest = build_ingest_service(config);
    let generator = build_generator(config);

    let repo_ref = RepoRef::new(owner, repo);
    println!(
        "  {} Ingesting {}...",
        console::style("⏳").bold(),
        console::style(&repo_ref).cyan()
    );
    let digest = ingest.ingest(&repo_ref).await?;
    tracing::debug!(summary = %digest.summary, "repository ingested");

    let prompt = build_prompt(question, &[], &digest.tree, &digest.content);
    let answer = generator.generate(&prompt).await?;

    println!();
    println!("{answer}");
    Ok(())
}
