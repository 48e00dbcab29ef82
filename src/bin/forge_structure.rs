//! Hierarchy Creator binary.
//!
//! Creates GitLab groups and projects from a markdown outline.

use anyhow::Context;
use clap::Parser;
use forgectl::gitlab::creator::StructureCreator;
use forgectl::gitlab::GitLabClient;
use forgectl::logging;
use forgectl::outline::parse_outline;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process;

/// Create GitLab groups and repositories from a markdown outline
#[derive(Parser)]
#[command(name = "forge-structure")]
#[command(about = "Create GitLab groups and repositories from a markdown outline")]
struct Cli {
    /// Markdown file with the outline
    #[arg(long, short = 'f')]
    file: PathBuf,

    /// GitLab instance URL (e.g. https://gitlab.com)
    #[arg(long, short = 'u')]
    gitlab_url: String,

    /// GitLab personal access token
    #[arg(long, short = 't')]
    token: String,

    /// Parent group ID to create everything under
    #[arg(long, short = 'p')]
    parent_group_id: Option<u64>,

    /// Print what would be created without creating it
    #[arg(long, short = 'd')]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} Fatal error: {:#}", "✗".red(), e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("error reading file '{}'", cli.file.display()))?;

    banner("Parsing markdown structure...");
    let structure = parse_outline(&content);
    if structure.is_empty() {
        anyhow::bail!("no valid structure found in markdown file");
    }
    println!(
        "{} Parsed structure with {} root item(s)\n",
        "✓".green(),
        structure.len()
    );

    banner("Creating GitLab structure...");
    let creator = if cli.dry_run {
        StructureCreator::dry_run(cli.parent_group_id)
    } else {
        let api = GitLabClient::new(&cli.gitlab_url, &cli.token)?;
        StructureCreator::new(api, cli.parent_group_id)
    };

    creator.authenticate().await.context("authentication failed")?;
    let stats = creator.run(&structure).await;

    banner("Completed");
    println!("{}", stats.summary(cli.dry_run));
    Ok(())
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}\n", "=".repeat(60));
}
