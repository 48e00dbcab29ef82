//! Repository Lister binary.
//!
//! Writes every project the token can access as `<clone address>
//! <namespace path>` lines.

use clap::Parser;
use forgectl::gitlab::lister::{list_accessible_projects, write_records};
use forgectl::gitlab::GitLabClient;
use forgectl::logging;
use std::path::PathBuf;
use std::process;

/// List repositories accessible to the caller
#[derive(Parser)]
#[command(name = "forge-repos")]
#[command(about = "List every repository the token can access")]
struct Cli {
    /// GitLab instance URL (e.g. https://gitlab.com)
    #[arg(long, env = "GITLAB_URL")]
    gitlab_url: String,

    /// Personal access token with read_api scope
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    token: String,

    /// Output file for the repository list
    #[arg(long, default_value = "repos.txt")]
    output: PathBuf,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let api = match GitLabClient::new(&cli.gitlab_url, &cli.token) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    println!("Fetching all repositories you have access to...");
    let records = list_accessible_projects(&api).await;

    if records.is_empty() {
        println!("No repositories found or error occurred.");
        return;
    }

    println!("Found {} repositories.", records.len());
    if let Err(e) = write_records(&records, &cli.output) {
        eprintln!("Error writing {}: {}", cli.output.display(), e);
        process::exit(1);
    }
    println!(
        "Repository clone addresses and paths saved to {}",
        cli.output.display()
    );
}
