//! Secrets Provisioner binary.
//!
//! Provisions the four deploy secrets on a GitHub repository.

use clap::Parser;
use forgectl::github::secrets::{collect_secret_values, provision_secrets, resolve_repo_url};
use forgectl::github::GitHubClient;
use forgectl::logging;
use forgectl::prompt::ConsolePrompt;
use owo_colors::OwoColorize;
use std::process;

/// Provision CI/CD deploy secrets on a GitHub repository
#[derive(Parser)]
#[command(name = "forge-secrets")]
#[command(about = "Provision CI/CD deploy secrets on a GitHub repository")]
struct Cli {
    /// Repository URL (https://github.com/owner/repo or git@github.com:owner/repo.git)
    repository_url: String,

    /// GitHub token with repo scope
    token: String,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "[ERROR]".red(), e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let (owner, repo) = resolve_repo_url(&cli.repository_url).ok_or_else(|| {
        anyhow::anyhow!(
            "invalid repository URL format; expected https://github.com/owner/repo \
             or git@github.com:owner/repo.git"
        )
    })?;

    status(&format!("Repository: {}/{}", owner, repo));

    let api = GitHubClient::new(&cli.token)?;

    status("Verifying access to repository...");
    if !api.verify_repo_access(&owner, &repo).await {
        anyhow::bail!(
            "cannot access repository {}/{}; check that it exists and the token has repo scope",
            owner,
            repo
        );
    }
    status("Repository access verified");

    status("Getting repository public key...");
    let key = api
        .get_public_key(&owner, &repo)
        .await
        .map_err(|e| anyhow::anyhow!("failed to get repository public key: {}", e))?;

    let mut prompt = ConsolePrompt;
    let entries = collect_secret_values(&mut prompt)?;

    println!();
    status("Creating secrets...");
    let outcome = provision_secrets(&api, &owner, &repo, &key, &entries).await;

    println!();
    if outcome.all_succeeded() {
        status("All secrets have been set up successfully!");
        status(&format!(
            "You can verify them at: https://github.com/{}/{}/settings/secrets/actions",
            owner, repo
        ));
        Ok(true)
    } else {
        eprintln!(
            "{} Only {}/{} secrets were created successfully",
            "[ERROR]".red(),
            outcome.succeeded,
            outcome.requested
        );
        Ok(false)
    }
}

fn status(message: &str) {
    println!("{} {}", "[INFO]".green(), message);
}
