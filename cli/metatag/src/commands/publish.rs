//! Remote-facing commands: publish, submit.

use anyhow::Result;
use metatag_registry::{PullRequest, RegistryGraph, Workspace};
use metatag_vcs::GhCli;

use crate::commands::registry::short;
use crate::config::MetatagConfig;

/// Run `metatag publish [branch] [--pr-branch <name>]`.
pub fn publish(
    ws: &Workspace,
    config: &MetatagConfig,
    branch: &str,
    pr_branch: Option<&str>,
) -> Result<()> {
    let hosting = GhCli::with_program(config.hosting.tool.as_str());
    let report = metatag_registry::publish(ws, branch, pr_branch, &RegistryGraph, &hosting)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    for push in &report.pushes {
        if !push.forced.is_empty() {
            println!("Pushing {} tags (forced): {}", push.package, push.forced.join(", "));
        }
        if !push.unforced.is_empty() {
            println!("Pushing {} tags: {}", push.package, push.unforced.join(", "));
        }
    }
    print_pull_request(&report.pull_request);
    Ok(())
}

/// Run `metatag submit <package> [commit]`.
pub fn submit(
    ws: &Workspace,
    config: &MetatagConfig,
    package: &str,
    commit: Option<&str>,
) -> Result<()> {
    let hosting = GhCli::with_program(config.hosting.tool.as_str());
    let pr = metatag_registry::submit(ws, package, commit, &hosting)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    print_pull_request(&pr);
    Ok(())
}

fn print_pull_request(pr: &PullRequest) {
    println!(
        "Pushed {} to {} on {}'s fork of {}",
        short(&pr.commit),
        pr.branch,
        pr.user,
        pr.repository
    );
    println!("To create a pull request, open:");
    println!();
    println!("  {}", pr.compare_url);
    println!();
}
