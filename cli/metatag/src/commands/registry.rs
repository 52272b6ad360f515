//! Local registry commands: register, tag, check.

use std::collections::BTreeSet;

use anyhow::Result;
use metatag_registry::{RegistryGraph, VersionSpec, Workspace};

/// Run `metatag register <package> [url]`.
pub fn register(ws: &Workspace, package: &str, url: Option<&str>) -> Result<()> {
    let reg = metatag_registry::register(ws, package, url).map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("Registering {} at {}", reg.package, reg.url);
    for version in &reg.versions {
        println!("  v{version}");
    }
    match &reg.commit {
        Some(commit) => println!("Committed {} to the registry.", short(commit)),
        None => println!("Registry already up to date."),
    }
    Ok(())
}

/// Run `metatag tag <package> <version|selector> [--force] [--commit <ref>]`.
pub fn tag(
    ws: &Workspace,
    package: &str,
    version: &str,
    commit: Option<&str>,
    force: bool,
) -> Result<()> {
    let spec: VersionSpec = version.parse().map_err(|e| anyhow::anyhow!("{e}"))?;
    let out = metatag_registry::tag(ws, package, &spec, commit, force)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let kind = if out.rewritable { " (rewritable)" } else { "" };
    println!(
        "Tagged {} v{} at {}{kind}",
        out.package,
        out.version,
        short(&out.commit)
    );
    if let Some(commit) = &out.registry_commit {
        println!("Recorded {} v{} in the registry ({}).", out.package, out.version, short(commit));
    }
    Ok(())
}

/// Run `metatag check [packages...]`.
pub fn check(ws: &Workspace, packages: &[String]) -> Result<()> {
    let scope: BTreeSet<String> = packages.iter().cloned().collect();
    metatag_registry::check_metadata(ws.registry_dir(), &scope, &RegistryGraph)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if scope.is_empty() {
        println!("Registry metadata is consistent.");
    } else {
        let names: Vec<&str> = scope.iter().map(String::as_str).collect();
        println!("Registry metadata is consistent for {}.", names.join(", "));
    }
    Ok(())
}

/// Abbreviate a commit id for display.
pub fn short(commit: &str) -> &str {
    commit.get(..8).unwrap_or(commit)
}
