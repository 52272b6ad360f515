//! [`ContentStore`] implementation backed by the `git` command-line tool.
//!
//! Every call runs `git -C <root> ...` so no process-wide working directory
//! is ever relied upon.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{Result, StoreError};
use crate::store::ContentStore;

/// A git working tree.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Open the working tree rooted at `path`.
    ///
    /// The directory itself must hold the repository (`.git` directory or
    /// file); a subdirectory of some other checkout is rejected.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        if !root.join(".git").exists() {
            return Err(StoreError::NotARepository { path: root });
        }
        Ok(GitRepo { root })
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(["-c", "core.quotepath=off"])
            .args(args)
            .output()?;
        Ok(output)
    }

    fn failed(&self, args: &[&str], output: &Output) -> StoreError {
        StoreError::CommandFailed {
            command: args.join(" "),
            path: self.root.clone(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Run a command that must succeed and return its stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(self.failed(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a command whose exit status 0/1 answers a yes/no question.
    fn probe(&self, args: &[&str]) -> Result<bool> {
        let output = self.output(args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(self.failed(args, &output)),
        }
    }

    /// Resolve an object expression, `None` if it names nothing.
    fn verify(&self, spec: &str) -> Result<Option<String>> {
        let output = self.output(&["rev-parse", "-q", "--verify", spec])?;
        if !output.status.success() {
            return Ok(None);
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if id.is_empty() { None } else { Some(id) })
    }

    /// Remove now-empty directories between `path` and the root.
    fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            if std::fs::remove_dir(current).is_err() {
                break;
            }
            dir = current.parent();
        }
    }
}

fn lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

impl ContentStore for GitRepo {
    fn work_dir(&self) -> &Path {
        &self.root
    }

    fn head(&self) -> Result<String> {
        self.resolve_ref("HEAD")?
            .ok_or_else(|| StoreError::UnexpectedOutput {
                command: "rev-parse HEAD".to_string(),
                detail: format!("{} has no commits", self.root.display()),
            })
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let output = self.output(&["symbolic-ref", "-q", "--short", "HEAD"])?;
        if !output.status.success() {
            return Ok(None);
        }
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if name.is_empty() { None } else { Some(name) })
    }

    fn is_commit(&self, id: &str) -> Result<bool> {
        Ok(self.resolve_ref(id)?.is_some())
    }

    fn resolve_ref(&self, reference: &str) -> Result<Option<String>> {
        self.verify(&format!("{reference}^{{commit}}"))
    }

    fn tag_list(&self) -> Result<Vec<String>> {
        Ok(lines(&self.run(&["tag", "--list"])?))
    }

    fn tag_create(&self, name: &str, target: &str, message: &str, force: bool) -> Result<()> {
        let mut args = vec!["tag"];
        if force {
            args.push("-f");
        }
        if !message.is_empty() {
            args.extend(["-a", "-m", message]);
        }
        args.extend([name, target]);
        self.run(&args).map(|_| ())
    }

    fn tag_delete(&self, name: &str) -> Result<()> {
        self.run(&["tag", "-d", name]).map(|_| ())
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        self.probe(&["merge-base", "--is-ancestor", ancestor, descendant])
    }

    fn diff(&self, from: &str, to: &str) -> Result<Vec<String>> {
        Ok(lines(&self.run(&[
            "diff",
            "--name-only",
            "--diff-filter=AM",
            from,
            to,
        ])?))
    }

    fn read_blob_at(&self, reference: &str, path: &str) -> Result<Option<Vec<u8>>> {
        let Some(oid) = self.verify(&format!("{reference}:{path}"))? else {
            return Ok(None);
        };
        let args = ["cat-file", "blob", oid.as_str()];
        let output = self.output(&args)?;
        if !output.status.success() {
            return Err(self.failed(&args, &output));
        }
        Ok(Some(output.stdout))
    }

    fn is_dirty(&self, scope: Option<&str>) -> Result<bool> {
        let mut args = vec!["status", "--porcelain", "--untracked-files=no"];
        if let Some(scope) = scope {
            args.extend(["--", scope]);
        }
        Ok(!self.run(&args)?.trim().is_empty())
    }

    fn stage(&self, path: &str) -> Result<()> {
        self.run(&["add", "-A", "--", path]).map(|_| ())
    }

    fn restore(&self, path: &str) -> Result<()> {
        if self.verify(&format!("HEAD:{path}"))?.is_some() {
            return self.run(&["checkout", "HEAD", "--", path]).map(|_| ());
        }
        self.run(&["rm", "-q", "--cached", "--ignore-unmatch", "--", path])?;
        let full = self.root.join(path);
        if full.is_file() {
            std::fs::remove_file(&full)?;
        }
        self.prune_empty_parents(&full);
        Ok(())
    }

    fn has_staged_changes(&self, paths: &[String]) -> Result<bool> {
        let mut args = vec!["diff", "--cached", "--quiet", "--"];
        args.extend(paths.iter().map(String::as_str));
        // `diff --quiet` exits 1 when there are differences.
        Ok(!self.probe(&args)?)
    }

    fn commit(&self, message: &str, paths: &[String]) -> Result<String> {
        let mut args = vec!["commit", "-q", "-m", message, "--only", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args)?;
        self.head()
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.run(&["fetch", "-q", remote]).map(|_| ())
    }

    fn rev_count(&self, a: &str, b: &str) -> Result<(usize, usize)> {
        let range = format!("{a}...{b}");
        let stdout = self.run(&["rev-list", "--left-right", "--count", &range])?;
        let unexpected = || StoreError::UnexpectedOutput {
            command: format!("rev-list --left-right --count {range}"),
            detail: stdout.trim().to_string(),
        };
        let mut counts = stdout.split_whitespace().map(str::parse::<usize>);
        match (counts.next(), counts.next()) {
            (Some(Ok(left)), Some(Ok(right))) => Ok((left, right)),
            _ => Err(unexpected()),
        }
    }

    fn push(&self, remote: &str, refspecs: &[String], force: bool) -> Result<()> {
        let mut args = vec!["push", "-q"];
        if force {
            args.push("--force");
        }
        args.push(remote);
        args.extend(refspecs.iter().map(String::as_str));
        self.run(&args).map(|_| ())
    }

    fn config(&self, key: &str) -> Result<Option<String>> {
        let args = ["config", "--get", key];
        let output = self.output(&args)?;
        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string())),
            Some(1) => Ok(None),
            _ => Err(self.failed(&args, &output)),
        }
    }
}
