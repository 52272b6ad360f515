//! Throw-away registry and package repositories for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use metatag_registry::Workspace;
use metatag_vcs::{parse_github_url, Fork, HostingApi, HostingError, RepoSlug, User};
use tempfile::TempDir;

pub fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed in {:?}: {}",
        args,
        dir,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn configure(dir: &Path) {
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["config", "tag.gpgsign", "false"]);
}

pub fn init_repo(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure(dir);
}

pub fn commit_file(dir: &Path, file: &str, contents: &str) -> String {
    let path = dir.join(file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", &format!("edit {file}")]);
    git(dir, &["rev-parse", "HEAD"])
}

pub fn tags(dir: &Path) -> Vec<String> {
    let mut tags: Vec<String> = git(dir, &["tag", "--list"])
        .lines()
        .map(str::to_string)
        .collect();
    tags.sort();
    tags
}

pub fn tag_commit(dir: &Path, tag: &str) -> String {
    git(dir, &["rev-parse", &format!("{tag}^{{commit}}")])
}

/// Give `dir` a bare `origin` holding its current history.
fn add_origin(dir: &Path, bare: &Path) {
    let bare_str = bare.to_str().unwrap();
    git(dir, &["clone", "-q", "--bare", ".", bare_str]);
    git(dir, &["remote", "add", "origin", bare_str]);
    git(dir, &["fetch", "-q", "origin"]);
}

/// A registry checkout and a packages directory, each repository backed by
/// a bare origin under `remotes/`.
pub struct Fixture {
    pub root: TempDir,
    pub ws: Workspace,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let registry = root.path().join("work/METADATA");
        let packages = root.path().join("work/packages");
        std::fs::create_dir_all(root.path().join("remotes")).unwrap();
        std::fs::create_dir_all(&packages).unwrap();

        init_repo(&registry);
        commit_file(&registry, "README.md", "registry\n");
        add_origin(&registry, &root.path().join("remotes/METADATA.git"));

        let ws = Workspace::new(registry, packages);
        Fixture { root, ws }
    }

    pub fn registry(&self) -> &Path {
        self.ws.registry_dir()
    }

    pub fn remote(&self, name: &str) -> PathBuf {
        self.root.path().join("remotes").join(format!("{name}.git"))
    }

    /// Create package `name` with one initial commit; returns its directory.
    pub fn package(&self, name: &str) -> PathBuf {
        let dir = self.ws.package_dir(name);
        init_repo(&dir);
        commit_file(&dir, "README.md", &format!("{name}\n"));
        add_origin(&dir, &self.remote(name));
        dir
    }

    pub fn hosting(&self) -> FakeHosting {
        let forks = self.root.path().join("forks");
        std::fs::create_dir_all(&forks).unwrap();
        FakeHosting {
            forks,
            login: "tester".to_string(),
        }
    }
}

/// Hosting API whose forks are local bare repositories. Any local path is
/// accepted as a remote URL.
pub struct FakeHosting {
    pub forks: PathBuf,
    pub login: String,
}

impl FakeHosting {
    pub fn fork_dir(&self, slug: &RepoSlug) -> PathBuf {
        self.forks.join(format!("{}.git", slug.repo))
    }
}

impl HostingApi for FakeHosting {
    fn current_user(&self) -> Result<User, HostingError> {
        Ok(User {
            login: self.login.clone(),
        })
    }

    fn fork(&self, slug: &RepoSlug) -> Result<Fork, HostingError> {
        let dir = self.fork_dir(slug);
        if !dir.exists() {
            let status = Command::new("git")
                .args(["init", "-q", "--bare"])
                .arg(&dir)
                .status()?;
            if !status.success() {
                return Err(HostingError::CommandFailed {
                    command: "git init --bare".to_string(),
                    stderr: String::new(),
                });
            }
        }
        Ok(Fork {
            ssh_url: dir.display().to_string(),
            html_url: format!("https://github.com/{}/{}", self.login, slug.repo),
        })
    }

    fn parse_remote(&self, url: &str) -> Option<RepoSlug> {
        if let Some(slug) = parse_github_url(url) {
            return Some(slug);
        }
        let name = Path::new(url).file_name()?.to_str()?;
        Some(RepoSlug {
            owner: "local".to_string(),
            repo: name.trim_end_matches(".git").to_string(),
        })
    }
}
