//! Tagging versions and keeping the registry in step with the tags.

mod common;

use common::{commit_file, git, git_available, tag_commit, tags, Fixture};
use metatag_registry::{register, tag, RegistryError, Version, VersionSpec};

fn spec(s: &str) -> VersionSpec {
    s.parse().unwrap()
}

fn pointer(fx: &Fixture, package: &str, version: &str) -> String {
    let path = fx
        .registry()
        .join(format!("{package}/versions/{version}/sha1"));
    std::fs::read_to_string(path).unwrap().trim().to_string()
}

#[test]
fn explicit_version_then_conflicting_retag() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let foo = fx.package("Foo");
    let c1 = commit_file(&foo, "a.txt", "one\n");
    git(&foo, &["tag", "v1.1.0", &c1]);
    register(&fx.ws, "Foo", Some("https://example.com/Foo.git")).unwrap();

    let c2 = commit_file(&foo, "a.txt", "two\n");
    let out = tag(&fx.ws, "Foo", &spec("1.2.0"), None, false).unwrap();
    assert_eq!(out.version, Version::new(1, 2, 0));
    assert_eq!(out.commit, c2);
    assert!(out.rewritable);
    assert!(out.registry_commit.is_some());
    assert_eq!(tag_commit(&foo, "v1.2.0"), c2);
    assert_eq!(pointer(&fx, "Foo", "1.2.0"), c2);
    assert_eq!(
        git(fx.registry(), &["log", "-1", "--format=%s"]),
        "Tag Foo v1.2.0"
    );
    let registry_head = git(fx.registry(), &["rev-parse", "HEAD"]);

    let c3 = commit_file(&foo, "a.txt", "three\n");
    let err = tag(&fx.ws, "Foo", &spec("1.2.0"), Some(&c3), false).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::PointerConflict { ref existing, ref attempted, .. }
            if *existing == c2 && *attempted == c3
    ));
    // The tag went back to where it was; the registry is untouched.
    assert_eq!(tag_commit(&foo, "v1.2.0"), c2);
    assert_eq!(pointer(&fx, "Foo", "1.2.0"), c2);
    assert_eq!(git(fx.registry(), &["rev-parse", "HEAD"]), registry_head);
    assert!(git(fx.registry(), &["status", "--porcelain"]).is_empty());
}

#[test]
fn failed_registry_update_deletes_new_tag() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let foo = fx.package("Foo");
    let c1 = commit_file(&foo, "a.txt", "one\n");
    git(&foo, &["tag", "v1.0.1", &c1]);
    register(&fx.ws, "Foo", Some("https://example.com/Foo.git")).unwrap();
    git(&foo, &["tag", "-d", "v1.0.1"]);

    commit_file(&foo, "a.txt", "two\n");
    let err = tag(&fx.ws, "Foo", &spec("1.0.1"), None, false).unwrap_err();
    assert!(matches!(err, RegistryError::PointerConflict { .. }));
    assert!(!tags(&foo).contains(&"v1.0.1".to_string()));
    assert_eq!(pointer(&fx, "Foo", "1.0.1"), c1);
}

#[test]
fn selector_follows_ancestry() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let foo = fx.package("Foo");
    let c1 = commit_file(&foo, "a.txt", "one\n");
    git(&foo, &["tag", "v1.0.0", &c1]);
    register(&fx.ws, "Foo", Some("https://example.com/Foo.git")).unwrap();

    let c2 = commit_file(&foo, "REQUIRE", "Bar\n");
    let out = tag(&fx.ws, "Foo", &spec("patch"), None, false).unwrap();
    assert_eq!(out.version, Version::new(1, 0, 1));
    assert!(!out.rewritable);
    assert_eq!(tag_commit(&foo, "v1.0.1"), c2);
    // Immutable versions get annotated tags.
    assert_eq!(git(&foo, &["cat-file", "-t", "v1.0.1"]), "tag");
    let message = git(&foo, &["tag", "-l", "--format=%(contents:subject)", "v1.0.1"]);
    assert_eq!(message, format!("Foo v1.0.1 [{}]", &c2[..10]));
    assert_eq!(pointer(&fx, "Foo", "1.0.1"), c2);
    let requires = fx.registry().join("Foo/versions/1.0.1/requires");
    assert_eq!(std::fs::read_to_string(requires).unwrap(), "Bar\n");

    // From the first commit the next patch is 1.0.1 again, which exists.
    let err = tag(&fx.ws, "Foo", &spec("patch"), Some(&c1), false).unwrap_err();
    assert!(matches!(err, RegistryError::VersionConflict { .. }));
    assert_eq!(tag_commit(&foo, "v1.0.1"), c2);
}

#[test]
fn unregistered_package_uses_its_tags() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let bar = fx.package("Bar");
    let c1 = commit_file(&bar, "a.txt", "one\n");

    let out = tag(&fx.ws, "Bar", &spec("patch"), None, false).unwrap();
    assert_eq!(out.version, Version::new(0, 0, 1));
    assert_eq!(out.registry_commit, None);
    assert_eq!(tag_commit(&bar, "v0.0.1"), c1);

    commit_file(&bar, "a.txt", "two\n");
    let out = tag(&fx.ws, "Bar", &spec("minor"), None, false).unwrap();
    assert_eq!(out.version, Version::new(0, 1, 0));
    assert!(out.rewritable);
    // Rewritable versions get lightweight tags.
    assert_eq!(git(&bar, &["cat-file", "-t", "v0.1.0"]), "commit");
    assert!(!fx.registry().join("Bar").exists());
}

#[test]
fn force_moves_immutable_version() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let foo = fx.package("Foo");
    let c1 = commit_file(&foo, "a.txt", "one\n");
    git(&foo, &["tag", "v1.0.1", &c1]);
    register(&fx.ws, "Foo", Some("https://example.com/Foo.git")).unwrap();

    let c2 = commit_file(&foo, "a.txt", "two\n");
    assert!(matches!(
        tag(&fx.ws, "Foo", &spec("1.0.1"), None, false).unwrap_err(),
        RegistryError::TagCreationError { .. }
    ));
    assert_eq!(tag_commit(&foo, "v1.0.1"), c1);

    tag(&fx.ws, "Foo", &spec("1.0.1"), None, true).unwrap();
    assert_eq!(tag_commit(&foo, "v1.0.1"), c2);
    assert_eq!(pointer(&fx, "Foo", "1.0.1"), c2);
}

#[test]
fn dirty_trees_block_tagging() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let foo = fx.package("Foo");
    register(&fx.ws, "Foo", Some("https://example.com/Foo.git")).unwrap();

    std::fs::write(foo.join("README.md"), "edited\n").unwrap();
    let err = tag(&fx.ws, "Foo", &spec("patch"), None, false).unwrap_err();
    assert!(matches!(err, RegistryError::DirtyWorkingTree { ref path } if *path == foo));
    git(&foo, &["checkout", "--", "README.md"]);

    std::fs::write(fx.registry().join("Foo/url"), "https://example.com/Other.git\n").unwrap();
    let err = tag(&fx.ws, "Foo", &spec("patch"), None, false).unwrap_err();
    assert!(matches!(err, RegistryError::DirtyWorkingTree { .. }));
    assert!(tags(&foo).is_empty());
}

#[test]
fn unknown_commit() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    fx.package("Foo");
    let err = tag(&fx.ws, "Foo", &spec("1.0.0"), Some("no-such-ref"), false).unwrap_err();
    assert!(matches!(err, RegistryError::UnknownCommit { ref reference, .. } if reference == "no-such-ref"));
}

#[test]
fn rollback_ignores_branch_named_like_the_tag() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let foo = fx.package("Foo");
    let c1 = commit_file(&foo, "a.txt", "one\n");
    git(&foo, &["tag", "v1.0.1", &c1]);
    register(&fx.ws, "Foo", Some("https://example.com/Foo.git")).unwrap();
    git(&foo, &["tag", "-d", "v1.0.1"]);
    git(&foo, &["branch", "v1.0.1", &c1]);

    commit_file(&foo, "a.txt", "two\n");
    let err = tag(&fx.ws, "Foo", &spec("1.0.1"), None, false).unwrap_err();
    assert!(matches!(err, RegistryError::PointerConflict { .. }));
    // The tag did not exist before, so it is gone rather than recreated at
    // the branch's commit.
    assert!(!tags(&foo).contains(&"v1.0.1".to_string()));
    assert_eq!(git(&foo, &["rev-parse", "refs/heads/v1.0.1"]), c1);
}

#[test]
fn registry_commit_contains_only_the_entry() {
    if !git_available() {
        return;
    }
    let fx = Fixture::new();
    let foo = fx.package("Foo");
    register(&fx.ws, "Foo", Some("https://example.com/Foo.git")).unwrap();

    std::fs::write(fx.registry().join("README.md"), "staged elsewhere\n").unwrap();
    git(fx.registry(), &["add", "README.md"]);

    let c1 = commit_file(&foo, "a.txt", "one\n");
    tag(&fx.ws, "Foo", &spec("1.2.0"), None, false).unwrap();
    assert_eq!(
        git(fx.registry(), &["show", "--name-only", "--format=", "HEAD"]),
        "Foo/versions/1.2.0/sha1"
    );
    assert_eq!(pointer(&fx, "Foo", "1.2.0"), c1);
    assert_eq!(
        git(fx.registry(), &["diff", "--cached", "--name-only"]),
        "README.md"
    );
}
