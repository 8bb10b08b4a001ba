//! Git repository fixtures at three realism levels.
//!
//! Choose the lowest-realism fixture that satisfies your test's needs:
//! fakes are faster and have fewer external dependencies.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Creates a `.git` directory that is **not** a real git repository.
///
/// Realism level: **FAKE**: a marker directory only.
///
/// Use for: asserting that a directory with a `.git` entry that git itself
/// cannot open is still rejected.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_git_dir(path: &Path) {
    fs::create_dir(path.join(".git"))
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to create .git: {e}"));
    fs::write(path.join(".git/HEAD"), "ref: refs/heads/main\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write HEAD: {e}"));
}

/// Initialises a real git repository using `git2` (no commit).
///
/// Realism level: **REAL**: valid git object store, empty history.
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn real_git_repo(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Run `git` with `args` inside `path`, panicking on failure.
///
/// # Panics
/// Panics if git cannot be spawned or exits unsuccessfully.
pub fn run_git(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("run_git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "run_git: `git {args:?}` failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Initialises a real git repository with an identity configured, using the
/// `git` CLI, and no commits.
///
/// Realism level: **REAL WITH HISTORY** once [`commit_all`] is called.
///
/// # Panics
/// Panics if any git operation fails.
pub fn real_git_repo_with_identity(path: &Path) {
    run_git(path, &["init"]);
    run_git(path, &["config", "user.email", "test@test.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
    run_git(path, &["config", "commit.gpgsign", "false"]);
}

/// Stage everything and commit with `message`.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_all(path: &Path, message: &str) {
    run_git(path, &["add", "-A"]);
    run_git(path, &["commit", "--allow-empty", "-m", message]);
}
