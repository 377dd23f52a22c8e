//! Git repository fixtures holding a cartridge tree.

use std::path::Path;
use std::process::Command;

use crate::fixture::CartridgeFixture;

/// Writes `fixture` into `path` and commits it with `git2`.
///
/// Realism level: **REAL WITH HISTORY**. The repository has one commit on
/// its default branch and can be cloned with the `git` CLI.
///
/// # Panics
/// Panics if any git or filesystem operation fails.
pub fn cartridge_git_repo(path: &Path, fixture: &CartridgeFixture) -> git2::Repository {
    fixture.write_to(path);

    let repo = git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "cartridge_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    });

    {
        let mut index = repo
            .index()
            .unwrap_or_else(|e| panic!("cartridge_git_repo: failed to open index: {e}"));
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap_or_else(|e| panic!("cartridge_git_repo: failed to stage files: {e}"));
        index
            .write()
            .unwrap_or_else(|e| panic!("cartridge_git_repo: failed to write index: {e}"));
        let tree_id = index
            .write_tree()
            .unwrap_or_else(|e| panic!("cartridge_git_repo: failed to write tree: {e}"));
        let tree = repo
            .find_tree(tree_id)
            .unwrap_or_else(|e| panic!("cartridge_git_repo: failed to find tree: {e}"));
        let signature = git2::Signature::now("Test User", "test@test.com")
            .unwrap_or_else(|e| panic!("cartridge_git_repo: failed to build signature: {e}"));
        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            "Initial cartridge commit",
            &tree,
            &[],
        )
        .unwrap_or_else(|e| panic!("cartridge_git_repo: failed to commit: {e}"));
    }

    repo
}

/// Whether the `git` CLI can be run in this environment.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
