//! Version-control access.
//!
//! [`Repository`] is the read-only subset of a checkout the link pipeline
//! needs. [`GitCli`] implements it by shelling out to `git`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, instrument};

use pdblink_shared::{PdbLinkError, Result};

/// Read-only handle to an open checkout.
pub trait Repository {
    /// Root of the working tree.
    fn workdir(&self) -> &Path;

    /// Remote URLs in the order `git remote` lists them (alphabetical by name).
    fn remotes(&self) -> Result<Vec<String>>;

    /// The commit HEAD points at, or `None` for a repository without commits.
    fn head_commit(&self) -> Result<Option<String>>;

    /// Tracked paths relative to [`Repository::workdir`], `/`-separated.
    fn tracked_files(&self) -> Result<Vec<String>>;
}

/// Opens a [`Repository`] rooted at a directory.
pub trait RepositoryOpener: Send + Sync {
    /// A [`PdbLinkError::Discovery`] means `root` is not a checkout.
    fn open(&self, root: &Path) -> Result<Box<dyn Repository>>;
}

/// Walk upward from `start` to the nearest directory containing `.git`.
///
/// `.git` may be a directory or a file (worktrees, submodules).
pub fn find_repository_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ---------------------------------------------------------------------------
// git CLI
// ---------------------------------------------------------------------------

/// [`RepositoryOpener`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".into(),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `git` executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RepositoryOpener for GitCli {
    #[instrument(skip(self), fields(root = %root.display()))]
    fn open(&self, root: &Path) -> Result<Box<dyn Repository>> {
        let output = run_git(&self.program, root, &["rev-parse", "--show-toplevel"])?;
        if !output.status.success() {
            return Err(PdbLinkError::discovery(format!(
                "{} is not a git checkout: {}",
                root.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let toplevel = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(workdir = %toplevel, "opened git repository");

        Ok(Box::new(GitRepository {
            program: self.program.clone(),
            workdir: PathBuf::from(toplevel),
        }))
    }
}

struct GitRepository {
    program: String,
    workdir: PathBuf,
}

impl GitRepository {
    fn git(&self, args: &[&str]) -> Result<Output> {
        run_git(&self.program, &self.workdir, args)
    }

    /// Run `args` and return stdout, failing on a non-zero exit.
    fn git_stdout(&self, args: &[&str]) -> Result<String> {
        let output = self.git(args)?;
        if !output.status.success() {
            return Err(PdbLinkError::Repository(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Repository for GitRepository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn remotes(&self) -> Result<Vec<String>> {
        let names = self.git_stdout(&["remote"])?;

        let mut urls = Vec::new();
        for name in names.lines().map(str::trim).filter(|n| !n.is_empty()) {
            let url = self.git_stdout(&["remote", "get-url", name])?;
            let url = url.trim();
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
        Ok(urls)
    }

    fn head_commit(&self) -> Result<Option<String>> {
        let output = self.git(&["rev-parse", "--verify", "--quiet", "HEAD^{commit}"])?;
        if !output.status.success() {
            return Ok(None);
        }
        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!sha.is_empty()).then_some(sha))
    }

    fn tracked_files(&self) -> Result<Vec<String>> {
        let stdout = self.git_stdout(&["ls-files", "-z"])?;
        Ok(stdout
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }
}

fn run_git(program: &str, dir: &Path, args: &[&str]) -> Result<Output> {
    Command::new(program)
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(|e| {
            PdbLinkError::Repository(format!("failed to run {program}: {e}. Is git installed?"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pdblink-repo-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[test]
    fn finds_nearest_checkout_root() {
        let dir = temp_dir();
        let nested = dir.join("repo").join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(dir.join("repo").join(".git")).unwrap();

        assert_eq!(find_repository_root(&nested), Some(dir.join("repo")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn git_file_marks_a_worktree_root() {
        let dir = temp_dir();
        std::fs::create_dir_all(dir.join("wt").join("src")).unwrap();
        std::fs::write(dir.join("wt").join(".git"), "gitdir: /elsewhere\n").unwrap();

        assert_eq!(
            find_repository_root(&dir.join("wt").join("src")),
            Some(dir.join("wt"))
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_git_binary_is_a_repository_error() {
        let dir = temp_dir();
        let err = GitCli::with_program("pdblink-no-such-git").open(&dir).err().unwrap();
        assert!(matches!(err, PdbLinkError::Repository(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reads_a_real_checkout() {
        if !git_available() {
            return;
        }

        let dir = temp_dir();
        git(&dir, &["init", "--quiet"]);
        git(&dir, &["config", "user.email", "dev@example.com"]);
        git(&dir, &["config", "user.name", "dev"]);
        git(&dir, &["config", "commit.gpgsign", "false"]);
        git(&dir, &["remote", "add", "upstream", "git@bitbucket.org:team/widgets.git"]);
        git(&dir, &["remote", "add", "origin", "https://github.com/octo/widgets.git"]);

        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(dir.join("src").join("Main.cs"), "class Main {}").unwrap();
        std::fs::write(dir.join("untracked.cs"), "").unwrap();

        let repo = GitCli::new().open(&dir).unwrap();
        assert_eq!(repo.head_commit().unwrap(), None);

        git(&dir, &["add", "src/Main.cs"]);
        git(&dir, &["commit", "--quiet", "-m", "init"]);

        let head = repo.head_commit().unwrap().unwrap();
        assert_eq!(head.len(), 40);
        assert_eq!(
            repo.remotes().unwrap(),
            vec![
                "https://github.com/octo/widgets.git",
                "git@bitbucket.org:team/widgets.git",
            ]
        );
        assert_eq!(repo.tracked_files().unwrap(), vec!["src/Main.cs"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn plain_directory_is_not_a_checkout() {
        if !git_available() {
            return;
        }

        let dir = temp_dir();
        // Skip when the temp dir itself sits inside a checkout.
        let Err(err) = GitCli::new().open(&dir) else {
            let _ = std::fs::remove_dir_all(&dir);
            return;
        };
        assert!(err.is_not_found());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
