//! Seams to the outside world. The conductor only talks to these traits; the
//! CLI wires in the git, OpenAI, GitHub and static-analysis implementations.

use std::path::{Path, PathBuf};

use doodlify_core::{AnalysisResult, CommitError};

pub struct AnalysisRequest<'a> {
    pub repo_root: &'a Path,
    pub sources: &'a [String],
    pub selector: Option<&'a str>,
    pub project_description: &'a str,
}

pub trait Analyzer {
    fn analyze(&self, req: &AnalysisRequest<'_>) -> anyhow::Result<AnalysisResult>;
}

/// One file to re-theme in place.
pub struct ThemeRequest<'a> {
    pub path: &'a Path,
    pub event_name: &'a str,
    pub event_description: &'a str,
    pub use_color_palette: bool,
}

/// Rewrites a raster image in place. Callers gate formats beforehand.
pub trait ImageTransformer {
    fn transform(&self, req: &ThemeRequest<'_>) -> anyhow::Result<()>;
}

/// Rewrites user-facing strings of a structured text file in place.
pub trait TextAdapter {
    fn adapt(&self, req: &ThemeRequest<'_>) -> anyhow::Result<()>;
}

pub trait VersionControl {
    /// Make the checkout current on `branch`, cloning if needed. Returns the checkout root.
    fn clone_or_update(&self, branch: &str) -> anyhow::Result<PathBuf>;
    /// Check out `name`, creating it from `from` when it does not exist.
    fn create_branch(&self, name: &str, from: &str) -> anyhow::Result<()>;
    /// Stash uncommitted work, leaving `exclude` untouched. Returns false when
    /// there was nothing to stash.
    fn stash_push(&self, message: &str, exclude: &[String]) -> anyhow::Result<bool>;
    fn stash_apply(&self) -> anyhow::Result<()>;
    /// Commit exactly `paths`. Returns the new commit id.
    fn commit(&self, message: &str, paths: &[String]) -> Result<String, CommitError>;
    fn push_branch(&self, name: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub number: u64,
    pub url: Option<String>,
}

pub struct PullRequestRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub number: u64,
    pub url: String,
}

pub trait CodeHost {
    /// Open an issue unless one with the same title is already open.
    fn create_or_find_issue(&self, title: &str, body: &str, labels: &[String]) -> anyhow::Result<IssueRef>;
    /// Open a pull request, or return the one already open for `head`.
    fn create_pull_request(&self, req: &PullRequestRequest<'_>) -> anyhow::Result<PullRequestRef>;
}
