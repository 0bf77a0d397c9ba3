//! In-memory capabilities and a ledger fixture for runner tests.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use doodlify_core::{AnalysisResult, CommitError, Config, Suggestion};
use doodlify_ledger::{LedgerLocation, LedgerMode, LedgerStore};
use tempfile::TempDir;

use crate::capability::{
    AnalysisRequest, Analyzer, CodeHost, ImageTransformer, IssueRef, PullRequestRef,
    PullRequestRequest, TextAdapter, ThemeRequest, VersionControl,
};

pub(crate) const CONFIG: &str = r#"{
    "project": { "name": "Acme", "description": "Marketing site", "sources": ["frontend"] },
    "defaults": { "branchPrefix": "feature/event/" },
    "events": [
        { "id": "christmas", "name": "Christmas", "description": "Snow and lights",
          "startDate": "2024-12-01", "endDate": "2024-12-31", "branch": "christmas-2024" },
        { "id": "halloween", "name": "Halloween", "description": "Pumpkins",
          "startDate": "2024-10-20", "endDate": "2024-10-31", "branch": "halloween-2024" }
    ]
}"#;

pub(crate) struct Fixture {
    _tmp: TempDir,
    pub repo: PathBuf,
    pub store: LedgerStore,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_mode(LedgerMode::Workspace)
    }

    pub fn with_mode(mode: LedgerMode) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = tmp.path().join("ws");
        let repo = workspace.join("acme");
        fs::create_dir_all(&repo).unwrap();
        let config = Config::from_json_str(CONFIG).unwrap();
        let store = LedgerStore::new(config, LedgerLocation::resolve(mode, &workspace, &repo));
        Self {
            _tmp: tmp,
            repo,
            store,
        }
    }

    pub fn write(&self, rel: &str, data: &str) -> PathBuf {
        let path = self.repo.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, data).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.repo.join(rel)).unwrap()
    }
}

pub(crate) fn ts(s: &str) -> jiff::Timestamp {
    s.parse().unwrap()
}

/// Mid-December, Christmas is active.
pub(crate) fn december() -> jiff::Timestamp {
    ts("2024-12-15T12:00:00Z")
}

// ── Analyzer ──

#[derive(Default)]
pub(crate) struct FakeAnalyzer {
    pub result: AnalysisResult,
    pub fail: bool,
    pub calls: Cell<usize>,
}

impl FakeAnalyzer {
    pub fn with_files(images: &[&str], texts: &[&str]) -> Self {
        Self {
            result: AnalysisResult {
                image_files: images.iter().map(|s| s.to_string()).collect(),
                text_files: texts.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_suggestions(suggestions: Vec<Suggestion>) -> Self {
        Self {
            result: AnalysisResult {
                improvement_suggestions: suggestions,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl Analyzer for FakeAnalyzer {
    fn analyze(&self, _req: &AnalysisRequest<'_>) -> Result<AnalysisResult> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            bail!("analysis service unavailable");
        }
        Ok(self.result.clone())
    }
}

// ── Transformers ──

/// Prefixes file content with a marker. Fails for file names in `fail_on`.
#[derive(Default)]
pub(crate) struct FakeTheme {
    pub fail_on: Vec<String>,
    pub calls: RefCell<Vec<PathBuf>>,
}

impl FakeTheme {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            fail_on: names.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn apply(&self, path: &Path, event_name: &str) -> Result<()> {
        self.calls.borrow_mut().push(path.to_path_buf());
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if self.fail_on.iter().any(|f| f == name) {
            // Leave a half-written file behind, like a failed upload would.
            fs::write(path, "partial")?;
            bail!("model rejected {name}");
        }
        let content = fs::read_to_string(path)?;
        fs::write(path, format!("{event_name}:{content}"))?;
        Ok(())
    }
}

impl ImageTransformer for FakeTheme {
    fn transform(&self, req: &ThemeRequest<'_>) -> Result<()> {
        self.apply(req.path, req.event_name)
    }
}

impl TextAdapter for FakeTheme {
    fn adapt(&self, req: &ThemeRequest<'_>) -> Result<()> {
        self.apply(req.path, req.event_name)
    }
}

// ── Version control ──

#[derive(Default)]
pub(crate) struct FakeVcs {
    pub stash_has_changes: bool,
    pub fail_stash_apply: bool,
    pub fail_branch: bool,
    pub nothing_to_commit: bool,
    pub fail_push_for: Vec<String>,
    pub log: RefCell<Vec<String>>,
    pub commits: RefCell<Vec<(String, Vec<String>)>>,
    pub stash_excludes: RefCell<Vec<Vec<String>>>,
}

impl FakeVcs {
    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.borrow().len()
    }
}

impl VersionControl for FakeVcs {
    fn clone_or_update(&self, branch: &str) -> Result<PathBuf> {
        self.log.borrow_mut().push(format!("update {branch}"));
        Ok(PathBuf::new())
    }

    fn create_branch(&self, name: &str, from: &str) -> Result<()> {
        self.log.borrow_mut().push(format!("branch {name} from {from}"));
        if self.fail_branch {
            bail!("cannot create {name}");
        }
        Ok(())
    }

    fn stash_push(&self, _message: &str, exclude: &[String]) -> Result<bool> {
        self.log.borrow_mut().push("stash push".into());
        self.stash_excludes.borrow_mut().push(exclude.to_vec());
        Ok(self.stash_has_changes)
    }

    fn stash_apply(&self) -> Result<()> {
        self.log.borrow_mut().push("stash apply".into());
        if self.fail_stash_apply {
            bail!("conflict in README");
        }
        Ok(())
    }

    fn commit(&self, message: &str, paths: &[String]) -> std::result::Result<String, CommitError> {
        self.log.borrow_mut().push("commit".into());
        if self.nothing_to_commit {
            return Err(CommitError::NothingToCommit);
        }
        let mut commits = self.commits.borrow_mut();
        commits.push((message.to_string(), paths.to_vec()));
        Ok(format!("{:040x}", commits.len()))
    }

    fn push_branch(&self, name: &str) -> Result<()> {
        self.log.borrow_mut().push(format!("push {name}"));
        if self.fail_push_for.iter().any(|b| b == name) {
            bail!("remote rejected {name}");
        }
        Ok(())
    }
}

// ── Code host ──

#[derive(Default)]
pub(crate) struct FakeHost {
    pub issues: RefCell<Vec<String>>,
    pub pulls: RefCell<Vec<(String, String)>>,
}

impl CodeHost for FakeHost {
    fn create_or_find_issue(&self, title: &str, _body: &str, _labels: &[String]) -> Result<IssueRef> {
        let mut issues = self.issues.borrow_mut();
        issues.push(title.to_string());
        let number = issues.len() as u64;
        Ok(IssueRef {
            number,
            url: Some(format!("https://github.com/acme/site/issues/{number}")),
        })
    }

    fn create_pull_request(&self, req: &PullRequestRequest<'_>) -> Result<PullRequestRef> {
        let mut pulls = self.pulls.borrow_mut();
        pulls.push((req.head.to_string(), req.base.to_string()));
        let number = pulls.len() as u64;
        Ok(PullRequestRef {
            number,
            url: format!("https://github.com/acme/site/pull/{number}"),
        })
    }
}
