//! Orchestrates the Doodlify phases over a cloned checkout: analyze, process,
//! push and restore. External services sit behind the traits in [`capability`].

pub mod capability;
pub mod git;
pub mod runner;
pub mod state;

#[cfg(test)]
mod testkit;

pub use capability::{
    AnalysisRequest, Analyzer, CodeHost, ImageTransformer, IssueRef, PullRequestRef,
    PullRequestRequest, TextAdapter, ThemeRequest, VersionControl,
};
pub use git::GitCli;
