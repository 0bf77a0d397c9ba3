//! GitHub REST v3 implementation of the code-hosting capability: deduplicated
//! issue filing and idempotent pull-request creation.

pub mod client;
pub mod host;

pub use client::{GitHubClient, RepoName, DEFAULT_API_BASE};
