use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use doodlify_bridge_github::GitHubClient;
use doodlify_bridge_openai::OpenAiClient;
use doodlify_conductor::{GitCli, VersionControl};
use doodlify_core::Config;
use doodlify_ledger::{ConfigOverrides, LedgerLocation, LedgerMode, LedgerStore};

use crate::env::Settings;

/// Repository manifest that may override the operator's configuration.
const REPO_MANIFEST: &str = "doodlify.json";

/// Everything a command needs: the ledger, the checkout and its git handle.
pub struct Session {
    pub store: LedgerStore,
    pub git: GitCli,
}

impl Session {
    /// Bring the checkout up to date on the base branch, then open the ledger
    /// with any repository manifest applied.
    pub fn online(config_path: &Path, settings: &Settings, github: &GitHubClient) -> Result<Self> {
        let config = load_config(config_path, settings)?;
        let git = GitCli::new(github.clone_url(), &settings.workspace_dir);
        let mut store = open_store(config_path, config, settings, git.checkout());
        let git = carry_ledger(git, &store);
        println!("▶ Syncing {} ({})", github.repo().full_name(), store.config().base_branch());
        git.clone_or_update(store.config().base_branch())
            .context("preparing the repository checkout")?;

        let manifest = git.checkout().join(REPO_MANIFEST);
        if manifest.is_file() && !same_file(&manifest, config_path) {
            let overrides = ConfigOverrides::load(&manifest)?;
            if !overrides.is_empty() {
                store.apply_overrides(&overrides)?;
                println!("  ✓ Applied overrides from {REPO_MANIFEST}");
            }
        }
        Ok(Self { store, git })
    }

    /// Open the ledger of an existing (or not yet cloned) checkout without
    /// touching the network.
    pub fn offline(config_path: &Path, settings: &Settings) -> Result<Self> {
        let config = load_config(config_path, settings)?;
        let remote = format!("https://github.com/{}.git", settings.repo_name()?);
        let git = GitCli::new(remote, &settings.workspace_dir);
        let store = open_store(config_path, config, settings, git.checkout());
        let git = carry_ledger(git, &store);
        Ok(Self { store, git })
    }

    pub fn checkout(&self) -> &Path {
        self.git.checkout()
    }
}

pub fn github_client(settings: &Settings) -> Result<GitHubClient> {
    Ok(GitHubClient::new(settings.github_token()?, settings.repo_name()?)?)
}

pub fn openai_client(settings: &Settings) -> Result<OpenAiClient> {
    let mut client = OpenAiClient::new(settings.openai_api_key()?);
    if let Some(model) = &settings.image_model {
        client = client.with_image_model(model);
    }
    if let Some(model) = &settings.text_model {
        client = client.with_text_model(model);
    }
    Ok(client)
}

pub fn load_config(config_path: &Path, settings: &Settings) -> Result<Config> {
    let mut config =
        Config::load(config_path).with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(target) = &settings.target_branch {
        config.project.target_branch = Some(target.clone());
    }
    Ok(config)
}

fn open_store(config_path: &Path, config: Config, settings: &Settings, checkout: &Path) -> LedgerStore {
    let mode = LedgerMode::from_config_path(config_path);
    tracing::debug!(?mode, checkout = %checkout.display(), "opening ledger");
    LedgerStore::new(config, LedgerLocation::resolve(mode, &settings.workspace_dir, checkout))
}

/// An in-repo ledger must keep its latest bytes across branch switches.
fn carry_ledger(git: GitCli, store: &LedgerStore) -> GitCli {
    git.with_carried_paths(store.location().repo_relative().map(String::from))
}

fn same_file(a: &Path, b: &Path) -> bool {
    let canon = |p: &Path| -> Option<PathBuf> { p.canonicalize().ok() };
    match (canon(a), canon(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
