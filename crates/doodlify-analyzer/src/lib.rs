//! Deterministic repository analysis: finds themable images and translation
//! files, matches the configured selector, and proposes readiness improvements.

pub mod markup;
pub mod scan;
pub mod suggest;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use doodlify_conductor::{AnalysisRequest, Analyzer};
use doodlify_core::{AnalysisResult, Error};
use doodlify_files::{is_backup, to_repo_relative};
use regex::Regex;
use serde_json::json;

use crate::markup::{declared_selectors, image_references, SelectorMatcher, MAX_SELECTORS};
use crate::scan::{extension, inventory};
use crate::suggest::{detect_frameworks, suggestions, Findings};

const MARKUP_EXTENSIONS: &[&str] = &["tsx", "jsx", "html", "htm", "vue", "svelte"];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less"];

static FAVICON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)favicon|rel=["'](?:shortcut\s+)?icon["']"#).unwrap());
static CSS_VARIABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--[A-Za-z0-9_-]+\s*:").unwrap());
static OG_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)og:image").unwrap());

/// The analysis capability backed by a filesystem scan. Needs no network.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticAnalyzer;

impl Analyzer for StaticAnalyzer {
    fn analyze(&self, req: &AnalysisRequest<'_>) -> Result<AnalysisResult> {
        scan_repository(req)
    }
}

pub fn scan_repository(req: &AnalysisRequest<'_>) -> Result<AnalysisResult> {
    let root = req.repo_root;
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()).into());
    }
    let selector = match req.selector.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some((s, SelectorMatcher::new(s)?)),
        None => None,
    };

    let inv = inventory(root, req.sources);
    let mut findings = Findings {
        frontend_files: inv.frontend.len(),
        i18n_files: inv.i18n.len(),
        ..Default::default()
    };

    let mut images: BTreeSet<String> = inv.images.iter().map(|p| to_repo_relative(root, p)).collect();
    findings.has_favicon = images.iter().any(|p| file_name(p).starts_with("favicon"));
    let texts: BTreeSet<String> = inv.i18n.iter().map(|p| to_repo_relative(root, p)).collect();
    let mut selector_matches = BTreeSet::new();
    let mut selectors = BTreeSet::new();
    let mut markup_sampled = 0;

    for path in &inv.frontend {
        let Some(content) = read_lossy(path) else { continue };
        let ext = extension(path).unwrap_or_default();
        let is_markup = MARKUP_EXTENSIONS.contains(&ext.as_str());
        let is_style = STYLE_EXTENSIONS.contains(&ext.as_str());

        images.extend(image_references(&content).into_iter().filter(|r| !is_backup(Path::new(r))));
        findings.has_favicon |= FAVICON.is_match(&content);
        findings.has_og_image |= OG_IMAGE.is_match(&content);
        if is_style {
            findings.stylesheets += 1;
            findings.has_css_variables |= CSS_VARIABLE.is_match(&content);
        }
        if is_markup {
            findings.markup_files += 1;
            if let Some((_, matcher)) = &selector {
                if matcher.is_match(&content) {
                    selector_matches.insert(to_repo_relative(root, path));
                }
            }
            if markup_sampled < MAX_SELECTORS {
                markup_sampled += 1;
                declared_selectors(&content, &mut selectors);
            }
        }
    }

    let files_of_interest: Vec<String> = if selector_matches.is_empty() {
        images.union(&texts).cloned().collect()
    } else {
        selector_matches.iter().cloned().collect()
    };

    let mut notes = BTreeMap::new();
    notes.insert(
        "frameworks".to_string(),
        json!(detect_frameworks(root, &inv.roots, &inv.frontend)),
    );
    notes.insert("frontendFiles".to_string(), json!(inv.frontend.len()));
    notes.insert(
        "sourceRoots".to_string(),
        json!(inv.roots.iter().map(|r| to_repo_relative(root, r)).collect::<Vec<_>>()),
    );
    if let Some((s, _)) = &selector {
        notes.insert(
            "selector".to_string(),
            json!({ "selector": s, "matches": selector_matches.len() }),
        );
    }

    tracing::debug!(
        images = images.len(),
        texts = texts.len(),
        selector_matches = selector_matches.len(),
        "scan complete"
    );

    Ok(AnalysisResult {
        files_of_interest,
        image_files: images.into_iter().collect(),
        text_files: texts.into_iter().collect(),
        selectors_found: selectors.into_iter().take(MAX_SELECTORS).collect(),
        notes,
        improvement_suggestions: suggestions(&findings),
        analyzed_at: None,
    })
}

fn read_lossy(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
            None
        }
    }
}

fn file_name(rel: &str) -> String {
    rel.rsplit('/').next().unwrap_or(rel).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(root: &Path, rel: &str, data: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    fn site() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        write(
            &root,
            "frontend/src/App.tsx",
            r#"import logo from "./logo.svg";
               export const App = () => <main className="hero page"><img src="/images/hero.png" id="main-hero" /></main>;"#,
        );
        write(&root, "frontend/src/logo.svg", "<svg/>");
        write(&root, "frontend/src/Footer.tsx", r#"<footer className="site-footer">Bye</footer>"#);
        write(&root, "frontend/src/styles.css", ".page { color: red; }");
        write(&root, "frontend/src/locales/en.json", r#"{"greeting":"Hello"}"#);
        write(&root, "frontend/public/images/hero.png", "png");
        write(&root, "frontend/node_modules/pkg/icon.png", "png");
        write(&root, "frontend/package.json", r#"{"dependencies":{"react":"18"}}"#);
        (tmp, root)
    }

    fn request<'a>(root: &'a Path, sources: &'a [String], selector: Option<&'a str>) -> AnalysisRequest<'a> {
        AnalysisRequest {
            repo_root: root,
            sources,
            selector,
            project_description: "Demo",
        }
    }

    #[test]
    fn scans_images_texts_and_selectors() {
        let (_tmp, root) = site();
        let sources = vec!["frontend".to_string()];
        let result = StaticAnalyzer.analyze(&request(&root, &sources, None)).unwrap();

        assert_eq!(
            result.image_files,
            vec![
                "frontend/public/images/hero.png",
                "frontend/src/logo.svg",
                "images/hero.png",
                "logo.svg",
            ]
        );
        assert_eq!(result.text_files, vec!["frontend/src/locales/en.json"]);
        assert!(result.files_of_interest.contains(&"frontend/src/locales/en.json".to_string()));
        assert_eq!(result.selectors_found, vec!["#main-hero", ".hero", ".page", ".site-footer"]);
        assert_eq!(result.notes["frameworks"], json!(["react"]));
        assert_eq!(result.notes["sourceRoots"], json!(["frontend"]));
        assert!(result.analyzed_at.is_none());

        let keys: Vec<_> = result.improvement_suggestions.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["favicon_establish", "css_variables", "og_add"]);
    }

    #[test]
    fn selector_narrows_files_of_interest() {
        let (_tmp, root) = site();
        let sources = vec!["frontend".to_string()];
        let result = StaticAnalyzer
            .analyze(&request(&root, &sources, Some("footer.site-footer")))
            .unwrap();
        assert_eq!(result.files_of_interest, vec!["frontend/src/Footer.tsx"]);
        assert_eq!(result.notes["selector"]["matches"], json!(1));
    }

    #[test]
    fn themed_tree_reports_live_files_only() {
        let (_tmp, root) = site();
        write(&root, "frontend/public/images/hero.original.png", "png");
        write(&root, "frontend/src/locales/en.original.json", r#"{"greeting":"Hello"}"#);
        write(&root, "frontend/src/Banner.tsx", r#"<img src="/images/banner.original.png" />"#);
        let sources = vec!["frontend".to_string()];
        let result = StaticAnalyzer.analyze(&request(&root, &sources, None)).unwrap();

        assert!(result.image_files.iter().all(|p| !p.contains(".original.")));
        assert!(result.image_files.contains(&"frontend/public/images/hero.png".to_string()));
        assert_eq!(result.text_files, vec!["frontend/src/locales/en.json"]);
    }

    #[test]
    fn missing_checkout_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let gone = tmp.path().join("gone");
        let err = StaticAnalyzer.analyze(&request(&gone, &[], None)).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotFound(_))));
    }
}
