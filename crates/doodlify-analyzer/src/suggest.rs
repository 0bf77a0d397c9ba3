use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use doodlify_core::Suggestion;

/// Dependency name to framework label, checked in `package.json`.
const FRAMEWORK_DEPS: &[(&str, &str)] = &[
    ("next", "next"),
    ("react", "react"),
    ("vue", "vue"),
    ("nuxt", "nuxt"),
    ("svelte", "svelte"),
    ("@sveltejs/kit", "sveltekit"),
    ("@angular/core", "angular"),
    ("astro", "astro"),
];

const LABELS: &[&str] = &["doodlify", "enhancement"];

/// What the scan learned about the checkout, as far as suggestions care.
#[derive(Debug, Default)]
pub struct Findings {
    pub frontend_files: usize,
    pub markup_files: usize,
    pub stylesheets: usize,
    pub has_favicon: bool,
    pub has_css_variables: bool,
    pub has_og_image: bool,
    pub i18n_files: usize,
}

/// Frameworks named as dependencies in any `package.json` at the checkout
/// root or a scanned root, plus those implied by single-file components.
pub fn detect_frameworks(repo_root: &Path, roots: &[PathBuf], frontend: &[PathBuf]) -> Vec<String> {
    let mut found = BTreeSet::new();
    let manifests = std::iter::once(repo_root.to_path_buf()).chain(roots.iter().cloned());
    for dir in manifests {
        let Ok(content) = fs::read_to_string(dir.join("package.json")) else { continue };
        let manifest: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "unreadable package.json");
                continue;
            }
        };
        for section in ["dependencies", "devDependencies"] {
            let Some(deps) = manifest.get(section).and_then(|d| d.as_object()) else { continue };
            for (dep, label) in FRAMEWORK_DEPS {
                if deps.contains_key(*dep) {
                    found.insert(label.to_string());
                }
            }
        }
    }
    for path in frontend {
        match path.extension().and_then(|e| e.to_str()) {
            Some("vue") => found.insert("vue".into()),
            Some("svelte") => found.insert("svelte".into()),
            _ => false,
        };
    }
    found.into_iter().collect()
}

pub fn suggestions(f: &Findings) -> Vec<Suggestion> {
    let mut out = Vec::new();
    if f.frontend_files == 0 {
        return out;
    }
    if !f.has_favicon {
        out.push(suggestion(
            "favicon_establish",
            "Establish a favicon",
            "No favicon was found in the scanned sources. Adding a favicon file \
             (for example `public/favicon.png`) referenced from the document head \
             gives each event a place to show a themed icon.",
            vec!["no favicon file or <link rel=\"icon\"> found".into()],
            0.8,
        ));
    }
    if f.stylesheets > 0 && !f.has_css_variables {
        out.push(suggestion(
            "css_variables",
            "Move theme colors into CSS custom properties",
            "Stylesheets were found but none declare CSS custom properties. Defining \
             brand colors as variables on `:root` lets an event palette be swapped in \
             without touching every rule.",
            vec![format!("{} stylesheet(s) without `--*` declarations", f.stylesheets)],
            0.7,
        ));
    }
    if f.i18n_files == 0 {
        out.push(suggestion(
            "i18n",
            "Extract user-facing copy into translation files",
            "No i18n or locale JSON files were found. Keeping copy in message files \
             allows event-specific wording to be adapted without code changes.",
            vec!["no locale JSON files under the scanned roots".into()],
            0.5,
        ));
    }
    if f.markup_files > 0 && !f.has_og_image {
        out.push(suggestion(
            "og_add",
            "Add an Open Graph image",
            "No `og:image` meta tag was found. A social preview image can be themed \
             per event so shared links reflect the current campaign.",
            vec!["no og:image meta tag in markup".into()],
            0.6,
        ));
    }
    out
}

fn suggestion(key: &str, title: &str, body: &str, evidence: Vec<String>, confidence: f64) -> Suggestion {
    Suggestion {
        key: key.into(),
        title: title.into(),
        body: body.into(),
        labels: LABELS.iter().map(|l| l.to_string()).collect(),
        evidence,
        confidence: Some(confidence),
    }
}
