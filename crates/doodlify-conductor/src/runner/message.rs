//! Commit and pull-request text.

use doodlify_core::{EventConfig, EventLock};

const COMMIT_FILE_LIMIT: usize = 10;
const PR_FILE_LIMIT: usize = 20;

pub fn commit_message(event: &EventConfig, files: &[String]) -> String {
    let mut msg = format!(
        "feat: Apply {name} theme customizations\n\n\
         Applied event-themed decorations for {name}\n\
         Event period: {start} to {end}\n\n\
         Modified files:\n",
        name = event.name,
        start = event.start_date,
        end = event.end_date,
    );
    push_file_list(&mut msg, files, COMMIT_FILE_LIMIT, |f| format!("- {f}"));
    msg.push_str("\nGenerated by Doodlify 🎨\n");
    msg
}

pub fn pr_title(event: &EventConfig) -> String {
    format!("🎨 {} Theme Customizations", event.name)
}

pub fn pr_body(event: &EventLock) -> String {
    let e = &event.event;
    let mut body = format!(
        "## 🎨 {name} Theme Customizations\n\n\
         This PR applies event-themed decorations for **{name}**.\n\n\
         ### Event Details\n\
         - **Event Period:** {start} to {end}\n\
         - **Description:** {description}\n\n\
         ### Changes Applied\n\
         This automated customization includes:\n\
         - 🖼️ Image transformations with event-themed elements\n\
         - 📝 Text adaptations for event context\n\n\
         ### Modified Files\n",
        name = e.name,
        start = e.start_date,
        end = e.end_date,
        description = e.description,
    );
    push_file_list(&mut body, &event.progress.modified_files, PR_FILE_LIMIT, |f| {
        format!("- `{f}`")
    });
    let commit = event
        .progress
        .commit_sha
        .as_deref()
        .map(short_sha)
        .unwrap_or("N/A");
    body.push_str(&format!(
        "\n### Review Notes\n\
         - Original files are kept next to each change as `name.original.ext`\n\
         - `doodlify restore --event-id {id} --files <paths>` reverts individual files\n\n\
         ---\n\
         *Generated automatically by Doodlify 🎨*\n\
         *Event ID: `{id}`*\n\
         *Commit: `{commit}`*\n",
        id = e.id,
    ));
    body
}

pub fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}

fn push_file_list(out: &mut String, files: &[String], limit: usize, line: impl Fn(&str) -> String) {
    for f in files.iter().take(limit) {
        out.push_str(&line(f));
        out.push('\n');
    }
    if files.len() > limit {
        out.push_str(&format!("... and {} more files\n", files.len() - limit));
    }
}
