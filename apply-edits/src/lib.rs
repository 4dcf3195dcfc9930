//! Constrained workspace file mutation.
//!
//! The applier's single job is to stamp an annotation marker into a batch
//! of files. The note it embeds is agent-supplied free text, so it is
//! sanitized before it ever reaches disk: a crafted note must not be able
//! to open a new line of file content or close the generated comment early.
//!
//! Files are processed independently and best-effort. A file that cannot
//! be read starts from empty - a missing target is a normal precondition
//! here, not a fault. A file that cannot be written is logged and skipped;
//! the batch carries on. Callers must not assume atomicity across a batch.

use std::path::Path;

/// Marker embedded in every generated annotation line.
const EDIT_MARKER: &str = "AEP edit:";

/// Confirmation returned after a batch completes.
const CONFIRMATION: &str = "Edits applied.";

/// Collapse newlines, strip comment terminators, and trim the note so it
/// is safe to embed inside a single generated comment line.
pub fn sanitize_note(note: &str) -> String {
    let mut collapsed = String::with_capacity(note.len());
    let mut in_newline_run = false;
    for c in note.chars() {
        if c == '\r' || c == '\n' {
            if !in_newline_run {
                collapsed.push(' ');
                in_newline_run = true;
            }
        } else {
            collapsed.push(c);
            in_newline_run = false;
        }
    }
    // A single pass can splice a fresh terminator out of the removed
    // pieces (`**//` becomes `*/`), so repeat until none remain.
    let mut sanitized = collapsed;
    while sanitized.contains("*/") {
        sanitized = sanitized.replace("*/", "");
    }
    sanitized.trim().to_string()
}

/// Append an annotation line for `note` to every file in `files`, resolved
/// against `workspace_root`. Missing directories are created; missing files
/// start empty. Returns a fixed confirmation once the batch is done.
pub async fn apply_edits(workspace_root: &Path, files: &[&Path], note: &str) -> String {
    let note = sanitize_note(note);
    for relative in files {
        let path = workspace_root.join(relative);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    tracing::warn!(
                        "skipping {}: could not create parent: {e}",
                        path.display()
                    );
                    continue;
                }
            }
        }

        // Any read failure means the file starts empty.
        let mut contents = tokio::fs::read_to_string(&path).await.unwrap_or_default();
        contents.push_str(&format!("/* {EDIT_MARKER} {note} */\n"));

        if let Err(e) = tokio::fs::write(&path, contents).await {
            tracing::warn!("failed to write {}: {e}", path.display());
        }
    }
    CONFIRMATION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn note_newline_runs_collapse_to_one_space() {
        assert_eq!(sanitize_note("line one\r\n\r\nline two"), "line one line two");
        assert_eq!(sanitize_note("a\nb"), "a b");
    }

    #[test]
    fn note_comment_terminators_are_removed() {
        assert_eq!(sanitize_note("escape */ attempt"), "escape  attempt");
        assert_eq!(sanitize_note("*/*/"), "");
        // Terminators spliced together by the removal itself must not
        // survive either.
        assert_eq!(sanitize_note("**//"), "");
    }

    #[test]
    fn note_is_trimmed() {
        assert_eq!(sanitize_note("  padded  "), "padded");
        assert_eq!(sanitize_note("\n\nnote\n"), "note");
    }
}
