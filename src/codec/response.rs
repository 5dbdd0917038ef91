//! Completion parsers.
//!
//! Change responses look like:
//!
//! ~~~text
//! Files:
//! name: src/main.rs
//! contents:
//! ```rust
//! fn main() {}
//! ```
//! Notes:
//! rewrote main
//! ~~~
//!
//! Markers are matched case-insensitively anywhere in the text. Escaped
//! newlines and quotes are unescaped, code fences stripped.

use super::{ChangeResponse, DiffCommentReply, DiffCommentResponse, File};

/// Leading character of a diff-comment completion that is a plain answer.
pub const ANSWER_SENTINEL: char = '!';

const NAME_MARKER: &str = "name:";
const CONTENTS_MARKER: &str = "contents:";
const NOTES_MARKER: &str = "notes:";
const RESPONSE_MARKER: &str = "response:";
const FENCE: &str = "```";

/// Parse a completion to a change request. Never fails; unparseable file
/// chunks are reported in `malformed_segments`.
pub fn parse_change_response(raw: &str) -> ChangeResponse {
    let (files_section, notes) = match rfind_marker(raw, NOTES_MARKER) {
        Some(idx) => (&raw[..idx], raw[idx + NOTES_MARKER.len()..].trim().to_string()),
        None => (raw, String::new()),
    };

    let (files, malformed_segments) = parse_files(files_section);

    ChangeResponse {
        files,
        notes,
        malformed_segments,
    }
}

/// Parse a completion to a review comment. A sentinel-prefixed completion is
/// an answer; otherwise the first file before the `response:` marker (if any)
/// makes it a code change.
pub fn parse_diff_comment_response(raw: &str) -> DiffCommentResponse {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix(ANSWER_SENTINEL) {
        return DiffCommentResponse {
            reply: DiffCommentReply::Answer {
                text: rest.trim().to_string(),
            },
            malformed_segments: Vec::new(),
        };
    }

    let (files_section, text) = match rfind_marker(trimmed, RESPONSE_MARKER) {
        Some(idx) => (
            &trimmed[..idx],
            trimmed[idx + RESPONSE_MARKER.len()..].trim().to_string(),
        ),
        None => (trimmed, String::new()),
    };

    let (files, malformed_segments) = parse_files(files_section);

    let reply = match files.into_iter().next() {
        Some(file) => DiffCommentReply::CodeChange { file, text },
        None if text.is_empty() => DiffCommentReply::Answer {
            text: trimmed.to_string(),
        },
        None => DiffCommentReply::Answer { text },
    };

    DiffCommentResponse {
        reply,
        malformed_segments,
    }
}

/// Split a files section into `(files, malformed_segments)`.
fn parse_files(section: &str) -> (Vec<File>, Vec<String>) {
    let mut files = Vec::new();
    let mut malformed = Vec::new();

    // The first chunk is whatever preamble preceded the first `name:`.
    for chunk in split_marker(section, NAME_MARKER).into_iter().skip(1) {
        let Some(idx) = find_marker(chunk, CONTENTS_MARKER) else {
            malformed.push(chunk.trim().to_string());
            continue;
        };

        let path = clean_path(&chunk[..idx]);
        if path.is_empty() {
            malformed.push(chunk.trim().to_string());
            continue;
        }

        let contents = clean_contents(&chunk[idx + CONTENTS_MARKER.len()..]);
        files.push(File { path, contents });
    }

    (files, malformed)
}

fn clean_path(raw: &str) -> String {
    unescape(raw)
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim()
        .to_string()
}

fn clean_contents(raw: &str) -> String {
    let unescaped = unescape(raw);
    let text = strip_trailing_list_marker(&unescaped).trim_end();

    let start = text.trim_start();
    if start.starts_with(FENCE) {
        return dedent(strip_fences(start)).trim().to_string();
    }

    // Text on the marker line carries none of the block's indentation, so
    // only the following lines are dedented.
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let first = first.trim();
    let rest = dedent(rest);
    if first.is_empty() {
        rest.trim().to_string()
    } else if rest.trim().is_empty() {
        first.to_string()
    } else {
        format!("{}\n{}", first, rest.trim_end())
    }
}

/// Find `marker` ignoring ASCII case. Offsets are valid for `haystack`
/// because ASCII lowercasing preserves byte lengths.
fn find_marker(haystack: &str, marker: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(marker)
}

fn rfind_marker(haystack: &str, marker: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().rfind(marker)
}

fn split_marker<'a>(haystack: &'a str, marker: &str) -> Vec<&'a str> {
    let lower = haystack.to_ascii_lowercase();
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, _) in lower.match_indices(marker) {
        parts.push(&haystack[start..idx]);
        start = idx + marker.len();
    }
    parts.push(&haystack[start..]);
    parts
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some(&(q @ ('"' | '\'' | '`'))) => {
                out.push(q);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Drop a dangling YAML list marker (`- `) left over from the next entry.
fn strip_trailing_list_marker(s: &str) -> &str {
    let trimmed = s.trim_end();
    if !trimmed.ends_with('-') {
        return s;
    }
    match trimmed.rfind('\n') {
        Some(nl) if trimmed[nl + 1..].trim() == "-" => &trimmed[..nl],
        None if trimmed.trim() == "-" => "",
        _ => s,
    }
}

fn strip_fences(s: &str) -> &str {
    let mut body = s;
    if body.starts_with(FENCE) {
        body = match body.find('\n') {
            // Opening fence line may carry a language tag.
            Some(nl) => &body[nl + 1..],
            None => body.trim_start_matches('`'),
        };
    }
    let end = body.trim_end();
    if let Some(stripped) = end.strip_suffix(FENCE) {
        body = stripped;
    }
    body
}

fn dedent(s: &str) -> String {
    let indent = s
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    if indent == 0 {
        return s.to_string();
    }
    s.lines()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}
