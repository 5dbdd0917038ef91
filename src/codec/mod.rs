//! Prompt/response codec between the orchestrator and the LLM.
//!
//! Requests are rendered into plain-text prompts ([`prompt`]); completions are
//! parsed back with a permissive marker-splitting grammar ([`response`]).
//! Malformed pieces of a completion degrade to fewer extracted files and are
//! recorded in `malformed_segments`, never turned into errors.

pub mod prompt;
pub mod response;

use std::fmt;


pub use prompt::{build_diff_comment_prompt, build_prompt};
pub use response::{ANSWER_SENTINEL, parse_change_response, parse_diff_comment_response};

/// A file in the repository, addressed relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub path: String,
    pub contents: String,
}

impl File {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// The unit of work sent to the LLM for an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub files: Vec<File>,
    pub subject: String,
    pub instruction_text: String,
    pub issue_number: u64,
    pub base_branch: String,
}

/// Files and notes extracted from a change-request completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeResponse {
    pub files: Vec<File>,
    pub notes: String,
    /// Chunks that looked like file entries but could not be parsed.
    pub malformed_segments: Vec<String>,
}

impl fmt::Display for ChangeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Notes:")?;
        writeln!(f, "{}", self.notes)?;
        writeln!(f)?;
        writeln!(f, "Files:")?;
        for file in &self.files {
            writeln!(f, "{}:", file.path)?;
            writeln!(f, "```")?;
            writeln!(f, "{}", file.contents)?;
            writeln!(f, "```")?;
        }
        Ok(())
    }
}

/// A single review comment plus the file it is anchored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffCommentRequest {
    pub file: File,
    pub comment_body: String,
    pub diff_hunk: String,
    pub change_request_id: u64,
}

/// Kind of answer the LLM gave to a review comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffCommentReply {
    /// Prose only; nothing to commit.
    Answer { text: String },
    /// A replacement for the commented file, plus explanation.
    CodeChange { file: File, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffCommentResponse {
    pub reply: DiffCommentReply,
    pub malformed_segments: Vec<String>,
}

impl DiffCommentResponse {
    /// Text to post back to the review thread.
    pub fn text(&self) -> &str {
        match &self.reply {
            DiffCommentReply::Answer { text } | DiffCommentReply::CodeChange { text, .. } => text,
        }
    }

    pub fn file(&self) -> Option<&File> {
        match &self.reply {
            DiffCommentReply::Answer { .. } => None,
            DiffCommentReply::CodeChange { file, .. } => Some(file),
        }
    }
}

impl fmt::Display for DiffCommentResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reply {
            DiffCommentReply::Answer { text } => {
                writeln!(f, "Type: Answer")?;
                write!(f, "{}", text)
            }
            DiffCommentReply::CodeChange { file, text } => {
                writeln!(f, "Type: Code Change")?;
                writeln!(f, "Response:")?;
                writeln!(f, "{}", text)?;
                writeln!(f)?;
                writeln!(f, "Files:")?;
                writeln!(f, "{}:", file.path)?;
                writeln!(f, "```")?;
                writeln!(f, "{}", file.contents)?;
                writeln!(f, "```")
            }
        }
    }
}
