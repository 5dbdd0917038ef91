//! Prompt templates.
//!
//! Both templates spell out the answer grammar that [`super::response`]
//! parses, so the two modules change together.

use super::{ChangeRequest, DiffCommentRequest, File};
use super::response::ANSWER_SENTINEL;

/// Render the prompt for an issue-driven change request.
pub fn build_prompt(req: &ChangeRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a software engineer collaborating on a git repository. \
         Resolve the issue below by writing complete new versions of the files that need to change.\n\n",
    );

    prompt.push_str("## Issue\n\n");
    prompt.push_str(&format!("- **Number**: #{}\n", req.issue_number));
    prompt.push_str(&format!("- **Subject**: {}\n", req.subject));
    prompt.push_str(&format!("- **Base branch**: {}\n\n", req.base_branch));

    prompt.push_str("## Instructions\n\n");
    prompt.push_str(req.instruction_text.trim());
    prompt.push_str("\n\n");

    prompt.push_str("## Files\n\n");
    if req.files.is_empty() {
        prompt.push_str("No files were provided. Create whatever files the instructions require.\n\n");
    } else {
        for file in &req.files {
            prompt.push_str(&format_file(file));
        }
    }

    prompt.push_str("## Response format\n\n");
    prompt.push_str(
        "Reply with every file you create or modify, then your notes, using exactly this layout:\n\n",
    );
    prompt.push_str("Files:\n");
    prompt.push_str("name: <path relative to the repository root>\n");
    prompt.push_str("contents:\n```\n<the complete new file contents>\n```\n\n");
    prompt.push_str("name: <next path>\n");
    prompt.push_str("contents:\n```\n<...>\n```\n\n");
    prompt.push_str("Notes:\n<a short explanation of the change>\n\n");
    prompt.push_str(
        "Always write whole files, never diffs. Do not use the words `name:`, `contents:` or `notes:` \
         anywhere else in your reply.\n",
    );

    prompt
}

/// Render the prompt for a review comment on a code change request.
pub fn build_diff_comment_prompt(req: &DiffCommentRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are a software engineer who opened pull request #{}. \
         A reviewer left the comment below on one of your changes.\n\n",
        req.change_request_id
    ));

    prompt.push_str("## Diff hunk\n\n```diff\n");
    prompt.push_str(req.diff_hunk.trim_end());
    prompt.push_str("\n```\n\n");

    prompt.push_str("## Comment\n\n");
    prompt.push_str(req.comment_body.trim());
    prompt.push_str("\n\n");

    prompt.push_str("## Current file\n\n");
    prompt.push_str(&format_file(&req.file));

    prompt.push_str("## Response format\n\n");
    prompt.push_str(&format!(
        "If the comment only needs an answer, reply with `{}` followed by your answer and nothing else.\n\n",
        ANSWER_SENTINEL
    ));
    prompt.push_str("If the comment needs a code change, reply using exactly this layout:\n\n");
    prompt.push_str(&format!("name: {}\n", req.file.path));
    prompt.push_str("contents:\n```\n<the complete new file contents>\n```\n\n");
    prompt.push_str("response:\n<what you changed, addressed to the reviewer>\n");

    prompt
}

fn format_file(file: &File) -> String {
    let contents = if file.contents.is_empty() {
        "(file does not exist yet)"
    } else {
        file.contents.trim_end()
    };
    format!("### {}\n\n```\n{}\n```\n\n", file.path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChangeRequest {
        ChangeRequest {
            files: vec![
                File::new("src/main.rs", "fn main() {}\n"),
                File::new("README.md", ""),
            ],
            subject: "Add greeting".into(),
            instruction_text: "  print hello  ".into(),
            issue_number: 7,
            base_branch: "develop".into(),
        }
    }

    #[test]
    fn test_build_prompt_embeds_request() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("#7"));
        assert!(prompt.contains("Add greeting"));
        assert!(prompt.contains("develop"));
        assert!(prompt.contains("print hello\n"));
        assert!(prompt.contains("### src/main.rs\n\n```\nfn main() {}\n```"));
        assert!(prompt.contains("### README.md\n\n```\n(file does not exist yet)\n```"));
        assert!(prompt.contains("Notes:"));
    }

    #[test]
    fn test_build_prompt_without_files() {
        let mut req = request();
        req.files.clear();
        let prompt = build_prompt(&req);
        assert!(prompt.contains("No files were provided"));
    }

    #[test]
    fn test_build_diff_comment_prompt() {
        let req = DiffCommentRequest {
            file: File::new("src/lib.rs", "pub fn a() {}"),
            comment_body: "rename a to b".into(),
            diff_hunk: "@@ -1 +1 @@\n+pub fn a() {}".into(),
            change_request_id: 12,
        };
        let prompt = build_diff_comment_prompt(&req);
        assert!(prompt.contains("pull request #12"));
        assert!(prompt.contains("rename a to b"));
        assert!(prompt.contains("+pub fn a() {}"));
        assert!(prompt.contains("name: src/lib.rs"));
        assert!(prompt.contains(&format!("reply with `{}`", ANSWER_SENTINEL)));
    }
}
