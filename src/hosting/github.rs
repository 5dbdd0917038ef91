use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Author, ChangeRequestRef, Comment, CommentFilter, HostingClient, Issue, IssueFilter,
    author_allowed,
};
use crate::errors::HostingError;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "issuesmith";
const PER_PAGE: usize = 100;

/// Known GitHub token prefixes.
/// See: https://github.blog/2021-04-05-behind-githubs-new-authentication-token-formats/
const GITHUB_TOKEN_PREFIXES: &[&str] = &[
    "ghp_",        // Personal access tokens (classic)
    "github_pat_", // Fine-grained personal access tokens
    "gho_",        // OAuth access tokens
    "ghu_",        // GitHub App user-to-server tokens
    "ghs_",        // GitHub App server-to-server tokens
    "ghr_",        // GitHub App refresh tokens
];

/// Validate that a string looks like a GitHub token based on its prefix.
///
/// Format check only; it does not verify the token is active or scoped.
pub fn is_valid_github_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    GITHUB_TOKEN_PREFIXES
        .iter()
        .any(|prefix| token.starts_with(prefix))
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

/// A GitHub issue (subset of fields).
#[derive(Debug, Deserialize)]
struct GitHubIssue {
    number: u64,
    title: String,
    body: Option<String>,
    html_url: String,
    user: GitHubUser,
    /// Pull requests also come through the issues endpoint; filter them out.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GitHubBranchRef {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubPull {
    number: u64,
    html_url: String,
    head: GitHubBranchRef,
}

#[derive(Debug, Deserialize)]
struct GitHubReviewComment {
    id: u64,
    body: String,
    path: String,
    #[serde(default)]
    diff_hunk: String,
    position: Option<u64>,
    html_url: String,
    user: GitHubUser,
    in_reply_to_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct BodyPayload<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct NewPullPayload<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

/// [`HostingClient`] over the GitHub REST v3 API for one repository.
pub struct GithubClient {
    http: Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
    /// Login the bot posts as; threads it replied to are skipped.
    bot_handle: String,
}

impl GithubClient {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        bot_handle: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            bot_handle: bot_handle.into(),
        }
    }

    /// `{api_base}/repos/{owner}/{repo}/{segments...}` with each segment
    /// percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, HostingError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| HostingError::InvalidUrl(format!("{}: {}", self.api_base, e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| HostingError::InvalidUrl(self.api_base.clone()))?;
            path.pop_if_empty();
            path.extend(["repos", self.owner.as_str(), self.repo.as_str()]);
            path.extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
    }

    /// GET every page of a list endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, HostingError> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let page_str = page.to_string();
            let per_page = PER_PAGE.to_string();
            let resp = self
                .request(reqwest::Method::GET, url.clone())
                .query(query)
                .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())])
                .send()
                .await?;
            let items: Vec<T> = decode(check(resp).await?).await?;

            let count = items.len();
            all.extend(items);
            if count < PER_PAGE {
                break; // Last page
            }
            page += 1;
        }

        Ok(all)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Response, HostingError> {
        let resp = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await?;
        check(resp).await
    }
}

/// Turn a non-2xx response into [`HostingError::Api`].
async fn check(resp: Response) -> Result<Response, HostingError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_else(|_| "(no body)".into());
    Err(HostingError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, HostingError> {
    let body = resp.text().await?;
    parse_body(&body)
}

/// A body that is not the JSON shape we expect is an
/// [`HostingError::InvalidResponse`], not a transport error.
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, HostingError> {
    serde_json::from_str(body).map_err(|e| HostingError::InvalidResponse(e.to_string()))
}

/// Root comments of review threads that are from an allowed author and that
/// `bot_handle` has not replied to.
fn open_thread_roots(
    comments: Vec<GitHubReviewComment>,
    pull: &GitHubPull,
    bot_handle: &str,
    authors: &[String],
) -> Vec<Comment> {
    let answered: std::collections::HashSet<u64> = comments
        .iter()
        .filter(|c| c.user.login.eq_ignore_ascii_case(bot_handle))
        .filter_map(|c| c.in_reply_to_id)
        .collect();

    comments
        .into_iter()
        .filter(|c| c.in_reply_to_id.is_none())
        .filter(|c| !answered.contains(&c.id))
        .filter(|c| author_allowed(authors, &c.user.login))
        .map(|c| Comment {
            id: c.id,
            change_request_id: pull.number,
            author: Author {
                handle: c.user.login,
                email: String::new(),
            },
            body: c.body,
            file_path: c.path,
            diff_hunk: c.diff_hunk,
            position: c.position,
            url: c.html_url,
            branch: pull.head.name.clone(),
        })
        .collect()
}

#[async_trait]
impl HostingClient for GithubClient {
    async fn list_open_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, HostingError> {
        let labels = filter.labels.join(",");
        let mut query = vec![("state", "open")];
        if !labels.is_empty() {
            query.push(("labels", labels.as_str()));
        }

        let issues: Vec<GitHubIssue> = self.get_all(self.endpoint(&["issues"])?, &query).await?;
        let total = issues.len();

        let selected: Vec<Issue> = issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .filter(|i| author_allowed(&filter.authors, &i.user.login))
            .map(|i| Issue {
                number: i.number,
                subject: i.title,
                body: i.body.unwrap_or_default(),
                url: i.html_url,
                author: Author {
                    handle: i.user.login,
                    email: String::new(),
                },
            })
            .collect();

        debug!(total, selected = selected.len(), "listed open issues");
        Ok(selected)
    }

    async fn list_open_comments(
        &self,
        filter: &CommentFilter,
    ) -> Result<Vec<Comment>, HostingError> {
        let pulls: Vec<GitHubPull> = self
            .get_all(self.endpoint(&["pulls"])?, &[("state", "open")])
            .await?;

        let mut selected = Vec::new();
        for pull in &pulls {
            let number = pull.number.to_string();
            let comments: Vec<GitHubReviewComment> = self
                .get_all(self.endpoint(&["pulls", &number, "comments"])?, &[])
                .await?;
            selected.extend(open_thread_roots(
                comments,
                pull,
                &self.bot_handle,
                &filter.authors,
            ));
        }

        debug!(
            pulls = pulls.len(),
            selected = selected.len(),
            "listed open review comments"
        );
        Ok(selected)
    }

    async fn comment_on_issue(&self, number: u64, text: &str) -> Result<(), HostingError> {
        let number = number.to_string();
        let url = self.endpoint(&["issues", &number, "comments"])?;
        self.post_json(url, &BodyPayload { body: text }).await?;
        Ok(())
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<(), HostingError> {
        let number = number.to_string();
        let url = self.endpoint(&["issues", &number, "labels", label])?;
        let resp = self
            .request(reqwest::Method::DELETE, url)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(resp).await?;
        Ok(())
    }

    async fn open_change_request(
        &self,
        from_branch: &str,
        to_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<ChangeRequestRef, HostingError> {
        let url = self.endpoint(&["pulls"])?;
        let payload = NewPullPayload {
            title,
            head: from_branch,
            base: to_branch,
            body,
        };
        let pull: GitHubPull = decode(self.post_json(url, &payload).await?).await?;
        Ok(ChangeRequestRef {
            id: pull.number,
            url: pull.html_url,
        })
    }

    async fn reply_to_comment(
        &self,
        change_request_id: u64,
        comment_id: u64,
        text: &str,
    ) -> Result<(), HostingError> {
        let pr = change_request_id.to_string();
        let comment = comment_id.to_string();
        let url = self.endpoint(&["pulls", &pr, "comments", &comment, "replies"])?;
        self.post_json(url, &BodyPayload { body: text }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GithubClient {
        GithubClient::new(DEFAULT_API_BASE, "ghp_x", "owner", "repo", "smith-bot")
    }

    fn review_comment(id: u64, login: &str, reply_to: Option<u64>) -> GitHubReviewComment {
        GitHubReviewComment {
            id,
            body: format!("comment {}", id),
            path: "src/lib.rs".into(),
            diff_hunk: "@@ -1 +1 @@".into(),
            position: Some(1),
            html_url: format!("https://github.com/owner/repo/pull/5#discussion_r{}", id),
            user: GitHubUser {
                login: login.into(),
            },
            in_reply_to_id: reply_to,
        }
    }

    fn pull() -> GitHubPull {
        GitHubPull {
            number: 5,
            html_url: "https://github.com/owner/repo/pull/5".into(),
            head: GitHubBranchRef {
                name: "issuesmith/issue-1-abcd1234".into(),
            },
        }
    }

    // ── is_valid_github_token ────────────────────────────────────────

    #[test]
    fn test_valid_token_prefixes() {
        assert!(is_valid_github_token("ghp_abc123def456"));
        assert!(is_valid_github_token("github_pat_abc123def456"));
        assert!(is_valid_github_token("ghs_xyz789"));
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(!is_valid_github_token(""));
        assert!(!is_valid_github_token("not-a-token"));
        assert!(!is_valid_github_token("GHP_abc123"));
        assert!(!is_valid_github_token(" ghp_abc123"));
    }

    #[test]
    fn test_github_token_prefixes_end_with_underscore() {
        for prefix in GITHUB_TOKEN_PREFIXES {
            assert!(prefix.ends_with('_'), "Token prefix should end with underscore: {}", prefix);
        }
    }

    // ── endpoint ─────────────────────────────────────────────────────

    #[test]
    fn test_endpoint_builds_repo_path() {
        let url = client().endpoint(&["issues", "42", "comments"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/owner/repo/issues/42/comments"
        );
    }

    #[test]
    fn test_endpoint_encodes_label_segment() {
        let url = client()
            .endpoint(&["issues", "1", "labels", "needs bot/ai"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/owner/repo/issues/1/labels/needs%20bot%2Fai"
        );
    }

    #[test]
    fn test_endpoint_with_enterprise_base_path() {
        let c = GithubClient::new("https://ghe.example.com/api/v3/", "t", "o", "r", "b");
        let url = c.endpoint(&["pulls"]).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/o/r/pulls");
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        let c = GithubClient::new("not a url", "t", "o", "r", "b");
        assert!(matches!(
            c.endpoint(&["pulls"]),
            Err(HostingError::InvalidUrl(_))
        ));
    }

    // ── thread selection ─────────────────────────────────────────────

    #[test]
    fn test_open_thread_roots_skips_answered_threads() {
        let comments = vec![
            review_comment(1, "alice", None),
            review_comment(2, "smith-bot", Some(1)),
            review_comment(3, "alice", None),
            review_comment(4, "alice", Some(3)),
        ];
        let roots = open_thread_roots(comments, &pull(), "smith-bot", &["alice".to_string()]);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, 3);
        assert_eq!(roots[0].change_request_id, 5);
        assert_eq!(roots[0].branch, "issuesmith/issue-1-abcd1234");
        assert_eq!(roots[0].file_path, "src/lib.rs");
    }

    #[test]
    fn test_open_thread_roots_filters_authors() {
        let comments = vec![
            review_comment(1, "alice", None),
            review_comment(2, "mallory", None),
        ];
        let roots = open_thread_roots(comments, &pull(), "smith-bot", &["alice".to_string()]);
        assert_eq!(roots.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);
    }

    // ── deserialization ──────────────────────────────────────────────

    #[test]
    fn test_github_issue_deserialize_pull_request_marker() {
        let issues_json = r#"[
            {"number": 1, "title": "Real issue", "body": null, "html_url": "https://github.com/o/r/issues/1", "user": {"login": "alice"}},
            {"number": 2, "title": "PR", "body": "x", "html_url": "https://github.com/o/r/pull/2", "user": {"login": "alice"}, "pull_request": {"url": "..."}}
        ]"#;
        let issues: Vec<GitHubIssue> = serde_json::from_str(issues_json).unwrap();
        assert!(issues[0].pull_request.is_none());
        assert!(issues[0].body.is_none());
        assert!(issues[1].pull_request.is_some());
    }

    #[test]
    fn test_review_comment_deserialize() {
        let json = r#"{
            "id": 77,
            "body": "use a constant here",
            "path": "src/main.rs",
            "diff_hunk": "@@ -3,2 +3,2 @@",
            "position": null,
            "html_url": "https://github.com/o/r/pull/9#discussion_r77",
            "user": {"login": "alice"},
            "in_reply_to_id": 70
        }"#;
        let c: GitHubReviewComment = serde_json::from_str(json).unwrap();
        assert_eq!(c.id, 77);
        assert_eq!(c.in_reply_to_id, Some(70));
        assert!(c.position.is_none());
    }

    #[test]
    fn test_unexpected_body_is_invalid_response() {
        let err = parse_body::<Vec<GitHubIssue>>(r#"{"message": "Moved Permanently"}"#).unwrap_err();
        assert!(matches!(err, HostingError::InvalidResponse(_)));

        let pull: GitHubPull = parse_body(
            r#"{"number": 3, "html_url": "https://github.com/o/r/pull/3", "head": {"ref": "x"}}"#,
        )
        .unwrap();
        assert_eq!(pull.number, 3);
    }

    #[test]
    fn test_pull_deserialize_head_ref() {
        let json = r#"{"number": 9, "html_url": "https://github.com/o/r/pull/9", "head": {"ref": "feature-x", "sha": "abc"}}"#;
        let p: GitHubPull = serde_json::from_str(json).unwrap();
        assert_eq!(p.head.name, "feature-x");
    }

    #[test]
    fn test_new_pull_payload_serializes() {
        let payload = NewPullPayload {
            title: "t",
            head: "h",
            base: "main",
            body: "b",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["head"], "h");
        assert_eq!(json["base"], "main");
    }
}
