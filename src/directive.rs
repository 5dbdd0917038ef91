//! Issue body directives.
//!
//! An issue body is free prose, optionally followed by a `---` line and a
//! `key: value` trailer:
//!
//! ```text
//! add a readme with install steps
//! ---
//! base: develop
//! files: README.md, docs/install.md
//! ```
//!
//! Unknown keys and malformed trailer lines are ignored.

/// Branch used when the trailer does not name one.
pub const DEFAULT_BASE_BRANCH: &str = "main";

const DELIMITER: &str = "---";

/// Structured instructions extracted from an issue body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub instruction_text: String,
    pub base_branch: String,
    pub file_paths: Vec<String>,
}

impl Default for Directive {
    fn default() -> Self {
        Self {
            instruction_text: String::new(),
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            file_paths: Vec::new(),
        }
    }
}

/// Parse an issue body into a [`Directive`]. Never fails.
pub fn parse(body: &str) -> Directive {
    let (prose, trailer) = split_trailer(body);

    let mut directive = Directive {
        instruction_text: prose.trim().to_string(),
        ..Directive::default()
    };

    let Some(trailer) = trailer else {
        return directive;
    };

    for line in trailer.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        match key.as_str() {
            "base" => {
                let value = value.trim();
                if !value.is_empty() {
                    directive.base_branch = value.to_string();
                }
            }
            "files" => {
                directive.file_paths.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(String::from),
                );
            }
            _ => {}
        }
    }

    directive
}

/// Split at the first line consisting solely of the delimiter.
fn split_trailer(body: &str) -> (&str, Option<&str>) {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim() == DELIMITER {
            let trailer_start = offset + line.len();
            return (&body[..offset], Some(&body[trailer_start..]));
        }
        offset += line.len();
    }
    (body, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_trailer() {
        let d = parse("do X\n---\nbase: dev\nfiles: a.go, b.go");
        assert_eq!(d.instruction_text, "do X");
        assert_eq!(d.base_branch, "dev");
        assert_eq!(d.file_paths, vec!["a.go", "b.go"]);
    }

    #[test]
    fn test_parse_without_trailer_uses_defaults() {
        let d = parse("just text, no trailer");
        assert_eq!(d.instruction_text, "just text, no trailer");
        assert_eq!(d.base_branch, "main");
        assert!(d.file_paths.is_empty());
    }

    #[test]
    fn test_parse_keys_are_case_insensitive_values_keep_case() {
        let body = "\nadd an html file\nand also a go file\n\n---\n\nFiLeS: index.html, README.md ,main.go   \nBASE:  Release-1 \n";
        let d = parse(body);
        assert_eq!(d.instruction_text, "add an html file\nand also a go file");
        assert_eq!(d.file_paths, vec!["index.html", "README.md", "main.go"]);
        assert_eq!(d.base_branch, "Release-1");
    }

    #[test]
    fn test_parse_ignores_garbage_lines() {
        let body = "add an html file\n---\nasdf:\nfiles: index.html, main.go\n: asdfsadf\nbase:  some-base-branch \nasdfjljldsfj\nnonexistentoption: asdf\n";
        let d = parse(body);
        assert_eq!(d.instruction_text, "add an html file");
        assert_eq!(d.base_branch, "some-base-branch");
        assert_eq!(d.file_paths, vec!["index.html", "main.go"]);
    }

    #[test]
    fn test_parse_repeated_files_lines_append() {
        let d = parse("x\n---\nfiles: a.rs\nfiles: b.rs, ,c.rs");
        assert_eq!(d.file_paths, vec!["a.rs", "b.rs", "c.rs"]);
    }

    #[test]
    fn test_parse_empty_base_keeps_default() {
        let d = parse("x\n---\nbase:   ");
        assert_eq!(d.base_branch, "main");
    }

    #[test]
    fn test_inline_dashes_are_not_a_delimiter() {
        let d = parse("rename foo---bar to baz");
        assert_eq!(d.instruction_text, "rename foo---bar to baz");
        assert!(d.file_paths.is_empty());
    }

    #[test]
    fn test_base_value_may_contain_colon() {
        let d = parse("x\n---\nbase: feature:thing");
        assert_eq!(d.base_branch, "feature:thing");
    }

    #[test]
    fn test_crlf_body() {
        let d = parse("do it\r\n---\r\nfiles: a.txt\r\n");
        assert_eq!(d.instruction_text, "do it");
        assert_eq!(d.file_paths, vec!["a.txt"]);
    }
}
