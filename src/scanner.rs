//! The reference scanner: a pure function from one line of text to the
//! ordered candidate references it contains.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::asset::IgnoreSet;

/// Matches a quoted, path-shaped literal: an opening quote, optional
/// recognized prefix tags, an optional `${...}` interpolation, an optional
/// `= ` marker, a path (requiring at least one `.` before its extension),
/// and a closing quote or backslash.
///
/// Compiled once per process and reused for every line of every file.
static CANDIDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"['"`](?:async:)?(?:module:)?(?:async:)?(?:css:)?(?:\$\{[^}]*\})?(= )?([A-Za-z0-9/._@% ()+,=\-]+\.[A-Za-z0-9_ ()\-]+)['"`\\]"#,
    )
    .expect("candidate regex is valid")
});

/// One candidate reference found in a line, with the byte span of its
/// matched text (the captured path only, not the surrounding quotes/tags).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// The result of scanning one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine {
    pub candidates: Vec<Candidate>,
    /// `true` if the line must be replaced with an empty string in the
    /// rewritten output (the `sourceMappingURL=` policy).
    pub drop_line: bool,
}

/// Scans `line` for candidate references, discarding any present in
/// `ignore`.
pub fn scan_line(line: &str, ignore: &IgnoreSet) -> ScannedLine {
    if is_comment_line(line) {
        return ScannedLine { candidates: Vec::new(), drop_line: false };
    }

    if line.contains("sourceMappingURL=") {
        return ScannedLine { candidates: Vec::new(), drop_line: true };
    }

    let mut candidates = Vec::new();
    for caps in CANDIDATE_RE.captures_iter(line) {
        // The `= ` marker group matched: this capture is a key="value"-style
        // assignment, not a reference.
        if caps.get(1).is_some() {
            continue;
        }

        let path_match = caps.get(2).expect("path group always present on a match");
        let text = path_match.as_str();

        if text.starts_with("//") || text.starts_with("http://") || text.starts_with("https://") {
            continue;
        }
        if ignore.contains(text) {
            continue;
        }

        candidates.push(Candidate {
            text: text.to_owned(),
            start: path_match.start(),
            end: path_match.end(),
        });
    }

    ScannedLine { candidates, drop_line: false }
}

fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore(paths: &[&str]) -> IgnoreSet {
        IgnoreSet::new(paths.iter().map(|s| s.to_string()))
    }

    #[test]
    fn comment_lines_are_skipped() {
        let out = scan_line(r#"  // src="app.js""#, &ignore(&[]));
        assert!(out.candidates.is_empty());
        assert!(!out.drop_line);
    }

    #[test]
    fn source_mapping_url_lines_are_dropped() {
        let out = scan_line("//# sourceMappingURL=app.js.map", &ignore(&[]));
        assert!(out.candidates.is_empty());
        assert!(out.drop_line);
    }

    #[test]
    fn finds_simple_script_src() {
        let out = scan_line(r#"<script src="/app.js"></script>"#, &ignore(&[]));
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.candidates[0].text, "/app.js");
    }

    #[test]
    fn finds_multiple_candidates_on_one_line() {
        let out = scan_line(r#"import a from "./a.js"; import b from "./b.js";"#, &ignore(&[]));
        let texts: Vec<_> = out.candidates.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["./a.js", "./b.js"]);
    }

    #[test]
    fn discards_protocol_relative_and_absolute_urls() {
        let out = scan_line(
            r#"<link href="//cdn.example.com/a.css"><link href="https://example.com/b.css">"#,
            &ignore(&[]),
        );
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn discards_ignored_candidates() {
        let out = scan_line(r#"<script src="/debug.js"></script>"#, &ignore(&["/debug.js"]));
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn discards_eq_marker_candidates() {
        let out = scan_line(r#"const x = "= some.path.txt";"#, &ignore(&[]));
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn spans_point_at_captured_path_only() {
        let line = r#"src="/app.js""#;
        let out = scan_line(line, &ignore(&[]));
        let c = &out.candidates[0];
        assert_eq!(&line[c.start..c.end], "/app.js");
    }
}
