/// Content snippet extraction
///
/// Index documents carry rendered page content, markup included. The
/// snippet shown next to a suggestion is that content with tags stripped,
/// whitespace collapsed, and length bounded for display.

use regex::Regex;

/// Display length bound, in characters.
const MAX_SNIPPET_CHARS: usize = 200;

/// How far back from the bound a word boundary may be and still win over
/// a mid-word cut.
const WORD_BOUNDARY_WINDOW: usize = 50;

const ELLIPSIS: char = '\u{2026}';

/// Build the display snippet for a content field value.
pub fn make_snippet(content: &str) -> String {
    let stripped = strip_markup(content);
    let plain = collapse_whitespace(&stripped);
    truncate_snippet(&plain)
}

/// Remove markup tags, leaving a space so adjacent words stay separated.
fn strip_markup(text: &str) -> String {
    match Regex::new(r"<[^>]*>") {
        Ok(re) => re.replace_all(text, " ").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Bound the snippet to the display length.
///
/// Cuts at the last word boundary before the limit when one lies within
/// the boundary window, otherwise hard-cuts at the limit. Truncated
/// snippets get an ellipsis marker; untouched ones do not.
fn truncate_snippet(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_SNIPPET_CHARS {
        return text.to_string();
    }

    let mut cut = MAX_SNIPPET_CHARS;
    if let Some(boundary) = chars[..MAX_SNIPPET_CHARS]
        .iter()
        .rposition(|c| c.is_whitespace())
    {
        if boundary >= MAX_SNIPPET_CHARS - WORD_BOUNDARY_WINDOW {
            cut = boundary;
        }
    }

    let mut snippet: String = chars[..cut].iter().collect();
    snippet.push(ELLIPSIS);
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markup_and_collapses_whitespace() {
        let snippet = make_snippet("<p>Hello   <b>world</b>,</p>\n\n<div>again</div>");
        assert_eq!(snippet, "Hello world , again");
    }

    #[test]
    fn test_short_content_is_untouched() {
        assert_eq!(make_snippet("A short teaser."), "A short teaser.");
        assert_eq!(make_snippet(""), "");
    }

    #[test]
    fn test_hard_cut_when_no_boundary_in_window() {
        // space at 149 only: too far back, so the cut lands exactly at 200
        let content = format!("{} {}", "x".repeat(149), "y".repeat(350));
        let snippet = make_snippet(&content);

        assert_eq!(snippet.chars().count(), 201);
        assert_eq!(
            snippet,
            format!("{} {}\u{2026}", "x".repeat(149), "y".repeat(50))
        );
    }

    #[test]
    fn test_cut_at_word_boundary_within_window() {
        // space at 180: inside the window, so the cut lands there
        let content = format!("{} {}", "a".repeat(180), "b".repeat(319));
        let snippet = make_snippet(&content);

        assert_eq!(snippet.chars().count(), 181);
        assert_eq!(snippet, format!("{}\u{2026}", "a".repeat(180)));
    }

    #[test]
    fn test_exactly_max_length_gets_no_ellipsis() {
        let content = "z".repeat(200);
        assert_eq!(make_snippet(&content), content);
    }

    #[test]
    fn test_multibyte_content_cuts_on_char_count() {
        let content = "ü".repeat(400);
        let snippet = make_snippet(&content);
        assert_eq!(snippet.chars().count(), 201);
    }
}
