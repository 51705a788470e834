use std::sync::LazyLock;

use regex::Regex;

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+?)\*").unwrap());

/// Converts the emphasis markers models like to emit into HTML.
///
/// `**text**` becomes `<strong>`, `*text*` becomes `<em>`, and any `*` left over
/// afterwards is dropped. This is a last-resort cleanup, not a markdown parser.
pub fn clean_html_output(text: &str) -> String {
    let text = BOLD_RE.replace_all(text, "<strong>$1</strong>");
    let text = ITALIC_RE.replace_all(&text, "<em>$1</em>");
    text.replace('*', "")
}
