//! Turns plain or lightly-marked-up text into a safe HTML fragment.
//!
//! The steps run in a fixed order; later steps see the output of earlier
//! ones:
//!
//! 1. trim
//! 2. escape `&`, `<`, `>`, `"`
//! 3. normalize line endings to `\n`
//! 4. two or more newlines → paragraph break
//! 5. newline before a numbered item (`12.`) → `<br>`
//! 6. `**bold**` → `<strong>`
//! 7. `*italic*` → `<em>`
//! 8. bare `http(s)://` URL → `<a href>`
//! 9. any remaining newline → `<br>`
//! 10. drop empty paragraphs
//! 11. wrap in `<p>…</p>`
//!
//! The output is never empty and never contains a raw newline. Emphasis
//! spans stop at line ends and at markup inserted by steps 4 and 5, so they
//! never straddle a paragraph.

use regex_lite::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+").expect("Invalid regex: paragraph break"));

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(\d+\.)").expect("Invalid regex: numbered item"));

// `<` and `\n` are excluded so a span cannot cross an inserted tag.
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^<\n]*?)\*\*").expect("Invalid regex: bold span"));

static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^<\n*]+?)\*").expect("Invalid regex: italic span"));

// `<` is excluded so a URL stops at markup inserted by earlier steps.
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<]+").expect("Invalid regex: bare URL"));

static EMPTY_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>\s*</p>").expect("Invalid regex: empty paragraph"));

/// Format raw response text as an HTML fragment. Total: every input,
/// including the empty string, yields at least `<p></p>`.
pub fn format(raw: &str) -> String {
    let text = escape_html(raw.trim());
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = PARAGRAPH_BREAK.replace_all(&text, "</p><p>");
    let text = NUMBERED_ITEM.replace_all(&text, "<br>${1}");
    let text = BOLD.replace_all(&text, "<strong>${1}</strong>");
    let text = ITALIC.replace_all(&text, "<em>${1}</em>");
    let text = URL.replace_all(&text, r#"<a href="${0}">${0}</a>"#);
    let text = text.replace('\n', "<br>");
    let text = EMPTY_PARAGRAPH.replace_all(&text, "");

    format!("<p>{text}</p>")
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
