//! Free-text sanitisation and HTML escaping.
//!
//! [`sanitize_text`] strips markup and script vectors from user-supplied text before it is
//! echoed anywhere. It repeats its rule set until the text stops changing, so removing one
//! pattern can never splice together another (`javajavascript:script:`), and sanitising
//! twice gives the same result as sanitising once.
//!
//! [`escape_html`] is applied again at render time by the email templates.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::MAX_FIELD_LENGTH;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid regex")
});
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static JAVASCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on[a-z0-9_]+\s*=").expect("valid regex"));

const UNSAFE_CHARS: [char; 5] = ['<', '>', '\'', '"', '`'];

/// Trim, drop `<script>`/`<style>` elements with their content, strip remaining tags,
/// `javascript:` schemes, inline event handlers and the characters
/// `< > ' " \``, then cap at [`MAX_FIELD_LENGTH`] characters.
pub fn sanitize_text(input: &str) -> String {
    let mut current = sanitize_pass(input);
    loop {
        let next = sanitize_pass(&current);
        // Every rule only removes characters, so an unchanged length means a fixed point.
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

/// [`sanitize_text`], then keep only digits, `+`, `-`, `(`, `)` and spaces.
pub fn sanitize_phone(input: &str) -> String {
    sanitize_text(input)
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Escape `& < > " '` for interpolation into HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn sanitize_pass(input: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(input.trim(), "");
    let text = HTML_TAG.replace_all(&text, "");
    let text = JAVASCRIPT_SCHEME.replace_all(&text, "");
    let text = EVENT_HANDLER.replace_all(&text, "");
    text.chars()
        .filter(|c| !UNSAFE_CHARS.contains(c))
        .take(MAX_FIELD_LENGTH)
        .collect()
}
