//! Markdown-to-narration text cleanup.
//!
//! This is deliberately shallow: decoration characters are dropped wherever
//! they appear, images vanish, and links collapse to their label. There is no
//! escaping support and no structural parsing.

use std::sync::LazyLock;

use regex::Regex;

static DECORATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[`#>*_~]").unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").unwrap());

/// Strip markdown decoration from `text`, leaving plain text suitable for
/// speech synthesis.
///
/// Images are removed before links are collapsed, otherwise the link rule
/// would turn `![alt](img.png)` into `!alt`.
pub fn clean_markdown(text: &str) -> String {
    let text = DECORATION.replace_all(text, "");
    let text = IMAGE.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    text.trim().to_string()
}
