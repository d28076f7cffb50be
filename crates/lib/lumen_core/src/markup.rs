// @zen-component: CHAT-MarkupFormatter
//
//! Markup formatter — turns raw model text into inline HTML.
//!
//! Fenced code regions (```` ```lang\n...``` ````) become a `<pre>` block
//! holding an escaped `<code>` element and a copy button. Every remaining
//! newline becomes `<br>`. Text outside code fences is not escaped: model
//! output is treated as semi-trusted.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Label of an idle copy button.
pub const COPY_LABEL: &str = "COPY";

/// Label shown on a copy button right after a copy.
pub const COPIED_LABEL: &str = "COPIED";

const LINE_BREAK: &str = "<br>";

/// Opening fence with optional language token, then the code up to the
/// closing fence. The newline right before the closing fence belongs to the
/// fence, not the code.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(\w+)?\n(.*?)\n?```").expect("code fence pattern is valid")
});

/// A code block as emitted by [`format_message`]. The button label is
/// matched loosely so blocks are still found after a label toggle.
static RENDERED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<pre class="code-block"><button class="copy-btn">[^<]*</button><code>(.*?)</code></pre>"#,
    )
    .expect("rendered block pattern is valid")
});

/// Format raw model text as HTML.
pub fn format_message(text: &str) -> String {
    let with_blocks = CODE_FENCE.replace_all(text, |caps: &Captures<'_>| {
        render_code_block(caps.get(2).map_or("", |m| m.as_str()))
    });
    with_blocks.replace('\n', LINE_BREAK)
}

fn render_code_block(code: &str) -> String {
    format!(
        r#"<pre class="code-block"><button class="copy-btn">{COPY_LABEL}</button><code>{}</code></pre>"#,
        escape_html(code)
    )
}

/// Escape `&`, `<` and `>`.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Exact inverse of [`escape_html`].
pub fn unescape_html(text: &str) -> String {
    // `&amp;` last, otherwise `&amp;lt;` would decode twice.
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Visible text of every code block in `html`, in document order.
///
/// This is what a copy button puts on the clipboard: line breaks restored
/// and entities decoded.
pub fn code_blocks(html: &str) -> Vec<String> {
    RENDERED_BLOCK
        .captures_iter(html)
        .map(|caps| visible_code_text(&caps[1]))
        .collect()
}

/// Visible text of the `index`-th code block (0-based), if present.
pub fn code_block(html: &str, index: usize) -> Option<String> {
    RENDERED_BLOCK
        .captures_iter(html)
        .nth(index)
        .map(|caps| visible_code_text(&caps[1]))
}

fn visible_code_text(inner: &str) -> String {
    unescape_html(&inner.replace(LINE_BREAK, "\n"))
}

/// Render formatted HTML back to plain text for text-only views.
///
/// Code blocks are replaced by their visible text and `<br>` by newlines.
/// Anything else is left as-is.
pub fn to_plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for caps in RENDERED_BLOCK.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&html[last..whole.start()].replace(LINE_BREAK, "\n"));
        out.push_str(&visible_code_text(&caps[1]));
        last = whole.end();
    }
    out.push_str(&html[last..].replace(LINE_BREAK, "\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_becomes_code_element_with_copy_button() {
        let html = format_message("```js\nconsole.log(1)\n```");
        assert!(html.contains("<code>console.log(1)</code>"), "{html}");
        assert!(html.contains(r#"<button class="copy-btn">COPY</button>"#));
        assert!(!html.contains("```"));
    }

    #[test]
    fn language_token_is_optional() {
        let html = format_message("```\nls -la\n```");
        assert!(html.contains("<code>ls -la</code>"), "{html}");
    }

    #[test]
    fn code_is_escaped() {
        let html = format_message("```html\n<b>a & b</b>\n```");
        assert!(html.contains("<code>&lt;b&gt;a &amp; b&lt;/b&gt;</code>"), "{html}");
    }

    #[test]
    fn text_outside_fences_is_not_escaped() {
        assert_eq!(format_message("<i>hi</i> & bye"), "<i>hi</i> & bye");
    }

    #[test]
    fn newlines_become_line_breaks() {
        assert_eq!(format_message("a\nb\n\nc"), "a<br>b<br><br>c");
    }

    #[test]
    fn newlines_inside_code_become_line_breaks() {
        let html = format_message("```py\nx = 1\ny = 2\n```");
        assert!(html.contains("<code>x = 1<br>y = 2</code>"), "{html}");
    }

    #[test]
    fn multiple_blocks_are_all_replaced() {
        let text = "first:\n```rs\nfn a() {}\n```\nsecond:\n```\nb()\n```\ndone";
        let html = format_message(text);
        assert_eq!(code_blocks(&html), vec!["fn a() {}", "b()"]);
        assert!(html.starts_with("first:<br><pre"));
        assert!(html.ends_with("</pre><br>done"));
    }

    #[test]
    fn unclosed_fence_is_left_alone() {
        assert_eq!(format_message("```js\nlet x"), "```js<br>let x");
    }

    #[test]
    fn copied_block_reproduces_original_code() {
        let code = "if a < b && c > d {\n    println!(\"&amp; stays literal\");\n}";
        let html = format_message(&format!("Try this:\n```rust\n{code}\n```\n"));
        assert_eq!(code_block(&html, 0).as_deref(), Some(code));
        assert_eq!(code_block(&html, 1), None);
    }

    #[test]
    fn formatting_fence_free_output_again_is_a_no_op() {
        let once = format_message("line one\nline two <b>x</b>");
        assert_eq!(format_message(&once), once);
    }

    #[test]
    fn unescape_inverts_escape() {
        for text in ["&lt;", "a&&b", "<<>>", "&amp;gt;", ""] {
            assert_eq!(unescape_html(&escape_html(text)), text);
        }
    }

    #[test]
    fn blocks_are_found_after_label_toggle() {
        let html = format_message("```\nx\n```").replace(COPY_LABEL, COPIED_LABEL);
        assert_eq!(code_blocks(&html), vec!["x"]);
    }

    #[test]
    fn plain_text_rendering_restores_code_and_lines() {
        let html = format_message("Here:\n```sh\necho 1 > out\n```\nDone");
        assert_eq!(to_plain_text(&html), "Here:\necho 1 > out\nDone");
    }
}
