//! Markup formatter for the browser chat page.
//!
//! The page renders model text with exactly the rules the native client
//! uses.

use wasm_bindgen::prelude::*;

use lumen_core::markup;

/// Returns the version of the lumen_wasm package.
#[wasm_bindgen]
pub fn version() -> String {
    lumen_core::version().to_string()
}

/// Raw model text to inline HTML with copyable code blocks.
#[wasm_bindgen(js_name = formatMessage)]
pub fn format_message(text: &str) -> String {
    markup::format_message(text)
}

#[wasm_bindgen(js_name = escapeHtml)]
pub fn escape_html(text: &str) -> String {
    markup::escape_html(text)
}

/// Text a copy button should put on the clipboard for the `index`-th code
/// block of `html`.
#[wasm_bindgen(js_name = codeBlockText)]
pub fn code_block_text(html: &str, index: usize) -> Option<String> {
    markup::code_block(html, index)
}
