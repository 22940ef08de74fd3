//! Plain text alternative of an HTML body

use regex::{Captures, Regex};
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static INVISIBLE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?is)<style[^>]*>.*?</style>|<script[^>]*>.*?</script>|<!--.*?-->")
		.expect("valid regex")
});

#[allow(clippy::expect_used)]
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)<br\s*/?>|</(?:p|div|tr|li|table|h[1-6])\s*>").expect("valid regex")
});

#[allow(clippy::expect_used)]
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[allow(clippy::expect_used)]
static NUMERIC_ENTITY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"&#(?:([0-9]{1,7})|[xX]([0-9a-fA-F]{1,6}));").expect("valid regex"));

fn decode_entities(text: &str) -> String {
	let text = NUMERIC_ENTITY.replace_all(text, |caps: &Captures| {
		let code = match (caps.get(1), caps.get(2)) {
			(Some(dec), _) => dec.as_str().parse::<u32>().ok(),
			(None, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
			_ => None,
		};
		code.and_then(char::from_u32).map_or_else(|| caps[0].to_string(), String::from)
	});

	text.replace("&nbsp;", " ")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&apos;", "'")
		.replace("&amp;", "&")
}

/// Converts an HTML fragment to readable text
///
/// Line-breaking tags become newlines, all other markup is dropped and the
/// common entities are decoded. Never fails; plain text passes through.
pub fn html_to_text(html: &str) -> String {
	let text = INVISIBLE.replace_all(html, "");
	let text = LINE_BREAK.replace_all(&text, "\n");
	let text = TAG.replace_all(&text, "");
	let text = decode_entities(&text);

	let mut out = String::with_capacity(text.len());
	let mut blank_run = 0;
	for line in text.lines().map(str::trim) {
		if line.is_empty() {
			blank_run += 1;
			if blank_run > 1 {
				continue;
			}
		} else {
			blank_run = 0;
		}
		out.push_str(line);
		out.push('\n');
	}
	out.trim().to_string()
}


// vim: ts=4
