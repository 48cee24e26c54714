use std::collections::HashSet;

/// Truncates to `max_chars` characters, ending in `...` when there is room for it.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}
	if max_chars < 4 {
		return text.chars().take(max_chars).collect();
	}

	let mut out: String = text.chars().take(max_chars - 3).collect();

	out.push_str("...");

	out
}

/// Lowercased alphanumeric keywords, deduplicated in first-seen order.
pub fn tokenize_terms(query: &str, max_terms: usize) -> Vec<String> {
	let mut normalized = String::with_capacity(query.len());

	for ch in query.chars() {
		if ch.is_alphanumeric() {
			normalized.extend(ch.to_lowercase());
		} else {
			normalized.push(' ');
		}
	}

	let mut out = Vec::new();
	let mut seen = HashSet::new();

	for token in normalized.split_whitespace() {
		if out.len() >= max_terms {
			break;
		}
		if token.chars().count() < 2 {
			continue;
		}
		if seen.insert(token) {
			out.push(token.to_string());
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truncate_keeps_short_text() {
		assert_eq!(truncate_chars("hello", 10), "hello");
		assert_eq!(truncate_chars("hello", 5), "hello");
	}

	#[test]
	fn truncate_appends_ellipsis() {
		assert_eq!(truncate_chars("hello world", 8), "hello...");
	}

	#[test]
	fn truncate_is_char_safe() {
		let text = "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}\u{4E16}\u{754C}";

		assert_eq!(truncate_chars(text, 10), text);
		assert_eq!(truncate_chars(text, 6), "\u{3053}\u{3093}\u{306B}...");
		assert_eq!(truncate_chars(text, 2), "\u{3053}\u{3093}");
	}

	#[test]
	fn tokenizes_and_dedups() {
		assert_eq!(
			tokenize_terms("useState, useState & a Hook!", 8),
			vec!["usestate".to_string(), "hook".to_string()]
		);
		assert_eq!(tokenize_terms("one two three", 2), vec!["one".to_string(), "two".to_string()]);
	}
}
