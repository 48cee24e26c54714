use std::fmt;

use crate::{PatternRecord, pattern::normalize_tag, safety};

pub const MIN_DESCRIPTION_CHARS: usize = 20;
pub const MIN_CODE_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum PatternReject {
	EmptyField { field: &'static str },
	UnsafeName { field: &'static str, value: String },
	DescriptionTooShort { chars: usize },
	CodeTooShort { chars: usize },
	CommentOnlyCode,
	EmptyTags,
	RelevanceOutOfRange { value: f32 },
}

impl PatternReject {
	pub fn is_path_traversal(&self) -> bool {
		matches!(self, Self::UnsafeName { .. })
	}
}

impl fmt::Display for PatternReject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::EmptyField { field } => write!(f, "{field} must be non-empty."),
			Self::UnsafeName { field, value } =>
				write!(f, "{field} '{value}' must not contain path separators or '..'."),
			Self::DescriptionTooShort { chars } => write!(
				f,
				"description must be at least {MIN_DESCRIPTION_CHARS} characters, got {chars}."
			),
			Self::CodeTooShort { chars } =>
				write!(f, "code must be at least {MIN_CODE_CHARS} characters, got {chars}."),
			Self::CommentOnlyCode => write!(f, "code must not consist of comments only."),
			Self::EmptyTags => write!(f, "tags must contain at least one non-empty tag."),
			Self::RelevanceOutOfRange { value } =>
				write!(f, "relevance_score must be within 0.0-1.0, got {value}."),
		}
	}
}

pub fn pattern_gate(record: &PatternRecord) -> Result<(), PatternReject> {
	for (field, value) in [
		("id", &record.id),
		("framework", &record.framework),
		("category", &record.category),
		("title", &record.title),
	] {
		if value.trim().is_empty() {
			return Err(PatternReject::EmptyField { field });
		}
	}
	for (field, value) in
		[("id", &record.id), ("framework", &record.framework), ("category", &record.category)]
	{
		if !safety::is_safe_name(value.trim()) {
			return Err(PatternReject::UnsafeName { field, value: value.clone() });
		}
	}

	let description_chars = record.description.trim().chars().count();

	if description_chars < MIN_DESCRIPTION_CHARS {
		return Err(PatternReject::DescriptionTooShort { chars: description_chars });
	}

	let code_chars = record.code.trim().chars().count();

	if code_chars < MIN_CODE_CHARS {
		return Err(PatternReject::CodeTooShort { chars: code_chars });
	}
	if is_comment_only(&record.code) {
		return Err(PatternReject::CommentOnlyCode);
	}
	if !record.tags.iter().any(|tag| !normalize_tag(tag).is_empty()) {
		return Err(PatternReject::EmptyTags);
	}
	if !record.relevance_score.is_finite() || !(0.0..=1.0).contains(&record.relevance_score) {
		return Err(PatternReject::RelevanceOutOfRange { value: record.relevance_score });
	}

	Ok(())
}

/// True when every non-blank line is a line comment or sits inside a block comment.
pub fn is_comment_only(code: &str) -> bool {
	let mut in_block = false;

	for line in code.lines().map(str::trim).filter(|line| !line.is_empty()) {
		if in_block {
			if let Some((_, rest)) = line.split_once("*/") {
				in_block = false;

				if !rest.trim().is_empty() && !is_line_comment(rest.trim()) {
					return false;
				}
			}

			continue;
		}
		if let Some(rest) = line.strip_prefix("/*") {
			match rest.split_once("*/") {
				Some((_, after)) =>
					if !after.trim().is_empty() && !is_line_comment(after.trim()) {
						return false;
					},
				None => in_block = true,
			}

			continue;
		}
		if !is_line_comment(line) {
			return false;
		}
	}

	true
}

fn is_line_comment(line: &str) -> bool {
	if line.starts_with("//") || line.starts_with("<!--") {
		return true;
	}
	// `*counter += 1;` and `--remaining;` are code.
	if let Some(rest) = line.strip_prefix("--") {
		return rest.is_empty() || rest.starts_with(char::is_whitespace);
	}
	if let Some(rest) = line.strip_prefix('*') {
		return rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with('/');
	}

	// `#include` and `#[derive]` are code; `# note` and `##` are comments.
	match line.strip_prefix('#') {
		Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t', '#']),
		None => false,
	}
}
