use std::path::{Component, Path};

/// Names end up as file names in the pattern directory, so anything that could
/// walk out of it is rejected.
pub fn is_safe_name(value: &str) -> bool {
	!value.contains("..") && !value.contains(['/', '\\', '\0'])
}

pub fn escapes_root(path: &Path) -> bool {
	path.components().any(|component| matches!(component, Component::ParentDir))
}
