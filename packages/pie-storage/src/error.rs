use pie_domain::PatternReject;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Pattern with id '{0}' already exists.")]
	DuplicateId(String),
	#[error("Invalid pattern: {0}")]
	InvalidPattern(String),
	#[error("Path traversal attempt detected for '{0}'.")]
	PathTraversal(String),
	#[error("{kind} not found: {id}")]
	NotFound { kind: &'static str, id: String },
	#[error("Failed to write observation: {0}")]
	ArchiveWrite(String),
	#[error("Failed to read observation: {0}")]
	ArchiveRead(String),
	#[error("Failed to load patterns from {path:?}: {message}")]
	Load { path: std::path::PathBuf, message: String },
}
impl From<PatternReject> for Error {
	fn from(reject: PatternReject) -> Self {
		match reject {
			PatternReject::UnsafeName { value, .. } => Self::PathTraversal(value),
			other => Self::InvalidPattern(other.to_string()),
		}
	}
}
