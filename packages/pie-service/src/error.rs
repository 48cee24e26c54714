pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Pattern with id '{id}' already exists.")]
	DuplicateId { id: String },
	#[error("Invalid pattern: {reason}")]
	InvalidPattern { reason: String },
	#[error("{kind} not found: {id}")]
	NotFound { kind: &'static str, id: String },
	#[error("Unknown tool: {name}")]
	UnknownTool { name: String },
	#[error("Invalid arguments: {reason}")]
	InvalidArguments { reason: String },
	#[error("Archive write failed: {message}")]
	ArchiveWriteFailed { message: String },
	#[error("Archive read failed: {message}")]
	ArchiveReadFailed { message: String },
	#[error("Pattern file failed: {message}")]
	PatternFileFailed { message: String },
	#[error("Failed to encode tool result: {message}")]
	EncodeFailed { message: String },
	#[error("Path traversal attempt detected for '{input}'.")]
	PathTraversal { input: String },
	#[error("Analysis failed: {message}")]
	Analysis { message: String },
}
impl Error {
	/// Stable machine-readable code for tool error payloads.
	pub fn code(&self) -> &'static str {
		match self {
			Self::DuplicateId { .. } => "DUPLICATE_ID",
			Self::InvalidPattern { .. } => "INVALID_PATTERN",
			Self::NotFound { .. } => "NOT_FOUND",
			Self::UnknownTool { .. } => "UNKNOWN_TOOL",
			Self::InvalidArguments { .. } => "INVALID_ARGUMENTS",
			Self::ArchiveWriteFailed { .. } => "ARCHIVE_WRITE_FAILED",
			Self::ArchiveReadFailed { .. } => "ARCHIVE_READ_FAILED",
			Self::PatternFileFailed { .. } => "PATTERN_FILE_FAILED",
			Self::EncodeFailed { .. } => "ENCODE_FAILED",
			Self::PathTraversal { .. } => "PATH_TRAVERSAL",
			Self::Analysis { .. } => "ANALYSIS_FAILED",
		}
	}

	pub(crate) fn invalid_arguments(reason: impl Into<String>) -> Self {
		Self::InvalidArguments { reason: reason.into() }
	}
}

impl From<pie_storage::Error> for Error {
	fn from(err: pie_storage::Error) -> Self {
		match err {
			pie_storage::Error::DuplicateId(id) => Self::DuplicateId { id },
			pie_storage::Error::InvalidPattern(reason) => Self::InvalidPattern { reason },
			pie_storage::Error::PathTraversal(input) => Self::PathTraversal { input },
			pie_storage::Error::NotFound { kind, id } => Self::NotFound { kind, id },
			pie_storage::Error::ArchiveWrite(message) => Self::ArchiveWriteFailed { message },
			pie_storage::Error::ArchiveRead(message) => Self::ArchiveReadFailed { message },
			err @ pie_storage::Error::Load { .. } =>
				Self::PatternFileFailed { message: err.to_string() },
		}
	}
}
