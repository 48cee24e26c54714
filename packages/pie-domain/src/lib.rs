pub mod analysis;
pub mod gate;
pub mod order;
pub mod pattern;
pub mod safety;
pub mod text;
pub mod time_serde;

pub use analysis::{AnalysisResult, DependencySummary, SeverityLevel, Suggestion};
pub use gate::{MIN_CODE_CHARS, MIN_DESCRIPTION_CHARS, PatternReject, pattern_gate};
pub use pattern::{CodePattern, PatternRecord};
