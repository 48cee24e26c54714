use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, PieService, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEndlessModeRequest {
	pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEndlessModeResponse {
	pub endless_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetObservationRequest {
	pub obs_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsResponse {
	pub total_patterns: usize,
	pub frameworks: usize,
	pub categories: usize,
}

impl PieService {
	pub fn set_endless_mode(&self, req: SetEndlessModeRequest) -> SetEndlessModeResponse {
		let previous = self.mode.set(req.enabled);

		if previous != req.enabled {
			tracing::info!(enabled = req.enabled, "Endless mode changed.");
		}

		SetEndlessModeResponse { endless_mode: req.enabled }
	}

	/// Returns an archived result exactly as it would have been returned in full mode.
	pub async fn get_observation(&self, req: GetObservationRequest) -> Result<Value> {
		let record = self.archive.get(&req.obs_id).await?;

		serde_json::from_str(&record.content).map_err(|err| Error::ArchiveReadFailed {
			message: format!("Observation {} is not valid JSON: {err}.", record.obs_id),
		})
	}

	pub fn get_statistics(&self) -> StatisticsResponse {
		let stats = self.store.stats();

		StatisticsResponse {
			total_patterns: stats.total_patterns,
			frameworks: stats.frameworks,
			categories: stats.categories,
		}
	}
}
