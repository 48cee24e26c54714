mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Archive, Config, Endless, Limits, Patterns, Ranking, Service};

use std::{fs, net::SocketAddr, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.mcp_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.mcp_bind must be non-empty.".to_string(),
		});
	}

	let bind_addr: SocketAddr = cfg.service.mcp_bind.parse().map_err(|err| Error::Validation {
		message: format!("service.mcp_bind must be a valid socket address: {err}"),
	})?;

	if cfg.service.bind_localhost_only && !bind_addr.ip().is_loopback() {
		return Err(Error::Validation {
			message: "service.mcp_bind must be a loopback address when service.bind_localhost_only is true."
				.to_string(),
		});
	}
	if cfg.archive.dir.as_os_str().is_empty() {
		return Err(Error::Validation { message: "archive.dir must be non-empty.".to_string() });
	}
	if cfg.archive.max_entries == 0 {
		return Err(Error::Validation {
			message: "archive.max_entries must be greater than zero.".to_string(),
		});
	}

	if let Some(max) = cfg.archive.max_total_bytes
		&& max == 0
	{
		return Err(Error::Validation {
			message: "archive.max_total_bytes must be greater than zero.".to_string(),
		});
	}

	if cfg.endless.summary_top_n == 0 {
		return Err(Error::Validation {
			message: "endless.summary_top_n must be greater than zero.".to_string(),
		});
	}
	if cfg.endless.summary_max_chars < 4 {
		return Err(Error::Validation {
			message: "endless.summary_max_chars must be at least 4.".to_string(),
		});
	}

	let weights = [
		("ranking.category_weight", cfg.ranking.category_weight),
		("ranking.tag_weight", cfg.ranking.tag_weight),
		("ranking.text_weight", cfg.ranking.text_weight),
		("ranking.relevance_weight", cfg.ranking.relevance_weight),
		("ranking.usage_weight", cfg.ranking.usage_weight),
	];

	for (label, weight) in weights {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if weights.iter().map(|(_, weight)| weight).sum::<f32>() <= 0.0 {
		return Err(Error::Validation {
			message: "ranking weights must not all be zero.".to_string(),
		});
	}
	if cfg.ranking.max_query_terms == 0 {
		return Err(Error::Validation {
			message: "ranking.max_query_terms must be greater than zero.".to_string(),
		});
	}
	if cfg.limits.default_limit == 0 || cfg.limits.max_limit == 0 {
		return Err(Error::Validation {
			message: "limits.default_limit and limits.max_limit must be greater than zero."
				.to_string(),
		});
	}
	if cfg.limits.default_limit > cfg.limits.max_limit {
		return Err(Error::Validation {
			message: "limits.default_limit must not exceed limits.max_limit.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.patterns.dir.as_deref().map(|dir| dir.as_os_str().is_empty()).unwrap_or(false) {
		cfg.patterns.dir = None;
	}

	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	if cfg.service.log_level.is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
