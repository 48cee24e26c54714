pub mod server;

use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use pie_config::Config;
use pie_service::{ModeController, PieService};
use pie_storage::{ArchiveLimits, ObservationArchive, PatternStore, loader};

#[derive(Debug, Parser)]
#[command(
	version = pie_cli::VERSION,
	rename_all = "kebab",
	styles = pie_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> Result<()> {
	let config = pie_config::load(&args.config)?;

	init_tracing(&config)?;

	let bind_addr = config.service.mcp_bind.clone();
	let service = build_service(config).await?;

	server::serve_mcp(&bind_addr, Arc::new(service)).await
}

/// Loads the pattern catalog and opens the observation archive.
pub async fn build_service(config: Config) -> Result<PieService> {
	let store = PatternStore::new();

	if let Some(dir) = config.patterns.dir.as_deref() {
		load_catalog(&store, dir)?;
	}

	let limits = ArchiveLimits {
		max_entries: config.archive.max_entries,
		max_total_bytes: config.archive.max_total_bytes,
	};
	let archive = ObservationArchive::open(&config.archive.dir, limits).await?;

	Ok(PieService::new(config, Arc::new(store), Arc::new(archive), ModeController::default()))
}

fn load_catalog(store: &PatternStore, dir: &Path) -> Result<()> {
	if !dir.exists() {
		tracing::warn!(dir = %dir.display(), "Pattern directory does not exist. Starting empty.");

		return Ok(());
	}

	let loaded = loader::load_pattern_dir(dir)?;
	let report = store.bulk_load(loaded.records);

	tracing::info!(
		dir = %dir.display(),
		files = loaded.files,
		failed_files = loaded.failures.len(),
		loaded = report.accepted.len(),
		rejected = report.rejected.len(),
		"Pattern catalog loaded."
	);

	Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}

#[cfg(test)]
mod tests {
	use pie_testkit::{TestDir, sample_record, test_config};

	use super::*;

	#[tokio::test]
	async fn build_service_loads_patterns_and_skips_bad_records() {
		let dir = TestDir::new("mcp_build").expect("Failed to create test dir.");
		let patterns_dir = dir.join("patterns");

		std::fs::create_dir_all(&patterns_dir).expect("Failed to create patterns dir.");

		let mut bad = serde_json::to_value(sample_record("bad", "react", "hooks", &["state"]))
			.expect("encode");

		bad["description"] = serde_json::json!("");

		let records = serde_json::json!([
			sample_record("r1", "react", "hooks", &["state"]),
			sample_record("r2", "react", "perf", &["memo"]),
			bad,
		]);

		std::fs::write(patterns_dir.join("react.json"), records.to_string()).expect("write");

		let mut config = test_config(&dir.join("archive"));

		config.patterns.dir = Some(patterns_dir);

		let service = build_service(config).await.expect("Failed to build service.");

		assert_eq!(service.store.len(), 2);
		assert!(service.archive.is_empty().await);
	}

	#[tokio::test]
	async fn missing_pattern_dir_starts_empty() {
		let dir = TestDir::new("mcp_empty").expect("Failed to create test dir.");
		let mut config = test_config(&dir.join("archive"));

		config.patterns.dir = Some(dir.join("absent"));

		let service = build_service(config).await.expect("Failed to build service.");

		assert!(service.store.is_empty());
	}
}
