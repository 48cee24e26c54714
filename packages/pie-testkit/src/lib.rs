mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use uuid::Uuid;

use pie_config::{Archive, Config, Endless, Limits, Patterns, Ranking, Service};
use pie_domain::PatternRecord;

/// A scratch directory under the system temp dir, removed on drop.
pub struct TestDir {
	path: PathBuf,
	cleaned: bool,
}
impl TestDir {
	pub fn new(prefix: &str) -> Result<Self> {
		let path = env::temp_dir().join(format!("pie_test_{prefix}_{}", Uuid::new_v4().simple()));

		fs::create_dir_all(&path).map_err(|err| {
			Error::Message(format!("Failed to create test dir {}: {err}.", path.display()))
		})?;

		Ok(Self { path, cleaned: false })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn join(&self, name: &str) -> PathBuf {
		self.path.join(name)
	}

	pub fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner()
	}

	fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		if self.path.exists() {
			fs::remove_dir_all(&self.path)?;
		}

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDir {
	fn drop(&mut self) {
		if let Err(err) = self.cleanup_inner() {
			eprintln!("Test dir cleanup failed: {err}.");
		}
	}
}

/// A record that passes the pattern gate.
pub fn sample_record(id: &str, framework: &str, category: &str, tags: &[&str]) -> PatternRecord {
	PatternRecord {
		id: id.to_string(),
		category: category.to_string(),
		framework: framework.to_string(),
		version: "1.0".to_string(),
		title: format!("{framework} {category} pattern {id}"),
		description: format!("Reusable {category} example for {framework} projects."),
		code: format!("fn {}() {{ /* {category} */ }}", id.replace(['-', '.'], "_")),
		tags: tags.iter().map(|tag| tag.to_string()).collect(),
		usage_count: 0,
		relevance_score: 0.5,
		created_at: None,
		updated_at: None,
	}
}

pub fn sample_record_with_relevance(
	id: &str,
	framework: &str,
	category: &str,
	tags: &[&str],
	relevance_score: f32,
) -> PatternRecord {
	PatternRecord { relevance_score, ..sample_record(id, framework, category, tags) }
}

pub fn test_config(archive_dir: &Path) -> Config {
	Config {
		service: Service {
			mcp_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			bind_localhost_only: true,
		},
		patterns: Patterns { dir: None, flush_on_train: false },
		archive: Archive {
			dir: archive_dir.to_path_buf(),
			max_entries: 1_000,
			max_total_bytes: None,
		},
		endless: Endless::default(),
		ranking: Ranking::default(),
		limits: Limits::default(),
	}
}
