//! File-backed archive for full tool results that were replaced by compact summaries.
//!
//! Every entry is one `<uuid>.json` file holding an [`ObservationRecord`]. Files are written
//! to a hidden temp name first and renamed into place, so a reader never sees a partial entry.

use std::{
	collections::{BTreeMap, HashSet},
	io::ErrorKind,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use uuid::Uuid;

use crate::{Error, Result};
use pie_domain::safety;

const KIND_OBSERVATION: &str = "observation";
const ENTRY_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
	pub max_entries: usize,
	/// Oldest entries are evicted while the archive is above this size. The newest entry is
	/// always kept.
	pub max_total_bytes: Option<u64>,
}
impl Default for ArchiveLimits {
	fn default() -> Self {
		Self { max_entries: 1_000_000, max_total_bytes: None }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
	pub obs_id: Uuid,
	pub tool: String,
	#[serde(with = "pie_domain::time_serde")]
	pub created_at: OffsetDateTime,
	pub content: String,
}

pub struct ObservationArchive {
	dir: PathBuf,
	limits: ArchiveLimits,
	index: Mutex<ArchiveIndex>,
}

#[derive(Default)]
struct ArchiveIndex {
	entries: BTreeMap<(OffsetDateTime, u64), IndexedEntry>,
	ids: HashSet<Uuid>,
	next_seq: u64,
	total_bytes: u64,
	last_created_at: Option<OffsetDateTime>,
}
impl ArchiveIndex {
	fn push(&mut self, created_at: OffsetDateTime, obs_id: Uuid, bytes: u64) {
		self.entries.insert((created_at, self.next_seq), IndexedEntry { obs_id, bytes });
		self.ids.insert(obs_id);

		self.next_seq += 1;
		self.total_bytes = self.total_bytes.saturating_add(bytes);
		self.last_created_at = Some(self.last_created_at.map_or(created_at, |t| t.max(created_at)));
	}

	fn over_limit(&self, limits: &ArchiveLimits) -> bool {
		if self.entries.len() > limits.max_entries.max(1) {
			return true;
		}

		match limits.max_total_bytes {
			Some(max_bytes) => self.entries.len() > 1 && self.total_bytes > max_bytes,
			None => false,
		}
	}

	fn pop_oldest(&mut self) -> Option<IndexedEntry> {
		let (_, entry) = self.entries.pop_first()?;

		self.ids.remove(&entry.obs_id);
		self.total_bytes = self.total_bytes.saturating_sub(entry.bytes);

		Some(entry)
	}
}

struct IndexedEntry {
	obs_id: Uuid,
	bytes: u64,
}

impl ObservationArchive {
	/// Opens the archive directory, creating it when missing.
	///
	/// Leftover temp files are removed, the index is rebuilt from the entries on disk, and
	/// the limits are applied before the archive is handed out.
	pub async fn open(dir: impl Into<PathBuf>, limits: ArchiveLimits) -> Result<Self> {
		let dir = dir.into();

		fs::create_dir_all(&dir).await.map_err(|err| {
			Error::ArchiveWrite(format!("Failed to create archive dir {}: {err}.", dir.display()))
		})?;

		let mut found = Vec::new();
		let mut reader = fs::read_dir(&dir).await.map_err(|err| {
			Error::ArchiveRead(format!("Failed to scan archive dir {}: {err}.", dir.display()))
		})?;

		while let Some(entry) = reader
			.next_entry()
			.await
			.map_err(|err| Error::ArchiveRead(format!("Failed to scan archive dir: {err}.")))?
		{
			let path = entry.path();
			let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
				continue;
			};

			if name.ends_with(TEMP_SUFFIX) {
				if let Err(err) = fs::remove_file(&path).await {
					tracing::warn!(path = %path.display(), error = %err, "Failed to remove stale archive temp file.");
				}

				continue;
			}

			let Some(obs_id) = entry_id(&path) else {
				continue;
			};

			match read_record(&path).await {
				Ok((record, bytes)) if record.obs_id == obs_id =>
					found.push((record.created_at, obs_id, bytes)),
				Ok(_) => {
					tracing::warn!(path = %path.display(), "Archive entry id does not match its file name.");

					discard_entry(&path).await;
				},
				Err(err @ ReadFailure::Parse(_)) => {
					tracing::warn!(path = %path.display(), error = %err, "Discarding malformed archive entry.");

					discard_entry(&path).await;
				},
				Err(err) => {
					tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable archive entry.");
				},
			}
		}

		found.sort();

		let mut index = ArchiveIndex::default();

		for (created_at, obs_id, bytes) in found {
			index.push(created_at, obs_id, bytes);
		}

		let archive = Self { dir, limits, index: Mutex::new(index) };
		let mut index = archive.index.lock().await;

		archive.evict(&mut index).await;

		tracing::info!(
			dir = %archive.dir.display(),
			entries = index.entries.len(),
			total_bytes = index.total_bytes,
			"Observation archive opened."
		);

		drop(index);

		Ok(archive)
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn limits(&self) -> ArchiveLimits {
		self.limits
	}

	/// Stores `content` and returns the id to retrieve it by. The returned entry is durable
	/// once this resolves.
	pub async fn put(&self, tool: &str, content: String) -> Result<Uuid> {
		let mut index = self.index.lock().await;
		let now = OffsetDateTime::now_utc();
		let created_at = index.last_created_at.map_or(now, |last| last.max(now));
		let record =
			ObservationRecord { obs_id: Uuid::new_v4(), tool: tool.to_string(), created_at, content };
		let payload = serde_json::to_vec(&record).map_err(|err| {
			Error::ArchiveWrite(format!("Failed to encode observation record: {err}."))
		})?;

		self.write_entry(record.obs_id, &payload).await?;

		index.push(created_at, record.obs_id, payload.len() as u64);

		self.evict(&mut index).await;

		tracing::debug!(obs_id = %record.obs_id, tool, bytes = payload.len(), "Observation archived.");

		Ok(record.obs_id)
	}

	pub async fn get(&self, obs_id: &str) -> Result<ObservationRecord> {
		let obs_id = obs_id.trim();

		if !safety::is_safe_name(obs_id) {
			return Err(Error::PathTraversal(obs_id.to_string()));
		}

		let Ok(parsed) = Uuid::parse_str(obs_id) else {
			return Err(not_found(obs_id));
		};

		// Only indexed entries exist; a file left behind by a failed eviction does not.
		if !self.index.lock().await.ids.contains(&parsed) {
			return Err(not_found(obs_id));
		}

		let path = self.entry_path(parsed);

		match read_record(&path).await {
			Ok((record, _)) => Ok(record),
			Err(ReadFailure::Missing) => Err(not_found(obs_id)),
			Err(err) => Err(Error::ArchiveRead(format!("Observation {parsed}: {err}"))),
		}
	}

	pub async fn len(&self) -> usize {
		self.index.lock().await.entries.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	pub async fn total_bytes(&self) -> u64 {
		self.index.lock().await.total_bytes
	}

	async fn write_entry(&self, obs_id: Uuid, payload: &[u8]) -> Result<()> {
		let path = self.entry_path(obs_id);
		let tmp_path = self.dir.join(format!(".{obs_id}.{ENTRY_EXTENSION}{TEMP_SUFFIX}"));
		let written = async {
			let mut file = fs::File::create(&tmp_path).await?;

			file.write_all(payload).await?;
			file.sync_all().await?;

			fs::rename(&tmp_path, &path).await
		}
		.await;

		if let Err(err) = written {
			let _ = fs::remove_file(&tmp_path).await;

			return Err(Error::ArchiveWrite(format!(
				"Failed to write observation {obs_id} to {}: {err}.",
				self.dir.display()
			)));
		}

		Ok(())
	}

	async fn evict(&self, index: &mut ArchiveIndex) {
		while index.over_limit(&self.limits) {
			let Some(victim) = index.pop_oldest() else {
				break;
			};

			match fs::remove_file(self.entry_path(victim.obs_id)).await {
				Ok(()) => {
					tracing::debug!(obs_id = %victim.obs_id, "Evicted archived observation.");
				},
				Err(err) if err.kind() == ErrorKind::NotFound => {},
				Err(err) => {
					tracing::warn!(obs_id = %victim.obs_id, error = %err, "Failed to delete evicted observation.");
				},
			}
		}
	}

	fn entry_path(&self, obs_id: Uuid) -> PathBuf {
		self.dir.join(format!("{obs_id}.{ENTRY_EXTENSION}"))
	}
}

#[derive(Debug, thiserror::Error)]
enum ReadFailure {
	#[error("entry does not exist")]
	Missing,
	#[error("{0}")]
	Io(std::io::Error),
	#[error("malformed entry: {0}")]
	Parse(serde_json::Error),
}

async fn read_record(path: &Path) -> Result<(ObservationRecord, u64), ReadFailure> {
	let bytes = fs::read(path).await.map_err(|err| match err.kind() {
		ErrorKind::NotFound => ReadFailure::Missing,
		_ => ReadFailure::Io(err),
	})?;
	let record = serde_json::from_slice(&bytes).map_err(ReadFailure::Parse)?;

	Ok((record, bytes.len() as u64))
}

async fn discard_entry(path: &Path) {
	if let Err(err) = fs::remove_file(path).await {
		tracing::warn!(path = %path.display(), error = %err, "Failed to remove discarded archive entry.");
	}
}

fn entry_id(path: &Path) -> Option<Uuid> {
	if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
		return None;
	}

	Uuid::parse_str(path.file_stem()?.to_str()?).ok()
}

fn not_found(obs_id: &str) -> Error {
	Error::NotFound { kind: KIND_OBSERVATION, id: obs_id.to_string() }
}
