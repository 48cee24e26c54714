//! Pattern files on disk. A file may hold records of any framework.
//!
//! A file holds either a bare array of pattern records or an object with a `patterns` array.

use std::{
	fs,
	io::ErrorKind,
	path::{Path, PathBuf},
};

use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;

use crate::{Error, Result};
use pie_domain::{CodePattern, PatternRecord, safety};

const PATTERN_EXTENSION: &str = "json";

/// Raw records collected from a pattern directory, plus the files that could not be read.
#[derive(Debug, Default)]
pub struct LoadedRecords {
	pub records: Vec<Value>,
	pub failures: Vec<Error>,
	pub files: usize,
}

/// Reads every `*.json` file in `dir`, in file-name order, into one batch of raw records.
///
/// A file that cannot be read or parsed is reported and skipped. A missing directory is an
/// error; an empty one yields an empty batch.
pub fn load_pattern_dir(dir: &Path) -> Result<LoadedRecords> {
	let entries = fs::read_dir(dir).map_err(|err| load_error(dir, err))?;
	let mut paths = Vec::new();

	for entry in entries {
		let path = entry.map_err(|err| load_error(dir, err))?.path();

		if path.is_file()
			&& path.extension().and_then(|ext| ext.to_str()) == Some(PATTERN_EXTENSION)
		{
			paths.push(path);
		}
	}

	paths.sort();

	let mut loaded = LoadedRecords::default();

	for path in paths {
		match read_pattern_file(&path) {
			Ok(records) => {
				tracing::debug!(path = %path.display(), records = records.len(), "Pattern file read.");

				loaded.files += 1;
				loaded.records.extend(records);
			},
			Err(err) => {
				tracing::warn!(error = %err, "Skipping pattern file.");

				loaded.failures.push(err);
			},
		}
	}

	Ok(loaded)
}

pub fn read_pattern_file(path: &Path) -> Result<Vec<Value>> {
	let raw = fs::read_to_string(path).map_err(|err| load_error(path, err))?;
	let document: Value = serde_json::from_str(&raw).map_err(|err| load_error(path, err))?;

	match document {
		Value::Array(records) => Ok(records),
		Value::Object(mut object) => match object.remove("patterns") {
			Some(Value::Array(records)) => Ok(records),
			_ => Err(load_error(path, "expected a `patterns` array")),
		},
		_ => Err(load_error(path, "expected an array or an object with `patterns`")),
	}
}

/// Adds one pattern to `<dir>/<framework>.json`, creating the file when missing.
///
/// Records already in the file stay as they are on disk, whatever their framework, and the
/// file keeps its shape (bare array or `patterns` object). The file is replaced atomically.
pub async fn append_pattern(dir: &Path, pattern: CodePattern) -> Result<PathBuf> {
	let framework = pattern.framework.clone();

	if !safety::is_safe_name(&framework) || framework.starts_with('.') {
		return Err(Error::PathTraversal(framework));
	}

	let path = dir.join(format!("{framework}.{PATTERN_EXTENSION}"));
	let record =
		serde_json::to_value(PatternRecord::from(pattern)).map_err(|err| load_error(&path, err))?;
	let document = match tokio::fs::read_to_string(&path).await {
		Ok(raw) => {
			let mut document: Value =
				serde_json::from_str(&raw).map_err(|err| load_error(&path, err))?;

			push_record(&mut document, record).map_err(|reason| load_error(&path, reason))?;

			document
		},
		Err(err) if err.kind() == ErrorKind::NotFound =>
			json!({ "framework": framework, "patterns": [record] }),
		Err(err) => return Err(load_error(&path, err)),
	};
	let payload = serde_json::to_vec_pretty(&document).map_err(|err| load_error(&path, err))?;
	let tmp_path = dir.join(format!(".{framework}.{PATTERN_EXTENSION}.tmp"));
	let written = async {
		tokio::fs::create_dir_all(dir).await?;

		let mut file = tokio::fs::File::create(&tmp_path).await?;

		file.write_all(&payload).await?;
		file.sync_all().await?;

		tokio::fs::rename(&tmp_path, &path).await
	}
	.await;

	if let Err(err) = written {
		let _ = tokio::fs::remove_file(&tmp_path).await;

		return Err(load_error(&path, err));
	}

	tracing::info!(path = %path.display(), "Pattern file updated.");

	Ok(path)
}

fn push_record(document: &mut Value, record: Value) -> std::result::Result<(), &'static str> {
	let records = match document {
		Value::Array(records) => records,
		Value::Object(object) => match object.get_mut("patterns") {
			Some(Value::Array(records)) => records,
			_ => return Err("expected a `patterns` array"),
		},
		_ => return Err("expected an array or an object with `patterns`"),
	};

	records.push(record);

	Ok(())
}

fn load_error(path: &Path, err: impl ToString) -> Error {
	Error::Load { path: path.to_path_buf(), message: err.to_string() }
}
