use std::{
	collections::{BTreeMap, BTreeSet, HashMap},
	sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::{Error, Result};
use pie_domain::{CodePattern, PatternRecord, order, pattern_gate};

const KIND_PATTERN: &str = "pattern";

/// The authoritative pattern catalog plus its framework, category and tag indexes.
///
/// The primary map and all three indexes live behind one lock, so readers see
/// either the state before a mutation or the state after it.
#[derive(Default)]
pub struct PatternStore {
	catalog: RwLock<Catalog>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
	pub total_patterns: usize,
	pub frameworks: usize,
	pub categories: usize,
	pub tags: usize,
}

#[derive(Debug)]
pub struct RecordRejection {
	/// Position of the record in the loaded batch.
	pub index: usize,
	pub id: Option<String>,
	pub error: Error,
}

#[derive(Debug, Default)]
pub struct BulkLoadReport {
	pub accepted: Vec<String>,
	pub rejected: Vec<RecordRejection>,
}

#[derive(Default)]
struct Catalog {
	patterns: HashMap<String, CodePattern>,
	by_framework: BTreeMap<String, BTreeSet<String>>,
	by_category: BTreeMap<String, BTreeSet<String>>,
	by_tag: BTreeMap<String, BTreeSet<String>>,
}
impl Catalog {
	fn insert(&mut self, pattern: CodePattern) {
		let id = pattern.id.clone();

		self.by_framework.entry(pattern.framework.clone()).or_default().insert(id.clone());
		self.by_category.entry(pattern.category.clone()).or_default().insert(id.clone());

		for tag in &pattern.tags {
			self.by_tag.entry(tag.clone()).or_default().insert(id.clone());
		}

		self.patterns.insert(id, pattern);
	}

	fn remove(&mut self, id: &str) -> Option<CodePattern> {
		let pattern = self.patterns.remove(id)?;

		unindex(&mut self.by_framework, &pattern.framework, id);
		unindex(&mut self.by_category, &pattern.category, id);

		for tag in &pattern.tags {
			unindex(&mut self.by_tag, tag, id);
		}

		Some(pattern)
	}

	fn get_mut(&mut self, id: &str) -> Result<&mut CodePattern> {
		self.patterns.get_mut(id).ok_or_else(|| not_found(id))
	}

	fn candidate_ids(&self, framework: Option<&str>, category: Option<&str>) -> Vec<&String> {
		match (framework, category) {
			(Some(framework), Some(category)) => {
				let (Some(by_framework), Some(by_category)) =
					(self.by_framework.get(framework), self.by_category.get(category))
				else {
					return Vec::new();
				};

				by_framework.intersection(by_category).collect()
			},
			(Some(framework), None) =>
				self.by_framework.get(framework).map(|ids| ids.iter().collect()).unwrap_or_default(),
			(None, Some(category)) =>
				self.by_category.get(category).map(|ids| ids.iter().collect()).unwrap_or_default(),
			(None, None) => self.patterns.keys().collect(),
		}
	}

	fn collect(&self, framework: Option<&str>, category: Option<&str>) -> Vec<CodePattern> {
		self.candidate_ids(framework, category)
			.into_iter()
			.filter_map(|id| self.patterns.get(id))
			.cloned()
			.collect()
	}
}

impl PatternStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Validates and inserts a pattern. A rejected record leaves the catalog untouched.
	pub fn add(&self, record: PatternRecord) -> Result<CodePattern> {
		pattern_gate(&record)?;

		let pattern = record.into_pattern(OffsetDateTime::now_utc());
		let mut catalog = self.write();

		if catalog.patterns.contains_key(&pattern.id) {
			return Err(Error::DuplicateId(pattern.id));
		}

		catalog.insert(pattern.clone());

		tracing::debug!(pattern_id = %pattern.id, framework = %pattern.framework, "Pattern added.");

		Ok(pattern)
	}

	pub fn get(&self, id: &str) -> Result<CodePattern> {
		self.read().patterns.get(id).cloned().ok_or_else(|| not_found(id))
	}

	/// Counts one retrieval. Every call increments, so callers must not retry it blindly.
	pub fn touch_usage(&self, id: &str) -> Result<CodePattern> {
		let mut catalog = self.write();
		let pattern = catalog.get_mut(id)?;

		pattern.usage_count = pattern.usage_count.saturating_add(1);
		pattern.updated_at = OffsetDateTime::now_utc().max(pattern.updated_at);

		Ok(pattern.clone())
	}

	pub fn set_relevance(&self, id: &str, relevance_score: f32) -> Result<CodePattern> {
		if !relevance_score.is_finite() || !(0.0..=1.0).contains(&relevance_score) {
			return Err(Error::InvalidPattern(format!(
				"relevance_score must be within 0.0-1.0, got {relevance_score}."
			)));
		}

		let mut catalog = self.write();
		let pattern = catalog.get_mut(id)?;

		pattern.relevance_score = relevance_score;
		pattern.updated_at = OffsetDateTime::now_utc().max(pattern.updated_at);

		Ok(pattern.clone())
	}

	pub fn remove(&self, id: &str) -> Result<CodePattern> {
		let removed = self.write().remove(id).ok_or_else(|| not_found(id))?;

		tracing::debug!(pattern_id = %id, "Pattern removed.");

		Ok(removed)
	}

	/// Exact-match filter in catalog order (relevance, then usage, then id).
	pub fn list_by(&self, framework: Option<&str>, category: Option<&str>) -> Vec<CodePattern> {
		let mut patterns = self.read().collect(framework, category);

		patterns.sort_by(order::cmp_catalog);

		patterns
	}

	/// A consistent copy of the catalog, narrowed to one framework when given.
	pub fn snapshot(&self, framework: Option<&str>) -> Vec<CodePattern> {
		self.read().collect(framework, None)
	}

	/// Loads independently validated records. A bad record is reported and skipped;
	/// duplicates are checked against the whole catalog, including earlier records
	/// of the same batch.
	pub fn bulk_load<I>(&self, records: I) -> BulkLoadReport
	where
		I: IntoIterator<Item = Value>,
	{
		let mut report = BulkLoadReport::default();

		for (index, raw) in records.into_iter().enumerate() {
			let id = raw.get("id").and_then(Value::as_str).map(str::to_string);
			let result = serde_json::from_value::<PatternRecord>(raw)
				.map_err(|err| Error::InvalidPattern(format!("Malformed pattern record: {err}.")))
				.and_then(|record| self.add(record));

			match result {
				Ok(pattern) => report.accepted.push(pattern.id),
				Err(error) => {
					tracing::warn!(index, id = ?id, %error, "Rejected pattern record.");

					report.rejected.push(RecordRejection { index, id, error });
				},
			}
		}

		report
	}

	pub fn stats(&self) -> CatalogStats {
		let catalog = self.read();

		CatalogStats {
			total_patterns: catalog.patterns.len(),
			frameworks: catalog.by_framework.len(),
			categories: catalog.by_category.len(),
			tags: catalog.by_tag.len(),
		}
	}

	pub fn len(&self) -> usize {
		self.read().patterns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn frameworks(&self) -> Vec<String> {
		self.read().by_framework.keys().cloned().collect()
	}

	pub fn ids_by_framework(&self, framework: &str) -> BTreeSet<String> {
		self.read().by_framework.get(framework).cloned().unwrap_or_default()
	}

	pub fn ids_by_category(&self, category: &str) -> BTreeSet<String> {
		self.read().by_category.get(category).cloned().unwrap_or_default()
	}

	pub fn ids_by_tag(&self, tag: &str) -> BTreeSet<String> {
		self.read().by_tag.get(tag).cloned().unwrap_or_default()
	}

	fn read(&self) -> RwLockReadGuard<'_, Catalog> {
		self.catalog.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
		self.catalog.write().unwrap_or_else(|err| err.into_inner())
	}
}

impl BulkLoadReport {
	pub fn is_clean(&self) -> bool {
		self.rejected.is_empty()
	}
}

fn unindex(index: &mut BTreeMap<String, BTreeSet<String>>, key: &str, id: &str) {
	if let Some(ids) = index.get_mut(key) {
		ids.remove(id);

		if ids.is_empty() {
			index.remove(key);
		}
	}
}

fn not_found(id: &str) -> Error {
	Error::NotFound { kind: KIND_PATTERN, id: id.to_string() }
}

#[cfg(test)]
mod tests {
	use super::*;

	use pie_testkit::sample_record;

	#[test]
	fn remove_drops_empty_buckets() {
		let store = PatternStore::new();

		store.add(sample_record("a", "react", "hooks", &["state"])).expect("add");
		store.add(sample_record("b", "react", "perf", &["memo"])).expect("add");
		store.remove("a").expect("remove");

		let catalog = store.read();

		assert!(!catalog.by_category.contains_key("hooks"));
		assert!(!catalog.by_tag.contains_key("state"));
		assert_eq!(catalog.by_framework.get("react").map(BTreeSet::len), Some(1));
	}

	#[test]
	fn candidate_ids_intersect_framework_and_category() {
		let store = PatternStore::new();

		store.add(sample_record("a", "react", "hooks", &["state"])).expect("add");
		store.add(sample_record("b", "vue", "hooks", &["state"])).expect("add");
		store.add(sample_record("c", "react", "perf", &["memo"])).expect("add");

		let catalog = store.read();
		let ids = catalog.candidate_ids(Some("react"), Some("hooks"));

		assert_eq!(ids, vec!["a"]);
		assert!(catalog.candidate_ids(Some("svelte"), Some("hooks")).is_empty());
	}
}
