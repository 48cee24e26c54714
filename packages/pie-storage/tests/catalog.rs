use std::{sync::Arc, thread};

use serde_json::json;

use pie_storage::{Error, PatternStore};
use pie_testkit::{sample_record, sample_record_with_relevance};

fn react_store() -> PatternStore {
	let store = PatternStore::new();

	store
		.add(sample_record_with_relevance("p1", "react", "state-management", &["hooks"], 0.9))
		.expect("Failed to add p1.");
	store
		.add(sample_record_with_relevance("p2", "react", "performance", &["memo"], 0.8))
		.expect("Failed to add p2.");

	store
}

#[test]
fn list_by_framework_orders_by_relevance() {
	let store = react_store();

	store.add(sample_record("v1", "vue", "state-management", &["hooks"])).expect("Failed to add v1.");

	let ids: Vec<_> =
		store.list_by(Some("react"), None).into_iter().map(|pattern| pattern.id).collect();

	assert_eq!(ids, vec!["p1".to_string(), "p2".to_string()]);
}

#[test]
fn list_by_unknown_framework_is_empty() {
	let store = react_store();

	assert!(store.list_by(Some("svelte"), None).is_empty());
	assert_eq!(store.list_by(None, Some("performance")).len(), 1);
	assert_eq!(store.list_by(None, None).len(), 2);
}

#[test]
fn duplicate_id_leaves_store_unchanged() {
	let store = react_store();
	let before = store.stats();
	let err = store
		.add(sample_record("p1", "vue", "routing", &["router"]))
		.expect_err("Expected duplicate id to be rejected.");

	assert!(matches!(err, Error::DuplicateId(ref id) if id == "p1"));
	assert_eq!(store.stats(), before);
	assert!(store.ids_by_framework("vue").is_empty());
	assert_eq!(store.get("p1").expect("p1 missing").framework, "react");
}

#[test]
fn invalid_records_are_rejected_before_insert() {
	let store = PatternStore::new();
	let mut record = sample_record("short", "react", "hooks", &["state"]);

	record.description = "too short".to_string();

	assert!(matches!(store.add(record), Err(Error::InvalidPattern(_))));

	let mut record = sample_record("comment", "react", "hooks", &["state"]);

	record.code = "// nothing but a comment here".to_string();

	assert!(matches!(store.add(record), Err(Error::InvalidPattern(_))));

	let record = sample_record("../escape", "react", "hooks", &["state"]);

	assert!(matches!(store.add(record), Err(Error::PathTraversal(_))));
	assert!(store.is_empty());
}

#[test]
fn indexes_follow_mutations() {
	let store = react_store();

	store.add(sample_record("p3", "react", "performance", &["Memo", "lazy"])).expect("add p3");

	assert_eq!(store.ids_by_tag("memo").len(), 2);
	assert_eq!(store.ids_by_category("performance").len(), 2);

	store.remove("p2").expect("remove p2");

	assert_eq!(store.ids_by_tag("memo").into_iter().collect::<Vec<_>>(), vec!["p3".to_string()]);
	assert_eq!(store.ids_by_framework("react").len(), 2);
	assert!(matches!(store.get("p2"), Err(Error::NotFound { .. })));
	assert!(matches!(store.remove("p2"), Err(Error::NotFound { .. })));

	let stats = store.stats();

	assert_eq!(stats.total_patterns, 2);
	assert_eq!(stats.frameworks, 1);
	assert_eq!(stats.categories, 2);
}

#[test]
fn touch_usage_and_set_relevance_update_pattern() {
	let store = react_store();
	let before = store.get("p2").expect("p2 missing");

	store.touch_usage("p2").expect("touch");

	let touched = store.touch_usage("p2").expect("touch");

	assert_eq!(touched.usage_count, before.usage_count + 2);
	assert!(touched.updated_at >= before.updated_at);

	store.set_relevance("p2", 1.0).expect("set relevance");

	let ids: Vec<_> = store.list_by(Some("react"), None).into_iter().map(|p| p.id).collect();

	assert_eq!(ids, vec!["p2".to_string(), "p1".to_string()]);
	assert!(matches!(store.set_relevance("p2", 1.5), Err(Error::InvalidPattern(_))));
	assert!(matches!(store.touch_usage("missing"), Err(Error::NotFound { .. })));
}

#[test]
fn bulk_load_keeps_valid_records() {
	let store = PatternStore::new();
	let valid = |id: &str| {
		serde_json::to_value(sample_record(id, "react", "hooks", &["state"]))
			.expect("Failed to encode record.")
	};
	let mut invalid = valid("bad");

	invalid["description"] = json!("");

	let report = store.bulk_load(vec![valid("a"), invalid, valid("b"), valid("c")]);

	assert_eq!(report.accepted.len(), 3);
	assert_eq!(report.rejected.len(), 1);
	assert_eq!(report.rejected[0].index, 1);
	assert_eq!(report.rejected[0].id.as_deref(), Some("bad"));
	assert!(matches!(report.rejected[0].error, Error::InvalidPattern(_)));
	assert_eq!(store.len(), 3);
	assert!(!report.is_clean());
}

#[test]
fn bulk_load_detects_duplicates_within_one_batch() {
	let store = react_store();
	let record = serde_json::to_value(sample_record("x1", "vue", "routing", &["router"]))
		.expect("Failed to encode record.");
	let existing = serde_json::to_value(sample_record("p1", "vue", "routing", &["router"]))
		.expect("Failed to encode record.");
	let report =
		store.bulk_load(vec![record.clone(), record, existing, json!({ "id": "broken" })]);

	assert_eq!(report.accepted, vec!["x1".to_string()]);
	assert_eq!(report.rejected.len(), 3);
	assert!(matches!(report.rejected[0].error, Error::DuplicateId(_)));
	assert!(matches!(report.rejected[1].error, Error::DuplicateId(_)));
	assert!(matches!(report.rejected[2].error, Error::InvalidPattern(_)));
}

#[test]
fn concurrent_adds_keep_ids_unique() {
	let store = Arc::new(PatternStore::new());
	let handles: Vec<_> = (0..8)
		.map(|worker| {
			let store = Arc::clone(&store);

			thread::spawn(move || {
				(0..25)
					.filter(|n| {
						let id = format!("shared-{n}");
						let framework = if worker % 2 == 0 { "react" } else { "vue" };

						store.add(sample_record(&id, framework, "hooks", &["state"])).is_ok()
					})
					.count()
			})
		})
		.collect();
	let inserted: usize =
		handles.into_iter().map(|handle| handle.join().expect("Worker panicked.")).sum();

	assert_eq!(inserted, 25);
	assert_eq!(store.len(), 25);

	let indexed = store.ids_by_framework("react").len() + store.ids_by_framework("vue").len();

	assert_eq!(indexed, 25);
	assert_eq!(store.ids_by_tag("state").len(), 25);
}
