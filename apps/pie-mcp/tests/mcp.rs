use serde_json::json;

use pie_domain::PatternRecord;
use pie_testkit::{TestDir, sample_record};

fn write_config(dir: &TestDir) -> std::path::PathBuf {
	let path = dir.join("pie.toml");
	let raw = format!(
		"[service]\nmcp_bind = \"127.0.0.1:0\"\nlog_level = \"debug\"\n\n[patterns]\ndir = {patterns:?}\n\n[archive]\ndir = {archive:?}\nmax_entries = 2\n",
		patterns = dir.join("patterns").display().to_string(),
		archive = dir.join("archive").display().to_string(),
	);

	std::fs::write(&path, raw).expect("Failed to write config.");

	path
}

fn write_patterns(dir: &TestDir, framework: &str, records: Vec<PatternRecord>) {
	let patterns_dir = dir.join("patterns");

	std::fs::create_dir_all(&patterns_dir).expect("Failed to create patterns dir.");
	std::fs::write(
		patterns_dir.join(format!("{framework}.json")),
		json!({ "framework": framework, "patterns": records }).to_string(),
	)
	.expect("Failed to write pattern file.");
}

#[tokio::test]
async fn config_file_drives_catalog_and_archive() {
	let dir = TestDir::new("mcp_config").expect("Failed to create test dir.");

	write_patterns(
		&dir,
		"react",
		vec![
			sample_record("r1", "react", "hooks", &["state"]),
			sample_record("r2", "react", "perf", &["memo"]),
		],
	);
	write_patterns(&dir, "vue", vec![sample_record("r1", "vue", "routing", &["router"])]);

	let config = pie_config::load(&write_config(&dir)).expect("Failed to load config.");
	let service = pie_mcp::build_service(config).await.expect("Failed to build service.");
	let stats = service.dispatch("get-statistics", json!({})).await.expect("stats");

	assert_eq!(stats, json!({ "total_patterns": 2, "frameworks": 1, "categories": 2 }));

	service.dispatch("set-endless-mode", json!({ "enabled": true })).await.expect("toggle");

	let mut obs_ids = Vec::new();

	for _ in 0..3 {
		let compact = service
			.dispatch("get-patterns", json!({ "framework": "react" }))
			.await
			.expect("List failed.");

		obs_ids.push(compact["obs_id"].as_str().expect("Missing obs_id.").to_string());
	}

	assert_eq!(service.archive.len().await, 2);
	assert!(
		service.dispatch("get-observation", json!({ "obs_id": obs_ids[0] })).await.is_err(),
		"Oldest observation should have been evicted."
	);

	let latest = service
		.dispatch("get-observation", json!({ "obs_id": obs_ids[2] }))
		.await
		.expect("Latest observation missing.");

	assert_eq!(latest["total"], 2);
}
