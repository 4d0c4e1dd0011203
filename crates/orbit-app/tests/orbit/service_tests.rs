use super::*;
use orbit_contracts::models::ProjectDto;
use orbit_settings::{MemorySettingsStore, SettingsStore};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

type Gate = (mpsc::Sender<()>, mpsc::Receiver<()>);

#[derive(Default)]
struct FakeBackend {
    roots: Mutex<HashMap<String, Vec<ProjectDto>>>,
    scan_calls: AtomicUsize,
    launches: Mutex<Vec<LaunchRequest>>,
    gate: Mutex<Option<Gate>>,
}

impl FakeBackend {
    fn set_root(&self, root: &str, projects: &[&str]) {
        let projects = projects
            .iter()
            .map(|path| fake_project(path, root))
            .collect();
        self.roots
            .lock()
            .expect("roots lock")
            .insert(root.to_string(), projects);
    }

    fn set_project_details(&self, root: &str, path: &str, ides: &[&str], latest: &str) {
        let mut roots = self.roots.lock().expect("roots lock");
        let project = roots
            .get_mut(root)
            .and_then(|projects| projects.iter_mut().find(|project| project.path == path))
            .expect("known project");
        project.ides = ides.iter().map(|ide| ide.to_string()).collect();
        project.last_modified_file = Some(latest.to_string());
    }

    /// The next scan call signals `started` and blocks until `release` fires.
    fn arm_gate(&self, started: mpsc::Sender<()>, release: mpsc::Receiver<()>) {
        *self.gate.lock().expect("gate lock") = Some((started, release));
    }

    fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }

    fn launches(&self) -> Vec<LaunchRequest> {
        self.launches.lock().expect("launches lock").clone()
    }
}

impl ProjectBackend for FakeBackend {
    fn scan(&self, base_path: &str) -> AppResult<Vec<ProjectDto>> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().expect("gate lock").take();
        if let Some((started, release)) = gate {
            let _ = started.send(());
            let _ = release.recv();
        }
        self.roots
            .lock()
            .expect("roots lock")
            .get(base_path)
            .cloned()
            .ok_or_else(|| AppError::new("project_root_unreadable", "Project folder cannot be read"))
    }

    fn launch(&self, request: &LaunchRequest) -> AppResult<()> {
        self.launches
            .lock()
            .expect("launches lock")
            .push(request.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingHost {
    events: Mutex<Vec<(String, Value)>>,
    revealed: Mutex<Vec<String>>,
}

impl RecordingHost {
    fn reasons(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .map(|(_, payload)| payload["reason"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn last_payload(&self) -> Option<(String, Value)> {
        self.events.lock().expect("events lock").last().cloned()
    }
}

impl OrbitHost for RecordingHost {
    fn emit(&self, event: &str, payload: Value) -> AppResult<()> {
        self.events
            .lock()
            .expect("events lock")
            .push((event.to_string(), payload));
        Ok(())
    }

    fn reveal_path(&self, path: &str) -> AppResult<()> {
        self.revealed
            .lock()
            .expect("revealed lock")
            .push(path.to_string());
        Ok(())
    }
}

/// Holds the first write of `key` long enough for another mutation to race it.
struct SlowFirstWrite {
    inner: Arc<MemorySettingsStore>,
    key: &'static str,
    armed: AtomicBool,
    started: Mutex<Option<mpsc::Sender<()>>>,
}

impl SettingsStore for SlowFirstWrite {
    fn get(&self, key: &str) -> AppResult<Option<Value>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> AppResult<()> {
        if key == self.key && self.armed.swap(false, Ordering::SeqCst) {
            if let Some(started) = self.started.lock().expect("started lock").take() {
                let _ = started.send(());
            }
            std::thread::sleep(Duration::from_millis(300));
        }
        self.inner.set(key, value)
    }

    fn save(&self) -> AppResult<()> {
        self.inner.save()
    }
}

fn fake_project(path: &str, root: &str) -> ProjectDto {
    ProjectDto {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        last_modified: None,
        last_modified_file: None,
        project_type: "unknown".to_string(),
        techs: Vec::new(),
        ides: Vec::new(),
        source_path: root.to_string(),
    }
}

struct Harness {
    service: OrbitService,
    store: Arc<MemorySettingsStore>,
    backend: Arc<FakeBackend>,
    host: Arc<RecordingHost>,
}

fn memory_store(settings: Value) -> Arc<MemorySettingsStore> {
    let entries = match settings {
        Value::Object(entries) => entries,
        _ => serde_json::Map::new(),
    };
    Arc::new(MemorySettingsStore::with_entries(entries))
}

fn harness(settings: Value) -> Harness {
    let store = memory_store(settings);
    harness_over(store.clone(), store)
}

/// Harness whose first write of `key` is slow; the receiver fires when that
/// write starts.
fn harness_with_slow_write(settings: Value, key: &'static str) -> (Harness, mpsc::Receiver<()>) {
    let store = memory_store(settings);
    let (started_tx, started_rx) = mpsc::channel();
    let slow = Arc::new(SlowFirstWrite {
        inner: store.clone(),
        key,
        armed: AtomicBool::new(true),
        started: Mutex::new(Some(started_tx)),
    });
    (harness_over(store, slow), started_rx)
}

fn harness_over(store: Arc<MemorySettingsStore>, backing: Arc<dyn SettingsStore>) -> Harness {
    let backend = Arc::new(FakeBackend::default());
    let host = Arc::new(RecordingHost::default());
    let service = OrbitService::new(
        OrbitSettingsRepository::new(backing),
        backend.clone(),
        host.clone(),
    );
    Harness {
        service,
        store,
        backend,
        host,
    }
}

fn displayed(snapshot: &OrbitSnapshotDto) -> Vec<&str> {
    snapshot
        .projects
        .iter()
        .map(|project| project.path.as_str())
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test]
async fn load_should_scan_persisted_roots() {
    let h = harness(json!({
        "orbitPaths": [{"path": "/r1", "enabled": true}],
        "projectOrder": ["/p/b"],
    }));
    h.backend.set_root("/r1", &["/p/a", "/p/b"]);

    let snapshot = h.service.load().await;

    assert_eq!(displayed(&snapshot), vec!["/p/b", "/p/a"]);
    assert_eq!(h.host.reasons(), vec!["startup"]);
}

#[tokio::test]
async fn load_without_roots_should_not_scan() {
    let h = harness(json!({}));

    let snapshot = h.service.load().await;

    assert!(snapshot.projects.is_empty());
    assert_eq!(h.backend.scan_calls(), 0);
    assert!(h.host.reasons().is_empty());
}

#[tokio::test]
async fn overlapping_roots_should_merge_to_one_entry_per_path() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a", "/p/shared"]);
    h.backend.set_root("/r2", &["/p/shared", "/p/b"]);

    let snapshot = h
        .service
        .add_roots(strings(&["/r1", "/r2"]))
        .await
        .expect("add roots");

    assert_eq!(displayed(&snapshot), vec!["/p/a", "/p/shared", "/p/b"]);
    assert_eq!(snapshot.projects[1].source_path, "/r2");
}

#[tokio::test]
async fn exclude_twice_should_converge_and_restore_on_empty_should_be_noop() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a", "/p/b"]);
    h.service.add_roots(strings(&["/r1"])).await.expect("add roots");

    let once = h.service.exclude_project("/p/a").await.expect("exclude");
    let twice = h.service.exclude_project("/p/a").await.expect("exclude again");

    assert_eq!(once.excluded, twice.excluded);
    assert_eq!(twice.excluded, strings(&["/p/a"]));
    assert_eq!(displayed(&twice), vec!["/p/b"]);

    let restored = h.service.restore_excluded().await.expect("restore");
    let restored_again = h.service.restore_excluded().await.expect("restore again");
    assert!(restored_again.excluded.is_empty());
    assert_eq!(displayed(&restored), displayed(&restored_again));
    assert_eq!(h.store.get("excludedPaths").expect("get"), Some(json!([])));
}

#[tokio::test]
async fn manual_order_should_survive_rescan() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a", "/p/b", "/p/c"]);
    h.service.add_roots(strings(&["/r1"])).await.expect("add roots");
    let calls_before_reorder = h.backend.scan_calls();

    let reordered = h
        .service
        .reorder_projects(strings(&["/p/c", "/p/a", "/p/b"]))
        .await
        .expect("reorder");
    assert_eq!(displayed(&reordered), vec!["/p/c", "/p/a", "/p/b"]);
    assert_eq!(h.backend.scan_calls(), calls_before_reorder);
    assert_eq!(
        h.store.get("projectOrder").expect("get"),
        Some(json!(["/p/c", "/p/a", "/p/b"]))
    );

    h.backend.set_root("/r1", &["/p/b", "/p/c", "/p/a"]);
    let rescanned = h.service.rescan().await;

    assert_eq!(displayed(&rescanned), vec!["/p/c", "/p/a", "/p/b"]);
}

#[tokio::test]
async fn newcomers_should_be_appended_to_persisted_order() {
    let h = harness(json!({
        "orbitPaths": [{"path": "/r1", "enabled": true}],
        "projectOrder": ["/p/b", "/p/a"],
    }));
    h.backend.set_root("/r1", &["/p/a", "/p/b", "/p/c"]);

    let snapshot = h.service.load().await;

    assert_eq!(displayed(&snapshot), vec!["/p/b", "/p/a", "/p/c"]);
    assert_eq!(snapshot.project_order, strings(&["/p/b", "/p/a", "/p/c"]));
    assert_eq!(
        h.store.get("projectOrder").expect("get"),
        Some(json!(["/p/b", "/p/a", "/p/c"]))
    );
}

#[tokio::test]
async fn stale_scan_should_not_overwrite_newer_result() {
    let h = harness(json!({
        "orbitPaths": [
            {"path": "/x", "enabled": true},
            {"path": "/y", "enabled": false},
        ],
    }));
    h.backend.set_root("/x", &["/p/x1"]);
    h.backend.set_root("/y", &["/p/y1"]);
    h.service.load().await;

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    h.backend.arm_gate(started_tx, release_rx);

    let first = tokio::spawn({
        let service = h.service.clone();
        async move { service.rescan().await }
    });
    tokio::task::spawn_blocking(move || started_rx.recv())
        .await
        .expect("join gate wait")
        .expect("first scan started");

    let second = h.service.toggle_root(1).await.expect("enable /y");
    assert_eq!(displayed(&second), vec!["/p/x1", "/p/y1"]);

    release_tx.send(()).expect("release first scan");
    first.await.expect("join first scan");

    assert_eq!(displayed(&h.service.snapshot()), vec!["/p/x1", "/p/y1"]);
    assert_eq!(h.host.reasons().last().map(String::as_str), Some("root_toggled"));
}

#[tokio::test]
async fn disabled_root_should_contribute_nothing_and_toggle_back_restores() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a"]);
    h.backend.set_root("/r2", &["/p/b", "/p/c"]);
    let initial = h
        .service
        .add_roots(strings(&["/r1", "/r2"]))
        .await
        .expect("add roots");

    let disabled = h.service.toggle_root(1).await.expect("disable");
    assert_eq!(displayed(&disabled), vec!["/p/a"]);

    let enabled = h.service.toggle_root(1).await.expect("enable");
    assert_eq!(displayed(&enabled), displayed(&initial));
    assert_eq!(
        h.host.last_payload().map(|(_, payload)| payload["diff"]["added"].clone()),
        Some(json!(["/p/b", "/p/c"]))
    );
}

#[tokio::test]
async fn zero_enabled_roots_should_yield_empty_list_without_backend_calls() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a"]);
    h.service.add_roots(strings(&["/r1"])).await.expect("add roots");
    let calls = h.backend.scan_calls();

    let snapshot = h.service.toggle_root(0).await.expect("disable");

    assert!(snapshot.projects.is_empty());
    assert_eq!(h.backend.scan_calls(), calls);
}

#[tokio::test]
async fn failing_root_should_leave_other_projects_visible() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a"]);

    let snapshot = h
        .service
        .add_roots(strings(&["/missing", "/r1"]))
        .await
        .expect("add roots");

    assert_eq!(displayed(&snapshot), vec!["/p/a"]);
    assert_eq!(snapshot.roots.len(), 2);
}

#[tokio::test]
async fn out_of_range_toggle_should_not_persist_or_scan() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a"]);
    h.service.add_roots(strings(&["/r1"])).await.expect("add roots");
    let saves = h.store.save_count();
    let calls = h.backend.scan_calls();

    let snapshot = h.service.toggle_root(9).await.expect("toggle");

    assert!(snapshot.roots[0].enabled);
    assert_eq!(h.store.save_count(), saves);
    assert_eq!(h.backend.scan_calls(), calls);
}

#[tokio::test]
async fn delete_root_should_be_idempotent() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a"]);
    h.service.add_roots(strings(&["/r1"])).await.expect("add roots");

    let first = h.service.delete_root("/r1").await.expect("delete");
    let second = h.service.delete_root("/r1").await.expect("delete again");

    assert!(first.roots.is_empty());
    assert_eq!(first, second);
    assert_eq!(h.store.get("orbitPaths").expect("get"), Some(json!([])));
}

#[tokio::test]
async fn persist_failure_should_surface_after_state_and_scan_update() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a"]);
    h.store.set_fail_writes(true);

    let error = h
        .service
        .add_roots(strings(&["/r1"]))
        .await
        .expect_err("persist should fail");

    assert_eq!(error.code, "orbit_settings_persist_failed");
    assert_eq!(error.context_value("settingsError"), Some("settings_write_failed"));
    let snapshot = h.service.snapshot();
    assert_eq!(snapshot.roots.len(), 1);
    assert_eq!(displayed(&snapshot), vec!["/p/a"]);
}

#[tokio::test]
async fn set_project_ide_should_persist_only_preferences() {
    let h = harness(json!({}));

    let snapshot = h
        .service
        .set_project_ide("/p/a", "cursor")
        .await
        .expect("set ide");

    assert_eq!(snapshot.preferred_ides.get("/p/a").map(String::as_str), Some("cursor"));
    let stored = h.store.snapshot();
    assert_eq!(stored.get("preferredIdes"), Some(&json!({"/p/a": "cursor"})));
    assert!(!stored.contains_key("orbitPaths"));
    assert!(!stored.contains_key("projectOrder"));
    assert_eq!(h.backend.scan_calls(), 0);
}

#[tokio::test]
async fn launch_should_resolve_effective_ide_and_latest_file() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a"]);
    h.backend
        .set_project_details("/r1", "/p/a", &["jetbrains", "vscode"], "src/lib.rs");
    h.service.add_roots(strings(&["/r1"])).await.expect("add roots");

    h.service
        .launch_project("/p/a", None, true)
        .await
        .expect("launch detected ide");
    h.service
        .set_project_ide("/p/a", "cursor")
        .await
        .expect("set ide");
    h.service
        .launch_project("/p/a", None, false)
        .await
        .expect("launch preferred ide");
    h.service
        .launch_project("/p/unknown", Some("zed"), true)
        .await
        .expect("launch explicit ide");

    let launches = h.backend.launches();
    assert_eq!(launches[0].ide_id, "jetbrains");
    assert_eq!(launches[0].target_file.as_deref(), Some("src/lib.rs"));
    assert_eq!(launches[1].ide_id, "cursor");
    assert_eq!(launches[1].target_file, None);
    assert_eq!(launches[2].ide_id, "zed");
    assert_eq!(launches[2].target_file, None);
}

#[tokio::test]
async fn reveal_should_delegate_to_host_and_reject_blank_path() {
    let h = harness(json!({}));

    h.service.reveal_project("/p/a").expect("reveal");
    let error = h.service.reveal_project("  ").expect_err("blank path");

    assert_eq!(error.code, "project_reveal_failed");
    assert_eq!(
        h.host.revealed.lock().expect("revealed lock").clone(),
        strings(&["/p/a"])
    );
}

#[tokio::test]
async fn events_should_carry_projects_changed_name_and_reason() {
    let h = harness(json!({}));
    h.backend.set_root("/r1", &["/p/a"]);

    h.service.add_roots(strings(&["/r1"])).await.expect("add roots");
    h.service
        .reorder_projects(strings(&["/p/a"]))
        .await
        .expect("reorder");

    let (event, payload) = h.host.last_payload().expect("event emitted");
    assert_eq!(event, PROJECTS_CHANGED_EVENT);
    assert_eq!(payload["reason"], json!("reorder"));
    assert_eq!(payload["snapshot"]["projectOrder"], json!(["/p/a"]));
    assert_eq!(h.host.reasons(), vec!["roots_added", "reorder"]);
}

async fn wait_for(started: mpsc::Receiver<()>) {
    tokio::task::spawn_blocking(move || started.recv())
        .await
        .expect("join wait")
        .expect("slow write started");
}

#[tokio::test]
async fn reorder_during_order_repair_write_should_win_on_disk() {
    let (h, started) = harness_with_slow_write(
        json!({"orbitPaths": [{"path": "/r1", "enabled": true}]}),
        "projectOrder",
    );
    h.backend.set_root("/r1", &["/p/a", "/p/b", "/p/c"]);

    let load = tokio::spawn({
        let service = h.service.clone();
        async move { service.load().await }
    });
    wait_for(started).await;

    let reordered = h
        .service
        .reorder_projects(strings(&["/p/c", "/p/a", "/p/b"]))
        .await
        .expect("reorder");
    load.await.expect("join load");

    let expected = strings(&["/p/c", "/p/a", "/p/b"]);
    assert_eq!(reordered.project_order, expected);
    assert_eq!(h.service.snapshot().project_order, expected);
    assert_eq!(h.store.get("projectOrder").expect("get"), Some(json!(expected)));
}

#[tokio::test]
async fn concurrent_root_additions_should_both_reach_disk() {
    let (h, started) = harness_with_slow_write(json!({}), "orbitPaths");
    h.backend.set_root("/r1", &["/p/a"]);
    h.backend.set_root("/r2", &["/p/b"]);

    let first = tokio::spawn({
        let service = h.service.clone();
        async move { service.add_roots(strings(&["/r1"])).await }
    });
    wait_for(started).await;

    let second = h
        .service
        .add_roots(strings(&["/r2"]))
        .await
        .expect("add /r2");
    first.await.expect("join first").expect("add /r1");

    assert_eq!(second.roots.len(), 2);
    assert_eq!(
        h.store.get("orbitPaths").expect("get"),
        Some(json!([
            {"path": "/r1", "enabled": true},
            {"path": "/r2", "enabled": true},
        ]))
    );
    assert_eq!(displayed(&h.service.snapshot()), vec!["/p/a", "/p/b"]);
}

#[tokio::test]
async fn mutation_after_settings_load_should_keep_persisted_roots() {
    let h = harness(json!({"orbitPaths": [{"path": "/r0", "enabled": true}]}));
    h.backend.set_root("/r0", &["/p/a"]);
    h.backend.set_root("/r1", &["/p/b"]);

    h.service.load_settings().await;
    h.service.add_roots(strings(&["/r1"])).await.expect("add roots");
    let snapshot = h.service.startup_scan().await;

    assert_eq!(displayed(&snapshot), vec!["/p/a", "/p/b"]);
    assert_eq!(
        h.store.get("orbitPaths").expect("get"),
        Some(json!([
            {"path": "/r0", "enabled": true},
            {"path": "/r1", "enabled": true},
        ]))
    );
    assert_eq!(h.host.reasons(), vec!["roots_added", "startup"]);
}
