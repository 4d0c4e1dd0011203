use super::*;
use std::fs;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("orbit-{prefix}-{}-{now}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn touch(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
    sleep(Duration::from_millis(20));
}

#[test]
fn should_return_newest_file_with_forward_slashes() {
    let dir = unique_temp_dir("latest-newest");
    touch(&dir.join("README.md"), "old");
    touch(&dir.join("src").join("main.rs"), "new");

    let latest = find_latest_file(&dir, &ScanOptions::default());

    assert_eq!(latest.as_deref(), Some("src/main.rs"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_skip_ignored_and_hidden_directories() {
    let dir = unique_temp_dir("latest-ignored");
    touch(&dir.join("index.ts"), "entry");
    touch(&dir.join("node_modules").join("pkg").join("index.js"), "dep");
    touch(&dir.join(".cache").join("blob"), "cache");
    touch(&dir.join("Target").join("out.o"), "obj");

    let latest = find_latest_file(&dir, &ScanOptions::default());

    assert_eq!(latest.as_deref(), Some("index.ts"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_respect_max_depth() {
    let dir = unique_temp_dir("latest-depth");
    touch(&dir.join("top.txt"), "top");
    touch(&dir.join("a").join("b").join("deep.txt"), "deep");

    let options = ScanOptions {
        max_depth: 1,
        ..ScanOptions::default()
    };

    assert_eq!(find_latest_file(&dir, &options).as_deref(), Some("top.txt"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_return_none_for_empty_directory() {
    let dir = unique_temp_dir("latest-empty");
    fs::create_dir_all(dir.join("empty-child")).expect("create child");

    assert_eq!(find_latest_file(&dir, &ScanOptions::default()), None);

    let _ = fs::remove_dir_all(dir);
}
