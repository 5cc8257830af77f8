use std::{
    fs,
    process::{Command, Output},
};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

fn library(chapters: &[&str]) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    for chapter in chapters {
        fs::create_dir(root.join(chapter)).unwrap();
        fs::write(root.join(chapter).join("1.jpg"), chapter.as_bytes()).unwrap();
    }
    (dir, root)
}

fn cbz_volume(root: &Utf8Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cbz-volume"))
        .args(args)
        .current_dir(root)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn missing_chapter_exits_with_an_error() {
    let (_guard, root) = library(&["Chapter 1", "Chapter 3"]);

    let output = cbz_volume(&root, &["1", "3", "Volume"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("chapter 2 not found"), "stderr: {stderr}");
    assert!(!root.join("Volume.cbz").exists());
}

#[test]
fn invalid_arguments_exit_with_an_error() {
    let (_guard, root) = library(&["Chapter 1"]);

    let output = cbz_volume(&root, &["cover.png", "+1", "1"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid arguments"), "stderr: {stderr}");
}

#[test]
fn successful_run_reports_the_volume() {
    let (_guard, root) = library(&["Chapter 1", "Chapter 2"]);

    let output = cbz_volume(&root, &["1", "2", "Volume"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CBZ file created"), "stdout: {stdout}");
    assert!(root.join("Volume.cbz").is_file());
}
