use std::{path::PathBuf, process::Command};

fn colony() -> Command {
    Command::new(env!("CARGO_BIN_EXE_colony"))
}

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("colony-{}-{name}", std::process::id()))
}

#[test]
fn json_report_is_printed_after_the_run() {
    let output = colony()
        .args(["--ticks", "60", "--seed", "3", "--json"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch colony binary");

    assert!(output.status.success(), "colony exited with {:?}", output.status);
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout holds a JSON report");
    assert_eq!(report["tick"], 60);
    assert!(report["cells"]["base"].is_number());
    assert!(report["events"]["births"].is_number());
}

#[test]
fn identical_seeds_print_identical_reports() {
    let run = || {
        colony()
            .args(["--ticks", "80", "--seed", "9", "--json"])
            .env("RUST_LOG", "off")
            .output()
            .expect("failed to launch colony binary")
            .stdout
    };

    assert_eq!(run(), run());
}

#[test]
fn export_writes_one_frame_per_interval() {
    let path = scratch_file("scenes.json");
    let status = colony()
        .args(["--ticks", "40", "--export-every", "10", "--export"])
        .arg(&path)
        .env("RUST_LOG", "off")
        .status()
        .expect("failed to launch colony binary");
    assert!(status.success());

    let contents = std::fs::read(&path).expect("export file written");
    let _ = std::fs::remove_file(&path);
    let export: serde_json::Value = serde_json::from_slice(&contents).expect("export is JSON");
    let frames = export["frames"].as_array().expect("frames array");
    assert_eq!(frames.len(), 5, "initial frame plus one every ten ticks");
    assert_eq!(frames[4]["tick"], 40);
    assert_eq!(export["seed"], 42);
}

#[test]
fn broken_config_fails_with_context() {
    let path = scratch_file("broken.toml");
    std::fs::write(&path, "[cell]\nmax_bonds = 0\n").expect("write config");

    let output = colony()
        .arg("--config")
        .arg(&path)
        .output()
        .expect("failed to launch colony binary");
    let _ = std::fs::remove_file(&path);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid parameters"), "stderr was: {stderr}");
}
