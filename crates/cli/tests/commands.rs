use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn rrepl_binary() -> PathBuf {
	let mut path = std::env::current_exe().expect("current_exe should resolve");
	path.pop();
	path.pop();
	path.push("rrepl");
	path
}

/// Runs the binary with an empty configuration file so the user's own
/// configuration never leaks in.
fn run_rrepl(workdir: &Path, args: &[&str]) -> (bool, String, String) {
	let config = workdir.join("config.json");
	if !config.exists() {
		std::fs::write(&config, "{}").expect("config should be written");
	}
	let output = Command::new(rrepl_binary())
		.current_dir(workdir)
		.arg("--config")
		.arg(&config)
		.args(args)
		.env_remove("RUST_LOG")
		.output()
		.expect("failed to execute rrepl");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.success(), stdout, stderr)
}

#[test]
fn eval_prints_the_session_transcript() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let (success, stdout, stderr) = run_rrepl(tmp.path(), &["eval", "x = 2", "x * 21"]);
	assert!(success, "eval failed: {stderr}");
	assert!(stdout.starts_with("Current input mode is: syntax\n"), "{stdout}");
	assert!(stdout.contains("repl> 2\nrepl> 42\nrepl> "), "{stdout}");
}

#[test]
fn eval_in_multiline_mode_waits_for_the_sentinel() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let (success, stdout, stderr) = run_rrepl(
		tmp.path(),
		&["eval", "--mode", "multiline", "--sentinel", "END", "a = 1", "a + 1", "END"],
	);
	assert!(success, "eval failed: {stderr}");
	assert!(stdout.ends_with("repl> 2\nrepl> \n"), "{stdout}");
}

#[test]
fn eval_runs_the_initialization_script() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let script = tmp.path().join("init.rr");
	std::fs::write(&script, "greeting = 'hello'\nprint('init done')").expect("script should be written");
	let script = script.to_string_lossy().to_string();

	let (success, stdout, stderr) = run_rrepl(tmp.path(), &["eval", "--init-url", &script, "greeting"]);
	assert!(success, "eval failed: {stderr}");
	assert!(stdout.starts_with(&format!("Loading {script}...\ninit done\n")), "{stdout}");
	assert!(stdout.contains("repl> hello\n"), "{stdout}");
}

#[test]
fn config_reports_merged_settings() {
	let tmp = TempDir::new().expect("temp dir should be created");
	std::fs::write(tmp.path().join("config.json"), r#"{"port": 5001, "baseName": "shell"}"#)
		.expect("config should be written");

	let (success, stdout, stderr) = run_rrepl(tmp.path(), &["config", "--allow-remote"]);
	assert!(success, "config failed: {stderr}");
	let json: serde_json::Value = serde_json::from_str(&stdout).expect("config output should be JSON");
	assert_eq!(json["port"], 5001);
	assert_eq!(json["baseName"], "shell");
	assert_eq!(json["loopbackOnly"], false);
	assert_eq!(json["host"], "127.0.0.1");
}

#[test]
fn malformed_config_fails() {
	let tmp = TempDir::new().expect("temp dir should be created");
	std::fs::write(tmp.path().join("config.json"), "port = 1").expect("config should be written");

	let (success, _stdout, stderr) = run_rrepl(tmp.path(), &["config"]);
	assert!(!success);
	assert!(stderr.contains("failed to load configuration"), "{stderr}");
}
