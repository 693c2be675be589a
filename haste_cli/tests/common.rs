use std::path::Path;

use assert_cmd::Command;

pub fn haste_cmd() -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_haste"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("HASTE_LOG");
	cmd
}

#[allow(dead_code)]
pub fn write_file(root: &Path, path: &str, content: &str) -> std::io::Result<()> {
	let full_path = root.join(path);
	if let Some(parent) = full_path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(full_path, content)
}
