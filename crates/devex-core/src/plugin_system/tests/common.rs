//! Helpers shared by plugin system tests: fake plugin binaries written as
//! shell scripts.

use std::path::{Path, PathBuf};

/// Write an executable fake plugin that answers `--plugin-info` and the
/// setup protocol.
pub fn write_plugin(dir: &Path, name: &str, version: &str) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "--plugin-info" ]; then
  printf '{{"name":"{name}","version":"{version}","description":"fake plugin"}}'
  exit 0
fi
cat > /dev/null
printf '{{"status":"success","progress":100,"message":"{name} handled $1"}}'
"#,
        name = name,
        version = version
    );
    write_script(dir, name, &script)
}

/// Write a fake plugin whose `--plugin-info` probe fails.
pub fn write_broken_plugin(dir: &Path, name: &str) -> PathBuf {
    write_script(dir, name, "#!/bin/sh\nexit 3\n")
}

/// Write a fake plugin that prints free-form text instead of JSON.
pub fn write_plain_text_plugin(dir: &Path, name: &str) -> PathBuf {
    let script = r#"#!/bin/sh
if [ "$1" = "--plugin-info" ]; then
  printf '{"name":"%s","version":"0.1.0"}' "plain"
  exit 0
fi
cat > /dev/null
echo "applied 3 changes"
"#;
    write_script(dir, name, script)
}

/// Write a fake plugin that fails its setup command with stderr output.
pub fn write_failing_plugin(dir: &Path, name: &str) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "--plugin-info" ]; then
  printf '{{"name":"{name}","version":"0.1.0"}}'
  exit 0
fi
cat > /dev/null
echo "could not reach package mirror" >&2
exit 1
"#,
        name = name
    );
    write_script(dir, name, &script)
}

fn write_script(dir: &Path, name: &str, contents: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(dir).expect("plugin dir");
    let path = dir.join(format!("devex-plugin-{}", name));
    std::fs::write(&path, contents).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}
