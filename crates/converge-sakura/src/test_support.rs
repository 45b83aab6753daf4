use std::os::unix::fs::PermissionsExt;

/// Write an executable stand-in for usacloud into `dir` and return its path.
pub fn script(dir: &tempfile::TempDir, body: &str) -> String {
    let path = dir.path().join("usacloud");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().to_string()
}
