//! Executable lookup on the process search path.

use std::{
    env,
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// Resolves `name` the way a shell would.
///
/// Names containing a path separator are checked as given; bare names are
/// searched in each `PATH` entry in order.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    find_executable_in(name, env::var_os("PATH").as_deref())
}

pub fn find_executable_in(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    env::split_paths(search_path?)
        // An empty entry means the current directory.
        .map(|dir| if dir.as_os_str().is_empty() { PathBuf::from(".") } else { dir })
        .flat_map(|dir| candidates(&dir, name))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let exts = env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    std::iter::once(dir.join(name))
        .chain(
            exts.split(';')
                .filter(|e| !e.is_empty())
                .map(|ext| dir.join(format!("{name}{ext}"))),
        )
        .collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(windows)]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use std::{fs, os::unix::fs::PermissionsExt};

    use tempfile::tempdir;

    use super::*;

    fn write_script(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_finds_first_match_in_order() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        write_script(second.path(), "micro-stub", 0o755);
        let expected = write_script(first.path(), "micro-stub", 0o755);

        let search = env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(
            find_executable_in("micro-stub", Some(&search)),
            Some(expected)
        );
    }

    #[test]
    fn test_skips_non_executable_files_and_directories() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "plain", 0o644);
        fs::create_dir(dir.path().join("folder")).unwrap();

        let search = env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_executable_in("plain", Some(&search)), None);
        assert_eq!(find_executable_in("folder", Some(&search)), None);
        assert_eq!(find_executable_in("does-not-exist-xyz", Some(&search)), None);
        assert_eq!(find_executable_in("", Some(&search)), None);
    }

    #[test]
    fn test_path_names_bypass_search() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "direct", 0o755);
        assert_eq!(
            find_executable_in(script.to_str().unwrap(), None),
            Some(script.clone())
        );
        assert_eq!(find_executable_in("direct", None), None);
    }
}
