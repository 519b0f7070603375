use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// SFZ files are often written on Windows; paths always use `/` here.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// `default_path=` is relative to the base directory of the top-level file.
pub fn resolve_default_path(base_dir: &Path, declared: &str) -> PathBuf {
    base_dir.join(normalize_path(declared.trim()))
}

/// Joins a region's `sample=` path onto the current `default_path`, unless it
/// is already absolute.
pub fn resolve_sample_path(default_path: &Path, declared: &str) -> PathBuf {
    let sample = normalize_path(declared);
    let path = Path::new(&sample);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        default_path.join(path)
    }
}

/// Resolves an include target against the base directory of the top-level
/// file, never against the including file's own directory.
pub fn resolve_include(base_dir: &Path, declared: &str, from: &Path) -> Result<PathBuf> {
    let path = base_dir.join(normalize_path(declared));
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::IncludeNotFound {
            path,
            from: from.to_path_buf(),
        })
    }
}

/// The quoted part of `#include "drums/kick.sfz"`.
pub fn include_target(line: &str) -> Option<&str> {
    let mut parts = line.split('"');
    parts.next()?;
    let target = parts.next()?;
    // A lone opening quote is not a path.
    parts.next()?;
    Some(target)
}

/// Renders a path with `/` separators, the way DrumGizmo expects them.
pub fn display_path(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let joined = parts.join("/");
    // The root component renders as "/" and would otherwise double up.
    if joined.starts_with("//") {
        joined[1..].to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_sample_path() {
        let default_path = Path::new("kits/rock");
        assert_eq!(
            resolve_sample_path(default_path, "kick/kick_01.wav"),
            PathBuf::from("kits/rock/kick/kick_01.wav")
        );
        assert_eq!(
            resolve_sample_path(default_path, "kick\\kick_01.wav"),
            PathBuf::from("kits/rock/kick/kick_01.wav")
        );
        #[cfg(not(windows))]
        assert_eq!(
            resolve_sample_path(default_path, "/abs/kick.wav"),
            PathBuf::from("/abs/kick.wav")
        );
    }

    #[test]
    fn test_resolve_default_path() {
        let base = Path::new("/music/sfz");
        assert_eq!(
            resolve_default_path(base, " samples "),
            PathBuf::from("/music/sfz/samples")
        );
        #[cfg(not(windows))]
        assert_eq!(
            resolve_default_path(base, "/other/samples"),
            PathBuf::from("/other/samples")
        );
    }

    #[test]
    fn test_include_target() {
        assert_eq!(include_target("#include \"drums/kick.sfz\""), Some("drums/kick.sfz"));
        assert_eq!(include_target("#include drums/kick.sfz"), None);
        assert_eq!(include_target("#include \"drums/kick.sfz"), None);
    }

    #[test]
    fn test_resolve_include() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("kick.sfz"), "").unwrap();
        let from = dir.path().join("kit.sfz");
        assert_eq!(
            resolve_include(dir.path(), "kick.sfz", &from).unwrap(),
            dir.path().join("kick.sfz")
        );
        match resolve_include(dir.path(), "snare.sfz", &from) {
            Err(Error::IncludeNotFound { path, .. }) => {
                assert_eq!(path, dir.path().join("snare.sfz"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    #[cfg(not(windows))]
    fn test_display_path() {
        assert_eq!(display_path(Path::new("/kits/rock/kick.wav")), "/kits/rock/kick.wav");
        assert_eq!(display_path(Path::new("kits/./rock/kick.wav")), "kits/rock/kick.wav");
    }
}
