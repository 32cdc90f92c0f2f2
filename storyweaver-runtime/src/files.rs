use std::fs;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context;
use tempfile::NamedTempFile;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create dir: {}", path.display()))
}

/// Fills a temp file next to `dst`, then moves it over `dst`. Readers see the
/// old content or the new, never a partial file. The temp file is removed if
/// anything fails.
fn replace_with(
    dst: &Path,
    fill: impl FnOnce(&mut fs::File) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    let parent = match dst.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    fill(tmp.as_file_mut()).with_context(|| format!("failed to write: {}", dst.display()))?;
    tmp.as_file().sync_all().ok();

    tmp.persist(dst)
        .map_err(|e| anyhow::Error::new(e.error).context(format!("failed to replace: {}", dst.display())))?;
    Ok(())
}

/// Used for the story library and the config file.
pub fn write_atomic(dst: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    replace_with(dst, |f| f.write_all(bytes))
}

/// Exports a media file. Streams, so a large video never sits in RAM.
pub fn atomic_copy(src: &Path, dst: &Path) -> anyhow::Result<()> {
    let mut r = fs::File::open(src).with_context(|| format!("failed to open: {}", src.display()))?;
    replace_with(dst, |w| std::io::copy(&mut r, w).map(|_| ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn write_atomic_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let path = nested.join("list.json");

        write_atomic(&path, b"[1]").unwrap();
        write_atomic(&path, b"[1,2]").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"[1,2]");
        assert_eq!(entries(&nested), vec!["list.json"]);
    }

    #[test]
    fn atomic_copy_duplicates_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.mp4");
        let dst = dir.path().join("out").join("b.mp4");
        fs::write(&src, b"video").unwrap();

        atomic_copy(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"video");
    }

    #[test]
    fn failed_copy_keeps_the_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("film.mp4");
        fs::write(&dst, b"old cut").unwrap();

        assert!(atomic_copy(&dir.path().join("missing.mp4"), &dst).is_err());
        assert_eq!(fs::read(&dst).unwrap(), b"old cut");
        assert_eq!(entries(dir.path()), vec!["film.mp4"]);
    }
}
