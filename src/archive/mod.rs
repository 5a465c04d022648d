//! Package archive codec: directory ↔ gzip-compressed tar.
//!
//! An artifact is a `.tar.gz` stream whose entries are paths relative to the
//! package root. It is conventionally named `{name}-{version}.cpm`.
//!
//! # Determinism
//!
//! [`pack`] walks the source depth-first with the entries of each directory in
//! file-name order, and normalizes every entry's mtime (to `SOURCE_DATE_EPOCH`
//! when set, else a fixed epoch). Packing the same tree twice yields identical
//! bytes.
//!
//! # Extraction Safety
//!
//! [`unpack`] confines every entry to the destination directory. Absolute
//! paths and `..` components are rejected with
//! [`CpmError::UnsafeArchiveEntry`] before anything is written for that entry.
//! Only directories and regular files are extracted; links and special files
//! are skipped.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::core::CpmError;
use crate::manifest::artifact_file_name;
use crate::utils::fs::ensure_dir;

/// Entry mtime used when `SOURCE_DATE_EPOCH` is not set (2024-01-01T00:00:00Z).
pub const DEFAULT_MTIME: u64 = 1_704_067_200;

const DEFAULT_DIR_MODE: u32 = 0o755;
const DEFAULT_FILE_MODE: u32 = 0o644;

fn entry_mtime() -> u64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_MTIME)
}

#[cfg(unix)]
fn entry_mode(metadata: &std::fs::Metadata, _default: u32) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn entry_mode(_metadata: &std::fs::Metadata, default: u32) -> u32 {
    default
}

/// Pack `source_dir` into `output_dir/{name}-{version}.cpm`.
///
/// Returns the artifact path. When `output_dir` lies inside `source_dir`, the
/// artifact being written is left out of the archive.
///
/// # Errors
///
/// [`CpmError::Validation`] when `source_dir` is not a directory; I/O errors
/// for any read or write failure (a partial artifact may remain).
pub fn pack(source_dir: &Path, name: &str, version: &str, output_dir: &Path) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        return Err(CpmError::validation(format!(
            "{} is not a directory",
            source_dir.display()
        ))
        .into());
    }

    ensure_dir(output_dir)?;
    let artifact_name = artifact_file_name(name, version);
    let artifact_path = output_dir.join(&artifact_name);

    let file = File::create(&artifact_path)
        .with_context(|| format!("Failed to create artifact: {}", artifact_path.display()))?;
    // Resolved after creation so the walk can recognize it
    let artifact_canonical = artifact_path.canonicalize()?;

    let mtime = entry_mtime();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut count = 0usize;
    for entry in WalkDir::new(source_dir).min_depth(1).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", source_dir.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .with_context(|| format!("{} is outside the package root", entry.path().display()))?
            .to_path_buf();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(entry_mode(&metadata, DEFAULT_DIR_MODE));
            header.set_size(0);
            header.set_mtime(mtime);
            header.set_cksum();
            builder.append_data(&mut header, &relative, std::io::empty())?;
        } else if metadata.is_file() {
            if entry.file_name() == artifact_name.as_str()
                && entry.path().canonicalize().ok().as_deref() == Some(artifact_canonical.as_path())
            {
                tracing::debug!("Skipping the artifact being written: {}", relative.display());
                continue;
            }

            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(entry_mode(&metadata, DEFAULT_FILE_MODE));
            header.set_size(metadata.len());
            header.set_mtime(mtime);
            header.set_cksum();
            let data = File::open(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            builder.append_data(&mut header, &relative, data)?;
        } else {
            tracing::debug!("Skipping special file {}", relative.display());
            continue;
        }
        count += 1;
    }

    let encoder = builder.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()?;

    tracing::debug!("Packed {} entries into {}", count, artifact_path.display());
    Ok(artifact_path)
}

/// Extract `artifact` into `dest_dir`.
///
/// # Errors
///
/// - [`CpmError::UnsafeArchiveEntry`] for an entry that would escape `dest_dir`
/// - I/O errors for truncated or corrupt streams
pub fn unpack(artifact: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(artifact)
        .with_context(|| format!("Failed to open artifact: {}", artifact.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    ensure_dir(dest_dir)?;

    for entry in archive.entries()? {
        let mut entry = entry.with_context(|| format!("Corrupt archive: {}", artifact.display()))?;
        let raw_path = entry.path()?.into_owned();
        let relative = confined_path(&raw_path)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dest_dir.join(&relative);

        match entry.header().entry_type() {
            tar::EntryType::Directory => {
                ensure_dir(&target)?;
            }
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    ensure_dir(parent)?;
                }
                entry
                    .unpack(&target)
                    .with_context(|| format!("Failed to extract {}", relative.display()))?;
            }
            other => {
                tracing::debug!("Skipping {:?} entry {}", other, raw_path.display());
            }
        }
    }

    Ok(())
}

/// Strip `.` components and reject anything that could leave the root.
fn confined_path(raw: &Path) -> Result<PathBuf, CpmError> {
    let mut clean = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CpmError::UnsafeArchiveEntry {
                    path: raw.display().to_string(),
                });
            }
        }
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("templates/nested")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("colony.yaml"), "name: demo\nversion: 0.1.0\n").unwrap();
        fs::write(root.join("values.yaml"), "environment: dev\n").unwrap();
        fs::write(root.join("templates/w.json"), r#"{"env": "{{ Values.environment }}"}"#).unwrap();
        fs::write(root.join("templates/nested/x.tpl"), [0u8, 159, 146, 150]).unwrap();
        temp
    }

    fn snapshot(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().to_string();
                let content = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
                (rel, content)
            })
            .collect()
    }

    /// Build an archive whose entry name bypasses the builder's path checks.
    fn malicious_archive(dir: &Path, entry_name: &str) -> PathBuf {
        let path = dir.join("evil.cpm");
        let encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let data = b"pwned";
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..entry_name.len()].copy_from_slice(entry_name.as_bytes());
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, &data[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn test_round_trip() {
        let source = sample_tree();
        let out = TempDir::new().unwrap();
        let artifact = pack(source.path(), "demo", "0.1.0", out.path()).unwrap();
        assert_eq!(artifact, out.path().join("demo-0.1.0.cpm"));

        let dest = TempDir::new().unwrap();
        unpack(&artifact, dest.path()).unwrap();

        assert_eq!(snapshot(source.path()), snapshot(dest.path()));
    }

    #[test]
    fn test_pack_is_deterministic() {
        let source = sample_tree();
        let out_a = TempDir::new().unwrap();
        let out_b = TempDir::new().unwrap();
        let a = pack(source.path(), "demo", "0.1.0", out_a.path()).unwrap();
        let b = pack(source.path(), "demo", "0.1.0", out_b.path()).unwrap();
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    #[test]
    fn test_pack_into_source_skips_artifact() {
        let source = sample_tree();
        let artifact = pack(source.path(), "demo", "0.1.0", source.path()).unwrap();

        let dest = TempDir::new().unwrap();
        unpack(&artifact, dest.path()).unwrap();
        assert!(!dest.path().join("demo-0.1.0.cpm").exists());
        assert!(dest.path().join("templates/w.json").exists());
    }

    #[test]
    fn test_pack_rejects_non_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, "x").unwrap();
        let err = pack(&file, "demo", "0.1.0", temp.path()).unwrap_err();
        assert!(matches!(CpmError::find_in(&err), Some(CpmError::Validation { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_modes_are_kept() {
        use std::os::unix::fs::PermissionsExt;

        let source = sample_tree();
        let script = source.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let out = TempDir::new().unwrap();
        let artifact = pack(source.path(), "demo", "0.1.0", out.path()).unwrap();
        let dest = TempDir::new().unwrap();
        unpack(&artifact, dest.path()).unwrap();

        let mode = fs::metadata(dest.path().join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_unpack_rejects_parent_traversal() {
        let temp = TempDir::new().unwrap();
        let artifact = malicious_archive(temp.path(), "../escape.txt");
        let dest = temp.path().join("dest");

        let err = unpack(&artifact, &dest).unwrap_err();
        assert!(matches!(CpmError::find_in(&err), Some(CpmError::UnsafeArchiveEntry { .. })));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_unpack_rejects_absolute_path() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("abs.txt");
        let artifact = malicious_archive(temp.path(), target.to_str().unwrap());

        let err = unpack(&artifact, &temp.path().join("dest")).unwrap_err();
        assert!(matches!(CpmError::find_in(&err), Some(CpmError::UnsafeArchiveEntry { .. })));
        assert!(!target.exists());
    }

    #[test]
    fn test_unpack_corrupt_stream() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("bad.cpm");
        fs::write(&artifact, b"definitely not gzip").unwrap();
        assert!(unpack(&artifact, &temp.path().join("dest")).is_err());
    }

    #[test]
    fn test_confined_path_ignores_cur_dir() {
        assert_eq!(confined_path(Path::new("./a/./b")).unwrap(), PathBuf::from("a/b"));
        assert!(confined_path(Path::new("a/../../b")).is_err());
    }
}
