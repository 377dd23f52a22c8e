//! Directory tree operations used by install and instantiation.
//!
//! Copies preserve permission bits and recreate symbolic links rather than
//! following them. Removal helpers treat an already-absent path as success.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Error, Result};

/// Recursively copy `src` to `dst`.
///
/// Directories are recreated with the source's permissions, regular files are
/// copied with their mode, and symlinks are recreated pointing at the same
/// target.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(src).map_err(|e| Error::io(src, e))?;
    if metadata.is_dir() {
        return copy_walk(src, dst, 0, &[]);
    }
    copy_entry(src, dst, metadata.file_type())
}

/// Copy every entry of `src_dir` into the existing directory `dst_dir`,
/// skipping top-level entries whose file name appears in `exclude`.
pub fn copy_contents(src_dir: &Path, dst_dir: &Path, exclude: &[&str]) -> Result<()> {
    ensure_not_nested(src_dir, dst_dir)?;
    copy_walk(src_dir, dst_dir, 1, exclude)
}

fn copy_walk(src: &Path, dst: &Path, min_depth: usize, exclude: &[&str]) -> Result<()> {
    let walker = WalkDir::new(src)
        .min_depth(min_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() != 1 || !exclude.iter().any(|skip| entry.file_name() == *skip)
        });

    // Directory modes are applied deepest first once the walk is done, so a
    // read-only directory doesn't block its own population.
    let mut directories = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(src, e))?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = if relative.as_os_str().is_empty() {
            dst.to_path_buf()
        } else {
            dst.join(relative)
        };

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
            let permissions = entry
                .metadata()
                .map_err(|e| walk_error(src, e))?
                .permissions();
            directories.push((target, permissions));
        } else {
            copy_entry(entry.path(), &target, entry.file_type())?;
        }
    }

    for (dir, permissions) in directories.into_iter().rev() {
        fs::set_permissions(&dir, permissions).map_err(|e| Error::io(&dir, e))?;
    }
    Ok(())
}

/// Copy a single non-directory entry: a regular file with its mode, or a symlink.
fn copy_entry(src: &Path, dst: &Path, file_type: fs::FileType) -> Result<()> {
    if file_type.is_symlink() {
        let link_target = fs::read_link(src).map_err(|e| Error::io(src, e))?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&link_target, dst).map_err(|e| Error::io(dst, e))?;
        #[cfg(not(unix))]
        if link_target.is_file() {
            fs::copy(&link_target, dst).map_err(|e| Error::io(dst, e))?;
        }
        return Ok(());
    }
    fs::copy(src, dst).map_err(|e| Error::io(dst, e))?;
    Ok(())
}

fn walk_error(root: &Path, error: walkdir::Error) -> Error {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    Error::io(path, std::io::Error::from(error))
}

/// Move every entry of `from` into `to` by rename.
pub fn move_contents(from: &Path, to: &Path) -> Result<()> {
    for entry in fs::read_dir(from).map_err(|e| Error::io(from, e))? {
        let entry = entry.map_err(|e| Error::io(from, e))?;
        let dest = to.join(entry.file_name());
        fs::rename(entry.path(), &dest).map_err(|e| Error::io(&dest, e))?;
    }
    Ok(())
}

/// Remove a file, symlink, or directory tree. Absent paths are not an error.
pub fn remove_tree(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(path, e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Remove `dir` if it exists and has no entries. Returns whether it was removed.
pub fn remove_dir_if_empty(dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    if fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .next()
        .is_some()
    {
        return Ok(false);
    }
    fs::remove_dir(dir).map_err(|e| Error::io(dir, e))?;
    Ok(true)
}

/// List the entries of `dir`, sorted by file name.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        entries.push(entry.map_err(|e| Error::io(dir, e))?.path());
    }
    entries.sort();
    Ok(entries)
}

/// Whether `path` is a regular file with any execute bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Reject copying a directory into one of its own descendants.
fn ensure_not_nested(src: &Path, dst: &Path) -> Result<()> {
    let (Ok(src_real), Ok(dst_real)) = (src.canonicalize(), dst.canonicalize()) else {
        return Ok(());
    };
    if dst_real.starts_with(&src_real) {
        return Err(Error::RecursiveCopy {
            source_dir: src.to_path_buf(),
            destination: dst.to_path_buf(),
        });
    }
    Ok(())
}
