//! Archive extraction and post-extraction normalization.

use std::fs;
use std::path::Path;

use cartridge_fs::tree;
use uuid::Uuid;

use crate::error::Result;
use crate::process::{CommandRunner, CommandSpec};
use crate::source::ArchiveFormat;

/// Build the command that unpacks `archive` into `target`, keeping permissions.
pub fn extract_command(archive: &Path, format: ArchiveFormat, target: &Path) -> CommandSpec {
    match format {
        ArchiveFormat::Zip => CommandSpec::new("unzip").arg("-d").arg(target).arg(archive),
        ArchiveFormat::TarGz => CommandSpec::new("tar")
            .arg("-C")
            .arg(target)
            .arg("-zxpf")
            .arg(archive),
        ArchiveFormat::Tar => CommandSpec::new("tar")
            .arg("-C")
            .arg(target)
            .arg("-xpf")
            .arg(archive),
    }
}

pub fn extract(
    runner: &dyn CommandRunner,
    archive: &Path,
    format: ArchiveFormat,
    target: &Path,
) -> Result<()> {
    tracing::debug!(archive = ?archive, target = ?target, %format, "Extracting archive");
    runner.run(&extract_command(archive, format, target))?;
    Ok(())
}

/// Collapse a lone wrapping directory into `target`.
///
/// When `target` holds exactly one entry and it is a directory, its contents
/// are moved up one level and the emptied wrapper is removed. Returns whether
/// anything was hoisted.
pub fn hoist_single_directory(target: &Path) -> Result<bool> {
    let entries = tree::list_entries(target)?;
    let [wrapper] = entries.as_slice() else {
        return Ok(false);
    };
    let is_dir = fs::symlink_metadata(wrapper)
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Ok(false);
    }

    // Renamed aside first so an inner entry with the wrapper's own name can move up.
    let aside = target.join(format!(".unwrap-{}", Uuid::new_v4().simple()));
    fs::rename(wrapper, &aside).map_err(|e| cartridge_fs::Error::io(wrapper, e))?;
    tree::move_contents(&aside, target)?;
    fs::remove_dir(&aside).map_err(|e| cartridge_fs::Error::io(&aside, e))?;

    tracing::debug!(target = ?target, wrapper = ?wrapper, "Hoisted wrapping directory");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(ArchiveFormat::Zip, "unzip", &["-d", "/gear/php", "/tmp/php.zip"])]
    #[case(ArchiveFormat::TarGz, "tar", &["-C", "/gear/php", "-zxpf", "/tmp/php.zip"])]
    #[case(ArchiveFormat::Tar, "tar", &["-C", "/gear/php", "-xpf", "/tmp/php.zip"])]
    fn test_extract_commands(
        #[case] format: ArchiveFormat,
        #[case] program: &str,
        #[case] args: &[&str],
    ) {
        let spec = extract_command(Path::new("/tmp/php.zip"), format, Path::new("/gear/php"));
        assert_eq!(spec.program_name(), program);
        assert_eq!(spec.arg_strings(), args);
    }

    #[test]
    fn hoists_lone_directory() {
        let dir = tempfile::tempdir().unwrap();
        let wrapper = dir.path().join("php-1.0");
        fs::create_dir_all(wrapper.join("bin")).unwrap();
        fs::create_dir_all(wrapper.join("metadata")).unwrap();
        fs::write(wrapper.join("bin/control"), "x").unwrap();

        assert!(hoist_single_directory(dir.path()).unwrap());

        let names: Vec<String> = tree::list_entries(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["bin", "metadata"]);
        assert!(dir.path().join("bin/control").is_file());
    }

    #[test]
    fn hoists_wrapper_containing_its_own_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("php/php")).unwrap();
        fs::write(dir.path().join("php/php/inner.txt"), "x").unwrap();

        assert!(hoist_single_directory(dir.path()).unwrap());
        assert!(dir.path().join("php/inner.txt").is_file());
    }

    #[test]
    fn leaves_multiple_entries_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::create_dir_all(dir.path().join("metadata")).unwrap();

        assert!(!hoist_single_directory(dir.path()).unwrap());
        assert!(dir.path().join("bin").is_dir());
    }

    #[test]
    fn leaves_lone_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README"), "x").unwrap();

        assert!(!hoist_single_directory(dir.path()).unwrap());
        assert!(dir.path().join("README").is_file());
    }
}
