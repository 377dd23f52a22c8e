//! Classification of a cartridge's `Source-Url`.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::error::{Error, Result};

/// Archive formats accepted over HTTP(S).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
}

impl ArchiveFormat {
    /// File name suffix used for the temporary download.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
            Self::Tar => ".tar",
        }
    }

    fn from_path(path: &str) -> Option<Self> {
        let path = path.to_ascii_lowercase();
        if path.ends_with(".zip") {
            Some(Self::Zip)
        } else if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if path.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::Tar => "tar",
        })
    }
}

/// How a remote cartridge is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Cloned with git. Kept as the original string so scp-style remotes pass through.
    Git(String),
    /// Downloaded over HTTP(S) and extracted.
    Archive { url: Url, format: ArchiveFormat },
    /// Copied from a local directory named by a `file://` URL.
    File(PathBuf),
}

/// Decide how to fetch `raw`.
///
/// Git wins first: a `git` scheme or a path ending in `.git`. HTTP(S) URLs
/// must name a `.zip`, `.tar.gz`/`.tgz`, or `.tar` file. Anything else is
/// [`Error::UnsupportedSource`].
pub fn classify(raw: &str) -> Result<SourceKind> {
    let trimmed = raw.trim();
    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        // scp-style remotes such as `git@host:org/repo.git` are not URLs.
        Err(_) if trimmed.ends_with(".git") => return Ok(SourceKind::Git(trimmed.to_string())),
        Err(e) => return Err(Error::unsupported(raw, format!("not a valid URL ({e})"))),
    };

    if url.scheme() == "git" || url.path().ends_with(".git") {
        return Ok(SourceKind::Git(trimmed.to_string()));
    }

    match url.scheme() {
        "http" | "https" => match ArchiveFormat::from_path(url.path()) {
            Some(format) => Ok(SourceKind::Archive { url, format }),
            None => Err(Error::unsupported(
                raw,
                "expected a .zip, .tar.gz, .tgz or .tar archive",
            )),
        },
        "file" => url
            .to_file_path()
            .map(SourceKind::File)
            .map_err(|_| Error::unsupported(raw, "file URL does not name a local path")),
        other => Err(Error::unsupported(raw, format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("git://github.com/openshift/php.git")]
    #[case("git://example.com/cartridges/php")]
    #[case("https://github.com/openshift/php.git")]
    #[case("ssh://git@example.com/php.git")]
    #[case("git@github.com:openshift/php.git")]
    fn test_git_sources(#[case] raw: &str) {
        assert_eq!(classify(raw).unwrap(), SourceKind::Git(raw.to_string()));
    }

    #[rstest]
    #[case("https://example.com/php.zip", ArchiveFormat::Zip)]
    #[case("http://example.com/dl/php-1.0.tar.gz", ArchiveFormat::TarGz)]
    #[case("https://example.com/php.tgz", ArchiveFormat::TarGz)]
    #[case("https://example.com/php.TAR", ArchiveFormat::Tar)]
    #[case("https://example.com/php.zip?token=abc", ArchiveFormat::Zip)]
    fn test_archive_sources(#[case] raw: &str, #[case] expected: ArchiveFormat) {
        match classify(raw).unwrap() {
            SourceKind::Archive { format, .. } => assert_eq!(format, expected),
            other => panic!("expected archive, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_file_source() {
        assert_eq!(
            classify("file:///srv/cartridges/php").unwrap(),
            SourceKind::File(PathBuf::from("/srv/cartridges/php"))
        );
    }

    #[rstest]
    #[case("https://example.com/php.rpm")]
    #[case("ftp://example.com/php.zip")]
    #[case("svn://example.com/php")]
    #[case("not a url")]
    #[case("")]
    fn test_unsupported_sources(#[case] raw: &str) {
        assert!(matches!(
            classify(raw).unwrap_err(),
            Error::UnsupportedSource { .. }
        ));
    }
}
