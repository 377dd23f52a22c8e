//! Error types for cartridge-provision

use std::path::PathBuf;
use std::time::Duration;

/// Result type for instantiation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while materializing a cartridge
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid instantiation target {path}: {reason}")]
    InvalidArgument { path: PathBuf, reason: String },

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported cartridge source '{url}': {reason}")]
    UnsupportedSource { url: String, reason: String },

    #[error("Command `{command}` failed{}: {stderr}", exit_suffix(.exit_code))]
    ProcessFailure {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Command `{command}` exceeded its time limit of {}s", .limit.as_secs())]
    Timeout { command: String, limit: Duration },

    #[error(
        "Malformed cartridge {name}-{software_version}-{revision}: {}",
        .violations.join("; ")
    )]
    MalformedPackage {
        name: String,
        software_version: String,
        revision: String,
        violations: Vec<String>,
    },

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Filesystem error: {0}")]
    Fs(#[from] cartridge_fs::Error),
}

impl Error {
    pub fn invalid_argument(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(url: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedSource {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => " (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_package_lists_every_violation() {
        let err = Error::MalformedPackage {
            name: "php".into(),
            software_version: "5.4".into(),
            revision: "1.0".into(),
            violations: vec!["bin directory is missing".into(), "bin/control is missing".into()],
        };
        assert_eq!(
            err.to_string(),
            "Malformed cartridge php-5.4-1.0: bin directory is missing; bin/control is missing"
        );
    }

    #[test]
    fn process_failure_reports_exit_code() {
        let err = Error::ProcessFailure {
            command: "tar -C /t -xpf /tmp/a.tar".into(),
            exit_code: Some(2),
            stderr: "not a tar archive".into(),
        };
        assert_eq!(
            err.to_string(),
            "Command `tar -C /t -xpf /tmp/a.tar` failed with exit code 2: not a tar archive"
        );
    }
}
