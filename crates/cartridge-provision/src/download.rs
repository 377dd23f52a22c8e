//! Archive download through the `curl` client.

use std::path::Path;

use cartridge_fs::checksum;
use tempfile::NamedTempFile;
use url::Url;

use crate::config::DownloadLimits;
use crate::error::{Error, Result};
use crate::process::{CommandRunner, CommandSpec};
use crate::source::ArchiveFormat;

/// curl's exit code when `--max-time` elapses.
const CURL_OPERATION_TIMEDOUT: i32 = 28;

/// Build the curl invocation that writes `url` to `output` within `limits`.
pub fn curl_command(url: &Url, output: &Path, limits: &DownloadLimits) -> CommandSpec {
    CommandSpec::new("curl")
        .arg("--max-time")
        .arg(limits.max_time_secs.to_string())
        .arg("--limit-rate")
        .arg(&limits.rate_limit)
        .arg("--connect-timeout")
        .arg(limits.connect_timeout_secs.to_string())
        .arg("--location")
        .arg("--max-redirs")
        .arg(limits.max_redirects.to_string())
        .arg("--max-filesize")
        .arg(&limits.max_file_size)
        .arg("--insecure")
        .arg("--fail")
        .arg("--silent")
        .arg("--show-error")
        .arg("--output")
        .arg(output)
        .arg(url.as_str())
        .timeout(limits.hard_deadline())
}

/// Download `url` into a fresh temporary file.
///
/// The file name starts with `prefix` so concurrent downloads of different
/// cartridges are told apart, and ends with the archive's extension. The
/// file is deleted when the returned handle is dropped.
pub fn download(
    runner: &dyn CommandRunner,
    limits: &DownloadLimits,
    url: &Url,
    prefix: &str,
    format: ArchiveFormat,
) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix(&format!("{prefix}-"))
        .suffix(format.extension())
        .tempfile()
        .map_err(|e| cartridge_fs::Error::io(std::env::temp_dir(), e))?;

    let spec = curl_command(url, file.path(), limits);
    tracing::debug!(url = %url, path = ?file.path(), "Downloading cartridge archive");
    match runner.run(&spec) {
        Ok(_) => Ok(file),
        Err(Error::ProcessFailure {
            exit_code: Some(CURL_OPERATION_TIMEDOUT),
            command,
            ..
        }) => Err(Error::Timeout {
            command,
            limit: limits.max_time(),
        }),
        Err(e) => Err(e),
    }
}

/// Fail with [`Error::Integrity`] unless `path` hashes to `expected`.
pub fn verify_checksum(path: &Path, expected: &str, url: &str) -> Result<()> {
    let actual = checksum::compute_file_checksum(path)?;
    if !checksum::matches(expected, &actual) {
        return Err(Error::Integrity {
            url: url.to_string(),
            expected: checksum::normalize(expected),
            actual,
        });
    }
    tracing::debug!(url, checksum = %actual, "Checksum verified");
    Ok(())
}
