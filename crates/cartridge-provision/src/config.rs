//! Download limits and instantiation settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the instantiation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub download: DownloadLimits,
}

/// Limits applied to archive downloads.
///
/// `max_file_size` and `rate_limit` are passed verbatim to the download
/// client, so they use its size suffixes (`K`, `M`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadLimits {
    pub max_time_secs: u64,
    pub max_file_size: String,
    pub max_redirects: u32,
    pub rate_limit: String,
    pub connect_timeout_secs: u64,
    /// Wall-clock allowance beyond `max_time_secs` before the client is killed.
    pub kill_grace_secs: u64,
}

impl Default for DownloadLimits {
    fn default() -> Self {
        Self {
            max_time_secs: 10,
            max_file_size: "20480K".to_string(),
            max_redirects: 2,
            rate_limit: "100k".to_string(),
            connect_timeout_secs: 2,
            kill_grace_secs: 5,
        }
    }
}

impl DownloadLimits {
    pub fn max_time(&self) -> Duration {
        Duration::from_secs(self.max_time_secs)
    }

    /// How long the download process may run before it is killed.
    pub fn hard_deadline(&self) -> Duration {
        Duration::from_secs(self.max_time_secs + self.kill_grace_secs)
    }
}
