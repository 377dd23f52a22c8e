//! Ordering for software versions and package revisions.
//!
//! Cartridge versions are loosely formatted (`5.3`, `1.0.1`, `2.4-beta`), so
//! they are compared segment by segment rather than requiring strict semver:
//!
//! - When both strings are valid semver, semver ordering applies.
//! - Otherwise each `.`-separated segment is compared numerically when both
//!   sides are numeric, and as text otherwise; a numeric segment orders before
//!   a non-numeric one.
//! - A version that is a strict prefix of another orders first (`5.3 < 5.3.1`).
//! - Remaining ties are broken on the raw string so the ordering is total.
//!
//! ```
//! use cartridge_manifest::version::compare_versions;
//! use std::cmp::Ordering;
//!
//! assert_eq!(compare_versions("5.10", "5.9"), Ordering::Greater);
//! assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
//! ```

use std::cmp::Ordering;
use std::fmt;

/// Compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    let primary = match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => compare_segments(a, b),
    };
    primary.then_with(|| a.cmp(b))
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// A version string ordered by [`compare_versions`], usable as a map key.
///
/// Surrounding whitespace is dropped on construction so equality, hashing and
/// ordering all see the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionKey(String);

impl VersionKey {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.0, &other.0)
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Sort version strings ascending.
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(a, b));
}
