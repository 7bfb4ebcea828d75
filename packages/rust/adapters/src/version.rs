//! Numeric semantic versions and confirmed version ranges.
//!
//! Only `major.minor.patch` takes part in comparisons. A leading `v` is
//! accepted; pre-release and build suffixes are accepted and ignored.

use std::fmt;
use std::str::FromStr;

use livingdoc_shared::{CompatibilityWarning, WarningCode};

/// A `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Why a version string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("version is empty")]
    Empty,
    #[error("expected major.minor.patch, found {0} component(s)")]
    ComponentCount(usize),
    #[error("component '{0}' is not a non-negative integer")]
    NotNumeric(String),
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);
        // Build metadata first, then pre-release.
        let core = s.split('+').next().unwrap_or_default();
        let core = core.split('-').next().unwrap_or_default();

        if core.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionParseError::ComponentCount(parts.len()));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError::NotNumeric((*part).to_string()));
            }
            *slot = part
                .parse()
                .map_err(|_| VersionParseError::NotNumeric((*part).to_string()))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

/// Half-open range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Version,
    pub max: Version,
}

impl VersionRange {
    pub const fn new(min: Version, max: Version) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.min <= *version && *version < self.max
    }

    /// Compare a producer version against this range.
    ///
    /// Returns at most one warning: `INVALID_VERSION` when the string does not
    /// parse, `VERSION_MISMATCH` when it parses but lies outside the range.
    /// Both messages embed the offending version and the range literal.
    pub fn check(&self, version: &str, context: &str) -> Vec<CompatibilityWarning> {
        match version.parse::<Version>() {
            Ok(parsed) if self.contains(&parsed) => Vec::new(),
            Ok(_) => vec![CompatibilityWarning::new(
                WarningCode::VersionMismatch,
                format!("Producer version {version} is outside confirmed range {self}"),
                context,
            )],
            Err(e) => vec![CompatibilityWarning::new(
                WarningCode::InvalidVersion,
                format!(
                    "Producer version '{version}' is not a valid semantic version ({e}); \
                     confirmed range is {self}"
                ),
                context,
            )],
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">={},<{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: VersionRange = VersionRange::new(Version::new(1, 0, 0), Version::new(2, 0, 0));

    #[test]
    fn parse_plain_and_prefixed() {
        assert_eq!("1.2.3".parse::<Version>(), Ok(Version::new(1, 2, 3)));
        assert_eq!("v0.9.9".parse::<Version>(), Ok(Version::new(0, 9, 9)));
        assert_eq!(" 10.20.30 ".parse::<Version>(), Ok(Version::new(10, 20, 30)));
    }

    #[test]
    fn parse_ignores_prerelease_and_build() {
        assert_eq!("1.0.0-rc.1".parse::<Version>(), Ok(Version::new(1, 0, 0)));
        assert_eq!("1.4.2+build.7".parse::<Version>(), Ok(Version::new(1, 4, 2)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<Version>(), Err(VersionParseError::Empty));
        assert_eq!("1.0".parse::<Version>(), Err(VersionParseError::ComponentCount(2)));
        assert!(matches!(
            "1.x.0".parse::<Version>(),
            Err(VersionParseError::NotNumeric(_))
        ));
        assert!("not-a-version".parse::<Version>().is_err());
        assert!("1.-1.0".parse::<Version>().is_err());
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 99));
        assert!(Version::new(2, 0, 0) > Version::new(1, 99, 99));
    }

    #[test]
    fn range_literal() {
        assert_eq!(RANGE.to_string(), ">=1.0.0,<2.0.0");
    }

    #[test]
    fn boundaries() {
        let ctx = "metadata.generator.version";

        let below = RANGE.check("0.9.9", ctx);
        assert_eq!(below.len(), 1);
        assert_eq!(below[0].code, WarningCode::VersionMismatch);

        assert!(RANGE.check("1.0.0", ctx).is_empty());
        assert!(RANGE.check("1.99.99", ctx).is_empty());

        let above = RANGE.check("2.0.0", ctx);
        assert_eq!(above.len(), 1);
        assert_eq!(above[0].code, WarningCode::VersionMismatch);
        assert!(above[0].message.contains("2.0.0"));
        assert!(above[0].message.contains(">=1.0.0,<2.0.0"));
        assert_eq!(above[0].context.as_deref(), Some(ctx));
    }

    #[test]
    fn invalid_version_warns_without_failing() {
        let warnings = RANGE.check("latest", "metadata.generator.version");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::InvalidVersion);
        assert!(warnings[0].message.contains("'latest'"));
        assert!(warnings[0].message.contains(">=1.0.0,<2.0.0"));
    }
}
