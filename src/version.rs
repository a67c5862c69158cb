//! Semantic version handling for datasets

use crate::dataset::Dataset;
use crate::error::{ArkdataError, Result};
use std::fmt;
use std::str::FromStr;

/// Which component of a version to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPart {
    Major,
    Minor,
    Patch,
}

impl VersionPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionPart::Major => "major",
            VersionPart::Minor => "minor",
            VersionPart::Patch => "patch",
        }
    }
}

impl FromStr for VersionPart {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            _ => Err(format!("Invalid version part: {}. Use 'major', 'minor', or 'patch'", s)),
        }
    }
}

/// A parsed `major.minor.patch` version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    /// Increment one component. Fails when that component is already at
    /// `u64::MAX`.
    pub fn bump(self, part: VersionPart) -> Result<Self> {
        let overflow = || ArkdataError::InvalidVersion {
            version: self.to_string(),
        };
        let bumped = match part {
            VersionPart::Major => Self {
                major: self.major.checked_add(1).ok_or_else(overflow)?,
                minor: 0,
                patch: 0,
            },
            VersionPart::Minor => Self {
                minor: self.minor.checked_add(1).ok_or_else(overflow)?,
                patch: 0,
                ..self
            },
            VersionPart::Patch => Self {
                patch: self.patch.checked_add(1).ok_or_else(overflow)?,
                ..self
            },
        };
        Ok(bumped)
    }
}

impl FromStr for SemVer {
    type Err = ArkdataError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ArkdataError::InvalidVersion {
            version: s.to_string(),
        };

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            // u64 parsing accepts a leading '+', which is not part of the format
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
        })
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Increment one component of a version string
pub fn increment(version: &str, part: VersionPart) -> Result<String> {
    let parsed: SemVer = version.parse()?;
    Ok(parsed.bump(part)?.to_string())
}

impl Dataset {
    /// Increment the dataset version in place.
    ///
    /// On an unparsable version the dataset is left untouched and the error
    /// is returned for the caller to surface.
    pub fn increment_version(&mut self, part: VersionPart) -> Result<String> {
        match increment(&self.version, part) {
            Ok(next) => {
                self.version = next.clone();
                self.touch();
                Ok(next)
            }
            Err(e) => {
                log::warn!(
                    "Cannot increment {} version of '{}': {}",
                    part.as_str(),
                    self.version,
                    e
                );
                Err(e)
            }
        }
    }

    pub fn increment_major(&mut self) -> Result<String> {
        self.increment_version(VersionPart::Major)
    }

    pub fn increment_minor(&mut self) -> Result<String> {
        self.increment_version(VersionPart::Minor)
    }

    pub fn increment_patch(&mut self) -> Result<String> {
        self.increment_version(VersionPart::Patch)
    }
}
