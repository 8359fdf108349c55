//! Version parsing and total ordering

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use thiserror::Error;

/// Shape of a single version string, shared with the requirement parser.
pub(crate) const VERSION_PATTERN: &str =
    r"[0-9]+(?:\.[0-9a-zA-Z]+)*(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?";

lazy_static! {
    /// Anchored validation regex. The version itself is optional: the empty
    /// string is accepted and treated as "0".
    static ref VERSION_RE: Regex =
        Regex::new(&format!(r"^\s*(?:{})?\s*$", VERSION_PATTERN)).unwrap();

    /// Splits a version string into numeric and alphabetic runs.
    static ref SEGMENT_RE: Regex = Regex::new(r"[0-9]+|[a-zA-Z]+").unwrap();
}

/// Error type for version and requirement parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed version number string {0}")]
    MalformedVersion(String),
    #[error("Illformed requirement {0:?}")]
    IllformedRequirement(String),
}

/// One ordered unit of a version: a numeric run or an alphabetic run.
///
/// Alphabetic segments sort before numeric ones, which is what makes
/// "1.0.a" a prerelease of "1.0".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Number(u64),
    Text(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A package version: dot-separated numeric and alphabetic segments under a
/// total order. Missing segments count as zero, so "1.2" == "1.2.0".
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    segments: Vec<Segment>,
}

impl Version {
    /// Parse a version string. Surrounding whitespace is ignored and the
    /// empty string parses as "0".
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        if !VERSION_RE.is_match(text) {
            return Err(VersionError::MalformedVersion(text.to_string()));
        }

        let trimmed = text.trim();
        let text = if trimmed.is_empty() { "0" } else { trimmed };

        let segments = SEGMENT_RE
            .find_iter(text)
            .map(|m| {
                let run = m.as_str();
                if run.as_bytes()[0].is_ascii_digit() {
                    // digit runs that overflow u64 saturate
                    Segment::Number(run.parse().unwrap_or(u64::MAX))
                } else {
                    Segment::Text(run.to_string())
                }
            })
            .collect();

        Ok(Version {
            text: text.to_string(),
            segments,
        })
    }

    /// The zero version, the floor of the default requirement.
    pub fn zero() -> Self {
        Version {
            text: "0".to_string(),
            segments: vec![Segment::Number(0)],
        }
    }

    /// The original version string.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether any segment is alphabetic, e.g. "1.0.a".
    pub fn is_prerelease(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Text(_)))
    }

    /// The version with prerelease segments stripped: "1.2.a.3" becomes "1.2".
    pub fn release(&self) -> Version {
        if !self.is_prerelease() {
            return self.clone();
        }

        let mut segments = self.segments.clone();
        while segments.iter().any(|s| matches!(s, Segment::Text(_))) {
            segments.pop();
        }
        Version {
            text: join_segments(&segments),
            segments,
        }
    }

    /// The smallest version above every `~>` match: "1.2.3" bumps to "1.3".
    pub fn bump(&self) -> Version {
        let mut segments = self.segments.clone();
        while segments.iter().any(|s| matches!(s, Segment::Text(_))) {
            segments.pop();
        }
        if segments.len() > 1 {
            segments.pop();
        }
        // the leading segment is always numeric, so the loop cannot empty it;
        // a segment saturated at the u64 ceiling stays there
        if let Some(Segment::Number(last)) = segments.last_mut() {
            *last = last.saturating_add(1);
        }
        Version {
            text: join_segments(&segments),
            segments,
        }
    }
}

fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match s {
            Segment::Number(n) => n.to_string(),
            Segment::Text(t) => t.clone(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        const ZERO: Segment = Segment::Number(0);

        let limit = self.segments.len().max(other.segments.len());
        for i in 0..limit {
            let lhs = self.segments.get(i).unwrap_or(&ZERO);
            let rhs = other.segments.get(i).unwrap_or(&ZERO);
            match lhs.cmp(rhs) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Version::parse(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        Version::parse(text).unwrap()
    }

    #[test]
    fn test_parse_accepts_valid_versions() {
        for text in ["1", "1.0", "1.2.3", "0.0.2", "5.2.4.a", "1.0.0-beta.2", "", "  1.2  "] {
            assert!(Version::parse(text).is_ok(), "{text:?} should parse");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_versions() {
        for text in ["junk", "1.0\n2.0", "..", "1..2", "1.2.3-+", "-1", "1 .2"] {
            assert!(Version::parse(text).is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn test_empty_string_is_version_zero() {
        assert_eq!(v(""), v("0"));
        assert_eq!(v("   "), v("0"));
        assert_eq!(v("").to_string(), "0");
    }

    #[test]
    fn test_ordering() {
        assert!(v("0.0.2") < v("0.0.3"));
        assert!(v("1.9") < v("1.10"));
        assert!(v("1.2") < v("1.2.1"));
        assert!(v("0.9") < v("1.0.a"));
        assert!(v("1.0.a") < v("1.0"));
        assert!(v("1.0.a9") < v("1.0.b1"));
        assert!(v("1.0.a9") < v("1.0.a10"));
        assert!(v("1.0.0-beta.2") < v("1.0.0-beta.10"));
        assert!(v("1.0.0-beta.10") < v("1.0.0"));
    }

    #[test]
    fn test_trailing_zeros_do_not_matter() {
        assert_eq!(v("1.2"), v("1.2.0"));
        assert_eq!(v("1.2"), v("1.2.0.0"));
        assert_ne!(v("1.2"), v("1.2.a"));
    }

    #[test]
    fn test_prerelease_detection() {
        assert!(v("1.0.a").is_prerelease());
        assert!(v("1.0.0-beta.2").is_prerelease());
        assert!(!v("1.0").is_prerelease());
        assert!(!v("0").is_prerelease());
    }

    #[test]
    fn test_release_strips_prerelease_segments() {
        assert_eq!(v("1.2.a.3").release(), v("1.2"));
        assert_eq!(v("1.0.0-beta.2").release(), v("1.0.0"));
        assert_eq!(v("1.4.6").release(), v("1.4.6"));
    }

    #[test]
    fn test_bump() {
        assert_eq!(v("1.2.3").bump().to_string(), "1.3");
        assert_eq!(v("1.2").bump().to_string(), "2");
        assert_eq!(v("1.2.3.a.4").bump().to_string(), "1.3");
        assert_eq!(v("5").bump().to_string(), "6");
    }

    #[test]
    fn test_bump_saturates_on_overlong_numeric_run() {
        // one past u64::MAX; the run parses saturated and bump stays put
        let huge = v("18446744073709551616");
        assert_eq!(huge.bump(), huge);
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(v("1.2.3").to_string(), "1.2.3");
        assert_eq!(v(" 1.2 ").to_string(), "1.2");
        assert_eq!(v("5.2.4.a10").to_string(), "5.2.4.a10");
    }
}
