//! Requirement matching over versions

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::version::VERSION_PATTERN;
use crate::{Version, VersionError};

lazy_static! {
    /// One requirement clause: an optional operator followed by a version.
    static ref REQUIREMENT_RE: Regex = Regex::new(&format!(
        r"^\s*(=|!=|>=|<=|>|<|~>)?\s*({})\s*$",
        VERSION_PATTERN
    ))
    .unwrap();
}

/// Requirement operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEq,
    LessEq,
    /// The `~>` operator: at least the given version, below its bump.
    Pessimistic,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Equal => "=",
            Op::NotEqual => "!=",
            Op::Greater => ">",
            Op::Less => "<",
            Op::GreaterEq => ">=",
            Op::LessEq => "<=",
            Op::Pessimistic => "~>",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of operator clauses a candidate version must all satisfy.
///
/// `Requirement::default()` is ">= 0".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    clauses: Vec<(Op, Version)>,
}

impl Requirement {
    /// Parse a requirement like "= 1.4.6" or ">= 1.2, < 2.0". A bare
    /// version means "= version".
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let mut clauses = Vec::new();

        for clause in text.split(',') {
            let caps = REQUIREMENT_RE
                .captures(clause)
                .ok_or_else(|| VersionError::IllformedRequirement(clause.trim().to_string()))?;

            let op = match caps.get(1).map(|m| m.as_str()) {
                None | Some("=") => Op::Equal,
                Some("!=") => Op::NotEqual,
                Some(">") => Op::Greater,
                Some("<") => Op::Less,
                Some(">=") => Op::GreaterEq,
                Some("<=") => Op::LessEq,
                Some("~>") => Op::Pessimistic,
                Some(other) => {
                    return Err(VersionError::IllformedRequirement(other.to_string()));
                }
            };
            let version = Version::parse(&caps[2])?;

            clauses.push((op, version));
        }

        Ok(Requirement { clauses })
    }

    /// Check a candidate version against every clause.
    pub fn satisfied_by(&self, version: &Version) -> bool {
        self.clauses.iter().all(|(op, req)| match op {
            Op::Equal => version == req,
            Op::NotEqual => version != req,
            Op::Greater => version > req,
            Op::Less => version < req,
            Op::GreaterEq => version >= req,
            Op::LessEq => version <= req,
            Op::Pessimistic => version >= req && version.release() < req.bump(),
        })
    }

    /// The parsed clauses in order.
    pub fn clauses(&self) -> &[(Op, Version)] {
        &self.clauses
    }
}

impl Default for Requirement {
    fn default() -> Self {
        Requirement {
            clauses: vec![(Op::GreaterEq, Version::zero())],
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (op, version)) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", op, version)?;
        }
        Ok(())
    }
}

impl FromStr for Requirement {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Requirement::parse(s)
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Requirement::parse(&text).map_err(de::Error::custom)
    }
}
