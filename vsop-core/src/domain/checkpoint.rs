//! Checkpoint record types
//!
//! A checkpoint record is one line of the ledger file: `"<index>\t<status>"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a checkpoint record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointStatus {
    /// The stage at this index completed successfully
    Done,
}

impl CheckpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointStatus::Done => "done",
        }
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "done" => Ok(CheckpointStatus::Done),
            other => Err(format!("unknown checkpoint status '{}'", other)),
        }
    }
}

/// A single stage-completion record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub index: u32,
    pub status: CheckpointStatus,
}

impl CheckpointRecord {
    /// Record for a successfully completed stage
    pub fn done(index: u32) -> Self {
        Self {
            index,
            status: CheckpointStatus::Done,
        }
    }

    /// Parses one ledger line
    ///
    /// Returns `None` for anything that is not exactly two whitespace-separated
    /// tokens with a non-negative integer index and a known status. A line cut
    /// short by a crash mid-append therefore never parses.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let index = tokens.next()?.parse::<u32>().ok()?;
        let status = tokens.next()?.parse::<CheckpointStatus>().ok()?;

        if tokens.next().is_some() {
            return None;
        }

        Some(Self { index, status })
    }
}

impl fmt::Display for CheckpointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.index, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(CheckpointRecord::done(2).to_string(), "2\tdone");
    }

    #[test]
    fn test_parse_valid_lines() {
        assert_eq!(
            CheckpointRecord::parse_line("0\tdone"),
            Some(CheckpointRecord::done(0))
        );
        assert_eq!(
            CheckpointRecord::parse_line("  12 done \r"),
            Some(CheckpointRecord::done(12))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert_eq!(CheckpointRecord::parse_line(""), None);
        assert_eq!(CheckpointRecord::parse_line("3"), None);
        assert_eq!(CheckpointRecord::parse_line("3\tdo"), None);
        assert_eq!(CheckpointRecord::parse_line("-1\tdone"), None);
        assert_eq!(CheckpointRecord::parse_line("x\tdone"), None);
        assert_eq!(CheckpointRecord::parse_line("3\tdone\textra"), None);
    }
}
