/// MySQL server version parsing for feature gating
use crate::error::{AdvisorError, AdvisorResult};

/// A parsed server version. Field order gives lexicographic comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    /// Generated (virtual) columns became indexable in 5.7
    pub const VIRTUAL_COLUMNS: ServerVersion = ServerVersion {
        major: 5,
        minor: 7,
        patch: 0,
    };

    /// Functional key parts arrived in 8.0.13
    pub const FUNCTIONAL_INDEXES: ServerVersion = ServerVersion {
        major: 8,
        minor: 0,
        patch: 13,
    };

    /// Parse a `version` variable value such as `8.0.13-log` or
    /// `5.7.22-0ubuntu0.16.04.1`; suffixes after `-`/`+` are ignored
    pub fn parse(s: &str) -> AdvisorResult<Self> {
        let core = s
            .split(|c: char| c == '-' || c == '+' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        let mut parts = core.split('.');
        let mut next = |label: &str| -> AdvisorResult<u32> {
            parts
                .next()
                .ok_or_else(|| AdvisorError::parse_with_input(format!("missing {label}"), s))?
                .parse::<u32>()
                .map_err(|_| AdvisorError::parse_with_input(format!("invalid {label}"), s))
        };
        Ok(Self {
            major: next("major version")?,
            minor: next("minor version")?,
            patch: next("patch version")?,
        })
    }
}
