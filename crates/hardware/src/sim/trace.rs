//! Access Trace Loading.
//!
//! Traces are JSON lines, one access per line:
//!
//! ```text
//! # pc and paddr are optional, secure defaults to false
//! {"pc": "0x400a10", "addr": "0x10000"}
//! {"pc": 4196880, "addr": 65600, "paddr": 1114176, "secure": true}
//! {"addr": "0x20000"}
//! ```
//!
//! Addresses may be given as JSON integers or as strings, decimal or
//! `0x`-prefixed hexadecimal. Blank lines and lines starting with `#` are
//! skipped.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::error::TraceError;
use crate::core::units::prefetch::AccessInfo;

/// Integer-or-string address parsing.
mod addr_serde {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAddr {
        Int(u64),
        Text(String),
    }

    fn parse<E: serde::de::Error>(raw: RawAddr) -> Result<u64, E> {
        match raw {
            RawAddr::Int(v) => Ok(v),
            RawAddr::Text(s) => {
                let s = s.trim();
                let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
                    None => s.replace('_', "").parse(),
                };
                parsed.map_err(|e| E::custom(format!("invalid address '{s}': {e}")))
            }
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse(RawAddr::deserialize(deserializer)?)
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<RawAddr>::deserialize(deserializer)?
            .map(parse)
            .transpose()
    }
}

/// One access of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessRecord {
    /// Issuing instruction, if known.
    #[serde(default, deserialize_with = "addr_serde::deserialize_opt")]
    pub pc: Option<u64>,
    /// Requested address.
    #[serde(deserialize_with = "addr_serde::deserialize")]
    pub addr: u64,
    /// Physical address; the requested address when absent.
    #[serde(default, deserialize_with = "addr_serde::deserialize_opt")]
    pub paddr: Option<u64>,
    /// Security domain.
    #[serde(default)]
    pub secure: bool,
}

impl AccessRecord {
    /// Creates a non-secure record with identity address mapping.
    pub const fn new(pc: Option<u64>, addr: u64) -> Self {
        Self {
            pc,
            addr,
            paddr: None,
            secure: false,
        }
    }

    /// The access as seen by the prefetchers.
    pub const fn to_access(&self) -> AccessInfo {
        let paddr = match self.paddr {
            Some(p) => p,
            None => self.addr,
        };
        AccessInfo::new(self.pc, self.addr)
            .with_paddr(paddr)
            .with_secure(self.secure)
    }
}

/// Parses trace text.
///
/// # Errors
///
/// Returns [`TraceError::Parse`] with the one-based line number of the first
/// malformed record, or [`TraceError::Empty`] when no record is found.
pub fn parse_trace(text: &str) -> Result<Vec<AccessRecord>, TraceError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| TraceError::Parse {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    if records.is_empty() {
        return Err(TraceError::Empty);
    }
    Ok(records)
}

/// Reads and parses a trace file.
///
/// # Errors
///
/// Returns [`TraceError::Io`] if the file cannot be read, otherwise the
/// errors of [`parse_trace`].
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<AccessRecord>, TraceError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_trace(&text)
}
