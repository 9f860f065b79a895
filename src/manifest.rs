//! `assemblies.manifest` — the text companion of a blob.
//!
//! ```text
//! Hash 32     Hash 64             Blob ID  Blob idx  Name
//! 0x<xxh32>   0x<xxh64>           000      0000      test
//! ```
//! Row `i` names blob entry `i`.  Each row carries the xxHash32/xxHash64 of
//! its own name, so a row that does not hash to itself is rejected.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::hash::{hash32, hash64};

/// Column header; compared token by token.
pub const HEADER: &str = "Hash 32     Hash 64             Blob ID  Blob idx  Name";

/// Extension unpacked assemblies are written with.
pub const DLL_EXT: &str = ".dll";

// ── Error types ──────────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "hashes of {name:?} do not match: listed {hash32:08x}/{hash64:016x}, \
     computed {expected32:08x}/{expected64:016x}"
)]
pub struct HashMismatch {
    pub name:       String,
    pub hash32:     u32,
    pub hash64:     u64,
    pub expected32: u32,
    pub expected64: u64,
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest is empty (no header line)")]
    MissingHeader,
    #[error("Invalid manifest header: {0:?}")]
    InvalidHeader(String),
    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("Line {line}: {source}")]
    HashMismatch {
        line: usize,
        #[source]
        source: HashMismatch,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── AssemblyInfo ─────────────────────────────────────────────────────────────

/// One manifest row.  Only constructible with hashes that match `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyInfo {
    hash32:   u32,
    hash64:   u64,
    blob_id:  u32,
    blob_idx: u32,
    name:     String,
}

impl AssemblyInfo {
    pub fn new(
        hash32_value: u32,
        hash64_value: u64,
        blob_id: u32,
        blob_idx: u32,
        name: impl Into<String>,
    ) -> Result<Self, HashMismatch> {
        let name = name.into();
        let expected32 = hash32(&name);
        let expected64 = hash64(&name);
        if hash32_value != expected32 || hash64_value != expected64 {
            return Err(HashMismatch {
                name,
                hash32: hash32_value,
                hash64: hash64_value,
                expected32,
                expected64,
            });
        }
        Ok(Self {
            hash32: hash32_value,
            hash64: hash64_value,
            blob_id,
            blob_idx,
            name,
        })
    }

    /// Row for `name` with freshly computed hashes.
    pub fn for_name(name: impl Into<String>, blob_id: u32, blob_idx: u32) -> Self {
        let name = name.into();
        Self {
            hash32: hash32(&name),
            hash64: hash64(&name),
            blob_id,
            blob_idx,
            name,
        }
    }

    pub fn hash32(&self) -> u32 { self.hash32 }
    pub fn hash64(&self) -> u64 { self.hash64 }
    pub fn blob_id(&self) -> u32 { self.blob_id }
    pub fn blob_idx(&self) -> u32 { self.blob_idx }
    pub fn name(&self) -> &str { &self.name }

    /// True when `query` is this assembly's name, with or without `.dll`.
    pub fn matches(&self, query: &str) -> bool {
        query == self.name || query.strip_suffix(DLL_EXT) == Some(self.name.as_str())
    }

    fn parse_row(line_no: usize, line: &str) -> Result<Self, ManifestError> {
        let malformed = |reason: String| ManifestError::Malformed { line: line_no, reason };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[h32, h64, id, idx, name] = fields.as_slice() else {
            return Err(malformed(format!("expected 5 fields, found {}", fields.len())));
        };

        let h32 = u32::from_str_radix(strip_hex_prefix(h32), 16)
            .map_err(|e| malformed(format!("hash32 {h32:?}: {e}")))?;
        let h64 = u64::from_str_radix(strip_hex_prefix(h64), 16)
            .map_err(|e| malformed(format!("hash64 {h64:?}: {e}")))?;
        let id: u32 = id.parse().map_err(|e| malformed(format!("blob id {id:?}: {e}")))?;
        let idx: u32 = idx.parse().map_err(|e| malformed(format!("blob idx {idx:?}: {e}")))?;

        Self::new(h32, h64, id, idx, name)
            .map_err(|source| ManifestError::HashMismatch { line: line_no, source })
    }
}

impl fmt::Display for AssemblyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08x}  0x{:016x}  {:03}      {:04}      {}",
            self.hash32, self.hash64, self.blob_id, self.blob_idx, self.name
        )
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

// ── Manifest ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    assemblies: Vec<AssemblyInfo>,
}

impl Manifest {
    pub fn new(assemblies: Vec<AssemblyInfo>) -> Self {
        Self { assemblies }
    }

    /// Parse manifest text.  The first non-blank line must be [`HEADER`];
    /// every later non-blank line is one row.  Any bad row fails the whole
    /// parse.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l))
            .filter(|(_, l)| !l.trim().is_empty());

        let (_, header) = lines.next().ok_or(ManifestError::MissingHeader)?;
        if !header.split_whitespace().eq(HEADER.split_whitespace()) {
            return Err(ManifestError::InvalidHeader(header.to_owned()));
        }

        let assemblies = lines
            .map(|(line_no, line)| AssemblyInfo::parse_row(line_no, line))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(entries = assemblies.len(), "parsed manifest");
        Ok(Self { assemblies })
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self, ManifestError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading manifest");
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Emit the header and one row per assembly, each newline-terminated.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{self}")
    }

    pub fn assemblies(&self) -> &[AssemblyInfo] {
        &self.assemblies
    }

    pub fn get(&self, index: usize) -> Option<&AssemblyInfo> {
        self.assemblies.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AssemblyInfo> {
        self.assemblies.iter()
    }

    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }

    /// Index of the first assembly named `query` (`.dll` suffix optional).
    pub fn position(&self, query: &str) -> Option<usize> {
        self.assemblies.iter().position(|a| a.matches(query))
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        for a in &self.assemblies {
            writeln!(f, "{a}")?;
        }
        Ok(())
    }
}
