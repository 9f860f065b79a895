//! High-level [`AssemblyStore`] API: a manifest paired with its blob.
//!
//! ```no_run
//! use xaba::store::{AssemblyStore, StorePaths};
//!
//! let paths = StorePaths::resolve(None, Some("assemblies.blob".as_ref()))?;
//! let mut store = AssemblyStore::open(&paths)?;
//! for entry in store.list() {
//!     println!("{:4} {}", entry.blob_idx, entry.name);
//! }
//! store.replace("Mono.Android", b"...")?;
//! store.save("assemblies.new.blob")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::{Codec, Lz4BlockCodec};
use crate::container::{Container, ContainerError};
use crate::manifest::{AssemblyInfo, Manifest, ManifestError, DLL_EXT};

pub const BLOB_EXT: &str = ".blob";
pub const MANIFEST_EXT: &str = ".manifest";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("A blob or manifest path is required")]
    MissingInput,
    #[error("Manifest lists {manifest} assemblies but the blob holds {blob}")]
    EntryCountMismatch { manifest: usize, blob: usize },
    #[error("Assembly not found: {0}")]
    UnknownAssembly(String),
    #[error("Replacement file not found: {}", .0.display())]
    MissingReplacement(PathBuf),
    #[error("Assembly name is not a plain file name: {0:?}")]
    UnsafeName(String),
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Blob error: {0}")]
    Container(#[from] ContainerError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── StorePaths ───────────────────────────────────────────────────────────────

/// Locations of the two halves of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub manifest: PathBuf,
    pub blob:     PathBuf,
}

impl StorePaths {
    /// Fill in whichever path is missing from the other one:
    /// `foo.blob` pairs with `foo.manifest` and vice versa.
    pub fn resolve(manifest: Option<&Path>, blob: Option<&Path>) -> Result<Self, StoreError> {
        let (manifest, blob) = match (manifest, blob) {
            (Some(m), Some(b)) => (m.to_owned(), b.to_owned()),
            (None, Some(b))    => (swap_ext(b, BLOB_EXT, MANIFEST_EXT), b.to_owned()),
            (Some(m), None)    => (m.to_owned(), swap_ext(m, MANIFEST_EXT, BLOB_EXT)),
            (None, None)       => return Err(StoreError::MissingInput),
        };
        Ok(Self { manifest, blob })
    }
}

/// Strip a trailing `from` (if present) and append `to`.
fn swap_ext(path: &Path, from: &str, to: &str) -> PathBuf {
    let mut out = match path.to_str().and_then(|p| p.strip_suffix(from)) {
        Some(stem) => stem.into(),
        None       => path.as_os_str().to_owned(),
    };
    out.push(to);
    PathBuf::from(out)
}

// ── EntryInfo ────────────────────────────────────────────────────────────────

/// One row of [`AssemblyStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub index:         usize,
    pub blob_idx:      u32,
    pub name:          String,
    pub data_offset:   i32,
    /// Full on-disk record size, header included.
    pub data_size:     i32,
    pub original_size: u32,
    pub config_size:   i32,
    pub debug_size:    i32,
}

// ── AssemblyStore ────────────────────────────────────────────────────────────

pub struct AssemblyStore {
    manifest:  Manifest,
    container: Container,
    codec:     Box<dyn Codec>,
}

impl AssemblyStore {
    // ── Constructors ─────────────────────────────────────────────────────────

    pub fn open(paths: &StorePaths) -> Result<Self, StoreError> {
        let manifest = Manifest::open(&paths.manifest)?;
        let container = Container::open(&paths.blob)?;
        Self::from_parts(manifest, container)
    }

    /// Pair an already-loaded manifest and blob.  Row `i` of the manifest
    /// must describe entry `i` of the blob, so the counts have to agree.
    pub fn from_parts(manifest: Manifest, container: Container) -> Result<Self, StoreError> {
        if manifest.len() != container.len() {
            return Err(StoreError::EntryCountMismatch {
                manifest: manifest.len(),
                blob:     container.len(),
            });
        }
        let codec: Box<dyn Codec> = Box::new(Lz4BlockCodec);
        debug!(entries = manifest.len(), codec = codec.name(), "opened assembly store");
        Ok(Self { manifest, container, codec })
    }

    // ── Read ─────────────────────────────────────────────────────────────────

    pub fn manifest(&self) -> &Manifest { &self.manifest }
    pub fn container(&self) -> &Container { &self.container }

    pub fn list(&self) -> Vec<EntryInfo> {
        self.manifest
            .iter()
            .zip(self.container.descriptors.iter().zip(&self.container.data_entries))
            .enumerate()
            .map(|(index, (a, (d, e)))| EntryInfo {
                index,
                blob_idx:      a.blob_idx(),
                name:          a.name().to_owned(),
                data_offset:   d.data_offset,
                data_size:     d.data_size,
                original_size: e.original_size,
                config_size:   d.config_data_size,
                debug_size:    d.debug_data_size,
            })
            .collect()
    }

    /// Decompressed content of the assembly called `name` (`.dll` optional).
    pub fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let index = self
            .manifest
            .position(name)
            .ok_or_else(|| StoreError::UnknownAssembly(name.to_owned()))?;
        Ok(self.container.decompress(index, self.codec.as_ref())?)
    }

    /// Write selected assemblies into `dest` as `<name>.dll`, creating `dest`
    /// if needed.  An empty `filter` selects everything; otherwise an entry
    /// is selected when `filter` holds its name with or without `.dll`.
    ///
    /// Every selected entry is decompressed before anything is written, so a
    /// corrupt entry fails the call without leaving partial output behind.
    /// No `.dll.config` side files are produced: entries carry only their
    /// main payload.
    pub fn unpack<P: AsRef<Path>>(&self, dest: P, filter: &[String]) -> Result<Vec<PathBuf>, StoreError> {
        let dest = dest.as_ref();

        for wanted in filter {
            if self.manifest.position(wanted).is_none() {
                warn!(name = %wanted, "no assembly matches filter");
            }
        }

        let mut staged = Vec::new();
        for (index, assembly) in self.manifest.iter().enumerate() {
            if !filter.is_empty() && !filter.iter().any(|f| assembly.matches(f)) {
                continue;
            }
            let path = dest.join(dll_file_name(assembly)?);
            let data = self.container.decompress(index, self.codec.as_ref())?;
            staged.push((index, path, data));
        }

        std::fs::create_dir_all(dest)?;
        let mut written = Vec::with_capacity(staged.len());
        for (index, path, data) in staged {
            std::fs::write(&path, &data)?;
            debug!(entry = index, path = %path.display(), bytes = data.len(), "unpacked");
            written.push(path);
        }
        info!(count = written.len(), dest = %dest.display(), "unpack finished");
        Ok(written)
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Replace the content of the assembly called `name` (`.dll` optional).
    pub fn replace(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let index = self
            .manifest
            .position(name)
            .ok_or_else(|| StoreError::UnknownAssembly(name.to_owned()))?;
        self.container.replace(index, data, self.codec.as_ref())?;
        Ok(())
    }

    /// Replace assemblies from files on disk.  Each file's name, minus a
    /// trailing `.dll`, selects the assembly it replaces.
    ///
    /// All-or-nothing: a missing file, a name with no assembly, or a failed
    /// recompression leaves the blob unchanged.
    pub fn replace_files<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<usize, StoreError> {
        let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();
        for file in files {
            let file = file.as_ref();
            if !file.is_file() {
                return Err(StoreError::MissingReplacement(file.to_owned()));
            }
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| StoreError::MissingReplacement(file.to_owned()))?;
            let key = file_name.strip_suffix(DLL_EXT).unwrap_or(&file_name).to_owned();
            if !self.manifest.iter().any(|a| a.name() == key) {
                return Err(StoreError::UnknownAssembly(key));
            }
            replacements.insert(key, std::fs::read(file)?);
        }

        let targets: Vec<(usize, &[u8])> = self
            .manifest
            .iter()
            .enumerate()
            .filter_map(|(index, a)| replacements.get(a.name()).map(|d| (index, d.as_slice())))
            .collect();
        // Staged on a copy so a failing entry leaves earlier ones unapplied.
        let mut staged = self.container.clone();
        for &(index, data) in &targets {
            staged.replace(index, data, self.codec.as_ref())?;
        }
        self.container = staged;
        info!(count = targets.len(), "replaced assemblies");
        Ok(targets.len())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        self.container.save(path)?;
        Ok(())
    }
}

/// `<name>.dll`, refusing names that would leave the output directory.
fn dll_file_name(assembly: &AssemblyInfo) -> Result<String, StoreError> {
    let name = assembly.name();
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(c)), None) if c == name => Ok(format!("{name}{DLL_EXT}")),
        _ => Err(StoreError::UnsafeName(name.to_owned())),
    }
}
