pub mod codec;
pub mod container;
pub mod hash;
pub mod manifest;
pub mod store;

pub use codec::{Codec, CodecError, Lz4BlockCodec};
pub use container::{AssemblyDescriptor, Container, ContainerError, DataEntry, FileHeader, HashEntry};
pub use manifest::{AssemblyInfo, Manifest, ManifestError};
pub use store::{AssemblyStore, EntryInfo, StoreError, StorePaths};
