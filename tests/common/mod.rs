//! Store fixtures serialized by hand, independent of the crate's writer.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use std::path::Path;
use xaba::store::StorePaths;
use xxhash_rust::{xxh32::xxh32, xxh64::xxh64};

pub const HEADER_LINE: &str = "Hash 32     Hash 64             Blob ID  Blob idx  Name";

pub struct Fixture {
    pub manifest: String,
    pub blob:     Vec<u8>,
}

/// The two-entry store used throughout: `test` is 1024 × 'A', `test2` is
/// the five bytes "test2".
pub fn sample_entries() -> Vec<(&'static str, Vec<u8>)> {
    vec![("test", vec![b'A'; 1024]), ("test2", b"test2".to_vec())]
}

/// Debug/config descriptor fields for entry `i`: `[debug_offset,
/// debug_size, config_offset, config_size]`.  Distinct per entry so any
/// accidental rewrite of them shows up.
pub fn side_fields(i: usize) -> [i32; 4] {
    let i = i as i32;
    [1000 + 100 * i, 7 + i, 2000 + 100 * i, 9 + i]
}

pub fn build(entries: &[(&str, Vec<u8>)]) -> Fixture {
    let n = entries.len();
    let compressed: Vec<Vec<u8>> = entries
        .iter()
        .map(|(_, data)| lz4_flex::block::compress(data))
        .collect();

    let mut blob = Vec::new();
    blob.extend_from_slice(b"XABA");
    for v in [1u32, n as u32, n as u32, 0] {
        blob.write_u32::<LittleEndian>(v).unwrap();
    }

    let mut offset = (20 + n * 24 + 2 * n * 20) as i32;
    for (i, c) in compressed.iter().enumerate() {
        let size = (12 + c.len()) as i32;
        let [debug_offset, debug_size, config_offset, config_size] = side_fields(i);
        for v in [offset, size, debug_offset, debug_size, config_offset, config_size] {
            blob.write_i32::<LittleEndian>(v).unwrap();
        }
        offset += size;
    }

    // Lookup tables are sorted by hash, as the runtime expects.
    let mut h32: Vec<(u64, u32)> = entries
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (u64::from(xxh32(name.as_bytes(), 0)), i as u32))
        .collect();
    let mut h64: Vec<(u64, u32)> = entries
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (xxh64(name.as_bytes(), 0), i as u32))
        .collect();
    h32.sort();
    h64.sort();
    for (hash, i) in h32.into_iter().chain(h64) {
        blob.write_u64::<LittleEndian>(hash).unwrap();
        blob.write_u32::<LittleEndian>(i).unwrap();
        blob.write_u32::<LittleEndian>(i).unwrap();
        blob.write_u32::<LittleEndian>(0).unwrap();
    }

    for (i, ((_, data), c)) in entries.iter().zip(&compressed).enumerate() {
        blob.extend_from_slice(b"XALZ");
        blob.write_u32::<LittleEndian>(i as u32).unwrap();
        blob.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        blob.extend_from_slice(c);
    }

    let mut manifest = format!("{HEADER_LINE}\n");
    for (i, (name, _)) in entries.iter().enumerate() {
        manifest.push_str(&format!(
            "0x{:08x}  0x{:016x}  {:03}      {:04}      {}\n",
            xxh32(name.as_bytes(), 0),
            xxh64(name.as_bytes(), 0),
            0,
            i,
            name
        ));
    }

    Fixture { manifest, blob }
}

/// Write `<dir>/<stem>.manifest` and `<dir>/<stem>.blob`.
pub fn write(dir: &Path, stem: &str, fixture: &Fixture) -> StorePaths {
    let paths = StorePaths {
        manifest: dir.join(format!("{stem}.manifest")),
        blob:     dir.join(format!("{stem}.blob")),
    };
    std::fs::write(&paths.manifest, &fixture.manifest).unwrap();
    std::fs::write(&paths.blob, &fixture.blob).unwrap();
    paths
}
