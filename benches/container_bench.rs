use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xaba::codec::{Codec, Lz4BlockCodec};
use xaba::container::{
    AssemblyDescriptor, Container, DataEntry, FileHeader, HashEntry, DATA_ENTRY_HEADER_SIZE,
    DATA_MAGIC, DESCRIPTOR_SIZE, FILE_HEADER_SIZE, HASH_ENTRY_SIZE, MAGIC,
};

/// `n` entries of 64 KiB each, packed back to back.
fn make_container(n: usize) -> Container {
    let codec = Lz4BlockCodec;
    let mut offset = (FILE_HEADER_SIZE + n * (DESCRIPTOR_SIZE + 2 * HASH_ENTRY_SIZE)) as i32;
    let mut descriptors = Vec::new();
    let mut data_entries = Vec::new();
    for i in 0..n {
        let raw: Vec<u8> = (0..64 * 1024).map(|j| ((i * 31 + j / 7) % 251) as u8).collect();
        let payload = codec.compress(&raw).unwrap();
        let size = (DATA_ENTRY_HEADER_SIZE + payload.len()) as i32;
        descriptors.push(AssemblyDescriptor { data_offset: offset, data_size: size, ..Default::default() });
        data_entries.push(DataEntry { magic: *DATA_MAGIC, index: i as u32, original_size: raw.len() as u32, payload });
        offset += size;
    }
    let hashes: Vec<HashEntry> = (0..n as u32)
        .map(|i| HashEntry { hash: u64::from(i), mapping_index: i, local_store_index: i, store_id: 0 })
        .collect();
    Container {
        file_header: FileHeader {
            magic: *MAGIC,
            version: 1,
            local_entry_count: n as u32,
            global_entry_count: n as u32,
            store_id: 0,
        },
        descriptors,
        hash32_entries: hashes.clone(),
        hash64_entries: hashes,
        data_entries,
    }
}

fn bench_read_write(c: &mut Criterion) {
    let bytes = make_container(200).to_bytes();

    c.bench_function("read_200_entries", |b| b.iter(|| Container::from_bytes(black_box(&bytes)).unwrap()));
    let container = Container::from_bytes(&bytes).unwrap();
    c.bench_function("write_200_entries", |b| b.iter(|| black_box(&container).to_bytes()));
}

fn bench_replace(c: &mut Criterion) {
    let container = make_container(200);
    let replacement = vec![7u8; 256 * 1024];

    c.bench_function("replace_first_of_200", |b| {
        b.iter(|| {
            let mut work = container.clone();
            work.replace(0, black_box(&replacement), &Lz4BlockCodec).unwrap();
        })
    });
}

criterion_group!(benches, bench_read_write, bench_replace);
criterion_main!(benches);
