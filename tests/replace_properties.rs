mod common;

use proptest::prelude::*;
use xaba::{Container, Lz4BlockCodec};

fn payloads() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(
        prop_oneof![
            prop::collection::vec(any::<u8>(), 0..512),
            (any::<u8>(), 0usize..2048).prop_map(|(b, n)| vec![b; n]),
        ],
        1..6,
    )
}

fn named(payloads: &[Vec<u8>]) -> Vec<(String, Vec<u8>)> {
    payloads
        .iter()
        .enumerate()
        .map(|(i, p)| (format!("Assembly{i}"), p.clone()))
        .collect()
}

fn fixture_bytes(payloads: &[Vec<u8>]) -> Vec<u8> {
    let entries = named(payloads);
    let refs: Vec<(&str, Vec<u8>)> = entries.iter().map(|(n, p)| (n.as_str(), p.clone())).collect();
    common::build(&refs).blob
}

fn assert_contiguous(c: &Container) {
    for pair in c.descriptors.windows(2) {
        assert_eq!(i64::from(pair[1].data_offset), pair[0].data_end());
    }
    for (d, e) in c.descriptors.iter().zip(&c.data_entries) {
        assert_eq!(d.data_size as usize, e.record_size());
    }
}

proptest! {
    #[test]
    fn read_write_identity(payloads in payloads()) {
        let bytes = fixture_bytes(&payloads);
        prop_assert_eq!(Container::from_bytes(&bytes).unwrap().to_bytes(), bytes);
    }

    #[test]
    fn replace_sequence_keeps_layout(
        payloads in payloads(),
        edits in prop::collection::vec((any::<prop::sample::Index>(), prop::collection::vec(any::<u8>(), 0..1024)), 1..8),
    ) {
        let mut container = Container::from_bytes(&fixture_bytes(&payloads)).unwrap();
        let mut expected = payloads.clone();

        for (slot, data) in edits {
            let k = slot.index(expected.len());
            let before = container.clone();
            container.replace(k, &data, &Lz4BlockCodec).unwrap();
            expected[k] = data.clone();

            for (i, d) in container.descriptors.iter().enumerate() {
                let side = [d.debug_data_offset, d.debug_data_size, d.config_data_offset, d.config_data_size];
                prop_assert_eq!(side, common::side_fields(i));
            }
            for i in (0..container.len()).filter(|&i| i != k) {
                prop_assert_eq!(&container.data_entries[i], &before.data_entries[i]);
                prop_assert_eq!(container.descriptors[i].data_size, before.descriptors[i].data_size);
            }
            prop_assert_eq!(container.data_entries[k].original_size as usize, data.len());
            prop_assert_eq!(container.decompress(k, &Lz4BlockCodec).unwrap(), data);
            assert_contiguous(&container);
        }

        let reread = Container::from_bytes(&container.to_bytes()).unwrap();
        for (i, want) in expected.iter().enumerate() {
            prop_assert_eq!(&reread.decompress(i, &Lz4BlockCodec).unwrap(), want);
        }
    }
}
