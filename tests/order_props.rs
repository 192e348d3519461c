//! Order-independence properties: whatever order types and refs appear in
//! on disk, the loaded index is sorted and every entry stays reachable.

mod common;

use common::{build_fork, Res};
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    #[test]
    fn loaded_index_is_sorted_and_complete(
        codes in proptest::collection::hash_set(any::<u32>(), 1..8),
        ids in proptest::collection::hash_set(any::<i16>(), 1..30),
    ) {
        let ids: Vec<i16> = ids.into_iter().collect();
        let types: Vec<(u32, Vec<Res>)> = codes
            .iter()
            .map(|&c| {
                let refs = ids
                    .iter()
                    .map(|&id| Res::new(id, &id.to_be_bytes()))
                    .collect();
                (c, refs)
            })
            .collect();

        let image = build_fork(&types);
        let fork = resfork::ResourceFork::open_bytes(&image).unwrap();

        // Types strictly ascending and all present.
        let loaded: Vec<u32> = fork.types().iter().map(|t| t.code).collect();
        prop_assert!(loaded.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(loaded.iter().copied().collect::<HashSet<_>>(), codes);

        for t in fork.types() {
            // Refs ascending (IDs are unique here, so strictly).
            prop_assert!(t.refs().windows(2).all(|w| w[0].id < w[1].id));
            // Every ID resolvable with its own content.
            for &id in &ids {
                let data = fork.read(t.code, id, 0, 0).unwrap();
                prop_assert_eq!(data, id.to_be_bytes().to_vec());
            }
        }
    }

    #[test]
    fn pagination_partitions_the_directory(
        count in 1usize..40,
        page_size in 1usize..10,
    ) {
        let refs: Vec<Res> = (0..count as i16).map(|id| Res::new(id, b"p")).collect();
        let image = build_fork(&[(0x54455354, refs)]); // "TEST"
        let fork = resfork::ResourceFork::open_bytes(&image).unwrap();

        let mut seen = Vec::new();
        let mut start = 0;
        loop {
            let (page, remaining) = fork.list(0x54455354, start, page_size).unwrap();
            prop_assert!(page.len() <= page_size);
            start += page.len();
            let done = remaining == 0;
            seen.extend(page.into_iter().map(|a| a.id));
            if done {
                break;
            }
        }
        prop_assert_eq!(seen, (0..count as i16).collect::<Vec<_>>());
    }
}
