//! Mixed size classes sharing one store, from zero bytes to 16 KiB + 1.

use refstore::Store;

macro_rules! sized_block {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy)]
        struct $name {
            field: [u8; $len],
        }

        impl $name {
            fn filled(value: u8) -> $name {
                $name {
                    field: [value; $len],
                }
            }
        }
    };
}

sized_block!(BytesZero, 0);
sized_block!(Bytes1, 1);
sized_block!(Bytes2, 1 << 1);
sized_block!(Bytes4, 1 << 2);
sized_block!(Bytes31, (1 << 5) - 1);
sized_block!(Bytes32, 1 << 5);
sized_block!(Bytes33, (1 << 5) + 1);
sized_block!(Bytes511, (1 << 9) - 1);
sized_block!(Bytes512, 1 << 9);
sized_block!(Bytes513, (1 << 9) + 1);
sized_block!(Bytes16383, (1 << 14) - 1);
sized_block!(Bytes16384, 1 << 14);
sized_block!(Bytes16385, (1 << 14) + 1);

const TYPE_COUNT: usize = 13;

/// Allocate the `selector`-th type round-robin, filling every byte with
/// `selector`, and return a closure that reads the stored bytes back.
fn alloc_and_write(store: &mut Store, selector: usize) -> Box<dyn Fn(&Store) -> Vec<u8>> {
    let fill = selector as u8;
    match selector % TYPE_COUNT {
        0 => {
            let (r, _) = store.alloc(BytesZero::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        1 => {
            let (r, _) = store.alloc(Bytes1::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        2 => {
            let (r, _) = store.alloc(Bytes2::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        3 => {
            let (r, _) = store.alloc(Bytes4::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        4 => {
            let (r, _) = store.alloc(Bytes31::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        5 => {
            let (r, _) = store.alloc(Bytes32::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        6 => {
            let (r, _) = store.alloc(Bytes33::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        7 => {
            let (r, _) = store.alloc(Bytes511::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        8 => {
            let (r, _) = store.alloc(Bytes512::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        9 => {
            let (r, _) = store.alloc(Bytes513::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        10 => {
            let (r, _) = store.alloc(Bytes16383::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        11 => {
            let (r, _) = store.alloc(Bytes16384::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        12 => {
            let (r, _) = store.alloc(Bytes16385::filled(fill));
            Box::new(move |s| s.get(r).field.to_vec())
        }
        _ => unreachable!(),
    }
}

// Allocate enough objects of every size class that each pool overflows into
// several slabs, then verify every stored byte pattern is still visible.
#[test]
fn writes_across_all_size_classes_remain_visible() {
    let mut store = Store::with_slab_bytes(256);

    // Warm one round so every pool's config exists, then size the run off
    // the densest pool.
    let mut readers: Vec<Box<dyn Fn(&Store) -> Vec<u8>>> = (0..TYPE_COUNT)
        .map(|i| alloc_and_write(&mut store, i))
        .collect();

    let slots = store.config_for::<Bytes1>().unwrap().slots_per_slab();
    let total = 3 * slots * TYPE_COUNT;
    for i in TYPE_COUNT..total {
        readers.push(alloc_and_write(&mut store, i));
    }

    for (i, read) in readers.iter().enumerate() {
        let bytes = read(&store);
        assert!(
            bytes.iter().all(|&b| b == i as u8),
            "allocation {} read back wrong bytes",
            i
        );
    }

    // Every pool overflowed at least once.
    for stats in store.pool_stats() {
        assert!(stats.chunks >= 2, "pool never grew a second slab: {:?}", stats);
    }
    assert_eq!(store.stats().allocs, total);
}

#[test]
fn allocation_configs_cover_every_type_in_first_use_order() {
    let mut store = Store::with_slab_bytes(256);
    for i in 0..TYPE_COUNT {
        alloc_and_write(&mut store, i);
    }

    let configs = store.allocation_configs();
    assert_eq!(configs.len(), TYPE_COUNT);

    let sizes = [
        0usize,
        1,
        1 << 1,
        1 << 2,
        (1 << 5) - 1,
        1 << 5,
        (1 << 5) + 1,
        (1 << 9) - 1,
        1 << 9,
        (1 << 9) + 1,
        (1 << 14) - 1,
        1 << 14,
        (1 << 14) + 1,
    ];
    for (config, &size) in configs.iter().zip(sizes.iter()) {
        assert_eq!(config.object_size(), size);
        assert!(config.stride() >= size.max(1));
        assert!(config.slots_per_slab() >= 1);
        assert_eq!(config.slab_bytes(), config.stride() * config.slots_per_slab());
    }
}
