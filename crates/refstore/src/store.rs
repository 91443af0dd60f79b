//! Multi-type façade: one pool per allocated type, typed references out.

use std::alloc::Layout;
use std::any::TypeId;
use std::collections::HashMap;
use std::env;

use crate::fault::{fail, Fault};
use crate::layout::AllocConfig;
use crate::pool::{Pool, Stats};
use crate::reference::Ref;
use crate::util::DEFAULT_SLAB_BYTES;

/// Environment override for the slab byte-size hint.
const SLAB_BYTES_ENV: &str = "REFSTORE_SLAB_BYTES";

/// Typed arena-style object store.
///
/// Each distinct type allocated through the store gets its own pool, keyed
/// by a monotonically assigned index in first-use order. The type parameter
/// on [`Ref`] routes every free back to the pool that issued it, so two
/// types never share slots even when their layouts coincide.
///
/// All mutation (`alloc`, `free`, `realloc`, `get_mut`) goes through
/// `&mut self`; the read path (`get`, `try_get`) takes `&self` and touches
/// nothing but the target slot's metadata and object bytes. That split is
/// the whole concurrency story: build on one thread, publish the store (or
/// individual references) over a happens-before barrier, and read from as
/// many threads as you like. A free racing a dereference of the same slot
/// is a data race the generation tag does not defend against.
pub struct Store {
    slab_bytes: usize,
    pools: Vec<Pool>,
    index_by_type: HashMap<TypeId, usize>,
}

// The store owns raw slab mappings. Sending it moves sole mutation rights
// with it, and sharing `&Store` exposes only the read path, which never
// touches the pools. The typed API bounds every stored type by
// `Send + Sync`.
unsafe impl Send for Store {}
unsafe impl Sync for Store {}

impl Store {
    /// Store with the default slab-size hint, or the `REFSTORE_SLAB_BYTES`
    /// override when set.
    pub fn new() -> Store {
        let slab_bytes = env::var(SLAB_BYTES_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&bytes| bytes > 0)
            .unwrap_or(DEFAULT_SLAB_BYTES);
        Store::with_slab_bytes(slab_bytes)
    }

    /// Store whose pools target `slab_bytes` per slab object region.
    pub fn with_slab_bytes(slab_bytes: usize) -> Store {
        Store {
            slab_bytes,
            pools: Vec::new(),
            index_by_type: HashMap::new(),
        }
    }

    /// Allocate a slot for `value` and return its reference together with a
    /// view of the stored value.
    ///
    /// The view borrows the store, so it cannot outlive the next store
    /// mutation. The store never drops stored values: freeing a slot
    /// recycles the bytes, nothing more, so `T` should be a plain-data
    /// record.
    pub fn alloc<T: Send + Sync + 'static>(&mut self, value: T) -> (Ref<T>, &mut T) {
        let index = self.pool_index::<T>();
        let raw = self.pools[index].alloc();

        let object = raw.obj_addr() as *mut T;
        unsafe { object.write(value) };
        (Ref::from_raw(raw), unsafe { &mut *object })
    }

    /// Shared view of the object behind `r`.
    ///
    /// Panics with `UseAfterFree` when `r` is stale, `NilReference` when it
    /// is nil.
    pub fn get<T: Send + Sync + 'static>(&self, r: Ref<T>) -> &T {
        match self.try_get(r) {
            Ok(object) => object,
            Err(fault) => fail(fault),
        }
    }

    /// Non-panicking variant of [`get`](Store::get).
    pub fn try_get<T: Send + Sync + 'static>(&self, r: Ref<T>) -> Result<&T, Fault> {
        r.raw().check_gen()?;
        Ok(unsafe { &*(r.raw().obj_addr() as *const T) })
    }

    /// Exclusive view of the object behind `r`. Same panics as
    /// [`get`](Store::get).
    pub fn get_mut<T: Send + Sync + 'static>(&mut self, r: Ref<T>) -> &mut T {
        if let Err(fault) = r.raw().check_gen() {
            fail(fault);
        }
        unsafe { &mut *(r.raw().obj_addr() as *mut T) }
    }

    /// Return `r`'s slot to its pool and advance the slot's generation,
    /// staling every copy of `r`.
    ///
    /// Panics with `DoubleFree` when the slot is already free and
    /// `UseAfterFree` when `r` is stale.
    pub fn free<T: Send + Sync + 'static>(&mut self, r: Ref<T>) {
        if r.is_nil() {
            fail(Fault::NilReference);
        }
        let index = match self.index_by_type.get(&TypeId::of::<T>()) {
            Some(&index) => index,
            None => panic!("refstore: freed a reference issued by a different store"),
        };
        self.pools[index].free(r.raw());
    }

    /// Reissue `r` at the slot's next generation; `r` and every copy of it
    /// become stale while the slot stays live.
    pub fn realloc<T: Send + Sync + 'static>(&mut self, r: Ref<T>) -> Ref<T> {
        if r.is_nil() {
            fail(Fault::NilReference);
        }
        // &mut self makes this the only mutation in flight.
        unsafe { r.realloc() }
    }

    /// Counter roll-up across all pools.
    pub fn stats(&self) -> Stats {
        let mut total = Stats::default();
        for pool in &self.pools {
            let s = pool.stats();
            total.allocs += s.allocs;
            total.frees += s.frees;
            total.raw_allocs += s.raw_allocs;
            total.live += s.live;
            total.reused += s.reused;
            total.chunks += s.chunks;
        }
        total
    }

    /// Per-pool counters, in type-index order.
    pub fn pool_stats(&self) -> Vec<Stats> {
        self.pools.iter().map(Pool::stats).collect()
    }

    /// Per-pool layouts, in type-index order.
    pub fn allocation_configs(&self) -> Vec<AllocConfig> {
        self.pools.iter().map(Pool::config).collect()
    }

    /// Layout of `T`'s pool, if `T` has been allocated here.
    pub fn config_for<T: Send + Sync + 'static>(&self) -> Option<AllocConfig> {
        self.index_by_type
            .get(&TypeId::of::<T>())
            .map(|&index| self.pools[index].config())
    }

    fn pool_index<T: Send + Sync + 'static>(&mut self) -> usize {
        if let Some(&index) = self.index_by_type.get(&TypeId::of::<T>()) {
            return index;
        }

        let layout = Layout::new::<T>();
        let config = AllocConfig::new(layout.size(), layout.align(), self.slab_bytes);
        let index = self.pools.len();
        self.pools.push(Pool::new(config));
        self.index_by_type.insert(TypeId::of::<T>(), index);
        index
    }
}

impl Default for Store {
    fn default() -> Store {
        Store::new()
    }
}
