//! Single-size-class pool: slab list, bump offset, and the free list.

use crate::fault::{fail, Fault};
use crate::layout::AllocConfig;
use crate::reference::RawRef;
use crate::slab::Slab;

/// Allocation counters for one pool (or the roll-up across pools).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Total allocations served.
    pub allocs: usize,
    /// Total frees accepted.
    pub frees: usize,
    /// Allocations that consumed a never-used slot.
    pub raw_allocs: usize,
    /// Currently live objects (`allocs - frees`).
    pub live: usize,
    /// Allocations served from the free list.
    pub reused: usize,
    /// Slabs mapped.
    pub chunks: usize,
}

/// Pool for one size class.
///
/// Freed slots thread a LIFO list through their metadata: `next_free` of the
/// last node links to itself, because a nil `next_free` is what marks a slot
/// live. The generation advances on free, so every reference issued before
/// a free mismatches for the next 255 reuses of that slot.
pub(crate) struct Pool {
    config: AllocConfig,
    slabs: Vec<Slab>,
    /// Next never-used slot in the last slab.
    offset: usize,
    free_root: RawRef,
    allocs: usize,
    frees: usize,
    reused: usize,
}

impl Pool {
    pub(crate) fn new(config: AllocConfig) -> Pool {
        tracing::debug!(
            size = config.object_size(),
            stride = config.stride(),
            slots = config.slots_per_slab(),
            "created pool"
        );
        Pool {
            config,
            slabs: Vec::new(),
            offset: 0,
            free_root: RawRef::nil(),
            allocs: 0,
            frees: 0,
            reused: 0,
        }
    }

    pub(crate) fn config(&self) -> AllocConfig {
        self.config
    }

    /// Hand out a slot: reuse the most recently freed one, else bump.
    pub(crate) fn alloc(&mut self) -> RawRef {
        self.allocs += 1;

        if self.free_root.is_nil() {
            self.alloc_from_offset()
        } else {
            self.reused += 1;
            self.alloc_from_free()
        }
    }

    fn alloc_from_free(&mut self) -> RawRef {
        let popped = self.free_root;

        let meta = unsafe { &mut *popped.meta_raw() };
        let next = meta.next_free;
        meta.next_free = RawRef::nil();

        // A self-link terminates the list.
        self.free_root = if next == popped { RawRef::nil() } else { next };

        // The slot's generation moved when it was freed; the handle stored
        // on the list still carries the one before that.
        let mut r = popped;
        r.set_gen(meta.gen);
        r
    }

    fn alloc_from_offset(&mut self) -> RawRef {
        if self.slabs.is_empty() || self.offset == self.config.slots_per_slab() {
            self.slabs.push(Slab::map(&self.config));
            self.offset = 0;
        }

        let slab = &self.slabs[self.slabs.len() - 1];
        let obj = slab.object_addr(self.config.stride(), self.offset);
        let meta = slab.meta_addr(self.offset);
        self.offset += 1;

        // Fresh metadata is zeroed, so the slot and the new handle agree on
        // generation 0.
        RawRef::new(obj, meta)
    }

    /// Return a slot to the pool. Panics with `DoubleFree` when the slot is
    /// already on the free list and `UseAfterFree` when the handle's
    /// generation is stale.
    pub(crate) fn free(&mut self, r: RawRef) {
        let meta = unsafe { &mut *r.meta_raw() };

        if !meta.next_free.is_nil() {
            fail(Fault::DoubleFree);
        }
        if r.gen() != meta.gen {
            fail(Fault::UseAfterFree {
                held: r.gen(),
                current: meta.gen,
            });
        }

        self.frees += 1;
        meta.gen = meta.gen.wrapping_add(1);

        meta.next_free = if self.free_root.is_nil() {
            r
        } else {
            self.free_root
        };
        self.free_root = r;
    }

    pub(crate) fn stats(&self) -> Stats {
        Stats {
            allocs: self.allocs,
            frees: self.frees,
            raw_allocs: self.allocs - self.reused,
            live: self.allocs - self.frees,
            reused: self.reused,
            chunks: self.slabs.len(),
        }
    }
}
