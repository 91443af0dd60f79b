//! Slab-backed typed object store with generation-tagged references.
//!
//! A [`Store`] holds large populations of small fixed-size records in
//! mmap-backed slabs and hands out [`Ref`] handles instead of pointers. A
//! `Ref` is a plain two-word value; nothing in it is a pointer a tracing
//! collector (or anything else walking the heap) would follow. Records can
//! link to each other through `Ref` fields and form trees, graphs, and
//! caches of arbitrary size at zero scanning cost.
//!
//! Freed slots are recycled through a per-size-class free list. Every slot
//! carries an 8-bit generation that advances on free, and every handle
//! embeds the generation it was issued at, so stale handles are caught on a
//! best-effort basis: a use-after-free or double-free panics unless the slot
//! has been reused exactly a multiple of 256 times.
//!
//! ```
//! use refstore::{Ref, Store};
//!
//! #[derive(Clone, Copy, Default)]
//! struct Node {
//!     value: u64,
//!     next: Ref<Node>,
//! }
//!
//! let mut store = Store::new();
//! let (tail, _) = store.alloc(Node { value: 2, next: Ref::default() });
//! let (head, _) = store.alloc(Node { value: 1, next: tail });
//!
//! assert_eq!(store.get(head).value, 1);
//! let next = store.get(head).next;
//! assert_eq!(store.get(next).value, 2);
//!
//! store.free(head);
//! store.free(tail);
//! assert_eq!(store.stats().live, 0);
//! ```
//!
//! # Memory model
//!
//! The store has no internal concurrency control: no locks, no atomics. The
//! borrow checker enforces a single mutator (`alloc`, `free`, `realloc`, and
//! `get_mut` take `&mut Store`), and the read path (`get`, `try_get`) reads
//! only the target slot's metadata and object bytes. Supported patterns:
//!
//! 1. Build a structure, publish the store over a happens-before barrier,
//!    then read from any number of threads.
//! 2. A single writer may keep allocating and publish new references while
//!    readers dereference previously published ones: slabs never move once
//!    mapped, and the read path touches no counter the writer updates.
//! 3. Only the writer frees, and it must ensure no reader still holds the
//!    reference being freed. A free racing a dereference of the same slot is
//!    a data race the generation tag does not prevent.
//!
//! Slab memory is never returned to the OS; dropping a `Store` leaks its
//! mappings, so a reference that outlives its store can never reach
//! unmapped pages.

pub mod fault;
pub mod layout;
pub mod reference;
pub mod store;

mod platform;
mod pool;
mod slab;
mod util;

pub use fault::Fault;
pub use layout::AllocConfig;
pub use pool::Stats;
pub use reference::Ref;
pub use store::Store;
