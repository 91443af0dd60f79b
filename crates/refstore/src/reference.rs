//! Generation-tagged slot handles.
//!
//! A [`Ref`] packs two raw addresses: the slot's object bytes and the slot's
//! metadata record. The slot's 8-bit generation rides in the otherwise-unused
//! top byte of the object-address word, so the handle stays two words wide
//! and contains nothing a tracing collector could interpret as a pointer.
//!
//! The tag bits must be stripped before an address is handed out. Some
//! targets tolerate garbage in the high bits of an address, others fault, so
//! every accessor masks and a unit test pins the masking down.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem;

use crate::fault::{fail, Fault};
use crate::util::is_aligned;

const GEN_SHIFT: u32 = usize::BITS - 8;
const GEN_MASK: usize = 0xFF << GEN_SHIFT;
const ADDR_MASK: usize = !GEN_MASK;

/// Per-slot bookkeeping record, stored in a slab region disjoint from the
/// object bytes.
///
/// The zeroed state is meaningful: a slot whose metadata is all zero has
/// never been allocated (nil `next_free`, generation 0). Slab mappings come
/// back zero-initialised from the kernel, so freshly bumped slots need no
/// setup.
///
/// A slot is free iff `next_free` is non-nil. The free list terminates with
/// a self-link rather than nil, because nil `next_free` is what marks a slot
/// live.
#[repr(C)]
#[derive(Debug)]
pub(crate) struct SlotMeta {
    pub(crate) next_free: RawRef,
    pub(crate) gen: u8,
}

/// Untyped two-word handle to a slot.
///
/// Field layout: `tagged_obj` is the object address with the generation in
/// its top byte; `meta` is the untagged metadata address. All-zero is the
/// nil handle.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct RawRef {
    tagged_obj: usize,
    meta: usize,
}

impl RawRef {
    /// Handle to a slot at `obj_addr` with metadata at `meta_addr`, at
    /// generation 0. Panics with `NilConstruction` if either address is
    /// zero.
    pub(crate) fn new(obj_addr: usize, meta_addr: usize) -> RawRef {
        if obj_addr == 0 || meta_addr == 0 {
            fail(Fault::NilConstruction);
        }
        debug_assert!(obj_addr & GEN_MASK == 0, "object address uses tag bits");
        debug_assert!(is_aligned(meta_addr, mem::align_of::<SlotMeta>()));
        RawRef {
            tagged_obj: obj_addr,
            meta: meta_addr,
        }
    }

    pub(crate) const fn nil() -> RawRef {
        RawRef {
            tagged_obj: 0,
            meta: 0,
        }
    }

    #[inline]
    pub(crate) fn is_nil(&self) -> bool {
        self.tagged_obj == 0 && self.meta == 0
    }

    /// The generation this handle was issued at.
    #[inline]
    pub(crate) fn gen(&self) -> u8 {
        (self.tagged_obj >> GEN_SHIFT) as u8
    }

    #[inline]
    pub(crate) fn set_gen(&mut self, gen: u8) {
        self.tagged_obj = (self.tagged_obj & ADDR_MASK) | ((gen as usize) << GEN_SHIFT);
    }

    /// Object address with the tag stripped. No liveness check.
    #[inline]
    pub(crate) fn obj_addr(&self) -> usize {
        self.tagged_obj & ADDR_MASK
    }

    /// Metadata address. No liveness check.
    #[inline]
    pub(crate) fn meta_addr(&self) -> usize {
        self.meta
    }

    #[inline]
    pub(crate) fn meta_raw(&self) -> *mut SlotMeta {
        self.meta as *mut SlotMeta
    }

    /// Verify this handle still matches the slot's current generation.
    ///
    /// Reads only the target slot's metadata; nothing else in the store is
    /// touched, which is what keeps concurrent readers independent of the
    /// mutator.
    pub(crate) fn check_gen(&self) -> Result<(), Fault> {
        if self.is_nil() {
            return Err(Fault::NilReference);
        }
        let held = self.gen();
        let current = unsafe { (*self.meta_raw()).gen };
        if held != current {
            return Err(Fault::UseAfterFree { held, current });
        }
        Ok(())
    }

    /// Validated object address. Panics with `UseAfterFree` when stale.
    pub(crate) fn data_ptr(&self) -> *mut u8 {
        if let Err(fault) = self.check_gen() {
            fail(fault);
        }
        self.obj_addr() as *mut u8
    }

    /// Validated metadata address. Panics with `UseAfterFree` when stale.
    #[allow(dead_code)]
    pub(crate) fn meta_ptr(&self) -> *mut u8 {
        if let Err(fault) = self.check_gen() {
            fail(fault);
        }
        self.meta_addr() as *mut u8
    }

    /// Advance the slot's generation and return a handle carrying the new
    /// one. The current handle (and any copy of it) becomes stale.
    ///
    /// # Safety
    /// The caller must be the sole mutator of the store: this writes the
    /// slot's metadata, and a concurrent reader of the same slot would race.
    pub(crate) unsafe fn realloc(&self) -> RawRef {
        if let Err(fault) = self.check_gen() {
            fail(fault);
        }
        let meta = &mut *self.meta_raw();
        meta.gen = meta.gen.wrapping_add(1);
        let mut next = *self;
        next.set_gen(meta.gen);
        next
    }
}

/// Opaque handle to a live slot holding a `T`.
///
/// A `Ref` is a plain two-word value: it owns nothing, keeps nothing alive,
/// and can be copied and stored freely, including inside other store-managed
/// records (linked nodes, tree children, graph edges). The default value is
/// the nil handle.
///
/// A `Ref` is invalidated by [`Store::free`](crate::Store::free) and by
/// [`Store::realloc`](crate::Store::realloc); using it afterwards panics on
/// a best-effort basis via the generation tag.
#[must_use]
pub struct Ref<T> {
    raw: RawRef,
    _type: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    #[inline]
    pub(crate) fn from_raw(raw: RawRef) -> Ref<T> {
        Ref {
            raw,
            _type: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn raw(&self) -> RawRef {
        self.raw
    }

    /// True for the nil handle (all fields zero). Allocation never returns
    /// a nil `Ref`.
    #[inline]
    pub fn is_nil(&self) -> bool {
        self.raw.is_nil()
    }

    /// The 8-bit generation this handle was issued at.
    #[inline]
    pub fn gen(&self) -> u8 {
        self.raw.gen()
    }

    /// Validated pointer to the slot's object bytes.
    ///
    /// Panics with `UseAfterFree` if the slot has been freed or reallocated
    /// since this handle was issued. Writing through the pointer is only
    /// sound for the store's single mutator.
    pub fn data_ptr(&self) -> *mut T {
        self.raw.data_ptr() as *mut T
    }

    /// Advance the slot's generation and return a handle carrying the new
    /// one; `self` and every copy of it become stale.
    ///
    /// # Safety
    /// Mutates the slot's metadata through a `Copy` handle. The caller must
    /// be the store's sole mutator and no reader may hold this slot. The
    /// safe spelling is [`Store::realloc`](crate::Store::realloc).
    pub unsafe fn realloc(self) -> Ref<T> {
        Ref::from_raw(self.raw.realloc())
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Ref<T> {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> Default for Ref<T> {
    fn default() -> Ref<T> {
        Ref::from_raw(RawRef::nil())
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Ref<T>) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Ref<T> {}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("data", &(self.raw.obj_addr() as *const u8))
            .field("gen", &self.raw.gen())
            .finish()
    }
}
