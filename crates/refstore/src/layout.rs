use core::mem;

use crate::fault::{fail, Fault};
use crate::reference::SlotMeta;
use crate::util::{align_up, PAGE_SIZE};

/// Storage layout for one size class.
///
/// Derived once from an object size, its alignment, and a slab byte-size
/// hint; immutable afterwards. Every slab of the size class is carved with
/// the same stride and slot count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocConfig {
    object_size: usize,
    align: usize,
    stride: usize,
    slots_per_slab: usize,
}

impl AllocConfig {
    /// Derive the layout for objects of `object_size` bytes aligned to
    /// `align`, packing slots into slabs of roughly `slab_hint` bytes.
    ///
    /// Zero-sized objects are given a one-byte stride so that every slot
    /// still has a distinct address and the free-list link convention holds.
    ///
    /// Panics with `InvalidConfig` when `align` is zero, not a power of two,
    /// or larger than the page size (a page-aligned slab base cannot
    /// guarantee more).
    pub fn new(object_size: usize, align: usize, slab_hint: usize) -> AllocConfig {
        if align == 0 || !align.is_power_of_two() || align > PAGE_SIZE {
            fail(Fault::InvalidConfig {
                size: object_size,
                align,
            });
        }

        let stride = align_up(object_size.max(1), align).max(align);
        let slots_per_slab = (slab_hint / stride).max(1);

        AllocConfig {
            object_size,
            align,
            stride,
            slots_per_slab,
        }
    }

    /// Requested object size in bytes.
    #[inline]
    pub fn object_size(&self) -> usize {
        self.object_size
    }

    /// Object alignment in bytes.
    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }

    /// Distance between consecutive slot starts in the object region.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of slots carved out of each slab.
    #[inline]
    pub fn slots_per_slab(&self) -> usize {
        self.slots_per_slab
    }

    /// Byte size of a slab's object region.
    #[inline]
    pub fn slab_bytes(&self) -> usize {
        self.stride * self.slots_per_slab
    }

    /// Byte size of a slab's metadata region.
    #[inline]
    pub(crate) fn meta_region_bytes(&self) -> usize {
        self.slots_per_slab * mem::size_of::<SlotMeta>()
    }
}
