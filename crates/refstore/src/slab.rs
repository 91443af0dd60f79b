//! One mapped region per slab, carved into parallel slot arrays.

use core::mem;

use crate::fault::{fail, Fault};
use crate::layout::AllocConfig;
use crate::platform;
use crate::reference::SlotMeta;
use crate::util::{align_up, PAGE_SIZE};

/// A single mapping holding the object region followed by the metadata
/// region. Slot `i`'s object bytes and metadata record live at the same
/// index in the two regions; pointers for a slot must never mix slabs.
///
/// The mapping is never unmapped or moved: every address handed out from a
/// slab stays valid for the process lifetime, which is what lets readers
/// dereference while the mutator appends new slabs. Dropping the owning
/// store leaks the mappings by design.
pub(crate) struct Slab {
    objects: *mut u8,
    meta: *mut SlotMeta,
}

impl Slab {
    /// Map a fresh zero-initialised slab for `config`. Panics with
    /// `OutOfMemory` when backing storage cannot be obtained.
    pub(crate) fn map(config: &AllocConfig) -> Slab {
        let meta_offset = align_up(config.slab_bytes(), mem::align_of::<SlotMeta>());
        let total = align_up(meta_offset + config.meta_region_bytes(), PAGE_SIZE);

        let base = unsafe { platform::map_anonymous(total) };
        if base.is_null() {
            fail(Fault::OutOfMemory { bytes: total });
        }
        tracing::debug!(
            bytes = total,
            slots = config.slots_per_slab(),
            stride = config.stride(),
            "mapped slab"
        );

        // The base is page-aligned and the stride is a multiple of the
        // object alignment, so every slot start is aligned. The metadata
        // region is already zeroed into its meaningful initial state.
        Slab {
            objects: base,
            meta: unsafe { base.add(meta_offset) } as *mut SlotMeta,
        }
    }

    /// Address of slot `slot`'s object bytes.
    #[inline]
    pub(crate) fn object_addr(&self, stride: usize, slot: usize) -> usize {
        self.objects as usize + slot * stride
    }

    /// Address of slot `slot`'s metadata record.
    #[inline]
    pub(crate) fn meta_addr(&self, slot: usize) -> usize {
        self.meta as usize + slot * mem::size_of::<SlotMeta>()
    }
}
