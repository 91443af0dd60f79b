use core::ptr;

// Windows is stubbed: every mapping request reports exhaustion until a
// VirtualAlloc-backed implementation lands.

pub unsafe fn map_anonymous(_size: usize) -> *mut u8 {
    ptr::null_mut() // TODO: VirtualAlloc(MEM_RESERVE | MEM_COMMIT)
}
