use thiserror::Error;

/// Misuse detected by the store.
///
/// Every kind is a programmer error rather than a recoverable condition: the
/// store's entry points report them by panicking. The only `Result` surface
/// is [`Store::try_get`](crate::Store::try_get), for callers that want to
/// probe a reference without unwinding.
///
/// Use-after-free and double-free detection is best-effort. The generation
/// tag is 8 bits wide, so the 256th reuse of a slot produces a reference
/// indistinguishable from the original and a stale access escapes detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    /// A reference was constructed from a zero address.
    #[error("reference constructed from a nil address")]
    NilConstruction,
    /// A nil reference was dereferenced, freed, or reallocated.
    #[error("attempted to use a nil reference")]
    NilReference,
    /// The reference's generation no longer matches the slot's.
    #[error("use after free: reference holds generation {held}, slot is at generation {current}")]
    UseAfterFree { held: u8, current: u8 },
    /// The slot is already threaded onto the free list.
    #[error("double free: slot is already on the free list")]
    DoubleFree,
    /// The slab provider could not obtain backing storage.
    #[error("out of memory: failed to map {bytes} bytes for a new slab")]
    OutOfMemory { bytes: usize },
    /// The requested object layout cannot be honoured.
    #[error("invalid allocation config: object size {size}, alignment {align}")]
    InvalidConfig { size: usize, align: usize },
}

/// Panic with a diagnostic for unrecoverable misuse.
#[cold]
#[inline(never)]
pub(crate) fn fail(fault: Fault) -> ! {
    panic!("refstore: {fault}");
}
