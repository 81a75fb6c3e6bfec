use std::cell::UnsafeCell;
use std::mem;
use std::slice;
use std::str;

/// Default capacity of the batching buffer in bytes.
///
/// After trying various buffer sizes on ListUnits, a 4KB buffer showed the
/// best bytes-per-op in a benchmark decoding a 35KB message.
pub(crate) const DEFAULT_CONVERTER_SIZE: usize = 4096;

/// Converter of byte slices into immutable strings with few allocations.
///
/// Decoded strings are batched into a fixed-capacity chunk, so for example
/// ten 4-byte strings written through a 40-byte chunk cost one allocation
/// instead of ten. A full chunk is retired, not freed: returned references
/// keep pointing into it until [`StrConverter::reset`], which requires
/// exclusive access and therefore proves no returned string is still
/// borrowed.
pub(crate) struct StrConverter {
    inner: UnsafeCell<Chunks>,
}

struct Chunks {
    /// Chunk the next string is appended to. Never reallocated in place;
    /// see `convert` for the growth rule.
    chunk: Vec<u8>,
    /// Filled or oversized chunks still referenced by returned strings.
    retired: Vec<Vec<u8>>,
    cap: usize,
}

impl StrConverter {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            inner: UnsafeCell::new(Chunks {
                chunk: Vec::with_capacity(cap),
                retired: Vec::new(),
                cap,
            }),
        }
    }

    /// Copy `s` into the current chunk and return it as a string borrowed
    /// from the converter. The reference stays valid until `reset`.
    pub(crate) fn convert<'a>(&'a self, s: &str) -> &'a str {
        if s.is_empty() {
            return "";
        }

        // SAFETY: The mutable borrow is confined to this call; `convert`
        // never hands out references to the `Chunks` struct itself, only
        // into heap buffers it owns, and those buffers are neither moved
        // nor shrunk until `reset` takes `&mut self`.
        let inner = unsafe { &mut *self.inner.get() };

        let bytes = s.as_bytes();

        // Too large to batch: give it a chunk of its own.
        if bytes.len() > inner.cap {
            inner.retired.push(bytes.to_vec());
            let stored = inner.retired.last().map(Vec::as_slice).unwrap_or_default();
            // SAFETY: `stored` points into a retired heap buffer which is
            // kept alive until `reset`; the bytes come from a valid `&str`.
            return unsafe { prolong(stored) };
        }

        // The chunk would have to reallocate, which would move bytes that
        // returned strings still point at. Retire it and start a new one.
        if inner.chunk.len() + bytes.len() > inner.cap {
            let full = mem::replace(&mut inner.chunk, Vec::with_capacity(inner.cap));
            inner.retired.push(full);
        }

        let start = inner.chunk.len();
        inner.chunk.extend_from_slice(bytes);

        // SAFETY: Capacity was checked above, so `extend_from_slice` did
        // not reallocate and the bytes stay put until `reset`.
        unsafe { prolong(&inner.chunk[start..]) }
    }

    /// Discard all batched strings. Requiring `&mut self` guarantees no
    /// string returned by [`StrConverter::convert`] outlives the data it
    /// points at.
    pub(crate) fn reset(&mut self) {
        let inner = self.inner.get_mut();
        inner.chunk.clear();
        inner.retired.clear();
    }
}

/// Detach a stored byte range from the borrow of `Chunks` it was obtained
/// through, re-tying it to the lifetime of the converter itself.
///
/// # Safety
///
/// The caller must guarantee the range is not moved or freed for as long as
/// the converter is only accessed through shared references, and that the
/// bytes form valid UTF-8.
unsafe fn prolong<'a>(bytes: &[u8]) -> &'a str {
    str::from_utf8_unchecked(slice::from_raw_parts(bytes.as_ptr(), bytes.len()))
}
