//! Typed GPU object handles
//!
//! Handles are non-zero by construction, so a live handle can never be the
//! "null object" of the underlying API.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Object kind, used in diagnostics
            pub const KIND: &'static str = $kind;

            pub fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl From<NonZeroU32> for $name {
            fn from(raw: NonZeroU32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

gpu_handle!(
    /// Compiled shader stage
    StageId,
    "stage"
);
gpu_handle!(
    /// Linked shader program
    ProgramId,
    "program"
);
gpu_handle!(
    /// Vertex or element buffer
    BufferId,
    "buffer"
);
gpu_handle!(
    /// Vertex array (buffer-to-attribute binding)
    VertexArrayId,
    "vertex array"
);

/// Slot table mapping handles to backend objects
///
/// Ids are never reused within one table.
pub(crate) struct HandleTable<H, T> {
    next: u32,
    slots: HashMap<H, T>,
}

impl<H, T> HandleTable<H, T>
where
    H: Copy + Eq + std::hash::Hash + From<NonZeroU32>,
{
    pub(crate) fn new() -> Self {
        Self {
            next: 1,
            slots: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> H {
        let raw = NonZeroU32::new(self.next).unwrap_or(NonZeroU32::MIN);
        self.next = self.next.wrapping_add(1).max(1);
        let handle = H::from(raw);
        self.slots.insert(handle, value);
        handle
    }

    pub(crate) fn get(&self, handle: H) -> Option<&T> {
        self.slots.get(&handle)
    }

    pub(crate) fn remove(&mut self, handle: H) -> Option<T> {
        self.slots.remove(&handle)
    }

    pub(crate) fn contains(&self, handle: H) -> bool {
        self.slots.contains_key(&handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
