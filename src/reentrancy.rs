//! Debug-only reentrancy check for multiset operations.
//!
//! While an operation runs, the only user code it calls is the container's
//! `HashEq`. If that code reaches back into the same container, the bucket
//! table may be observed half updated. Debug builds record the active
//! operation and panic on nested entry, naming both operations. Release
//! builds carry no state.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct OpTracker {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    _nosend: PhantomData<Cell<()>>,
}

impl OpTracker {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> OpGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.replace(Some(op)) {
                panic!("multiset reentered: `{op}` called while `{outer}` is in progress");
            }
            OpGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            OpGuard { _z: PhantomData }
        }
    }
}

pub(crate) struct OpGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OpTracker,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(None);
    }
}
