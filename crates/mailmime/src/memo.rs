//! Compute-once cache cleared by mutation.

use std::sync::OnceLock;

/// Lazily computed value derived from fields of its owner.
///
/// Owners call [`Memo::invalidate`] from every setter that changes the
/// source fields. Backed by `OnceLock` so owners stay `Sync`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Memo<T>(OnceLock<T>);

impl<T> Memo<T> {
    pub(crate) const fn new() -> Self {
        Self(OnceLock::new())
    }

    pub(crate) fn get_or_compute(&self, compute: impl FnOnce() -> T) -> &T {
        self.0.get_or_init(compute)
    }

    pub(crate) fn invalidate(&mut self) {
        self.0.take();
    }
}
