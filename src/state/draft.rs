//! Value snapshots with dirty tracking by equality.

/// A value together with the snapshot it was loaded from.
///
/// Dirtiness is decided by comparing values, so editing a value back to
/// its original makes the draft clean again.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Draft<T: Clone + PartialEq> {
    original: T,
    current: T,
}

impl<T: Clone + PartialEq> Draft<T> {
    pub fn new(value: T) -> Self {
        Draft {
            original: value.clone(),
            current: value,
        }
    }

    pub fn original(&self) -> &T {
        &self.original
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.current
    }

    pub fn set(&mut self, value: T) {
        self.current = value;
    }

    pub fn is_dirty(&self) -> bool {
        self.original != self.current
    }

    /// Accept the current value as the new snapshot.
    ///
    pub fn commit(&mut self) {
        self.original = self.current.clone();
    }

    /// Throw away edits since the last snapshot.
    ///
    pub fn revert(&mut self) {
        self.current = self.original.clone();
    }
}

impl<T: Clone + PartialEq + Default> Default for Draft<T> {
    fn default() -> Self {
        Draft::new(T::default())
    }
}
