//! Shared-ownership wrapper for mutable container values.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// A single-threaded shared handle for reference-counted interior mutability.
///
/// This type wraps `Rc<RefCell<T>>` and enforces that all container
/// allocations go through the `Heap::new()` factory method. Two clones of a
/// `Heap` alias the same allocation, which is what gives assignment specs
/// their mutate-in-place semantics: writing through one handle is visible
/// through every other handle to the same container.
///
/// # Thread Safety
/// `Heap<T>` is NOT thread-safe. Evaluation is strictly single-threaded, so
/// `Rc` is used instead of `Arc`.
#[repr(transparent)]
pub struct Heap<T>(Rc<RefCell<T>>);

impl<T> Heap<T> {
    /// Create a new `Heap` wrapping the given value.
    #[inline]
    pub fn new(value: T) -> Self {
        Heap(Rc::new(RefCell::new(value)))
    }

    /// Borrow the inner value immutably.
    #[inline]
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    /// Borrow the inner value mutably.
    #[inline]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether two handles alias the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Stable address of the allocation, used for identity-based bookkeeping
    /// (cycle detection during deep star expansion).
    #[inline]
    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0).cast()
    }

    /// Create a non-owning handle to this allocation.
    ///
    /// Used for back-references in linked structures (a scope's parent
    /// pointer) so that reference cycles cannot form.
    #[inline]
    pub fn downgrade(&self) -> WeakHeap<T> {
        WeakHeap(Rc::downgrade(&self.0))
    }
}

/// Non-owning counterpart of [`Heap`].
pub struct WeakHeap<T>(std::rc::Weak<RefCell<T>>);

impl<T> WeakHeap<T> {
    /// Attempt to upgrade to an owning handle.
    #[inline]
    pub fn upgrade(&self) -> Option<Heap<T>> {
        self.0.upgrade().map(Heap)
    }
}

impl<T> Clone for WeakHeap<T> {
    #[inline]
    fn clone(&self) -> Self {
        WeakHeap(self.0.clone())
    }
}

impl<T> fmt::Debug for WeakHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakHeap(..)")
    }
}

impl<T> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Heap").field(&self.0).finish()
    }
}

impl<T: Default> Default for Heap<T> {
    fn default() -> Self {
        Heap::new(T::default())
    }
}

impl<T> Deref for Heap<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_borrow() {
        let h = Heap::new(42);
        assert_eq!(*h.borrow(), 42);
    }

    #[test]
    fn borrow_mut_mutates() {
        let h = Heap::new(vec![1, 2, 3]);
        h.borrow_mut().push(4);
        assert_eq!(*h.borrow(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn clone_aliases_same_allocation() {
        let a = Heap::new(1);
        let b = a.clone();
        *a.borrow_mut() = 7;
        assert_eq!(*b.borrow(), 7);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn separate_allocations_are_not_aliased() {
        let a = Heap::new(1);
        let b = Heap::new(1);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn weak_handle_upgrades_while_alive() {
        let a = Heap::new(5);
        let w = a.downgrade();
        assert_eq!(w.upgrade().map(|h| *h.borrow()), Some(5));
        drop(a);
        assert!(w.upgrade().is_none());
    }
}
