use crate::error::StowError;
use log::debug;
use std::{fmt, mem::MaybeUninit, ptr, slice};

/// Fixed capacity container over inline, pre-sized storage.
///
/// This is the compile-time evaluable rendition of the bounded arena: the
/// whole container is usable in `const` contexts through `new`/`push`/`len`,
/// and exceeding the declared maximum during constant evaluation fails the
/// build instead of truncating.
///
/// For a bounded strategy behind the [`RawAlloc`](crate::alloc::RawAlloc)
/// interface see [`Bounded`](crate::alloc::Bounded); trait methods can't be
/// dispatched in const contexts, so the const capable pairing of container
/// and storage is this concrete type.
///
/// ```
/// use stow::ArenaVec;
///
/// const fn lookup_table() -> ArenaVec<u32, 4> {
///     let mut table = ArenaVec::new();
///     table.push(1);
///     table.push(10);
///     table.push(100);
///     table
/// }
///
/// const TABLE: ArenaVec<u32, 4> = lookup_table();
/// assert_eq!(TABLE.len(), 3);
/// ```
///
/// Overflowing the arena in constant evaluation is a compile error:
///
/// ```compile_fail
/// use stow::ArenaVec;
///
/// const fn overfull() -> ArenaVec<u32, 2> {
///     let mut vec = ArenaVec::new();
///     vec.push(1);
///     vec.push(2);
///     vec.push(3);
///     vec
/// }
///
/// const VEC: ArenaVec<u32, 2> = overfull();
/// ```
pub struct ArenaVec<T, const N: usize> {
    buf: [MaybeUninit<T>; N],
    len: usize,
}

impl<T, const N: usize> ArenaVec<T, N> {
    /// Empty arena. The storage is inline, nothing is allocated ever.
    pub const fn new() -> Self {
        Self {
            buf: [const { MaybeUninit::uninit() }; N],
            len: 0,
        }
    }

    /// Arena holding all elements of `array`.
    pub fn from_array(array: [T; N]) -> Self {
        Self {
            buf: array.map(MaybeUninit::new),
            len: N,
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Appends an element.
    ///
    /// Panics when the arena is full. In a constant evaluation context the
    /// panic surfaces as a build failure, never as silent truncation. For a
    /// runtime recoverable variant use [`ArenaVec::try_push`].
    pub const fn push(&mut self, value: T) {
        assert!(self.len < N, "Arena capacity exceeded");
        self.buf[self.len] = MaybeUninit::new(value);
        self.len += 1;
    }

    /// Appends an element, failing with
    /// [`StowError::CapacityExceeded`] when the arena is full.
    pub fn try_push(&mut self, value: T) -> Result<(), StowError> {
        if self.len == N {
            return Err(StowError::capacity_exceeded(self.len + 1, N));
        }
        self.buf[self.len] = MaybeUninit::new(value);
        self.len += 1;
        Ok(())
    }

    /// Moves the last element out, None when empty.
    pub fn pop(&mut self) -> Option<T> {
        let len = self.len.checked_sub(1)?;
        self.len = len;
        // This is safe since it was initialized according to len.
        Some(unsafe { self.buf[len].assume_init_read() })
    }

    /// Checked access, the only validating accessor.
    pub fn at(&self, index: usize) -> Result<&T, StowError> {
        self.as_slice()
            .get(index)
            .ok_or(StowError::out_of_bounds(index, self.len))
    }

    /// Checked mutable access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, StowError> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(StowError::out_of_bounds(index, len))
    }

    /// Three cases of the growable container, with the growth case bounded
    /// by `N` instead of a reallocation.
    pub fn resize(&mut self, new_len: usize) -> Result<(), StowError>
    where
        T: Default,
    {
        if new_len > N {
            return Err(StowError::capacity_exceeded(new_len, N));
        }
        if new_len < self.len {
            self.truncate(new_len);
        } else {
            while self.len < new_len {
                self.buf[self.len] = MaybeUninit::new(T::default());
                self.len += 1;
            }
        }
        Ok(())
    }

    /// Destroys elements `[new_len, len)` in reverse index order.
    pub fn truncate(&mut self, new_len: usize) {
        while self.len > new_len {
            self.len -= 1;
            // This is safe since the slot held a live element.
            unsafe { ptr::drop_in_place(self.buf[self.len].as_mut_ptr()) };
        }
    }

    /// Destroys all elements.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    pub fn as_slice(&self) -> &[T] {
        // This is safe since the first len slots are initialized.
        unsafe { slice::from_raw_parts(self.buf.as_ptr() as *const T, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // This is safe since the first len slots are initialized.
        unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr() as *mut T, self.len) }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, const N: usize> Drop for ArenaVec<T, N> {
    fn drop(&mut self) {
        if self.len > 0 {
            debug!("Dropping arena with {} live elements", self.len);
        }
        // Reverse index order, same as the growable container.
        self.truncate(0);
    }
}

impl<T: Clone, const N: usize> Clone for ArenaVec<T, N> {
    fn clone(&self) -> Self {
        let mut new = Self::new();
        for value in self.iter() {
            // Counting len up one at a time keeps new valid for drop if a
            // clone panics.
            new.buf[new.len] = MaybeUninit::new(value.clone());
            new.len += 1;
        }
        new
    }
}

impl<T, const N: usize> Default for ArenaVec<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq, const N: usize> Eq for ArenaVec<T, N> {}

impl<T: PartialEq, const N: usize> PartialEq for ArenaVec<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for ArenaVec<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for e in self.iter() {
            write!(f, "{:?}, ", e)?;
        }
        write!(f, "]")
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a ArenaVec<T, N> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}
