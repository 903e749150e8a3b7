use crate::{
    alloc::{Heap, RawAlloc},
    error::StowError,
};
use log::debug;
use std::{fmt, marker::PhantomData, mem, ptr, ptr::NonNull, slice};

/// A growable contiguous container parameterized by allocation strategy.
///
/// Slots `[0, len)` hold live elements, slots `[len, cap)` are raw storage.
/// The buffer is dangling iff `cap == 0`. Capacity grows by roughly 1.5x per
/// step and never shrinks implicitly, only [`Vector::shrink_to_fit`] reduces
/// it.
///
/// Access comes in two families and the asymmetry is deliberate:
/// [`Vector::at`] is the only checked accessor, everything else
/// (`at_unchecked`, `front`, `back`) is an unchecked caller contract.
pub struct Vector<T, A: RawAlloc<T> = Heap> {
    buf: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: A,
    _data: PhantomData<T>,
}

impl<T> Vector<T> {
    /// Empty container, no allocation.
    pub fn new() -> Self {
        Self::new_in(Heap)
    }

    /// Container with `len` default constructed elements.
    pub fn with_len(len: usize) -> Result<Self, StowError>
    where
        T: Default,
    {
        let mut vec = Self::new();
        vec.resize(len)?;
        Ok(vec)
    }

    /// Container owning the elements of `array`, capacity exactly `N`.
    pub fn from_array<const N: usize>(array: [T; N]) -> Result<Self, StowError> {
        let mut vec = Self::new();
        vec.assign_array(array)?;
        Ok(vec)
    }

    /// Container cloned from `values`, capacity exactly `values.len()`.
    pub fn from_slice(values: &[T]) -> Result<Self, StowError>
    where
        T: Clone,
    {
        let mut vec = Self::new();
        vec.assign(values)?;
        Ok(vec)
    }
}

impl<T, A: RawAlloc<T>> Vector<T, A> {
    /// Empty container using the given strategy instance.
    pub fn new_in(alloc: A) -> Self {
        Self {
            buf: NonNull::dangling(),
            len: 0,
            cap: 0,
            alloc,
            _data: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_ptr()
    }

    pub fn as_slice(&self) -> &[T] {
        // This is safe since the first len slots are initialized.
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // This is safe since the first len slots are initialized.
        unsafe { slice::from_raw_parts_mut(self.buf.as_ptr(), self.len) }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.as_mut_slice().iter_mut()
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

    /// # Safety
    /// `index` must be within the live prefix, `index < len`.
    pub unsafe fn at_unchecked(&self, index: usize) -> &T {
        &*self.buf.as_ptr().add(index)
    }

    /// # Safety
    /// `index` must be within the live prefix, `index < len`.
    pub unsafe fn at_unchecked_mut(&mut self, index: usize) -> &mut T {
        &mut *self.buf.as_ptr().add(index)
    }

    /// # Safety
    /// The container must not be empty.
    pub unsafe fn front(&self) -> &T {
        self.at_unchecked(0)
    }

    /// # Safety
    /// The container must not be empty.
    pub unsafe fn front_mut(&mut self) -> &mut T {
        self.at_unchecked_mut(0)
    }

    /// # Safety
    /// The container must not be empty.
    pub unsafe fn back(&self) -> &T {
        self.at_unchecked(self.len - 1)
    }

    /// # Safety
    /// The container must not be empty.
    pub unsafe fn back_mut(&mut self) -> &mut T {
        self.at_unchecked_mut(self.len - 1)
    }

    /// Ensures capacity for at least `min_capacity` elements.
    ///
    /// No-op when capacity already suffices. Otherwise grows by repeated
    /// `c += (c + 1) / 2` steps, relocates the live prefix into the new
    /// buffer and releases the old one. On failure the container is left
    /// exactly as it was.
    pub fn reserve(&mut self, min_capacity: usize) -> Result<(), StowError> {
        if min_capacity <= self.cap {
            return Ok(());
        }
        if let Some(max) = A::MAX {
            if min_capacity > max {
                return Err(StowError::capacity_exceeded(min_capacity, max));
            }
        }

        let new_cap = Self::grown_capacity(self.cap, min_capacity);
        debug!("Growing capacity {} -> {}", self.cap, new_cap);
        self.reallocate(new_cap)
    }

    /// Smallest capacity reachable from `cap` by 1.5x steps that fits
    /// `min_capacity`, clamped to the strategy bound when there is one.
    fn grown_capacity(cap: usize, min_capacity: usize) -> usize {
        // To handle cap == 0 case
        let mut new = cap.max(1);
        while new < min_capacity {
            // (new + 1) / 2 without the possible overflow on new + 1.
            new = new.saturating_add(new / 2 + (new & 1));
        }
        match A::MAX {
            Some(max) if max >= min_capacity => new.min(max),
            _ => new,
        }
    }

    /// Three cases: grow over capacity (reserve + default construct), grow
    /// in place (default construct, no reallocation), shrink (destroy the
    /// tail in reverse order, capacity untouched).
    pub fn resize(&mut self, new_len: usize) -> Result<(), StowError>
    where
        T: Default,
    {
        if new_len > self.cap {
            self.reserve(new_len)?;
        }
        if new_len < self.len {
            self.truncate(new_len);
        } else {
            while self.len < new_len {
                // This is safe since capacity now covers new_len.
                unsafe { ptr::write(self.buf.as_ptr().add(self.len), T::default()) };
                self.len += 1;
            }
        }
        Ok(())
    }

    /// The only path that reduces capacity. Empty containers release the
    /// buffer entirely, otherwise the buffer is reallocated to exactly `len`.
    pub fn shrink_to_fit(&mut self) -> Result<(), StowError> {
        if self.len == 0 {
            // This is safe since buf came from this strategy.
            unsafe { self.release_buf() };
            self.buf = NonNull::dangling();
            self.cap = 0;
            Ok(())
        } else if self.len < self.cap {
            debug!("Shrinking capacity {} -> {}", self.cap, self.len);
            self.reallocate(self.len)
        } else {
            Ok(())
        }
    }

    /// Appends an element, growing if needed. Amortized O(1).
    pub fn push(&mut self, value: T) -> Result<(), StowError> {
        self.reserve(self.len + 1)?;
        // This is safe since reserve made room past the live prefix.
        unsafe { ptr::write(self.buf.as_ptr().add(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Moves the last element out, None when empty.
    pub fn pop(&mut self) -> Option<T> {
        let len = self.len.checked_sub(1)?;
        self.len = len;
        // This is safe since it was initialized according to len.
        Some(unsafe { ptr::read(self.buf.as_ptr().add(len)) })
    }

    /// Destroys elements `[new_len, len)` in reverse index order.
    /// No-op when `new_len >= len`. Capacity is untouched.
    pub fn truncate(&mut self, new_len: usize) {
        while self.len > new_len {
            self.len -= 1;
            // This is safe since the slot held a live element.
            unsafe { ptr::drop_in_place(self.buf.as_ptr().add(self.len)) };
        }
    }

    /// Destroys all elements, keeps capacity.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Replaces the contents with clones of `values`.
    ///
    /// When existing capacity suffices the buffer is reused: the overlap is
    /// overwritten via assignment, then the tail is either destroyed or
    /// clone constructed. Otherwise a fresh buffer of exactly `values.len()`
    /// is populated before the old contents are released, so a failure
    /// leaves the container unchanged.
    pub fn assign(&mut self, values: &[T]) -> Result<(), StowError>
    where
        T: Clone,
    {
        if self.cap < values.len() {
            let new_cap = values.len();
            let new_buf = self.alloc.allocate(new_cap)?;
            let mut guard = FillGuard {
                buf: new_buf,
                cap: new_cap,
                len: 0,
                alloc: &mut self.alloc,
            };
            for value in values {
                // This is safe since the fresh buffer holds new_cap slots.
                unsafe { ptr::write(guard.buf.as_ptr().add(guard.len), value.clone()) };
                guard.len += 1;
            }
            mem::forget(guard);

            self.clear();
            // This is safe since the old buf came from this strategy.
            unsafe { self.release_buf() };
            self.buf = new_buf;
            self.cap = new_cap;
            self.len = new_cap;
        } else {
            let overlap = self.len.min(values.len());
            for (slot, value) in self.as_mut_slice()[..overlap].iter_mut().zip(values) {
                // Assignment, not construction.
                slot.clone_from(value);
            }
            if self.len > values.len() {
                self.truncate(values.len());
            } else {
                for value in &values[self.len..] {
                    // This is safe since capacity covers values.len().
                    unsafe { ptr::write(self.buf.as_ptr().add(self.len), value.clone()) };
                    self.len += 1;
                }
            }
        }
        Ok(())
    }

    /// Replaces the contents with the elements of `array`, moving them in.
    /// Same two branch protocol as [`Vector::assign`] with `N` in the role
    /// of the source length.
    pub fn assign_array<const N: usize>(&mut self, array: [T; N]) -> Result<(), StowError> {
        let mut values = array.into_iter();
        if self.cap < N {
            let new_buf = self.alloc.allocate(N)?;
            let mut guard = FillGuard {
                buf: new_buf,
                cap: N,
                len: 0,
                alloc: &mut self.alloc,
            };
            for value in &mut values {
                // This is safe since the fresh buffer holds N slots.
                unsafe { ptr::write(guard.buf.as_ptr().add(guard.len), value) };
                guard.len += 1;
            }
            mem::forget(guard);

            self.clear();
            // This is safe since the old buf came from this strategy.
            unsafe { self.release_buf() };
            self.buf = new_buf;
            self.cap = N;
            self.len = N;
        } else {
            let overlap = self.len.min(N);
            for i in 0..overlap {
                let value = values.next().expect("Overlap is within N");
                // Assignment, the old element is dropped in place.
                // This is safe since index i is within the live prefix.
                unsafe { *self.buf.as_ptr().add(i) = value };
            }
            if self.len > N {
                self.truncate(N);
            } else {
                for value in values {
                    // This is safe since capacity covers N.
                    unsafe { ptr::write(self.buf.as_ptr().add(self.len), value) };
                    self.len += 1;
                }
            }
        }
        Ok(())
    }

    /// Deep copy with a fresh buffer sized to this container's capacity.
    pub fn try_clone(&self) -> Result<Self, StowError>
    where
        T: Clone,
        A: Clone,
    {
        let mut new = Self::new_in(self.alloc.clone());
        if self.cap != 0 {
            new.buf = new.alloc.allocate(self.cap)?;
            new.cap = self.cap;
        }
        for value in self.as_slice() {
            // This is safe since new.cap covers self.len. Counting len up
            // one at a time keeps new valid for drop if a clone panics.
            unsafe { ptr::write(new.buf.as_ptr().add(new.len), value.clone()) };
            new.len += 1;
        }
        Ok(new)
    }

    /// Relocates the live prefix into a fresh buffer of `new_cap` slots and
    /// releases the old buffer. Fails without touching the container.
    fn reallocate(&mut self, new_cap: usize) -> Result<(), StowError> {
        debug_assert!(new_cap >= self.len);
        let new_buf = self.alloc.allocate(new_cap)?;
        // Relocation is a bitwise move, the source slots become raw storage
        // and must not be dropped.
        // This is safe since both regions hold at least len slots and are
        // distinct allocations.
        unsafe {
            ptr::copy_nonoverlapping(self.buf.as_ptr(), new_buf.as_ptr(), self.len);
            self.release_buf();
        }
        self.buf = new_buf;
        self.cap = new_cap;
        Ok(())
    }

    /// # Safety
    /// The buffer must not be accessed afterwards unless reassigned.
    unsafe fn release_buf(&mut self) {
        if self.cap != 0 {
            self.alloc.deallocate(self.buf, self.cap);
        }
    }
}

impl<T, A: RawAlloc<T>> Drop for Vector<T, A> {
    fn drop(&mut self) {
        // Reverse index order, then release the buffer through the strategy.
        self.truncate(0);
        // This is safe since buf came from this strategy.
        unsafe { self.release_buf() };
    }
}

impl<T: Clone, A: RawAlloc<T> + Clone> Clone for Vector<T, A> {
    fn clone(&self) -> Self {
        self.try_clone().expect("Failed to allocate for clone")
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign(source.as_slice())
            .expect("Failed to allocate for clone")
    }
}

impl<T, A: RawAlloc<T> + Default> Default for Vector<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Eq, A: RawAlloc<T>> Eq for Vector<T, A> {}

impl<T: PartialEq, A: RawAlloc<T>> PartialEq for Vector<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq, A: RawAlloc<T>> PartialEq<[T]> for Vector<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: fmt::Debug, A: RawAlloc<T>> fmt::Debug for Vector<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for e in self.iter() {
            write!(f, "{:?}, ", e)?;
        }
        write!(f, "]")
    }
}

impl<'a, T, A: RawAlloc<T>> IntoIterator for &'a Vector<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, A: RawAlloc<T>> IntoIterator for &'a mut Vector<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

// The buffer is exclusively owned, so the container is as thread safe as
// its element and strategy.
unsafe impl<T: Send, A: RawAlloc<T> + Send> Send for Vector<T, A> {}
unsafe impl<T: Sync, A: RawAlloc<T> + Sync> Sync for Vector<T, A> {}

/// Cleans up a partially filled fresh buffer if construction into it
/// panics: elements filled so far are destroyed in reverse and the buffer
/// goes back to the strategy. Forget it on success.
struct FillGuard<'a, T, A: RawAlloc<T>> {
    buf: NonNull<T>,
    cap: usize,
    len: usize,
    alloc: &'a mut A,
}

impl<T, A: RawAlloc<T>> Drop for FillGuard<'_, T, A> {
    fn drop(&mut self) {
        // This is safe since the first len slots were initialized and the
        // buffer came from this strategy.
        unsafe {
            while self.len > 0 {
                self.len -= 1;
                ptr::drop_in_place(self.buf.as_ptr().add(self.len));
            }
            self.alloc.deallocate(self.buf, self.cap);
        }
    }
}
