use crate::error::StowError;
use log::debug;
use std::{alloc, alloc::Layout, ptr::NonNull};

/// The strategy's responsibility is to produce and release raw element storage.
///
/// The container never interprets the storage, it only constructs and
/// destroys `T` values inside the region. Element lifetimes are entirely
/// the caller's business.
///
/// # Safety
/// `allocate(count)` must return a pointer valid for reads and writes of
/// `count` elements of `T`, aligned for `T`, exclusively owned by the
/// caller until passed back to `deallocate` on the same instance with the
/// same `count`. Zero size requests may be served with a dangling pointer.
pub unsafe trait RawAlloc<T> {
    /// Fixed maximum element count this strategy can ever provide,
    /// `None` for unbounded strategies. Growth policies consult this so a
    /// bounded strategy fills up instead of overshooting its own limit.
    const MAX: Option<usize> = None;

    /// Raw storage for `count` elements, uninitialized.
    fn allocate(&mut self, count: usize) -> Result<NonNull<T>, StowError>;

    /// Releases storage previously produced by `allocate` with the same `count`.
    /// Never fails. No-op for zero size layouts.
    ///
    /// # Safety
    /// `ptr` must have come from `allocate(count)` on this instance and must
    /// not be used afterwards.
    unsafe fn deallocate(&mut self, ptr: NonNull<T>, count: usize);
}

/// Unbounded strategy backed by the global allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Heap;

unsafe impl<T> RawAlloc<T> for Heap {
    fn allocate(&mut self, count: usize) -> Result<NonNull<T>, StowError> {
        let layout = Layout::array::<T>(count).map_err(|_| StowError::alloc_failed(count))?;
        if layout.size() == 0 {
            // Zero sized layouts never touch the system allocator.
            return Ok(NonNull::dangling());
        }

        // This is safe since layout is not zero sized.
        let ptr = unsafe { alloc::alloc(layout) };
        match NonNull::new(ptr as *mut T) {
            Some(ptr) => Ok(ptr),
            None => Err(StowError::alloc_failed(count)),
        }
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<T>, count: usize) {
        let layout = Layout::array::<T>(count).expect("Layout was valid when allocated");
        if layout.size() != 0 {
            debug!("Releasing buffer of {} slots", count);
            // This is safe since caller guarantees ptr came from allocate(count).
            alloc::dealloc(ptr.as_ptr() as *mut u8, layout);
        }
    }
}

/// Strategy with a fixed maximum capacity of `N` elements.
///
/// Storage still comes from the global allocator since reallocation needs
/// the old and the new region live at the same time. The bound is what's
/// fixed: any request above `N` fails with [`StowError::CapacityExceeded`].
///
/// For the compile-time evaluable rendition of the bound see
/// [`ArenaVec`](crate::arena::ArenaVec).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounded<const N: usize>;

unsafe impl<T, const N: usize> RawAlloc<T> for Bounded<N> {
    const MAX: Option<usize> = Some(N);

    fn allocate(&mut self, count: usize) -> Result<NonNull<T>, StowError> {
        if count > N {
            return Err(StowError::capacity_exceeded(count, N));
        }
        Heap.allocate(count)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<T>, count: usize) {
        Heap.deallocate(ptr, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_buffers(n: usize, start: u8) -> Vec<(NonNull<u8>, usize)> {
        let mut buffers = Vec::new();
        let mut sum = start;

        // Allocate and write data to buffers
        for i in 1..=n {
            let ptr: NonNull<u8> = Heap.allocate(i).unwrap();
            for offset in 0..i {
                // This is safe since the buffer holds i elements.
                unsafe { ptr.as_ptr().add(offset).write(sum) };
                sum = sum.wrapping_add(1);
            }
            buffers.push((ptr, i));
        }

        buffers
    }

    fn validate_buffers(buffers: &[(NonNull<u8>, usize)], start: u8) {
        let mut sum = start;
        for &(ptr, count) in buffers {
            for offset in 0..count {
                // This is safe since the buffer was written for count elements.
                let byte = unsafe { ptr.as_ptr().add(offset).read() };
                assert_eq!(byte, sum);
                sum = sum.wrapping_add(1);
            }
        }
    }

    fn deallocate_buffers(buffers: Vec<(NonNull<u8>, usize)>) {
        for (ptr, count) in buffers {
            unsafe { Heap.deallocate(ptr, count) };
        }
    }

    #[test]
    fn heap_round_trip() {
        let buffers = add_buffers(100, 0);
        validate_buffers(&buffers, 0);
        deallocate_buffers(buffers);
    }

    #[test]
    fn heap_zero_count() {
        let ptr: NonNull<u64> = Heap.allocate(0).unwrap();
        unsafe { Heap.deallocate(ptr, 0) };
    }

    #[test]
    fn heap_zero_sized_elements() {
        let ptr: NonNull<()> = Heap.allocate(1000).unwrap();
        unsafe { Heap.deallocate(ptr, 1000) };
    }

    #[test]
    fn bounded_within_limit() {
        let mut alloc = Bounded::<8>;
        let ptr: NonNull<u32> = alloc.allocate(8).unwrap();
        unsafe { RawAlloc::<u32>::deallocate(&mut alloc, ptr, 8) };
    }

    #[test]
    fn bounded_over_limit() {
        let mut alloc = Bounded::<8>;
        let result: Result<NonNull<u32>, _> = alloc.allocate(9);
        assert_eq!(
            result.unwrap_err(),
            StowError::capacity_exceeded(9, 8)
        );
    }
}
