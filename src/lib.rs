//! # Goal
//! The main goal of this library is to provide a growable contiguous
//! container whose storage policy is a pluggable parameter instead of a
//! baked in assumption.
//!
//! Primary attribute of the library is separation of concerns: the
//! container owns element lifetimes, the strategy owns raw storage, and
//! neither reaches into the other's side of the contract.
//!
//! Secondary attribute is predictability of memory. Capacity grows by a
//! fixed policy, shrinks only on request, and every deallocation goes back
//! through the strategy that produced the buffer.
//!
//! # Features
//! - Element management, through the [`Vector`] type.
//!      - Responsible for: which slots hold live elements, and constructing
//!        and destroying them.
//! - Storage management, through the [`RawAlloc`] family of strategies.
//!      - Responsible for: producing and releasing raw regions, and the
//!        fixed maximum if the strategy has one.
//! - Compile-time evaluation, through the [`ArenaVec`] type.
//!      - Responsible for: the same container shape with inline storage,
//!        usable in `const` contexts.
//!
//! # Architecture
//! There are a few pieces that compose with one another:
//! - [`Vector<T, A>`] - the container, generic over element and strategy.
//! - [`RawAlloc<T>`] - the strategy interface, with [`Heap`] as the
//!   unbounded default and [`Bounded<N>`] as a fixed maximum variant.
//! - [`ArenaVec<T, N>`] - the const capable fixed capacity container, a
//!   concrete type since trait dispatch is unavailable in const contexts.
//! - [`StowError`] - every recoverable failure of the above.
//!
//! Out of bounds checked access, allocation failure, and exceeding a fixed
//! maximum are errors, not aborts. The container stays valid and unchanged
//! after any of them.
//!
//! ```
//! use stow::{vector, StowError, Vector};
//!
//! fn run() -> Result<(), StowError> {
//!     let mut vec = vector![1u32, 2, 3];
//!     vec.push(4)?;
//!     assert_eq!(*vec.at(3)?, 4);
//!
//!     vec.resize(2)?;
//!     vec.shrink_to_fit()?;
//!     assert_eq!(vec.capacity(), 2);
//!     Ok(())
//! }
//! # run().unwrap();
//! ```

pub mod alloc;
pub mod arena;
pub mod error;
pub mod vec;

pub use crate::{
    alloc::{Bounded, Heap, RawAlloc},
    arena::ArenaVec,
    error::StowError,
    vec::Vector,
};

/// Container holding the listed elements, capacity exactly the element
/// count. Panics on allocation failure, use [`Vector::from_array`] for the
/// recoverable form.
#[macro_export]
macro_rules! vector {
    () => {
        $crate::Vector::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Vector::from_array([$($value),+]).expect("Failed to allocate")
    };
}
