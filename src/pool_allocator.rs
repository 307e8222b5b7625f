use std::fmt;

use crate::CreateError;

/// A trait defining the interface for a pool allocator.
///
/// This trait provides methods for creating, resetting and destroying
/// objects, as well as validating objects before they are stored back in the
/// pool.
pub trait PoolAllocator<T> {
    /// Creates a new object of type T.
    ///
    /// Errors are propagated to the caller of `get`/`prewarm` untouched.
    fn allocate(&self) -> Result<T, CreateError>;

    /// Resets the state of an object before it is handed out or prewarmed.
    ///
    /// By default, this method does nothing.
    #[inline(always)]
    fn reset(&self, _obj: &mut T) {}

    /// Validates that an object is in a good state to be stored back in the
    /// pool. Only consulted when the pool validates returns.
    ///
    /// By default, this method always returns true.
    #[inline(always)]
    fn is_valid(&self, _obj: &T) -> bool {
        true
    }

    /// Destroys an object evicted from the pool.
    ///
    /// By default the object is simply dropped.
    #[inline(always)]
    fn destroy(&self, obj: T) {
        drop(obj)
    }
}

/// A [`PoolAllocator`] backed by a creation closure.
pub struct FnAllocator<F> {
    create: F,
}

impl<F> FnAllocator<F> {
    /// Wraps a fallible creation closure.
    pub fn new(create: F) -> Self {
        FnAllocator { create }
    }
}

impl<F> fmt::Debug for FnAllocator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAllocator").finish_non_exhaustive()
    }
}

impl<T, F> PoolAllocator<T> for FnAllocator<F>
where
    F: Fn() -> Result<T, CreateError>,
{
    #[inline(always)]
    fn allocate(&self) -> Result<T, CreateError> {
        (self.create)()
    }
}

pub(crate) type ResetFn<T> = Box<dyn Fn(&mut T) + Send + Sync>;
pub(crate) type DestroyFn<T> = Box<dyn Fn(T) + Send + Sync>;
pub(crate) type ValidateFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// An allocator plus the optional callbacks layered on top of it by the
/// builder. Extra callbacks run after the allocator's own, except `destroy`
/// which replaces it.
pub(crate) struct Callbacks<T> {
    pub(crate) inner: Box<dyn PoolAllocator<T> + Send + Sync>,
    pub(crate) reset: Option<ResetFn<T>>,
    pub(crate) destroy: Option<DestroyFn<T>>,
    pub(crate) validate: Option<ValidateFn<T>>,
}

impl<T> Callbacks<T> {
    pub(crate) fn new(inner: Box<dyn PoolAllocator<T> + Send + Sync>) -> Self {
        Callbacks {
            inner,
            reset: None,
            destroy: None,
            validate: None,
        }
    }
}

impl<T> PoolAllocator<T> for Callbacks<T> {
    fn allocate(&self) -> Result<T, CreateError> {
        self.inner.allocate()
    }

    fn reset(&self, obj: &mut T) {
        self.inner.reset(obj);
        if let Some(reset) = &self.reset {
            reset(obj);
        }
    }

    fn is_valid(&self, obj: &T) -> bool {
        self.inner.is_valid(obj) && self.validate.as_ref().map_or(true, |valid| valid(obj))
    }

    fn destroy(&self, obj: T) {
        match &self.destroy {
            Some(destroy) => destroy(obj),
            None => self.inner.destroy(obj),
        }
    }
}
