use std::{
    fmt,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
};

use crate::PoolCore;

/// A guard over an object taken from a [`PoolCore`].
///
/// The object is returned to the pool when the guard is dropped. If the pool
/// refuses it, the object is destroyed through the pool's destroy callback.
pub struct Pooled<'a, T> {
    obj: ManuallyDrop<T>,
    pool: &'a PoolCore<T>,
}

impl<'a, T> Pooled<'a, T> {
    pub(crate) fn new(obj: T, pool: &'a PoolCore<T>) -> Self {
        Pooled {
            obj: ManuallyDrop::new(obj),
            pool,
        }
    }

    /// Consumes the guard and returns the object, without returning it to the
    /// pool.
    ///
    /// The object stays counted as active until it is passed to
    /// [`PoolCore::release`] or [`PoolCore::discard`].
    pub fn into_inner(self) -> T {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so `obj` is taken exactly once.
        unsafe { ManuallyDrop::take(&mut this.obj) }
    }
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.obj
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        // SAFETY: drop runs once and `obj` is not touched afterwards.
        let obj = unsafe { ManuallyDrop::take(&mut self.obj) };
        if let Err(obj) = self.pool.release(obj) {
            self.pool.discard(obj);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Display> fmt::Display for Pooled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: PartialEq> PartialEq<T> for Pooled<'_, T> {
    #[inline]
    fn eq(&self, other: &T) -> bool {
        (**self).eq(other)
    }
}

impl<T> AsRef<T> for Pooled<'_, T> {
    #[inline(always)]
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> AsMut<T> for Pooled<'_, T> {
    #[inline(always)]
    fn as_mut(&mut self) -> &mut T {
        self
    }
}
