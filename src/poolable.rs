/// Lifecycle hooks for types that know how to prepare themselves for reuse.
///
/// Hooks are opt-in per pool: they only run when the pool was built with
/// [`PoolBuilder::poolable`](crate::PoolBuilder::poolable).
pub trait Poolable {
    /// Called after the instance is taken from the pool (or freshly created)
    /// and before the caller receives it.
    #[inline(always)]
    fn on_spawn(&mut self) {}

    /// Called when the instance is returned, before it re-enters the free-list.
    #[inline(always)]
    fn on_despawn(&mut self) {}
}

/// Hook table captured from a [`Poolable`] implementation at build time.
pub(crate) struct Hooks<T> {
    pub(crate) spawn: fn(&mut T),
    pub(crate) despawn: fn(&mut T),
}

impl<T: Poolable> Hooks<T> {
    pub(crate) fn of() -> Self {
        Hooks {
            spawn: T::on_spawn,
            despawn: T::on_despawn,
        }
    }
}

impl<T> Clone for Hooks<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Hooks<T> {}
