use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use crossbeam_queue::ArrayQueue;
use tracing::{debug, trace, warn};

use crate::{
    pool_allocator::Callbacks, poolable::Hooks, CreateError, FnAllocator, PoolAllocator,
    PoolConfig, PoolError, Poolable, Pooled, Result,
};

/// What happened to an item accepted by [`PoolCore::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returned {
    /// The item went back on the free-list.
    Pooled,
    /// The free-list was full and the item was destroyed.
    Destroyed,
}

/// Point-in-time counters of a pool.
///
/// `active == total_created - total_destroyed - idle` holds for every
/// snapshot taken by a single owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances sitting in the free-list.
    pub idle: usize,
    /// Instances handed out and not yet returned.
    pub active: usize,
    /// Idle-slot ceiling.
    pub max_capacity: usize,
    /// Instances created by the allocator or adopted on return.
    pub total_created: usize,
    /// Instances destroyed on overflow, clear, discard or teardown.
    pub total_destroyed: usize,
    /// Successful `get` calls.
    pub total_acquired: usize,
    /// Returns refused by validation.
    pub total_rejected: usize,
    /// Returns accepted while nothing was outstanding.
    pub total_adopted: usize,
}

/// A bounded pool of reusable `T` instances.
///
/// Idle instances live in a fixed-size lock-free queue holding at most
/// `max_capacity` items. Returns that find the queue full are destroyed, which
/// is the pool's backpressure path rather than an error.
pub struct PoolCore<T> {
    callbacks: Callbacks<T>,
    hooks: Option<Hooks<T>>,
    config: PoolConfig,
    storage: ArrayQueue<T>,
    created: AtomicUsize,
    destroyed: AtomicUsize,
    acquired: AtomicUsize,
    rejected: AtomicUsize,
    adopted: AtomicUsize,
}

impl<T: 'static> PoolCore<T> {
    /// Starts building a pool around an infallible creation closure.
    pub fn builder<F>(create: F) -> PoolBuilder<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::from_allocator(FnAllocator::new(move || -> Result<T, CreateError> {
            Ok(create())
        }))
    }

    /// Starts building a pool around a fallible creation closure.
    pub fn try_builder<F, E>(create: F) -> PoolBuilder<T>
    where
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
        E: Into<CreateError>,
    {
        Self::from_allocator(FnAllocator::new(move || -> Result<T, CreateError> {
            create().map_err(Into::into)
        }))
    }

    /// Starts building a pool around a [`PoolAllocator`] implementation.
    pub fn from_allocator<A>(allocator: A) -> PoolBuilder<T>
    where
        A: PoolAllocator<T> + Send + Sync + 'static,
    {
        PoolBuilder {
            callbacks: Callbacks::new(Box::new(allocator)),
            hooks: None,
            config: PoolConfig::default(),
        }
    }
}

impl<T> PoolCore<T> {
    /// Gets an object from the pool.
    ///
    /// If the pool is empty, a new object is created using the allocator.
    /// Poolable hooks run first, then the reset callback.
    pub fn get(&self) -> Result<T> {
        let mut obj = match self.storage.pop() {
            Some(obj) => obj,
            None => self.create()?,
        };
        self.spawn(&mut obj);
        Ok(obj)
    }

    /// Attempts to get an object from the pool.
    ///
    /// If the pool is empty, None is returned and nothing is created.
    pub fn try_get(&self) -> Option<T> {
        self.storage.pop().map(|mut obj| {
            self.spawn(&mut obj);
            obj
        })
    }

    /// Gets an object wrapped in a guard that returns it on drop.
    pub fn get_guard(&self) -> Result<Pooled<'_, T>> {
        self.get().map(|obj| Pooled::new(obj, self))
    }

    /// Returns an object to the pool.
    ///
    /// When validation is enabled, an item is refused if nothing is
    /// outstanding or the allocator deems it invalid; the item is handed back
    /// in `Err` and the pool is left untouched. A full free-list destroys the
    /// item instead of storing it.
    pub fn release(&self, mut obj: T) -> Result<Returned, T> {
        let outstanding = self.active_count();
        if self.config.validate_on_return && (outstanding == 0 || !self.callbacks.is_valid(&obj))
        {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(outstanding, "Rejected item returned to pool.");
            return Err(obj);
        }
        if outstanding == 0 {
            self.adopt();
        }

        if let Some(hooks) = self.hooks {
            (hooks.despawn)(&mut obj);
        }
        match self.storage.push(obj) {
            Ok(()) => Ok(Returned::Pooled),
            Err(obj) => {
                trace!(max = self.cap(), "Pool full, destroying returned item.");
                self.destroy(obj);
                Ok(Returned::Destroyed)
            }
        }
    }

    /// Destroys an object taken from this pool without pooling it.
    pub fn discard(&self, obj: T) {
        if self.active_count() == 0 {
            self.adopt();
        }
        self.destroy(obj);
    }

    /// Creates up to `count` idle objects, never exceeding the capacity.
    ///
    /// Each object is despawned and reset so it looks exactly like a returned
    /// one. Returns how many objects were added; a creation failure stops the
    /// loop and is returned, keeping whatever was already added.
    pub fn prewarm(&self, count: usize) -> Result<usize> {
        let target = count.min(self.cap().saturating_sub(self.len()));
        let mut added = 0;
        while added < target {
            let mut obj = self.create()?;
            if let Some(hooks) = self.hooks {
                (hooks.despawn)(&mut obj);
            }
            self.callbacks.reset(&mut obj);
            if let Err(obj) = self.storage.push(obj) {
                self.destroy(obj);
                break;
            }
            added += 1;
        }
        debug!(requested = count, added, idle = self.len(), "Prewarmed pool.");
        Ok(added)
    }

    /// Destroys every idle object and returns how many were destroyed.
    ///
    /// Objects currently handed out are not affected.
    pub fn clear(&self) -> usize {
        let mut cleared = 0;
        while let Some(obj) = self.storage.pop() {
            self.destroy(obj);
            cleared += 1;
        }
        cleared
    }

    /// Gets the number of idle objects ready to be recycled.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Checks if the pool holds no idle objects.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Gets the capacity of the pool.
    ///
    /// This is the maximum number of idle objects, not a limit on how many
    /// objects can be handed out.
    pub fn cap(&self) -> usize {
        self.storage.capacity()
    }

    /// Number of objects handed out and not yet returned.
    pub fn active_count(&self) -> usize {
        let created = self.created.load(Ordering::Relaxed);
        let destroyed = self.destroyed.load(Ordering::Relaxed);
        created
            .saturating_sub(destroyed)
            .saturating_sub(self.storage.len())
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        let total_created = self.created.load(Ordering::Relaxed);
        let total_destroyed = self.destroyed.load(Ordering::Relaxed);
        let idle = self.storage.len();
        PoolStats {
            idle,
            active: total_created
                .saturating_sub(total_destroyed)
                .saturating_sub(idle),
            max_capacity: self.cap(),
            total_created,
            total_destroyed,
            total_acquired: self.acquired.load(Ordering::Relaxed),
            total_rejected: self.rejected.load(Ordering::Relaxed),
            total_adopted: self.adopted.load(Ordering::Relaxed),
        }
    }

    fn create(&self) -> Result<T> {
        let obj = self.callbacks.allocate().map_err(PoolError::Create)?;
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(obj)
    }

    fn spawn(&self, obj: &mut T) {
        if let Some(hooks) = self.hooks {
            (hooks.spawn)(obj);
        }
        self.callbacks.reset(obj);
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    fn adopt(&self) {
        trace!("Adopting item with no outstanding instances.");
        self.created.fetch_add(1, Ordering::Relaxed);
        self.adopted.fetch_add(1, Ordering::Relaxed);
    }

    fn destroy(&self, obj: T) {
        self.callbacks.destroy(obj);
        self.destroyed.fetch_add(1, Ordering::Relaxed);
    }
}

impl<T> Drop for PoolCore<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> fmt::Debug for PoolCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolCore")
            .field("config", &self.config)
            .field("hooks", &self.hooks.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Builder for [`PoolCore`], created by [`PoolCore::builder`],
/// [`PoolCore::try_builder`] or [`PoolCore::from_allocator`].
pub struct PoolBuilder<T> {
    callbacks: Callbacks<T>,
    hooks: Option<Hooks<T>>,
    config: PoolConfig,
}

impl<T> PoolBuilder<T> {
    /// Sets the pool configuration.
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a reset callback, run on every `get` and on prewarmed objects.
    pub fn reset<F>(mut self, reset: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.callbacks.reset = Some(Box::new(reset));
        self
    }

    /// Sets the callback used to destroy evicted objects.
    pub fn destroy<F>(mut self, destroy: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.callbacks.destroy = Some(Box::new(destroy));
        self
    }

    /// Adds a validity check applied to returns when validation is enabled.
    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.callbacks.validate = Some(Box::new(validate));
        self
    }

    /// Runs the [`Poolable`] hooks of `T` on spawn and despawn.
    pub fn poolable(mut self) -> Self
    where
        T: Poolable,
    {
        self.hooks = Some(Hooks::of());
        self
    }

    /// Validates the configuration, builds the pool and prewarms
    /// `initial_capacity` objects.
    pub fn build(self) -> Result<PoolCore<T>> {
        self.config.validate()?;
        let pool = PoolCore {
            storage: ArrayQueue::new(self.config.max_capacity),
            callbacks: self.callbacks,
            hooks: self.hooks,
            config: self.config,
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
            acquired: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
            adopted: AtomicUsize::new(0),
        };
        let initial = pool.config.effective_initial();
        if initial > 0 {
            pool.prewarm(initial)?;
        }
        Ok(pool)
    }
}

impl<T> fmt::Debug for PoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("config", &self.config)
            .field("hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}
