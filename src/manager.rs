use std::{
    any::{type_name, Any, TypeId},
    borrow::Cow,
    collections::HashMap,
    fmt,
    sync::Arc,
};

use tracing::{debug, warn};

use crate::{PoolBuilder, PoolCore, PoolError, PoolStats, ReleaseError, Result, Returned};

/// Key identifying a pool inside a [`PoolManager`].
///
/// Pools are keyed either by an application-chosen name or by the type of
/// item they hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolKey {
    /// An explicit pool name.
    Name(Cow<'static, str>),
    /// The pool for a given item type.
    Type {
        /// Type identifier of the pooled item.
        id: TypeId,
        /// Type name of the pooled item, used for display.
        name: &'static str,
    },
}

impl PoolKey {
    /// Key of the type-keyed pool for `T`.
    pub fn of<T: 'static>() -> Self {
        PoolKey::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Key of a named pool.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        PoolKey::Name(name.into())
    }

    /// Returns `true` for a name key with an empty name.
    pub fn is_empty(&self) -> bool {
        matches!(self, PoolKey::Name(name) if name.is_empty())
    }

    /// The pool name, if this is a name key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PoolKey::Name(name) => Some(name),
            PoolKey::Type { .. } => None,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKey::Name(name) => f.write_str(name),
            PoolKey::Type { name, .. } => write!(f, "type:{}", name),
        }
    }
}

impl From<&'static str> for PoolKey {
    fn from(name: &'static str) -> Self {
        PoolKey::Name(Cow::Borrowed(name))
    }
}

impl From<String> for PoolKey {
    fn from(name: String) -> Self {
        PoolKey::Name(Cow::Owned(name))
    }
}

impl From<&PoolKey> for PoolKey {
    fn from(key: &PoolKey) -> Self {
        key.clone()
    }
}

/// Type-erased view of a pool, letting the manager hold pools of different
/// item types side by side.
trait ErasedPool: Send + Sync {
    fn prewarm(&self, count: usize) -> Result<usize>;
    fn clear(&self) -> usize;
    fn stats(&self) -> PoolStats;
    fn item_type(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Send + 'static> ErasedPool for PoolCore<T> {
    fn prewarm(&self, count: usize) -> Result<usize> {
        PoolCore::prewarm(self, count)
    }

    fn clear(&self) -> usize {
        PoolCore::clear(self)
    }

    fn stats(&self) -> PoolStats {
        PoolCore::stats(self)
    }

    fn item_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Namespace of pools, holding at most one pool per [`PoolKey`].
///
/// Creating and removing pools needs exclusive access; getting and returning
/// items only needs a shared reference. The manager does no locking of its
/// own.
#[derive(Default)]
pub struct PoolManager {
    pools: HashMap<PoolKey, Arc<dyn ErasedPool>>,
}

impl PoolManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a pool and registers it under `key`.
    ///
    /// If a pool with the same item type already exists under `key`, the
    /// builder is discarded and the existing pool is returned. A pool of a
    /// different item type under the same key is an error.
    pub fn create_pool<T: Send + 'static>(
        &mut self,
        key: impl Into<PoolKey>,
        builder: PoolBuilder<T>,
    ) -> Result<Arc<PoolCore<T>>> {
        let key = key.into();
        if key.is_empty() {
            return Err(PoolError::EmptyKey);
        }
        if let Some(existing) = self.pools.get(&key) {
            let pool = downcast_arc::<T>(&key, existing)?;
            warn!(%key, "Pool already exists, keeping the existing pool.");
            return Ok(pool);
        }

        let pool = Arc::new(builder.build()?);
        debug!(%key, max = pool.cap(), idle = pool.len(), "Created pool.");
        self.pools.insert(key, pool.clone());
        Ok(pool)
    }

    /// Returns a handle to the pool under `key`.
    pub fn pool<T: Send + 'static>(&self, key: impl Into<PoolKey>) -> Result<Arc<PoolCore<T>>> {
        let key = key.into();
        let pool = self
            .pools
            .get(&key)
            .ok_or_else(|| PoolError::PoolNotFound(key.clone()))?;
        downcast_arc(&key, pool)
    }

    /// Gets an item from the pool under `key`.
    pub fn get<T: Send + 'static>(&self, key: impl Into<PoolKey>) -> Result<T> {
        self.typed::<T>(&key.into())?.get()
    }

    /// Gets an item from the type-keyed pool for `T`, creating that pool with
    /// the default configuration on first use.
    pub fn get_or_create_default<T: Default + Send + 'static>(&mut self) -> Result<T> {
        let key = PoolKey::of::<T>();
        if !self.pools.contains_key(&key) {
            self.create_pool(key.clone(), PoolCore::builder(T::default))?;
        }
        self.typed::<T>(&key)?.get()
    }

    /// Returns an item to the pool under `key`.
    ///
    /// On failure the item is handed back inside the error.
    pub fn release<T: Send + 'static>(
        &self,
        key: impl Into<PoolKey>,
        item: T,
    ) -> Result<Returned, ReleaseError<T>> {
        let key = key.into();
        let pool = match self.typed::<T>(&key) {
            Ok(pool) => pool,
            Err(e) => return Err(ReleaseError::new(e, item)),
        };
        pool.release(item)
            .map_err(|item| ReleaseError::new(PoolError::Rejected(key), item))
    }

    /// Prewarms the pool under `key`, returning how many items were added.
    pub fn prewarm(&self, key: impl Into<PoolKey>, count: usize) -> Result<usize> {
        self.erased(&key.into())?.prewarm(count)
    }

    /// Destroys the idle items of the pool under `key`.
    pub fn clear_pool(&self, key: impl Into<PoolKey>) -> Result<usize> {
        Ok(self.erased(&key.into())?.clear())
    }

    /// Counters of the pool under `key`.
    pub fn stats(&self, key: impl Into<PoolKey>) -> Option<PoolStats> {
        self.pools.get(&key.into()).map(|pool| pool.stats())
    }

    /// Checks if a pool exists under `key`.
    pub fn has_pool(&self, key: impl Into<PoolKey>) -> bool {
        self.pools.contains_key(&key.into())
    }

    /// Destroys the idle items of the pool under `key` and unregisters it.
    ///
    /// Outstanding [`Arc`] handles keep working but are no longer reachable
    /// through the manager. Returns `false` if no such pool existed.
    pub fn remove_pool(&mut self, key: impl Into<PoolKey>) -> bool {
        let key = key.into();
        match self.pools.remove(&key) {
            Some(pool) => {
                let destroyed = pool.clear();
                debug!(%key, destroyed, "Removed pool.");
                true
            }
            None => false,
        }
    }

    /// Tears down every pool.
    pub fn destroy(&mut self) {
        if self.pools.is_empty() {
            return;
        }
        let count = self.pools.len();
        let destroyed: usize = self.pools.drain().map(|(_, pool)| pool.clear()).sum();
        debug!(pools = count, destroyed, "Destroyed all pools.");
    }

    /// Keys of every registered pool.
    pub fn keys(&self) -> impl Iterator<Item = &PoolKey> {
        self.pools.keys()
    }

    /// Number of registered pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Checks if no pools are registered.
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    fn erased(&self, key: &PoolKey) -> Result<&dyn ErasedPool> {
        self.pools
            .get(key)
            .map(|pool| pool.as_ref())
            .ok_or_else(|| PoolError::PoolNotFound(key.clone()))
    }

    fn typed<T: Send + 'static>(&self, key: &PoolKey) -> Result<&PoolCore<T>> {
        self.erased(key)?
            .as_any()
            .downcast_ref::<PoolCore<T>>()
            .ok_or_else(|| PoolError::TypeMismatch {
                key: key.clone(),
                expected: type_name::<T>(),
            })
    }
}

fn downcast_arc<T: Send + 'static>(
    key: &PoolKey,
    pool: &Arc<dyn ErasedPool>,
) -> Result<Arc<PoolCore<T>>> {
    Arc::clone(pool)
        .into_any()
        .downcast::<PoolCore<T>>()
        .map_err(|_| PoolError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<T>(),
        })
}

impl Drop for PoolManager {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, pool) in &self.pools {
            map.entry(&key.to_string(), &(pool.item_type(), pool.stats()));
        }
        map.finish()
    }
}
