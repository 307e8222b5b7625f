use std::{any::type_name, sync::Arc};

use tracing::debug;

use crate::{PoolBuilder, PoolCore, PoolError, PoolKey, PoolManager, PoolRegistry, Result, TemplateId};

/// A pool manager and a pool registry kept in step.
///
/// This replaces process-wide pool tables: each context is an independent
/// namespace, built with [`PoolContext::init`] and torn down with
/// [`PoolContext::teardown`] (or by dropping it).
#[derive(Debug, Default)]
pub struct PoolContext {
    manager: PoolManager,
    registry: PoolRegistry,
}

impl PoolContext {
    /// Creates an empty context.
    pub fn init() -> Self {
        debug!("Initialized pool context.");
        Self::default()
    }

    /// Destroys every pool and forgets every registration.
    pub fn teardown(&mut self) {
        self.manager.destroy();
        self.registry.clear();
        debug!("Tore down pool context.");
    }

    /// The pool manager.
    pub fn manager(&self) -> &PoolManager {
        &self.manager
    }

    /// The pool manager, mutably.
    pub fn manager_mut(&mut self) -> &mut PoolManager {
        &mut self.manager
    }

    /// The pool registry.
    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    /// The pool registry, mutably.
    pub fn registry_mut(&mut self) -> &mut PoolRegistry {
        &mut self.registry
    }

    /// Returns the pool serving `template` in `context`, creating and
    /// registering it under `pool_name` if none exists yet.
    ///
    /// The builder is only used when a new pool has to be created.
    pub fn pool_for_template<T, I, S>(
        &mut self,
        template: TemplateId,
        context: &str,
        pool_name: impl Into<String>,
        tags: I,
        builder: PoolBuilder<T>,
    ) -> Result<Arc<PoolCore<T>>>
    where
        T: Send + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let existing = self
            .registry
            .find_pool_name_by_template(template, Some(context))
            .map(str::to_owned);
        if let Some(existing) = existing {
            if self.manager.has_pool(existing.clone()) {
                return self.manager.pool::<T>(existing);
            }
            debug!(pool = %existing, %template, "Dropping registration of a removed pool.");
            self.registry.unregister(template, context);
        }

        let pool_name = pool_name.into();
        let pool = self.manager.create_pool(pool_name.clone(), builder)?;
        self.registry
            .register_pool(pool_name, template, context, type_name::<T>(), tags)?;
        Ok(pool)
    }

    /// Returns the pool registered for `template`.
    ///
    /// Without a context, the earliest-registered context wins.
    pub fn pool_by_template<T: Send + 'static>(
        &self,
        template: TemplateId,
        context: Option<&str>,
    ) -> Result<Arc<PoolCore<T>>> {
        let name = self
            .registry
            .find_pool_name_by_template(template, context)
            .ok_or_else(|| PoolError::PoolNotFound(PoolKey::named(template.to_string())))?;
        self.manager.pool::<T>(name.to_owned())
    }

    /// Removes a pool together with every registration naming it.
    pub fn remove_pool(&mut self, key: impl Into<PoolKey>) -> bool {
        let key = key.into();
        if let Some(name) = key.as_name() {
            self.registry.unregister_pool(name);
        }
        self.manager.remove_pool(key)
    }
}
