use std::{
    collections::{hash_map::DefaultHasher, BTreeMap, BTreeSet, HashMap},
    fmt,
    hash::{Hash, Hasher},
    time::SystemTime,
};

use tracing::{debug, warn};

use crate::{PoolError, Result};

/// Identity of the template (prototype, blueprint, prefab) a pool produces
/// instances of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateId(u64);

impl TemplateId {
    /// Wraps a raw identifier, such as an asset id.
    pub const fn new(id: u64) -> Self {
        TemplateId(id)
    }

    /// Identity derived from a template name or path.
    pub fn from_name(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        TemplateId(hasher.finish())
    }

    /// Identity of a live template object, by address.
    ///
    /// Only meaningful while the object stays where it is.
    pub fn of<T>(template: &T) -> Self {
        TemplateId(template as *const T as usize as u64)
    }

    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TemplateId {
    fn from(id: u64) -> Self {
        TemplateId(id)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A registry entry mapping a template in a given context to a pool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pool_name: String,
    template: TemplateId,
    context: String,
    object_type: String,
    tags: BTreeSet<String>,
    registered_at: SystemTime,
    sequence: u64,
}

impl Registration {
    /// Name of the pool serving the template.
    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    /// Template the pool produces instances of.
    pub fn template(&self) -> TemplateId {
        self.template
    }

    /// Context (parent, namespace) the pool was registered under.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Free-form description of the pooled object type.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Tags attached at registration.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Checks if the entry carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Wall-clock time of the registration.
    pub fn registered_at(&self) -> SystemTime {
        self.registered_at
    }
}

/// Index from `(template, context)` to the pool serving it, with tag lookup.
///
/// The registry never touches pool state; it only answers whether a pool
/// already exists for a template so callers can avoid creating duplicates.
/// Registering the same `(template, context)` twice replaces the earlier
/// entry.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    entries: HashMap<TemplateId, HashMap<String, Registration>>,
    by_tag: HashMap<String, BTreeSet<(TemplateId, String)>>,
    next_sequence: u64,
}

impl PoolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pool_name` as the pool serving `template` in `context`.
    ///
    /// Any previous entry for the same pair is replaced and returned.
    pub fn register_pool<I, S>(
        &mut self,
        pool_name: impl Into<String>,
        template: TemplateId,
        context: impl Into<String>,
        object_type: impl Into<String>,
        tags: I,
    ) -> Result<Option<Registration>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pool_name = pool_name.into();
        if pool_name.is_empty() {
            return Err(PoolError::EmptyKey);
        }
        let context = context.into();

        let previous = self.unregister(template, &context);
        if let Some(previous) = &previous {
            if previous.pool_name != pool_name {
                warn!(
                    %template,
                    context = %context,
                    previous = %previous.pool_name,
                    pool = %pool_name,
                    "Replacing pool registration for template."
                );
            }
        }

        let entry = Registration {
            pool_name,
            template,
            context: context.clone(),
            object_type: object_type.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            registered_at: SystemTime::now(),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        for tag in &entry.tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert((template, context.clone()));
        }
        debug!(pool = %entry.pool_name, %template, context = %context, "Registered pool.");
        self.entries
            .entry(template)
            .or_default()
            .insert(context, entry);
        Ok(previous)
    }

    /// Pool name registered for `template`.
    ///
    /// With a context this is an exact lookup. Without one, the
    /// earliest-registered entry among all contexts of the template is used.
    pub fn find_pool_name_by_template(
        &self,
        template: TemplateId,
        context: Option<&str>,
    ) -> Option<&str> {
        let contexts = self.entries.get(&template)?;
        let entry = match context {
            Some(context) => contexts.get(context),
            None => contexts.values().min_by_key(|entry| entry.sequence),
        };
        entry.map(|entry| entry.pool_name.as_str())
    }

    /// Every pool registered for `template` across all contexts, in
    /// registration order and without duplicates.
    pub fn find_pool_names_by_template(&self, template: TemplateId) -> Vec<String> {
        let Some(contexts) = self.entries.get(&template) else {
            return Vec::new();
        };
        let mut entries: Vec<_> = contexts.values().collect();
        entries.sort_by_key(|entry| entry.sequence);

        let mut names: Vec<String> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !names.iter().any(|name| *name == entry.pool_name) {
                names.push(entry.pool_name.clone());
            }
        }
        names
    }

    /// Names of every registered pool carrying `tag`, sorted.
    pub fn find_pools_by_tag(&self, tag: &str) -> Vec<String> {
        let Some(keys) = self.by_tag.get(tag) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|(template, context)| self.lookup(*template, context))
            .map(|entry| entry.pool_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every registration keyed by pool name.
    ///
    /// When a pool name serves several templates, the most recent entry wins.
    pub fn get_all_registrations(&self) -> BTreeMap<String, Registration> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries
            .into_iter()
            .map(|entry| (entry.pool_name.clone(), entry.clone()))
            .collect()
    }

    /// Removes the entry for `(template, context)`.
    pub fn unregister(&mut self, template: TemplateId, context: &str) -> Option<Registration> {
        let contexts = self.entries.get_mut(&template)?;
        let entry = contexts.remove(context)?;
        if contexts.is_empty() {
            self.entries.remove(&template);
        }
        for tag in &entry.tags {
            if let Some(keys) = self.by_tag.get_mut(tag) {
                keys.remove(&(template, entry.context.clone()));
                if keys.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
        Some(entry)
    }

    /// Removes every entry naming `pool_name`, returning how many were
    /// removed.
    pub fn unregister_pool(&mut self, pool_name: &str) -> usize {
        let keys: Vec<(TemplateId, String)> = self
            .iter()
            .filter(|entry| entry.pool_name == pool_name)
            .map(|entry| (entry.template, entry.context.clone()))
            .collect();
        for (template, context) in &keys {
            self.unregister(*template, context);
        }
        if !keys.is_empty() {
            debug!(pool = %pool_name, removed = keys.len(), "Unregistered pool.");
        }
        keys.len()
    }

    /// Checks if an entry exists for `(template, context)`.
    pub fn contains(&self, template: TemplateId, context: &str) -> bool {
        self.lookup(template, context).is_some()
    }

    /// The entry for `(template, context)`.
    pub fn lookup(&self, template: TemplateId, context: &str) -> Option<&Registration> {
        self.entries.get(&template)?.get(context)
    }

    /// Iterates over every registration in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.values().flat_map(|contexts| contexts.values())
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Checks if the registry holds no registrations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every registration.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_tag.clear();
    }
}
