//! The mapping registry.
//!
//! A [`Registry`] owns the mapping configuration (naming convention, enum
//! technique, per-type overrides, converters) and the derived caches: one
//! table description per mapped struct and one read plan per target type.
//! Everything is resolved through an explicit registry handle; there is no
//! ambient mutable state. A process-wide default is available through
//! [`Registry::global`] for callers that don't customize configuration.

use crate::convert::ValueConvert;
use crate::enums::{EnumTechnique, PgEnum};
use crate::field::Field;
use crate::model::Model;
use crate::reader::ReadNode;
use crate::schema::Table;
use heck::ToSnakeCase;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// How Rust member names map to column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingConvention {
    /// Member names are used verbatim.
    #[default]
    AsIs,
    /// Member names are converted to `snake_case`.
    SnakeCase,
}

/// Immutable mapping configuration, fixed when the registry is built.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    pub naming: NamingConvention,
    pub enums: EnumTechnique,
    enum_overrides: HashMap<TypeId, EnumTechnique>,
}

/// Configuration plus derived caches.
///
/// Caches are filled lazily under short lock sections; a lost creation race
/// costs one redundant build, never an inconsistent entry.
#[derive(Debug)]
pub struct Registry {
    config: MapConfig,
    converters: RwLock<HashMap<TypeId, Arc<dyn ValueConvert>>>,
    tables: RwLock<HashMap<TypeId, Arc<Table>>>,
    plans: RwLock<HashMap<TypeId, Arc<ReadNode>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    pub fn with_config(config: MapConfig) -> Self {
        Self {
            config,
            converters: RwLock::new(HashMap::new()),
            tables: RwLock::new(HashMap::new()),
            plans: RwLock::new(HashMap::new()),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The process-wide default registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Resolve a Rust member name to its column name.
    pub fn resolve_member(&self, member: &str) -> String {
        match self.config.naming {
            NamingConvention::AsIs => member.to_string(),
            NamingConvention::SnakeCase => member.to_snake_case(),
        }
    }

    /// Effective storage technique for an enum type.
    pub fn enum_technique(&self, ty: TypeId) -> EnumTechnique {
        self.config
            .enum_overrides
            .get(&ty)
            .copied()
            .unwrap_or(self.config.enums)
    }

    /// Registered converter for a field type, if any.
    pub fn converter(&self, ty: TypeId) -> Option<Arc<dyn ValueConvert>> {
        self.converters
            .read()
            .ok()
            .and_then(|map| map.get(&ty).cloned())
    }

    /// Register a converter for field type `T`.
    ///
    /// Must happen before the first read plan involving `T` is built; plans
    /// capture converters when cached.
    pub fn register_converter<T: 'static>(&self, convert: impl ValueConvert + 'static) {
        if let Ok(mut map) = self.converters.write() {
            map.insert(TypeId::of::<T>(), Arc::new(convert));
        }
    }

    /// Cached table description for a mapped struct.
    pub fn table<M: Model>(&self) -> Arc<Table> {
        let key = TypeId::of::<M>();
        if let Ok(map) = self.tables.read() {
            if let Some(table) = map.get(&key) {
                return table.clone();
            }
        }
        let built = M::build_table(self);
        match self.tables.write() {
            Ok(mut map) => map.entry(key).or_insert(built).clone(),
            Err(_) => built,
        }
    }

    /// Cached read plan for a target type.
    pub fn plan<T: Field>(&self) -> Arc<ReadNode> {
        let key = TypeId::of::<T>();
        if let Ok(map) = self.plans.read() {
            if let Some(plan) = map.get(&key) {
                return plan.clone();
            }
        }
        let built = Arc::new(T::node(self, ""));
        match self.plans.write() {
            Ok(mut map) => map.entry(key).or_insert(built).clone(),
            Err(_) => built,
        }
    }
}

/// Fluent [`Registry`] construction.
#[derive(Default)]
pub struct RegistryBuilder {
    config: MapConfig,
    converters: Vec<(TypeId, Arc<dyn ValueConvert>)>,
}

impl RegistryBuilder {
    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.config.naming = naming;
        self
    }

    /// Default enum storage technique.
    pub fn enums(mut self, technique: EnumTechnique) -> Self {
        self.config.enums = technique;
        self
    }

    /// Override the storage technique for one enum type.
    pub fn enum_override<E: PgEnum>(mut self, technique: EnumTechnique) -> Self {
        self.config
            .enum_overrides
            .insert(TypeId::of::<E>(), technique);
        self
    }

    /// Register a converter for field type `T`.
    pub fn converter<T: 'static>(mut self, convert: impl ValueConvert + 'static) -> Self {
        self.converters.push((TypeId::of::<T>(), Arc::new(convert)));
        self
    }

    pub fn build(self) -> Registry {
        let registry = Registry::with_config(self.config);
        if let Ok(mut map) = registry.converters.write() {
            for (ty, convert) in self.converters {
                map.insert(ty, convert);
            }
        }
        registry
    }
}
