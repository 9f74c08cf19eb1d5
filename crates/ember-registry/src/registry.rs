//! SymbolRegistry - the global binding table.
//!
//! Bindings are registered on a [`RegistryBuilder`] during host setup and the
//! builder is then sealed into an immutable [`SymbolRegistry`]. The sealed
//! registry is `Send + Sync` and is shared by every compilation and every
//! unit instance through an `Arc`.
//!
//! # Lookup
//!
//! Scripts call bindings by unqualified name. A name may be registered with
//! several arities; lookup picks the one whose total parameter count matches
//! the call's argument count. There is no type-directed overload selection.
//!
//! # Object types
//!
//! Cache slots are shared by object type name, so every binding naming the
//! same object type must construct the same Rust type. Registration rejects
//! a binding that reuses a name for a different type.
//!
//! # Example
//!
//! ```
//! use ember_core::{DataType, Dynamic};
//! use ember_registry::{BindingDef, RegistryBuilder};
//!
//! let mut builder = RegistryBuilder::new();
//! builder
//!     .register(
//!         BindingDef::builder("noop", "Noop")
//!             .constructor(|_: &[Dynamic]| Ok(()))
//!             .method(|_: &mut (), _: &[Dynamic]| Ok(Dynamic::Void))
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let registry = builder.seal();
//! assert!(registry.lookup("noop", 0).is_some());
//! assert!(registry.lookup("noop", 1).is_none());
//! ```

use std::any::TypeId;
use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use ember_core::{RegistrationError, TypeHash};

use crate::BindingDef;

/// Mutable registry under construction.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: SymbolRegistry,
    /// Rust type behind each object type name registered so far.
    object_types: FxHashMap<String, (TypeId, &'static str)>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding.
    ///
    /// Fails if a binding with the same name and total arity already exists,
    /// or if its object type name was registered with a different Rust type.
    pub fn register(&mut self, def: BindingDef) -> Result<&mut Self, RegistrationError> {
        let arity = def.arity();
        if self.registry.lookup(&def.name, arity).is_some() {
            return Err(RegistrationError::DuplicateBinding {
                name: def.name,
                arity,
            });
        }
        if let Some(&(type_id, registered)) = self.object_types.get(&def.object_name) {
            if type_id != def.object_type_id {
                return Err(RegistrationError::ConflictingObjectType {
                    name: def.name,
                    object_name: def.object_name,
                    registered,
                    found: def.object_rust_name,
                });
            }
        }
        self.object_types.insert(
            def.object_name.clone(),
            (def.object_type_id, def.object_rust_name),
        );

        debug!(
            "registered binding {}/{} on {} ({})",
            def.name, arity, def.object_name, def.hash
        );

        let def = Arc::new(def);
        self.registry.by_hash.insert(def.hash, Arc::clone(&def));
        self.registry
            .by_name
            .entry(def.name.clone())
            .or_default()
            .push(def);
        Ok(self)
    }

    /// Finish registration.
    pub fn seal(self) -> SymbolRegistry {
        self.registry
    }
}

/// Immutable binding table.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    /// Bindings grouped by name; each entry has a distinct arity.
    by_name: FxHashMap<String, Vec<Arc<BindingDef>>>,
    /// Index used by the executor.
    by_hash: FxHashMap<TypeHash, Arc<BindingDef>>,
}

impl SymbolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the binding called `name` taking `arity` arguments in total.
    pub fn lookup(&self, name: &str, arity: usize) -> Option<&Arc<BindingDef>> {
        self.by_name
            .get(name)?
            .iter()
            .find(|def| def.arity() == arity)
    }

    /// Find a binding by its hash.
    pub fn get(&self, hash: TypeHash) -> Option<&Arc<BindingDef>> {
        self.by_hash.get(&hash)
    }

    /// Check whether any binding uses this name, regardless of arity.
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// Whether no bindings are registered.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Iterate all bindings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<BindingDef>> {
        self.by_hash.values()
    }
}
