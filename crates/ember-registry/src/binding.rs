//! BindingDef - a host-registered callable object.
//!
//! A binding pairs a constructor with a single method. The first time a
//! script calls it, the constructor runs with the leading arguments and the
//! resulting object is cached; every call then invokes the method on the
//! cached object with the remaining arguments.
//!
//! # Example
//!
//! ```
//! use ember_core::{DataType, Dynamic, NativeError};
//! use ember_registry::BindingDef;
//!
//! struct Counter {
//!     step: i32,
//!     total: i32,
//! }
//!
//! let def = BindingDef::builder("count", "Counter")
//!     .constructor_params([DataType::int()])
//!     .returns(DataType::int())
//!     .constructor(|args: &[Dynamic]| {
//!         let step = args[0].as_int().ok_or(NativeError::failed("step"))?;
//!         Ok(Counter { step, total: 0 })
//!     })
//!     .method(|counter: &mut Counter, _args: &[Dynamic]| {
//!         counter.total += counter.step;
//!         Ok(Dynamic::Int(counter.total))
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(def.arity(), 1);
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use ember_core::{DataType, Dynamic, NativeError, RegistrationError, TypeHash};

/// Maximum number of constructor or method parameters.
///
/// Argument counts are encoded as one byte in the bytecode.
pub const MAX_BINDING_PARAMS: usize = u8::MAX as usize;

/// Type-erased binding constructor.
pub type ConstructorFn =
    Arc<dyn Fn(&[Dynamic]) -> Result<Box<dyn Any>, NativeError> + Send + Sync>;

/// Type-erased binding method, receiving the cached object.
pub type MethodFn =
    Arc<dyn Fn(&mut dyn Any, &[Dynamic]) -> Result<Dynamic, NativeError> + Send + Sync>;

/// Descriptor of a registered binding.
///
/// Immutable once built; the registry shares it via `Arc`.
pub struct BindingDef {
    /// Name scripts call the binding by.
    pub name: String,
    /// Name of the object type the constructor produces.
    pub object_name: String,
    /// Hash of `object_name`, the key for cache-slot sharing.
    pub object_type: TypeHash,
    /// Rust type of the cached object.
    pub object_type_id: TypeId,
    /// Name of the Rust type, for diagnostics.
    pub object_rust_name: &'static str,
    /// Constructor parameter types, in order.
    pub constructor_params: Vec<DataType>,
    /// Method parameter types, in order.
    pub method_params: Vec<DataType>,
    /// Result type of the method.
    pub return_type: DataType,
    /// Identity used by the emitted bytecode.
    pub hash: TypeHash,
    constructor: ConstructorFn,
    method: MethodFn,
}

impl BindingDef {
    /// Start building a binding called `name` whose object type is `object_name`.
    pub fn builder(name: impl Into<String>, object_name: impl Into<String>) -> BindingBuilder {
        BindingBuilder::new(name, object_name)
    }

    /// Total number of script arguments (constructor then method).
    pub fn arity(&self) -> usize {
        self.constructor_params.len() + self.method_params.len()
    }

    /// All parameter types: constructor parameters followed by method parameters.
    pub fn param_types(&self) -> Vec<DataType> {
        self.constructor_params
            .iter()
            .chain(self.method_params.iter())
            .copied()
            .collect()
    }

    /// Run the constructor.
    pub fn construct(&self, args: &[Dynamic]) -> Result<Box<dyn Any>, NativeError> {
        (self.constructor)(args)
    }

    /// Run the method on a cached object.
    pub fn invoke(&self, object: &mut dyn Any, args: &[Dynamic]) -> Result<Dynamic, NativeError> {
        (self.method)(object, args)
    }
}

impl fmt::Debug for BindingDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingDef")
            .field("name", &self.name)
            .field("object_name", &self.object_name)
            .field("object_rust_name", &self.object_rust_name)
            .field("constructor_params", &self.constructor_params)
            .field("method_params", &self.method_params)
            .field("return_type", &self.return_type)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BindingDef`].
pub struct BindingBuilder {
    name: String,
    object_name: String,
    constructor_params: Vec<DataType>,
    method_params: Vec<DataType>,
    return_type: DataType,
    constructor: Option<(ConstructorFn, TypeId, &'static str)>,
    method: Option<(MethodFn, TypeId, &'static str)>,
}

impl BindingBuilder {
    fn new(name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_name: object_name.into(),
            constructor_params: Vec::new(),
            method_params: Vec::new(),
            return_type: DataType::void(),
            constructor: None,
            method: None,
        }
    }

    /// Set the constructor parameter types.
    pub fn constructor_params(mut self, params: impl IntoIterator<Item = DataType>) -> Self {
        self.constructor_params = params.into_iter().collect();
        self
    }

    /// Set the method parameter types.
    pub fn method_params(mut self, params: impl IntoIterator<Item = DataType>) -> Self {
        self.method_params = params.into_iter().collect();
        self
    }

    /// Set the method result type. Defaults to `void`.
    pub fn returns(mut self, return_type: DataType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Set the constructor, producing an object of type `T`.
    pub fn constructor<T, F>(mut self, f: F) -> Self
    where
        T: Any,
        F: Fn(&[Dynamic]) -> Result<T, NativeError> + Send + Sync + 'static,
    {
        let constructor: ConstructorFn = Arc::new(move |args: &[Dynamic]| {
            f(args).map(|object| Box::new(object) as Box<dyn Any>)
        });
        self.constructor = Some((constructor, TypeId::of::<T>(), type_name::<T>()));
        self
    }

    /// Set the method, operating on an object of type `T`.
    ///
    /// The cached object is downcast before `f` runs; a mismatch is reported
    /// as [`NativeError::WrongObjectType`].
    pub fn method<T, F>(mut self, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut T, &[Dynamic]) -> Result<Dynamic, NativeError> + Send + Sync + 'static,
    {
        let method: MethodFn = Arc::new(move |object: &mut dyn Any, args: &[Dynamic]| {
            let object = object
                .downcast_mut::<T>()
                .ok_or(NativeError::WrongObjectType {
                    expected: type_name::<T>(),
                })?;
            f(object, args)
        });
        self.method = Some((method, TypeId::of::<T>(), type_name::<T>()));
        self
    }

    /// Finish the binding.
    ///
    /// The constructor and the method must agree on the object's Rust type.
    pub fn build(self) -> Result<BindingDef, RegistrationError> {
        let (constructor, object_type_id, object_rust_name) = self
            .constructor
            .ok_or_else(|| RegistrationError::IncompleteBinding {
                name: self.name.clone(),
                missing: "constructor",
            })?;
        let (method, method_type_id, method_rust_name) = self
            .method
            .ok_or_else(|| RegistrationError::IncompleteBinding {
                name: self.name.clone(),
                missing: "method",
            })?;

        if method_type_id != object_type_id {
            return Err(RegistrationError::ObjectTypeMismatch {
                name: self.name,
                constructor: object_rust_name,
                method: method_rust_name,
            });
        }

        for (what, len) in [
            ("constructor parameters", self.constructor_params.len()),
            ("method parameters", self.method_params.len()),
        ] {
            if len > MAX_BINDING_PARAMS {
                return Err(RegistrationError::LimitExceeded {
                    name: self.name,
                    what,
                    limit: MAX_BINDING_PARAMS,
                });
            }
        }

        let object_type = TypeHash::from_name(&self.object_name);
        let param_hashes: Vec<TypeHash> = self
            .constructor_params
            .iter()
            .chain(self.method_params.iter())
            .map(|ty| ty.type_hash)
            .collect();
        let hash = TypeHash::from_binding(object_type, &self.name, &param_hashes);

        Ok(BindingDef {
            name: self.name,
            object_name: self.object_name,
            object_type,
            object_type_id,
            object_rust_name,
            constructor_params: self.constructor_params,
            method_params: self.method_params,
            return_type: self.return_type,
            hash,
            constructor,
            method,
        })
    }
}
