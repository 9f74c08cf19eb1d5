//! Runtime value type for executor slots.

use std::any::Any;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::error::NativeError;

/// A dynamic value held on the executor stack, in locals, or passed to
/// native binding callbacks.
///
/// Binding objects are held by [`ObjectRef`], so cloning a `Dynamic`
/// never duplicates a binding object, only its handle.
#[derive(Clone, Default)]
pub enum Dynamic {
    /// Result of a `void` call.
    #[default]
    Void,
    /// The `null` value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 64-bit float.
    Double(f64),
    /// Immutable string.
    String(Rc<str>),
    /// Handle to a binding object held in a cache slot.
    Object(ObjectRef),
}

impl Dynamic {
    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Void => "void",
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "int",
            Dynamic::Long(_) => "long",
            Dynamic::Double(_) => "double",
            Dynamic::String(_) => "string",
            Dynamic::Object(_) => "object",
        }
    }

    /// Check if this value is void.
    pub fn is_void(&self) -> bool {
        matches!(self, Dynamic::Void)
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    /// Get the value as `bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as `int`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Dynamic::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as `long`, widening an `int`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Dynamic::Int(v) => Some(i64::from(*v)),
            Dynamic::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as `double`, widening integers.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Dynamic::Int(v) => Some(f64::from(*v)),
            Dynamic::Long(v) => Some(*v as f64),
            Dynamic::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the binding object handle.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Dynamic::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Void => write!(f, "Void"),
            Dynamic::Null => write!(f, "Null"),
            Dynamic::Bool(v) => write!(f, "Bool({v})"),
            Dynamic::Int(v) => write!(f, "Int({v})"),
            Dynamic::Long(v) => write!(f, "Long({v})"),
            Dynamic::Double(v) => write!(f, "Double({v})"),
            Dynamic::String(s) => write!(f, "String({s:?})"),
            Dynamic::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Dynamic::Void, Dynamic::Void) | (Dynamic::Null, Dynamic::Null) => true,
            (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
            (Dynamic::Int(a), Dynamic::Int(b)) => a == b,
            (Dynamic::Long(a), Dynamic::Long(b)) => a == b,
            (Dynamic::Double(a), Dynamic::Double(b)) => a == b,
            (Dynamic::String(a), Dynamic::String(b)) => a == b,
            (Dynamic::Object(a), Dynamic::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<i32> for Dynamic {
    fn from(value: i32) -> Self {
        Dynamic::Int(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Long(value)
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Self {
        Dynamic::Double(value)
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(Rc::from(value))
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(Rc::from(value))
    }
}

/// Shared handle to a type-erased binding object.
///
/// Identity is reference identity: two handles are equal only if they point
/// at the same object. Handles are `!Send`, which ties every binding object
/// to the thread that runs its unit instance.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Box<dyn Any>>>);

impl ObjectRef {
    /// Wrap a freshly constructed binding object.
    pub fn new(object: Box<dyn Any>) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    /// Check whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Mutably borrow the object for the duration of a binding call.
    pub fn borrow_mut(&self) -> Result<RefMut<'_, Box<dyn Any>>, NativeError> {
        self.0.try_borrow_mut().map_err(|_| NativeError::ObjectBusy)
    }

    /// Inspect the object as a concrete type.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.0.try_borrow().ok()?;
        guard.downcast_ref::<T>().map(f)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:p})", Rc::as_ptr(&self.0))
    }
}
