//! Exception types and their hierarchy
//!
//! Rust has no inheritance, so the "is-a" relation between failures is
//! declared explicitly: every exception type owns a static [`ExceptionType`]
//! descriptor naming its direct supertypes. The full ancestor list of a type
//! is computed once, on first use, and cached in the descriptor.
//!
//! Descriptors are normally generated with `#[derive(Exception)]`:
//!
//! ```ignore
//! use problemkit::Exception;
//!
//! #[derive(Debug, thiserror::Error, Exception)]
//! #[error("ghost trouble")]
//! pub struct GhostException;
//!
//! #[derive(Debug, thiserror::Error, Exception)]
//! #[error("there is no Dana")]
//! #[exception(extends(GhostException))]
//! pub struct ZuulException;
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

pub mod builtin;

pub use builtin::{
    BadRequest, FailureCategory, HttpException, InternalServerError, MethodNotAllowed,
    NotAcceptable, NotFound, UnsupportedMediaType,
};

/// Accessor for a direct supertype's descriptor.
pub type ParentFn = fn() -> &'static ExceptionType;

/// Static description of an exception type.
///
/// Identity is the address of the descriptor, so two descriptors with the
/// same name are still distinct types.
pub struct ExceptionType {
    name: &'static str,
    parents: &'static [ParentFn],
    ancestry: OnceLock<Vec<Ancestor>>,
}

/// One entry of a type's ancestry: a supertype and how far away it is.
#[derive(Debug, Clone, Copy)]
pub struct Ancestor {
    pub exception_type: &'static ExceptionType,
    pub distance: usize,
}

impl ExceptionType {
    pub const fn new(name: &'static str, parents: &'static [ParentFn]) -> Self {
        Self {
            name,
            parents,
            ancestry: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Direct supertypes in declaration order.
    pub fn parents(&self) -> impl Iterator<Item = &'static ExceptionType> + '_ {
        self.parents.iter().map(|parent| parent())
    }

    /// The type itself (distance 0) followed by every supertype, ordered by
    /// distance and then by declaration order.
    pub fn ancestry(&'static self) -> &'static [Ancestor] {
        self.ancestry.get_or_init(|| compute_ancestry(self))
    }

    /// Number of `extends` hops from `self` up to `other`, if `other` is a
    /// supertype (or the same type).
    pub fn distance_to(&'static self, other: &ExceptionType) -> Option<usize> {
        self.ancestry()
            .iter()
            .find(|ancestor| ancestor.exception_type == other)
            .map(|ancestor| ancestor.distance)
    }

    pub fn is_subtype_of(&'static self, other: &ExceptionType) -> bool {
        self.distance_to(other).is_some()
    }
}

// Breadth-first, so the first time a type is reached is at its shortest
// distance. Already visited types are skipped, which also stops cycles.
fn compute_ancestry(root: &'static ExceptionType) -> Vec<Ancestor> {
    let mut ancestry: Vec<Ancestor> = Vec::new();
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((exception_type, distance)) = queue.pop_front() {
        if ancestry
            .iter()
            .any(|ancestor| ancestor.exception_type == exception_type)
        {
            continue;
        }
        ancestry.push(Ancestor {
            exception_type,
            distance,
        });
        for parent in exception_type.parents() {
            queue.push_back((parent, distance + 1));
        }
    }

    ancestry
}

impl PartialEq for ExceptionType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for ExceptionType {}

impl Hash for ExceptionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Debug for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionType")
            .field("name", &self.name)
            .field(
                "parents",
                &self.parents().map(ExceptionType::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A failure that can be resolved into an error response.
pub trait Exception: std::error::Error + Send + Sync + 'static {
    fn exception_type(&self) -> &'static ExceptionType;

    fn as_any(&self) -> &dyn Any;
}

/// Static access to an exception type's descriptor.
pub trait ExceptionClass: Exception + Sized {
    fn descriptor() -> &'static ExceptionType;
}

impl dyn Exception {
    /// True if the concrete type is exactly `T`.
    pub fn is<T: Exception>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Exception>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// True if this exception is a `T` or one of its subtypes.
    pub fn is_instance_of<T: ExceptionClass>(&self) -> bool {
        self.exception_type().is_subtype_of(T::descriptor())
    }
}
