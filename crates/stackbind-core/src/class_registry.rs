//! Registry of bound native classes.
//!
//! Maps each native type to the class it was registered as: its display
//! name, qualified name, prototype table and parent prototype. The registry
//! also records upcast edges, accessors from a child type to the embedded
//! parent value, so that methods bound on a parent can borrow their receiver
//! out of a child object.

use std::any::{Any, TypeId};
use std::fmt;

use rustc_hash::FxHashMap;

use crate::TypeHash;
use crate::arena::ErasedObject;
use crate::error::RegistrationError;
use crate::handle::TableRef;

/// A native type that can be bound as a class.
///
/// Usually derived with `#[derive(NativeClass)]`.
pub trait NativeClass: Any + Send + Sync {
    /// Default class name.
    const NAME: &'static str;
}

/// Metadata of one registered class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntry {
    /// Name the prototype is published under
    pub name: String,
    /// `namespace.name`, or `name` for the global namespace
    pub qualified_name: String,
    /// Hash of the qualified name
    pub id: TypeHash,
    /// Rust type name, for diagnostics
    pub type_name: &'static str,
    pub prototype: TableRef,
    pub parent: Option<TableRef>,
}

trait Upcast: Send + Sync {
    fn target(&self) -> TypeId;
    fn view<'o>(&self, object: &'o ErasedObject) -> Option<&'o ErasedObject>;
    fn view_mut<'o>(&self, object: &'o mut ErasedObject) -> Option<&'o mut ErasedObject>;
}

struct Edge<C, P> {
    get: fn(&C) -> &P,
    get_mut: fn(&mut C) -> &mut P,
}

impl<C: Any + Send + Sync, P: Any + Send + Sync> Upcast for Edge<C, P> {
    fn target(&self) -> TypeId {
        TypeId::of::<P>()
    }

    fn view<'o>(&self, object: &'o ErasedObject) -> Option<&'o ErasedObject> {
        let child = object.downcast_ref::<C>()?;
        let parent: &ErasedObject = (self.get)(child);
        Some(parent)
    }

    fn view_mut<'o>(&self, object: &'o mut ErasedObject) -> Option<&'o mut ErasedObject> {
        let child = object.downcast_mut::<C>()?;
        let parent: &mut ErasedObject = (self.get_mut)(child);
        Some(parent)
    }
}

/// Type identity → class metadata, plus upcast edges.
#[derive(Default)]
pub struct ClassRegistry {
    entries: FxHashMap<TypeId, ClassEntry>,
    by_prototype: FxHashMap<TableRef, TypeId>,
    upcasts: FxHashMap<TypeId, Vec<Box<dyn Upcast>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the class of `T`. Each type may be registered once.
    pub fn insert<T: Any>(&mut self, entry: ClassEntry) -> Result<(), RegistrationError> {
        let type_id = TypeId::of::<T>();
        if let Some(existing) = self.entries.get(&type_id) {
            return Err(RegistrationError::TypeAlreadyRegistered {
                type_name: std::any::type_name::<T>(),
                name: existing.qualified_name.clone(),
            });
        }
        self.by_prototype.insert(entry.prototype, type_id);
        self.entries.insert(type_id, entry);
        Ok(())
    }

    pub fn get<T: Any>(&self) -> Option<&ClassEntry> {
        self.entries.get(&TypeId::of::<T>())
    }

    pub fn get_by_type_id(&self, type_id: TypeId) -> Option<&ClassEntry> {
        self.entries.get(&type_id)
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Prototype table of `T`'s class.
    pub fn prototype_of<T: Any>(&self) -> Option<TableRef> {
        self.get::<T>().map(|entry| entry.prototype)
    }

    /// Class whose prototype is `table`.
    pub fn by_prototype(&self, table: TableRef) -> Option<&ClassEntry> {
        self.by_prototype
            .get(&table)
            .and_then(|type_id| self.entries.get(type_id))
    }

    /// Look a class up by qualified name.
    pub fn by_name(&self, qualified_name: &str) -> Option<&ClassEntry> {
        self.entries
            .values()
            .find(|entry| entry.qualified_name == qualified_name)
    }

    /// The prototype chain starting at `prototype`: the table itself, its
    /// parent, the parent's parent, and so on. Method lookup consults the
    /// tables in this order.
    pub fn ancestors(&self, prototype: TableRef) -> Vec<TableRef> {
        let mut chain = vec![prototype];
        let mut current = prototype;
        while let Some(parent) = self.by_prototype(current).and_then(|entry| entry.parent) {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassEntry> {
        self.entries.values()
    }

    /// Register accessors from child `C` to its embedded parent `P`.
    ///
    /// Returns false (and records nothing) when the edge would close a
    /// cycle or already exists.
    pub fn add_upcast<C, P>(&mut self, get: fn(&C) -> &P, get_mut: fn(&mut C) -> &mut P) -> bool
    where
        C: Any + Send + Sync,
        P: Any + Send + Sync,
    {
        let child = TypeId::of::<C>();
        let parent = TypeId::of::<P>();
        if self.reaches(parent, child) {
            tracing::warn!(
                child = std::any::type_name::<C>(),
                parent = std::any::type_name::<P>(),
                "upcast refused: would create a cycle"
            );
            return false;
        }
        let edges = self.upcasts.entry(child).or_default();
        if edges.iter().any(|edge| edge.target() == parent) {
            return false;
        }
        edges.push(Box::new(Edge { get, get_mut }));
        true
    }

    /// Check whether an object of type `from` can be viewed as `to`.
    pub fn reaches(&self, from: TypeId, to: TypeId) -> bool {
        from == to
            || self.upcasts.get(&from).is_some_and(|edges| {
                edges.iter().any(|edge| self.reaches(edge.target(), to))
            })
    }

    /// Borrow an erased object of type `actual` as `T`, following upcasts.
    pub fn view<'o, T: Any>(&self, object: &'o ErasedObject, actual: TypeId) -> Option<&'o T> {
        if actual == TypeId::of::<T>() {
            return object.downcast_ref::<T>();
        }
        let edges = self.upcasts.get(&actual)?;
        edges.iter().find_map(|edge| {
            let parent = edge.view(object)?;
            self.view::<T>(parent, edge.target())
        })
    }

    /// Mutable variant of [`view`](Self::view).
    pub fn view_mut<'o, T: Any>(
        &self,
        object: &'o mut ErasedObject,
        actual: TypeId,
    ) -> Option<&'o mut T> {
        let wanted = TypeId::of::<T>();
        if actual == wanted {
            return object.downcast_mut::<T>();
        }
        let edge = self
            .upcasts
            .get(&actual)?
            .iter()
            .find(|edge| self.reaches(edge.target(), wanted))?;
        let parent = edge.view_mut(object)?;
        self.view_mut::<T>(parent, edge.target())
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.entries.len())
            .field("upcasts", &self.upcasts.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
