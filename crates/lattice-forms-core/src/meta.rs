//! Metadata registry for bindable models.
//!
//! A model type is introspected once into a [`MetaObject`]: an ordered list of
//! shared [`Metadata`] property descriptors plus the group definitions declared
//! on the type. Meta-objects live for the whole program and are registered in
//! the global [`TypeRegistry`] keyed by [`TypeId`], so metadata is computed on
//! first use and cached forever.
//!
//! `#[derive(Model)]` generates all of this. Hand-written models use the
//! builders directly:
//!
//! ```
//! use std::any::Any;
//! use std::sync::OnceLock;
//! use lattice_forms_core::{FieldValue, MetaObject, Metadata, Model, TypeRegistry, Value};
//! use lattice_forms_core::annotation::Group;
//!
//! struct Point {
//!     x: i32,
//! }
//!
//! impl Point {
//!     fn static_meta() -> &'static MetaObject {
//!         static META: OnceLock<MetaObject> = OnceLock::new();
//!         TypeRegistry::static_meta(&META, || {
//!             MetaObject::builder::<Point>("Point")
//!                 .property(
//!                     Metadata::builder::<Point, i32>("x")
//!                         .getter(|obj| obj.downcast_ref::<Point>().map(|p| p.x.to_value()))
//!                         .setter(|obj, value| {
//!                             match (obj.downcast_mut::<Point>(), i32::from_value(value)) {
//!                                 (Some(p), Some(x)) => {
//!                                     p.x = x;
//!                                     true
//!                                 }
//!                                 _ => false,
//!                             }
//!                         })
//!                         .annotate(Group(1)),
//!                 )
//!                 .build()
//!         })
//!     }
//! }
//!
//! impl Model for Point {
//!     fn meta_object(&self) -> &'static MetaObject {
//!         Self::static_meta()
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//!
//! let mut point = Point { x: 1 };
//! let x = Point::static_meta().property("x").unwrap();
//! assert!(x.set_value(&mut point, Value::Int(5)));
//! assert_eq!(x.get_value(&point), Some(Value::Int(5)));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::annotation::{Annotation, DisplayName, Exclude, GroupDetail};
use crate::error::{MetaError, MetaResult};
use crate::logging::targets;
use crate::value::{FieldValue, Value, ValueKind};

/// A type whose properties can be bound to a form.
///
/// Usually implemented with `#[derive(Model)]`.
pub trait Model: Any + Send + Sync {
    /// The cached meta-object describing this type.
    fn meta_object(&self) -> &'static MetaObject;

    /// Access the model as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Access the model as mutable `Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Model {
    /// Downcast to the concrete model type.
    pub fn downcast_ref<T: Model>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to the concrete model type.
    pub fn downcast_mut<T: Model>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Type-erased property getter.
pub type Getter = fn(&dyn Any) -> Option<Value>;

/// Type-erased property setter. Returns `false` when the value was rejected.
pub type Setter = fn(&mut dyn Any, Value) -> bool;

/// Immutable descriptor of one model property.
///
/// Equality and hashing use the declaring type and the property name.
pub struct Metadata {
    owner_type: TypeId,
    owner_name: &'static str,
    name: &'static str,
    type_name: &'static str,
    kind: ValueKind,
    nullable: bool,
    getter: Option<Getter>,
    setter: Option<Setter>,
    annotations: Vec<Arc<dyn Annotation>>,
}

impl Metadata {
    /// Start describing property `name` of type `T` declared on `Owner`.
    pub fn builder<Owner: Any, T: FieldValue + 'static>(name: &'static str) -> MetadataBuilder {
        MetadataBuilder {
            inner: Metadata {
                owner_type: TypeId::of::<Owner>(),
                owner_name: short_type_name(std::any::type_name::<Owner>()),
                name,
                type_name: std::any::type_name::<T>(),
                kind: T::KIND,
                nullable: T::NULLABLE,
                getter: None,
                setter: None,
                annotations: Vec::new(),
            },
        }
    }

    /// The property name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name of the declaring type.
    pub fn owner_name(&self) -> &'static str {
        self.owner_name
    }

    /// The `TypeId` of the declaring type.
    pub fn owner_type(&self) -> TypeId {
        self.owner_type
    }

    /// The Rust type name of the property.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The kind of value the property holds.
    pub fn value_kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the property accepts [`Value::Null`].
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the property has a getter.
    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether the property has a setter.
    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    /// Case-insensitive name comparison, under [`property_key`].
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name || property_key(self.name) == property_key(name)
    }

    /// The first annotation of type `T`.
    pub fn annotation<T: Any>(&self) -> Option<&T> {
        self.annotations.iter().find_map(|a| a.downcast_ref::<T>())
    }

    /// All annotations of type `T`, in declaration order.
    pub fn annotations<T: Any>(&self) -> impl Iterator<Item = &T> + '_ {
        self.annotations.iter().filter_map(|a| a.downcast_ref::<T>())
    }

    /// Whether an annotation of type `T` is present.
    pub fn has_annotation<T: Any>(&self) -> bool {
        self.annotations.iter().any(|a| a.is::<T>())
    }

    /// Every annotation on the property.
    pub fn all_annotations(&self) -> impl Iterator<Item = &dyn Annotation> + '_ {
        self.annotations.iter().map(|a| a.as_ref())
    }

    /// Whether the property carries [`Exclude`].
    pub fn is_excluded(&self) -> bool {
        self.has_annotation::<Exclude>()
    }

    /// The label to show: [`DisplayName`] or the humanized property name.
    pub fn display_name(&self) -> String {
        self.annotation::<DisplayName>()
            .map(|d| d.0.clone())
            .unwrap_or_else(|| humanize(self.name))
    }

    /// Read the property from a model.
    ///
    /// Returns `None` when the property is write-only or the model is of a
    /// different type.
    pub fn get_value(&self, model: &dyn Model) -> Option<Value> {
        let getter = self.getter?;
        getter(Model::as_any(model))
    }

    /// Write the property on a model. Returns `true` on success.
    pub fn set_value(&self, model: &mut dyn Model, value: Value) -> bool {
        match self.setter {
            Some(setter) => setter(Model::as_any_mut(model), value),
            None => false,
        }
    }

    /// Write the property, reporting why a write failed.
    pub fn try_set_value(&self, model: &mut dyn Model, value: Value) -> MetaResult<()> {
        let Some(setter) = self.setter else {
            return Err(MetaError::ReadOnly {
                name: self.name.to_string(),
            });
        };
        let shown = format!("{value:?}");
        if setter(Model::as_any_mut(model), value) {
            Ok(())
        } else {
            Err(MetaError::TypeMismatch {
                name: self.name.to_string(),
                expected: self.type_name,
                value: shown,
            })
        }
    }
}

impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        self.owner_type == other.owner_type && self.name == other.name
    }
}

impl Eq for Metadata {}

impl Hash for Metadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner_type.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("owner", &self.owner_name)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .field("annotations", &self.annotations)
            .finish()
    }
}

/// Builder for [`Metadata`].
pub struct MetadataBuilder {
    inner: Metadata,
}

impl MetadataBuilder {
    /// Set the getter.
    pub fn getter(mut self, getter: Getter) -> Self {
        self.inner.getter = Some(getter);
        self
    }

    /// Set the setter.
    pub fn setter(mut self, setter: Setter) -> Self {
        self.inner.setter = Some(setter);
        self
    }

    /// Attach an annotation.
    pub fn annotate<A: Annotation>(mut self, annotation: A) -> Self {
        self.inner.annotations.push(Arc::new(annotation));
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> Arc<Metadata> {
        Arc::new(self.inner)
    }
}

/// Which properties [`MetaObject::metadatas`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataFilter {
    /// Only properties with a getter.
    pub readable: bool,
    /// Only properties with a setter.
    pub writable: bool,
    /// Include properties carrying [`Exclude`].
    pub include_excluded: bool,
}

impl MetadataFilter {
    /// Every property.
    pub const ALL: Self = Self {
        readable: false,
        writable: false,
        include_excluded: true,
    };

    /// Readable and writable properties that are not excluded.
    pub const BINDABLE: Self = Self {
        readable: true,
        writable: true,
        include_excluded: false,
    };

    /// Whether the property passes the filter.
    pub fn accepts(&self, metadata: &Metadata) -> bool {
        (!self.readable || metadata.can_read())
            && (!self.writable || metadata.can_write())
            && (self.include_excluded || !metadata.is_excluded())
    }
}

/// Static description of a model type.
pub struct MetaObject {
    type_id: TypeId,
    type_name: &'static str,
    properties: Vec<Arc<Metadata>>,
    groups: Vec<GroupDetail>,
}

impl MetaObject {
    /// Start describing model type `T`.
    pub fn builder<T: Any>(type_name: &'static str) -> MetaObjectBuilder {
        MetaObjectBuilder {
            inner: MetaObject {
                type_id: TypeId::of::<T>(),
                type_name,
                properties: Vec::new(),
                groups: Vec::new(),
            },
        }
    }

    /// The described type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// All properties in declaration order.
    pub fn properties(&self) -> &[Arc<Metadata>] {
        &self.properties
    }

    /// Group definitions declared on the type.
    pub fn groups(&self) -> &[GroupDetail] {
        &self.groups
    }

    /// Look up a property by name; exact match first, then case-insensitive.
    pub fn property(&self, name: &str) -> Option<&Arc<Metadata>> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.properties.iter().find(|p| p.matches_name(name)))
    }

    /// Properties accepted by `filter`, in declaration order.
    pub fn metadatas(&self, filter: MetadataFilter) -> Vec<Arc<Metadata>> {
        self.properties
            .iter()
            .filter(|p| filter.accepts(p))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for MetaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaObject")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties.len())
            .field("groups", &self.groups)
            .finish()
    }
}

/// Builder for [`MetaObject`].
pub struct MetaObjectBuilder {
    inner: MetaObject,
}

impl MetaObjectBuilder {
    /// Add a property.
    pub fn property(mut self, property: MetadataBuilder) -> Self {
        self.inner.properties.push(property.build());
        self
    }

    /// Declare a group.
    pub fn group(mut self, group: GroupDetail) -> Self {
        self.inner.groups.push(group);
        self
    }

    /// Finish the meta-object.
    pub fn build(self) -> MetaObject {
        self.inner
    }
}

static TYPE_REGISTRY: OnceLock<RwLock<HashMap<TypeId, &'static MetaObject>>> = OnceLock::new();

/// Global registry of model meta-objects, keyed by type identity.
pub struct TypeRegistry;

impl TypeRegistry {
    fn entries() -> &'static RwLock<HashMap<TypeId, &'static MetaObject>> {
        TYPE_REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
    }

    /// Register a meta-object. Registering the same type again is a no-op.
    pub fn register(meta: &'static MetaObject) {
        let mut entries = Self::entries().write();
        if entries.insert(meta.type_id, meta).is_none() {
            tracing::debug!(
                target: targets::META,
                type_name = meta.type_name,
                properties = meta.properties.len(),
                "registered model metadata"
            );
        }
    }

    /// Initialize a type's cached meta-object on first use and register it.
    ///
    /// This is what `#[derive(Model)]` expands to.
    pub fn static_meta(
        cell: &'static OnceLock<MetaObject>,
        init: impl FnOnce() -> MetaObject,
    ) -> &'static MetaObject {
        if let Some(meta) = cell.get() {
            return meta;
        }
        let meta = cell.get_or_init(init);
        Self::register(meta);
        meta
    }

    /// The meta-object for a type, if registered.
    pub fn get(type_id: TypeId) -> Option<&'static MetaObject> {
        Self::entries().read().get(&type_id).copied()
    }

    /// The meta-object for `T`, if registered.
    pub fn of<T: Model>() -> Option<&'static MetaObject> {
        Self::get(TypeId::of::<T>())
    }

    /// Find a registered meta-object by type name.
    pub fn find_by_name(type_name: &str) -> Option<&'static MetaObject> {
        Self::entries()
            .read()
            .values()
            .find(|m| m.type_name == type_name)
            .copied()
    }

    /// Whether metadata for the type is registered.
    pub fn is_registered(type_id: TypeId) -> bool {
        Self::entries().read().contains_key(&type_id)
    }

    /// Look up one property of a registered type.
    pub fn metadata(type_id: TypeId, name: &str) -> MetaResult<Arc<Metadata>> {
        let meta = Self::get(type_id).ok_or_else(|| MetaError::UnknownType {
            type_name: format!("{type_id:?}"),
        })?;
        meta.property(name)
            .cloned()
            .ok_or_else(|| MetaError::unknown_property(meta.type_name, name))
    }

    /// The properties of a registered type accepted by `filter`.
    pub fn metadatas(type_id: TypeId, filter: MetadataFilter) -> MetaResult<Vec<Arc<Metadata>>> {
        let meta = Self::get(type_id).ok_or_else(|| MetaError::UnknownType {
            type_name: format!("{type_id:?}"),
        })?;
        Ok(meta.metadatas(filter))
    }
}

/// The key property names are compared and indexed by: trimmed, with full
/// Unicode lowercasing.
pub fn property_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Turn an identifier into a label: `first_name` and `firstName` both become
/// `First Name`.
pub fn humanize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.trim_start_matches("r#").chars() {
        if ch == '_' || ch == '-' {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            out.push(' ');
        }
        if out.is_empty() || out.ends_with(' ') {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
    }
    out.trim_end().to_string()
}

fn short_type_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Group, WatchOn};

    struct Sample {
        name: String,
        age: Option<u32>,
        secret: String,
    }

    impl Sample {
        fn static_meta() -> &'static MetaObject {
            static META: OnceLock<MetaObject> = OnceLock::new();
            TypeRegistry::static_meta(&META, || {
                MetaObject::builder::<Sample>("Sample")
                    .group(GroupDetail::new(1, "Main").with_priority(5))
                    .property(
                        Metadata::builder::<Sample, String>("name")
                            .getter(|obj| obj.downcast_ref::<Sample>().map(|s| s.name.to_value()))
                            .setter(|obj, value| {
                                match (obj.downcast_mut::<Sample>(), String::from_value(value)) {
                                    (Some(s), Some(v)) => {
                                        s.name = v;
                                        true
                                    }
                                    _ => false,
                                }
                            })
                            .annotate(Group(1))
                            .annotate(WatchOn::new(["age"]))
                            .annotate(WatchOn::new(["secret"])),
                    )
                    .property(
                        Metadata::builder::<Sample, Option<u32>>("age")
                            .getter(|obj| obj.downcast_ref::<Sample>().map(|s| s.age.to_value()))
                            .setter(|obj, value| {
                                match (obj.downcast_mut::<Sample>(), <Option<u32>>::from_value(value)) {
                                    (Some(s), Some(v)) => {
                                        s.age = v;
                                        true
                                    }
                                    _ => false,
                                }
                            }),
                    )
                    .property(
                        Metadata::builder::<Sample, String>("secret")
                            .getter(|obj| obj.downcast_ref::<Sample>().map(|s| s.secret.to_value()))
                            .annotate(Exclude),
                    )
                    .build()
            })
        }
    }

    impl Model for Sample {
        fn meta_object(&self) -> &'static MetaObject {
            Self::static_meta()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn sample() -> Sample {
        Sample {
            name: "Ada".into(),
            age: None,
            secret: "x".into(),
        }
    }

    #[test]
    fn test_metadata_is_cached_and_registered() {
        let first = Sample::static_meta() as *const MetaObject;
        let second = Sample::static_meta() as *const MetaObject;
        assert_eq!(first, second);
        assert!(TypeRegistry::is_registered(TypeId::of::<Sample>()));
        assert!(TypeRegistry::of::<Sample>().is_some());
    }

    #[test]
    fn test_get_and_set() {
        let mut model = sample();
        Sample::static_meta();
        let age = TypeRegistry::metadata(TypeId::of::<Sample>(), "AGE").unwrap();
        assert_eq!(age.get_value(&model), Some(Value::Null));
        assert!(age.set_value(&mut model, Value::Int(41)));
        assert_eq!(model.age, Some(41));
        assert!(!age.set_value(&mut model, Value::Text("old".into())));
        assert!(age.is_nullable());
    }

    #[test]
    fn test_read_only_property() {
        let mut model = sample();
        let secret = Sample::static_meta().property("secret").unwrap();
        assert!(secret.can_read());
        assert!(!secret.can_write());
        let err = secret
            .try_set_value(&mut model, Value::Text("y".into()))
            .unwrap_err();
        assert!(matches!(err, MetaError::ReadOnly { .. }));
    }

    #[test]
    fn test_annotation_lookup() {
        let name = Sample::static_meta().property("name").unwrap();
        assert_eq!(name.annotation::<Group>(), Some(&Group(1)));
        let watched: Vec<_> = name
            .annotations::<WatchOn>()
            .flat_map(|w| w.0.iter().cloned())
            .collect();
        assert_eq!(watched, vec!["age".to_string(), "secret".to_string()]);
        assert!(!name.has_annotation::<Exclude>());
    }

    #[test]
    fn test_bindable_filter() {
        let bindable = Sample::static_meta().metadatas(MetadataFilter::BINDABLE);
        let names: Vec<_> = bindable.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["name", "age"]);
        assert_eq!(Sample::static_meta().metadatas(MetadataFilter::ALL).len(), 3);
    }

    #[test]
    fn test_unknown_lookups() {
        Sample::static_meta();
        let err = TypeRegistry::metadata(TypeId::of::<Sample>(), "missing").unwrap_err();
        assert!(matches!(err, MetaError::UnknownProperty { owner: "Sample", .. }));
        assert!(TypeRegistry::metadata(TypeId::of::<u8>(), "x").is_err());
    }

    #[test]
    fn test_metadata_equality_by_owner_and_name() {
        let meta = Sample::static_meta();
        let a = meta.property("name").unwrap();
        let b = meta.property("NAME").unwrap();
        assert_eq!(a, b);
        assert_ne!(**a, **meta.property("age").unwrap());
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("first_name"), "First Name");
        assert_eq!(humanize("firstName"), "First Name");
        assert_eq!(humanize("zip"), "Zip");
        assert_eq!(humanize("address_line2"), "Address Line2");
    }
}
