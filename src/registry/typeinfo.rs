// SPDX-License-Identifier: Apache-2.0

//! The normalized type-registry input contract.
//!
//! This is the shape the (out-of-scope) type-registry loader is
//! contractually expected to hand the [`crate::registry::extractor`]: a
//! flattened, already-resolved view of a class library's public surface.
//! The core never reads assembly files; it only ever sees this struct.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::registry::model::Fqn;

/// A type reference as it appears in a parameter or struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeRef {
    Primitive(String),
    ArrayOf(Box<TypeRef>),
    MapOf(Box<TypeRef>),
    Union(Vec<TypeRef>),
    Fqn(Fqn),
}

/// One constructor parameter or struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub type_ref: TypeRef,
    pub optional: bool,
}

impl Parameter {
    pub fn required(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Parameter {
            name: name.into(),
            type_ref,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Parameter {
            name: name.into(),
            type_ref,
            optional: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticMethodDef {
    pub name: String,
    /// The declared return type's FQN. Spec §4.1 only specifies
    /// propagation for class-typed return values; methods returning
    /// anything else are not indexable as an `FqnSource` and are skipped
    /// by the extractor.
    pub return_fqn: Fqn,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticPropertyDef {
    pub name: String,
    pub type_fqn: Fqn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDef {
    pub fqn: Fqn,
    /// Concrete classes with a non-protected constructor are buildable via
    /// `new`; abstract classes and classes without a usable constructor
    /// contribute only their static members.
    pub concrete: bool,
    pub constructor: Option<Vec<Parameter>>,
    pub static_methods: Vec<StaticMethodDef>,
    pub static_properties: Vec<StaticPropertyDef>,
    /// Transitive ancestor classes and implemented interfaces, excluding
    /// `fqn` itself. Computing this transitive closure is the loader's
    /// job; the extractor only walks the flattened list.
    pub ancestors: Vec<Fqn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDef {
    pub fqn: Fqn,
    /// A "data interface" (struct): every member is a plain field and the
    /// interface itself is constructible as a `StructLiteral`. A
    /// non-data interface is behavioral/marker-only (e.g. an interface
    /// implemented by several unrelated classes) and contributes no
    /// `FqnSource` of its own — values of it come only from implementing
    /// classes.
    pub data: bool,
    /// Declaration-ordered fields, meaningful only when `data` is true.
    pub fields: Vec<Parameter>,
    pub super_interfaces: Vec<Fqn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDef {
    pub fqn: Fqn,
    pub members: Vec<String>,
}

/// The full normalized registry consumed by [`crate::registry::extractor`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRegistry {
    pub classes: IndexMap<Fqn, ClassDef>,
    pub interfaces: IndexMap<Fqn, InterfaceDef>,
    pub enums: IndexMap<Fqn, EnumDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: ClassDef) -> Self {
        self.classes.insert(class.fqn.clone(), class);
        self
    }

    pub fn with_interface(mut self, iface: InterfaceDef) -> Self {
        self.interfaces.insert(iface.fqn.clone(), iface);
        self
    }

    pub fn with_enum(mut self, e: EnumDef) -> Self {
        self.enums.insert(e.fqn.clone(), e);
        self
    }
}
