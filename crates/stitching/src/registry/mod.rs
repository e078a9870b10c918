//! The merged type map: a name-indexed arena of type definitions.
//!
//! Types refer to each other by name only. Field result types are stored in
//! GraphQL wrapping notation (`[Booking!]!`) and interpreted through
//! [`TypeName`], so cyclic references (`Booking.property.bookings…`) cost
//! nothing at construction time and resolve through the arena at execution
//! time.

pub mod field_set;
pub mod resolvers;

use indexmap::IndexMap;

pub use self::{field_set::FieldSet, resolvers::Resolver};

/// The built-in scalars. These are shared among contributions and never
/// conflict.
pub const BUILTIN_SCALARS: [&str; 5] = ["ID", "String", "Boolean", "Int", "Float"];

/// A view over a type name in wrapping notation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeName<'a> {
    /// `[T]` or `[T]!` stripped of one list layer.
    List(&'a str),
    /// `T!` stripped of nothing yet.
    NonNull(&'a str),
    /// A bare named type.
    Named(&'a str),
}

impl<'a> TypeName<'a> {
    /// Interpret the outermost wrapper of `ty`.
    pub fn create(ty: &str) -> TypeName<'_> {
        if let Some(inner) = ty.strip_suffix('!') {
            TypeName::NonNull(inner)
        } else if let Some(rest) = ty.strip_prefix('[') {
            TypeName::List(&rest[..rest.len() - 1])
        } else {
            TypeName::Named(ty)
        }
    }

    /// The innermost named type of `ty`, with all wrappers stripped.
    pub fn concrete(ty: &str) -> &str {
        match TypeName::create(ty) {
            TypeName::List(inner) | TypeName::NonNull(inner) => Self::concrete(inner),
            TypeName::Named(name) => name,
        }
    }

    /// Whether the outermost wrapper forbids null.
    pub fn is_non_null(ty: &str) -> bool {
        matches!(TypeName::create(ty), TypeName::NonNull(_))
    }
}

/// An argument or input object field definition.
#[derive(Clone, Debug)]
pub struct MetaInputValue {
    /// The argument name.
    pub name: String,
    /// The declared input type, in wrapping notation.
    pub ty: String,
    /// The default applied when the argument is absent.
    pub default_value: Option<async_graphql_value::ConstValue>,
}

/// An output field definition together with its resolution strategy.
#[derive(Clone)]
pub struct MetaField {
    /// The field name.
    pub name: String,
    /// Argument definitions, in declaration order.
    pub args: IndexMap<String, MetaInputValue>,
    /// The declared result type, in wrapping notation.
    pub ty: String,
    /// How the field is resolved in this schema.
    pub resolver: Resolver,
    /// Parent fields that must be fetched alongside the parent for this
    /// field's resolver to run.
    pub requires: Option<FieldSet>,
}

impl std::fmt::Debug for MetaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaField")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// An object type definition.
#[derive(Clone, Debug, Default)]
pub struct ObjectType {
    /// Fields, in declaration order.
    pub fields: IndexMap<String, MetaField>,
    /// Interfaces this object declares.
    pub implements: Vec<String>,
}

/// An interface type definition.
#[derive(Clone, Debug, Default)]
pub struct InterfaceType {
    /// Fields, in declaration order.
    pub fields: IndexMap<String, MetaField>,
}

/// A union type definition.
#[derive(Clone, Debug, Default)]
pub struct UnionType {
    /// Member object type names.
    pub members: Vec<String>,
}

/// An enum type definition.
#[derive(Clone, Debug, Default)]
pub struct EnumType {
    /// Declared value names, in declaration order.
    pub values: Vec<String>,
}

/// An input object type definition.
#[derive(Clone, Debug, Default)]
pub struct InputObjectType {
    /// Input fields, in declaration order.
    pub input_fields: IndexMap<String, MetaInputValue>,
}

/// The kind tag of a [`MetaType`], used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// `type`
    Object,
    /// `interface`
    Interface,
    /// `union`
    Union,
    /// `enum`
    Enum,
    /// `input`
    InputObject,
    /// `scalar`
    Scalar,
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TypeKind::Object => "object",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::InputObject => "input object",
            TypeKind::Scalar => "scalar",
        };
        f.write_str(s)
    }
}

/// A named type definition in the arena.
#[derive(Clone, Debug)]
pub enum MetaType {
    /// An object type.
    Object {
        /// The type name.
        name: String,
        /// The definition body.
        object: ObjectType,
    },
    /// An interface type.
    Interface {
        /// The type name.
        name: String,
        /// The definition body.
        interface: InterfaceType,
    },
    /// A union type.
    Union {
        /// The type name.
        name: String,
        /// The definition body.
        union: UnionType,
    },
    /// An enum type.
    Enum {
        /// The type name.
        name: String,
        /// The definition body.
        enum_type: EnumType,
    },
    /// An input object type.
    InputObject {
        /// The type name.
        name: String,
        /// The definition body.
        input_object: InputObjectType,
    },
    /// A scalar type.
    Scalar {
        /// The type name.
        name: String,
    },
}

impl MetaType {
    /// The type's name.
    pub fn name(&self) -> &str {
        match self {
            MetaType::Object { name, .. }
            | MetaType::Interface { name, .. }
            | MetaType::Union { name, .. }
            | MetaType::Enum { name, .. }
            | MetaType::InputObject { name, .. }
            | MetaType::Scalar { name } => name,
        }
    }

    /// The type's kind tag.
    pub fn kind(&self) -> TypeKind {
        match self {
            MetaType::Object { .. } => TypeKind::Object,
            MetaType::Interface { .. } => TypeKind::Interface,
            MetaType::Union { .. } => TypeKind::Union,
            MetaType::Enum { .. } => TypeKind::Enum,
            MetaType::InputObject { .. } => TypeKind::InputObject,
            MetaType::Scalar { .. } => TypeKind::Scalar,
        }
    }

    /// The output field named `name`, for objects and interfaces.
    pub fn field(&self, name: &str) -> Option<&MetaField> {
        match self {
            MetaType::Object { object, .. } => object.fields.get(name),
            MetaType::Interface { interface, .. } => interface.fields.get(name),
            _ => None,
        }
    }

    /// Mutable access to the output field named `name`.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut MetaField> {
        match self {
            MetaType::Object { object, .. } => object.fields.get_mut(name),
            MetaType::Interface { interface, .. } => interface.fields.get_mut(name),
            _ => None,
        }
    }

    /// The field map of an object or interface.
    pub fn fields(&self) -> Option<&IndexMap<String, MetaField>> {
        match self {
            MetaType::Object { object, .. } => Some(&object.fields),
            MetaType::Interface { interface, .. } => Some(&interface.fields),
            _ => None,
        }
    }

    /// Whether selection sets apply to this type.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            MetaType::Object { .. } | MetaType::Interface { .. } | MetaType::Union { .. }
        )
    }

    /// Whether concrete-type resolution is needed before completing a value
    /// of this type.
    pub fn is_abstract(&self) -> bool {
        matches!(self, MetaType::Interface { .. } | MetaType::Union { .. })
    }

    /// Whether this type completes as a leaf (no sub-selection).
    pub fn is_leaf(&self) -> bool {
        matches!(self, MetaType::Enum { .. } | MetaType::Scalar { .. })
    }
}

/// The name-indexed type arena of one schema, with its operation roots.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    /// All named types, keyed by name, in first-seen order.
    pub types: IndexMap<String, MetaType>,
    /// The query root type name.
    pub query_type: String,
    /// The mutation root type name, if any.
    pub mutation_type: Option<String>,
}

impl Registry {
    /// The type named `name`, if defined.
    pub fn lookup(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    /// The innermost named type of a wrapped type string.
    pub fn lookup_ty(&self, ty: &str) -> Option<&MetaType> {
        self.types.get(TypeName::concrete(ty))
    }

    /// The root type for the given operation.
    pub fn root_type(&self, operation: async_graphql_parser::types::OperationType) -> Option<&MetaType> {
        use async_graphql_parser::types::OperationType;
        let name = match operation {
            OperationType::Query => Some(self.query_type.as_str()),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => None,
        };
        name.and_then(|name| self.types.get(name))
    }

    /// The concrete object types a value of `abstract_name` can take.
    pub fn possible_types(&self, abstract_name: &str) -> Vec<&str> {
        match self.types.get(abstract_name) {
            Some(MetaType::Union { union, .. }) => union.members.iter().map(String::as_str).collect(),
            Some(MetaType::Interface { name, .. }) => self
                .types
                .values()
                .filter_map(|ty| match ty {
                    MetaType::Object { name: object_name, object }
                        if object.implements.iter().any(|i| i == name) =>
                    {
                        Some(object_name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            Some(MetaType::Object { name, .. }) => vec![name.as_str()],
            _ => Vec::new(),
        }
    }

    /// Whether a value whose concrete type is `concrete` satisfies a type
    /// condition on `condition`.
    pub fn type_applies(&self, condition: &str, concrete: &str) -> bool {
        condition == concrete || self.possible_types(condition).contains(&concrete)
    }

    /// Whether `name` is one of the built-in scalars.
    pub fn is_builtin_scalar(name: &str) -> bool {
        BUILTIN_SCALARS.contains(&name)
    }

    /// Insert the built-in scalars that `types` references but no definition
    /// provides.
    pub fn ensure_builtin_scalars(&mut self) {
        for name in BUILTIN_SCALARS {
            if !self.types.contains_key(name) {
                self.types
                    .insert(name.to_string(), MetaType::Scalar { name: name.to_string() });
            }
        }
    }
}
