//! Lowering of parsed SDL into registry definitions.
//!
//! Used twice: by [`Schema::build`](crate::schema::Schema::build) for
//! standalone executable schemas, and by the schema recorder for SDL
//! contributions, where `extend` declarations are split off into a deferred
//! list instead of being applied.

use async_graphql_parser::types::{
    self as ast, ServiceDocument, TypeKind, TypeSystemDefinition,
};

use crate::registry::{
    EnumType, InputObjectType, InterfaceType, MetaField, MetaInputValue, MetaType, ObjectType, Resolver, UnionType,
};

/// What a type extension appends to its target. Normalized per target kind:
/// fields for objects and interfaces, members for unions, values for enums.
#[derive(Clone, Debug)]
pub(crate) struct TypeExtension {
    /// The extension's target type name.
    pub target: String,
    /// Fields to append. These have no upstream origin; they resolve
    /// [`Resolver::Unbound`] until a link resolver is bound.
    pub fields: Vec<MetaField>,
    /// Union members to append.
    pub members: Vec<String>,
    /// Enum values to append.
    pub values: Vec<String>,
}

/// The lowered contents of one SDL document.
#[derive(Default)]
pub(crate) struct SdlContents {
    pub types: Vec<MetaType>,
    pub extensions: Vec<TypeExtension>,
    pub query_root: Option<String>,
    pub mutation_root: Option<String>,
}

/// Lower a parsed SDL document. `default_resolver` is attached to every
/// output field of a full type definition; extension fields always get
/// [`Resolver::Unbound`].
pub(crate) fn lower_document(
    document: &ServiceDocument,
    default_resolver: &Resolver,
) -> Result<SdlContents, String> {
    let mut contents = SdlContents::default();

    for definition in &document.definitions {
        match definition {
            TypeSystemDefinition::Schema(schema) => {
                if let Some(query) = &schema.node.query {
                    contents.query_root = Some(query.node.to_string());
                }
                if let Some(mutation) = &schema.node.mutation {
                    contents.mutation_root = Some(mutation.node.to_string());
                }
            }
            TypeSystemDefinition::Directive(_) => {}
            TypeSystemDefinition::Type(definition) if definition.node.extend => {
                contents.extensions.push(lower_extension(&definition.node)?);
            }
            TypeSystemDefinition::Type(definition) => {
                contents.types.push(lower_type(&definition.node, default_resolver));
            }
        }
    }

    Ok(contents)
}

fn lower_type(definition: &ast::TypeDefinition, default_resolver: &Resolver) -> MetaType {
    let name = definition.name.node.to_string();
    match &definition.kind {
        TypeKind::Scalar => MetaType::Scalar { name },
        TypeKind::Object(object) => MetaType::Object {
            name,
            object: ObjectType {
                fields: object
                    .fields
                    .iter()
                    .map(|field| {
                        let field = lower_field(&field.node, default_resolver);
                        (field.name.clone(), field)
                    })
                    .collect(),
                implements: object.implements.iter().map(|name| name.node.to_string()).collect(),
            },
        },
        TypeKind::Interface(interface) => MetaType::Interface {
            name,
            interface: InterfaceType {
                fields: interface
                    .fields
                    .iter()
                    .map(|field| {
                        let field = lower_field(&field.node, default_resolver);
                        (field.name.clone(), field)
                    })
                    .collect(),
            },
        },
        TypeKind::Union(union) => MetaType::Union {
            name,
            union: UnionType {
                members: union.members.iter().map(|member| member.node.to_string()).collect(),
            },
        },
        TypeKind::Enum(enum_type) => MetaType::Enum {
            name,
            enum_type: EnumType {
                values: enum_type
                    .values
                    .iter()
                    .map(|value| value.node.value.node.to_string())
                    .collect(),
            },
        },
        TypeKind::InputObject(input_object) => MetaType::InputObject {
            name,
            input_object: InputObjectType {
                input_fields: input_object
                    .fields
                    .iter()
                    .map(|field| {
                        let input = lower_input_value(&field.node);
                        (input.name.clone(), input)
                    })
                    .collect(),
            },
        },
    }
}

fn lower_extension(definition: &ast::TypeDefinition) -> Result<TypeExtension, String> {
    let target = definition.name.node.to_string();
    let mut extension = TypeExtension {
        target: target.clone(),
        fields: Vec::new(),
        members: Vec::new(),
        values: Vec::new(),
    };

    match &definition.kind {
        TypeKind::Object(object) => {
            extension.fields = object
                .fields
                .iter()
                .map(|field| lower_field(&field.node, &Resolver::Unbound))
                .collect();
        }
        TypeKind::Interface(interface) => {
            extension.fields = interface
                .fields
                .iter()
                .map(|field| lower_field(&field.node, &Resolver::Unbound))
                .collect();
        }
        TypeKind::Union(union) => {
            extension.members = union.members.iter().map(|member| member.node.to_string()).collect();
        }
        TypeKind::Enum(enum_type) => {
            extension.values = enum_type
                .values
                .iter()
                .map(|value| value.node.value.node.to_string())
                .collect();
        }
        TypeKind::Scalar | TypeKind::InputObject(_) => {
            return Err(format!("unsupported extension of `{target}`"));
        }
    }

    Ok(extension)
}

fn lower_field(field: &ast::FieldDefinition, default_resolver: &Resolver) -> MetaField {
    MetaField {
        name: field.name.node.to_string(),
        args: field
            .arguments
            .iter()
            .map(|arg| {
                let input = lower_input_value(&arg.node);
                (input.name.clone(), input)
            })
            .collect(),
        ty: field.ty.node.to_string(),
        resolver: default_resolver.clone(),
        requires: None,
    }
}

fn lower_input_value(input: &ast::InputValueDefinition) -> MetaInputValue {
    MetaInputValue {
        name: input.name.node.to_string(),
        ty: input.ty.node.to_string(),
        default_value: input.default_value.as_ref().map(|value| value.node.clone()),
    }
}
