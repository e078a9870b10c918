//! Introspection of remote schemas into a local registry.

use serde::Deserialize;

use crate::registry::{
    EnumType, InputObjectType, InterfaceType, MetaField, MetaInputValue, MetaType, ObjectType, Registry, Resolver,
    UnionType,
};

/// The standard introspection query sent through the fetcher, once, when a
/// remote schema is set up.
pub(crate) const INTROSPECTION_QUERY: &str = r"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    types { ...FullType }
  }
}
fragment FullType on __Type {
  kind
  name
  fields(includeDeprecated: true) {
    name
    args { ...InputValue }
    type { ...TypeRef }
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) { name }
  possibleTypes { ...TypeRef }
}
fragment InputValue on __InputValue {
  name
  type { ...TypeRef }
}
fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType { kind name ofType { kind name ofType { kind name } } }
        }
      }
    }
  }
}
";

#[derive(Deserialize)]
pub(crate) struct IntrospectionData {
    #[serde(rename = "__schema")]
    pub schema: IntrospectionSchema,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionSchema {
    pub query_type: NamedTypeRef,
    pub mutation_type: Option<NamedTypeRef>,
    pub types: Vec<IntrospectionType>,
}

#[derive(Deserialize)]
pub(crate) struct NamedTypeRef {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionType {
    pub kind: String,
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<IntrospectionField>>,
    #[serde(default)]
    pub input_fields: Option<Vec<IntrospectionInputValue>>,
    #[serde(default)]
    pub interfaces: Option<Vec<TypeRef>>,
    #[serde(default)]
    pub enum_values: Option<Vec<IntrospectionEnumValue>>,
    #[serde(default)]
    pub possible_types: Option<Vec<TypeRef>>,
}

#[derive(Deserialize)]
pub(crate) struct IntrospectionField {
    pub name: String,
    #[serde(default)]
    pub args: Vec<IntrospectionInputValue>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Deserialize)]
pub(crate) struct IntrospectionInputValue {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntrospectionEnumValue {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TypeRef {
    pub kind: String,
    pub name: Option<String>,
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// Back to wrapping notation: `NON_NULL(LIST(NON_NULL(Booking)))` is
    /// `[Booking!]!`.
    pub fn render(&self) -> String {
        match self.kind.as_str() {
            "NON_NULL" => match &self.of_type {
                Some(inner) => format!("{}!", inner.render()),
                None => String::new(),
            },
            "LIST" => match &self.of_type {
                Some(inner) => format!("[{}]", inner.render()),
                None => String::new(),
            },
            _ => self.name.clone().unwrap_or_default(),
        }
    }
}

/// Build a registry out of an introspection response. All fields read from
/// the parent; the caller installs fetching resolvers on the roots.
pub(crate) fn build_registry(data: IntrospectionData) -> Result<Registry, String> {
    let mut registry = Registry {
        query_type: data.schema.query_type.name,
        mutation_type: data.schema.mutation_type.map(|ty| ty.name),
        ..Default::default()
    };

    for ty in data.schema.types {
        let Some(name) = ty.name.clone() else { continue };
        if name.starts_with("__") {
            continue;
        }
        let lowered = lower_type(name.clone(), ty)?;
        registry.types.insert(name, lowered);
    }

    registry.ensure_builtin_scalars();

    if registry.types.get(&registry.query_type).is_none() {
        return Err(format!(
            "introspection names `{}` as the query root, but never defines it",
            registry.query_type
        ));
    }

    Ok(registry)
}

fn lower_type(name: String, ty: IntrospectionType) -> Result<MetaType, String> {
    match ty.kind.as_str() {
        "SCALAR" => Ok(MetaType::Scalar { name }),
        "OBJECT" => Ok(MetaType::Object {
            name,
            object: ObjectType {
                fields: lower_fields(ty.fields.unwrap_or_default()),
                implements: ty
                    .interfaces
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|interface| interface.name)
                    .collect(),
            },
        }),
        "INTERFACE" => Ok(MetaType::Interface {
            name,
            interface: InterfaceType {
                fields: lower_fields(ty.fields.unwrap_or_default()),
            },
        }),
        "UNION" => Ok(MetaType::Union {
            name,
            union: UnionType {
                members: ty
                    .possible_types
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|member| member.name)
                    .collect(),
            },
        }),
        "ENUM" => Ok(MetaType::Enum {
            name,
            enum_type: EnumType {
                values: ty
                    .enum_values
                    .unwrap_or_default()
                    .into_iter()
                    .map(|value| value.name)
                    .collect(),
            },
        }),
        "INPUT_OBJECT" => Ok(MetaType::InputObject {
            name,
            input_object: InputObjectType {
                input_fields: ty
                    .input_fields
                    .unwrap_or_default()
                    .into_iter()
                    .map(|input| {
                        let input = lower_input(input);
                        (input.name.clone(), input)
                    })
                    .collect(),
            },
        }),
        other => Err(format!("unsupported introspected type kind `{other}` for `{name}`")),
    }
}

fn lower_fields(fields: Vec<IntrospectionField>) -> indexmap::IndexMap<String, MetaField> {
    fields
        .into_iter()
        .map(|field| {
            let meta = MetaField {
                name: field.name.clone(),
                args: field
                    .args
                    .into_iter()
                    .map(|arg| {
                        let arg = lower_input(arg);
                        (arg.name.clone(), arg)
                    })
                    .collect(),
                ty: field.ty.render(),
                resolver: Resolver::Parent,
                requires: None,
            };
            (field.name, meta)
        })
        .collect()
}

fn lower_input(input: IntrospectionInputValue) -> MetaInputValue {
    MetaInputValue {
        name: input.name,
        ty: input.ty.render(),
        default_value: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_wrapped_type_refs() {
        let json = serde_json::json!({
            "kind": "NON_NULL",
            "name": null,
            "ofType": {
                "kind": "LIST",
                "name": null,
                "ofType": {
                    "kind": "NON_NULL",
                    "name": null,
                    "ofType": { "kind": "OBJECT", "name": "Booking" }
                }
            }
        });
        let type_ref: TypeRef = serde_json::from_value(json).unwrap();
        assert_eq!(type_ref.render(), "[Booking!]!");
    }

    #[test]
    fn builds_a_registry_from_an_introspection_response() {
        let json = serde_json::json!({
            "__schema": {
                "queryType": { "name": "Query" },
                "mutationType": null,
                "types": [
                    {
                        "kind": "OBJECT",
                        "name": "Query",
                        "fields": [
                            {
                                "name": "propertyById",
                                "args": [
                                    { "name": "id", "type": { "kind": "NON_NULL", "name": null, "ofType": { "kind": "SCALAR", "name": "ID" } } }
                                ],
                                "type": { "kind": "OBJECT", "name": "Property" }
                            }
                        ]
                    },
                    {
                        "kind": "OBJECT",
                        "name": "Property",
                        "fields": [
                            { "name": "id", "args": [], "type": { "kind": "NON_NULL", "name": null, "ofType": { "kind": "SCALAR", "name": "ID" } } },
                            { "name": "name", "args": [], "type": { "kind": "SCALAR", "name": "String" } }
                        ]
                    }
                ]
            }
        });
        let data: IntrospectionData = serde_json::from_value(json).unwrap();

        let registry = build_registry(data).unwrap();

        assert_eq!(registry.query_type, "Query");
        let field = registry.lookup("Query").unwrap().field("propertyById").unwrap();
        assert_eq!(field.ty, "Property");
        assert_eq!(field.args["id"].ty, "ID!");
    }
}
