//! Input coercion for variables and field arguments.
//!
//! <https://spec.graphql.org/October2021/#sec-Coercing-Variable-Values>

use std::borrow::Cow;

use async_graphql_parser::{types::VariableDefinition, Positioned};
use async_graphql_value::{ConstValue, Name, Variables};

use crate::{
    error::{Error, Result},
    registry::{MetaInputValue, MetaType, Registry, TypeName},
    response::ServerError,
};

/// Coerce one argument value against its declared input type. `None` means
/// the argument stays absent (legal for nullable arguments without default).
pub(crate) fn coerce_argument(
    registry: &Registry,
    arg_name: &str,
    input_def: &MetaInputValue,
    value: Option<ConstValue>,
) -> Result<Option<ConstValue>> {
    coerce_maybe_absent(
        CoerceContext {
            registry,
            path: PathNode::new(arg_name),
            ty: Cow::Borrowed(&input_def.ty),
            allow_list_coercion: true,
            default_value: input_def.default_value.as_ref(),
        },
        value,
    )
}

/// Coerce the request's variable values against the operation's variable
/// definitions. Unknown variables are dropped; missing non-null variables
/// without defaults are fatal for the operation.
pub(crate) fn coerce_variables(
    registry: &Registry,
    definitions: &[Positioned<VariableDefinition>],
    variables: &Variables,
) -> std::result::Result<Variables, ServerError> {
    let mut coerced = Variables::default();

    for definition in definitions {
        let name = definition.node.name.node.as_str();
        let ty = definition.node.var_type.node.to_string();
        let provided = variables.get(&Name::new(name)).cloned();
        let default = definition.node.default_value.as_ref().map(|value| value.node.clone());

        let value = coerce_maybe_absent(
            CoerceContext {
                registry,
                path: PathNode::new(name),
                ty: Cow::Borrowed(&ty),
                allow_list_coercion: true,
                default_value: default.as_ref(),
            },
            provided,
        )
        .map_err(|err| ServerError::new(format!("variable ${name}: {err}"), Some(definition.pos)))?;

        if let Some(value) = value {
            coerced.insert(Name::new(name), value);
        }
    }

    Ok(coerced)
}

// Error paths are tracked as a linked list on the stack, rendered only on
// failure.
#[derive(Clone, Copy)]
struct PathNode<'a> {
    name: &'a str,
    previous: Option<&'a PathNode<'a>>,
}

impl<'a> PathNode<'a> {
    fn new(name: &'a str) -> PathNode<'a> {
        PathNode { name, previous: None }
    }

    fn with(&'a self, name: &'a str) -> PathNode<'a> {
        PathNode {
            name,
            previous: Some(self),
        }
    }

    fn render(&self) -> String {
        let mut segments = match self.previous {
            Some(previous) => previous.render(),
            None => String::new(),
        };
        if !segments.is_empty() {
            segments.push('.');
        }
        segments.push_str(self.name);
        segments
    }
}

#[derive(Clone)]
struct CoerceContext<'a> {
    registry: &'a Registry,
    path: PathNode<'a>,
    ty: Cow<'a, str>,
    // List coercion wraps a single value into a one-element list, but not
    // inside an explicit multi-element list.
    allow_list_coercion: bool,
    default_value: Option<&'a ConstValue>,
}

impl<'a> CoerceContext<'a> {
    fn error(&self, expected: &str) -> Error {
        Error::new(format!("{expected} for {}", self.path.render()))
    }
}

fn coerce_maybe_absent(ctx: CoerceContext<'_>, value: Option<ConstValue>) -> Result<Option<ConstValue>> {
    match value.or_else(|| ctx.default_value.cloned()) {
        Some(value) => coerce_present(ctx, value).map(Some),
        None => {
            if TypeName::is_non_null(&ctx.ty) {
                Err(ctx.error("Unexpected null value"))
            } else {
                Ok(None)
            }
        }
    }
}

fn coerce_present(ctx: CoerceContext<'_>, value: ConstValue) -> Result<ConstValue> {
    match TypeName::create(&ctx.ty) {
        TypeName::NonNull(inner) => {
            if matches!(value, ConstValue::Null) {
                return Err(ctx.error("Unexpected null value"));
            }
            let inner = inner.to_string();
            coerce_present(
                CoerceContext {
                    ty: Cow::Owned(inner),
                    ..ctx
                },
                value,
            )
        }
        TypeName::List(inner) => {
            if matches!(value, ConstValue::Null) {
                return Ok(value);
            }
            let inner = inner.to_string();
            match value {
                ConstValue::List(items) => {
                    let allow_list_coercion = items.len() <= 1;
                    let mut coerced = Vec::with_capacity(items.len());
                    for (idx, item) in items.into_iter().enumerate() {
                        let index = idx.to_string();
                        coerced.push(coerce_present(
                            CoerceContext {
                                path: ctx.path.with(&index),
                                ty: Cow::Borrowed(&inner),
                                allow_list_coercion,
                                default_value: None,
                                registry: ctx.registry,
                            },
                            item,
                        )?);
                    }
                    Ok(ConstValue::List(coerced))
                }
                single if ctx.allow_list_coercion => Ok(ConstValue::List(vec![coerce_present(
                    CoerceContext {
                        ty: Cow::Borrowed(&inner),
                        allow_list_coercion: true,
                        default_value: None,
                        ..ctx
                    },
                    single,
                )?])),
                _ => Err(ctx.error("Expected a List")),
            }
        }
        TypeName::Named(name) => {
            if matches!(value, ConstValue::Null) {
                return Ok(value);
            }
            let name = name.to_string();
            let name = name.as_str();
            match ctx.registry.lookup(name) {
                Some(MetaType::InputObject { input_object, .. }) => {
                    let ConstValue::Object(mut provided) = value else {
                        return Err(ctx.error("Expected an Object"));
                    };
                    let mut coerced = indexmap::IndexMap::new();
                    for (field_name, input_def) in &input_object.input_fields {
                        let field_value = provided.shift_remove(&Name::new(field_name));
                        let field_ctx = CoerceContext {
                            registry: ctx.registry,
                            path: ctx.path.with(field_name),
                            ty: Cow::Borrowed(&input_def.ty),
                            allow_list_coercion: true,
                            default_value: input_def.default_value.as_ref(),
                        };
                        if let Some(value) = coerce_maybe_absent(field_ctx, field_value)? {
                            coerced.insert(Name::new(field_name), value);
                        }
                    }
                    if let Some(unknown) = provided.keys().next() {
                        return Err(ctx.error(&format!("Unknown input field `{unknown}`")));
                    }
                    Ok(ConstValue::Object(coerced))
                }
                Some(MetaType::Enum { enum_type, .. }) => {
                    let repr = match &value {
                        ConstValue::Enum(name) => name.as_str(),
                        ConstValue::String(s) => s.as_str(),
                        _ => return Err(ctx.error("Expected an enum value")),
                    };
                    if enum_type.values.iter().any(|v| v == repr) {
                        Ok(ConstValue::Enum(Name::new(repr)))
                    } else {
                        Err(ctx.error(&format!("Unknown enum value `{repr}`")))
                    }
                }
                Some(MetaType::Scalar { .. }) | None => coerce_scalar(ctx, name, value),
                Some(other) => Err(ctx.error(&format!(
                    "Type `{name}` ({}) is not an input type",
                    other.kind()
                ))),
            }
        }
    }
}

// Built-in scalars are checked structurally; custom scalars pass through.
fn coerce_scalar(ctx: CoerceContext<'_>, name: &str, value: ConstValue) -> Result<ConstValue> {
    let ok = match name {
        "Int" => matches!(&value, ConstValue::Number(n) if n.is_i64() || n.is_u64()),
        "Float" => matches!(&value, ConstValue::Number(_)),
        "String" => matches!(&value, ConstValue::String(_)),
        "Boolean" => matches!(&value, ConstValue::Boolean(_)),
        "ID" => matches!(&value, ConstValue::String(_) | ConstValue::Number(_)),
        _ => true,
    };
    if ok {
        Ok(value)
    } else {
        Err(ctx.error(&format!("Invalid value for scalar `{name}`")))
    }
}
