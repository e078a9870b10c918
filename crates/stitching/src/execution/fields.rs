//! Field collection, resolution and value completion.
//!
//! <https://spec.graphql.org/October2021/#sec-Executing-Selection-Sets>

use async_graphql_parser::{
    types::{Field, Selection, SelectionSet},
    Positioned,
};
use async_graphql_value::{ConstValue, Value};
use async_recursion::async_recursion;
use futures_util::future::join_all;
use indexmap::IndexMap;

use super::{context::QueryEnv, input};
use crate::{
    delegate,
    error::Error,
    registry::{resolvers::ResolverContext, MetaField, MetaType, Resolver, TypeName},
    response::{PathSegment, ServerError},
    schema::Schema,
    execution::context::ResolveInfo,
};

/// Fields grouped by response key, in selection order.
type GroupedFields<'a> = IndexMap<&'a str, Vec<&'a Positioned<Field>>>;

/// Flatten a selection set against a concrete type: apply `@skip`/`@include`,
/// inline applicable fragments, and group fields by response key.
pub(crate) fn collect_fields<'a>(
    schema: &'a Schema,
    env: &'a QueryEnv,
    type_name: &str,
    selection_set: &'a Positioned<SelectionSet>,
    out: &mut GroupedFields<'a>,
) -> Result<(), ServerError> {
    for selection in &selection_set.node.items {
        let directives = match &selection.node {
            Selection::Field(field) => &field.node.directives,
            Selection::FragmentSpread(spread) => &spread.node.directives,
            Selection::InlineFragment(fragment) => &fragment.node.directives,
        };
        if skipped(env, directives).map_err(|err| ServerError::new(err.message, Some(selection.pos)))? {
            continue;
        }

        match &selection.node {
            Selection::Field(field) => {
                let key = field
                    .node
                    .alias
                    .as_ref()
                    .map(|alias| alias.node.as_str())
                    .unwrap_or_else(|| field.node.name.node.as_str());
                out.entry(key).or_default().push(field);
            }
            Selection::FragmentSpread(spread) => {
                let name = &spread.node.fragment_name.node;
                let fragment = env
                    .fragments
                    .get(name)
                    .ok_or_else(|| ServerError::new(format!("Unknown fragment `{name}`"), Some(spread.pos)))?;
                let condition = fragment.node.type_condition.node.on.node.as_str();
                if schema.registry.type_applies(condition, type_name) {
                    collect_fields(schema, env, type_name, &fragment.node.selection_set, out)?;
                }
            }
            Selection::InlineFragment(fragment) => {
                let applies = match &fragment.node.type_condition {
                    Some(condition) => schema.registry.type_applies(condition.node.on.node.as_str(), type_name),
                    None => true,
                };
                if applies {
                    collect_fields(schema, env, type_name, &fragment.node.selection_set, out)?;
                }
            }
        }
    }
    Ok(())
}

// @skip / @include, with variable support.
fn skipped(env: &QueryEnv, directives: &[Positioned<async_graphql_parser::types::Directive>]) -> Result<bool, Error> {
    for directive in directives {
        let name = directive.node.name.node.as_str();
        let invert = match name {
            "skip" => false,
            "include" => true,
            _ => continue,
        };
        let condition = directive
            .node
            .get_argument("if")
            .ok_or_else(|| Error::new(format!("@{name} requires an `if` argument")))?;
        let condition = resolve_const(env, &condition.node)?;
        match condition {
            ConstValue::Boolean(value) => {
                if value != invert {
                    return Ok(true);
                }
            }
            other => {
                return Err(Error::new(format!("@{name}(if:) must be a Boolean, got {other}")));
            }
        }
    }
    Ok(false)
}

fn resolve_const(env: &QueryEnv, value: &Value) -> Result<ConstValue, Error> {
    value
        .clone()
        .into_const_with(|name| {
            env.variables
                .get(&name)
                .cloned()
                .ok_or_else(|| Error::new(format!("Unknown variable ${name}")))
        })
}

/// Resolve the given selection sets against one concrete object value.
/// `serial` forces document-order resolution (mutation roots).
#[async_recursion]
pub(crate) async fn resolve_selection_set<'a>(
    schema: &'a Schema,
    env: &'a QueryEnv,
    parent_type: &'a MetaType,
    selection_sets: &'a [&'a Positioned<SelectionSet>],
    parent: &'a serde_json::Value,
    path: &'a [PathSegment],
    serial: bool,
) -> Result<serde_json::Value, ServerError> {
    let mut grouped = GroupedFields::new();
    for selection_set in selection_sets {
        collect_fields(schema, env, parent_type.name(), selection_set, &mut grouped)?;
    }

    let mut object = serde_json::Map::with_capacity(grouped.len());

    if serial {
        for (key, nodes) in &grouped {
            let value = resolve_grouped_field(schema, env, parent_type, key, nodes, parent, path).await?;
            object.insert((*key).to_string(), value);
        }
    } else {
        let futures = grouped
            .iter()
            .map(|(key, nodes)| resolve_grouped_field(schema, env, parent_type, key, nodes, parent, path));
        let resolved = join_all(futures).await;
        for ((key, _), value) in grouped.iter().zip(resolved) {
            object.insert((*key).to_string(), value?);
        }
    }

    Ok(serde_json::Value::Object(object))
}

// One response key: resolve the field and complete its value, applying the
// non-null error rules.
async fn resolve_grouped_field(
    schema: &Schema,
    env: &QueryEnv,
    parent_type: &MetaType,
    key: &str,
    nodes: &[&Positioned<Field>],
    parent: &serde_json::Value,
    path: &[PathSegment],
) -> Result<serde_json::Value, ServerError> {
    let field_node = nodes[0];
    let field_name = field_node.node.name.node.as_str();

    let mut field_path = path.to_vec();
    field_path.push(PathSegment::Field(key.to_string()));

    if field_name == "__typename" {
        return Ok(serde_json::Value::String(parent_type.name().to_string()));
    }

    let Some(field) = parent_type.field(field_name) else {
        let error = ServerError::new(
            format!("Unknown field `{field_name}` on type `{}`", parent_type.name()),
            Some(field_node.node.name.pos),
        )
        .with_path(field_path);
        env.add_error(error);
        return Ok(serde_json::Value::Null);
    };

    let result = run_resolver(schema, env, parent_type, field, field_node, parent, &field_path)
        .await
        .map_err(|err| ServerError::new(err.message, Some(field_node.pos)).with_path(field_path.clone()));

    let completed = match result {
        Ok(value) => complete_value(schema, env, &field.ty, nodes, value, &field_path).await,
        Err(error) => Err(error),
    };

    match completed {
        Ok(value) => Ok(value),
        Err(error) => {
            if TypeName::is_non_null(&field.ty) {
                // Propagate; an ancestor nullable field absorbs it.
                Err(error)
            } else {
                env.add_error(error);
                Ok(serde_json::Value::Null)
            }
        }
    }
}

async fn run_resolver(
    schema: &Schema,
    env: &QueryEnv,
    parent_type: &MetaType,
    field: &MetaField,
    field_node: &Positioned<Field>,
    parent: &serde_json::Value,
    path: &[PathSegment],
) -> Result<serde_json::Value, Error> {
    let info = ResolveInfo {
        schema,
        env,
        field: field_node,
        parent_type_name: parent_type.name(),
        path: path.to_vec(),
    };

    match &field.resolver {
        Resolver::Parent => {
            let key = info.response_key();
            Ok(parent.get(key).cloned().unwrap_or(serde_json::Value::Null))
        }
        Resolver::CustomFn(resolve) => {
            let args = coerce_arguments(schema, env, field, field_node)?;
            let ctx = ResolverContext {
                parent,
                args,
                ctx: &env.ctx,
                info,
            };
            resolve.call(ctx).await
        }
        Resolver::Link(crate::registry::resolvers::LinkResolver { resolve }) => {
            // The fragment annotation is a contract: the delegation that
            // produced the parent must have fetched these fields. A parent
            // that arrived without them would make the resolver fail in
            // stranger ways downstream.
            if let Some(requires) = &field.requires {
                let present = parent
                    .as_object()
                    .is_some_and(|object| requires.all_fields_present(object));
                if !present {
                    return Err(Error::new(format!(
                        "parent of `{}.{}` is missing required fields: {requires}",
                        parent_type.name(),
                        field.name
                    )));
                }
            }
            let args = coerce_arguments(schema, env, field, field_node)?;
            let ctx = ResolverContext {
                parent,
                args,
                ctx: &env.ctx,
                info,
            };
            resolve.call(ctx).await
        }
        Resolver::Delegate(delegation) => {
            let args = coerce_arguments(schema, env, field, field_node)?;
            let target = schema
                .upstream(delegation.schema_index)
                .ok_or_else(|| Error::new("delegation target schema is gone"))?;
            delegate::delegate_to_schema(target, delegation.operation, field.name.as_str(), args, &env.ctx, &info)
                .await
        }
        Resolver::Unbound => Err(Error::new(format!(
            "no resolver bound for field `{}.{}`",
            parent_type.name(),
            field.name
        ))),
    }
}

/// Coerce a field node's arguments against the field definition, resolving
/// variable references from the operation's coerced variables.
pub(crate) fn coerce_arguments(
    schema: &Schema,
    env: &QueryEnv,
    field: &MetaField,
    field_node: &Positioned<Field>,
) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
    for (name, _) in &field_node.node.arguments {
        if !field.args.contains_key(name.node.as_str()) {
            return Err(Error::new(format!(
                "Unknown argument `{}` on field `{}`",
                name.node, field.name
            )));
        }
    }

    let mut args = serde_json::Map::with_capacity(field.args.len());
    for (name, input_def) in &field.args {
        let provided = field_node
            .node
            .get_argument(name)
            .map(|value| resolve_const(env, &value.node))
            .transpose()?;
        if let Some(value) = input::coerce_argument(&schema.registry, name, input_def, provided)? {
            args.insert(name.clone(), value.into_json()?);
        }
    }
    Ok(args)
}

#[async_recursion]
async fn complete_value<'a>(
    schema: &'a Schema,
    env: &'a QueryEnv,
    ty: &'a str,
    nodes: &'a [&'a Positioned<Field>],
    value: serde_json::Value,
    path: &'a [PathSegment],
) -> Result<serde_json::Value, ServerError> {
    let pos = nodes[0].pos;

    match TypeName::create(ty) {
        TypeName::NonNull(inner) => {
            let completed = complete_value(schema, env, inner, nodes, value, path).await?;
            if completed.is_null() {
                return Err(ServerError::new(
                    format!("expected a non-null value of type `{ty}`, found null"),
                    Some(pos),
                )
                .with_path(path.to_vec()));
            }
            Ok(completed)
        }
        TypeName::List(inner) => {
            if value.is_null() {
                return Ok(serde_json::Value::Null);
            }
            let serde_json::Value::Array(items) = value else {
                return Err(
                    ServerError::new(format!("expected a list of `{inner}`"), Some(pos)).with_path(path.to_vec())
                );
            };
            let inner_non_null = TypeName::is_non_null(inner);
            let mut completed = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                let mut item_path = path.to_vec();
                item_path.push(PathSegment::Index(idx));
                match complete_value(schema, env, inner, nodes, item, &item_path).await {
                    Ok(value) => completed.push(value),
                    Err(error) if inner_non_null => return Err(error),
                    Err(error) => {
                        env.add_error(error);
                        completed.push(serde_json::Value::Null);
                    }
                }
            }
            Ok(serde_json::Value::Array(completed))
        }
        TypeName::Named(name) => {
            if value.is_null() {
                return Ok(serde_json::Value::Null);
            }
            let Some(meta_type) = schema.registry.lookup(name) else {
                return Err(ServerError::new(format!("Unknown type `{name}`"), Some(pos)).with_path(path.to_vec()));
            };
            match meta_type {
                MetaType::Scalar { .. } => Ok(value),
                MetaType::Enum { enum_type, .. } => match &value {
                    serde_json::Value::String(repr) if enum_type.values.iter().any(|v| v == repr) => Ok(value),
                    other => Err(ServerError::new(
                        format!("invalid value `{other}` for enum `{name}`"),
                        Some(pos),
                    )
                    .with_path(path.to_vec())),
                },
                MetaType::Object { .. } => complete_composite(schema, env, meta_type, nodes, &value, path).await,
                MetaType::Interface { .. } | MetaType::Union { .. } => {
                    let concrete = resolve_concrete_type(schema, name, &value).ok_or_else(|| {
                        ServerError::new(
                            format!("could not resolve the concrete type of abstract type `{name}`"),
                            Some(pos),
                        )
                        .with_path(path.to_vec())
                    })?;
                    let object_type = schema
                        .registry
                        .lookup(&concrete)
                        .filter(|ty| matches!(ty, MetaType::Object { .. }))
                        .ok_or_else(|| {
                            ServerError::new(
                                format!("abstract type `{name}` resolved to unknown object type `{concrete}`"),
                                Some(pos),
                            )
                            .with_path(path.to_vec())
                        })?;
                    complete_composite(schema, env, object_type, nodes, &value, path).await
                }
                MetaType::InputObject { .. } => Err(ServerError::new(
                    format!("input object `{name}` cannot be completed as output"),
                    Some(pos),
                )
                .with_path(path.to_vec())),
            }
        }
    }
}

async fn complete_composite(
    schema: &Schema,
    env: &QueryEnv,
    object_type: &MetaType,
    nodes: &[&Positioned<Field>],
    value: &serde_json::Value,
    path: &[PathSegment],
) -> Result<serde_json::Value, ServerError> {
    let selection_sets: Vec<&Positioned<SelectionSet>> =
        nodes.iter().map(|node| &node.node.selection_set).collect();
    resolve_selection_set(schema, env, object_type, &selection_sets, value, path, false).await
}

/// The concrete object type of an abstract-typed value. The upstream schema
/// decided it: either a `__typename` it answered with, or the schema's own
/// type resolver for values that never crossed a schema boundary.
fn resolve_concrete_type(schema: &Schema, abstract_name: &str, value: &serde_json::Value) -> Option<String> {
    if let Some(serde_json::Value::String(typename)) = value.get("__typename") {
        return Some(typename.clone());
    }
    schema
        .type_resolver(abstract_name)
        .and_then(|resolve| resolve(value))
}
