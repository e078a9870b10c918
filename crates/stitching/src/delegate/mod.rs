//! The delegation engine.
//!
//! For every field whose owning schema differs from the schema being
//! executed, a standalone sub-operation is synthesized against the owner and
//! executed there. A delegation moves linearly through synthesis and
//! execution; there is no retry, and nothing it allocates outlives the call.

pub(crate) mod rewrite;

use std::sync::Arc;

use async_graphql_parser::{
    types::{
        DocumentOperations, ExecutableDocument, Field, OperationDefinition, OperationType, Selection, SelectionSet,
        Type, VariableDefinition,
    },
    Pos, Positioned,
};
use async_graphql_value::{ConstValue, Name, Value, Variables};
use futures_util::future::BoxFuture;

use crate::{
    error::{Error, Result},
    execution::context::{Context, ResolveInfo},
    registry::{Registry, TypeName},
    schema::Schema,
};

/// The stitching engine's handle given to link resolver factories. Carries
/// the one primitive link resolvers need: [`delegate`](MergeInfo::delegate).
#[derive(Clone)]
pub struct MergeInfo {
    inner: Arc<MergeInfoInner>,
}

struct MergeInfoInner {
    upstreams: Vec<Arc<Schema>>,
}

impl MergeInfo {
    pub(crate) fn new(upstreams: Vec<Arc<Schema>>) -> Self {
        MergeInfo {
            inner: Arc::new(MergeInfoInner { upstreams }),
        }
    }

    /// Forward resolution to the upstream schema owning `root_field` on the
    /// given operation root. The caller's selection (from `info`) is
    /// rewritten for the target; `args` become the target root field's
    /// arguments, passed through fresh variables.
    ///
    /// Returns the value at `data[root_field]` of the upstream response.
    /// Upstream field errors accompanying partial data are forwarded onto
    /// the outer response under the caller's path.
    pub fn delegate<'a>(
        &'a self,
        operation: OperationType,
        root_field: &'a str,
        args: serde_json::Map<String, serde_json::Value>,
        ctx: &'a Context,
        info: &'a ResolveInfo<'_>,
    ) -> BoxFuture<'a, Result<serde_json::Value>> {
        Box::pin(async move {
            let target = self
                .inner
                .upstreams
                .iter()
                .find(|schema| {
                    schema
                        .registry
                        .root_type(operation)
                        .and_then(|root| root.field(root_field))
                        .is_some()
                })
                .ok_or_else(|| {
                    Error::new(format!(
                        "no upstream schema exposes `{root_field}` on its {operation} root"
                    ))
                })?;

            delegate_to_schema(target, operation, root_field, args, ctx, info).await
        })
    }
}

/// Synthesize the sub-operation for `root_field` against `target`, execute
/// it there, and thread the result back to the caller.
pub(crate) async fn delegate_to_schema(
    target: &Arc<Schema>,
    operation: OperationType,
    root_field: &str,
    args: serde_json::Map<String, serde_json::Value>,
    ctx: &Context,
    info: &ResolveInfo<'_>,
) -> Result<serde_json::Value> {
    let synthesized = synthesize_operation(&target.registry, operation, root_field, args, info)?;

    tracing::debug!(
        field = root_field,
        operation = %operation,
        "delegating to upstream schema"
    );

    let response = target
        .execute_parsed(synthesized.document, synthesized.variables, ctx.clone())
        .await;

    extract_root_value(response, root_field, info)
}

/// A standalone operation ready for an upstream: the document and the
/// projected variables payload.
pub(crate) struct SynthesizedOperation {
    pub document: ExecutableDocument,
    pub variables: Variables,
}

/// Build the sub-operation: rewrite the caller's selection for the target,
/// bind `args` through fresh variables typed from the target's argument
/// definitions, and project exactly the caller variables the retained
/// selection still references.
pub(crate) fn synthesize_operation(
    target: &Registry,
    operation: OperationType,
    root_field: &str,
    args: serde_json::Map<String, serde_json::Value>,
    info: &ResolveInfo<'_>,
) -> Result<SynthesizedOperation> {
    let target_root = target
        .root_type(operation)
        .ok_or_else(|| Error::new(format!("the target schema does not support {operation} operations")))?;
    let target_field = target_root.field(root_field).ok_or_else(|| {
        Error::new(format!(
            "field `{root_field}` does not exist on the target schema's {operation} root"
        ))
    })?;

    let return_type = TypeName::concrete(&target_field.ty);
    let rewritten = rewrite::rewrite_selection_set(
        &info.field().node.selection_set,
        return_type,
        &info.schema().registry,
        target,
        info.fragments(),
    );

    let pos = Pos::default();
    let mut variables = Variables::default();
    let mut variable_definitions = Vec::with_capacity(args.len());
    let mut arguments = Vec::with_capacity(args.len());

    for (index, (arg_name, json_value)) in args.iter().enumerate() {
        let input_def = target_field.args.get(arg_name).ok_or_else(|| {
            Error::new(format!("unknown argument `{arg_name}` on target field `{root_field}`"))
        })?;
        let var_type = Type::new(&input_def.ty)
            .ok_or_else(|| Error::new(format!("malformed argument type `{}`", input_def.ty)))?;
        let var_name = Name::new(format!("_v{index}_{arg_name}"));

        arguments.push((
            Positioned::new(Name::new(arg_name), pos),
            Positioned::new(Value::Variable(var_name.clone()), pos),
        ));
        variable_definitions.push(Positioned::new(
            VariableDefinition {
                name: Positioned::new(var_name.clone(), pos),
                var_type: Positioned::new(var_type, pos),
                directives: Vec::new(),
                default_value: None,
            },
            pos,
        ));
        variables.insert(
            var_name,
            ConstValue::from_json(json_value.clone())
                .map_err(|err| Error::new(format!("argument `{arg_name}` cannot be coerced: {err}")))?,
        );
    }

    for name in &rewritten.variables_used {
        let definition = info
            .variable_definitions()
            .iter()
            .find(|definition| definition.node.name.node == *name)
            .ok_or_else(|| Error::new(format!("variable ${name} is not defined by the incoming operation")))?;
        variable_definitions.push(definition.clone());
        if let Some(value) = info.variables().get(name) {
            variables.insert(name.clone(), value.clone());
        }
    }

    let root_selection = Field {
        alias: None,
        name: Positioned::new(Name::new(root_field), pos),
        arguments,
        directives: Vec::new(),
        selection_set: rewritten.selection_set,
    };

    let operation_definition = OperationDefinition {
        ty: operation,
        variable_definitions,
        directives: Vec::new(),
        selection_set: Positioned::new(
            SelectionSet {
                items: vec![Positioned::new(
                    Selection::Field(Positioned::new(root_selection, pos)),
                    pos,
                )],
            },
            pos,
        ),
    };

    Ok(SynthesizedOperation {
        document: ExecutableDocument {
            operations: DocumentOperations::Single(Positioned::new(operation_definition, pos)),
            fragments: rewritten.fragments,
        },
        variables,
    })
}

// The upstream answered. Partial data still flows into the parent response,
// with the upstream's field errors re-rooted under the caller's path; an
// upstream failure with no data fails this field.
fn extract_root_value(
    response: crate::response::Response,
    root_field: &str,
    info: &ResolveInfo<'_>,
) -> Result<serde_json::Value> {
    let value = match response.data {
        serde_json::Value::Object(mut object) => object.remove(root_field).unwrap_or(serde_json::Value::Null),
        _ => serde_json::Value::Null,
    };

    if !response.errors.is_empty() {
        tracing::warn!(
            field = root_field,
            errors = response.errors.len(),
            "upstream execution reported errors"
        );
        if value.is_null() {
            let message = response
                .errors
                .into_iter()
                .map(|error| error.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::new(message));
        }
        for error in response.errors {
            info.add_error(error.prefixed_with(info.path()));
        }
    }

    Ok(value)
}
