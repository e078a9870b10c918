//! The in-process host execution engine.
//!
//! Resolvers run in the classic `(parent, args, context, info)` model; the
//! engine walks selection sets, dispatches each field's [`Resolver`]
//! (crate::registry::Resolver) and completes values against declared types.
//! Query root fields resolve concurrently; mutation root fields resolve
//! serially in document order.

pub mod context;
pub(crate) mod fields;
pub(crate) mod input;

use async_graphql_parser::{
    parse_query,
    types::{DocumentOperations, ExecutableDocument, OperationDefinition, OperationType},
    Positioned,
};
use async_graphql_value::Variables;

use self::context::{Context, QueryEnv};
use crate::{
    response::{Response, ServerError},
    schema::Schema,
};

/// One GraphQL request against a [`Schema`].
#[derive(Debug, Default)]
pub struct Request {
    /// The operation source text.
    pub query: String,
    /// Which operation to run, for multi-operation documents.
    pub operation_name: Option<String>,
    /// Variable values, uncoerced.
    pub variables: Variables,
    /// Caller context forwarded to every resolver and delegation.
    pub ctx: Context,
}

impl Request {
    /// A request for the given operation text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set the variable values from a JSON object.
    #[must_use]
    pub fn variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = Variables::from_json(variables);
        self
    }

    /// Select an operation by name.
    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Set the caller context.
    #[must_use]
    pub fn context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }
}

pub(crate) async fn execute(schema: &Schema, request: Request) -> Response {
    let document = match parse_query(&request.query) {
        Ok(document) => document,
        Err(err) => {
            return Response::from_error(ServerError::new(format!("parse error: {err}"), None));
        }
    };

    execute_parsed(
        schema,
        document,
        request.operation_name.as_deref(),
        request.variables,
        request.ctx,
    )
    .await
}

/// Execute an already-parsed document. Delegation uses this entry point for
/// in-process upstreams so synthesized operations never round-trip through
/// text.
pub(crate) async fn execute_parsed(
    schema: &Schema,
    document: ExecutableDocument,
    operation_name: Option<&str>,
    variables: Variables,
    ctx: Context,
) -> Response {
    let operation = match select_operation(&document, operation_name) {
        Ok(operation) => operation.clone(),
        Err(error) => return Response::from_error(error),
    };

    if operation.node.ty == OperationType::Subscription {
        return Response::from_error(ServerError::new("subscriptions are not supported", Some(operation.pos)));
    }

    let Some(root_type) = schema.registry.root_type(operation.node.ty) else {
        return Response::from_error(ServerError::new(
            format!("the schema does not support {} operations", operation.node.ty),
            Some(operation.pos),
        ));
    };

    let variables = match input::coerce_variables(&schema.registry, &operation.node.variable_definitions, &variables) {
        Ok(variables) => variables,
        Err(error) => return Response::from_error(error),
    };

    let env = QueryEnv {
        fragments: document.fragments,
        variable_definitions: operation.node.variable_definitions.clone(),
        variables,
        operation_type: operation.node.ty,
        ctx,
        errors: Default::default(),
    };

    let root = serde_json::Value::Object(Default::default());
    let serial = operation.node.ty == OperationType::Mutation;
    let selection_sets = [&operation.node.selection_set];

    let result = fields::resolve_selection_set(schema, &env, root_type, &selection_sets, &root, &[], serial).await;

    match result {
        Ok(data) => Response {
            data,
            errors: env.into_errors(),
        },
        Err(error) => {
            // A non-null root field failed; data is null as a whole.
            let mut errors = env.into_errors();
            errors.push(error);
            Response {
                data: serde_json::Value::Null,
                errors,
            }
        }
    }
}

fn select_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<&'a Positioned<OperationDefinition>, ServerError> {
    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), _) => Ok(operation),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .get(name)
            .ok_or_else(|| ServerError::new(format!("Unknown operation `{name}`"), None)),
        (DocumentOperations::Multiple(operations), None) => {
            if operations.len() == 1 {
                Ok(operations.values().next().expect("len checked"))
            } else {
                Err(ServerError::new(
                    "the document contains multiple operations, but no operation name was given",
                    None,
                ))
            }
        }
    }
}
