//! Remote schemas behind the local-schema interface.
//!
//! A remote GraphQL service is introspected once through its [`Fetcher`]
//! into a proxy [`Schema`] whose root resolvers print the current
//! sub-operation and send it through the fetcher. The proxy then
//! participates in merging exactly like an in-process schema.

pub(crate) mod introspection;

use std::{collections::HashMap, sync::Arc};

use async_graphql_parser::types::OperationType;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::{
    delegate,
    error::{Error, Result},
    print,
    registry::{
        resolvers::{ErasedResolver, ResolverContext, ResolverFn},
        MetaType, Resolver,
    },
    response::{PathSegment, ServerError},
    schema::Schema,
};

/// Transport to a remote GraphQL service. One implementation per transport;
/// the engine only ever hands it a finished document and variables.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Execute the document remotely.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse>;
}

/// One outgoing remote execution.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// The operation text.
    pub query: String,
    /// The variables payload.
    pub variables: serde_json::Map<String, serde_json::Value>,
    /// The operation to run, for multi-operation documents.
    pub operation_name: Option<String>,
}

/// The standard GraphQL wire response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchResponse {
    /// The data payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Errors reported by the remote service.
    #[serde(default)]
    pub errors: Vec<FetchError>,
}

/// A remote field error in wire shape.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchError {
    /// The error message.
    pub message: String,
    /// The remote response path, mixed keys and indices.
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

impl FetchError {
    fn into_server_error(self) -> ServerError {
        let path = self
            .path
            .into_iter()
            .filter_map(|segment| match segment {
                serde_json::Value::String(key) => Some(PathSegment::Field(key)),
                serde_json::Value::Number(index) => index.as_u64().map(|index| PathSegment::Index(index as usize)),
                _ => None,
            })
            .collect();
        ServerError::new(self.message, None).with_path(path)
    }
}

/// Introspect a remote service through `fetcher`, once, and wrap it in an
/// executable proxy schema. The proxy's root resolvers synthesize a
/// standalone operation from the incoming selection, print it, and invoke
/// the fetcher.
pub async fn remote_executable_schema(fetcher: Arc<dyn Fetcher>) -> Result<Arc<Schema>> {
    let response = fetcher
        .fetch(FetchRequest {
            query: introspection::INTROSPECTION_QUERY.to_string(),
            variables: serde_json::Map::new(),
            operation_name: Some("IntrospectionQuery".to_string()),
        })
        .await?;

    if !response.errors.is_empty() {
        return Err(Error::new(format!(
            "introspection of the remote schema failed: {}",
            response.errors[0].message
        )));
    }

    let data: introspection::IntrospectionData =
        serde_json::from_value(response.data).map_err(|err| Error::new(format!("malformed introspection: {err}")))?;
    let mut registry = introspection::build_registry(data).map_err(Error::new)?;

    install_root_resolvers(&mut registry, &fetcher, OperationType::Query);
    install_root_resolvers(&mut registry, &fetcher, OperationType::Mutation);

    tracing::debug!(types = registry.types.len(), "introspected remote schema");

    Ok(Arc::new(Schema {
        registry,
        type_resolvers: HashMap::new(),
        type_origins: HashMap::new(),
        upstreams: Vec::new(),
    }))
}

fn install_root_resolvers(registry: &mut crate::registry::Registry, fetcher: &Arc<dyn Fetcher>, operation: OperationType) {
    let root_name = match operation {
        OperationType::Query => Some(registry.query_type.clone()),
        OperationType::Mutation => registry.mutation_type.clone(),
        OperationType::Subscription => None,
    };
    let Some(root_name) = root_name else { return };
    let Some(MetaType::Object { object, .. }) = registry.types.get_mut(&root_name) else {
        return;
    };

    for field in object.fields.values_mut() {
        field.resolver = Resolver::CustomFn(ResolverFn::from_erased(Arc::new(RemoteRootResolver {
            fetcher: Arc::clone(fetcher),
            operation,
        })));
    }
}

// Delegation to self, over the wire: rebuild a standalone operation from the
// incoming field, print it, fetch, and thread the result back.
struct RemoteRootResolver {
    fetcher: Arc<dyn Fetcher>,
    operation: OperationType,
}

impl ErasedResolver for RemoteRootResolver {
    fn call<'a>(&'a self, ctx: ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>> {
        Box::pin(async move {
            let field_name = ctx.info.field_name().to_string();
            let synthesized = delegate::synthesize_operation(
                &ctx.info.schema().registry,
                self.operation,
                &field_name,
                ctx.args.clone(),
                &ctx.info,
            )?;

            let mut variables = serde_json::Map::new();
            for (name, value) in synthesized.variables.iter() {
                variables.insert(name.to_string(), value.clone().into_json()?);
            }

            let request = FetchRequest {
                query: print::print_document(&synthesized.document),
                variables,
                operation_name: None,
            };
            tracing::debug!(field = field_name.as_str(), "fetching from remote schema");

            let response = self.fetcher.fetch(request).await?;

            let value = match response.data {
                serde_json::Value::Object(mut object) => {
                    object.remove(&field_name).unwrap_or(serde_json::Value::Null)
                }
                _ => serde_json::Value::Null,
            };

            if !response.errors.is_empty() {
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
                    ctx.info
                        .add_error(error.into_server_error().prefixed_with(ctx.info.path()));
                }
            }

            Ok(value)
        })
    }
}
