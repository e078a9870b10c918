//! Executable schemas: a frozen registry plus the functions that run it.

use std::{collections::HashMap, sync::Arc};

use async_graphql_parser::parse_schema;
use async_graphql_value::Variables;

use crate::{
    error::SchemaBuildError,
    execution::{self, context::Context, Request},
    ingest_sdl,
    registry::{
        resolvers::{ResolverFn, TypeResolverFn},
        MetaType, Registry, Resolver,
    },
    response::Response,
};

/// An executable GraphQL schema.
///
/// Built either directly from SDL and resolver functions ([`Schema::build`]),
/// by stitching ([`merge_schemas`](crate::merge_schemas)), or as a remote
/// proxy ([`remote_executable_schema`](crate::remote_executable_schema)).
/// Immutable once constructed; execution state lives per request.
pub struct Schema {
    pub(crate) registry: Registry,
    pub(crate) type_resolvers: HashMap<String, TypeResolverFn>,
    /// For merged schemas: every upstream that contributed a definition of a
    /// type, winners and losers alike, in contribution order.
    pub(crate) type_origins: HashMap<String, Vec<usize>>,
    /// For merged schemas: the contributing schemas, in contribution order.
    /// Delegation routes through these.
    pub(crate) upstreams: Vec<Arc<Schema>>,
}

impl Schema {
    /// Start building an executable schema from SDL.
    pub fn build(sdl: &str) -> Result<SchemaBuilder, SchemaBuildError> {
        let document = parse_schema(sdl).map_err(|err| SchemaBuildError::Parse(err.to_string()))?;
        let contents = ingest_sdl::lower_document(&document, &Resolver::Parent)
            .map_err(SchemaBuildError::Parse)?;

        if let Some(extension) = contents.extensions.first() {
            return Err(SchemaBuildError::UnexpectedExtension {
                type_name: extension.target.clone(),
            });
        }

        let mut registry = Registry::default();
        for ty in contents.types {
            let name = ty.name().to_string();
            if registry.types.insert(name.clone(), ty).is_some() {
                return Err(SchemaBuildError::DuplicateType { type_name: name });
            }
        }
        registry.ensure_builtin_scalars();

        registry.query_type = contents.query_root.unwrap_or_else(|| "Query".to_string());
        if !matches!(registry.types.get(&registry.query_type), Some(MetaType::Object { .. })) {
            return Err(SchemaBuildError::MissingRoot {
                type_name: registry.query_type.clone(),
                operation: "query",
            });
        }
        registry.mutation_type = match contents.mutation_root {
            Some(name) => {
                if !matches!(registry.types.get(&name), Some(MetaType::Object { .. })) {
                    return Err(SchemaBuildError::MissingRoot {
                        type_name: name,
                        operation: "mutation",
                    });
                }
                Some(name)
            }
            None => registry
                .types
                .contains_key("Mutation")
                .then(|| "Mutation".to_string()),
        };

        Ok(SchemaBuilder {
            registry,
            type_resolvers: HashMap::new(),
            pending_resolvers: Vec::new(),
        })
    }

    /// Execute one request against this schema.
    pub async fn execute(&self, request: Request) -> Response {
        execution::execute(self, request).await
    }

    /// Execute an already-parsed document; used by delegation.
    pub(crate) async fn execute_parsed(
        &self,
        document: async_graphql_parser::types::ExecutableDocument,
        variables: Variables,
        ctx: Context,
    ) -> Response {
        execution::execute_parsed(self, document, None, variables, ctx).await
    }

    /// The schema's type arena.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Which contributions defined `type_name`, in contribution order. A
    /// type that lost a merge conflict still shows up here, so callers can
    /// see every schema that owns a version of it. Empty for non-merged
    /// schemas and synthetic types.
    pub fn type_origins(&self, type_name: &str) -> &[usize] {
        self.type_origins
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn upstream(&self, index: usize) -> Option<&Arc<Schema>> {
        self.upstreams.get(index)
    }

    pub(crate) fn type_resolver(&self, type_name: &str) -> Option<&TypeResolverFn> {
        self.type_resolvers.get(type_name)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("types", &self.registry.types.len())
            .field("query_type", &self.registry.query_type)
            .field("mutation_type", &self.registry.mutation_type)
            .field("upstreams", &self.upstreams.len())
            .finish()
    }
}

/// Builder returned by [`Schema::build`]: attach resolver functions and
/// abstract-type resolvers, then [`finish`](SchemaBuilder::finish).
pub struct SchemaBuilder {
    registry: Registry,
    type_resolvers: HashMap<String, TypeResolverFn>,
    pending_resolvers: Vec<(String, String, ResolverFn)>,
}

impl std::fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("registry", &self.registry)
            .field("type_resolvers", &self.type_resolvers.keys().collect::<Vec<_>>())
            .field(
                "pending_resolvers",
                &self.pending_resolvers.iter().map(|(a, b, _)| (a, b)).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SchemaBuilder {
    /// Attach a synchronous resolver to `TypeName.field`.
    #[must_use]
    pub fn resolver<F>(self, type_name: &str, field_name: &str, f: F) -> Self
    where
        F: Fn(crate::registry::resolvers::ResolverContext<'_>) -> crate::error::Result<serde_json::Value>
            + Send
            + Sync
            + 'static,
    {
        self.resolver_fn(type_name, field_name, ResolverFn::new_sync(f))
    }

    /// Attach an already-wrapped resolver to `TypeName.field`.
    #[must_use]
    pub fn resolver_fn(mut self, type_name: &str, field_name: &str, f: ResolverFn) -> Self {
        self.pending_resolvers
            .push((type_name.to_string(), field_name.to_string(), f));
        self
    }

    /// Attach a concrete-type resolver for a union or interface.
    #[must_use]
    pub fn type_resolver<F>(mut self, type_name: &str, f: F) -> Self
    where
        F: Fn(&serde_json::Value) -> Option<String> + Send + Sync + 'static,
    {
        self.type_resolvers.insert(type_name.to_string(), Arc::new(f));
        self
    }

    /// Validate resolver targets and freeze the schema.
    pub fn finish(mut self) -> Result<Arc<Schema>, SchemaBuildError> {
        for (type_name, field_name, resolver) in self.pending_resolvers {
            let Some(ty) = self.registry.types.get_mut(&type_name) else {
                return Err(SchemaBuildError::UnknownType { type_name });
            };
            let Some(field) = ty.field_mut(&field_name) else {
                return Err(SchemaBuildError::UnknownField { type_name, field_name });
            };
            field.resolver = Resolver::CustomFn(resolver);
        }

        for type_name in self.type_resolvers.keys() {
            if !self.registry.types.contains_key(type_name) {
                return Err(SchemaBuildError::UnknownType {
                    type_name: type_name.clone(),
                });
            }
        }

        Ok(Arc::new(Schema {
            registry: self.registry,
            type_resolvers: self.type_resolvers,
            type_origins: HashMap::new(),
            upstreams: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_resolvers_on_unknown_fields() {
        let err = Schema::build("type Query { ping: String }")
            .unwrap()
            .resolver("Query", "pong", |_: crate::registry::resolvers::ResolverContext<'_>| Ok(serde_json::Value::Null))
            .finish()
            .unwrap_err();
        assert!(matches!(err, SchemaBuildError::UnknownField { .. }));
    }

    #[test]
    fn build_requires_a_query_root() {
        let err = Schema::build("type Thing { id: ID }").unwrap_err();
        assert!(matches!(err, SchemaBuildError::MissingRoot { operation: "query", .. }));
    }

    #[test]
    fn build_rejects_extensions() {
        let err = Schema::build("type Query { ping: String } extend type Query { pong: String }").unwrap_err();
        assert!(matches!(err, SchemaBuildError::UnexpectedExtension { .. }));
    }
}
