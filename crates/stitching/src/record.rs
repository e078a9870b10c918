//! The schema recorder: normalizes heterogeneous contributions into an
//! inventory of type definitions with origins.

use std::sync::Arc;

use async_graphql_parser::{parse_schema, types::OperationType};

use crate::{
    error::MergeError,
    ingest_sdl::{self, TypeExtension},
    registry::{
        resolvers::{DelegateResolver, TypeResolverFn},
        MetaType, Registry, Resolver,
    },
    schema::Schema,
};

/// One schema contributed to a merge: either an executable schema whose
/// types keep their origin for delegation, or SDL introducing synthetic
/// types and `extend` declarations.
#[derive(Clone)]
pub enum SchemaContribution {
    /// An executable schema. Its root fields delegate back to it.
    Executable(Arc<Schema>),
    /// SDL text. May contain `extend type …` declarations; those are
    /// deferred and applied after all contributions merged.
    Sdl(String),
}

impl From<Arc<Schema>> for SchemaContribution {
    fn from(schema: Arc<Schema>) -> Self {
        SchemaContribution::Executable(schema)
    }
}

impl From<&str> for SchemaContribution {
    fn from(sdl: &str) -> Self {
        SchemaContribution::Sdl(sdl.to_string())
    }
}

impl From<String> for SchemaContribution {
    fn from(sdl: String) -> Self {
        SchemaContribution::Sdl(sdl)
    }
}

/// Where a recorded type sits in its contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TypeRole {
    /// A plain named type.
    Ordinary,
    /// The contribution's query root; its fields merge into the merged
    /// schema's query root.
    QueryRoot,
    /// The contribution's mutation root.
    MutationRoot,
}

/// A recorded type definition: the definition prepared for merged execution,
/// plus its origin.
#[derive(Debug)]
pub(crate) struct InventoryEntry {
    pub ty: MetaType,
    /// Index into [`RecordedSchemas::upstreams`]; `None` for synthetic types
    /// introduced by SDL.
    pub origin: Option<usize>,
    pub role: TypeRole,
}

/// The recorder's output: everything the type merger folds.
pub(crate) struct RecordedSchemas {
    /// All recorded types, in contribution order then declaration order.
    pub entries: Vec<InventoryEntry>,
    /// Deferred `extend` declarations, in contribution order.
    pub extensions: Vec<TypeExtension>,
    /// The executable contributions, in contribution order. Delegation
    /// targets index into this.
    pub upstreams: Vec<Arc<Schema>>,
    /// Abstract-type resolvers collected from executable contributions.
    pub type_resolvers: Vec<(String, TypeResolverFn)>,
}

impl std::fmt::Debug for RecordedSchemas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordedSchemas")
            .field("entries", &self.entries)
            .field("extensions", &self.extensions)
            .field("upstreams", &self.upstreams.len())
            .field(
                "type_resolvers",
                &self.type_resolvers.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

pub(crate) fn record(contributions: &[SchemaContribution]) -> Result<RecordedSchemas, MergeError> {
    let mut recorded = RecordedSchemas {
        entries: Vec::new(),
        extensions: Vec::new(),
        upstreams: Vec::new(),
        type_resolvers: Vec::new(),
    };

    for (index, contribution) in contributions.iter().enumerate() {
        match contribution {
            SchemaContribution::Executable(schema) => {
                let origin = recorded.upstreams.len();
                recorded.upstreams.push(Arc::clone(schema));
                record_executable(schema, origin, &mut recorded);
            }
            SchemaContribution::Sdl(sdl) => {
                record_sdl(sdl, index, &mut recorded)?;
            }
        }
    }

    Ok(recorded)
}

// Walk an executable schema's arena. Root fields become delegations back to
// the origin; every other field reads from the parent data the delegation
// returned. The origin's own resolvers stay behind on the origin schema,
// where delegated sub-operations execute them.
fn record_executable(schema: &Arc<Schema>, origin: usize, recorded: &mut RecordedSchemas) {
    let registry = &schema.registry;

    for (name, ty) in &registry.types {
        if is_shared_type(name, ty) {
            continue;
        }

        let role = if *name == registry.query_type {
            TypeRole::QueryRoot
        } else if Some(name.as_str()) == registry.mutation_type.as_deref() {
            TypeRole::MutationRoot
        } else {
            TypeRole::Ordinary
        };

        let resolver = match role {
            TypeRole::QueryRoot => Resolver::Delegate(DelegateResolver {
                schema_index: origin,
                operation: OperationType::Query,
            }),
            TypeRole::MutationRoot => Resolver::Delegate(DelegateResolver {
                schema_index: origin,
                operation: OperationType::Mutation,
            }),
            TypeRole::Ordinary => Resolver::Parent,
        };

        let mut ty = ty.clone();
        if let Some(fields) = fields_mut(&mut ty) {
            for field in fields.values_mut() {
                field.resolver = resolver.clone();
                field.requires = None;
            }
        }

        recorded.entries.push(InventoryEntry {
            ty,
            origin: Some(origin),
            role,
        });
    }

    for (type_name, resolve) in &schema.type_resolvers {
        recorded
            .type_resolvers
            .push((type_name.clone(), Arc::clone(resolve)));
    }
}

fn record_sdl(sdl: &str, index: usize, recorded: &mut RecordedSchemas) -> Result<(), MergeError> {
    let document = parse_schema(sdl).map_err(|err| MergeError::SdlParse {
        index,
        message: err.to_string(),
    })?;
    let contents = ingest_sdl::lower_document(&document, &Resolver::Unbound).map_err(|message| {
        MergeError::SdlParse { index, message }
    })?;

    let query_root = contents.query_root.unwrap_or_else(|| "Query".to_string());
    let mutation_root = contents.mutation_root.unwrap_or_else(|| "Mutation".to_string());

    for ty in contents.types {
        let role = if ty.name() == query_root {
            TypeRole::QueryRoot
        } else if ty.name() == mutation_root {
            TypeRole::MutationRoot
        } else {
            TypeRole::Ordinary
        };
        recorded.entries.push(InventoryEntry {
            ty,
            origin: None,
            role,
        });
    }

    recorded.extensions.extend(contents.extensions);
    Ok(())
}

// Built-in scalars and introspection machinery are recorded once and shared;
// they never conflict.
fn is_shared_type(name: &str, ty: &MetaType) -> bool {
    name.starts_with("__") || (Registry::is_builtin_scalar(name) && matches!(ty, MetaType::Scalar { .. }))
}

fn fields_mut(ty: &mut MetaType) -> Option<&mut indexmap::IndexMap<String, crate::registry::MetaField>> {
    match ty {
        MetaType::Object { object, .. } => Some(&mut object.fields),
        MetaType::Interface { interface, .. } => Some(&mut interface.fields),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::resolvers::ResolverContext;

    #[test]
    fn sdl_parse_failures_name_the_contribution() {
        let err = record(&[SchemaContribution::Sdl("type {".to_string())]).unwrap_err();
        let MergeError::SdlParse { index, .. } = err else {
            panic!("expected SdlParse");
        };
        assert_eq!(index, 0);
    }

    #[test]
    fn executable_root_fields_become_delegations() {
        let schema = Schema::build("type Query { ping: String } type Pong { value: Int }")
            .unwrap()
            .resolver("Query", "ping", |_: ResolverContext<'_>| Ok(serde_json::json!("pong")))
            .finish()
            .unwrap();

        let recorded = record(&[SchemaContribution::Executable(schema)]).unwrap();

        let query = recorded
            .entries
            .iter()
            .find(|entry| entry.role == TypeRole::QueryRoot)
            .expect("query root recorded");
        let field = query.ty.field("ping").unwrap();
        assert!(matches!(
            field.resolver,
            Resolver::Delegate(DelegateResolver { schema_index: 0, .. })
        ));

        let pong = recorded.entries.iter().find(|entry| entry.ty.name() == "Pong").unwrap();
        assert!(matches!(pong.ty.field("value").unwrap().resolver, Resolver::Parent));
        assert_eq!(pong.origin, Some(0));
    }
}
