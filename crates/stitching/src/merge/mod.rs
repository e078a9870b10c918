//! The type merger: folds recorded inventories into one executable schema.

pub mod link;

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;

use crate::{
    delegate::MergeInfo,
    error::MergeError,
    ingest_sdl::TypeExtension,
    record::{self, InventoryEntry, SchemaContribution, TypeRole},
    registry::{MetaField, MetaType, ObjectType, Registry},
    schema::Schema,
};

pub use self::link::{LinkResolvers, ResolverSpec};

/// The conflict callback: given the already-merged definition and the
/// incoming one, return the winner (or an equivalent merged definition).
pub type OnTypeConflict = Box<dyn Fn(&MetaType, &MetaType) -> MetaType + Send + Sync>;

/// A resolver factory. Invoked once, after type merging, with the
/// [`MergeInfo`] carrying the `delegate` primitive.
pub type ResolverFactory = Box<dyn FnOnce(&MergeInfo) -> LinkResolvers + Send>;

/// Everything [`merge_schemas`] needs.
#[derive(Default)]
pub struct MergeConfig {
    /// The contributions, in merge order.
    pub schemas: Vec<SchemaContribution>,
    /// Tie-breaker for type name collisions. Missing means "keep existing".
    pub on_type_conflict: Option<OnTypeConflict>,
    /// Operator-supplied link resolvers.
    pub resolvers: Option<ResolverFactory>,
}

impl MergeConfig {
    /// A config merging the given contributions with default policies.
    pub fn new(schemas: impl IntoIterator<Item = SchemaContribution>) -> Self {
        MergeConfig {
            schemas: schemas.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Set the conflict tie-breaker.
    #[must_use]
    pub fn on_type_conflict<F>(mut self, callback: F) -> Self
    where
        F: Fn(&MetaType, &MetaType) -> MetaType + Send + Sync + 'static,
    {
        self.on_type_conflict = Some(Box::new(callback));
        self
    }

    /// Set the link resolver factory.
    #[must_use]
    pub fn resolvers<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&MergeInfo) -> LinkResolvers + Send + 'static,
    {
        self.resolvers = Some(Box::new(factory));
        self
    }
}

/// Merge the contributions into a single executable schema whose resolvers
/// delegate back to the originating schemas.
///
/// Two phases: types are merged and origins computed first; then the
/// resolver factory runs with a [`MergeInfo`] built over the finished
/// inventory, and its link resolvers are bound. Nothing about the merge is
/// mutable afterwards.
pub fn merge_schemas(config: MergeConfig) -> Result<Arc<Schema>, MergeError> {
    let recorded = record::record(&config.schemas)?;

    let mut merger = Merger {
        on_type_conflict: config.on_type_conflict,
        types: IndexMap::new(),
        query_fields: IndexMap::new(),
        mutation_fields: IndexMap::new(),
        type_origins: HashMap::new(),
    };

    for entry in recorded.entries {
        merger.fold(entry);
    }
    for extension in recorded.extensions {
        merger.extend(extension)?;
    }

    let (mut registry, type_origins) = merger.into_registry()?;

    let mut type_resolvers = HashMap::new();
    for (type_name, resolve) in recorded.type_resolvers {
        type_resolvers.entry(type_name).or_insert(resolve);
    }

    if let Some(factory) = config.resolvers {
        let merge_info = MergeInfo::new(recorded.upstreams.clone());
        let resolvers = factory(&merge_info);
        link::bind_link_resolvers(&mut registry, resolvers)?;
    }

    tracing::debug!(
        types = registry.types.len(),
        upstreams = recorded.upstreams.len(),
        "merged schema assembled"
    );

    Ok(Arc::new(Schema {
        registry,
        type_resolvers,
        type_origins,
        upstreams: recorded.upstreams,
    }))
}

struct Merger {
    on_type_conflict: Option<OnTypeConflict>,
    types: IndexMap<String, MetaType>,
    query_fields: IndexMap<String, MetaField>,
    mutation_fields: IndexMap<String, MetaField>,
    type_origins: HashMap<String, Vec<usize>>,
}

impl Merger {
    fn fold(&mut self, entry: InventoryEntry) {
        if let Some(origin) = entry.origin {
            self.type_origins
                .entry(entry.ty.name().to_string())
                .or_default()
                .push(origin);
        }

        match entry.role {
            // Operation roots merge field by field across contributions, so
            // every upstream's root fields stay reachable. First definition
            // of a root field wins.
            TypeRole::QueryRoot => {
                if let Some(fields) = entry.ty.fields() {
                    for (name, field) in fields {
                        self.query_fields.entry(name.clone()).or_insert_with(|| field.clone());
                    }
                }
            }
            TypeRole::MutationRoot => {
                if let Some(fields) = entry.ty.fields() {
                    for (name, field) in fields {
                        self.mutation_fields
                            .entry(name.clone())
                            .or_insert_with(|| field.clone());
                    }
                }
            }
            TypeRole::Ordinary => {
                let name = entry.ty.name().to_string();
                match self.types.get(&name) {
                    None => {
                        self.types.insert(name, entry.ty);
                    }
                    Some(existing) => {
                        // The engine performs no structural comparison of
                        // its own; the callback decides, and a missing
                        // callback keeps the existing definition.
                        if let Some(callback) = &self.on_type_conflict {
                            let winner = callback(existing, &entry.ty);
                            self.types.insert(name, winner);
                        }
                    }
                }
            }
        }
    }

    fn extend(&mut self, extension: TypeExtension) -> Result<(), MergeError> {
        if extension.target == "Query" && !self.query_fields.is_empty() {
            for field in extension.fields {
                self.query_fields.entry(field.name.clone()).or_insert(field);
            }
            return Ok(());
        }
        if extension.target == "Mutation" && !self.mutation_fields.is_empty() {
            for field in extension.fields {
                self.mutation_fields.entry(field.name.clone()).or_insert(field);
            }
            return Ok(());
        }

        let Some(target) = self.types.get_mut(&extension.target) else {
            return Err(MergeError::DanglingExtension {
                type_name: extension.target,
            });
        };

        match target {
            MetaType::Object { object, .. } => {
                for field in extension.fields {
                    object.fields.entry(field.name.clone()).or_insert(field);
                }
            }
            MetaType::Interface { interface, .. } => {
                for field in extension.fields {
                    interface.fields.entry(field.name.clone()).or_insert(field);
                }
            }
            MetaType::Union { union, .. } => {
                for member in extension.members {
                    if !union.members.contains(&member) {
                        union.members.push(member);
                    }
                }
            }
            MetaType::Enum { enum_type, .. } => {
                for value in extension.values {
                    if !enum_type.values.contains(&value) {
                        enum_type.values.push(value);
                    }
                }
            }
            MetaType::InputObject { .. } | MetaType::Scalar { .. } => {
                return Err(MergeError::DanglingExtension {
                    type_name: extension.target,
                });
            }
        }
        Ok(())
    }

    fn into_registry(self) -> Result<(Registry, HashMap<String, Vec<usize>>), MergeError> {
        if self.query_fields.is_empty() {
            return Err(MergeError::MissingQueryRoot);
        }

        let mut registry = Registry {
            types: self.types,
            query_type: "Query".to_string(),
            mutation_type: (!self.mutation_fields.is_empty()).then(|| "Mutation".to_string()),
        };

        registry.types.insert(
            "Query".to_string(),
            MetaType::Object {
                name: "Query".to_string(),
                object: ObjectType {
                    fields: self.query_fields,
                    implements: Vec::new(),
                },
            },
        );
        if !self.mutation_fields.is_empty() {
            registry.types.insert(
                "Mutation".to_string(),
                MetaType::Object {
                    name: "Mutation".to_string(),
                    object: ObjectType {
                        fields: self.mutation_fields,
                        implements: Vec::new(),
                    },
                },
            );
        }
        registry.ensure_builtin_scalars();

        Ok((registry, self.type_origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Resolver;

    fn property_schema() -> Arc<Schema> {
        Schema::build(
            r"
            type Query { propertyById(id: ID!): Property }
            type Property { id: ID! name: String! }
            ",
        )
        .unwrap()
        .resolver("Query", "propertyById", |_: crate::registry::resolvers::ResolverContext<'_>| Ok(serde_json::Value::Null))
        .finish()
        .unwrap()
    }

    fn other_property_schema() -> Arc<Schema> {
        Schema::build(
            r"
            type Query { property(id: ID!): Property }
            type Property { id: ID! rating: Int }
            ",
        )
        .unwrap()
        .resolver("Query", "property", |_: crate::registry::resolvers::ResolverContext<'_>| Ok(serde_json::Value::Null))
        .finish()
        .unwrap()
    }

    #[test]
    fn keeps_the_existing_definition_without_a_callback() {
        let merged = merge_schemas(MergeConfig::new([
            property_schema().into(),
            other_property_schema().into(),
        ]))
        .unwrap();

        let property = merged.registry().lookup("Property").unwrap();
        assert!(property.field("name").is_some());
        assert!(property.field("rating").is_none());

        // Both roots' fields survive regardless of the type conflict.
        let query = merged.registry().lookup("Query").unwrap();
        assert!(query.field("propertyById").is_some());
        assert!(query.field("property").is_some());
    }

    #[test]
    fn the_conflict_callback_picks_the_winner() {
        let merged = merge_schemas(
            MergeConfig::new([property_schema().into(), other_property_schema().into()])
                .on_type_conflict(|_existing, incoming| incoming.clone()),
        )
        .unwrap();

        let property = merged.registry().lookup("Property").unwrap();
        assert!(property.field("rating").is_some());
        assert!(property.field("name").is_none());
    }

    #[test]
    fn losing_a_conflict_does_not_erase_the_origin() {
        let merged = merge_schemas(MergeConfig::new([
            property_schema().into(),
            other_property_schema().into(),
        ]))
        .unwrap();

        assert_eq!(merged.type_origins("Property"), &[0, 1]);
        assert_eq!(merged.type_origins("Booking"), &[] as &[usize]);
    }

    #[test]
    fn extensions_append_unbound_fields() {
        let merged = merge_schemas(MergeConfig::new([
            property_schema().into(),
            "extend type Property { nickname: String }".into(),
        ]))
        .unwrap();

        let field = merged
            .registry()
            .lookup("Property")
            .unwrap()
            .field("nickname")
            .unwrap();
        assert!(matches!(field.resolver, Resolver::Unbound));
    }

    #[test]
    fn dangling_extensions_are_fatal_at_merge_time() {
        let err = merge_schemas(MergeConfig::new([
            property_schema().into(),
            "extend type Bed { size: String }".into(),
        ]))
        .unwrap_err();
        assert!(matches!(err, MergeError::DanglingExtension { type_name } if type_name == "Bed"));
    }

    #[test]
    fn binding_to_an_unknown_field_is_fatal() {
        let err = merge_schemas(
            MergeConfig::new([property_schema().into()]).resolvers(|_info| {
                LinkResolvers::new().field(
                    "Property",
                    "doesNotExist",
                    ResolverSpec::new(crate::registry::resolvers::ResolverFn::new_sync(
                        |_: crate::registry::resolvers::ResolverContext<'_>| Ok(serde_json::Value::Null),
                    )),
                )
            }),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::UnknownLinkField { .. }));
    }
}
