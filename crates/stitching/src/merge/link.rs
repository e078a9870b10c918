//! Binding of operator-supplied link resolvers onto the merged type map.

use indexmap::IndexMap;

use crate::{
    error::MergeError,
    registry::{
        field_set::FieldSet,
        resolvers::{LinkResolver, ResolverFn},
        Registry, Resolver,
    },
};

/// An operator-supplied resolver for one linked field: an optional fragment
/// naming the parent fields the resolver depends on, and the resolve
/// function itself.
pub struct ResolverSpec {
    /// Parent fields that must be fetched alongside the parent, as a
    /// fragment on the parent type, e.g.
    /// `fragment BookingFragment on Booking { propertyId }`.
    pub fragment: Option<String>,
    /// The resolve function. Usually delegates through
    /// [`MergeInfo::delegate`](crate::MergeInfo::delegate).
    pub resolve: ResolverFn,
}

impl ResolverSpec {
    /// A spec with no fragment annotation.
    pub fn new(resolve: ResolverFn) -> Self {
        Self {
            fragment: None,
            resolve,
        }
    }

    /// Declare the parent fields this resolver depends on.
    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }
}

/// The mapping handed back by a resolver factory:
/// `{ TypeName: { fieldName: ResolverSpec } }`.
#[derive(Default)]
pub struct LinkResolvers(pub(crate) IndexMap<String, IndexMap<String, ResolverSpec>>);

impl LinkResolvers {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver for `TypeName.field`.
    #[must_use]
    pub fn field(mut self, type_name: &str, field_name: &str, spec: ResolverSpec) -> Self {
        self.0
            .entry(type_name.to_string())
            .or_default()
            .insert(field_name.to_string(), spec);
        self
    }
}

/// Replace the targeted fields' resolution strategies with the operator's
/// link resolvers. Fragment annotations are parsed here, once; execution
/// only ever sees the reduced field sets.
pub(crate) fn bind_link_resolvers(registry: &mut Registry, resolvers: LinkResolvers) -> Result<(), MergeError> {
    for (type_name, fields) in resolvers.0 {
        for (field_name, spec) in fields {
            let requires = spec
                .fragment
                .as_deref()
                .map(|fragment| parse_annotation(registry, &type_name, &field_name, fragment))
                .transpose()?;

            let Some(ty) = registry.types.get_mut(&type_name) else {
                return Err(MergeError::UnknownLinkType { type_name });
            };
            let Some(field) = ty.field_mut(&field_name) else {
                return Err(MergeError::UnknownLinkField { type_name, field_name });
            };

            field.resolver = Resolver::Link(LinkResolver { resolve: spec.resolve });
            field.requires = requires;
        }
    }
    Ok(())
}

fn parse_annotation(
    registry: &Registry,
    type_name: &str,
    field_name: &str,
    fragment: &str,
) -> Result<FieldSet, MergeError> {
    let invalid = |message: String| MergeError::InvalidLinkFragment {
        type_name: type_name.to_string(),
        field_name: field_name.to_string(),
        message,
    };

    let field_set = FieldSet::parse(fragment).map_err(invalid)?;
    if registry.lookup(&field_set.type_condition).is_none() {
        return Err(invalid(format!(
            "type condition `{}` does not exist in the merged schema",
            field_set.type_condition
        )));
    }
    Ok(field_set)
}
