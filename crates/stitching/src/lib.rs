#![deny(unsafe_code, rust_2018_idioms)]

//! GraphQL schema stitching.
//!
//! [`merge_schemas`] folds independently defined schemas into a single
//! executable schema whose resolvers transparently delegate back to the
//! originating schemas, and lets the operator splice in link fields that
//! join types across schema boundaries:
//!
//! ```no_run
//! use graphql_stitching::{merge_schemas, MergeConfig, LinkResolvers, ResolverSpec};
//! # fn example(property: std::sync::Arc<graphql_stitching::Schema>, bookings_resolver: graphql_stitching::ResolverFn) {
//! let merged = merge_schemas(
//!     MergeConfig::new([
//!         property.into(),
//!         "extend type Property { bookings(limit: Int): [Booking!] }".into(),
//!     ])
//!     .resolvers(move |_info| {
//!         LinkResolvers::new().field(
//!             "Property",
//!             "bookings",
//!             ResolverSpec::new(bookings_resolver)
//!                 .with_fragment("fragment PropertyFragment on Property { id }"),
//!         )
//!     }),
//! );
//! # }
//! ```
//!
//! Link resolvers receive a [`MergeInfo`] carrying the one primitive they
//! need, [`MergeInfo::delegate`]: synthesize a standalone sub-operation
//! against the upstream schema owning a root field, execute it there, and
//! return the value the caller would have seen querying that schema
//! directly.

mod delegate;
mod error;
mod execution;
mod ingest_sdl;
mod merge;
mod print;
mod record;
mod registry;
mod remote;
mod response;
mod schema;

pub use self::{
    delegate::MergeInfo,
    error::{Error, MergeError, Result, SchemaBuildError},
    execution::{
        context::{Context, Data, ResolveInfo},
        Request,
    },
    merge::{merge_schemas, LinkResolvers, MergeConfig, OnTypeConflict, ResolverFactory, ResolverSpec},
    record::SchemaContribution,
    registry::{
        field_set::{FieldSet, RequiredField},
        resolvers::{ResolverContext, ResolverFn, TypeResolverFn},
        EnumType, InputObjectType, InterfaceType, MetaField, MetaInputValue, MetaType, ObjectType, Registry,
        Resolver, TypeKind, TypeName, UnionType,
    },
    remote::{remote_executable_schema, FetchError, FetchRequest, FetchResponse, Fetcher},
    response::{PathSegment, Response, ServerError},
    schema::{Schema, SchemaBuilder},
};

pub use async_graphql_parser::types::OperationType;
