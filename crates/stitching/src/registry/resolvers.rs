//! Field resolution strategies.
//!
//! Every output field in a registry carries exactly one [`Resolver`]. The
//! execution engine dispatches on it; everything else (completion, error
//! handling, nullability) is uniform.

use std::sync::Arc;

use async_graphql_parser::types::OperationType;
use futures_util::future::BoxFuture;

use crate::{
    error::{Error, Result},
    execution::context::{Context, ResolveInfo},
};

/// Resolves the concrete object type of a union or interface value.
pub type TypeResolverFn = Arc<dyn Fn(&serde_json::Value) -> Option<String> + Send + Sync>;

/// Everything a resolver function gets to see.
pub struct ResolverContext<'a> {
    /// The parent object's data.
    pub parent: &'a serde_json::Value,
    /// Arguments, coerced against the field's declared argument types.
    pub args: serde_json::Map<String, serde_json::Value>,
    /// The caller-supplied context data.
    pub ctx: &'a Context,
    /// Selection, fragments, variables and the schema handle.
    pub info: ResolveInfo<'a>,
}

impl<'a> ResolverContext<'a> {
    /// The argument named `name`, if provided or defaulted.
    pub fn arg(&self, name: &str) -> Option<&serde_json::Value> {
        self.args.get(name)
    }

    /// The parent value as an object, or an error naming the field.
    pub fn parent_object(&self) -> Result<&'a serde_json::Map<String, serde_json::Value>> {
        self.parent
            .as_object()
            .ok_or_else(|| Error::new(format!("expected an object parent for `{}`", self.info.field_name())))
    }
}

/// A resolver function, as registered on a leaf schema or supplied by the
/// operator for a link field. Receives the parent value, coerced arguments,
/// the caller context and the resolve info; returns JSON data for the engine
/// to complete against the field's declared type.
#[derive(Clone)]
pub struct ResolverFn(Arc<dyn ErasedResolver>);

impl ResolverFn {
    /// Wrap a synchronous resolver.
    pub fn new_sync<F>(f: F) -> Self
    where
        F: Fn(ResolverContext<'_>) -> Result<serde_json::Value> + Send + Sync + 'static,
    {
        ResolverFn(Arc::new(SyncResolver(f)))
    }

    /// Wrap an asynchronous resolver. Plain `fn` items of the matching
    /// signature coerce without ceremony; delegating link resolvers are
    /// usually written that way.
    pub fn new_async<F>(f: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>> + Send + Sync + 'static,
    {
        ResolverFn(Arc::new(AsyncResolver(f)))
    }

    /// Wrap an asynchronous resolver that closes over shared state, such as
    /// the [`MergeInfo`](crate::MergeInfo) handed to a resolver factory.
    /// `f` is usually a plain `fn` item taking the state by reference.
    pub fn new_async_with<T, F>(state: T, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&'a T, ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>>
            + Send
            + Sync
            + 'static,
    {
        ResolverFn(Arc::new(StatefulResolver { state, f }))
    }

    /// Wrap a hand-written [`ErasedResolver`]. The remote proxy resolvers
    /// are stateful and implement the trait directly.
    pub(crate) fn from_erased(inner: Arc<dyn ErasedResolver>) -> Self {
        ResolverFn(inner)
    }

    pub(crate) fn call<'a>(&'a self, ctx: ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>> {
        self.0.call(ctx)
    }
}

/// Object-safe resolver invocation.
pub(crate) trait ErasedResolver: Send + Sync {
    fn call<'a>(&'a self, ctx: ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>>;
}

struct SyncResolver<F>(F);

impl<F> ErasedResolver for SyncResolver<F>
where
    F: Fn(ResolverContext<'_>) -> Result<serde_json::Value> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>> {
        let result = (self.0)(ctx);
        Box::pin(futures_util::future::ready(result))
    }
}

struct StatefulResolver<T, F> {
    state: T,
    f: F,
}

impl<T, F> ErasedResolver for StatefulResolver<T, F>
where
    T: Send + Sync,
    F: for<'a> Fn(&'a T, ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>> {
        (self.f)(&self.state, ctx)
    }
}

struct AsyncResolver<F>(F);

impl<F> ErasedResolver for AsyncResolver<F>
where
    F: for<'a> Fn(ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value>> {
        (self.0)(ctx)
    }
}

/// Delegates a root field to the upstream schema that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelegateResolver {
    /// Index of the owning schema in the merged schema's upstream inventory.
    pub schema_index: usize,
    /// The operation kind the field lives under on the upstream.
    pub operation: OperationType,
}

/// An operator-supplied resolver for a field that crosses schema boundaries.
#[derive(Clone)]
pub struct LinkResolver {
    /// The resolve function.
    pub resolve: ResolverFn,
}

/// How a field produces its value.
#[derive(Clone, Default)]
pub enum Resolver {
    /// Read the field's response key out of the parent JSON object. Serves
    /// scalar passthrough, enum identity, and composite fields whose data
    /// already arrived with the parent.
    #[default]
    Parent,
    /// A plain resolver function on a leaf schema.
    CustomFn(ResolverFn),
    /// Synthesize a sub-operation against an upstream schema and execute it
    /// there.
    Delegate(DelegateResolver),
    /// An operator-supplied link resolver.
    Link(LinkResolver),
    /// A field introduced by extension SDL with no resolver bound. Resolves
    /// to `null` with an execution error.
    Unbound,
}

impl Resolver {
    /// Whether this field must not leak into upstream sub-operations.
    pub fn is_stitched(&self) -> bool {
        matches!(self, Resolver::Link(_) | Resolver::Unbound)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolver::Parent => f.write_str("Parent"),
            Resolver::CustomFn(_) => f.write_str("CustomFn"),
            Resolver::Delegate(delegate) => f.debug_tuple("Delegate").field(delegate).finish(),
            Resolver::Link(_) => f.write_str("Link"),
            Resolver::Unbound => f.write_str("Unbound"),
        }
    }
}
