//! Per-operation execution state and the resolver-facing info handle.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::{Arc, Mutex},
};

use async_graphql_parser::{
    types::{Field, FragmentDefinition, OperationType, VariableDefinition},
    Positioned,
};
use async_graphql_value::{Name, Variables};

use crate::{
    response::{PathSegment, ServerError},
    schema::Schema,
};

/// A type map for caller-supplied context data, shared by every resolver of
/// one operation.
#[derive(Default)]
pub struct Data(HashMap<TypeId, Box<dyn Any + Send + Sync>>);

impl Data {
    /// Insert a value, keyed by its type.
    pub fn insert<D: Any + Send + Sync>(&mut self, data: D) {
        self.0.insert(TypeId::of::<D>(), Box::new(data));
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Data").finish()
    }
}

/// The caller context threaded through resolvers and delegations unchanged.
#[derive(Clone, Debug, Default)]
pub struct Context {
    data: Arc<Data>,
}

impl Context {
    /// Wrap context data.
    pub fn new(data: Data) -> Self {
        Self { data: Arc::new(data) }
    }

    /// The context value of type `D`, if one was inserted.
    pub fn get<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.data.0.get(&TypeId::of::<D>()).and_then(|boxed| boxed.downcast_ref())
    }
}

/// State shared by every field resolution of one operation. Frozen at
/// operation start; only the error sink is written afterwards.
pub(crate) struct QueryEnv {
    pub fragments: HashMap<Name, Positioned<FragmentDefinition>>,
    pub variable_definitions: Vec<Positioned<VariableDefinition>>,
    pub variables: Variables,
    pub operation_type: OperationType,
    pub ctx: Context,
    pub errors: Mutex<Vec<ServerError>>,
}

impl QueryEnv {
    pub fn add_error(&self, error: ServerError) {
        self.errors.lock().expect("error sink poisoned").push(error);
    }

    pub fn into_errors(self) -> Vec<ServerError> {
        self.errors.into_inner().expect("error sink poisoned")
    }
}

/// The resolver-side view of one field resolution: the incoming selection
/// AST, fragment definitions, variables, the schema handle and the response
/// path. Borrowed for the duration of the resolution.
pub struct ResolveInfo<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) env: &'a QueryEnv,
    pub(crate) field: &'a Positioned<Field>,
    pub(crate) parent_type_name: &'a str,
    pub(crate) path: Vec<PathSegment>,
}

impl<'a> ResolveInfo<'a> {
    /// The schema this operation executes against.
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// The field node being resolved.
    pub fn field(&self) -> &'a Positioned<Field> {
        self.field
    }

    /// The field's name in the schema.
    pub fn field_name(&self) -> &'a str {
        self.field.node.name.node.as_str()
    }

    /// The key under which the value lands in the response.
    pub fn response_key(&self) -> &'a str {
        self.field
            .node
            .alias
            .as_ref()
            .map(|alias| alias.node.as_str())
            .unwrap_or_else(|| self.field_name())
    }

    /// The name of the type the field is selected on.
    pub fn parent_type_name(&self) -> &'a str {
        self.parent_type_name
    }

    /// Fragment definitions of the incoming operation.
    pub fn fragments(&self) -> &'a HashMap<Name, Positioned<FragmentDefinition>> {
        &self.env.fragments
    }

    /// Variable definitions of the incoming operation.
    pub fn variable_definitions(&self) -> &'a [Positioned<VariableDefinition>] {
        &self.env.variable_definitions
    }

    /// Coerced variable values of the incoming operation.
    pub fn variables(&self) -> &'a Variables {
        &self.env.variables
    }

    /// The operation kind being executed.
    pub fn operation_type(&self) -> OperationType {
        self.env.operation_type
    }

    /// The response path of the field being resolved.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Attach an error to the response without failing the current field.
    /// Used to forward partial-result errors from upstream executions.
    pub fn add_error(&self, error: ServerError) {
        self.env.add_error(error);
    }
}
