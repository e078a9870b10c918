//! Required-projection sets for link resolvers.
//!
//! A link resolver's fragment annotation declares a data dependency on its
//! parent. It is parsed once at bind time and reduced to a set of field
//! paths; the delegation engine merges those paths into any upstream
//! sub-operation that yields the parent.

use async_graphql_parser::{
    parse_query,
    types::{ExecutableDocument, Selection, SelectionSet},
};

/// One required field, with its own required sub-selections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredField {
    /// The field name (no aliases in annotations).
    pub field: String,
    /// Required sub-selections, empty for leaves.
    pub selections: Vec<RequiredField>,
}

/// The set of parent field paths a link resolver needs, plus the parent type
/// the annotation was declared on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSet {
    /// The annotation's type condition.
    pub type_condition: String,
    /// Top-level required fields.
    pub fields: Vec<RequiredField>,
}

impl FieldSet {
    /// Parse a fragment annotation, e.g.
    /// `fragment PropertyFragment on Property { id }`.
    ///
    /// The fragment name is irrelevant and discarded; only the type condition
    /// and the field paths are kept. Fragment spreads and inline fragments
    /// are not allowed inside an annotation.
    pub fn parse(annotation: &str) -> Result<FieldSet, String> {
        let document = parse_query(annotation).map_err(|err| err.to_string())?;
        let (name, fragment) = single_fragment(&document)?;
        let fields = lower_selection_set(&fragment.node.selection_set.node)
            .map_err(|err| format!("in fragment `{name}`: {err}"))?;
        if fields.is_empty() {
            return Err(format!("fragment `{name}` selects no fields"));
        }
        Ok(FieldSet {
            type_condition: fragment.node.type_condition.node.on.node.to_string(),
            fields,
        })
    }

    /// Whether every required path is present in `object`. A `null` at a
    /// non-leaf path counts as present; the resolver sees the null.
    pub fn all_fields_present(&self, object: &serde_json::Map<String, serde_json::Value>) -> bool {
        fields_present(&self.fields, object)
    }
}

fn single_fragment(
    document: &ExecutableDocument,
) -> Result<(String, &async_graphql_parser::Positioned<async_graphql_parser::types::FragmentDefinition>), String> {
    let mut fragments = document.fragments.iter();
    let (name, fragment) = fragments
        .next()
        .ok_or_else(|| "annotation must be a fragment definition".to_string())?;
    if fragments.next().is_some() {
        return Err("annotation must contain exactly one fragment definition".to_string());
    }
    Ok((name.to_string(), fragment))
}

fn lower_selection_set(selection_set: &SelectionSet) -> Result<Vec<RequiredField>, String> {
    let mut fields = Vec::new();
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                if field.node.alias.is_some() {
                    return Err(format!("field `{}` must not be aliased", field.node.name.node));
                }
                fields.push(RequiredField {
                    field: field.node.name.node.to_string(),
                    selections: lower_selection_set(&field.node.selection_set.node)?,
                });
            }
            Selection::FragmentSpread(spread) => {
                return Err(format!(
                    "fragment spread `...{}` is not allowed here",
                    spread.node.fragment_name.node
                ));
            }
            Selection::InlineFragment(_) => {
                return Err("inline fragments are not allowed here".to_string());
            }
        }
    }
    Ok(fields)
}

fn fields_present(
    required: &[RequiredField],
    object: &serde_json::Map<String, serde_json::Value>,
) -> bool {
    required.iter().all(|field| match object.get(&field.field) {
        None => false,
        Some(serde_json::Value::Object(inner)) => fields_present(&field.selections, inner),
        Some(serde_json::Value::Null) => true,
        Some(_) => field.selections.is_empty(),
    })
}

impl std::fmt::Display for FieldSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_fields(f, &self.fields)
    }
}

fn write_fields(f: &mut std::fmt::Formatter<'_>, fields: &[RequiredField]) -> std::fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i != 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", field.field)?;
        if !field.selections.is_empty() {
            write!(f, " {{ ")?;
            write_fields(f, &field.selections)?;
            write!(f, " }}")?;
        }
    }
    Ok(())
}
