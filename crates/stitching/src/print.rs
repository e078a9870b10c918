//! Rendering of executable documents back to GraphQL text.
//!
//! Synthesized sub-operations stay as ASTs between in-process schemas; only
//! remote fetchers need text, and this module produces it.

use std::fmt::Write;

use async_graphql_parser::types::{
    DocumentOperations, ExecutableDocument, FragmentDefinition, OperationDefinition, OperationType, Selection,
    SelectionSet,
};

/// Render a document: operations first, then the fragment definitions it
/// carries.
pub(crate) fn print_document(document: &ExecutableDocument) -> String {
    let mut out = String::new();

    match &document.operations {
        DocumentOperations::Single(operation) => {
            print_operation(&mut out, None, &operation.node);
        }
        DocumentOperations::Multiple(operations) => {
            for (name, operation) in operations {
                print_operation(&mut out, Some(name.as_str()), &operation.node);
            }
        }
    }

    for (name, fragment) in &document.fragments {
        print_fragment(&mut out, name.as_str(), &fragment.node);
    }

    out
}

fn print_operation(out: &mut String, name: Option<&str>, operation: &OperationDefinition) {
    match operation.ty {
        OperationType::Query => out.push_str("query"),
        OperationType::Mutation => out.push_str("mutation"),
        OperationType::Subscription => out.push_str("subscription"),
    }
    if let Some(name) = name {
        let _ = write!(out, " {name}");
    }

    if !operation.variable_definitions.is_empty() {
        out.push('(');
        for (i, definition) in operation.variable_definitions.iter().enumerate() {
            if i != 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "${}: {}", definition.node.name.node, definition.node.var_type.node);
            if let Some(default) = &definition.node.default_value {
                let _ = write!(out, " = {}", default.node);
            }
        }
        out.push(')');
    }

    print_selection_set(out, &operation.selection_set.node, 0);
    out.push('\n');
}

fn print_fragment(out: &mut String, name: &str, fragment: &FragmentDefinition) {
    let _ = write!(out, "fragment {name} on {}", fragment.type_condition.node.on.node);
    print_selection_set(out, &fragment.selection_set.node, 0);
    out.push('\n');
}

fn print_selection_set(out: &mut String, selection_set: &SelectionSet, depth: usize) {
    if selection_set.items.is_empty() {
        out.push('\n');
        return;
    }

    out.push_str(" {\n");
    for selection in &selection_set.items {
        print_selection(out, &selection.node, depth + 1);
    }
    indent(out, depth);
    out.push_str("}\n");
}

fn print_selection(out: &mut String, selection: &Selection, depth: usize) {
    indent(out, depth);
    match selection {
        Selection::Field(field) => {
            if let Some(alias) = &field.node.alias {
                let _ = write!(out, "{}: ", alias.node);
            }
            out.push_str(field.node.name.node.as_str());

            if !field.node.arguments.is_empty() {
                out.push('(');
                for (i, (name, value)) in field.node.arguments.iter().enumerate() {
                    if i != 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}: {}", name.node, value.node);
                }
                out.push(')');
            }

            print_directives(out, &field.node.directives);

            if field.node.selection_set.node.items.is_empty() {
                out.push('\n');
            } else {
                print_selection_set(out, &field.node.selection_set.node, depth);
            }
        }
        Selection::FragmentSpread(spread) => {
            let _ = write!(out, "...{}", spread.node.fragment_name.node);
            print_directives(out, &spread.node.directives);
            out.push('\n');
        }
        Selection::InlineFragment(fragment) => {
            out.push_str("...");
            if let Some(condition) = &fragment.node.type_condition {
                let _ = write!(out, " on {}", condition.node.on.node);
            }
            print_directives(out, &fragment.node.directives);
            print_selection_set(out, &fragment.node.selection_set.node, depth);
        }
    }
}

fn print_directives(out: &mut String, directives: &[async_graphql_parser::Positioned<async_graphql_parser::types::Directive>]) {
    for directive in directives {
        let _ = write!(out, " @{}", directive.node.name.node);
        if !directive.node.arguments.is_empty() {
            out.push('(');
            for (i, (name, value)) in directive.node.arguments.iter().enumerate() {
                if i != 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: {}", name.node, value.node);
            }
            out.push(')');
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql_parser::parse_query;

    #[test]
    fn printed_documents_reparse() {
        let source = r#"
            query($id: ID!, $limit: Int = 2) {
                propertyById(id: $id) {
                    id
                    renamed: name
                    bookings(limit: $limit) @include(if: true) { ...BookingFragment }
                    ... on Property { name }
                }
            }
            fragment BookingFragment on Booking { id startTime }
        "#;
        let document = parse_query(source).unwrap();

        let printed = print_document(&document);
        let reparsed = parse_query(&printed).expect("printed document must parse");

        assert_eq!(print_document(&reparsed), printed);
    }

    #[test]
    fn prints_a_minimal_query() {
        let document = parse_query("{ ping }").unwrap();
        assert_eq!(print_document(&document), "query {\n  ping\n}\n\n");
    }
}
