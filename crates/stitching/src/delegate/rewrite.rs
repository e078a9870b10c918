//! Selection-set rewriting for delegation.
//!
//! Given the caller's selection against the merged schema, produce the
//! selection an upstream schema can actually answer: prune fields the target
//! does not define, drop stitched fields and splice in their required parent
//! projections, keep aliases and arguments verbatim, carry referenced
//! fragment definitions transitively, and keep the document valid by
//! injecting `__typename` where pruning emptied a composite selection.
//! All passes are pure AST-to-AST; the caller's trees are never mutated.

use std::collections::{HashMap, HashSet};

use async_graphql_parser::{
    types::{Field, FragmentDefinition, InlineFragment, Selection, SelectionSet, TypeCondition},
    Pos, Positioned,
};
use async_graphql_value::{Name, Value};

use crate::registry::{field_set::RequiredField, MetaType, Registry, TypeName};

/// The rewritten selection plus everything the outgoing document needs.
pub(crate) struct RewriteOutput {
    /// The pruned selection set for the target root field.
    pub selection_set: Positioned<SelectionSet>,
    /// Fragment definitions referenced from the selection, themselves
    /// rewritten against the target schema.
    pub fragments: HashMap<Name, Positioned<FragmentDefinition>>,
    /// Names of the caller's variables still referenced after the rewrite.
    pub variables_used: HashSet<Name>,
}

/// Rewrite `source`, selected on `type_name`, for execution against
/// `target`. `merged` is the schema the caller queried; it knows which
/// fields are stitched and what they require.
pub(crate) fn rewrite_selection_set(
    source: &Positioned<SelectionSet>,
    type_name: &str,
    merged: &Registry,
    target: &Registry,
    fragments: &HashMap<Name, Positioned<FragmentDefinition>>,
) -> RewriteOutput {
    let mut rewriter = Rewriter {
        merged,
        target,
        source_fragments: fragments,
        out_fragments: HashMap::new(),
        fragments_in_progress: HashSet::new(),
        variables_used: HashSet::new(),
    };

    let mut selection_set = rewriter.rewrite_set(source, type_name);
    if target.lookup(type_name).is_some_and(MetaType::is_composite) {
        rewriter.finalize_composite(&mut selection_set, type_name);
    }

    RewriteOutput {
        selection_set: Positioned::new(selection_set, source.pos),
        fragments: rewriter.out_fragments,
        variables_used: rewriter.variables_used,
    }
}

struct Rewriter<'a> {
    merged: &'a Registry,
    target: &'a Registry,
    source_fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    out_fragments: HashMap<Name, Positioned<FragmentDefinition>>,
    fragments_in_progress: HashSet<Name>,
    variables_used: HashSet<Name>,
}

impl Rewriter<'_> {
    fn rewrite_set(&mut self, source: &Positioned<SelectionSet>, type_name: &str) -> SelectionSet {
        let target_type = self.target.lookup(type_name);
        let merged_type = self.merged.lookup(type_name);

        let mut items = Vec::with_capacity(source.node.items.len());
        let mut required: Vec<&[RequiredField]> = Vec::new();

        for selection in &source.node.items {
            match &selection.node {
                Selection::Field(field) => {
                    let field_name = field.node.name.node.as_str();

                    if field_name == "__typename" {
                        items.push(Positioned::new(Selection::Field(field.clone()), selection.pos));
                        continue;
                    }

                    // A stitched field is re-satisfied by its own resolver
                    // once the parent returns; only its required parent
                    // projections travel upstream.
                    if let Some(merged_field) = merged_type.and_then(|ty| ty.field(field_name)) {
                        if merged_field.resolver.is_stitched() {
                            if let Some(requires) = &merged_field.requires {
                                required.push(&requires.fields);
                            }
                            continue;
                        }
                    }

                    let Some(target_field) = target_type.and_then(|ty| ty.field(field_name)) else {
                        // The target schema cannot satisfy this field.
                        continue;
                    };

                    items.push(Positioned::new(
                        Selection::Field(Positioned::new(
                            self.rewrite_field(&field.node, &target_field.ty),
                            field.pos,
                        )),
                        selection.pos,
                    ));
                }
                Selection::InlineFragment(fragment) => {
                    let condition_name = fragment
                        .node
                        .type_condition
                        .as_ref()
                        .map(|condition| condition.node.on.node.as_str());

                    if let Some(condition) = condition_name {
                        if self.target.lookup(condition).is_none() {
                            continue;
                        }
                    }

                    let inner_type = condition_name.unwrap_or(type_name);
                    let mut inner = self.rewrite_set(&fragment.node.selection_set, inner_type);
                    if inner.items.is_empty() {
                        continue;
                    }
                    self.finalize_composite(&mut inner, inner_type);

                    self.collect_directive_variables(&fragment.node.directives);
                    items.push(Positioned::new(
                        Selection::InlineFragment(Positioned::new(
                            InlineFragment {
                                type_condition: fragment.node.type_condition.clone(),
                                directives: fragment.node.directives.clone(),
                                selection_set: Positioned::new(inner, fragment.node.selection_set.pos),
                            },
                            fragment.pos,
                        )),
                        selection.pos,
                    ));
                }
                Selection::FragmentSpread(spread) => {
                    let name = &spread.node.fragment_name.node;
                    let Some(definition) = self.source_fragments.get(name) else {
                        continue;
                    };
                    let condition = definition.node.type_condition.node.on.node.as_str();
                    if self.target.lookup(condition).is_none() {
                        continue;
                    }

                    self.carry_fragment(name, definition);
                    self.collect_directive_variables(&spread.node.directives);
                    items.push(Positioned::new(Selection::FragmentSpread(spread.clone()), selection.pos));
                }
            }
        }

        for fields in required {
            merge_required(&mut items, fields);
        }

        SelectionSet { items }
    }

    fn rewrite_field(&mut self, field: &Field, target_ty: &str) -> Field {
        self.collect_argument_variables(&field.arguments);
        self.collect_directive_variables(&field.directives);

        let child_type = TypeName::concrete(target_ty);
        let selection_set = if self
            .target
            .lookup(child_type)
            .is_some_and(MetaType::is_composite)
        {
            let mut inner = self.rewrite_set(&field.selection_set, child_type);
            self.finalize_composite(&mut inner, child_type);
            Positioned::new(inner, field.selection_set.pos)
        } else {
            Positioned::new(SelectionSet::default(), field.selection_set.pos)
        };

        Field {
            alias: field.alias.clone(),
            name: field.name.clone(),
            arguments: field.arguments.clone(),
            directives: field.directives.clone(),
            selection_set,
        }
    }

    // Rewrite a referenced fragment definition against the target and carry
    // it into the outgoing document, once, spreads-within-spreads included.
    fn carry_fragment(&mut self, name: &Name, definition: &Positioned<FragmentDefinition>) {
        if self.out_fragments.contains_key(name) || !self.fragments_in_progress.insert(name.clone()) {
            return;
        }

        let condition = definition.node.type_condition.node.on.node.to_string();
        let mut selection_set = self.rewrite_set(&definition.node.selection_set, &condition);
        self.finalize_composite(&mut selection_set, &condition);

        let rewritten = FragmentDefinition {
            type_condition: Positioned::new(
                TypeCondition {
                    on: Positioned::new(Name::new(&condition), definition.node.type_condition.pos),
                },
                definition.node.type_condition.pos,
            ),
            directives: definition.node.directives.clone(),
            selection_set: Positioned::new(selection_set, definition.node.selection_set.pos),
        };

        self.fragments_in_progress.remove(name);
        self.out_fragments
            .insert(name.clone(), Positioned::new(rewritten, definition.pos));
    }

    // Pruning must not leave an invalid document, and the merged schema
    // needs `__typename` to complete abstract-typed values, so both cases
    // get one injected.
    fn finalize_composite(&self, selection_set: &mut SelectionSet, type_name: &str) {
        let needs_typename = selection_set.items.is_empty()
            || (self.target.lookup(type_name).is_some_and(MetaType::is_abstract)
                && !has_plain_typename(selection_set));
        if needs_typename {
            selection_set.items.push(typename_selection());
        }
    }

    fn collect_argument_variables(&mut self, arguments: &[(Positioned<Name>, Positioned<Value>)]) {
        for (_, value) in arguments {
            collect_value_variables(&value.node, &mut self.variables_used);
        }
    }

    fn collect_directive_variables(
        &mut self,
        directives: &[Positioned<async_graphql_parser::types::Directive>],
    ) {
        for directive in directives {
            self.collect_argument_variables(&directive.node.arguments);
        }
    }
}

fn collect_value_variables(value: &Value, out: &mut HashSet<Name>) {
    match value {
        Value::Variable(name) => {
            out.insert(name.clone());
        }
        Value::List(items) => {
            for item in items {
                collect_value_variables(item, out);
            }
        }
        Value::Object(fields) => {
            for item in fields.values() {
                collect_value_variables(item, out);
            }
        }
        _ => {}
    }
}

// Splice a dropped link field's required projections into the selection the
// upstream will answer. Existing plain fields are reused; missing ones are
// appended.
fn merge_required(items: &mut Vec<Positioned<Selection>>, required: &[RequiredField]) {
    for requirement in required {
        let existing = items.iter_mut().find_map(|selection| match &mut selection.node {
            Selection::Field(field)
                if field.node.alias.is_none() && field.node.name.node.as_str() == requirement.field =>
            {
                Some(field)
            }
            _ => None,
        });

        match existing {
            Some(field) if !requirement.selections.is_empty() => {
                merge_required(&mut field.node.selection_set.node.items, &requirement.selections);
            }
            Some(_) => {}
            None => items.push(required_field_selection(requirement)),
        }
    }
}

fn required_field_selection(requirement: &RequiredField) -> Positioned<Selection> {
    let pos = Pos::default();
    let mut items = Vec::with_capacity(requirement.selections.len());
    for nested in &requirement.selections {
        items.push(required_field_selection(nested));
    }
    Positioned::new(
        Selection::Field(Positioned::new(
            Field {
                alias: None,
                name: Positioned::new(Name::new(&requirement.field), pos),
                arguments: Vec::new(),
                directives: Vec::new(),
                selection_set: Positioned::new(SelectionSet { items }, pos),
            },
            pos,
        )),
        pos,
    )
}

fn typename_selection() -> Positioned<Selection> {
    let pos = Pos::default();
    Positioned::new(
        Selection::Field(Positioned::new(
            Field {
                alias: None,
                name: Positioned::new(Name::new("__typename"), pos),
                arguments: Vec::new(),
                directives: Vec::new(),
                selection_set: Positioned::new(SelectionSet::default(), pos),
            },
            pos,
        )),
        pos,
    )
}

fn has_plain_typename(selection_set: &SelectionSet) -> bool {
    selection_set.items.iter().any(|selection| {
        matches!(
            &selection.node,
            Selection::Field(field)
                if field.node.alias.is_none() && field.node.name.node.as_str() == "__typename"
        )
    })
}
