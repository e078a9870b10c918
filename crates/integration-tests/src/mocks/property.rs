//! The property upstream: properties with a location, nothing else.

use std::sync::Arc;

use graphql_stitching::{Error, ResolverContext, Schema};
use serde_json::{json, Value};

const SDL: &str = r"
type Location {
    name: String!
}

type Property {
    id: ID!
    name: String!
    location: Location
}

type Query {
    propertyById(id: ID!): Property
    properties(limit: Int): [Property!]
}
";

fn properties() -> Vec<Value> {
    vec![
        json!({
            "id": "p1",
            "name": "Super great hotel",
            "location": { "name": "Helsinki, Finland" }
        }),
        json!({
            "id": "p2",
            "name": "Another great hotel",
            "location": { "name": "San Francisco, California" }
        }),
        json!({
            "id": "p3",
            "name": "BedBugs - The Affordable Hotel",
            "location": null
        }),
    ]
}

fn property_by_id(id: &str) -> Value {
    properties()
        .into_iter()
        .find(|property| property["id"] == id)
        .unwrap_or(Value::Null)
}

pub fn property_schema() -> Arc<Schema> {
    Schema::build(SDL)
        .expect("property SDL is valid")
        .resolver("Query", "propertyById", |ctx: ResolverContext<'_>| {
            let id = ctx
                .arg("id")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::new("id must be a string"))?;
            Ok(property_by_id(id))
        })
        .resolver("Query", "properties", |ctx: ResolverContext<'_>| {
            let limit = ctx.arg("limit").and_then(Value::as_u64).unwrap_or(u64::MAX) as usize;
            Ok(Value::Array(properties().into_iter().take(limit).collect()))
        })
        .finish()
        .expect("property schema builds")
}
