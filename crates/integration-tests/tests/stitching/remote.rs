//! Remote upstreams: the booking schema is hidden behind a fetcher, proxied
//! through introspection, and stitched exactly like a local schema.

use std::sync::Arc;

use async_trait::async_trait;
use graphql_stitching::{
    remote_executable_schema, Error, FetchError, FetchRequest, FetchResponse, Fetcher, MetaType, Registry, Request,
    Schema, TypeName,
};
use integration_tests::{
    mocks::{booking_schema, property_schema},
    runtime,
    stitched::stitch,
};
use serde_json::{json, Value};

// Serves a local schema over the fetcher interface: introspection from the
// registry, everything else executed in-process.
struct InProcessFetcher {
    schema: Arc<Schema>,
}

#[async_trait]
impl Fetcher for InProcessFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, Error> {
        if request.operation_name.as_deref() == Some("IntrospectionQuery") {
            return Ok(FetchResponse {
                data: introspection_json(self.schema.registry()),
                errors: Vec::new(),
            });
        }

        let response = self
            .schema
            .execute(Request::new(request.query).variables(Value::Object(request.variables)))
            .await;

        Ok(FetchResponse {
            data: response.data,
            errors: response
                .errors
                .into_iter()
                .map(|error| FetchError {
                    message: error.message,
                    path: error
                        .path
                        .iter()
                        .map(|segment| serde_json::to_value(segment).unwrap())
                        .collect(),
                })
                .collect(),
        })
    }
}

async fn remote_booking_schema() -> Arc<Schema> {
    remote_executable_schema(Arc::new(InProcessFetcher {
        schema: booking_schema(),
    }))
    .await
    .expect("the booking schema introspects")
}

#[test]
fn remote_schemas_answer_direct_queries() {
    runtime().block_on(async {
        let remote = remote_booking_schema().await;

        let response = remote
            .execute(Request::new(
                r#"{ bookingById(id: "b1") { id customer { name } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "bookingById": { "id": "b1", "customer": { "name": "Exampler Customer" } } })
        );
    });
}

#[test]
fn remote_schemas_stitch_like_local_ones() {
    runtime().block_on(async {
        let merged = stitch(property_schema(), remote_booking_schema().await);

        let response = merged
            .execute(Request::new(
                r#"{ propertyById(id: "p2") { id name bookings { id customer { name } } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "propertyById": {
                    "id": "p2",
                    "name": "Another great hotel",
                    "bookings": [
                        { "id": "b4", "customer": { "name": "Exampler Customer" } }
                    ]
                }
            })
        );
    });
}

#[test]
fn deep_links_work_through_a_remote_upstream() {
    runtime().block_on(async {
        let merged = stitch(property_schema(), remote_booking_schema().await);

        let response = merged
            .execute(Request::new(
                r#"{ propertyById(id: "p2") { bookings { property { name } } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "propertyById": {
                    "bookings": [{ "property": { "name": "Another great hotel" } }]
                }
            })
        );
    });
}

#[test]
fn abstract_types_survive_the_wire() {
    runtime().block_on(async {
        let merged = stitch(property_schema(), remote_booking_schema().await);

        let response = merged
            .execute(Request::new(
                r#"
                {
                    customerById(id: "c1") {
                        ... on Person { name }
                        vehicle { ... on Bike { bikeType } }
                    }
                }
                "#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "customerById": { "name": "Exampler Customer", "vehicle": { "bikeType": "Turbo" } }
            })
        );
    });
}

// The registry rendered in the shape `remote_executable_schema` introspects.
fn introspection_json(registry: &Registry) -> Value {
    let types: Vec<Value> = registry
        .types
        .iter()
        .map(|(name, ty)| type_json(registry, name, ty))
        .collect();

    json!({
        "__schema": {
            "queryType": { "name": registry.query_type },
            "mutationType": registry.mutation_type.as_ref().map(|name| json!({ "name": name })),
            "types": types,
        }
    })
}

fn type_json(registry: &Registry, name: &str, ty: &MetaType) -> Value {
    match ty {
        MetaType::Object { object, .. } => json!({
            "kind": "OBJECT",
            "name": name,
            "fields": fields_json(registry, object.fields.values()),
            "interfaces": object.implements.iter().map(|interface| named_ref(registry, interface)).collect::<Vec<_>>(),
        }),
        MetaType::Interface { interface, .. } => json!({
            "kind": "INTERFACE",
            "name": name,
            "fields": fields_json(registry, interface.fields.values()),
        }),
        MetaType::Union { union, .. } => json!({
            "kind": "UNION",
            "name": name,
            "possibleTypes": union.members.iter().map(|member| named_ref(registry, member)).collect::<Vec<_>>(),
        }),
        MetaType::Enum { enum_type, .. } => json!({
            "kind": "ENUM",
            "name": name,
            "enumValues": enum_type.values.iter().map(|value| json!({ "name": value })).collect::<Vec<_>>(),
        }),
        MetaType::InputObject { input_object, .. } => json!({
            "kind": "INPUT_OBJECT",
            "name": name,
            "inputFields": input_object
                .input_fields
                .values()
                .map(|input| json!({ "name": input.name, "type": type_ref(registry, &input.ty) }))
                .collect::<Vec<_>>(),
        }),
        MetaType::Scalar { .. } => json!({ "kind": "SCALAR", "name": name }),
    }
}

fn fields_json<'a>(
    registry: &Registry,
    fields: impl Iterator<Item = &'a graphql_stitching::MetaField>,
) -> Vec<Value> {
    fields
        .map(|field| {
            json!({
                "name": field.name,
                "args": field
                    .args
                    .values()
                    .map(|arg| json!({ "name": arg.name, "type": type_ref(registry, &arg.ty) }))
                    .collect::<Vec<_>>(),
                "type": type_ref(registry, &field.ty),
            })
        })
        .collect()
}

fn type_ref(registry: &Registry, ty: &str) -> Value {
    match TypeName::create(ty) {
        TypeName::NonNull(inner) => json!({ "kind": "NON_NULL", "name": null, "ofType": type_ref(registry, inner) }),
        TypeName::List(inner) => json!({ "kind": "LIST", "name": null, "ofType": type_ref(registry, inner) }),
        TypeName::Named(name) => named_ref(registry, name),
    }
}

fn named_ref(registry: &Registry, name: &str) -> Value {
    let kind = match registry.lookup(name) {
        Some(MetaType::Object { .. }) => "OBJECT",
        Some(MetaType::Interface { .. }) => "INTERFACE",
        Some(MetaType::Union { .. }) => "UNION",
        Some(MetaType::Enum { .. }) => "ENUM",
        Some(MetaType::InputObject { .. }) => "INPUT_OBJECT",
        Some(MetaType::Scalar { .. }) | None => "SCALAR",
    };
    json!({ "kind": kind, "name": name })
}
