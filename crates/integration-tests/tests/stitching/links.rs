//! Link fields: operator resolvers that cross schema boundaries, their
//! argument forwarding, and nested delegation chains.

use graphql_stitching::Request;
use integration_tests::{runtime, stitched_schema};
use serde_json::json;

#[test]
fn traverses_a_link_field_into_the_other_schema() {
    runtime().block_on(async {
        let response = stitched_schema()
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
fn link_arguments_are_forwarded_upstream() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(
                r#"{ propertyById(id: "p1") { bookings(limit: 1) { id } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "propertyById": { "bookings": [{ "id": "b1" }] } })
        );
    });
}

#[test]
fn deep_links_delegate_back_into_the_first_schema() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(
                r#"{ propertyById(id: "p2") { id bookings { property { id name } } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "propertyById": {
                    "id": "p2",
                    "bookings": [
                        { "property": { "id": "p2", "name": "Another great hotel" } }
                    ]
                }
            })
        );
    });
}

// The fragment annotation's projections feed the resolver, but never leak
// into the client's response shape.
#[test]
fn required_projections_do_not_leak_into_the_response() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(r#"{ propertyById(id: "p1") { bookings(limit: 1) { id } } }"#))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        let booking = &response.data["propertyById"]["bookings"][0];
        assert_eq!(booking, &json!({ "id": "b1" }));
    });
}

#[test]
fn links_resolve_on_every_list_element() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(
                r#"{ propertyById(id: "p1") { bookings { id property { id } } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "propertyById": {
                    "bookings": [
                        { "id": "b1", "property": { "id": "p1" } },
                        { "id": "b2", "property": { "id": "p1" } },
                        { "id": "b3", "property": { "id": "p1" } }
                    ]
                }
            })
        );
    });
}
