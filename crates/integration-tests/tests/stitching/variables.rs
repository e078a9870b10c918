//! Variable projection: exactly the variables the rewritten selection still
//! references travel upstream, alongside the synthesized argument variables.

use graphql_stitching::Request;
use integration_tests::{runtime, stitched_schema};
use serde_json::json;

#[test]
fn variables_feed_delegated_root_arguments() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(
                Request::new("query($id: ID!) { propertyById(id: $id) { id name } }")
                    .variables(json!({ "id": "p1" })),
            )
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "propertyById": { "id": "p1", "name": "Super great hotel" } })
        );
    });
}

#[test]
fn variables_reach_link_field_arguments() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(
                Request::new(r#"query($limit: Int) { propertyById(id: "p1") { bookings(limit: $limit) { id } } }"#)
                    .variables(json!({ "limit": 1 })),
            )
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "propertyById": { "bookings": [{ "id": "b1" }] } })
        );
    });
}

#[test]
fn skip_and_include_directives_apply_with_variables() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(
                Request::new(
                    r#"
                    query($withName: Boolean!) {
                        propertyById(id: "p1") {
                            id
                            name @include(if: $withName)
                            skipped: name @skip(if: true)
                        }
                    }
                    "#,
                )
                .variables(json!({ "withName": true })),
            )
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "propertyById": { "id": "p1", "name": "Super great hotel" } })
        );
    });
}

#[test]
fn missing_non_null_variables_fail_the_operation() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new("query($id: ID!) { propertyById(id: $id) { id } }"))
            .await;

        assert!(response.data.is_null());
        assert_eq!(response.errors.len(), 1);
        assert!(
            response.errors[0].message.contains("$id"),
            "{}",
            response.errors[0].message
        );
    });
}

#[test]
fn variable_defaults_apply_when_absent() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(
                r#"query($id: ID! = "p2") { propertyById(id: $id) { name } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "propertyById": { "name": "Another great hotel" } })
        );
    });
}
