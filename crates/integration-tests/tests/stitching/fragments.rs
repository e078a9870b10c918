//! Named fragments spanning link fields: definitions must travel with the
//! delegated operation, rewritten for the schema that answers them.

use graphql_stitching::Request;
use integration_tests::{runtime, stitched_schema};
use serde_json::json;

#[test]
fn named_fragments_across_links_match_the_inline_shape() {
    runtime().block_on(async {
        let merged = stitched_schema();

        let inline = merged
            .execute(Request::new(
                r#"{ propertyById(id: "p2") { bookings { property { id name } } } }"#,
            ))
            .await;

        let with_fragments = merged
            .execute(Request::new(
                r#"
                query {
                    propertyById(id: "p2") { bookings { ...BookingFragment } }
                }
                fragment BookingFragment on Booking {
                    property { ...PropertyFragment }
                }
                fragment PropertyFragment on Property { id name }
                "#,
            ))
            .await;

        assert!(!inline.has_errors(), "{:?}", inline.errors);
        assert!(!with_fragments.has_errors(), "{:?}", with_fragments.errors);
        assert_eq!(inline.data, with_fragments.data);
    });
}

#[test]
fn fragments_on_the_delegated_type_are_carried_upstream() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(
                r#"
                query {
                    bookingById(id: "b1") { ...Times }
                }
                fragment Times on Booking { startTime endTime }
                "#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "bookingById": {
                    "startTime": "2016-05-04 11:00:00",
                    "endTime": "2016-05-04 12:00:00"
                }
            })
        );
    });
}

#[test]
fn inline_fragments_apply_on_concrete_types() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(
                r#"{ propertyById(id: "p1") { ... on Property { name } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "propertyById": { "name": "Super great hotel" } })
        );
    });
}
