//! Queries that only ever touch one upstream at a time behave exactly as if
//! they had been sent to that upstream directly.

use graphql_stitching::Request;
use integration_tests::{mocks::property_schema, runtime, stitched_schema};
use serde_json::json;

#[test]
fn merges_responses_from_two_upstreams_shallowly() {
    runtime().block_on(async {
        let merged = stitched_schema();

        let response = merged
            .execute(Request::new(
                r#"
                {
                    propertyById(id: "p1") { id name }
                    bookingById(id: "b1") {
                        id
                        customer { name }
                        startTime
                        endTime
                    }
                }
                "#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "propertyById": { "id": "p1", "name": "Super great hotel" },
                "bookingById": {
                    "id": "b1",
                    "customer": { "name": "Exampler Customer" },
                    "startTime": "2016-05-04 11:00:00",
                    "endTime": "2016-05-04 12:00:00"
                }
            })
        );
    });
}

#[test]
fn upstream_only_queries_are_semantically_equivalent() {
    runtime().block_on(async {
        let query = r#"{ propertyById(id: "p1") { id name location { name } } }"#;

        let direct = property_schema().execute(Request::new(query)).await;
        let merged = stitched_schema().execute(Request::new(query)).await;

        assert!(!direct.has_errors(), "{:?}", direct.errors);
        assert!(!merged.has_errors(), "{:?}", merged.errors);
        assert_eq!(direct.data, merged.data);
    });
}

#[test]
fn disjoint_queries_compose_by_shallow_key_merge() {
    runtime().block_on(async {
        let merged = stitched_schema();

        let composed = merged
            .execute(Request::new(
                r#"{ propertyById(id: "p1") { name } bookingById(id: "b2") { startTime } }"#,
            ))
            .await;

        assert!(!composed.has_errors(), "{:?}", composed.errors);
        assert_eq!(
            composed.data,
            json!({
                "propertyById": { "name": "Super great hotel" },
                "bookingById": { "startTime": "2016-05-04 11:00:00" }
            })
        );
    });
}

#[test]
fn aliases_survive_delegation() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(
                r#"{ hotel: propertyById(id: "p3") { key: id label: name } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "hotel": { "key": "p3", "label": "BedBugs - The Affordable Hotel" } })
        );
    });
}

#[test]
fn delegating_the_same_field_twice_is_idempotent() {
    runtime().block_on(async {
        let merged = stitched_schema();
        let query = r#"{ propertyById(id: "p2") { id bookings { id } } }"#;

        let first = merged.execute(Request::new(query)).await;
        let second = merged.execute(Request::new(query)).await;

        assert!(!first.has_errors(), "{:?}", first.errors);
        assert_eq!(first.data, second.data);
    });
}
