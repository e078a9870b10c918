//! Unions and interfaces resolved through delegation: the upstream decides
//! the concrete type; the merged schema only relays it.

use graphql_stitching::Request;
use integration_tests::{runtime, stitched_schema};
use serde_json::json;

#[test]
fn interface_and_union_fragments_pick_the_upstream_concrete_type() {
    runtime().block_on(async {
        let response = stitched_schema()
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
                "customerById": {
                    "name": "Exampler Customer",
                    "vehicle": { "bikeType": "Turbo" }
                }
            })
        );
    });
}

#[test]
fn non_matching_union_arms_contribute_nothing() {
    runtime().block_on(async {
        // c2 drives a car; the Bike arm must stay empty.
        let response = stitched_schema()
            .execute(Request::new(
                r#"
                {
                    customerById(id: "c2") {
                        vehicle {
                            ... on Bike { bikeType }
                            ... on Car { licensePlate }
                        }
                    }
                }
                "#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "customerById": { "vehicle": { "licensePlate": "GRAPHQL" } } })
        );
    });
}

#[test]
fn typename_reports_the_concrete_type_through_the_merge() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(
                r#"{ customerById(id: "c1") { __typename vehicle { __typename } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "customerById": { "__typename": "Customer", "vehicle": { "__typename": "Bike" } }
            })
        );
    });
}

#[test]
fn absent_abstract_values_resolve_to_null() {
    runtime().block_on(async {
        // c3 has no vehicle at all.
        let response = stitched_schema()
            .execute(Request::new(
                r#"{ customerById(id: "c3") { name vehicle { __typename } } }"#,
            ))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({ "customerById": { "name": "Liisa Esimerki", "vehicle": null } })
        );
    });
}
