//! Mutations pass through to the single upstream that owns them.

use graphql_stitching::Request;
use integration_tests::{mocks::booking_schema, runtime, stitched_schema};
use serde_json::json;

const ADD_BOOKING: &str = r"
mutation($input: BookingInput!) {
    addBooking(input: $input) {
        id
        customer { name }
        startTime
        endTime
    }
}
";

fn input() -> serde_json::Value {
    json!({
        "input": {
            "propertyId": "p1",
            "customerId": "c1",
            "startTime": "2020-07-02 11:00:00",
            "endTime": "2020-07-02 12:00:00"
        }
    })
}

#[test]
fn mutations_delegate_to_the_owning_schema() {
    runtime().block_on(async {
        let response = stitched_schema()
            .execute(Request::new(ADD_BOOKING).variables(input()))
            .await;

        assert!(!response.has_errors(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            json!({
                "addBooking": {
                    "id": "b5",
                    "customer": { "name": "Exampler Customer" },
                    "startTime": "2020-07-02 11:00:00",
                    "endTime": "2020-07-02 12:00:00"
                }
            })
        );
    });
}

#[test]
fn merged_mutations_match_the_upstream_result() {
    runtime().block_on(async {
        let direct = booking_schema()
            .execute(Request::new(ADD_BOOKING).variables(input()))
            .await;
        let merged = stitched_schema()
            .execute(Request::new(ADD_BOOKING).variables(input()))
            .await;

        assert!(!direct.has_errors(), "{:?}", direct.errors);
        assert!(!merged.has_errors(), "{:?}", merged.errors);
        assert_eq!(direct.data, merged.data);
    });
}
