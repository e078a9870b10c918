//! The booking upstream: bookings, their customers, and customer vehicles.
//! Owns the abstract types the scenarios exercise (the `Person` interface
//! and the `Vehicle` union).

use std::sync::Arc;

use graphql_stitching::{Error, ResolverContext, Schema};
use serde_json::{json, Value};

const SDL: &str = r"
interface Person {
    name: String!
}

type Booking {
    id: ID!
    propertyId: ID!
    startTime: String!
    endTime: String!
    customer: Customer!
}

type Customer implements Person {
    id: ID!
    email: String!
    name: String!
    address: String
    vehicle: Vehicle
}

type Bike {
    id: ID!
    bikeType: String!
}

type Car {
    id: ID!
    licensePlate: String!
}

union Vehicle = Bike | Car

input BookingInput {
    propertyId: ID!
    customerId: ID!
    startTime: String!
    endTime: String!
}

type Query {
    bookingById(id: ID!): Booking
    bookingsByPropertyId(propertyId: ID!, limit: Int): [Booking!]
    customerById(id: ID!): Customer
    bookings(limit: Int): [Booking!]
    customers: [Customer!]
}

type Mutation {
    addBooking(input: BookingInput!): Booking!
}
";

fn bookings() -> Vec<Value> {
    vec![
        json!({
            "id": "b1",
            "propertyId": "p1",
            "customerId": "c1",
            "startTime": "2016-05-04 11:00:00",
            "endTime": "2016-05-04 12:00:00"
        }),
        json!({
            "id": "b2",
            "propertyId": "p1",
            "customerId": "c2",
            "startTime": "2016-05-04 11:00:00",
            "endTime": "2016-05-04 14:00:00"
        }),
        json!({
            "id": "b3",
            "propertyId": "p1",
            "customerId": "c3",
            "startTime": "2016-06-03 11:00:00",
            "endTime": "2016-06-03 12:00:00"
        }),
        json!({
            "id": "b4",
            "propertyId": "p2",
            "customerId": "c1",
            "startTime": "2016-07-03 11:00:00",
            "endTime": "2016-07-03 12:00:00"
        }),
    ]
}

fn customers() -> Vec<Value> {
    vec![
        json!({
            "id": "c1",
            "email": "examplec@example.com",
            "name": "Exampler Customer",
            "address": "Heimat Street 3",
            "vehicleId": "v1"
        }),
        json!({
            "id": "c2",
            "email": "joe@example.com",
            "name": "Joe Doe",
            "address": null,
            "vehicleId": "v2"
        }),
        json!({
            "id": "c3",
            "email": "liisa@example.com",
            "name": "Liisa Esimerki",
            "address": "Gustavslundsvagen 25",
            "vehicleId": null
        }),
    ]
}

fn vehicles() -> Vec<Value> {
    vec![
        json!({ "id": "v1", "bikeType": "Turbo" }),
        json!({ "id": "v2", "licensePlate": "GRAPHQL" }),
    ]
}

fn find(rows: Vec<Value>, id: &str) -> Value {
    rows.into_iter().find(|row| row["id"] == id).unwrap_or(Value::Null)
}

fn string_arg<'a>(ctx: &'a ResolverContext<'_>, name: &str) -> Result<&'a str, Error> {
    ctx.arg(name)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::new(format!("{name} must be a string")))
}

pub fn booking_schema() -> Arc<Schema> {
    Schema::build(SDL)
        .expect("booking SDL is valid")
        .resolver("Query", "bookingById", |ctx: ResolverContext<'_>| {
            Ok(find(bookings(), string_arg(&ctx, "id")?))
        })
        .resolver("Query", "bookingsByPropertyId", |ctx: ResolverContext<'_>| {
            let property_id = string_arg(&ctx, "propertyId")?;
            let limit = ctx.arg("limit").and_then(Value::as_u64).unwrap_or(u64::MAX) as usize;
            Ok(Value::Array(
                bookings()
                    .into_iter()
                    .filter(|booking| booking["propertyId"] == property_id)
                    .take(limit)
                    .collect(),
            ))
        })
        .resolver("Query", "customerById", |ctx: ResolverContext<'_>| {
            Ok(find(customers(), string_arg(&ctx, "id")?))
        })
        .resolver("Query", "bookings", |ctx: ResolverContext<'_>| {
            let limit = ctx.arg("limit").and_then(Value::as_u64).unwrap_or(u64::MAX) as usize;
            Ok(Value::Array(bookings().into_iter().take(limit).collect()))
        })
        .resolver("Query", "customers", |_ctx: ResolverContext<'_>| {
            Ok(Value::Array(customers()))
        })
        .resolver("Mutation", "addBooking", |ctx: ResolverContext<'_>| {
            let input = ctx
                .arg("input")
                .and_then(Value::as_object)
                .ok_or_else(|| Error::new("input must be an object"))?;
            Ok(json!({
                "id": "b5",
                "propertyId": input["propertyId"],
                "customerId": input["customerId"],
                "startTime": input["startTime"],
                "endTime": input["endTime"],
            }))
        })
        .resolver("Booking", "customer", |ctx: ResolverContext<'_>| {
            let customer_id = ctx
                .parent_object()?
                .get("customerId")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::new("booking has no customerId"))?;
            Ok(find(customers(), customer_id))
        })
        .resolver("Customer", "vehicle", |ctx: ResolverContext<'_>| {
            match ctx.parent_object()?.get("vehicleId").and_then(Value::as_str) {
                Some(vehicle_id) => Ok(find(vehicles(), vehicle_id)),
                None => Ok(Value::Null),
            }
        })
        .type_resolver("Person", |_| Some("Customer".to_string()))
        .type_resolver("Vehicle", |vehicle| {
            if vehicle.get("bikeType").is_some() {
                Some("Bike".to_string())
            } else if vehicle.get("licensePlate").is_some() {
                Some("Car".to_string())
            } else {
                None
            }
        })
        .finish()
        .expect("booking schema builds")
}
