//! The merged schema the scenarios run against: property + booking, plus
//! the two cross-schema link fields.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use graphql_stitching::{
    merge_schemas, Error, LinkResolvers, MergeConfig, MergeInfo, OperationType, ResolverContext, ResolverFn,
    ResolverSpec, Schema,
};
use serde_json::Value;

use crate::mocks::{booking_schema, property_schema};

/// The link fields only the merged schema has.
pub const LINK_SDL: &str = r"
extend type Property {
    bookings(limit: Int): [Booking!]
}

extend type Booking {
    property: Property!
}
";

/// Property + booking + links, with the default conflict policy.
pub fn stitched_schema() -> Arc<Schema> {
    stitch(property_schema(), booking_schema())
}

/// Merge the given upstreams with the scenario link resolvers.
pub fn stitch(property: Arc<Schema>, booking: Arc<Schema>) -> Arc<Schema> {
    merge_schemas(
        MergeConfig::new([property.into(), booking.into(), LINK_SDL.into()]).resolvers(|merge_info| {
            LinkResolvers::new()
                .field(
                    "Property",
                    "bookings",
                    ResolverSpec::new(ResolverFn::new_async_with(merge_info.clone(), property_bookings))
                        .with_fragment("fragment PropertyFragment on Property { id }"),
                )
                .field(
                    "Booking",
                    "property",
                    ResolverSpec::new(ResolverFn::new_async_with(merge_info.clone(), booking_property))
                        .with_fragment("fragment BookingFragment on Booking { propertyId }"),
                )
        }),
    )
    .expect("the scenario schemas merge")
}

// Property.bookings: the parent's id becomes the upstream's propertyId
// filter; the link's own limit argument is forwarded.
fn property_bookings<'a>(
    merge_info: &'a MergeInfo,
    ctx: ResolverContext<'a>,
) -> BoxFuture<'a, Result<Value, Error>> {
    Box::pin(async move {
        let property_id = ctx
            .parent_object()?
            .get("id")
            .cloned()
            .ok_or_else(|| Error::new("parent property is missing its id"))?;

        let mut args = serde_json::Map::new();
        args.insert("propertyId".to_string(), property_id);
        if let Some(limit) = ctx.arg("limit") {
            args.insert("limit".to_string(), limit.clone());
        }

        merge_info
            .delegate(OperationType::Query, "bookingsByPropertyId", args, ctx.ctx, &ctx.info)
            .await
    })
}

// Booking.property: a second delegation back into the property schema,
// keyed by the propertyId the fragment annotation guarantees.
fn booking_property<'a>(
    merge_info: &'a MergeInfo,
    ctx: ResolverContext<'a>,
) -> BoxFuture<'a, Result<Value, Error>> {
    Box::pin(async move {
        let property_id = ctx
            .parent_object()?
            .get("propertyId")
            .cloned()
            .ok_or_else(|| Error::new("parent booking is missing its propertyId"))?;

        let mut args = serde_json::Map::new();
        args.insert("id".to_string(), property_id);

        merge_info
            .delegate(OperationType::Query, "propertyById", args, ctx.ctx, &ctx.info)
            .await
    })
}
