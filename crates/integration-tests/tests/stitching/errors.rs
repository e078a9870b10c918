//! Failure semantics: errors stay scoped to the field that failed, siblings
//! keep resolving, and upstream errors surface with the caller's path.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use graphql_stitching::{
    merge_schemas, Error, LinkResolvers, MergeConfig, MergeInfo, OperationType, Request, ResolverContext, ResolverFn,
    ResolverSpec, Schema,
};
use integration_tests::{mocks::property_schema, runtime};
use serde_json::{json, Value};

#[test]
fn extension_fields_without_a_resolver_error_and_null_out() {
    runtime().block_on(async {
        let merged = merge_schemas(MergeConfig::new([
            property_schema().into(),
            "extend type Property { nickname: String }".into(),
        ]))
        .unwrap();

        let response = merged
            .execute(Request::new(r#"{ propertyById(id: "p1") { id nickname } }"#))
            .await;

        assert_eq!(
            response.data,
            json!({ "propertyById": { "id": "p1", "nickname": null } })
        );
        assert_eq!(response.errors.len(), 1);
        assert!(
            response.errors[0].message.contains("no resolver bound"),
            "{}",
            response.errors[0].message
        );
    });
}

fn delegate_to_nowhere<'a>(
    merge_info: &'a MergeInfo,
    ctx: ResolverContext<'a>,
) -> BoxFuture<'a, Result<Value, Error>> {
    Box::pin(async move {
        merge_info
            .delegate(
                OperationType::Query,
                "nonexistent",
                serde_json::Map::new(),
                ctx.ctx,
                &ctx.info,
            )
            .await
    })
}

#[test]
fn delegating_to_a_missing_root_field_fails_only_that_field() {
    runtime().block_on(async {
        let merged = merge_schemas(
            MergeConfig::new([
                property_schema().into(),
                "extend type Property { oops: String }".into(),
            ])
            .resolvers(|merge_info| {
                LinkResolvers::new().field(
                    "Property",
                    "oops",
                    ResolverSpec::new(ResolverFn::new_async_with(merge_info.clone(), delegate_to_nowhere)),
                )
            }),
        )
        .unwrap();

        let response = merged
            .execute(Request::new(r#"{ propertyById(id: "p1") { name oops } }"#))
            .await;

        assert_eq!(
            response.data,
            json!({ "propertyById": { "name": "Super great hotel", "oops": null } })
        );
        assert_eq!(response.errors.len(), 1);
        assert!(
            response.errors[0].message.contains("nonexistent"),
            "{}",
            response.errors[0].message
        );
    });
}

fn failing_schema() -> Arc<Schema> {
    Schema::build("type Query { boom: String ok: String }")
        .unwrap()
        .resolver("Query", "boom", |_: ResolverContext<'_>| {
            Err(Error::new("the upstream exploded"))
        })
        .resolver("Query", "ok", |_: ResolverContext<'_>| Ok(json!("fine")))
        .finish()
        .unwrap()
}

#[test]
fn upstream_errors_carry_the_caller_path_and_spare_siblings() {
    runtime().block_on(async {
        let merged = merge_schemas(MergeConfig::new([failing_schema().into()])).unwrap();

        let response = merged.execute(Request::new("{ boom ok }")).await;

        assert_eq!(response.data, json!({ "boom": null, "ok": "fine" }));
        assert_eq!(response.errors.len(), 1);
        assert!(
            response.errors[0].message.contains("the upstream exploded"),
            "{}",
            response.errors[0].message
        );
        let path = serde_json::to_value(&response.errors[0].path).unwrap();
        assert_eq!(path, json!(["boom"]));
    });
}

#[test]
fn unknown_root_fields_are_reported_not_panicked() {
    runtime().block_on(async {
        let merged = merge_schemas(MergeConfig::new([property_schema().into()])).unwrap();

        let response = merged.execute(Request::new("{ doesNotExist }")).await;

        assert_eq!(response.data, json!({ "doesNotExist": null }));
        assert_eq!(response.errors.len(), 1);
        assert!(
            response.errors[0].message.contains("Unknown field"),
            "{}",
            response.errors[0].message
        );
    });
}
