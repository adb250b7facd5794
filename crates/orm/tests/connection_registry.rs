//! Repository resolution and default queries on registered connections

mod common;

use common::*;
use joinwise_orm::{
    ConnectionRegistry, EntityService, OrderDirection, OrmError, ServiceDefinition, ServiceFactory, SortOptions,
};

#[test]
fn test_definition_requires_repository_and_connection() {
    let err = ServiceDefinition::builder().connection_name("default").build().unwrap_err();
    assert_eq!(err.to_string(), "Repository type was not provided.");

    let err = TestService::instance("").err().unwrap();
    assert_eq!(err, OrmError::Argument("Connection name was not provided.".to_string()));
}

#[tokio::test]
async fn test_repository_on_unknown_connection() {
    let service = TestServiceB::instance("invalid").unwrap();
    let err = service.get_repository().unwrap_err();
    assert!(err.to_string().contains("Connection or repository not found"));
}

#[tokio::test]
async fn test_repository_runs_raw_queries() {
    let fixture = Fixture::open("registry-raw").await;
    let service = TestService::instance(fixture.name()).unwrap();

    let rows = service.get_repository().unwrap().query("SELECT 1 AS result", &[]).await.unwrap();
    assert_eq!(rows[0]["result"], serde_json::json!(1));
    fixture.close().await;
}

#[tokio::test]
async fn test_repository_requires_mapped_entity() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("unmapped.db").display());
    let config = joinwise_orm::ConnectionConfig::new(url).with_entity(test2_entity());
    ConnectionRegistry::global().connect(&config, "registry-unmapped").await.unwrap();

    let service = TestServiceB::instance("registry-unmapped").unwrap();
    assert_eq!(
        service.get_repository().unwrap_err().to_string(),
        "Connection error: Connection or repository not found."
    );
    ConnectionRegistry::global().close("registry-unmapped").await.unwrap();
}

#[tokio::test]
async fn test_repository_after_close() {
    let fixture = Fixture::open("registry-closed").await;
    let service = TestService::instance(fixture.name()).unwrap();
    let qb = service.get_repository().unwrap().create_query_builder("test").unwrap();

    ConnectionRegistry::global().close(fixture.name()).await.unwrap();

    assert!(service.get_repository().is_err());
    assert!(qb.get_count().await.is_err());
}

#[tokio::test]
async fn test_soft_delete_default_query() {
    let fixture = Fixture::open("registry-soft-delete").await;
    let service = TestService::instance(fixture.name()).unwrap();
    let mut qb = service.get_repository().unwrap().create_query_builder("test").unwrap();

    let err = service.set_default_query("", &mut qb).unwrap_err();
    assert_eq!(err.to_string(), "Alias was not provided.");

    service.set_default_query("test", &mut qb).unwrap();
    assert_eq!(
        qb.get_sql().unwrap(),
        select(
            &[test_columns("test")],
            r#"FROM "Test" "test" WHERE "test"."deleted_at" IS NULL"#
        )
    );
    assert_eq!(qb.get_count().await.unwrap(), 1);

    fixture
        .connection()
        .execute(r#"UPDATE "Test" SET "deleted_at" = '2024-01-01'"#, &[])
        .await
        .unwrap();
    assert_eq!(qb.get_count().await.unwrap(), 0);
    fixture.close().await;
}

#[tokio::test]
async fn test_default_query_applies_to_every_or_branch() {
    let fixture = Fixture::open("registry-soft-delete-or").await;
    let service = TestService::instance(fixture.name()).unwrap();
    fixture
        .connection()
        .execute(r#"UPDATE "Test" SET "deleted_at" = '2024-01-01'"#, &[])
        .await
        .unwrap();

    let mut qb = service.get_repository().unwrap().create_query_builder("test").unwrap();
    qb.and_where("test.name = 'test' OR test.name = 'other'");
    service.set_default_query("test", &mut qb).unwrap();

    assert_eq!(
        qb.get_sql().unwrap(),
        select(
            &[test_columns("test")],
            r#"FROM "Test" "test" WHERE ("test"."name" = 'test' OR "test"."name" = 'other') AND "test"."deleted_at" IS NULL"#
        )
    );
    assert_eq!(qb.get_count().await.unwrap(), 0);
    fixture.close().await;
}

#[tokio::test]
async fn test_overridden_default_query() {
    let fixture = Fixture::open("registry-overridden").await;
    let service = TestService2::instance(fixture.name()).unwrap();
    let mut qb = service.get_repository().unwrap().create_query_builder("test2").unwrap();

    service.set_default_query("test2", &mut qb).unwrap();
    assert_eq!(
        qb.get_sql().unwrap(),
        select(
            &[test2_columns("test2")],
            r#"FROM "Test2" "test2" WHERE "test2"."id" > 0 ORDER BY "test2"."id" DESC"#
        )
    );
    assert_eq!(qb.get_count().await.unwrap(), 1);
    fixture.close().await;
}

#[tokio::test]
async fn test_sorting_applied_to_query() {
    let fixture = Fixture::open("registry-sorting").await;
    let service = TestService::instance(fixture.name()).unwrap();
    let mut qb = service.get_repository().unwrap().create_query_builder("test").unwrap();

    let sorting = service.get_sorting("test", &SortOptions::new()).unwrap();
    sorting.apply_to(&mut qb).add_order_by("test.id", OrderDirection::Desc);

    assert_eq!(
        qb.get_sql().unwrap(),
        select(
            &[test_columns("test")],
            r#"FROM "Test" "test" ORDER BY "test"."name" ASC, "test"."id" DESC"#
        )
    );
    let row = qb.get_raw_one().await.unwrap().unwrap();
    assert_eq!(row["test_name"], serde_json::json!("test"));
    fixture.close().await;
}
