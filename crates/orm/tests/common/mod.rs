//! Shared fixtures: three related entities, their services, and a seeded
//! SQLite database per connection name.

#![allow(dead_code)]

use std::sync::Arc;

use joinwise_orm::{
    default_query, resolve, ChildRelation, Connection, ConnectionConfig, ConnectionRegistry, EntityMetadata,
    EntityService, JoinType, OrderDirection, OrmResult, ParentRelation, SelectQueryBuilder, ServiceDefinition,
    ServiceFactory,
};
use tempfile::TempDir;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE "Test" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "name" VARCHAR(10),
        "created_at" DATE,
        "updated_at" DATE,
        "deleted_at" DATE
    )"#,
    r#"CREATE TABLE "Test2" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "test" INTEGER REFERENCES "Test"("id"),
        "testB" INTEGER REFERENCES "Test"("id"),
        "deleted_at" DATE
    )"#,
    r#"CREATE TABLE "Test3" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "test" INTEGER REFERENCES "Test2"("id")
    )"#,
    r#"CREATE TABLE "Category" (
        "id" INTEGER PRIMARY KEY AUTOINCREMENT,
        "name" VARCHAR(10),
        "deleted_at" DATE,
        "parent" INTEGER REFERENCES "Category"("id")
    )"#,
    r#"INSERT INTO "Test" ("name") VALUES ('test')"#,
    r#"INSERT INTO "Test2" ("test", "testB") VALUES (1, 1)"#,
    r#"INSERT INTO "Test3" ("test") VALUES (1)"#,
    r#"INSERT INTO "Category" ("name", "parent") VALUES ('root', NULL), ('branch', 1), ('leaf', 2)"#,
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_entity() -> Arc<EntityMetadata> {
    Arc::new(
        EntityMetadata::new("Test")
            .column("id")
            .column("name")
            .column_as("createdAt", "created_at")
            .column_as("updatedAt", "updated_at")
            .column_as("deletedAt", "deleted_at")
            .has_many("tests", "Test2", "test", "id")
            .has_many("testsB", "Test2", "testB", "id"),
    )
}

pub fn test2_entity() -> Arc<EntityMetadata> {
    Arc::new(
        EntityMetadata::new("Test2")
            .column("id")
            .column_as("deletedAt", "deleted_at")
            .belongs_to("test", "Test", "test", "id")
            .belongs_to("testB", "Test", "testB", "id")
            .has_many("tests", "Test3", "test", "id"),
    )
}

pub fn test3_entity() -> Arc<EntityMetadata> {
    Arc::new(
        EntityMetadata::new("Test3")
            .column("id")
            .belongs_to("test", "Test2", "test", "id"),
    )
}

/// Entity whose `parent` relation points back at itself
pub fn category_entity() -> Arc<EntityMetadata> {
    Arc::new(
        EntityMetadata::new("Category")
            .column("id")
            .column("name")
            .column_as("deletedAt", "deleted_at")
            .belongs_to("parent", "Category", "parent", "id"),
    )
}

/// Seeded database registered on the global registry under `name`
pub struct Fixture {
    name: String,
    connection: Arc<Connection>,
    _dir: TempDir,
}

impl Fixture {
    pub async fn open(name: &str) -> Fixture {
        init_tracing();

        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("fixture.db").display());
        let config = ConnectionConfig::new(url)
            .with_entity(test_entity())
            .with_entity(test2_entity())
            .with_entity(test3_entity())
            .with_entity(category_entity());

        let connection = ConnectionRegistry::global().connect(&config, name).await.unwrap();
        for statement in SCHEMA {
            connection.execute(statement, &[]).await.unwrap();
        }

        Fixture {
            name: name.to_string(),
            connection,
            _dir: dir,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub async fn close(self) {
        ConnectionRegistry::global().close(&self.name).await.unwrap();
    }
}

/// Knobs for `TestService`
#[derive(Debug, Clone)]
pub struct TestServiceOptions {
    pub deleted_at_field: Option<String>,
    pub tests_join_type: Option<JoinType>,
    pub tests_and_where: Option<String>,
}

impl Default for TestServiceOptions {
    fn default() -> Self {
        Self {
            deleted_at_field: Some("deleted_at".to_string()),
            tests_join_type: None,
            tests_and_where: None,
        }
    }
}

/// Service over `Test`: sorted by name, children `tests` and `testsB`
pub struct TestService {
    definition: ServiceDefinition,
}

impl TestService {
    pub fn with_options(connection_name: &str, options: TestServiceOptions) -> OrmResult<Self> {
        let mut tests = ChildRelation::new("tests", "Test2", resolve::<TestService2>);
        if let Some(join_type) = options.tests_join_type {
            tests = tests.join_type(join_type);
        }
        if let Some(condition) = options.tests_and_where {
            tests = tests.and_where(condition);
        }

        let mut builder = ServiceDefinition::builder()
            .repository(test_entity())
            .connection_name(connection_name)
            .default_sort("$alias.name", OrderDirection::Asc)
            .child(tests)
            .child(ChildRelation::new("testsB", "Test2", resolve::<TestService2>));
        builder = match options.deleted_at_field {
            Some(field) => builder.deleted_at_field(field),
            None => builder.without_soft_delete(),
        };

        Ok(Self {
            definition: builder.build()?,
        })
    }
}

impl EntityService for TestService {
    fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }
}

impl ServiceFactory for TestService {
    fn create(connection_name: &str) -> OrmResult<Self> {
        Self::with_options(connection_name, TestServiceOptions::default())
    }
}

/// Knobs for `TestService2`
#[derive(Debug, Clone, Default)]
pub struct TestService2Options {
    pub deleted_at_field: Option<String>,
    pub test_dependent: bool,
    pub default_sort: Option<String>,
}

/// Service over `Test2`: no soft delete, parents `test` and `testB`, and a
/// default query restricting to positive ids
pub struct TestService2 {
    definition: ServiceDefinition,
}

impl TestService2 {
    pub fn with_options(connection_name: &str, options: TestService2Options) -> OrmResult<Self> {
        let mut builder = ServiceDefinition::builder()
            .repository(test2_entity())
            .connection_name(connection_name)
            .without_soft_delete()
            .parent(ParentRelation::new("test", "Test", resolve::<TestService>).dependent(options.test_dependent))
            .parent(
                ParentRelation::new("testB", "TestB", resolve::<TestService>).join_type(JoinType::InnerJoinAndSelect),
            );
        if let Some(field) = options.deleted_at_field {
            builder = builder.deleted_at_field(field);
        }
        if let Some(sort) = options.default_sort {
            builder = builder.default_sort(sort, OrderDirection::Asc);
        }

        Ok(Self {
            definition: builder.build()?,
        })
    }
}

impl EntityService for TestService2 {
    fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    fn set_default_query(&self, alias: &str, builder: &mut SelectQueryBuilder) -> OrmResult<()> {
        default_query(self, alias, builder)?;
        builder.and_where(format!("{}.id > 0", alias));
        builder.order_by(&format!("{}.id", alias), OrderDirection::Desc);
        Ok(())
    }
}

impl ServiceFactory for TestService2 {
    fn create(connection_name: &str) -> OrmResult<Self> {
        Self::with_options(connection_name, TestService2Options::default())
    }
}

/// Service over `Test3` with a single parent
pub struct TestService3 {
    definition: ServiceDefinition,
}

impl EntityService for TestService3 {
    fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }
}

impl ServiceFactory for TestService3 {
    fn create(connection_name: &str) -> OrmResult<Self> {
        Ok(Self {
            definition: ServiceDefinition::builder()
                .repository(test3_entity())
                .connection_name(connection_name)
                .parent(ParentRelation::new("test", "Test2", resolve::<TestService2>))
                .build()?,
        })
    }
}

/// Bare service over `Test` without relations
pub struct TestServiceB {
    definition: ServiceDefinition,
}

impl EntityService for TestServiceB {
    fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }
}

impl ServiceFactory for TestServiceB {
    fn create(connection_name: &str) -> OrmResult<Self> {
        Ok(Self {
            definition: ServiceDefinition::builder()
                .repository(test_entity())
                .connection_name(connection_name)
                .build()?,
        })
    }
}

/// Service over `Category` with itself as parent
pub struct CategoryService {
    definition: ServiceDefinition,
}

impl EntityService for CategoryService {
    fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }
}

impl ServiceFactory for CategoryService {
    fn create(connection_name: &str) -> OrmResult<Self> {
        Ok(Self {
            definition: ServiceDefinition::builder()
                .repository(category_entity())
                .connection_name(connection_name)
                .parent(ParentRelation::new("parent", "Parent", resolve::<CategoryService>))
                .build()?,
        })
    }
}

pub fn test_columns(alias: &str) -> String {
    format!(
        r#""{a}"."id" AS "{a}_id", "{a}"."name" AS "{a}_name", "{a}"."created_at" AS "{a}_created_at", "{a}"."updated_at" AS "{a}_updated_at", "{a}"."deleted_at" AS "{a}_deleted_at""#,
        a = alias
    )
}

pub fn test2_columns(alias: &str) -> String {
    format!(
        r#""{a}"."id" AS "{a}_id", "{a}"."deleted_at" AS "{a}_deleted_at", "{a}"."test" AS "{a}_test", "{a}"."testB" AS "{a}_testB""#,
        a = alias
    )
}

pub fn test3_columns(alias: &str) -> String {
    format!(r#""{a}"."id" AS "{a}_id", "{a}"."test" AS "{a}_test""#, a = alias)
}

pub fn category_columns(alias: &str) -> String {
    format!(
        r#""{a}"."id" AS "{a}_id", "{a}"."name" AS "{a}_name", "{a}"."deleted_at" AS "{a}_deleted_at", "{a}"."parent" AS "{a}_parent""#,
        a = alias
    )
}

/// `SELECT <columns> <rest>`
pub fn select(columns: &[String], rest: &str) -> String {
    format!("SELECT {} {}", columns.join(", "), rest)
}
