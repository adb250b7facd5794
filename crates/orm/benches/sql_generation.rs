//! SQL Generation Benchmarks
//!
//! Rendering of joined SELECT queries, count queries and named parameter binding

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use joinwise_orm::{
    DatabaseValue, EntityCatalog, EntityMetadata, JoinType, OrderDirection, Parameters, Predicate, SelectQueryBuilder,
    SqlDialect,
};

fn catalog() -> (Arc<EntityMetadata>, Arc<EntityCatalog>) {
    let author = Arc::new(
        EntityMetadata::new("Author")
            .column("id")
            .column("name")
            .column_as("deletedAt", "deleted_at")
            .has_many("books", "Book", "author", "id"),
    );
    let book = Arc::new(
        EntityMetadata::new("Book")
            .column("id")
            .column("title")
            .column_as("deletedAt", "deleted_at")
            .belongs_to("author", "Author", "author", "id")
            .has_many("chapters", "Chapter", "book", "id"),
    );
    let chapter = Arc::new(
        EntityMetadata::new("Chapter")
            .column("id")
            .column("number")
            .belongs_to("book", "Book", "book", "id"),
    );

    let catalog: EntityCatalog = vec![author.clone(), book, chapter].into_iter().collect();
    (author, Arc::new(catalog))
}

fn joined_builder(dialect: SqlDialect) -> SelectQueryBuilder {
    let (author, catalog) = catalog();
    let mut qb = SelectQueryBuilder::new(author, "author", catalog, dialect).unwrap();

    let mut parameters = Parameters::new();
    parameters.insert("min".to_string(), DatabaseValue::Int32(1));

    qb.join(
        JoinType::LeftJoinAndSelect,
        "author.books",
        "authorBook",
        Some(Predicate::is_null("authorBook", "deletedAt")),
        Parameters::new(),
    )
    .unwrap();
    qb.join(
        JoinType::LeftJoinAndSelect,
        "authorBook.chapters",
        "authorBookChapter",
        Some(Predicate::raw("authorBookChapter.number >= :min")),
        parameters,
    )
    .unwrap();
    qb.and_where(Predicate::is_null("author", "deletedAt"))
        .add_order_by("author.name", OrderDirection::Asc)
        .add_order_by("authorBook.title", OrderDirection::Asc);
    qb
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");

    for dialect in [SqlDialect::PostgreSQL, SqlDialect::SQLite] {
        let qb = joined_builder(dialect);

        group.bench_with_input(BenchmarkId::new("select", format!("{:?}", dialect)), &qb, |b, qb| {
            b.iter(|| black_box(qb.get_query_and_parameters().unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("count", format!("{:?}", dialect)), &qb, |b, qb| {
            b.iter(|| black_box(qb.get_count_query_and_parameters().unwrap()))
        });
    }

    group.finish();
}

fn bench_building(c: &mut Criterion) {
    c.bench_function("build_joined_query", |b| {
        b.iter(|| black_box(joined_builder(SqlDialect::PostgreSQL)))
    });
}

criterion_group!(benches, bench_rendering, bench_building);
criterion_main!(benches);
