//! The in-memory repository and SQLite must agree on every filter SQLite supports

use filtra::filter::{
    Filter, and, contains, eq, gt, gte, has_prefix, has_suffix, icontains, ieq, ihas_prefix,
    ihas_suffix, ine, is_in, is_null, lt, lte, ne, not, or,
};
use filtra::sql::Executor;
use filtra::{
    DialectKind, Error, Evaluator, Mapper, Mapping, MemoryDb, MemoryRepo, Query, Repository,
    SqlRepo, SqliteExecutor, Statement, asc, desc,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    name: String,
    age: i64,
    active: bool,
    score: f64,
    nickname: Option<String>,
}

filtra::entity!(Person {
    name,
    age,
    active,
    score,
    nickname
});

fn person(name: &str, age: i64, active: bool, nickname: Option<&str>) -> Person {
    Person {
        name: name.to_string(),
        age,
        active,
        score: age as f64 + 0.5,
        nickname: nickname.map(str::to_string),
    }
}

fn people() -> Vec<Person> {
    vec![
        person("Alice", 23, true, Some("al")),
        person("Bob", 27, true, None),
        person("Eve", 36, false, Some("evil")),
        person("Zed_100%", 41, false, None),
        person("ann", 19, true, Some("Al")),
    ]
}

fn mapper() -> Mapper<Person> {
    let mapping = Mapping::new([
        ("name", "full_name"),
        ("age", "age"),
        ("active", "is_active"),
        ("score", "score"),
        ("nickname", "nick"),
    ])
    .unwrap();
    Mapper::builder("people").mapping(mapping).build().unwrap()
}

struct Backends {
    memory: MemoryRepo<Person>,
    memory_db: MemoryDb,
    sql: SqlRepo<Person>,
    sqlite: SqliteExecutor,
}

async fn backends() -> Backends {
    let sqlite = SqliteExecutor::in_memory().await.unwrap();
    sqlite
        .execute(&Statement::raw(
            "CREATE TABLE people (full_name TEXT, age INTEGER, is_active BOOLEAN, score REAL, nick TEXT)",
        ))
        .await
        .unwrap();
    let sql = SqlRepo::with_kind(mapper(), DialectKind::Sqlite);
    let memory = MemoryRepo::new(mapper()).with_evaluator(Evaluator::for_dialect(sql.dialect()));
    let memory_db = MemoryDb::new();

    let records = people();
    memory.add_many(&memory_db, &records).unwrap();
    sql.add_many(&sqlite, &records).await.unwrap();

    Backends {
        memory,
        memory_db,
        sql,
        sqlite,
    }
}

fn names(records: Vec<Person>) -> Vec<String> {
    records.into_iter().map(|p| p.name).collect()
}

async fn assert_same(b: &Backends, filter: Filter) {
    let query = Query::filtered(filter.clone()).order_by([asc("name")]);
    let expected = names(b.memory.get_many(&b.memory_db, &query).unwrap());
    let actual = names(b.sql.get_many(&b.sqlite, &query).await.unwrap());
    assert_eq!(actual, expected, "filter: {:?}", filter);

    let expected = b.memory.count(&b.memory_db, &filter).unwrap();
    let actual = b.sql.count(&b.sqlite, &filter).await.unwrap();
    assert_eq!(actual, expected, "count of filter: {:?}", filter);
}

#[tokio::test]
async fn test_comparisons_agree() {
    let b = backends().await;
    for filter in [
        eq("name", "Bob"),
        ne("name", "Bob"),
        lt("age", 27),
        gt("age", 27),
        lte("age", 27),
        gte("age", 27),
        gt("score", 27),
        lte("score", 36.5),
        eq("active", true),
        ne("active", true),
        lt("name", "Bob"),
        eq("nickname", "al"),
        ne("nickname", "al"),
    ] {
        assert_same(&b, filter).await;
    }
}

#[tokio::test]
async fn test_case_and_substring_agree() {
    let b = backends().await;
    for filter in [
        ieq("name", "ALICE"),
        ine("name", "alice"),
        ieq("nickname", "AL"),
        contains("name", "e"),
        icontains("name", "E"),
        has_prefix("name", "A"),
        ihas_prefix("name", "a"),
        has_suffix("name", "e"),
        ihas_suffix("name", "E"),
        contains("name", "_1"),
        contains("name", "%"),
        has_suffix("name", "0%"),
        contains("name", "d_1"),
        has_prefix("name", "_"),
    ] {
        assert_same(&b, filter).await;
    }
}

#[tokio::test]
async fn test_null_and_lists_agree() {
    let b = backends().await;
    for filter in [
        is_null("nickname"),
        not(is_null("nickname")),
        not(eq("nickname", "al")),
        is_in("age", [23, 36]),
        is_in::<i64>("age", []),
        not(is_in::<i64>("nickname", [])),
        is_in("nickname", ["al", "evil"]),
        not(is_in("nickname", ["al"])),
    ] {
        assert_same(&b, filter).await;
    }
}

#[tokio::test]
async fn test_combinators_agree() {
    let b = backends().await;
    for filter in [
        and([]),
        or([]),
        not(and([])),
        and([eq("active", true), gt("age", 20)]),
        or([eq("name", "Eve"), is_null("nickname")]),
        not(or([eq("nickname", "al"), gt("age", 30)])),
        and([or([ihas_prefix("name", "a"), has_suffix("name", "%")]), not(eq("active", false))]),
        not(not(contains("name", "o"))),
    ] {
        assert_same(&b, filter).await;
    }
}

#[tokio::test]
async fn test_ordering_and_pagination_agree() {
    let b = backends().await;
    for query in [
        Query::new().order_by([asc("age")]),
        Query::new().order_by([desc("age")]).with_limit(2),
        Query::new().order_by([asc("nickname"), asc("name")]),
        Query::new().order_by([desc("nickname"), desc("name")]),
        Query::new().order_by([asc("name")]).with_offset(2),
        Query::new().order_by([asc("name")]).with_limit(2).with_offset(1),
        Query::filtered(eq("active", true)).order_by([desc("score")]).with_limit(1),
    ] {
        let expected = names(b.memory.get_many(&b.memory_db, &query).unwrap());
        let actual = names(b.sql.get_many(&b.sqlite, &query).await.unwrap());
        assert_eq!(actual, expected, "query: {:?}", query);
    }
}

#[tokio::test]
async fn test_writes_agree() {
    let b = backends().await;
    let renamed = person("Renamed", 50, false, Some("r"));

    let filter = eq("active", true);
    b.memory.update(&b.memory_db, &filter, &renamed).unwrap();
    b.sql.update(&b.sqlite, &filter, &renamed).await.unwrap();
    assert_same(&b, eq("name", "Renamed")).await;

    let filter = gt("age", 40);
    b.memory.delete(&b.memory_db, &filter).unwrap();
    b.sql.delete(&b.sqlite, &filter).await.unwrap();
    assert_same(&b, and([])).await;

    let expected = b.memory.get(&b.memory_db, &eq("name", "Eve")).unwrap();
    let actual = b.sql.get(&b.sqlite, &eq("name", "Eve")).await.unwrap();
    assert_eq!(actual, expected);

    b.memory.clear(&b.memory_db).unwrap();
    b.sql.clear(&b.sqlite).await.unwrap();
    assert_eq!(b.sql.count_all(&b.sqlite).await.unwrap(), 0);
    assert_eq!(b.memory.count_all(&b.memory_db).unwrap(), 0);
}

#[tokio::test]
async fn test_errors_agree() {
    let b = backends().await;
    let filter = or([eq("name", "Bob"), eq("nickname_2", "x")]);
    let memory = b.memory.count(&b.memory_db, &filter).unwrap_err();
    let sql = b.sql.count(&b.sqlite, &filter).await.unwrap_err();
    assert!(matches!(memory, Error::UnknownField(_)));
    assert!(matches!(sql, Error::UnknownField(_)));

    let memory = b.memory.get(&b.memory_db, &eq("name", "Mallory")).unwrap_err();
    let sql = b.sql.get(&b.sqlite, &eq("name", "Mallory")).await.unwrap_err();
    assert!(memory.is_not_found());
    assert!(sql.is_not_found());

    b.memory.clear(&b.memory_db).unwrap();
    b.sql.clear(&b.sqlite).await.unwrap();
    let unknown = eq("nickname_2", "x");
    let memory = b.memory.delete(&b.memory_db, &unknown).unwrap_err();
    let sql = b.sql.delete(&b.sqlite, &unknown).await.unwrap_err();
    assert!(matches!(memory, Error::UnknownField(_)));
    assert!(matches!(sql, Error::UnknownField(_)));
    let memory = b.memory.update(&b.memory_db, &unknown, &Person::default()).unwrap_err();
    let sql = b.sql.update(&b.sqlite, &unknown, &Person::default()).await.unwrap_err();
    assert!(matches!(memory, Error::UnknownField(_)));
    assert!(matches!(sql, Error::UnknownField(_)));
}
