//! Requires a local docker daemon: `cargo test -p burrow-storage -- --ignored`.

use std::collections::HashSet;
use std::sync::Arc;

use burrow_core::{DedupScope, ListQuery, NewUrlMapping, ShortCode, SortField, SortOrder};
use burrow_storage::{
    schema, ConflictTarget, MySqlRepository, MySqlSequenceCounter, ReadRepository, Repository,
    SequenceCounter, StorageError,
};
use burrow_test_infra::mysql::{MySqlServer, MysqlConfig};

struct Fixture {
    _mysql: MySqlServer,
    pool: sqlx::MySqlPool,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let pool = mysql.pool().await.expect("connect mysql");

        schema::ensure(&pool).await.expect("create schema");

        Self {
            _mysql: mysql,
            repo: MySqlRepository::new(pool.clone()),
            pool,
        }
    }
}

fn new_mapping(code: &str, url: &str, owner_id: u64) -> NewUrlMapping {
    NewUrlMapping {
        short_code: ShortCode::new_unchecked(code),
        destination_url: url.to_string(),
        title: None,
        description: None,
        owner_id,
        dedup_key: None,
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn create_and_find_round_trip() {
    let fixture = Fixture::start().await;
    let mut new = new_mapping("abc123", "https://example.com/a", 7);
    new.title = Some("Example".to_string());

    let created = fixture.repo.create(new).await.unwrap();
    let found = fixture
        .repo
        .find_by_short_code(&created.short_code)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found, created);
    assert_eq!(found.title.as_deref(), Some("Example"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn duplicate_code_is_a_short_code_conflict() {
    let fixture = Fixture::start().await;
    fixture
        .repo
        .create(new_mapping("abc123", "https://one.example", 1))
        .await
        .unwrap();

    let err = fixture
        .repo
        .create(new_mapping("abc123", "https://two.example", 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Conflict(ConflictTarget::ShortCode(_))
    ));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn duplicate_dedup_key_is_a_destination_conflict() {
    let fixture = Fixture::start().await;
    let url = "https://example.com/dedup";

    let mut first = new_mapping("first", url, 1);
    first.dedup_key = DedupScope::Global.key_for(url, 1);
    fixture.repo.create(first).await.unwrap();

    let mut second = new_mapping("second", url, 2);
    second.dedup_key = DedupScope::Global.key_for(url, 2);
    let err = fixture.repo.create(second).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Conflict(ConflictTarget::Destination(_))
    ));

    let existing = fixture
        .repo
        .find_by_destination(url, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.short_code.as_str(), "first");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn delete_is_hard_and_frees_the_code() {
    let fixture = Fixture::start().await;
    let code = ShortCode::new_unchecked("gone");
    fixture
        .repo
        .create(new_mapping("gone", "https://example.com", 1))
        .await
        .unwrap();

    assert!(fixture.repo.delete(&code).await.unwrap());
    assert!(fixture.repo.find_by_short_code(&code).await.unwrap().is_none());
    assert!(!fixture.repo.delete(&code).await.unwrap());

    fixture
        .repo
        .create(new_mapping("gone", "https://example.com/again", 1))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn list_filters_sorts_and_counts() {
    let fixture = Fixture::start().await;
    for (code, title) in [("a1", "Quarterly report"), ("b2", "Offsite"), ("c3", "Annual Report")] {
        let mut new = new_mapping(code, "https://example.com", 9);
        new.title = Some(title.to_string());
        fixture.repo.create(new).await.unwrap();
    }
    fixture
        .repo
        .create(new_mapping("zz", "https://example.com", 10))
        .await
        .unwrap();

    let query = ListQuery::builder()
        .owner_id(9)
        .search("report")
        .sort_field(SortField::Title)
        .sort_order(SortOrder::Asc)
        .build();
    let page = fixture.repo.list_by_owner(&query).await.unwrap();

    assert_eq!(page.total_count, 2);
    let codes: Vec<_> = page.items.iter().map(|m| m.short_code.to_string()).collect();
    assert_eq!(codes, vec!["c3", "a1"]);

    let beyond = ListQuery::builder().owner_id(9).page(4).page_size(1).build();
    let page = fixture.repo.list_by_owner(&beyond).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 3);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn search_treats_wildcards_literally() {
    let fixture = Fixture::start().await;
    let mut sale = new_mapping("sale", "https://example.com", 3);
    sale.title = Some("50% off".to_string());
    fixture.repo.create(sale).await.unwrap();
    let mut other = new_mapping("other", "https://example.com", 3);
    other.title = Some("500 items".to_string());
    fixture.repo.create(other).await.unwrap();

    let query = ListQuery::builder().owner_id(3).search("0%").build();
    let page = fixture.repo.list_by_owner(&query).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].short_code.as_str(), "sale");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn counter_is_monotonic_under_concurrency() {
    let fixture = Fixture::start().await;
    let counter = Arc::new(
        MySqlSequenceCounter::init(fixture.pool.clone(), MySqlSequenceCounter::DEFAULT_NAME)
            .await
            .unwrap(),
    );
    assert_eq!(counter.next_value().await.unwrap(), 1);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let counter = Arc::clone(&counter);
        handles.push(tokio::spawn(async move {
            let mut values = Vec::new();
            for _ in 0..25 {
                values.push(counter.next_value().await.unwrap());
            }
            values
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for value in handle.await.unwrap() {
            assert!(seen.insert(value));
        }
    }
    assert_eq!(seen.len(), 100);
    assert_eq!(seen.iter().max(), Some(&101));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn counter_init_keeps_existing_value() {
    let fixture = Fixture::start().await;
    let first = MySqlSequenceCounter::init(fixture.pool.clone(), "restart")
        .await
        .unwrap();
    first.next_value().await.unwrap();
    first.next_value().await.unwrap();

    let again = MySqlSequenceCounter::init(fixture.pool.clone(), "restart")
        .await
        .unwrap();
    assert_eq!(again.next_value().await.unwrap(), 3);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn longest_accepted_title_fits_the_column() {
    let fixture = Fixture::start().await;
    let mut new = new_mapping("long", "https://example.com/long", 1);
    new.title = Some("é".repeat(burrow_core::shortener::MAX_TITLE_LENGTH));

    let created = fixture.repo.create(new).await.unwrap();
    let found = fixture
        .repo
        .find_by_short_code(&created.short_code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.title, created.title);
}
