use async_trait::async_trait;
use burrow_core::error::{ConflictTarget, StorageError};
use burrow_core::query::{ListQuery, Page, SortField, SortOrder};
use burrow_core::repository::{ReadRepository, Repository, Result, SequenceCounter};
use burrow_core::{NewUrlMapping, ShortCode, UrlMapping};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// A stored row: the mapping plus the dedup key it was inserted under.
#[derive(Debug, Clone)]
struct Row {
    mapping: UrlMapping,
    dedup_key: Option<String>,
}

/// In-memory implementation of the repository contract using DashMap.
///
/// The short code map is the primary index. A second map from dedup key to
/// short code enforces destination uniqueness. `create` always locks the
/// dedup slot before the short code slot, so a concurrent insert either sees
/// both entries or neither.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    rows: DashMap<String, Row>,
    dedup: DashMap<String, String>,
    next_id: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: DashMap::with_capacity(capacity),
            dedup: DashMap::with_capacity(capacity),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of stored mappings.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn snapshot<F>(&self, filter: F) -> Vec<UrlMapping>
    where
        F: Fn(&UrlMapping) -> bool,
    {
        self.rows
            .iter()
            .filter(|row| filter(&row.mapping))
            .map(|row| row.mapping.clone())
            .collect()
    }
}

fn compare(a: &UrlMapping, b: &UrlMapping, field: SortField) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::ShortCode => a.short_code.cmp(&b.short_code),
        SortField::Title => a.title.cmp(&b.title),
        SortField::DestinationUrl => a.destination_url.cmp(&b.destination_url),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find_by_short_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        Ok(self
            .rows
            .get(code.as_str())
            .map(|row| row.mapping.clone()))
    }

    async fn find_by_destination(
        &self,
        destination: &str,
        owner_id: Option<u64>,
    ) -> Result<Option<UrlMapping>> {
        let found = self
            .snapshot(|m| {
                m.destination_url == destination && owner_id.is_none_or(|id| m.owner_id == id)
            })
            .into_iter()
            .min_by_key(|m| m.id);
        Ok(found)
    }

    async fn list_by_owner(&self, query: &ListQuery) -> Result<Page<UrlMapping>> {
        let needle = query.search_needle();
        let mut matches = self.snapshot(|m| {
            m.owner_id == query.owner_id
                && needle.as_deref().is_none_or(|n| m.matches_search(n))
        });

        matches.sort_by(|a, b| {
            let ord = compare(a, b, query.sort_field);
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total_count = matches.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let items = matches
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .collect();

        Ok(Page { items, total_count })
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create(&self, new: NewUrlMapping) -> Result<UrlMapping> {
        let dedup_key = new.dedup_key.as_ref().map(|k| k.as_str().to_owned());

        // Hold the dedup slot until the row is in place.
        let dedup_slot = match &dedup_key {
            Some(key) => match self.dedup.entry(key.clone()) {
                Entry::Occupied(_) => {
                    return Err(StorageError::Conflict(ConflictTarget::Destination(
                        new.destination_url,
                    )));
                }
                Entry::Vacant(slot) => Some(slot),
            },
            None => None,
        };

        let code = new.short_code.as_str().to_owned();
        match self.rows.entry(code.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(ConflictTarget::ShortCode(code))),
            Entry::Vacant(slot) => {
                let mapping = UrlMapping {
                    id: self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1,
                    short_code: new.short_code,
                    destination_url: new.destination_url,
                    title: new.title,
                    description: new.description,
                    owner_id: new.owner_id,
                    created_at: Timestamp::now(),
                };
                slot.insert(Row {
                    mapping: mapping.clone(),
                    dedup_key,
                });
                if let Some(slot) = dedup_slot {
                    slot.insert(code);
                }
                Ok(mapping)
            }
        }
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let Some((_, row)) = self.rows.remove(code.as_str()) else {
            return Ok(false);
        };
        if let Some(key) = row.dedup_key {
            self.dedup.remove(&key);
        }
        Ok(true)
    }
}

/// Process-local [`SequenceCounter`] backed by an atomic integer.
///
/// Values restart from 1 with every process, so this is only suitable for
/// tests and single-node demos.
#[derive(Debug, Default)]
pub struct InMemorySequenceCounter {
    value: AtomicU64,
}

impl InMemorySequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the counter so the next value returned is `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Self {
            value: AtomicU64::new(last),
        }
    }
}

#[async_trait]
impl SequenceCounter for InMemorySequenceCounter {
    async fn next_value(&self) -> Result<u64> {
        // Saturates at u64::MAX instead of wrapping, so no value is ever reissued.
        self.value
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |v| {
                v.checked_add(1)
            })
            .map(|previous| previous + 1)
            .map_err(|_| StorageError::InvalidData("sequence counter overflowed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::DedupScope;
    use std::collections::HashSet;
    use std::sync::Arc;

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

    fn titled(code: &str, title: &str, owner_id: u64) -> NewUrlMapping {
        NewUrlMapping {
            title: Some(title.to_string()),
            ..new_mapping(code, "https://example.com", owner_id)
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let repo = InMemoryRepository::new();
        let created = repo
            .create(new_mapping("abc", "https://example.com", 1))
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        let found = repo
            .find_by_short_code(&ShortCode::new_unchecked("abc"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let repo = InMemoryRepository::new();
        let found = repo
            .find_by_short_code(&ShortCode::new_unchecked("nope"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let repo = InMemoryRepository::new();
        repo.create(new_mapping("abc", "https://one.example", 1))
            .await
            .unwrap();

        let err = repo
            .create(new_mapping("abc", "https://two.example", 2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Conflict(ConflictTarget::ShortCode(ref code)) if code == "abc"
        ));

        let kept = repo
            .find_by_short_code(&ShortCode::new_unchecked("abc"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.destination_url, "https://one.example");
    }

    #[tokio::test]
    async fn duplicate_dedup_key_conflicts_on_destination() {
        let repo = InMemoryRepository::new();
        let url = "https://example.com/page";
        let key = DedupScope::Global.key_for(url, 1);

        let mut first = new_mapping("a1", url, 1);
        first.dedup_key = key.clone();
        repo.create(first).await.unwrap();

        let mut second = new_mapping("b2", url, 2);
        second.dedup_key = key;
        let err = repo.create(second).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Conflict(ConflictTarget::Destination(_))
        ));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn code_conflict_releases_dedup_slot() {
        let repo = InMemoryRepository::new();
        let url = "https://example.com/page";
        repo.create(new_mapping("taken", "https://other.example", 1))
            .await
            .unwrap();

        let mut clash = new_mapping("taken", url, 1);
        clash.dedup_key = DedupScope::Global.key_for(url, 1);
        assert!(repo.create(clash).await.is_err());

        let mut retry = new_mapping("fresh", url, 1);
        retry.dedup_key = DedupScope::Global.key_for(url, 1);
        assert!(repo.create(retry).await.is_ok());
    }

    #[tokio::test]
    async fn delete_frees_code_and_dedup_key() {
        let repo = InMemoryRepository::new();
        let url = "https://example.com";
        let code = ShortCode::new_unchecked("abc");
        let mut mapping = new_mapping("abc", url, 1);
        mapping.dedup_key = DedupScope::Global.key_for(url, 1);
        repo.create(mapping.clone()).await.unwrap();

        assert!(repo.delete(&code).await.unwrap());
        assert!(repo.find_by_short_code(&code).await.unwrap().is_none());
        assert!(!repo.delete(&code).await.unwrap());

        let recreated = repo.create(mapping).await.unwrap();
        assert_eq!(recreated.id, 2);
    }

    #[tokio::test]
    async fn find_by_destination_returns_oldest_and_honours_owner() {
        let repo = InMemoryRepository::new();
        let url = "https://example.com";
        repo.create(new_mapping("a", url, 1)).await.unwrap();
        repo.create(new_mapping("b", url, 2)).await.unwrap();

        let any = repo.find_by_destination(url, None).await.unwrap().unwrap();
        assert_eq!(any.short_code.as_str(), "a");

        let owned = repo.find_by_destination(url, Some(2)).await.unwrap().unwrap();
        assert_eq!(owned.short_code.as_str(), "b");

        assert!(repo.find_by_destination(url, Some(3)).await.unwrap().is_none());
        assert!(repo
            .find_by_destination("https://other.example", None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let repo = InMemoryRepository::new();
        for i in 0..25 {
            repo.create(new_mapping(&format!("c{i}"), "https://example.com", 1))
                .await
                .unwrap();
        }
        repo.create(new_mapping("other", "https://example.com", 2))
            .await
            .unwrap();

        let query = ListQuery::builder().owner_id(1).page(3).page_size(10).build();
        let page = repo.list_by_owner(&query).await.unwrap();

        assert_eq!(page.total_count, 25);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total_pages(10), 3);
        // Newest first, so the last page holds the five oldest.
        let codes: Vec<_> = page.items.iter().map(|m| m.short_code.to_string()).collect();
        assert_eq!(codes, vec!["c4", "c3", "c2", "c1", "c0"]);
    }

    #[tokio::test]
    async fn list_page_past_end_is_empty_with_count() {
        let repo = InMemoryRepository::new();
        repo.create(new_mapping("a", "https://example.com", 1))
            .await
            .unwrap();

        let query = ListQuery::builder().owner_id(1).page(5).build();
        let page = repo.list_by_owner(&query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 1);
    }

    #[tokio::test]
    async fn list_sorts_by_title_ascending() {
        let repo = InMemoryRepository::new();
        repo.create(titled("a", "Gamma", 1)).await.unwrap();
        repo.create(titled("b", "Alpha", 1)).await.unwrap();
        repo.create(titled("c", "Beta", 1)).await.unwrap();

        let query = ListQuery::builder()
            .owner_id(1)
            .sort_field(SortField::Title)
            .sort_order(SortOrder::Asc)
            .build();
        let page = repo.list_by_owner(&query).await.unwrap();
        let titles: Vec<_> = page
            .items
            .iter()
            .map(|m| m.title.clone().unwrap())
            .collect();
        assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn list_search_filters_before_counting() {
        let repo = InMemoryRepository::new();
        repo.create(titled("a", "Quarterly Report", 1)).await.unwrap();
        repo.create(titled("b", "Team offsite", 1)).await.unwrap();
        repo.create(titled("c", "Annual report", 1)).await.unwrap();

        let query = ListQuery::builder().owner_id(1).search("REPORT").build();
        let page = repo.list_by_owner(&query).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert!(page
            .items
            .iter()
            .all(|m| m.title.as_deref().unwrap().to_lowercase().contains("report")));
    }

    #[tokio::test]
    async fn concurrent_creates_on_same_code_admit_one() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.create(new_mapping("same", &format!("https://example.com/{i}"), 1))
                    .await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn counter_starts_at_one_and_never_repeats() {
        let counter = Arc::new(InMemorySequenceCounter::new());
        assert_eq!(counter.next_value().await.unwrap(), 1);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                let mut values = Vec::new();
                for _ in 0..100 {
                    values.push(counter.next_value().await.unwrap());
                }
                values
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.await.unwrap() {
                assert!(seen.insert(value), "value {value} handed out twice");
            }
        }
        assert_eq!(seen.len(), 800);
        assert_eq!(seen.iter().max(), Some(&801));
    }

    #[tokio::test]
    async fn counter_resumes_after_given_value() {
        let counter = InMemorySequenceCounter::starting_after(41);
        assert_eq!(counter.next_value().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn counter_reports_overflow() {
        let counter = InMemorySequenceCounter::starting_after(u64::MAX);
        assert!(counter.next_value().await.is_err());
    }

    #[tokio::test]
    async fn counter_stays_exhausted_after_overflow() {
        let counter = InMemorySequenceCounter::starting_after(u64::MAX - 1);
        assert_eq!(counter.next_value().await.unwrap(), u64::MAX);

        for _ in 0..3 {
            assert!(matches!(
                counter.next_value().await,
                Err(StorageError::InvalidData(_))
            ));
        }
    }
}
