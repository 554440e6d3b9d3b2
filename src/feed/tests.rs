use super::*;
use crate::FeedConfig;
use crate::repository::Repository;
use crate::store::ContentKey;
use std::collections::HashSet;
use tempfile::TempDir;

async fn create_service(max_page_size: u32) -> (FeedService, Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let repository = Repository::open(&temp_dir.path().join("feed.db"), 2)
        .await
        .unwrap();
    let config = FeedConfig {
        default_page_size: 4,
        max_page_size,
    };
    let service = FeedService::new(repository.clone(), config, "default");
    (service, repository, temp_dir)
}

#[tokio::test]
async fn test_query_defaults_and_clamping() {
    let (service, _repository, _temp_dir) = create_service(10).await;

    let query = service.query_for(&FeedRequest::default());
    assert_eq!(query.workspace_id, "default");
    assert_eq!(query.limit, 4);
    assert_eq!(query.offset, 0);
    assert!(query.tag.is_none());

    let query = service.query_for(&FeedRequest::for_workspace("  ").with_limit(500));
    assert_eq!(query.workspace_id, "default");
    assert_eq!(query.limit, 10);

    let query = service.query_for(&FeedRequest::for_workspace("w1").with_limit(0));
    assert_eq!(query.limit, 1);
}

#[tokio::test]
async fn test_scrolling_until_empty_page_visits_everything_once() {
    let (service, repository, _temp_dir) = create_service(100).await;
    for i in 0..10u32 {
        repository
            .insert(ContentKey::new(i), "scroll", "w1")
            .await
            .unwrap();
    }

    let request = FeedRequest::for_workspace("w1").with_limit(3);
    let mut seen = service
        .first_page(&request)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect::<Vec<_>>();
    loop {
        let page = service
            .page(&request.clone().with_offset(seen.len() as u64))
            .await
            .unwrap();
        if page.is_empty() {
            break;
        }
        seen.extend(page.into_iter().map(|r| r.id));
    }

    assert_eq!(seen.len(), 10);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 10);
}

#[tokio::test]
async fn test_tags_and_stats() {
    let (service, repository, _temp_dir) = create_service(100).await;
    repository
        .insert(ContentKey::new(1), "b, a", "default")
        .await
        .unwrap();
    repository
        .insert(ContentKey::new(2), "c", "other")
        .await
        .unwrap();

    assert_eq!(service.tags(None).await.unwrap(), vec!["a", "b"]);
    assert_eq!(service.tags(Some("other")).await.unwrap(), vec!["c"]);

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.get("default"), Some(&1));
    assert_eq!(stats.get("other"), Some(&1));
}

#[tokio::test]
async fn test_offset_past_the_end_is_exhausted() {
    let (service, repository, _temp_dir) = create_service(100).await;
    repository
        .insert(ContentKey::new(1), "", "w1")
        .await
        .unwrap();

    let request = FeedRequest::for_workspace("w1").with_offset(u64::MAX);
    assert!(service.page(&request).await.unwrap().is_empty());
}
