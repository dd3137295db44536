use careerdesk::{EditorRegistry, editor::CoverLetterEditor};
use chrono::{TimeDelta, Utc};
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(60 * 60);

#[tokio::test]
async fn test_owner_cap_evicts_least_recently_modified() {
    let registry = EditorRegistry::with_limits(2, HOUR);

    let first = registry.open("ana", CoverLetterEditor::new()).await;
    let second = registry.open("ana", CoverLetterEditor::new()).await;

    // Touching the first makes the second the oldest.
    registry
        .with_editor("ana", first.id, |editor| editor.set_title("Backend"))
        .await
        .unwrap();

    let third = registry.open("ana", CoverLetterEditor::new()).await;

    assert!(registry.view("ana", first.id).await.is_some());
    assert!(registry.view("ana", second.id).await.is_none());
    assert!(registry.view("ana", third.id).await.is_some());
    assert_eq!(registry.stats().await.open_editors, 2);
}

#[tokio::test]
async fn test_owner_cap_leaves_other_owners_alone() {
    let registry = EditorRegistry::with_limits(1, HOUR);

    let theirs = registry.open("ben", CoverLetterEditor::new()).await;
    registry.open("ana", CoverLetterEditor::new()).await;
    registry.open("ana", CoverLetterEditor::new()).await;

    assert!(registry.view("ben", theirs.id).await.is_some());
    let stats = registry.stats().await;
    assert_eq!(stats.open_editors, 2);
    assert_eq!(stats.owners, 2);
}

#[tokio::test]
async fn test_idle_editors_are_evicted() {
    let registry = EditorRegistry::with_limits(8, HOUR);
    let kept = registry.open("ana", CoverLetterEditor::new()).await;
    registry.open("ben", CoverLetterEditor::new()).await;

    assert_eq!(registry.evict_idle(Utc::now()).await, 0);

    let later = Utc::now() + TimeDelta::hours(2);
    assert_eq!(registry.evict_idle(later).await, 2);
    assert!(registry.view("ana", kept.id).await.is_none());
    assert_eq!(registry.stats().await.open_editors, 0);
}

#[tokio::test]
async fn test_open_drops_idle_editors_of_every_owner() {
    let registry = EditorRegistry::with_limits(8, Duration::ZERO);
    let stale = registry.open("ben", CoverLetterEditor::new()).await;

    let fresh = registry.open("ana", CoverLetterEditor::new()).await;

    assert!(registry.view("ben", stale.id).await.is_none());
    assert!(registry.view("ana", fresh.id).await.is_some());
    assert_eq!(registry.stats().await.open_editors, 1);
}
