//! Resource repository tests.

use offload_core::types::id::ResourceId;
use offload_database::store::ResourceStore;
use offload_entity::resource::OffloadState;

use crate::helpers::TestDb;

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_offloaded_and_local_only_records() {
    let db = TestDb::new().await;

    assert!(db.resources.find(db.tenant, ResourceId(1)).await.unwrap().is_none());

    db.resources
        .mark_offloaded(db.tenant, ResourceId(1), "https://cdn.example.net/a.png", "a.png")
        .await
        .unwrap();
    db.resources
        .mark_local_only(db.tenant, ResourceId(2))
        .await
        .unwrap();

    let offloaded = db.resources.find(db.tenant, ResourceId(1)).await.unwrap().unwrap();
    assert_eq!(offloaded.state, OffloadState::Offloaded);
    assert_eq!(offloaded.cdn_url.as_deref(), Some("https://cdn.example.net/a.png"));
    assert_eq!(offloaded.remote_path.as_deref(), Some("a.png"));

    let summary = db.resources.summary(Some(db.tenant)).await.unwrap();
    assert_eq!(summary.offloaded, 1);
    assert_eq!(summary.local_only, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_mark_offloaded_overwrites() {
    let db = TestDb::new().await;
    db.resources
        .mark_offloaded(db.tenant, ResourceId(9), "https://cdn.example.net/old.png", "old.png")
        .await
        .unwrap();
    db.resources
        .mark_offloaded(db.tenant, ResourceId(9), "https://cdn.example.net/new.png", "new.png")
        .await
        .unwrap();

    let record = db.resources.find(db.tenant, ResourceId(9)).await.unwrap().unwrap();
    assert_eq!(record.cdn_url.as_deref(), Some("https://cdn.example.net/new.png"));
    assert_eq!(db.resources.summary(Some(db.tenant)).await.unwrap().offloaded, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_mark_offloaded_keeps_local_only() {
    let db = TestDb::new().await;
    db.resources
        .mark_local_only(db.tenant, ResourceId(4))
        .await
        .unwrap();

    let written = db
        .resources
        .mark_offloaded(db.tenant, ResourceId(4), "https://cdn.example.net/a.png", "a.png")
        .await
        .unwrap();
    assert!(!written);

    let record = db.resources.find(db.tenant, ResourceId(4)).await.unwrap().unwrap();
    assert_eq!(record.state, OffloadState::LocalOnly);
    assert!(record.cdn_url.is_none());
}
