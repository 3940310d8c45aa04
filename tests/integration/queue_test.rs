//! Queue repository tests.

use chrono::Duration;

use offload_core::types::clock::Clock;
use offload_core::types::id::ResourceId;
use offload_database::store::QueueStore;
use offload_entity::job::JobStatus;

use crate::helpers::TestDb;

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_enqueue_and_fetch_due() {
    let db = TestDb::new().await;
    let id = db
        .queue
        .enqueue(db.tenant, ResourceId(1), "/uploads/a.png", Duration::seconds(300))
        .await
        .unwrap();

    let job = db.queue.find(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.attempts, 0);
    assert_eq!(job.file_path, "/uploads/a.png");
    assert!(!job.is_variant);

    let variant = db
        .queue
        .enqueue_variant(db.tenant, ResourceId(1), "/uploads/a-150x150.png", Duration::seconds(300))
        .await
        .unwrap();
    assert!(db.queue.find(variant).await.unwrap().unwrap().is_variant);

    assert!(db.queue.fetch_due(Some(db.tenant), 10).await.unwrap().is_empty());
    db.clock.advance(Duration::seconds(300));
    let due = db.queue.fetch_due(Some(db.tenant), 10).await.unwrap();
    assert_eq!(due.len(), 2);
    assert_eq!(due[0].id, id);
    assert_eq!(due[1].id, variant);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_claim_is_exclusive() {
    let db = TestDb::new().await;
    let id = db
        .queue
        .enqueue(db.tenant, ResourceId(1), "/uploads/a.png", Duration::zero())
        .await
        .unwrap();

    assert!(db.queue.mark_processing(id).await.unwrap());
    assert!(!db.queue.mark_processing(id).await.unwrap());
    assert!(db.queue.fetch_due(Some(db.tenant), 10).await.unwrap().is_empty());

    db.queue.complete(id).await.unwrap();
    assert!(db.queue.find(id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_failures_reschedule_then_park() {
    let db = TestDb::new().await;
    let id = db
        .queue
        .enqueue(db.tenant, ResourceId(2), "/uploads/b.png", Duration::zero())
        .await
        .unwrap();

    assert!(db.queue.mark_processing(id).await.unwrap());
    let status = db
        .queue
        .fail_and_reschedule(id, Duration::seconds(900), 2)
        .await
        .unwrap();
    assert_eq!(status, Some(JobStatus::Pending));

    let job = db.queue.find(id).await.unwrap().unwrap();
    assert_eq!(job.attempts, 1);
    assert_eq!(job.scheduled_time, db.clock.now() + Duration::seconds(900));

    db.clock.advance(Duration::seconds(900));
    assert!(db.queue.mark_processing(id).await.unwrap());
    let status = db
        .queue
        .fail_and_reschedule(id, Duration::seconds(900), 2)
        .await
        .unwrap();
    assert_eq!(status, Some(JobStatus::Failed));

    let counts = db.queue.count_by_status(Some(db.tenant)).await.unwrap();
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.pending, 0);

    // not processing any more
    assert_eq!(
        db.queue
            .fail_and_reschedule(id, Duration::seconds(900), 2)
            .await
            .unwrap(),
        None
    );

    let reset = db
        .queue
        .reset_failed(Some(db.tenant), Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(reset, 1);
    let job = db.queue.find(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.attempts, 0);
    assert_eq!(job.scheduled_time, db.clock.now() + Duration::seconds(60));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_cycle_lease() {
    let db = TestDb::new().await;
    let ttl = Duration::seconds(600);
    // step past any lease left behind by an aborted run
    db.clock.advance(Duration::days(365));

    assert!(db.queue.try_acquire_lease("cycle-a", ttl).await.unwrap());
    assert!(!db.queue.try_acquire_lease("cycle-b", ttl).await.unwrap());

    db.clock.advance(ttl);
    assert!(db.queue.try_acquire_lease("cycle-b", ttl).await.unwrap());

    // a stale holder cannot release someone else's lease
    db.queue.release_lease("cycle-a").await.unwrap();
    assert!(!db.queue.try_acquire_lease("cycle-c", ttl).await.unwrap());

    db.queue.release_lease("cycle-b").await.unwrap();
    assert!(db.queue.try_acquire_lease("cycle-c", ttl).await.unwrap());
    db.queue.release_lease("cycle-c").await.unwrap();
}
