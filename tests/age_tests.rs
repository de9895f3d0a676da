//! Age annotator tests against the in-memory fake store

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::FakeGmailClient;
use gmail_expiry::age::AgeAnnotator;
use gmail_expiry::client::INBOX_LABEL_ID;
use gmail_expiry::config::Config;
use std::sync::Arc;

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn annotator(fake: &Arc<FakeGmailClient>) -> AgeAnnotator {
    AgeAnnotator::new(fake.clone(), &Config::default())
}

fn seed_aged_thread(fake: &FakeGmailClient, id: &str, age_days: i64) {
    let last_message = fixed_now() - Duration::days(age_days);
    fake.seed_thread(id, &[INBOX_LABEL_ID], &[last_message]);
}

/// Age labels a thread currently holds
fn age_labels_of(fake: &FakeGmailClient, thread_id: &str) -> Vec<String> {
    let pattern = gmail_expiry::age::age_label_pattern("⌛/");
    fake.thread_label_names(thread_id)
        .into_iter()
        .filter(|name| pattern.is_match(name))
        .collect()
}

#[tokio::test]
async fn test_young_threads_stay_unannotated() {
    let fake = Arc::new(FakeGmailClient::new());
    seed_aged_thread(&fake, "young", 5);
    seed_aged_thread(&fake, "boundary", 20);

    let report = annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    assert_eq!(report.threads_scanned, 2);
    assert_eq!(report.threads_labeled, 0);
    assert!(age_labels_of(&fake, "young").is_empty());
    assert!(age_labels_of(&fake, "boundary").is_empty());
}

#[tokio::test]
async fn test_classification_boundaries() {
    let fake = Arc::new(FakeGmailClient::new());
    seed_aged_thread(&fake, "t21", 21);
    seed_aged_thread(&fake, "t30", 30);
    seed_aged_thread(&fake, "t31", 31);
    seed_aged_thread(&fake, "t364", 364);
    seed_aged_thread(&fake, "t365", 365);

    let report = annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    assert_eq!(report.threads_labeled, 5);
    assert_eq!(age_labels_of(&fake, "t21"), vec!["⌛/21d".to_string()]);
    assert_eq!(age_labels_of(&fake, "t30"), vec!["⌛/30d".to_string()]);
    assert_eq!(age_labels_of(&fake, "t31"), vec!["⌛/1m".to_string()]);
    assert_eq!(age_labels_of(&fake, "t364"), vec!["⌛/12m".to_string()]);
    assert_eq!(age_labels_of(&fake, "t365"), vec!["⌛/1y".to_string()]);
}

#[tokio::test]
async fn test_threads_with_equal_age_share_one_label() {
    let fake = Arc::new(FakeGmailClient::new());
    seed_aged_thread(&fake, "a", 40);
    seed_aged_thread(&fake, "b", 40);

    annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    // One label, two threads; no duplicate label created
    let count = fake
        .label_names()
        .iter()
        .filter(|n| n.as_str() == "⌛/40d")
        .count();
    assert_eq!(count, 1);
    assert_eq!(fake.threads_with_label_name("⌛/40d").len(), 2);
}

#[tokio::test]
async fn test_sweep_removes_stale_labels_system_wide() {
    let fake = Arc::new(FakeGmailClient::new());

    // Leftovers from a previous run: one still attached, one empty
    let stale_attached = fake.seed_label("⌛/9d");
    fake.seed_label("⌛/5m");
    let last_message = fixed_now() - Duration::days(40);
    fake.seed_thread("t", &[INBOX_LABEL_ID, &stale_attached], &[last_message]);

    let report = annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    assert_eq!(report.labels_swept, 2);

    // Old annotations are gone everywhere, replaced by the fresh bucket
    let names = fake.label_names();
    assert!(!names.contains(&"⌛/9d".to_string()));
    assert!(!names.contains(&"⌛/5m".to_string()));
    assert_eq!(age_labels_of(&fake, "t"), vec!["⌛/40d".to_string()]);
}

#[tokio::test]
async fn test_sweep_leaves_foreign_labels_alone() {
    let fake = Arc::new(FakeGmailClient::new());
    fake.seed_label("x3");
    fake.seed_label("auto-archived");
    fake.seed_label("⌛/not-a-bucket");

    let report = annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    assert_eq!(report.labels_swept, 0);
    let names = fake.label_names();
    assert!(names.contains(&"x3".to_string()));
    assert!(names.contains(&"auto-archived".to_string()));
    assert!(names.contains(&"⌛/not-a-bucket".to_string()));
}

#[tokio::test]
async fn test_every_age_label_has_a_qualifying_thread() {
    let fake = Arc::new(FakeGmailClient::new());
    seed_aged_thread(&fake, "t50", 50);
    seed_aged_thread(&fake, "t400", 400);
    seed_aged_thread(&fake, "fresh", 3);

    annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    let pattern = gmail_expiry::age::age_label_pattern("⌛/");
    for name in fake.label_names() {
        if pattern.is_match(&name) {
            assert!(
                !fake.threads_with_label_name(&name).is_empty(),
                "age label '{}' has no qualifying thread",
                name
            );
        }
    }

    // And no thread holds more than one age label
    for id in ["t50", "t400", "fresh"] {
        assert!(age_labels_of(&fake, id).len() <= 1);
    }
}

#[tokio::test]
async fn test_thread_without_messages_is_skipped() {
    let fake = Arc::new(FakeGmailClient::new());
    fake.seed_thread("empty", &[INBOX_LABEL_ID], &[]);
    seed_aged_thread(&fake, "normal", 25);

    let report = annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    assert_eq!(report.threads_scanned, 2);
    assert_eq!(report.threads_labeled, 1);
    assert!(age_labels_of(&fake, "empty").is_empty());
}

#[tokio::test]
async fn test_non_inbox_threads_are_not_annotated() {
    let fake = Arc::new(FakeGmailClient::new());
    let last_message = fixed_now() - Duration::days(100);
    fake.seed_thread("archived", &[], &[last_message]);

    let report = annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    assert_eq!(report.threads_scanned, 0);
    assert!(age_labels_of(&fake, "archived").is_empty());
}

#[tokio::test]
async fn test_age_uses_most_recent_message() {
    let fake = Arc::new(FakeGmailClient::new());
    let old = fixed_now() - Duration::days(200);
    let recent = fixed_now() - Duration::days(35);
    fake.seed_thread("t", &[INBOX_LABEL_ID], &[old, recent]);

    annotator(&fake)
        .annotate_at(fixed_now(), None)
        .await
        .unwrap();

    // 35 days, not 200: the newest message drives the bucket
    assert_eq!(age_labels_of(&fake, "t"), vec!["⌛/1m".to_string()]);
}

#[tokio::test]
async fn test_rerun_replaces_outdated_annotation() {
    let fake = Arc::new(FakeGmailClient::new());
    seed_aged_thread(&fake, "t", 30);

    let annotator = annotator(&fake);
    annotator.annotate_at(fixed_now(), None).await.unwrap();
    assert_eq!(age_labels_of(&fake, "t"), vec!["⌛/30d".to_string()]);

    // Five days later the same thread lands in the month bucket
    let later = fixed_now() + Duration::days(5);
    annotator.annotate_at(later, None).await.unwrap();

    assert_eq!(age_labels_of(&fake, "t"), vec!["⌛/1m".to_string()]);
}
