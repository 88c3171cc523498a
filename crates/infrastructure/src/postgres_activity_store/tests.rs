use chrono::{Duration, Utc};
use quotaguard_application::{ActivityLog, EventCountQuery, EventCounter};
use quotaguard_domain::{ActionKind, ActivityEvent, Scope, ScopeName, SubjectId};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresActivityStore;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres activity store tests: {error}");
    }

    Some(pool)
}

fn unique_subject() -> SubjectId {
    SubjectId::new(format!("User-{}", Uuid::new_v4())).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn counts_with_scope_and_content_filters() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let store = PostgresActivityStore::new(pool);
    let subject_id = unique_subject();
    let now = Utc::now();
    let news = Scope::community("News").unwrap_or_else(|_| unreachable!());

    for (scope, content, offset) in [
        (news.clone(), "https://example.com/a", Duration::minutes(5)),
        (news.clone(), "https://example.com/b", Duration::hours(3)),
        (Scope::Global, "https://EXAMPLE.com/a", Duration::hours(1)),
        (news.clone(), "https://example.com/a", Duration::hours(30)),
    ] {
        let event = ActivityEvent::new(
            ActionKind::Submission,
            subject_id.clone(),
            scope,
            Some(content.to_owned()),
            now - offset,
        );
        assert!(store.record(&event).await.is_ok());
    }

    let upper_subject =
        SubjectId::new(subject_id.as_str().to_uppercase()).unwrap_or_else(|_| unreachable!());
    let base = EventCountQuery {
        action_kind: ActionKind::Submission,
        subject_id: upper_subject,
        from: now - Duration::hours(24),
        to: now,
        scope: None,
        content_equals: None,
    };

    assert_eq!(store.count(&base).await.ok(), Some(3));

    let scoped = EventCountQuery {
        scope: Some(ScopeName::new("news").unwrap_or_else(|_| unreachable!())),
        ..base.clone()
    };
    assert_eq!(store.count(&scoped).await.ok(), Some(2));

    let same_link = EventCountQuery {
        content_equals: Some("https://example.com/A".to_owned()),
        ..base
    };
    assert_eq!(store.count(&same_link).await.ok(), Some(2));
}

#[tokio::test]
async fn purge_removes_only_events_before_cutoff() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let store = PostgresActivityStore::new(pool);
    let subject_id = unique_subject();
    let now = Utc::now();

    for offset in [Duration::days(3), Duration::minutes(1)] {
        let event = ActivityEvent::new(
            ActionKind::Comment,
            subject_id.clone(),
            Scope::Global,
            None,
            now - offset,
        );
        assert!(store.record(&event).await.is_ok());
    }

    let purged = store.purge_before(now - Duration::days(1)).await;
    assert!(purged.is_ok_and(|count| count >= 1));

    let query = EventCountQuery {
        action_kind: ActionKind::Comment,
        subject_id,
        from: now - Duration::days(7),
        to: now,
        scope: None,
        content_equals: None,
    };
    assert_eq!(store.count(&query).await.ok(), Some(1));
}
