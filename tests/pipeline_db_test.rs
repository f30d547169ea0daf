//! Pipeline tests against a live PostgreSQL store.
//!
//! These are ignored by default; run them with a database available:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/alfanumrik_test cargo test -- --ignored
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use sqlx::{PgPool, Row};
use tower::ServiceExt;

use alfanumrik_backend::db::operations::content::{cache_key, enqueue_request, NewContentRequest};
use alfanumrik_backend::db::DatabaseProxy;
use alfanumrik_backend::routes;
use alfanumrik_backend::services::content_provider::ContentProvider;
use alfanumrik_backend::services::notifier::NotificationChannel;
use alfanumrik_backend::state::AppState;
use alfanumrik_backend::workers;

async fn connect() -> Arc<DatabaseProxy> {
    DatabaseProxy::from_env()
        .await
        .expect("DATABASE_URL must point at a live PostgreSQL instance")
}

fn test_app(db: Arc<DatabaseProxy>) -> axum::Router {
    std::env::set_var("CONTENT_PROVIDER_MOCK", "true");
    std::env::set_var("NOTIFY_CHANNEL", "mock");
    let state = AppState::new(
        Some(db),
        Arc::new(ContentProvider::from_env()),
        Arc::new(NotificationChannel::from_env()),
    );
    routes::router(state)
}

async fn post_json(app: &axum::Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn seed_session(pool: &PgPool, student_id: &str) -> (String, String, String) {
    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        r#"INSERT INTO "practice_sessions" ("id", "studentId", "status", "updatedAt") VALUES ($1, $2, 'active', $3)"#,
    )
    .bind(&session_id)
    .bind(student_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap();

    let mut question_ids = Vec::new();
    for (position, correct) in [(0, "B"), (1, "C")] {
        let question_id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO "practice_questions" ("id", "sessionId", "position", "prompt", "correctOption")
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&question_id)
        .bind(&session_id)
        .bind(position)
        .bind(format!("question {position}"))
        .bind(correct)
        .execute(pool)
        .await
        .unwrap();
        question_ids.push(question_id);
    }

    (session_id, question_ids.remove(0), question_ids.remove(0))
}

async fn session_counters(pool: &PgPool, session_id: &str) -> (i32, i32, i32, String) {
    let row = sqlx::query(
        r#"
        SELECT "totalQuestions", "correctAnswers", "rewardPoints", "status"
        FROM "practice_sessions"
        WHERE "id" = $1
        "#,
    )
    .bind(session_id)
    .fetch_one(pool)
    .await
    .unwrap();

    (
        row.try_get("totalQuestions").unwrap(),
        row.try_get("correctAnswers").unwrap(),
        row.try_get("rewardPoints").unwrap(),
        row.try_get("status").unwrap(),
    )
}

#[tokio::test]
#[ignore]
async fn practice_session_grades_counts_and_completes() {
    let db = connect().await;
    let pool = db.pool().clone();
    let app = test_app(Arc::clone(&db));

    let student_id = format!("student-{}", uuid::Uuid::new_v4());
    let (session_id, q1, q2) = seed_session(&pool, &student_id).await;

    // Correct answer: reward 10, correct count moves, next question handed back.
    let (status, body) = post_json(
        &app,
        "/api/practice/answer",
        serde_json::json!({
            "student_id": student_id,
            "session_id": session_id,
            "question_id": q1,
            "answer": "B",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isCorrect"], true);
    assert_eq!(body["correct_answer"], "B");
    assert_eq!(body["nextQuestion"]["id"], serde_json::json!(q2));

    let (total, correct, reward, session_status) = session_counters(&pool, &session_id).await;
    assert_eq!((total, correct, reward), (1, 1, 10));
    assert_eq!(session_status, "active");

    // Wrong answer on the last question: total moves, correct does not, and
    // the session completes with a message instead of an error.
    let (status, body) = post_json(
        &app,
        "/api/practice/answer",
        serde_json::json!({
            "student_id": student_id,
            "session_id": session_id,
            "question_id": q2,
            "answer": "A",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isCorrect"], false);
    assert_eq!(body["message"], "Session complete");
    assert!(body.get("nextQuestion").is_none());

    let (total, correct, reward, session_status) = session_counters(&pool, &session_id).await;
    assert_eq!((total, correct, reward), (2, 1, 10));
    assert_eq!(session_status, "completed");

    // Graded questions are terminal: resubmission is rejected and counters hold.
    let (status, body) = post_json(
        &app,
        "/api/practice/answer",
        serde_json::json!({
            "student_id": student_id,
            "session_id": session_id,
            "question_id": q1,
            "answer": "B",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (total, correct, reward, _) = session_counters(&pool, &session_id).await;
    assert_eq!((total, correct, reward), (2, 1, 10));
}

#[tokio::test]
#[ignore]
async fn content_queue_serves_second_request_from_cache() {
    std::env::set_var("CONTENT_PROVIDER_MOCK", "true");
    let db = connect().await;
    let pool = db.pool().clone();
    let provider = Arc::new(ContentProvider::from_env());

    // Unique skill per run so earlier runs cannot satisfy the cache.
    let skill = format!("fractions-{}", uuid::Uuid::new_v4());
    let org_id = format!("org-{}", uuid::Uuid::new_v4());

    for student in ["s1", "s2"] {
        let inserted = enqueue_request(
            &pool,
            &NewContentRequest {
                org_id: &org_id,
                requested_by: &format!("{student}-{org_id}"),
                request_type: "practice_set",
                grade: "9",
                subject: "math",
                skill: &skill,
                difficulty: "Hard",
                language: "en",
                prompt: None,
                preferred_provider: None,
            },
        )
        .await
        .unwrap();
        assert!(inserted);
    }

    workers::drain_content_queue(Arc::clone(&db), Arc::clone(&provider))
        .await
        .unwrap();

    let items = sqlx::query(
        r#"SELECT "providerUsed", "cachedFrom" FROM "content_items" WHERE "skill" = $1 ORDER BY "createdAt""#,
    )
    .bind(&skill)
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].try_get::<String, _>("providerUsed").unwrap(), "fast");
    assert!(!items[0].try_get::<bool, _>("cachedFrom").unwrap());
    assert_eq!(items[1].try_get::<String, _>("providerUsed").unwrap(), "cache");
    assert!(items[1].try_get::<bool, _>("cachedFrom").unwrap());

    let statuses: Vec<String> = sqlx::query_scalar(
        r#"SELECT "status" FROM "content_requests" WHERE "skill" = $1"#,
    )
    .bind(&skill)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(statuses, vec!["ready".to_string(), "ready".to_string()]);

    let key = cache_key("9", "math", &skill, "Hard", "practice_set", "en");
    let cache_rows: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM "content_cache" WHERE "cacheKey" = $1"#)
            .bind(&key)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(cache_rows, 1);

    // Draining an already-empty queue is a no-op: no second item per request.
    workers::drain_content_queue(Arc::clone(&db), provider)
        .await
        .unwrap();

    let item_count: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM "content_items" WHERE "skill" = $1"#)
            .bind(&skill)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(item_count, 2);
}

#[tokio::test]
#[ignore]
async fn queued_pair_is_enqueued_once() {
    let db = connect().await;
    let pool = db.pool().clone();

    let skill = format!("decimals-{}", uuid::Uuid::new_v4());
    let student = format!("student-{}", uuid::Uuid::new_v4());
    let request = NewContentRequest {
        org_id: "org-idem",
        requested_by: &student,
        request_type: "practice_set",
        grade: "7",
        subject: "math",
        skill: &skill,
        difficulty: "Medium",
        language: "en",
        prompt: None,
        preferred_provider: None,
    };

    assert!(enqueue_request(&pool, &request).await.unwrap());
    assert!(!enqueue_request(&pool, &request).await.unwrap());

    let queued: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM "content_requests" WHERE "requestedBy" = $1 AND "skill" = $2"#,
    )
    .bind(&student)
    .bind(&skill)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(queued, 1);
}
