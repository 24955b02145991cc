//! Analytics API tests: heatmap, insights, cleanup.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL before running.

mod common;

use axum_test::TestServer;

use common::fixtures;
use common::TestContext;

/// Two students at 40 and 60 average to 50; entries sort descending.
#[tokio::test]
#[ignore = "requires database"]
async fn test_heatmap_averages_across_students() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let course_id = fixtures::unique_course_id("course");

    ctx.seed_mastery_row(&course_id, "alice", "Binary Search Tree", 40.0, 3)
        .await;
    ctx.seed_mastery_row(&course_id, "bob", "Binary Search Tree", 60.0, 5)
        .await;
    ctx.seed_mastery_row(&course_id, "alice", "Gradient Descent", 90.0, 2)
        .await;

    let response = server
        .get(&format!("/api/analytics/heatmap/{course_id}"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert_eq!(body["total_concepts"].as_u64().unwrap(), 2);
    assert_eq!(body["total_students"].as_u64().unwrap(), 2);

    let entries = body["heatmap_data"].as_array().unwrap();
    assert_eq!(entries[0]["concept"], "Gradient Descent");
    assert_eq!(entries[1]["concept"], "Binary Search Tree");
    assert_eq!(entries[1]["mastery"].as_f64().unwrap(), 50.0);
    assert_eq!(entries[1]["interactions"].as_i64().unwrap(), 8);
    assert_eq!(entries[1]["students"].as_u64().unwrap(), 2);

    ctx.cleanup_course(&course_id).await;
}

/// Legacy stopword rows are filtered out of the read model without mutation.
#[tokio::test]
#[ignore = "requires database"]
async fn test_heatmap_filters_legacy_rows_defensively() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let course_id = fixtures::unique_course_id("course");

    ctx.seed_mastery_row(&course_id, "alice", "what", 95.0, 9).await;
    ctx.seed_mastery_row(&course_id, "alice", "the system", 80.0, 4)
        .await;
    ctx.seed_mastery_row(&course_id, "alice", "Hash Table", 55.0, 2)
        .await;

    let body: serde_json::Value = server
        .get(&format!("/api/analytics/heatmap/{course_id}"))
        .await
        .json();

    assert_eq!(body["total_concepts"].as_u64().unwrap(), 1);
    assert_eq!(body["heatmap_data"][0]["concept"], "Hash Table");

    // Reading filtered the rows but did not delete them.
    assert_eq!(ctx.count_mastery_rows(&course_id).await, 3);

    ctx.cleanup_course(&course_id).await;
}

/// Aggregation is idempotent: identical output for identical state.
#[tokio::test]
#[ignore = "requires database"]
async fn test_heatmap_is_idempotent() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let course_id = fixtures::unique_course_id("course");

    ctx.seed_mastery_row(&course_id, "alice", "Hash Table", 50.0, 1)
        .await;
    ctx.seed_mastery_row(&course_id, "bob", "Linked List", 50.0, 2)
        .await;

    let first: serde_json::Value = server
        .get(&format!("/api/analytics/heatmap/{course_id}"))
        .await
        .json();
    let second: serde_json::Value = server
        .get(&format!("/api/analytics/heatmap/{course_id}"))
        .await
        .json();

    assert_eq!(first, second);

    ctx.cleanup_course(&course_id).await;
}

/// Cleanup deletes exactly the rows that fail the concept filter.
#[tokio::test]
#[ignore = "requires database"]
async fn test_cleanup_removes_invalid_rows() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let course_id = fixtures::unique_course_id("course");

    ctx.seed_mastery_row(&course_id, "alice", "what", 10.0, 1).await;
    ctx.seed_mastery_row(&course_id, "alice", "data", 20.0, 1).await;
    ctx.seed_mastery_row(&course_id, "bob", "Binary Search Tree", 70.0, 6)
        .await;

    let response = server
        .post(&format!("/api/analytics/cleanup/{course_id}"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["deleted_count"].as_u64().unwrap(), 2);

    assert_eq!(ctx.count_mastery_rows(&course_id).await, 1);

    // A second pass finds nothing left to delete.
    let again: serde_json::Value = server
        .post(&format!("/api/analytics/cleanup/{course_id}"))
        .await
        .json();
    assert_eq!(again["deleted_count"].as_u64().unwrap(), 0);

    ctx.cleanup_course(&course_id).await;
}

/// The insight view cross-references quiz history, chat history, and mastery.
#[tokio::test]
#[ignore = "requires database"]
async fn test_insights_combine_quiz_chat_and_mastery() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let course_id = fixtures::unique_course_id("course");
    ctx.seed_material(&course_id, "Lecture 1", &fixtures::sample_material_content())
        .await;

    // 4/5 on one topic, 1/5 on another.
    server
        .post("/api/interactions/quiz")
        .json(&fixtures::quiz_request(&course_id, "student-1", "Binary Search Tree", 4, 1))
        .await
        .assert_status_ok();
    server
        .post("/api/interactions/quiz")
        .json(&fixtures::quiz_request(&course_id, "student-1", "Gradient Descent", 1, 4))
        .await
        .assert_status_ok();
    server
        .post("/api/interactions/message")
        .json(&fixtures::message_request(
            &course_id,
            "student-1",
            "Why does gradient descent oscillate near minima?",
        ))
        .await
        .assert_status_ok();

    let response = server
        .get(&format!(
            "/api/analytics/insights/{course_id}?student_id=student-1"
        ))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert_eq!(body["total_quizzes"].as_u64().unwrap(), 2);
    assert_eq!(body["total_questions_asked"].as_u64().unwrap(), 1);
    // 5 of 10 answers correct overall.
    assert_eq!(body["avg_quiz_score"].as_i64().unwrap(), 50);

    let by_topic = body["quiz_by_topic"].as_array().unwrap();
    assert_eq!(by_topic[0]["topic"], "Binary Search Tree");
    assert_eq!(by_topic[0]["score"].as_i64().unwrap(), 80);
    assert_eq!(by_topic[1]["topic"], "Gradient Descent");
    assert_eq!(by_topic[1]["score"].as_i64().unwrap(), 20);

    // Gradient Descent sits below 40 after one weak quiz plus one question.
    let weak: Vec<String> = body["weak_concepts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(weak.contains(&"Gradient Descent".to_string()));

    assert_eq!(body["activity_streak"].as_array().unwrap().len(), 7);
    assert!(body["activity_streak"][6]["active"].as_bool().unwrap());

    ctx.cleanup_course(&course_id).await;
}
