use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

fn exam_payload() -> serde_json::Value {
    json!({
        "facilitator": "Laura Diaz",
        "facilitator_id": "1234567",
        "course": "Algebra I",
        "questions": [
            {"title": "2 + 2", "variant": "multiple", "options": ["3", "4"], "correct": 1},
            {"title": "Primes", "variant": "check", "options": ["2", "4", "5"], "correct": [0, 2]},
            {"title": "Comments", "variant": "text"}
        ],
        "metadata": {"date": "2025-03-01", "duration": "60"}
    })
}

#[tokio::test]
async fn create_then_fetch_public_view() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/exams", Some(exam_payload())))
        .await
        .expect("create exam");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = test_support::read_json(response).await;
    let exam_id = created["exam"]["id"].as_str().expect("exam id").to_string();
    assert_eq!(created["exam_url"], format!("http://exams.test/api/v1/exams/{exam_id}"));

    let fixed = ctx.state.assembler().fixed().len();
    assert_eq!(created["exam"]["fixed_count"], fixed);
    assert_eq!(created["exam"]["questions"][fixed]["correct"], 1);

    let exam_path = created["exam_url"]
        .as_str()
        .and_then(|url| url.strip_prefix("http://exams.test"))
        .expect("exam url path")
        .to_string();
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &exam_path, None))
        .await
        .expect("get exam");
    assert_eq!(response.status(), StatusCode::OK);
    let public = test_support::read_json(response).await;
    let questions = public["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), fixed + 3);
    assert!(questions.iter().all(|question| question.get("correct").is_none()));
    assert_eq!(questions[fixed + 1]["variant"], "check");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/exams", None))
        .await
        .expect("list exams");
    let summaries = test_support::read_json(response).await;
    assert_eq!(summaries.as_array().map(Vec::len), Some(1));
    assert_eq!(summaries[0]["question_count"], fixed + 3);
}

#[tokio::test]
async fn invalid_question_reports_index_and_field() {
    let ctx = test_support::setup_test_context().await;
    let mut payload = exam_payload();
    payload["questions"][2] = json!({"title": "Bad", "variant": "true_false", "correct": 3});

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/exams", Some(payload)))
        .await
        .expect("create exam");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["field"], "questions[2].correct");
}

#[tokio::test]
async fn update_and_duplicate_keep_the_fixed_prefix() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/exams", Some(exam_payload())))
        .await
        .expect("create exam");
    let created = test_support::read_json(response).await;
    let exam_id = created["exam"]["id"].as_str().expect("exam id").to_string();
    let fixed = ctx.state.assembler().fixed().len();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/exams/{exam_id}"),
            Some(json!({"questions": [{"title": "Only", "variant": "text"}]})),
        ))
        .await
        .expect("update exam");
    assert_eq!(response.status(), StatusCode::OK);
    let updated = test_support::read_json(response).await;
    assert_eq!(updated["exam"]["questions"].as_array().map(Vec::len), Some(fixed + 1));
    assert_eq!(updated["exam"]["created_at"], created["exam"]["created_at"]);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/duplicate"),
            None,
        ))
        .await
        .expect("duplicate exam");
    assert_eq!(response.status(), StatusCode::CREATED);
    let copy = test_support::read_json(response).await;
    assert_ne!(copy["exam"]["id"], updated["exam"]["id"]);
    assert_eq!(copy["exam"]["questions"], updated["exam"]["questions"]);
}

#[tokio::test]
async fn unknown_exam_returns_404() {
    let ctx = test_support::setup_test_context().await;

    for uri in ["/api/v1/exams/not-an-id", "/api/v1/exams/0123456789abcdef0123456789abcdef"] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, uri, None))
            .await
            .expect("get exam");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = test_support::read_json(response).await;
        assert_eq!(body["status"], 404);
    }
}
