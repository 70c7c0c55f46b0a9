mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{create_test_app, hint_request, read_json, FakeGenerator};
use leetcode_hint_api::{
    models::hint::{HintType, OutputMode},
    services::{gemini_client::UpstreamError, prompt::build_prompt},
};
use reqwest::StatusCode as UpstreamStatus;
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn test_code_hint_success() {
    let fake = FakeGenerator::replying("x = 1  # init");
    let app = create_test_app(fake.clone());

    let response = app
        .oneshot(hint_request(json!({
            "hint_type": "code",
            "problem": "Two Sum",
            "code_so_far": "def twoSum(nums, target):\n"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({ "type": "code", "language": "python", "snippet": "x = 1  # init" })
    );
    assert_eq!(fake.call_count(), 1);

    let params = fake.params();
    assert_eq!(params[0].max_output_tokens, 150);
    assert!((params[0].temperature - 0.2).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_theory_hint_success() {
    let fake = FakeGenerator::replying("Use two pointers.");
    let app = create_test_app(fake.clone());

    let response = app
        .oneshot(hint_request(json!({
            "hint_type": "theory",
            "problem": "Container With Most Water",
            "code_so_far": ""
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({ "type": "theory", "message": "Use two pointers." })
    );
}

#[tokio::test]
async fn test_invalid_hint_type_never_reaches_provider() {
    for hint_type in ["Code", "pseudo", "", "theory "] {
        let fake = FakeGenerator::replying("should not be used");
        let app = create_test_app(fake.clone());

        let response = app
            .oneshot(hint_request(json!({
                "hint_type": hint_type,
                "problem": "Two Sum"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{:?}", hint_type);
        let json = read_json(response).await;
        assert_eq!(json["detail"], "hint_type must be 'code' or 'theory'.");
        assert_eq!(json["status"], 400);
        assert_eq!(fake.call_count(), 0);
    }
}

#[tokio::test]
async fn test_non_string_hint_type_gets_same_guidance() {
    for hint_type in [json!(5), json!(null), json!({ "kind": "code" })] {
        let fake = FakeGenerator::replying("should not be used");
        let app = create_test_app(fake.clone());

        let response = app
            .oneshot(hint_request(json!({
                "hint_type": hint_type,
                "problem": "Two Sum"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", hint_type);
        let json = read_json(response).await;
        assert_eq!(json["detail"], "hint_type must be 'code' or 'theory'.");
        assert_eq!(fake.call_count(), 0);
    }
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let fake = FakeGenerator::replying("unused");
    let app = create_test_app(fake.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/generate-hint")
                .header("origin", "https://leetcode.com")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success(), "{}", response.status());
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"), "{}", methods);
    let allowed = headers["access-control-allow-headers"].to_str().unwrap();
    assert!(allowed.to_ascii_lowercase().contains("content-type"), "{}", allowed);
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_upstream_failure_returns_500_with_cause() {
    let fake = FakeGenerator::failing(UpstreamError::Status {
        status: UpstreamStatus::FORBIDDEN,
        body: "API key not valid".to_string(),
    });
    let app = create_test_app(fake.clone());

    let response = app
        .oneshot(hint_request(json!({ "hint_type": "code", "problem": "Two Sum" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(response).await;
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.starts_with("Fake API error:"), "{}", detail);
    assert!(detail.contains("API key not valid"));
    assert!(json.get("type").is_none());

    // 403 is not transient, so no second attempt
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried_once() {
    let fake = FakeGenerator::scripted(vec![
        Err(UpstreamError::Status {
            status: UpstreamStatus::SERVICE_UNAVAILABLE,
            body: "overloaded".to_string(),
        }),
        Ok("Sort first, then sweep.".to_string()),
    ]);
    let app = create_test_app(fake.clone());

    let response = app
        .oneshot(hint_request(json!({ "hint_type": "theory", "problem": "3Sum" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["message"], "Sort first, then sweep.");
    assert_eq!(fake.call_count(), 2);
    assert_eq!(fake.prompts()[0], fake.prompts()[1]);
}

#[tokio::test]
async fn test_retry_budget_is_bounded() {
    let overloaded = || UpstreamError::Status {
        status: UpstreamStatus::TOO_MANY_REQUESTS,
        body: "quota".to_string(),
    };
    let fake = FakeGenerator::scripted(vec![
        Err(overloaded()),
        Err(overloaded()),
        Ok("never reached".to_string()),
    ]);
    let app = create_test_app(fake.clone());

    let response = app
        .oneshot(hint_request(json!({ "hint_type": "code", "problem": "3Sum" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(fake.call_count(), 2);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let fake = FakeGenerator::slow("too late", Duration::from_secs(10));
    let mut config = common::test_config();
    config.upstream_timeout_secs = 1;
    config.upstream_max_attempts = 1;
    let app = common::create_test_app_with_config(config, fake.clone());

    let response = app
        .oneshot(hint_request(json!({ "hint_type": "code", "problem": "Two Sum" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_missing_code_so_far_matches_empty_string() {
    let fake = FakeGenerator::scripted(vec![Ok("a".to_string()), Ok("b".to_string())]);
    let app = create_test_app(fake.clone());

    for body in [
        json!({ "hint_type": "code", "problem": "Two Sum" }),
        json!({ "hint_type": "code", "problem": "Two Sum", "code_so_far": "" }),
    ] {
        let response = app.clone().oneshot(hint_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let prompts = fake.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], prompts[1]);
    assert_eq!(prompts[0], build_prompt(HintType::Code, "Two Sum", ""));
}

#[tokio::test]
async fn test_provider_whitespace_is_trimmed() {
    let fake = FakeGenerator::replying("\n\n  Use a sliding window.  \n");
    let app = create_test_app(fake);

    let response = app
        .oneshot(hint_request(json!({ "hint_type": "theory", "problem": "Longest Substring" })))
        .await
        .unwrap();

    assert_eq!(read_json(response).await["message"], "Use a sliding window.");
}

#[tokio::test]
async fn test_structured_provider_output_is_unwrapped() {
    let fake = FakeGenerator::replying("```json\n{\"snippet\": \"left, right = 0, len(nums) - 1  # two pointers\"}\n```");
    let app = create_test_app(fake);

    let response = app
        .oneshot(hint_request(json!({ "hint_type": "code", "problem": "Two Sum II" })))
        .await
        .unwrap();

    assert_eq!(
        read_json(response).await,
        json!({
            "type": "code",
            "language": "python",
            "snippet": "left, right = 0, len(nums) - 1  # two pointers"
        })
    );
}

#[tokio::test]
async fn test_strict_mode_rejects_free_text() {
    let fake = FakeGenerator::replying("Here is a hint: use a stack.");
    let mut config = common::test_config();
    config.output_mode = OutputMode::Strict;
    let app = common::create_test_app_with_config(config, fake.clone());

    let response = app
        .oneshot(hint_request(json!({ "hint_type": "theory", "problem": "Valid Parentheses" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(read_json(response).await["detail"]
        .as_str()
        .unwrap()
        .contains("\"message\""));
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn test_control_characters_are_forwarded_verbatim() {
    let fake = FakeGenerator::replying("ok");
    let app = create_test_app(fake.clone());
    let problem = "Line1\r\nLine2\t\u{0001}";

    let response = app
        .oneshot(hint_request(json!({
            "hint_type": "theory",
            "problem": problem,
            "code_so_far": "print('\\x00')"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let sent: serde_json::Value = serde_json::from_str(&fake.prompts()[0].user_content).unwrap();
    assert_eq!(sent["problem"], problem);
    assert_eq!(sent["code_so_far"], "print('\\x00')");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let fake = FakeGenerator::replying("unused");
    let app = create_test_app(fake.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/generate-hint")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"hint_type": "code""#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(response).await["detail"].is_string());
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_health_and_trace_header() {
    let app = create_test_app(FakeGenerator::replying("unused"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-trace-id", "trace-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-trace-id"], "trace-42");

    let json = read_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["provider"], "Fake");
    assert_eq!(json["model"], "fake-model");
}

#[tokio::test]
async fn test_metrics_endpoint_reports_hints() {
    let app = create_test_app(FakeGenerator::replying("x = 1"));

    let response = app
        .clone()
        .oneshot(hint_request(json!({ "hint_type": "code", "problem": "p" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("hints_generated_total"));
    assert!(text.contains("/generate-hint"));
}
