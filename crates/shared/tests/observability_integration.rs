//! 可观测性模块集成测试
//!
//! 测试 metrics 记录函数与 HTTP 中间件的核心行为。

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use store_shared::observability::metrics::{
        record_http_request, record_order_created, record_order_transition,
        record_points_moved, record_topup_review,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/customer/orders", 200, 0.05);
        record_http_request("POST", "/api/topup", 201, 0.12);
        record_http_request("POST", "/api/seller/orders/{id}/accept", 409, 0.02);
        record_http_request("GET", "/api/admin/users", 403, 0.01);
    }

    #[test]
    fn test_record_business_metrics() {
        // 未安装 recorder 时记录操作为空操作，不应 panic
        record_order_created(1);
        record_order_transition("pending", "accepted");
        record_order_transition("in_progress", "completed");
        record_topup_review("top_up", "approved");
        record_topup_review("payout", "rejected");
        record_points_moved("earning", 400);
    }

    #[test]
    fn test_metrics_with_edge_cases() {
        record_http_request("", "", 0, 0.0);
        record_points_moved("refund", 0);
        record_points_moved("payment", i64::MAX);
    }
}

// ============================================================================
// 中间件测试
// ============================================================================

mod middleware_tests {
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use store_shared::observability::middleware::{http_tracing, request_id};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(http_tracing))
            .layer(middleware::from_fn(request_id))
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = app()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers().get("x-request-id").unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    }
}
