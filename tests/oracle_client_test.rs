//! Tests for bounded oracle requests and the HTTP move-service adapter.

mod common;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::{Behavior, ScriptedOracle, client};
use std::sync::Arc;
use std::time::Duration;
use strictly_chess::{
    HttpOracle, OracleClient, OracleErrorKind, OracleRequest, OracleRequestPayload, OracleResponse,
    OracleResponsePayload, OracleStatus, Position, Side, rules,
};

fn after_e4() -> Position {
    rules::apply(&Position::new(), "e2e4".parse().unwrap()).unwrap()
}

/// Serves `app` on an ephemeral port and returns the move endpoint URL.
async fn spawn_service(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/move", addr)
}

fn http_client(url: &str) -> OracleClient {
    OracleClient::new(Arc::new(HttpOracle::new(url)), Duration::from_secs(5))
}

#[tokio::test]
async fn test_scripted_success() {
    let oracle = ScriptedOracle::replying(&["  \"e7e5\"\n"]);
    let request = OracleRequest::for_position(&after_e4());
    let response = client(&oracle, Duration::from_secs(1))
        .request_move(&request)
        .await;
    assert_eq!(response.success(), Some("e7e5".parse().unwrap()));
}

#[tokio::test]
async fn test_timeout_is_failure() {
    let oracle = ScriptedOracle::new([Behavior::Hang]);
    let request = OracleRequest::for_position(&after_e4());
    let response = client(&oracle, Duration::from_millis(30))
        .request_move(&request)
        .await;
    match response {
        OracleResponse::Failure(e) => {
            assert!(e.is_timeout());
            assert_eq!(e.kind, OracleErrorKind::Timeout(30));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_silence_is_invalid_suggestion() {
    let oracle = ScriptedOracle::new([Behavior::Silent]);
    let request = OracleRequest::for_position(&Position::new());
    let response = client(&oracle, Duration::from_secs(1))
        .request_move(&request)
        .await;
    assert!(matches!(
        response,
        OracleResponse::InvalidSuggestion { suggestion: None }
    ));
}

#[tokio::test]
async fn test_no_legal_moves_skips_backend() {
    let oracle = ScriptedOracle::new([]);
    let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let request = OracleRequest::for_position(&stalemate);
    let response = client(&oracle, Duration::from_secs(1))
        .request_move(&request)
        .await;
    assert!(matches!(response, OracleResponse::NoLegalMoves));
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn test_http_service_receives_full_request() {
    async fn last_legal(Json(payload): Json<OracleRequestPayload>) -> Json<OracleResponsePayload> {
        assert_eq!(payload.side_to_move, Side::Second);
        assert_eq!(payload.legal_moves.len(), 20);
        Json(OracleResponsePayload {
            mv: payload.legal_moves.last().cloned(),
            status: OracleStatus::Success,
        })
    }
    let url = spawn_service(Router::new().route("/move", post(last_legal))).await;

    let request = OracleRequest::for_position(&after_e4());
    let expected = *request.legal_moves().last().unwrap();
    let response = http_client(&url).request_move(&request).await;
    assert_eq!(response.success(), Some(expected));
}

#[tokio::test]
async fn test_http_illegal_suggestion() {
    let app = Router::new().route(
        "/move",
        post(|| async {
            Json(OracleResponsePayload {
                mv: Some("e2e4".into()),
                status: OracleStatus::Success,
            })
        }),
    );
    let url = spawn_service(app).await;

    let request = OracleRequest::for_position(&after_e4());
    let response = http_client(&url).request_move(&request).await;
    assert!(matches!(
        response,
        OracleResponse::InvalidSuggestion {
            suggestion: Some(ref s)
        } if s == "e2e4"
    ));
}

#[tokio::test]
async fn test_http_statuses() {
    let app = Router::new()
        .route(
            "/move",
            post(|| async {
                Json(OracleResponsePayload {
                    mv: None,
                    status: OracleStatus::InvalidMoveSuggested,
                })
            }),
        )
        .route(
            "/error/move",
            post(|| async {
                Json(OracleResponsePayload {
                    mv: Some("model overloaded".into()),
                    status: OracleStatus::Error,
                })
            }),
        );
    let url = spawn_service(app).await;
    let request = OracleRequest::for_position(&Position::new());

    let flagged = http_client(&url).request_move(&request).await;
    assert!(matches!(
        flagged,
        OracleResponse::InvalidSuggestion { suggestion: None }
    ));

    let error_url = url.replace("/move", "/error/move");
    match http_client(&error_url).request_move(&request).await {
        OracleResponse::Failure(e) => {
            assert_eq!(e.kind, OracleErrorKind::Service("model overloaded".into()))
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_server_error_is_transport_failure() {
    let app = Router::new().route(
        "/move",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = spawn_service(app).await;
    let request = OracleRequest::for_position(&Position::new());

    match http_client(&url).request_move(&request).await {
        OracleResponse::Failure(e) => assert!(matches!(e.kind, OracleErrorKind::Transport(_))),
        other => panic!("expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_garbage_body_is_malformed() {
    let app = Router::new().route("/move", post(|| async { "bestmove e2e4" }));
    let url = spawn_service(app).await;
    let request = OracleRequest::for_position(&Position::new());

    match http_client(&url).request_move(&request).await {
        OracleResponse::Failure(e) => assert!(matches!(e.kind, OracleErrorKind::Malformed(_))),
        other => panic!("expected malformed response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_service() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let request = OracleRequest::for_position(&Position::new());
    let response = http_client(&format!("http://{}/move", addr))
        .request_move(&request)
        .await;
    assert!(matches!(response, OracleResponse::Failure(_)));
}
