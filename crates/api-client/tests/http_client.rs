use api_client::{
    ApiClient, ApiError, HistorySource, HttpClient, HttpHistorySource, Query, Session, SessionState,
};
use configuration::ApiConfig;
use core_types::{AccountType, StrategyStatus, TradeAction, TradeStatus};
use mockito::{Matcher, Server};
use rust_decimal_macros::dec;
use serde_json::json;

fn client_for(server: &Server, session: Session) -> HttpClient {
    let config = ApiConfig {
        base_url: server.url(),
        max_pages: 3,
        ..Default::default()
    };
    HttpClient::new(&config, session).unwrap()
}

#[tokio::test]
async fn decodes_a_bare_array() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/trades/trades/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": 1, "symbol": "600519", "action": "BUY", "status": "filled", "pnl": "10.5"},
                {"id": 2, "symbol": "000001", "action": "SELL", "status": "pending", "pnl": null}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, Session::new());
    let trades = client.fetch_trades(&Query::new()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].action, Some(TradeAction::Buy));
    assert_eq!(trades[0].pnl.value(), dec!(10.5));
    assert_eq!(trades[1].status, Some(TradeStatus::Pending));
}

#[tokio::test]
async fn follows_next_links_across_pages() {
    let mut server = Server::new_async().await;
    let next = format!("{}/strategies/?page=2", server.url());

    let first = server
        .mock("GET", "/strategies/")
        .match_query(Matcher::UrlEncoded("status".into(), "active".into()))
        .with_status(200)
        .with_body(
            json!({"count": 3, "next": next, "previous": null,
                   "results": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]})
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/strategies/")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(
            json!({"count": 3, "next": null, "previous": null, "results": [{"id": 3, "name": "c"}]})
                .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, Session::new());
    let strategies = client
        .fetch_strategies(&Query::new().strategy_status(StrategyStatus::Active))
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let names: Vec<_> = strategies.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn stops_at_the_page_limit() {
    let mut server = Server::new_async().await;
    let next = format!("{}/agents/status/?page=2", server.url());

    // Every page points at another one; the client must give up after `max_pages`.
    let mock = server
        .mock("GET", "/agents/status/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"count": 99, "next": next, "results": [{"id": 1}]}).to_string())
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server, Session::new());
    let agents = client.fetch_agent_statuses(&Query::new()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(agents.len(), 3);
}

#[tokio::test]
async fn first_page_only_ignores_next_links() {
    let mut server = Server::new_async().await;
    let next = format!("{}/trades/trades/?page=2&page_size=2", server.url());

    let mock = server
        .mock("GET", "/trades/trades/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"count": 40, "next": next, "previous": null,
                   "results": [{"id": 1, "symbol": "600519"}, {"id": 2, "symbol": "000001"}]})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, Session::new());
    let query = Query::new().ordering("-order_time").page_size(2).first_page_only();
    let trades = client.fetch_trades(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(trades.len(), 2);
}

#[tokio::test]
async fn sends_the_session_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/trades/portfolio/")
        .match_query(Matcher::Any)
        .match_header("authorization", "Token abc123")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server, Session::with_token("abc123"));
    let portfolios = client.fetch_portfolios(&Query::new()).await.unwrap();

    mock.assert_async().await;
    assert!(portfolios.is_empty());
}

#[tokio::test]
async fn anonymous_requests_carry_no_authorization_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/trades/portfolio/")
        .match_query(Matcher::Any)
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server, Session::new());
    client.fetch_portfolios(&Query::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn unauthorized_expires_the_session() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/trades/positions/")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"detail": "Invalid token."}"#)
        .create_async()
        .await;

    let session = Session::with_token("stale");
    let client = client_for(&server, session.clone());
    let err = client.fetch_positions(&Query::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(session.state(), SessionState::Expired);
    assert_eq!(session.token(), None);
}

#[tokio::test]
async fn server_errors_surface_status_and_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/reports/reviews/")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = client_for(&server, Session::new());
    let err = client.fetch_review_reports(&Query::new()).await.unwrap_err();

    match err {
        ApiError::Status { status, ref body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn malformed_records_are_skipped() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/trades/positions/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([
                {"id": 1, "symbol": "600519", "unrealized_pnl": "12.00"},
                "not a record",
                {"id": 3, "symbol": 42},
                {"id": 4, "symbol": "000001"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, Session::new());
    let positions = client.fetch_positions(&Query::new()).await.unwrap();

    let ids: Vec<_> = positions.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 4]);
}

#[tokio::test]
async fn passes_filters_as_query_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/trades/trades/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("ordering".into(), "-order_time".into()),
            Matcher::UrlEncoded("account_type".into(), "simulation".into()),
            Matcher::UrlEncoded("page_size".into(), "10".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server, Session::new());
    let query = Query::new()
        .ordering("-order_time")
        .account_type(AccountType::Simulation)
        .page_size(10);
    client.fetch_trades(&query).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn history_source_returns_points_oldest_first() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/history/equity/")
        .match_query(Matcher::UrlEncoded("account_type".into(), "real".into()))
        .with_status(200)
        .with_body(
            json!([
                {"timestamp": "2024-11-20T00:00:00Z", "value": "101000"},
                {"timestamp": "2024-11-19T00:00:00Z", "value": "100000"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let source = HttpHistorySource::new(client_for(&server, Session::new()), "/history/equity/");
    let points = source.equity_history(Some(AccountType::Real)).await.unwrap();

    assert_eq!(points.len(), 2);
    assert!(points[0].timestamp < points[1].timestamp);
    assert_eq!(points[1].value.value(), dec!(101000));
}
