use crmlib::config::GatewayConfig;
use crmlib::gateway::{
    FetchParams, FieldSpec, GatewayError, HttpRecordGateway, RecordGateway,
};
use serde_json::json;

fn gateway_for(url: &str) -> HttpRecordGateway {
    HttpRecordGateway::new(&GatewayConfig {
        base_url: url.to_string(),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
    })
}

#[tokio::test]
async fn fetch_unwraps_the_data_envelope() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/records/contact/fetch")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": [{"Id": 1, "firstName": "Ada"}]}"#)
        .create_async()
        .await;

    let gateway = gateway_for(&server.url());
    let rows = gateway
        .fetch_records(
            "contact",
            FetchParams::with_fields(vec![FieldSpec::plain("Id")]),
        )
        .await
        .unwrap();

    assert_eq!(rows, vec![json!({"Id": 1, "firstName": "Ada"})]);
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_envelope_carries_the_store_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/records/deal/fetch")
        .with_status(200)
        .with_body(r#"{"success": false, "message": "No such table"}"#)
        .create_async()
        .await;

    let gateway = gateway_for(&server.url());
    let err = gateway
        .fetch_records("deal", FetchParams::default())
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::ApiError("No such table".to_string()));
}

#[tokio::test]
async fn http_failure_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/records/contact/create")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let gateway = gateway_for(&server.url());
    let err = gateway
        .create_records("contact", vec![json!({"firstName": "Ada"})])
        .await
        .unwrap_err();

    match err {
        GatewayError::ApiError(message) => assert!(message.contains("500")),
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn create_preserves_per_record_outcomes() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/records/contact/update")
        .with_status(200)
        .with_body(
            r#"{"success": true, "results": [
                {"success": true, "data": {"Id": 1}},
                {"success": false, "message": "email already taken"}
            ]}"#,
        )
        .create_async()
        .await;

    let gateway = gateway_for(&server.url());
    let results = gateway
        .update_records("contact", vec![json!({"Id": 1}), json!({"Id": 2})])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].message.as_deref(), Some("email already taken"));
}

#[tokio::test]
async fn missing_record_comes_back_as_none() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/records/company/get")
        .with_status(200)
        .with_body(r#"{"success": true, "data": null}"#)
        .create_async()
        .await;

    let gateway = gateway_for(&server.url());
    let row = gateway
        .get_record_by_id("company", 99, vec![FieldSpec::plain("Id")])
        .await
        .unwrap();

    assert!(row.is_none());
}

#[tokio::test]
async fn delete_sends_record_ids() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/records/contact/delete")
        .match_body(mockito::Matcher::Json(json!({"recordIds": [4, 5]})))
        .with_status(200)
        .with_body(
            r#"{"success": true, "results": [
                {"success": true},
                {"success": true}
            ]}"#,
        )
        .create_async()
        .await;

    let gateway = gateway_for(&server.url());
    let results = gateway.delete_records("contact", vec![4, 5]).await.unwrap();

    assert_eq!(results.len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_store_maps_to_network_error() {
    let gateway = gateway_for("http://127.0.0.1:1");
    let err = gateway
        .fetch_records("contact", FetchParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::NetworkError(_)));
}
