//! End-to-end tests: the real router and the real Gemini provider, with
//! wiremock standing in for the generative-language API.

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::Application;
use crate::config::Config;
use crate::extract::XLSX_MIME;

const INVOICES_XLSX: &[u8] = include_bytes!("fixtures/invoices.xlsx");
const REPORT_PDF: &[u8] = include_bytes!("fixtures/report.pdf");

/// Multipart form with a single file under the `file` field.
pub fn upload_form(file_name: &str, mime: &str, bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(bytes).file_name(file_name).mime_type(mime))
}

fn test_config(mock_server: &MockServer) -> Config {
    let mut config = Config::default();
    config.gemini.api_key = "test-key".to_string();
    config.gemini.base_url = Url::parse(&format!("{}/", mock_server.uri())).expect("mock base url");
    config
}

fn test_server(mock_server: &MockServer) -> TestServer {
    Application::new(test_config(mock_server)).expect("application").into_test_server()
}

/// Mount a generateContent mock that replies with the given candidate text.
async fn mount_reply(mock_server: &MockServer, reply_text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": reply_text }] } }]
        })))
        .mount(mock_server)
        .await;
}

/// The excerpt the service sent upstream, decoded from the inline-data part
/// of the recorded generateContent request.
async fn sent_excerpt(mock_server: &MockServer) -> String {
    let requests = mock_server.received_requests().await.expect("requests");
    assert_eq!(requests.len(), 1, "expected exactly one upstream call");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("request body");
    let data = body["contents"][0]["parts"][0]["inlineData"]["data"].as_str().expect("inline data");
    String::from_utf8(STANDARD.decode(data).expect("base64")).expect("utf8 excerpt")
}

#[test_log::test(tokio::test)]
async fn missing_file_is_a_client_error_without_an_upstream_call() {
    let mock_server = MockServer::start().await;
    let server = test_server(&mock_server);

    let response = server
        .post("/api/process-file")
        .multipart(MultipartForm::new().add_text("note", "no file attached"))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "No file uploaded.");
    assert!(mock_server.received_requests().await.expect("requests").is_empty());
}

#[test_log::test(tokio::test)]
async fn disallowed_mime_type_is_rejected_before_processing() {
    let mock_server = MockServer::start().await;
    let server = test_server(&mock_server);

    let response = server
        .post("/api/process-file")
        .multipart(upload_form("data.csv", "text/csv", b"a,b,c\n1,2,3".to_vec()))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid file type. Please upload an Excel, PDF, or image file.");
    assert!(mock_server.received_requests().await.expect("requests").is_empty());
}

#[test_log::test(tokio::test)]
async fn spreadsheet_excerpt_caps_at_twenty_rows_with_na_substitution() {
    let mock_server = MockServer::start().await;
    mount_reply(&mock_server, "{\"Invoices\": [], \"Products\": [], \"Customers\": []}").await;
    let server = test_server(&mock_server);

    let response = server
        .post("/api/process-file")
        .multipart(upload_form("invoices.xlsx", XLSX_MIME, INVOICES_XLSX.to_vec()))
        .await;
    response.assert_status_ok();

    let excerpt = sent_excerpt(&mock_server).await;
    let lines: Vec<&str> = excerpt.lines().collect();
    assert_eq!(lines.len(), 20);
    assert_eq!(lines[0], "Invoice 1 - Customer: Customer-1, Product: Widget-1, Qty: 1, Total: 10");
    // The fixture's third data row has no Qty cell
    assert_eq!(lines[2], "Invoice 3 - Customer: Customer-3, Product: Widget-3, Qty: N/A, Total: 30");
    assert_eq!(lines[19], "Invoice 20 - Customer: Customer-20, Product: Widget-20, Qty: 20, Total: 200");
    // Rows beyond 20 never appear
    assert!(!excerpt.contains("Customer-21"));
}

#[test_log::test(tokio::test)]
async fn pdf_excerpt_is_exactly_the_first_thousand_characters() {
    let mock_server = MockServer::start().await;
    mount_reply(&mock_server, "{\"Invoices\": [], \"Products\": [], \"Customers\": []}").await;
    let server = test_server(&mock_server);

    let response = server
        .post("/api/process-file")
        .multipart(upload_form("report.pdf", "application/pdf", REPORT_PDF.to_vec()))
        .await;
    response.assert_status_ok();

    // The fixture's text runs well past the cut
    let excerpt = sent_excerpt(&mock_server).await;
    assert_eq!(excerpt.chars().count(), 1000);
    assert!(excerpt.contains("Invoice report line 01"));
}

#[test_log::test(tokio::test)]
async fn fenced_json_reply_maps_into_the_structured_response() {
    let mock_server = MockServer::start().await;
    let reply = "```json\n{\n  \"Invoices\": [{\"Serial Number\": \"INV-7\", \"Qty\": 2}],\n  \"Products\": [{\"Product Name\": \"Widget\"}],\n  \"Customers\": [{\"Customer Name\": \"Acme\"}]\n}\n```";
    mount_reply(&mock_server, reply).await;
    let server = test_server(&mock_server);

    let response = server
        .post("/api/process-file")
        .multipart(upload_form("scan.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["invoices"], json!([{"Serial Number": "INV-7", "Qty": 2}]));
    assert_eq!(body["products"], json!([{"Product Name": "Widget"}]));
    assert_eq!(body["customers"], json!([{"Customer Name": "Acme"}]));
    assert_eq!(body["rawResponse"], Value::Null);
}

#[test_log::test(tokio::test)]
async fn unparseable_reply_returns_the_cleaned_text_with_status_ok() {
    let mock_server = MockServer::start().await;
    mount_reply(&mock_server, "```\nThe document does not contain any recognizable records.\n```").await;
    let server = test_server(&mock_server);

    let response = server
        .post("/api/process-file")
        .multipart(upload_form("scan.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["invoices"], json!([]));
    assert_eq!(body["products"], json!([]));
    assert_eq!(body["customers"], json!([]));
    assert_eq!(body["rawResponse"], "The document does not contain any recognizable records.");
}

#[test_log::test(tokio::test)]
async fn identical_uploads_produce_identical_responses() {
    let mock_server = MockServer::start().await;
    mount_reply(&mock_server, "{\"Invoices\": [{\"Serial Number\": \"INV-1\"}]}").await;
    let server = test_server(&mock_server);

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let response = server
            .post("/api/process-file")
            .multipart(upload_form("invoices.xlsx", XLSX_MIME, INVOICES_XLSX.to_vec()))
            .await;
        response.assert_status_ok();
        bodies.push(response.text());
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[test_log::test(tokio::test)]
async fn upstream_failure_surfaces_as_a_generic_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&mock_server)
        .await;
    let server = test_server(&mock_server);

    let response = server
        .post("/api/process-file")
        .multipart(upload_form("scan.png", "image/png", vec![0x89]))
        .await;

    response.assert_status_internal_server_error();
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to process the file.");
}

#[test_log::test(tokio::test)]
async fn every_response_disables_caching() {
    let mock_server = MockServer::start().await;
    let server = test_server(&mock_server);

    let response = server.get("/healthz").await;
    response.assert_status_ok();
    assert_eq!(
        response.header("cache-control"),
        "no-store, no-cache, must-revalidate, proxy-revalidate"
    );
    assert_eq!(response.header("pragma"), "no-cache");
    assert_eq!(response.header("expires"), "0");
    assert_eq!(response.header("surrogate-control"), "no-store");
}
