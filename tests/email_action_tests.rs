//! `send_email` against a mocked action endpoint.

use courier::action::{EmailAction, EmailRequest};
use courier::error::CourierError;
use courier::tools::{ToolArguments, ToolHandler};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn greeting() -> EmailRequest {
    EmailRequest {
        to_email: "Min.Cheng@knightec.se".into(),
        subject: "Greetings".into(),
        body: "Hello, this is a test email!".into(),
    }
}

async fn action_for(server: &MockServer) -> EmailAction {
    EmailAction::new(format!("{}/api/send", server.uri())).unwrap()
}

#[tokio::test]
async fn posts_json_body_and_returns_response_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "to_email": "Min.Cheng@knightec.se",
            "subject": "Greetings",
            "body": "Hello, this is a test email!"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "sent", "id": "m-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data = action_for(&server).await.send(&greeting()).await.unwrap();
    assert_eq!(data, json!({ "status": "sent", "id": "m-1" }));
}

#[tokio::test]
async fn non_200_body_becomes_the_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Recipient rejected"))
        .expect(1)
        .mount(&server)
        .await;

    let err = action_for(&server).await.send(&greeting()).await.unwrap_err();
    assert!(matches!(
        &err,
        CourierError::ToolInvocation { tool_name, message }
            if tool_name == "send_email" && message == "Recipient rejected"
    ));
}

#[tokio::test]
async fn non_json_success_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let err = action_for(&server).await.send(&greeting()).await.unwrap_err();
    assert!(err.tool_message().contains("endpoint returned invalid JSON"));
}

#[tokio::test]
async fn invalid_address_never_reaches_the_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let args = ToolArguments::new(json!({
        "to_email": "not-an-address",
        "subject": "Greetings",
        "body": "Hi"
    }));
    let err = action_for(&server).await.invoke(&args).await.unwrap_err();
    assert!(matches!(err, CourierError::InvalidArgument(_)));
}

#[tokio::test]
async fn unconfigured_endpoint_reports_configuration() {
    let err = EmailAction::unconfigured()
        .unwrap()
        .send(&greeting())
        .await
        .unwrap_err();
    assert!(err.tool_message().contains("AZURE_FUNCTION_URL"));
}
