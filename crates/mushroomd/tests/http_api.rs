//! Integration tests for the chat HTTP API over a real socket.

use mushroom_core::{CommandSpec, InferenceGateway, Scripted, ScriptedRunner};
use mushroomd::{prompt_loop, ChatClient};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Serve a gateway backed by `runner` on an ephemeral port; returns the base URL.
async fn start(runner: Arc<ScriptedRunner>) -> String {
    let gateway = Arc::new(InferenceGateway::new(
        runner,
        CommandSpec::new("python").arg("AIServer.py"),
        Duration::from_secs(60),
        Some(1),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mushroomd::serve(listener, gateway, std::future::pending()));
    format!("http://{addr}")
}

fn client(base: &str) -> ChatClient {
    ChatClient::new(base, Duration::from_secs(10)).unwrap()
}

/// Test: "hello" -> external command prints "hello-response" -> 200 with that response
#[tokio::test]
async fn test_generate_hello_scenario() {
    let runner = Arc::new(ScriptedRunner::new().on("AIServer.py hello", Scripted::stdout("hello-response\n")));
    let base = start(runner.clone()).await;

    let reply = client(&base).generate("hello").await.unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, json!({ "response": "hello-response" }));
    assert_eq!(runner.call_count(), 1);
}

/// Test: missing or empty prompt is a 400 and never reaches the gateway
#[tokio::test]
async fn test_missing_or_empty_prompt_is_bad_request() {
    let runner = Arc::new(ScriptedRunner::new());
    let base = start(runner.clone()).await;
    let http = reqwest::Client::new();
    let url = format!("{base}/api/chat/generate");

    for body in [json!({}), json!({ "prompt": "" }), json!({ "prompt": null }), json!({ "prompt": 5 })] {
        let response = http.post(&url).json(&body).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 400, "body {body}");
        let payload: serde_json::Value = response.json().await.unwrap();
        assert_eq!(payload, json!({ "error": "Invalid request, 'prompt' missing" }));
    }

    assert_eq!(runner.call_count(), 0, "gateway must not be invoked");
}

/// Test: a body that is not JSON is a 400 too
#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let runner = Arc::new(ScriptedRunner::new());
    let base = start(runner.clone()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/chat/generate"))
        .header("content-type", "application/json")
        .body("{ prompt: ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(runner.call_count(), 0);
}

/// Test: inference failures are 500s whose details do not leak process output
#[tokio::test]
async fn test_inference_failure_is_internal_error() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .on(
                "crash",
                Scripted::Exit {
                    code: 1,
                    stderr: "Traceback: /home/secret/model".to_string(),
                },
            )
            .on("slow", Scripted::Timeout)
            .on("quiet", Scripted::stdout("")),
    );
    let base = start(runner).await;
    let client = client(&base);

    let reply = client.generate("crash").await.unwrap();
    assert_eq!(reply.status, 500);
    assert_eq!(reply.body["error"], "Internal server error");
    let details = reply.body["details"].as_str().unwrap();
    assert!(details.contains("code 1"));
    assert!(!details.contains("secret"));

    let reply = client.generate("slow").await.unwrap();
    assert_eq!(reply.status, 500);
    assert!(reply.body["details"].as_str().unwrap().contains("timed out"));

    let reply = client.generate("quiet").await.unwrap();
    assert_eq!(reply.status, 500);
    assert!(reply.body["details"].as_str().unwrap().contains("empty response"));
}

/// Test: the server keeps serving after a failed request
#[tokio::test]
async fn test_server_recovers_after_failure() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .on("slow", Scripted::Timeout)
            .on("AIServer.py", Scripted::stdout("fine")),
    );
    let base = start(runner).await;
    let client = client(&base);

    assert_eq!(client.generate("slow").await.unwrap().status, 500);
    let reply = client.generate("again").await.unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["response"], "fine");
}

/// Test: healthcheck answers without touching the gateway
#[tokio::test]
async fn test_healthcheck() {
    let runner = Arc::new(ScriptedRunner::new());
    let base = start(runner.clone()).await;

    let reply = client(&base).healthcheck().await.unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["status"], "ok");
    assert_eq!(runner.call_count(), 0);
}

/// Test: the prompt loop skips blank lines and prints each reply
#[tokio::test]
async fn test_prompt_loop_sends_each_line() {
    let runner = Arc::new(ScriptedRunner::new().on("AIServer.py", Scripted::stdout("pong")));
    let base = start(runner.clone()).await;
    let input: &[u8] = b"hello\n\n   \nworld\n";
    let mut out = Vec::new();

    let sent = prompt_loop(&client(&base), input, &mut out).await.unwrap();

    assert_eq!(sent, 2);
    assert_eq!(runner.call_count(), 2);
    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("Status code: 200").count(), 2);
    assert!(printed.contains(r#"Response body: {"response":"pong"}"#));
}

/// Test: an unreachable server is reported and the loop continues
#[tokio::test]
async fn test_prompt_loop_survives_transport_errors() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let input: &[u8] = b"one\ntwo\n";
    let mut out = Vec::new();

    let sent = prompt_loop(&client(&format!("http://{addr}")), input, &mut out)
        .await
        .unwrap();

    assert_eq!(sent, 2);
    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("Error occurred").count(), 2);
}
