//! Minimal HTTP client for the chat API, plus the interactive prompt loop.

use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Status code and JSON body of one API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub status: u16,
    pub body: Value,
}

pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    ///
    /// `timeout` should exceed the server's inference deadline.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ChatClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn generate(&self, prompt: &str) -> reqwest::Result<ChatReply> {
        let response = self
            .http
            .post(format!("{}/api/chat/generate", self.base_url))
            .json(&json!({ "prompt": prompt }))
            .send()
            .await?;
        reply(response).await
    }

    pub async fn healthcheck(&self) -> reqwest::Result<ChatReply> {
        let response = self
            .http
            .get(format!("{}/api/chat/healthcheck", self.base_url))
            .send()
            .await?;
        reply(response).await
    }
}

async fn reply(response: reqwest::Response) -> reqwest::Result<ChatReply> {
    let status = response.status().as_u16();
    let body = response.json::<Value>().await?;
    Ok(ChatReply { status, body })
}

/// Read prompts line by line from `input` and print each reply to `out`.
///
/// Blank lines are skipped; transport errors are printed and the loop goes on.
/// Returns the number of prompts sent when `input` reaches EOF.
pub async fn prompt_loop<R, W>(client: &ChatClient, input: R, out: &mut W) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut sent = 0;

    writeln!(out, "Enter a prompt:")?;
    while let Some(line) = lines.next_line().await? {
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }

        sent += 1;
        match client.generate(prompt).await {
            Ok(reply) => {
                writeln!(out, "Status code: {}", reply.status)?;
                writeln!(out, "Response body: {}", reply.body)?;
            }
            Err(e) => writeln!(out, "Error occurred: {e}")?,
        }
        writeln!(out)?;
        writeln!(out, "Enter a prompt:")?;
    }

    Ok(sent)
}
