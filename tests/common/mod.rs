#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mockito::{Mock, Server, ServerGuard};
use readmeservice::GitHubClient;
use serde_json::json;
use std::time::Duration;

pub mod test_helpers {
    use super::*;

    pub async fn setup_test_server() -> ServerGuard {
        Server::new_async().await
    }

    pub fn github_client(server: &ServerGuard) -> GitHubClient {
        GitHubClient::new(server.url(), None, Duration::from_secs(5)).expect("client")
    }

    pub fn setup_test_logger() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("readmeservice=debug")
            .with_test_writer()
            .try_init();
    }

    pub async fn mock_repository(server: &mut ServerGuard, owner: &str, name: &str, branch: &str) -> Mock {
        server
            .mock("GET", format!("/repos/{owner}/{name}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "name": name, "default_branch": branch }).to_string())
            .create_async()
            .await
    }

    pub async fn mock_tree(server: &mut ServerGuard, owner: &str, name: &str, branch: &str, paths: &[&str]) -> Mock {
        let tree: Vec<_> = paths
            .iter()
            .map(|p| json!({ "path": p, "mode": "100644", "type": "blob", "sha": "abc" }))
            .collect();
        server
            .mock("GET", format!("/repos/{owner}/{name}/git/trees/{branch}").as_str())
            .match_query(mockito::Matcher::UrlEncoded("recursive".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "sha": "abc", "tree": tree, "truncated": false }).to_string())
            .create_async()
            .await
    }

    pub async fn mock_file(server: &mut ServerGuard, owner: &str, name: &str, path: &str, text: &str) -> Mock {
        server
            .mock("GET", format!("/repos/{owner}/{name}/contents/{path}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "type": "file",
                    "encoding": "base64",
                    "path": path,
                    "content": STANDARD.encode(text),
                })
                .to_string(),
            )
            .create_async()
            .await
    }

    pub async fn mock_status(server: &mut ServerGuard, path: &str, status: usize, message: &str) -> Mock {
        server
            .mock("GET", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(json!({ "message": message }).to_string())
            .create_async()
            .await
    }

    pub fn completion_body(content: &str) -> String {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
        .to_string()
    }
}
