//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ez_commit::config::Settings;
use git2::{Oid, Repository, Signature, Status, StatusOptions};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A throwaway git repository with a local identity configured.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    /// A repository whose HEAD commit contains `files`.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let test_repo = Self::new();
        for (name, content) in files {
            test_repo.write(name, content);
            test_repo.stage(name);
        }
        test_repo.commit_index("Initial commit");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) {
        let file = self.dir.path().join(name);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(file, content).expect("Failed to write file");
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).expect("Failed to remove file");
    }

    pub fn stage(&self, name: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    pub fn commit_index(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    pub fn commit_count(&self) -> usize {
        let mut walk = match self.repo.revwalk() {
            Ok(walk) => walk,
            Err(_) => return 0,
        };
        if walk.push_head().is_err() {
            return 0;
        }
        walk.count()
    }

    pub fn head_message(&self) -> String {
        let commit = self.repo.head().unwrap().peel_to_commit().unwrap();
        commit.message().unwrap().to_string()
    }

    /// Path and status of every non-clean entry, sorted by path.
    pub fn status_snapshot(&self) -> Vec<(String, Status)> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        let statuses = self.repo.statuses(Some(&mut opts)).expect("Failed to read status");
        let mut entries: Vec<(String, Status)> = statuses
            .iter()
            .map(|e| (e.path().unwrap_or("").to_string(), e.status()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Body of a chat-completion response whose first choice says `content`.
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

/// Settings pointed at the mock server with a stored key.
pub fn settings_for(server: &MockServer) -> Settings {
    Settings {
        api_key: Some("sk-test".to_string()),
        api_base_url: server.uri(),
        model: "gpt-test".to_string(),
        temperature: 0.3,
        max_tokens: 120,
        request_timeout_secs: 5,
        ..Settings::default()
    }
}

/// Mounts a completion endpoint that always answers with `content`.
pub async fn mount_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(server)
        .await;
}

/// Request bodies received by the mock server, in order.
pub async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
        .collect()
}

pub fn config_path_in(dir: &Path) -> PathBuf {
    dir.join("ez-commit").join("config.yaml")
}
