#![allow(dead_code)]

use async_trait::async_trait;
use content_actions::domain::model::{Form, Response};
use content_actions::domain::ports::Transport;
use content_actions::{
    Content, ContentEnv, ContentError, ContentOptions, MemoryContainer, MemorySurface, Result,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const EDIT_FORM: &str = r#"<form action="/content/post/edit?id=42" method="post">
  <input type="hidden" name="_csrf" value="token">
  <textarea name="Post[message]">Old message</textarea>
  <button type="button" data-content-save>Save</button>
</form>"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get {
        url: String,
        query: Vec<(String, String)>,
    },
    Post {
        url: String,
        body: Vec<(String, String)>,
    },
    Submit {
        form: Form,
    },
}

#[derive(Default)]
struct Script {
    gets: VecDeque<Result<Response>>,
    posts: VecDeque<Result<Response>>,
    submits: VecDeque<Result<Response>>,
    calls: Vec<Call>,
}

/// Replies with queued responses and records every call.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn on_get(&self, response: Result<Response>) {
        self.script.lock().await.gets.push_back(response);
    }

    pub async fn on_post(&self, response: Result<Response>) {
        self.script.lock().await.posts.push_back(response);
    }

    pub async fn on_submit(&self, response: Result<Response>) {
        self.script.lock().await.submits.push_back(response);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.script.lock().await.calls.clone()
    }
}

fn unscripted() -> Result<Response> {
    Err(ContentError::transport("no scripted response"))
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Response> {
        let mut script = self.script.lock().await;
        script.calls.push(Call::Get {
            url: url.to_string(),
            query: query.to_vec(),
        });
        script.gets.pop_front().unwrap_or_else(unscripted)
    }

    async fn post(&self, url: &str, body: &[(String, String)]) -> Result<Response> {
        let mut script = self.script.lock().await;
        script.calls.push(Call::Post {
            url: url.to_string(),
            body: body.to_vec(),
        });
        script.posts.pop_front().unwrap_or_else(unscripted)
    }

    async fn submit(&self, form: &Form) -> Result<Response> {
        let mut script = self.script.lock().await;
        script.calls.push(Call::Submit { form: form.clone() });
        script.submits.pop_front().unwrap_or_else(unscripted)
    }
}

pub type TestContent = Content<MemoryContainer, ScriptedTransport, MemorySurface>;

pub struct Page {
    pub transport: ScriptedTransport,
    pub surface: Arc<MemorySurface>,
    pub env: ContentEnv<ScriptedTransport, MemorySurface>,
}

impl Page {
    pub fn new() -> Self {
        Self::with_options(ContentOptions {
            remove_animation: Duration::ZERO,
            ..ContentOptions::default()
        })
    }

    pub fn with_options(options: ContentOptions) -> Self {
        let transport = ScriptedTransport::new();
        let surface = Arc::new(MemorySurface::new());
        let env = ContentEnv::new(Arc::new(transport.clone()), Arc::clone(&surface))
            .with_options(options);
        Self {
            transport,
            surface,
            env,
        }
    }

    pub fn content(&self, container: MemoryContainer) -> TestContent {
        Content::from_container(container, self.env.clone())
    }

    /// Clicks the save control inside the open modal.
    pub fn click_save(&self) -> usize {
        let scope = self
            .env
            .modals
            .active_scope()
            .expect("a modal should be open");
        self.env
            .binder
            .trigger(scope, "click", content_actions::domain::model::CONTENT_SAVE_SELECTOR)
    }
}
