//! Headless page primitives: a container element and a modal dialog that
//! keep their state in memory. Used when embedding the workflows outside a
//! browser and throughout the test suite.

use crate::domain::model::{ConfirmPrompt, Form};
use crate::domain::ports::{Container, ModalSurface};
use crate::utils::error::Result;
use crate::utils::form::parse_form;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug)]
struct ContainerState {
    data: HashMap<String, String>,
    content: String,
    attached: bool,
    collapsed: bool,
}

/// Cloning shares the underlying element.
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    inner: Arc<Mutex<ContainerState>>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ContainerState {
                data: HashMap::new(),
                content: String::new(),
                attached: true,
                collapsed: false,
            })),
        }
    }

    pub fn with_data(self, name: &str, value: impl Into<String>) -> Self {
        self.set_data(name, value);
        self
    }

    pub fn with_content(self, html: impl Into<String>) -> Self {
        self.state().content = html.into();
        self
    }

    pub fn set_data(&self, name: &str, value: impl Into<String>) {
        self.state().data.insert(name.to_string(), value.into());
    }

    pub fn content(&self) -> String {
        self.state().content.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.state().attached
    }

    pub fn is_collapsed(&self) -> bool {
        self.state().collapsed
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ContainerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Container for MemoryContainer {
    fn data(&self, name: &str) -> Option<String> {
        self.state().data.get(name).cloned()
    }

    fn replace_content(&self, html: &str) {
        self.state().content = html.to_string();
    }

    async fn collapse(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
        self.state().collapsed = true;
    }

    fn detach(&self) {
        self.state().attached = false;
    }
}

/// Snapshot of what the dialog currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalView {
    pub open: bool,
    pub loading: bool,
    pub content: Option<String>,
    pub error: Option<String>,
    pub opens: usize,
    pub closes: usize,
    pub prompts: Vec<String>,
}

pub struct MemorySurface {
    view: watch::Sender<ModalView>,
    answers: Mutex<VecDeque<bool>>,
    filled: Mutex<Vec<(String, String)>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        let (view, _) = watch::channel(ModalView::default());
        Self {
            view,
            answers: Mutex::new(VecDeque::new()),
            filled: Mutex::new(Vec::new()),
        }
    }

    pub fn view(&self) -> ModalView {
        self.view.borrow().clone()
    }

    /// Waits until the dialog reaches a view matching `predicate`.
    pub async fn wait_until(&self, mut predicate: impl FnMut(&ModalView) -> bool) -> ModalView {
        let mut rx = self.view.subscribe();
        let view = match rx.wait_for(|view| predicate(view)).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        };
        view
    }

    /// Queues the answer for the next confirm prompt. Unanswered prompts are declined.
    pub fn answer_confirm(&self, answer: bool) {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(answer);
    }

    /// Types a value into a field of the rendered form.
    pub fn fill(&self, name: &str, value: impl Into<String>) {
        self.filled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), value.into()));
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModalSurface for MemorySurface {
    fn loader(&self) {
        self.view.send_modify(|view| {
            if !view.open {
                view.opens += 1;
            }
            view.open = true;
            view.loading = true;
            view.error = None;
        });
    }

    async fn content(&self, html: &str) -> Result<()> {
        self.filled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.view.send_modify(|view| {
            if !view.open {
                view.opens += 1;
            }
            view.open = true;
            view.loading = false;
            view.error = None;
            view.content = Some(html.to_string());
        });
        Ok(())
    }

    fn error(&self, message: &str) {
        self.view.send_modify(|view| {
            if !view.open {
                view.opens += 1;
            }
            view.open = true;
            view.loading = false;
            view.error = Some(message.to_string());
        });
    }

    fn form(&self) -> Option<Form> {
        let mut form = parse_form(self.view.borrow().content.as_deref()?)?;
        for (name, value) in self
            .filled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            form.set_field(name, value.clone());
        }
        Some(form)
    }

    fn close(&self) {
        self.view.send_modify(|view| {
            view.open = false;
            view.loading = false;
            view.closes += 1;
        });
    }

    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        self.view
            .send_modify(|view| view.prompts.push(prompt.body.clone()));
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(false)
    }
}
