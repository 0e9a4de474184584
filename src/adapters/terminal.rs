use crate::adapters::memory::MemorySurface;
use crate::core::content::ContentEnv;
use crate::domain::model::{ConfirmPrompt, Form, CONTENT_SAVE_SELECTOR};
use crate::domain::ports::{ModalSurface, Transport};
use crate::utils::error::{ContentError, Result};
use crate::utils::form::parse_form;
use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Renders the dialog on stdout. Confirm answers and form commands are read
/// from one shared input, stdin by default.
pub struct TerminalSurface<R = BufReader<Stdin>> {
    inner: MemorySurface,
    input: Mutex<Lines<R>>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::with_input(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin + Send + 'static> TerminalSurface<R> {
    pub fn with_input(input: R) -> Self {
        Self {
            inner: MemorySurface::new(),
            input: Mutex::new(input.lines()),
        }
    }

    pub fn fill(&self, name: &str, value: impl Into<String>) {
        self.inner.fill(name, value);
    }

    pub fn is_open(&self) -> bool {
        self.inner.view().open
    }

    /// `None` once the input is exhausted.
    pub async fn next_line(&self) -> io::Result<Option<String>> {
        self.input.lock().await.next_line().await
    }

    async fn opened(&self) {
        self.inner.wait_until(|view| view.open).await;
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send + 'static> ModalSurface for TerminalSurface<R> {
    fn loader(&self) {
        println!("⏳ Loading...");
        self.inner.loader();
    }

    async fn content(&self, html: &str) -> Result<()> {
        self.inner.content(html).await?;
        match parse_form(html) {
            Some(form) => {
                println!("📝 {:?} {}", form.method, form.action);
                for (name, value) in &form.fields {
                    println!("   {} = {}", name, value);
                }
                println!("Commands: set <name>=<value> | save | quit");
            }
            None => println!("{}", html),
        }
        Ok(())
    }

    fn error(&self, message: &str) {
        eprintln!("❌ {}", message);
        eprintln!("Type quit to close");
        self.inner.error(message);
    }

    fn form(&self) -> Option<Form> {
        self.inner.form()
    }

    fn close(&self) {
        println!("Dialog closed");
        self.inner.close();
    }

    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        println!("{}", prompt.header);
        println!(
            "{} [{}/{}]",
            prompt.body,
            prompt.confirm_text.to_lowercase(),
            prompt.cancel_text.to_lowercase()
        );

        match self.next_line().await {
            Ok(Some(line)) => {
                let answer = line.trim().to_lowercase();
                answer == "y" || answer == "yes" || answer == prompt.confirm_text.to_lowercase()
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Could not read confirmation: {}", e);
                false
            }
        }
    }
}

pub type TerminalEnv<T, R> = ContentEnv<T, TerminalSurface<R>>;

/// Feeds input commands into whatever dialog `workflow` opens until it
/// finishes. Once the input ends, every dialog is dismissed as it appears.
pub async fn drive<T, R, F, O>(workflow: F, env: &TerminalEnv<T, R>) -> Result<O>
where
    T: Transport,
    R: AsyncBufRead + Unpin + Send + 'static,
    F: Future<Output = Result<O>>,
{
    tokio::pin!(workflow);
    let surface = env.modals.surface();

    loop {
        // The workflow goes first so a pending confirm reads its answer
        // before the command loop does.
        tokio::select! {
            biased;
            outcome = &mut workflow => return outcome,
            line = surface.next_line() => match line {
                Ok(Some(line)) => handle_command(line.trim(), env),
                Ok(None) => return dismiss_until_done(workflow, env).await,
                Err(e) => {
                    dismiss_until_done(workflow, env).await?;
                    return Err(ContentError::IoError(e));
                }
            },
        }
    }
}

async fn dismiss_until_done<T, R, F, O>(
    mut workflow: Pin<&mut F>,
    env: &TerminalEnv<T, R>,
) -> Result<O>
where
    T: Transport,
    R: AsyncBufRead + Unpin + Send + 'static,
    F: Future<Output = Result<O>>,
{
    let surface = env.modals.surface();
    loop {
        tokio::select! {
            biased;
            outcome = &mut workflow => return outcome,
            _ = surface.opened() => {
                env.modals.dismiss();
            }
        }
    }
}

fn handle_command<T, R>(line: &str, env: &TerminalEnv<T, R>)
where
    T: Transport,
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let surface = env.modals.surface();
    match line.split_once(' ') {
        Some(("set", assignment)) => match assignment.split_once('=') {
            Some((name, value)) => surface.fill(name.trim(), value.trim()),
            None => eprintln!("Usage: set <name>=<value>"),
        },
        _ if line == "save" || line.is_empty() => {
            let Some(scope) = env.modals.active_scope() else {
                eprintln!("No open form");
                return;
            };
            if env.binder.trigger(scope, "click", CONTENT_SAVE_SELECTOR) == 0 {
                eprintln!("Save is not available right now");
            }
        }
        _ if line == "quit" => {
            if !surface.is_open() || !env.modals.dismiss() {
                eprintln!("No open dialog");
            }
        }
        _ => eprintln!("Commands: set <name>=<value> | save | quit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryContainer;
    use crate::core::content::{Content, ContentOptions, DeleteFailure};
    use crate::domain::model::{
        DeleteOutcome, EditOutcome, Response, DATA_CONTENT_DELETE_URL, DATA_CONTENT_EDIT_URL,
        DATA_CONTENT_KEY,
    };
    use std::sync::Arc;
    use std::time::Duration;

    const EDIT_FORM: &str = r#"<form action="/save"><input name="title" value="Old"></form>"#;

    /// Serves the edit form; every post fails.
    struct Backend;

    #[async_trait]
    impl Transport for Backend {
        async fn get(&self, _url: &str, _query: &[(String, String)]) -> Result<Response> {
            Ok(Response::success(EDIT_FORM))
        }

        async fn post(&self, _url: &str, _body: &[(String, String)]) -> Result<Response> {
            Err(ContentError::transport("connection refused"))
        }
    }

    fn env(input: &'static str) -> TerminalEnv<Backend, &'static [u8]> {
        let surface = Arc::new(TerminalSurface::with_input(input.as_bytes()));
        ContentEnv::new(Arc::new(Backend), surface).with_options(ContentOptions {
            remove_animation: Duration::ZERO,
            delete_failure: DeleteFailure::Surface,
            ..ContentOptions::default()
        })
    }

    fn container() -> MemoryContainer {
        MemoryContainer::new()
            .with_data(DATA_CONTENT_KEY, "1")
            .with_data(DATA_CONTENT_EDIT_URL, "http://127.0.0.1:1/edit")
            .with_data(DATA_CONTENT_DELETE_URL, "http://127.0.0.1:1/delete")
    }

    #[tokio::test]
    async fn test_quit_closes_surfaced_delete_failure() {
        let env = env("yes\nquit\n");
        let container = container();
        let mut content = Content::from_container(container.clone(), env.clone());

        let outcome = drive(content.delete(), &env).await.unwrap();

        assert!(matches!(outcome, DeleteOutcome::Failed { .. }));
        assert!(container.is_attached());
        assert!(!env.modals.is_busy());
        assert!(!env.modals.surface().is_open());
    }

    #[tokio::test]
    async fn test_end_of_input_closes_surfaced_delete_failure() {
        let env = env("yes\n");
        let mut content = Content::from_container(container(), env.clone());

        let outcome = drive(content.delete(), &env).await.unwrap();

        assert!(matches!(outcome, DeleteOutcome::Failed { .. }));
        assert!(!env.modals.is_busy());
    }

    #[tokio::test]
    async fn test_declined_confirm_reads_answer_before_commands() {
        let env = env("no\nquit\n");
        let container = container();
        let mut content = Content::from_container(container.clone(), env.clone());

        let outcome = drive(content.delete(), &env).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Declined);
        assert!(container.is_attached());
    }

    #[tokio::test]
    async fn test_form_commands_then_end_of_input() {
        let env = env("set title=New\nsave\n");
        let mut content = Content::from_container(container(), env.clone());

        let outcome = drive(content.edit(None), &env).await.unwrap();

        assert_eq!(outcome, EditOutcome::Dismissed);
        let form = env.modals.surface().form().unwrap();
        assert_eq!(form.field("title"), Some("New"));
        assert!(!env.modals.is_busy());
    }
}
