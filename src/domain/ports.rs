use crate::domain::model::{ConfirmPrompt, Form, FormMethod, Response};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Performs requests and parses replies into a [`Response`].
///
/// An `Err` means the request never produced a reply (network failure);
/// server-side failures come back as `Ok(Response::Error { .. })`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Response>;

    async fn post(&self, url: &str, body: &[(String, String)]) -> Result<Response>;

    async fn submit(&self, form: &Form) -> Result<Response> {
        match form.method {
            FormMethod::Get => self.get(&form.action, &form.fields).await,
            FormMethod::Post => self.post(&form.action, &form.fields).await,
        }
    }
}

/// The overlay dialog a [`crate::core::modal::ModalManager`] drives.
#[async_trait]
pub trait ModalSurface: Send + Sync {
    /// Opens the dialog in its loading state.
    fn loader(&self);

    /// Replaces the dialog body; resolves once the fragment is rendered.
    async fn content(&self, html: &str) -> Result<()>;

    fn error(&self, message: &str);

    /// The form embedded in the current body, if any.
    fn form(&self) -> Option<Form>;

    fn close(&self);

    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// The element wrapping one content item.
#[async_trait]
pub trait Container: Send + Sync {
    fn data(&self, name: &str) -> Option<String>;

    fn replace_content(&self, html: &str);

    /// Toggles height and opacity down to zero over `duration`.
    async fn collapse(&self, duration: Duration);

    fn detach(&self);
}
