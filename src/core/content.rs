//! The content component: create, edit and delete workflows for one
//! content item's container.

use crate::core::binder::ActionBinder;
use crate::core::events::{ContentEventKind, ContentEvents};
use crate::core::modal::{ModalManager, ModalSession};
use crate::domain::model::{
    Action, AllowedActions, ConfirmPrompt, ContentKey, ContentState, DeleteOutcome, EditOutcome,
    Response, CONTENT_SAVE_SELECTOR, DATA_CONTENT_ACTIONS, DATA_CONTENT_DELETE_URL,
    DATA_CONTENT_EDIT_URL, DATA_CONTENT_KEY,
};
use crate::domain::ports::{Container, ModalSurface, Transport};
use crate::utils::error::{ContentError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const UNKNOWN_ERROR: &str = "An unexpected error occurred";

/// What a failed delete request shows the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteFailure {
    /// Log only; the container stays as it was.
    #[default]
    Log,
    /// Log and show the error in a modal.
    Surface,
}

#[derive(Debug, Clone)]
pub struct ContentOptions {
    /// Used when the container declares no `content-actions`.
    pub default_actions: AllowedActions,
    pub remove_animation: Duration,
    pub delete_failure: DeleteFailure,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            default_actions: AllowedActions::all(),
            remove_animation: Duration::from_millis(200),
            delete_failure: DeleteFailure::Log,
        }
    }
}

/// Collaborators shared by every component on a page.
pub struct ContentEnv<T: Transport, S: ModalSurface> {
    pub transport: Arc<T>,
    pub modals: ModalManager<S>,
    pub binder: ActionBinder,
    pub events: ContentEvents,
    pub options: ContentOptions,
}

impl<T: Transport, S: ModalSurface> Clone for ContentEnv<T, S> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            modals: self.modals.clone(),
            binder: self.binder.clone(),
            events: self.events.clone(),
            options: self.options.clone(),
        }
    }
}

impl<T: Transport, S: ModalSurface> ContentEnv<T, S> {
    pub fn new(transport: Arc<T>, surface: Arc<S>) -> Self {
        Self {
            transport,
            modals: ModalManager::new(surface),
            binder: ActionBinder::new(),
            events: ContentEvents::new(),
            options: ContentOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ContentOptions) -> Self {
        self.options = options;
        self
    }
}

/// Called after a successful save with the server response and the open
/// modal. Returning `true` closes the modal.
pub type SuccessHandler<S> = Box<dyn FnMut(&Response, &ModalSession<S>) -> bool + Send>;

pub struct Content<C: Container, T: Transport, S: ModalSurface> {
    container: C,
    actions: AllowedActions,
    env: ContentEnv<T, S>,
    state: watch::Sender<ContentState>,
}

impl<C: Container, T: Transport, S: ModalSurface> Content<C, T, S> {
    pub fn new(container: C, actions: AllowedActions, env: ContentEnv<T, S>) -> Self {
        let (state, _) = watch::channel(ContentState::Idle);
        Self {
            container,
            actions,
            env,
            state,
        }
    }

    /// Builds a component whose allowed actions come from the container's
    /// `content-actions` attribute, falling back to the configured default.
    pub fn from_container(container: C, env: ContentEnv<T, S>) -> Self {
        let actions = match container.data(DATA_CONTENT_ACTIONS) {
            Some(declaration) => AllowedActions::parse_declaration(&declaration),
            None => env.options.default_actions.clone(),
        };
        Self::new(container, actions, env)
    }

    pub fn get_key(&self) -> Option<ContentKey> {
        self.container
            .data(DATA_CONTENT_KEY)
            .filter(|key| !key.is_empty())
            .map(ContentKey::new)
    }

    pub fn actions(&self) -> &AllowedActions {
        &self.actions
    }

    pub fn has_action(&self, action: Action) -> bool {
        self.actions.contains(action)
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn state(&self) -> ContentState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ContentState> {
        self.state.subscribe()
    }

    /// Opens a blank edit form; the backend creates the item on save.
    /// Never sends a key, even if the container carries one.
    pub async fn create(&mut self, on_created: Option<SuccessHandler<S>>) -> Result<EditOutcome> {
        self.ensure_attached()?;
        if !self.has_action(Action::Create) {
            tracing::debug!("Create not permitted (allowed: {})", self.actions);
            return Ok(EditOutcome::NotPermitted);
        }
        self.run_edit(None, on_created).await
    }

    pub async fn edit(&mut self, on_success: Option<SuccessHandler<S>>) -> Result<EditOutcome> {
        self.ensure_attached()?;
        let key = self.get_key();
        self.run_edit(key, on_success).await
    }

    async fn run_edit(
        &mut self,
        key: Option<ContentKey>,
        mut on_success: Option<SuccessHandler<S>>,
    ) -> Result<EditOutcome> {
        if !self.has_action(Action::Edit) {
            tracing::debug!("Edit not permitted (allowed: {})", self.actions);
            return Ok(EditOutcome::NotPermitted);
        }

        let Some(edit_url) = self
            .container
            .data(DATA_CONTENT_EDIT_URL)
            .filter(|url| !url.is_empty())
        else {
            tracing::error!(
                "No edit url found for edit content action, content: {}",
                describe(&key)
            );
            return Err(ContentError::MissingEndpoint {
                action: Action::Edit,
                attribute: DATA_CONTENT_EDIT_URL,
            });
        };

        let session = self.env.modals.acquire()?;
        let cancel = session.cancellation();
        self.set_state(ContentState::Loading);
        session.loader();

        let query = id_param(&key);
        let document_url = with_query(&edit_url, &query);
        tracing::debug!("Loading edit form from {} for {}", edit_url, describe(&key));
        let loaded = tokio::select! {
            _ = cancel.cancelled() => return Ok(self.finish_edit(EditOutcome::Dismissed)),
            result = self.env.transport.get(&edit_url, &query) => settle(result),
        };

        let form_response = match loaded {
            Ok(response) => response,
            Err(message) => {
                tracing::warn!("Error occurred while editing content: {}", message);
                session.error(&message);
                cancel.cancelled().await;
                return Ok(self.finish_edit(EditOutcome::LoadFailed { message }));
            }
        };

        let rendered = tokio::select! {
            _ = cancel.cancelled() => return Ok(self.finish_edit(EditOutcome::Dismissed)),
            rendered = session.content(form_response.content()) => rendered,
        };
        if let Err(e) = rendered {
            self.set_state(ContentState::Idle);
            return Err(e);
        }

        let mut binding = self
            .env
            .binder
            .bind(session.body(), "click", CONTENT_SAVE_SELECTOR);
        self.set_state(ContentState::FormShown);
        let mut saved = false;

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = binding.next() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.set_state(ContentState::Submitting);

            let Some(mut form) = session.form() else {
                tracing::warn!("Save triggered without a form in {}", session.body());
                session.error(&ContentError::MissingForm.to_string());
                event.finish();
                self.set_state(ContentState::FormShown);
                continue;
            };
            form.resolve_action(&document_url);

            let submitted = tokio::select! {
                _ = cancel.cancelled() => {
                    event.finish();
                    break;
                }
                result = self.env.transport.submit(&form) => settle(result),
            };

            match submitted {
                Ok(response) => {
                    saved = true;
                    self.env
                        .events
                        .publish(ContentEventKind::Saved, self.get_key());
                    let close = match on_success.as_mut() {
                        Some(handler) => handler(&response, &session),
                        None => {
                            self.container.replace_content(response.content());
                            true
                        }
                    };
                    event.finish();
                    if close {
                        drop(binding);
                        session.close();
                        return Ok(self.finish_edit(EditOutcome::Saved));
                    }
                    self.set_state(ContentState::FormShown);
                }
                Err(message) => {
                    tracing::warn!("Error while submitting form: {}", message);
                    session.error(&message);
                    event.finish();
                    self.set_state(ContentState::FormShown);
                }
            }
        }

        drop(binding);
        drop(session);
        let outcome = if saved {
            EditOutcome::SavedModalKept
        } else {
            EditOutcome::Dismissed
        };
        Ok(self.finish_edit(outcome))
    }

    pub async fn delete(&mut self) -> Result<DeleteOutcome> {
        self.ensure_attached()?;
        if !self.has_action(Action::Delete) {
            tracing::debug!("Delete not permitted (allowed: {})", self.actions);
            return Ok(DeleteOutcome::NotPermitted);
        }

        self.set_state(ContentState::Confirming);
        let confirmed = match self
            .env
            .modals
            .confirm(&ConfirmPrompt::delete_content())
            .await
        {
            Ok(confirmed) => confirmed,
            Err(e) => {
                self.set_state(ContentState::Idle);
                return Err(e);
            }
        };
        if !confirmed {
            self.set_state(ContentState::Idle);
            return Ok(DeleteOutcome::Declined);
        }

        let key = self.get_key();
        let Some(delete_url) = self
            .container
            .data(DATA_CONTENT_DELETE_URL)
            .filter(|url| !url.is_empty())
        else {
            tracing::error!(
                "Content delete was called, but no url could be determined for content: {}",
                describe(&key)
            );
            self.set_state(ContentState::Idle);
            return Err(ContentError::MissingEndpoint {
                action: Action::Delete,
                attribute: DATA_CONTENT_DELETE_URL,
            });
        };

        tracing::debug!("Deleting {} via {}", describe(&key), delete_url);
        match settle(self.env.transport.post(&delete_url, &id_param(&key)).await) {
            Ok(_) => {
                self.remove().await?;
                Ok(DeleteOutcome::Removed)
            }
            Err(message) => {
                tracing::error!("Error removing content {}: {}", describe(&key), message);
                self.set_state(ContentState::Idle);
                if self.env.options.delete_failure == DeleteFailure::Surface {
                    self.surface_error(&message).await;
                }
                Ok(DeleteOutcome::Failed { message })
            }
        }
    }

    /// Collapses the container, then detaches it. A second call fails with
    /// [`ContentError::Detached`].
    pub async fn remove(&mut self) -> Result<()> {
        self.ensure_attached()?;
        let key = self.get_key();
        self.set_state(ContentState::Removing);
        self.container
            .collapse(self.env.options.remove_animation)
            .await;
        self.container.detach();
        self.set_state(ContentState::Removed);
        self.env.events.publish(ContentEventKind::Removed, key);
        Ok(())
    }

    async fn surface_error(&self, message: &str) {
        match self.env.modals.acquire() {
            Ok(session) => {
                session.error(message);
                session.cancelled().await;
            }
            Err(e) => tracing::warn!("Could not show delete failure: {}", e),
        }
    }

    fn ensure_attached(&self) -> Result<()> {
        match self.state() {
            ContentState::Removing | ContentState::Removed => Err(ContentError::Detached),
            _ => Ok(()),
        }
    }

    fn set_state(&self, state: ContentState) {
        tracing::trace!("Content state -> {:?}", state);
        self.state.send_replace(state);
    }

    fn finish_edit(&self, outcome: EditOutcome) -> EditOutcome {
        self.set_state(ContentState::Idle);
        outcome
    }
}

fn id_param(key: &Option<ContentKey>) -> Vec<(String, String)> {
    key.iter()
        .map(|key| ("id".to_string(), key.to_string()))
        .collect()
}

/// The URL a browser would show for the loaded form.
fn with_query(url: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query)
        .finish();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, encoded)
}

fn describe(key: &Option<ContentKey>) -> String {
    key.as_ref()
        .map(|key| key.to_string())
        .unwrap_or_else(|| "<new>".to_string())
}

/// Folds transport failures and error responses into one message channel.
fn settle(result: Result<Response>) -> std::result::Result<Response, String> {
    match result {
        Ok(response) if !response.is_error() => Ok(response),
        Ok(response) => Err(response
            .first_error()
            .unwrap_or(UNKNOWN_ERROR)
            .to_string()),
        Err(e) => Err(e.to_string()),
    }
}
