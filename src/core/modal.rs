//! Single-dialog discipline for a [`ModalSurface`].
//!
//! At most one [`ModalSession`] exists at a time; `acquire` fails with
//! [`ContentError::ModalBusy`] while one is open. Each session carries a
//! cancellation token that fires when the user dismisses the dialog.

use crate::core::binder::ScopeId;
use crate::domain::model::{ConfirmPrompt, Form};
use crate::domain::ports::ModalSurface;
use crate::utils::error::{ContentError, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

struct ActiveSession {
    id: u64,
    cancel: CancellationToken,
}

pub struct ModalManager<S: ModalSurface> {
    surface: Arc<S>,
    active: Arc<Mutex<Option<ActiveSession>>>,
    next_id: Arc<AtomicU64>,
}

impl<S: ModalSurface> Clone for ModalManager<S> {
    fn clone(&self) -> Self {
        Self {
            surface: Arc::clone(&self.surface),
            active: Arc::clone(&self.active),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<S: ModalSurface> ModalManager<S> {
    pub fn new(surface: Arc<S>) -> Self {
        Self {
            surface,
            active: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn surface(&self) -> &Arc<S> {
        &self.surface
    }

    pub fn acquire(&self) -> Result<ModalSession<S>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.is_some() {
            tracing::warn!("Refusing to open a modal while another session is active");
            return Err(ContentError::ModalBusy);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        *active = Some(ActiveSession {
            id,
            cancel: cancel.clone(),
        });
        tracing::debug!("Modal session {} acquired", id);

        Ok(ModalSession {
            id,
            surface: Arc::clone(&self.surface),
            active: Arc::clone(&self.active),
            cancel,
            shown: AtomicBool::new(false),
            closed: false,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Body scope of the open session, for dispatching events into it.
    pub fn active_scope(&self) -> Option<ScopeId> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| ScopeId(session.id))
    }

    /// Called when the user closes the dialog. Returns false if nothing was open.
    pub fn dismiss(&self) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_ref() {
            Some(session) => {
                tracing::debug!("Modal session {} dismissed", session.id);
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Runs the yes/no prompt in its own session. Dismissal counts as "no".
    pub async fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool> {
        let session = self.acquire()?;
        let answer = tokio::select! {
            _ = session.cancelled() => false,
            answer = self.surface.confirm(prompt) => answer,
        };
        session.close();
        Ok(answer)
    }
}

/// One open dialog. Closing or dropping it releases the manager.
pub struct ModalSession<S: ModalSurface> {
    id: u64,
    surface: Arc<S>,
    active: Arc<Mutex<Option<ActiveSession>>>,
    cancel: CancellationToken,
    shown: AtomicBool,
    closed: bool,
}

impl<S: ModalSurface> ModalSession<S> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Scope of this session's body element; fresh for every session.
    pub fn body(&self) -> ScopeId {
        ScopeId(self.id)
    }

    pub fn loader(&self) {
        self.shown.store(true, Ordering::Relaxed);
        self.surface.loader();
    }

    pub async fn content(&self, html: &str) -> Result<()> {
        self.shown.store(true, Ordering::Relaxed);
        self.surface.content(html).await
    }

    pub fn error(&self, message: &str) {
        self.shown.store(true, Ordering::Relaxed);
        self.surface.error(message);
    }

    pub fn form(&self) -> Option<Form> {
        self.surface.form()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Token cancelled when the user dismisses this session.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.shown.load(Ordering::Relaxed) {
            self.surface.close();
        }
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|session| session.id == self.id) {
            *active = None;
        }
        tracing::debug!("Modal session {} released", self.id);
    }
}

impl<S: ModalSurface> Drop for ModalSession<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemorySurface;

    fn manager() -> (ModalManager<MemorySurface>, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::new());
        (ModalManager::new(Arc::clone(&surface)), surface)
    }

    #[test]
    fn test_second_acquire_fails_fast() {
        let (modals, _surface) = manager();
        let session = modals.acquire().unwrap();
        assert!(modals.is_busy());
        assert!(matches!(modals.acquire(), Err(ContentError::ModalBusy)));

        session.close();
        assert!(!modals.is_busy());
        assert!(modals.acquire().is_ok());
    }

    #[test]
    fn test_drop_releases_and_closes_shown_dialog() {
        let (modals, surface) = manager();
        {
            let session = modals.acquire().unwrap();
            session.loader();
            assert!(surface.view().open);
        }
        assert!(!modals.is_busy());
        assert!(!surface.view().open);
        assert_eq!(surface.view().closes, 1);
    }

    #[test]
    fn test_unshown_session_does_not_touch_surface() {
        let (modals, surface) = manager();
        modals.acquire().unwrap().close();
        assert_eq!(surface.view().closes, 0);
    }

    #[test]
    fn test_sessions_get_fresh_scopes() {
        let (modals, _surface) = manager();
        let first = modals.acquire().unwrap();
        let first_scope = first.body();
        assert_eq!(modals.active_scope(), Some(first_scope));
        first.close();

        let second = modals.acquire().unwrap();
        assert_ne!(second.body(), first_scope);
    }

    #[tokio::test]
    async fn test_dismiss_cancels_active_session() {
        let (modals, _surface) = manager();
        assert!(!modals.dismiss());

        let session = modals.acquire().unwrap();
        assert!(!session.is_cancelled());
        assert!(modals.dismiss());
        session.cancelled().await;
        assert!(session.is_cancelled());
    }

    #[tokio::test]
    async fn test_confirm_uses_scripted_answer() {
        let (modals, surface) = manager();
        surface.answer_confirm(true);
        surface.answer_confirm(false);

        let prompt = ConfirmPrompt::delete_content();
        assert!(modals.confirm(&prompt).await.unwrap());
        assert!(!modals.confirm(&prompt).await.unwrap());
        assert!(!modals.is_busy());
        assert_eq!(surface.view().prompts, vec![prompt.body.clone(), prompt.body]);
    }
}
