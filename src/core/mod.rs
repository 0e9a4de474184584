pub mod binder;
pub mod content;
pub mod events;
pub mod modal;

pub use crate::domain::model::{
    Action, AllowedActions, ContentKey, ContentState, DeleteOutcome, EditOutcome, Response,
};
pub use crate::domain::ports::{Container, ModalSurface, Transport};
pub use crate::utils::error::Result;
