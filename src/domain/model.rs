use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use url::{Position, Url};

/// Data attribute holding the content identifier.
pub const DATA_CONTENT_KEY: &str = "content-key";
/// Data attribute holding the edit-form endpoint.
pub const DATA_CONTENT_EDIT_URL: &str = "content-edit-url";
/// Data attribute holding the delete endpoint.
pub const DATA_CONTENT_DELETE_URL: &str = "content-delete-url";
/// Data attribute declaring the allowed actions in markup.
pub const DATA_CONTENT_ACTIONS: &str = "content-actions";
/// Selector of the save control inside the edit modal.
pub const CONTENT_SAVE_SELECTOR: &str = "[data-content-save]";

/// Stand-in origin for resolving page-relative document URLs.
const RELATIVE_ORIGIN: &str = "http://relative.invalid/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Create, Action::Edit, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "edit" => Ok(Action::Edit),
            "delete" => Ok(Action::Delete),
            other => Err(format!("unknown content action '{}'", other)),
        }
    }
}

/// The capability set of one component, fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedActions(BTreeSet<Action>);

impl AllowedActions {
    pub fn all() -> Self {
        Action::ALL.into_iter().collect()
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }

    /// Parses a markup declaration such as `"edit delete"` or `"create,edit"`.
    /// Unknown tokens are skipped with a warning.
    pub fn parse_declaration(declaration: &str) -> Self {
        declaration
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .filter_map(|token| match token.parse::<Action>() {
                Ok(action) => Some(action),
                Err(e) => {
                    tracing::warn!("Ignoring declared action: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl FromIterator<Action> for AllowedActions {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AllowedActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Action::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Opaque identifier of a persisted content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed result of a transport call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        content: String,
    },
    Error {
        code: Option<u16>,
        errors: Vec<String>,
    },
}

impl Response {
    pub fn success(content: impl Into<String>) -> Self {
        Response::Success {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            code: None,
            errors: vec![message.into()],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Content fragment of a successful response; empty for errors.
    pub fn content(&self) -> &str {
        match self {
            Response::Success { content } => content,
            Response::Error { .. } => "",
        }
    }

    pub fn first_error(&self) -> Option<&str> {
        match self {
            Response::Success { .. } => None,
            Response::Error { errors, .. } => errors.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormMethod {
    Get,
    #[default]
    Post,
}

/// A form embedded in the modal body, ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Form {
    pub action: String,
    pub method: FormMethod,
    pub fields: Vec<(String, String)>,
}

impl Form {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the first field with this name, or appends it.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Resolves `action` against the URL the form was loaded from, as a
    /// browser would. An empty action posts back to the document. A
    /// page-relative document yields a page-relative action.
    pub fn resolve_action(&mut self, document_url: &str) {
        let action = self.action.trim();
        if action.is_empty() {
            self.action = document_url.to_string();
            return;
        }
        if Url::parse(action).is_ok() {
            return;
        }

        let resolved = match Url::parse(document_url) {
            Ok(document) => document.join(action).map(String::from),
            Err(_) => Url::parse(RELATIVE_ORIGIN)
                .and_then(|origin| origin.join(document_url))
                .and_then(|document| document.join(action))
                .map(|url| url[Position::BeforePath..].to_string()),
        };
        match resolved {
            Ok(action) => self.action = action,
            Err(e) => tracing::warn!("Keeping unresolvable form action {}: {}", self.action, e),
        }
    }
}

/// Prompt shown by the confirm flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub header: String,
    pub body: String,
    pub confirm_text: String,
    pub cancel_text: String,
}

impl ConfirmPrompt {
    pub fn delete_content() -> Self {
        Self {
            header: "Confirm content deletion".to_string(),
            body: "Do you really want to delete this content?".to_string(),
            confirm_text: "Delete".to_string(),
            cancel_text: "Cancel".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    Idle,
    Loading,
    FormShown,
    Submitting,
    Confirming,
    Removing,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    NotPermitted,
    /// Saved and the modal was closed.
    Saved,
    /// Saved at least once, then the user closed the modal the success handler kept open.
    SavedModalKept,
    LoadFailed { message: String },
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    NotPermitted,
    Declined,
    Removed,
    Failed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with_action(action: &str) -> Form {
        Form {
            action: action.to_string(),
            ..Form::default()
        }
    }

    #[test]
    fn test_resolve_action_against_absolute_document() {
        let document = "https://hub.example.com/content/post/edit?id=42";

        let mut form = form_with_action("/content/post/save");
        form.resolve_action(document);
        assert_eq!(form.action, "https://hub.example.com/content/post/save");

        let mut form = form_with_action("save?id=42");
        form.resolve_action(document);
        assert_eq!(form.action, "https://hub.example.com/content/post/save?id=42");

        let mut form = form_with_action("");
        form.resolve_action(document);
        assert_eq!(form.action, document);

        let mut form = form_with_action("https://other.example.com/save");
        form.resolve_action(document);
        assert_eq!(form.action, "https://other.example.com/save");
    }

    #[test]
    fn test_resolve_action_against_relative_document() {
        let mut form = form_with_action("save");
        form.resolve_action("/content/post/edit?id=42");
        assert_eq!(form.action, "/content/post/save");

        let mut form = form_with_action("/content/post/edit?id=42");
        form.resolve_action("/content/post/edit?id=42");
        assert_eq!(form.action, "/content/post/edit?id=42");

        let mut form = form_with_action(" ");
        form.resolve_action("/content/post/edit");
        assert_eq!(form.action, "/content/post/edit");
    }

    #[test]
    fn test_parse_declaration() {
        let actions = AllowedActions::parse_declaration("edit, delete");
        assert!(actions.contains(Action::Edit));
        assert!(actions.contains(Action::Delete));
        assert!(!actions.contains(Action::Create));

        let actions = AllowedActions::parse_declaration("create edit bogus");
        assert_eq!(actions, [Action::Create, Action::Edit].into_iter().collect());
        assert!(AllowedActions::parse_declaration("  ").is_empty());
    }

    #[test]
    fn test_allowed_actions_display() {
        assert_eq!(AllowedActions::all().to_string(), "{create, edit, delete}");
        assert_eq!(AllowedActions::none().to_string(), "{}");
    }

    #[test]
    fn test_response_accessors() {
        let ok = Response::success("<div>post</div>");
        assert!(!ok.is_error());
        assert_eq!(ok.content(), "<div>post</div>");
        assert_eq!(ok.first_error(), None);

        let err = Response::Error {
            code: Some(422),
            errors: vec!["Message cannot be blank.".into(), "Too short".into()],
        };
        assert!(err.is_error());
        assert_eq!(err.content(), "");
        assert_eq!(err.first_error(), Some("Message cannot be blank."));
    }

    #[test]
    fn test_form_set_field() {
        let mut form = Form {
            action: "/content/save".into(),
            method: FormMethod::Post,
            fields: vec![("message".into(), "old".into())],
        };
        form.set_field("message", "new");
        form.set_field("visibility", "1");
        assert_eq!(form.field("message"), Some("new"));
        assert_eq!(form.field("visibility"), Some("1"));
        assert_eq!(form.fields.len(), 2);
    }
}
