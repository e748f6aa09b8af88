use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Renders a custom message for a `Type` error from the offending value.
pub type MessageFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Descriptive metadata attached to a node. None of it affects what a node
/// accepts; it only changes how the node and its errors are rendered.
#[derive(Clone, Default)]
pub struct Annotations {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub message: Option<MessageFn>,
}

impl Annotations {
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Annotations { identifier: Some(identifier.into()), ..Default::default() }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Annotations { description: Some(description.into()), ..Default::default() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_message<F>(mut self, message: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.message = Some(Arc::new(message));
        self
    }

    /// Fields set on `other` win.
    pub fn merge(&self, other: &Annotations) -> Annotations {
        Annotations {
            identifier: other.identifier.clone().or_else(|| self.identifier.clone()),
            title: other.title.clone().or_else(|| self.title.clone()),
            description: other.description.clone().or_else(|| self.description.clone()),
            message: other.message.clone().or_else(|| self.message.clone()),
        }
    }

    /// Name used for the node in messages: identifier, then title, then description.
    pub fn label(&self) -> Option<&str> {
        self.identifier
            .as_deref()
            .or(self.title.as_deref())
            .or(self.description.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.identifier.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.message.is_none()
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotations")
            .field("identifier", &self.identifier)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("message", &self.message.as_ref().map(|_| ".."))
            .finish()
    }
}
