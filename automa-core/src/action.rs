//! Reversible actions recorded by the history engine.
//!
//! An [`Action`] pairs a forward effect with its inverse and owns the payload
//! both of them work on. The payload is handed out mutably to each effect so
//! that `forward` can stash whatever `backward` needs to restore.

use std::fmt;

use thiserror::Error;

/// Signature shared by forward and backward effects.
///
/// `T` is the edit target (usually the document), `D` the action payload.
pub type Effect<T, D> = Box<dyn Fn(&mut T, &mut D) -> anyhow::Result<()>>;

/// A reversible unit of edit history.
pub struct Action<T, D> {
    name: String,
    description: String,
    forward: Effect<T, D>,
    backward: Effect<T, D>,
    data: D,
}

impl<T, D> Action<T, D> {
    /// Create an action. Both effects are required; there is no way to build a
    /// half-formed action through this constructor.
    pub fn new<F, B>(
        name: impl Into<String>,
        description: impl Into<String>,
        forward: F,
        backward: B,
        data: D,
    ) -> Self
    where
        F: Fn(&mut T, &mut D) -> anyhow::Result<()> + 'static,
        B: Fn(&mut T, &mut D) -> anyhow::Result<()> + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            forward: Box::new(forward),
            backward: Box::new(backward),
            data,
        }
    }

    /// Start a builder, for callers that assemble effects piecemeal.
    pub fn builder(name: impl Into<String>) -> ActionBuilder<T, D> {
        ActionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Read-only view of the payload.
    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn apply(&mut self, target: &mut T) -> anyhow::Result<()> {
        (self.forward)(target, &mut self.data)
    }

    pub(crate) fn revert(&mut self, target: &mut T) -> anyhow::Result<()> {
        (self.backward)(target, &mut self.data)
    }
}

impl<T, D: fmt::Debug> fmt::Debug for Action<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Errors raised while assembling an [`Action`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("action name must not be empty")]
    EmptyName,

    #[error("action `{name}` has no forward effect")]
    MissingForward { name: String },

    #[error("action `{name}` has no backward effect")]
    MissingBackward { name: String },

    #[error("action `{name}` has no payload")]
    MissingData { name: String },
}

/// Incremental constructor for [`Action`].
///
/// Misuse (a missing effect or payload) is reported by [`ActionBuilder::build`]
/// so that pushing onto the history stays infallible for well-formed input.
pub struct ActionBuilder<T, D> {
    name: String,
    description: String,
    forward: Option<Effect<T, D>>,
    backward: Option<Effect<T, D>>,
    data: Option<D>,
}

impl<T, D> ActionBuilder<T, D> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            forward: None,
            backward: None,
            data: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn forward<F>(mut self, forward: F) -> Self
    where
        F: Fn(&mut T, &mut D) -> anyhow::Result<()> + 'static,
    {
        self.forward = Some(Box::new(forward));
        self
    }

    #[must_use]
    pub fn backward<B>(mut self, backward: B) -> Self
    where
        B: Fn(&mut T, &mut D) -> anyhow::Result<()> + 'static,
    {
        self.backward = Some(Box::new(backward));
        self
    }

    #[must_use]
    pub fn data(mut self, data: D) -> Self {
        self.data = Some(data);
        self
    }

    pub fn build(self) -> Result<Action<T, D>, ActionError> {
        if self.name.trim().is_empty() {
            return Err(ActionError::EmptyName);
        }
        let Some(forward) = self.forward else {
            return Err(ActionError::MissingForward { name: self.name });
        };
        let Some(backward) = self.backward else {
            return Err(ActionError::MissingBackward { name: self.name });
        };
        let Some(data) = self.data else {
            return Err(ActionError::MissingData { name: self.name });
        };
        Ok(Action {
            name: self.name,
            description: self.description,
            forward,
            backward,
            data,
        })
    }
}

impl<T, D: Default> ActionBuilder<T, D> {
    /// Use the payload's default value, for actions that carry no state.
    #[must_use]
    pub fn default_data(self) -> Self {
        self.data(D::default())
    }
}
