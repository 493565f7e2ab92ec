//! Binding validation errors and semantic failures.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use sable_diagnostic::{line_col_range, Diagnostic, ErrorCode, LineCol};
use sable_ir::Span;
use sable_parse::NodeRef;

/// A domain error raised inside a semantic action. The dispatcher wraps it
/// with the offending node's position as a [`SemanticError`].
#[derive(Debug)]
pub struct ActionError {
    message: String,
    cause: Option<Box<dyn Error + Send + Sync>>,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        ActionError {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap an underlying error with a message.
    pub fn with_cause(
        message: impl Into<String>,
        cause: impl Error + Send + Sync + 'static,
    ) -> Self {
        ActionError {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn Error + 'static))
    }
}

/// Build-time binding errors, surfaced by [`Dispatcher::new`].
///
/// [`Dispatcher::new`]: crate::Dispatcher::new
#[derive(Debug, Error)]
pub enum BindError {
    /// A terminal action targets a token type the lexicon does not define.
    #[error("module `{owner}` binds a terminal action to unknown token type `{type_name}`")]
    UnknownTerminal { type_name: String, owner: String },

    /// A rule action targets a head the grammar does not define.
    #[error("module `{owner}` binds a rule action to unknown rule `{head}`")]
    UnknownRule { head: String, owner: String },

    /// A rule action declares a child prefix no alternative of the head
    /// starts with.
    #[error("module `{owner}` binds a rule action to `{head}` with prefix [{prefix}], which no alternative starts with")]
    UnknownRulePrefix {
        head: String,
        prefix: String,
        owner: String,
    },

    /// Two terminal actions for one token type at the same composition
    /// depth from the same module.
    #[error("module `{owner}` binds two terminal actions to token type `{type_name}`")]
    DuplicateTerminal { type_name: String, owner: String },

    /// Two rule actions with an identical (head, prefix) pattern that
    /// cannot be ordered: same module, or equal composition depth.
    #[error("conflicting rule actions for `{head}` with identical prefixes (module `{owner}`)")]
    DuplicateRule { head: String, owner: String },

    /// A buffer-keeping action on the axiom, which must reduce to at most
    /// one value.
    #[error("the axiom rule `{head}` cannot have a buffer-keeping action")]
    AxiomKeepBuffer { head: String },
}

impl BindError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BindError::UnknownTerminal { .. } => ErrorCode::E2001,
            BindError::UnknownRule { .. } | BindError::UnknownRulePrefix { .. } => ErrorCode::E2002,
            BindError::DuplicateTerminal { .. } => ErrorCode::E2003,
            BindError::DuplicateRule { .. } => ErrorCode::E2004,
            BindError::AxiomKeepBuffer { .. } => ErrorCode::E2005,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code()).with_message(self.to_string())
    }
}

/// A semantic action failed: the action's error, wrapped with the
/// offending node's text and position, and tagged with the module that
/// registered the action.
#[derive(Debug)]
pub struct SemanticError {
    pub message: String,
    /// The offending node's matched text.
    pub token: Box<str>,
    pub span: Span,
    pub start: LineCol,
    pub end: LineCol,
    /// Owner tag of the binding whose action failed.
    pub tag: Option<Arc<str>>,
    cause: Option<Box<dyn Error + Send + Sync>>,
}

impl SemanticError {
    pub(crate) fn wrap(error: ActionError, node: NodeRef<'_>, tag: &Arc<str>) -> Self {
        let span = node.span();
        let (start, end) = line_col_range(node.tree().source(), span);
        SemanticError {
            message: error.message,
            token: node.text().into(),
            span,
            start,
            end,
            tag: Some(Arc::clone(tag)),
            cause: error.cause,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(ErrorCode::E3001)
            .with_message(&self.message)
            .with_label(self.span, "in this construct");
        if let Some(tag) = &self.tag {
            diag = diag.with_note(format!("reported by module `{tag}`"));
        }
        diag
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}, column {}] ",
            self.start.line, self.start.column
        )?;
        if let Some(tag) = &self.tag {
            write!(f, "{tag}: ")?;
        }
        f.write_str(&self.message)
    }
}

impl Error for SemanticError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn Error + 'static))
    }
}

/// Failure of one [`analyze`](crate::Dispatcher::analyze) walk.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// An action raised a domain error; the walk was aborted.
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// The axiom node's buffer held more than one value after the walk.
    /// This is a defect in the language definition, distinct from an
    /// ordinary semantic error.
    #[error("the axiom rule `{head}` left {count} results in the buffer; at most one is allowed")]
    AxiomValues { head: String, count: usize },
}

impl AnalyzeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalyzeError::Semantic(_) => ErrorCode::E3001,
            AnalyzeError::AxiomValues { .. } => ErrorCode::E3002,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            AnalyzeError::Semantic(err) => err.to_diagnostic(),
            AnalyzeError::AxiomValues { .. } => {
                Diagnostic::error(self.code()).with_message(self.to_string())
            }
        }
    }
}
