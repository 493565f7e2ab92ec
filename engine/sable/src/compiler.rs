//! The assembling façade: lexicon + grammar + actions = compiler.

use std::sync::Arc;

use thiserror::Error;

use sable_diagnostic::{Diagnostic, ErrorCode};
use sable_lexer::{Lexer, Lexicon, LexiconBuilder, LexiconError};
use sable_parse::{Grammar, GrammarError, Parser, SyntaxError, SyntaxTree};
use sable_semantic::{Actions, AnalyzeError, BindError, Dispatcher, SemanticError};

/// Build-phase failure: everything here fails fast, before any input is
/// compiled.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Lexicon(#[from] LexiconError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Bind(#[from] BindError),

    /// `build()` was called before any rule was registered.
    #[error("no grammar rules were registered")]
    EmptyGrammar,

    /// The configured axiom names no registered rule.
    #[error("the axiom `{head}` names no registered rule")]
    UnknownAxiom { head: String },
}

/// Failure of one `compile` call.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The input could not be parsed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A semantic action reported a domain error.
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// The axiom left more than one value in the results buffer - a
    /// defect in the language definition, not in the input.
    #[error("the axiom rule `{head}` left {count} results in the buffer; at most one is allowed")]
    AxiomValues { head: String, count: usize },
}

impl From<AnalyzeError> for CompileError {
    fn from(error: AnalyzeError) -> Self {
        match error {
            AnalyzeError::Semantic(err) => CompileError::Semantic(err),
            AnalyzeError::AxiomValues { head, count } => CompileError::AxiomValues { head, count },
        }
    }
}

impl CompileError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Syntax(err) => err.to_diagnostic(),
            CompileError::Semantic(err) => err.to_diagnostic(),
            CompileError::AxiomValues { .. } => {
                Diagnostic::error(ErrorCode::E3002).with_message(self.to_string())
            }
        }
    }
}

/// Builder collecting the lexicon, grammar and action table of a language.
pub struct CompilerBuilder<V> {
    lexicon: LexiconBuilder,
    grammar: Grammar,
    actions: Option<Actions<V>>,
    cache_capacity: usize,
}

impl<V> CompilerBuilder<V> {
    fn new() -> Self {
        CompilerBuilder {
            lexicon: LexiconBuilder::new(),
            grammar: Grammar::new(),
            actions: None,
            cache_capacity: Parser::DEFAULT_CACHE_CAPACITY,
        }
    }

    /// Register a token type.
    pub fn token_type(
        mut self,
        name: &str,
        pattern: &str,
        description: &str,
    ) -> Result<Self, BuildError> {
        self.lexicon.add_type(name, pattern, description, false)?;
        Ok(self)
    }

    /// Register a skippable token type, silently discarded when matched.
    pub fn skip_type(
        mut self,
        name: &str,
        pattern: &str,
        description: &str,
    ) -> Result<Self, BuildError> {
        self.lexicon.add_type(name, pattern, description, true)?;
        Ok(self)
    }

    /// Add a rule alternative; `$`-prefixed symbols are terminals. The
    /// first head registered becomes the axiom unless
    /// [`axiom`](CompilerBuilder::axiom) overrides it.
    pub fn rule(mut self, head: &str, production: &[&str]) -> Result<Self, BuildError> {
        self.grammar.add_rule(head, production)?;
        Ok(self)
    }

    /// Override the start head.
    #[must_use]
    pub fn axiom(mut self, head: &str) -> Self {
        self.grammar.set_axiom(head);
        self
    }

    /// Install the semantic action table. Without one, compilation still
    /// parses but produces no value.
    #[must_use]
    pub fn actions(mut self, actions: Actions<V>) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Bound the parser's memoization table; capacity 0 disables caching.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Freeze the language: validates the axiom and resolves every action
    /// binding against the grammar and lexicon.
    pub fn build(self) -> Result<Compiler<V>, BuildError> {
        let Some(axiom) = self.grammar.axiom() else {
            return Err(BuildError::EmptyGrammar);
        };
        if !self.grammar.contains(axiom) {
            return Err(BuildError::UnknownAxiom {
                head: axiom.as_ref().to_string(),
            });
        }

        let lexicon = Arc::new(self.lexicon.build());
        let actions = self.actions.unwrap_or_else(|| Actions::new("compiler"));
        let dispatcher = Dispatcher::new(actions, &self.grammar, &lexicon)?;
        Ok(Compiler {
            lexicon,
            grammar: self.grammar,
            dispatcher,
            cache_capacity: self.cache_capacity,
        })
    }
}

/// An immutable, assembled language: ready to compile any number of
/// sources, concurrently if `V` permits.
pub struct Compiler<V> {
    lexicon: Arc<Lexicon>,
    grammar: Grammar,
    dispatcher: Dispatcher<V>,
    cache_capacity: usize,
}

impl<V> Compiler<V> {
    pub fn builder() -> CompilerBuilder<V> {
        CompilerBuilder::new()
    }

    /// Tokenize, parse and analyze one source, producing the axiom's
    /// value (or `None` when the walk produced no value or was halted by
    /// a control signal).
    pub fn compile(&self, source: &str) -> Result<Option<V>, CompileError> {
        let tree = self.parse(source)?;
        Ok(self.dispatcher.analyze(&tree)?)
    }

    /// Parse one source without running semantic actions.
    pub fn parse(&self, source: &str) -> Result<SyntaxTree, SyntaxError> {
        let mut lexer = Lexer::new(Arc::clone(&self.lexicon), source);
        Parser::new(&self.grammar)
            .with_cache_capacity(self.cache_capacity)
            .parse(&mut lexer)
    }

    /// Run the semantic walk over an already-parsed tree.
    pub fn analyze(&self, tree: &SyntaxTree) -> Result<Option<V>, CompileError> {
        Ok(self.dispatcher.analyze(tree)?)
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }
}
