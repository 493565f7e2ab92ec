//! Core shared types for the Sable engine:
//! - [`Span`] for source locations
//! - [`Symbol`] for grammar production symbols (terminal / non-terminal)
//!
//! Everything in this crate is plain data, shared by the lexer, the parser
//! and the semantic dispatcher.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod span;
mod symbol;

pub use span::Span;
pub use symbol::{is_valid_rule_name, Symbol, RULE_NAME_PATTERN, TERMINAL_PREFIX};
