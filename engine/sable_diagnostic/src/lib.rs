//! Diagnostic and error reporting for the Sable engine.
//!
//! Every surfaced engine error carries an [`ErrorCode`] and can be rendered
//! as a [`Diagnostic`] with labeled source spans. Line/column derivation for
//! human-readable positions lives in [`span_utils`].

mod diagnostic;
mod error_code;
pub mod span_utils;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use span_utils::{line_col, line_col_range, LineCol};
