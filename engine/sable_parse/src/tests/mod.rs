//! Parser tests.
//!
//! Grammar-table and tree tests live next to their modules; everything
//! exercising the full backtracking/memoization machinery lives here.

mod parser;
