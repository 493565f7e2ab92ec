//! End-to-end compiler tests: build, compile, and the failure surface.
