//! Cross-crate integration tests for the AgentLink workspace live in
//! `tests/`.
