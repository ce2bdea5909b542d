//! Purpose: Typed client library for the Databricks REST API, shared by the `dbrest` CLI and tests.
//! Exports: `core` (errors, tagged-union and timestamp codecs) and `api` (client + resource wrappers).
//! Role: One HTTP request per method; JSON in, typed values out.
//! Invariants: Polymorphic fields always go through `core::union`; no untagged guessing.
//! Invariants: The client never retries, paginates or rate-limits on the caller's behalf.
pub mod api;
pub mod core;
