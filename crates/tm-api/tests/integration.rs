//! DB-backed integration suite. Requires a PostgreSQL instance reachable via
//! `TEST_DATABASE_URL`; each test is `#[ignore]`d so the default suite stays
//! green without one. Run with `cargo test -- --ignored`.

mod common;

mod comment_tests;
mod profile_tests;
mod progress_tests;
mod view_tests;
