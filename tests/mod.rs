//! Integration tests for subseek
//!
//! Tests are organized by component:
//! - parser_test: Subtitle formats parsed from disk
//! - cache_test: Parse cache hits, invalidation and encodings
//! - tracks_test: Embedded track extraction with a scripted extractor
//! - search_test: Dispatcher semantics and concurrency
//! - cli_test: Argument parsing, JSON output and shell input
//! - e2e_test: End-to-end flow tests (Scan -> Search -> Rescan -> Shutdown)

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
