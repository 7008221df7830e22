//! tests/mod.rs

mod classifier_tests;
mod config_tests;
mod dispatch_tests;
mod store_tests;
