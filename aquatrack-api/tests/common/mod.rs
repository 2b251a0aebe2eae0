//! Shared test utilities for aquatrack integration tests
//!
//! - item lookup by name in a listed collection
//! - re-exports of the test context types
#![cfg(test)]
#![allow(dead_code)]

use aquatrack::prelude::*;

pub use aquatrack::test_util::{TestContext, TestError, TestResult, with_test_context};

/// Finds an item by name, as an assertion failure if it's missing
pub fn item_named<'a>(items: &'a [LocationItem], name: &str) -> TestResult<&'a LocationItem> {
    items
        .iter()
        .find(|item| item.name == name)
        .ok_or_else(|| TestError::Assertion {
            message: format!("item '{name}' not in listing"),
        })
}
