#![cfg(test)]

pub mod common;
pub mod classpath_tests;
pub mod verification_tests;
