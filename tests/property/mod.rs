//! Property-based tests

pub mod cart_proptest;
