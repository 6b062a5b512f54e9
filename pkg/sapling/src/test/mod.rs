//! Fixtures for tests of this crate and the crates built on it
