//! Two-party computation on top of garbled circuits.

pub mod semihonest;
