//! In-process storage for gate state that has no other home.

pub mod rounds;

pub use rounds::RoundStore;
