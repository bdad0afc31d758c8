//! The SurfStore client's upload/download/delete logic, kept separate from
//! `main.rs`'s argument parsing so integration tests can drive it directly.

pub mod session;
