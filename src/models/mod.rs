//! Domain model module declarations.

pub mod history;
pub mod suggestion;
pub mod target;
