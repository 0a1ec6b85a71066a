//! SQL text helpers shared by the dialects

pub mod sql;
