//! Core domain types
//!
//! These types represent the units of work handed out by the remote queue
//! and the outcome the worker produces for each of them. They are shared
//! between the queue client (wire decoding) and the worker (execution).

pub mod job;
pub mod pipeline;
