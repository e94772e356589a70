//! Data Transfer Objects for the queue exchanges
//!
//! This module contains the request and response bodies of the two
//! exchanges the worker performs against the remote queue: claiming the
//! next job and reporting a job outcome.

pub mod job;
