//! Reel Core
//!
//! Core types shared by the Reel job-queue worker and its queue client.
//!
//! This crate contains:
//! - Domain types: jobs, their payloads, terminal statuses and pipeline results
//! - DTOs: wire shapes of the claim and report exchanges

pub mod domain;
pub mod dto;
