//! # x2a-core
//!
//! Core types, ID generation, and error types for the x2a migration pipeline.
//!
//! This crate provides the foundational types shared across all x2a crates:
//! - Entity structs for projects, modules, jobs, and artifacts
//! - Phase, job status, artifact type, and project state enums
//! - ID prefix constants, generation, and format validation
//! - Cross-cutting error types
//! - API response and view types
//! - The pure status engine deriving module and project status from jobs
//! - JSON Schemas of the API payloads

pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod responses;
pub mod schema;
pub mod status;
