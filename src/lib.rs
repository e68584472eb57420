//! Compliance and blacklist matching engine for FiveM DB lookups.
//!
//! A query runs through the content filter, the IP and Code of Conduct
//! keyword scanners, and finally the blacklist matcher. The first stage
//! that finds something decides the result.

pub mod cache;
pub mod checker;
pub mod config;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod health;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod scanner;
pub mod source;
pub mod supabase;
pub mod web;
