//! Iscogram - photo-sharing web service core
//!
//! A write-through object cache in front of the relational store, with
//! per-entity hit/miss accounting, and per-route request latency
//! aggregation fed by an HTTP timing middleware.
//!
//! # Architecture
//! - `cache`: typed object cache over Redis / moka / null backends
//! - `metrics`: hit/miss counters, cache reporter, request aggregator
//! - `storage`: store boundary and the in-memory store
//! - `services`: read-through / write-through paths used by the handlers
//! - `api`: HTTP handlers and the timing middleware
//! - `config`: TOML + environment configuration
//! - `runtime`: startup, background tasks, graceful shutdown

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod metrics;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
