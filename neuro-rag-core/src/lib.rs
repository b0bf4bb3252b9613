#![doc = "neuro-rag-core: core logic library for neuro-rag."]

//! This crate contains the document synchronisation and question answering logic for neuro-rag.
//! Transport to the hosted model lives behind the traits in [`contract`]; the HTTP client is
//! implemented by the CLI crate.
//!
//! # Usage
//! - [`synchronise::synchronise`] reconciles the local book folder with the remote file store.
//! - [`query::query`] asks the hosted model a question over the available files.

pub mod config;
pub mod contract;
pub mod error;
pub mod query;
pub mod scan;
pub mod synchronise;
pub mod upload;
