//! Brief template filler.
//!
//! Detects `Etiqueta:` label lines in a Markdown brief template, reconciles
//! caller-supplied data against the key set derived from those labels,
//! optionally enriches the result through a generative-model call, and
//! reassembles the document rewriting only the label lines. Everything else
//! stays byte-identical.

pub mod config;
pub mod error;
pub mod llm_client;
pub mod prompt_builder;
pub mod reconcile;
pub mod server;
pub mod slug;
pub mod template;
