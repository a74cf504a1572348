//! ragchat: retrieval-augmented chat over a local document collection.
//!
//! Ingests text files into a Qdrant collection via OpenAI-compatible
//! embeddings, then answers questions grounded in the retrieved chunks
//! with source citations.

pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;

pub use models::Config;
