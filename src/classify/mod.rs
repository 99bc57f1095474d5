//! Offline artist-classification pipeline.
//!
//! Reads a ranked artist-frequency table, labels each artist with a
//! genre/energy/mood taxonomy via an external chat-completion model, and
//! writes a flat classification table. The model call is wrapped in a
//! bounded retry loop that degrades to a deterministic fallback record, so
//! one stubborn artist can never sink the batch.

pub mod batch;
pub mod classifier;
pub mod openai;
pub mod provider;

pub use classifier::{ArtistClassification, Classifier};
pub use openai::OpenAiChat;
pub use provider::{ChatModel, ModelError};
