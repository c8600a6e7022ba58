//! # LeadChat Core
//!
//! Domain types, traits, and error definitions for the LeadChat widget backend.
//! This crate has **zero framework dependencies**: it defines the domain model
//! that the provider, storage, email and gateway crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (text generation, lead storage, email) is a
//! trait here. Implementations live in their respective crates, so the HTTP
//! layer can be tested with scripted stand-ins.

pub mod error;
pub mod message;
pub mod persona;
pub mod conversation;
pub mod provider;
pub mod lead;
pub mod notify;

// Re-export key types at crate root for ergonomics
pub use error::{ChatError, LeadError, NotifyError, ProviderError};
pub use message::{Role, Turn};
pub use persona::PersonaConfig;
pub use conversation::{ConversationReply, ConversationRequest, FALLBACK_REPLY, assemble, interpret_reply};
pub use provider::{Choice, ChoiceMessage, Provider, ProviderRequest, ProviderResponse, Usage};
pub use lead::{Lead, LeadStats, LeadStore, NewLead, collect_stats};
pub use notify::{Email, Mailer};
