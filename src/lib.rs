//! Login-gated chatbots backed by the OpenAI API.
//!
//! Two applications share the plumbing here:
//!
//! - `docs` answers questions from a small set of in-memory company documents
//!   (embedding search, then one completion call with the hits as context);
//! - `nutritionist` wraps each user turn in a dietitian persona prompt and
//!   replays the conversation so far.
//!
//! Both sit behind a [`auth::Gatekeeper`] and are served by
//! [`web_server`] or the terminal loop in [`chat`].

pub mod answerer;
pub mod auth;
pub mod bot;
pub mod chat;
pub mod config;
pub mod constants;
pub mod document_store;
pub mod embedding;
pub mod error;
pub mod llm_interaction;
pub mod persona;
pub mod session;
pub mod web_server;

pub use auth::{Gatekeeper, LoginOutcome, LoginState};
pub use bot::{build_bot, AppKind, ChatBot, Exchange};
pub use config::{Credentials, Settings};
pub use error::{ChatError, ChatResult};
