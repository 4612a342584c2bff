//! Assistance service for migrant workers: a prompt-enhanced, streamed chat
//! relay over a hosted language model, speech transcription, conversation
//! storage and a small community forum.

pub mod ai;
pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod forum;
