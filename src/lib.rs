//! Personalized crypto-dashboard API: JWT auth, onboarding preferences,
//! cached third-party feeds with fallback payloads, and feedback votes.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod feeds;
pub mod preferences;
pub mod state;
