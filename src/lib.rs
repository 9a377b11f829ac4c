//! trishul-link - real-time connectivity layer for the Trishul SNMP console.
//!
//! One transport session keeps a WebSocket channel to the console backend
//! alive, decodes its push notifications into typed events on an
//! [`EventBus`](events::EventBus), and a [`Router`](router::Router) keeps
//! exactly one module subscribed, re-seeding it over REST whenever the
//! channel (re)opens.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod models;
pub mod modules;
pub mod router;
pub mod traits;
pub mod websocket;
