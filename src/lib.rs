//! Pixel Brawl - deterministic simulation core for a two-fighter arcade brawler
//!
//! The simulation is a pure per-tick state machine (`game`). Input mapping
//! lives in `input`; `app` drives a match on a tokio interval for headless
//! hosts.

pub mod app;
pub mod config;
pub mod game;
pub mod input;
pub mod util;
