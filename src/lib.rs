//! # Intel Harness
//!
//! Bulk import and cross-entity search over threat-intelligence records
//! (forum posts, ransomware-leak entries, Telegram channels, sources) held
//! in an external record store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │ CSV file │──▶│ Import queue │──▶│ Record store │
//! └──────────┘   │ line by line │   │    (HTTP)    │
//!                └──────────────┘   └──────┬───────┘
//!                                          │ search
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │ (intel)  │       │  server  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! The algorithms (CSV parsing, filter evaluation, match scanning,
//! aggregation) live in `intel-harness-core`; this crate adds
//! configuration, the HTTP store client and the two host surfaces.
//!
//! ## Quick Start
//!
//! ```bash
//! intel fields --entity ransomware
//! intel forums
//! intel import posts.csv --forum 3f0c...
//! intel search "lockbit" --filter "DetectionDate:after:2024-01-01"
//! intel serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`http_store`] | Record store client |
//! | [`query_params`] | Search request encoding |
//! | [`import_cmd`] | `intel import` |
//! | [`search_cmd`] | `intel search` and the search view |
//! | [`forums`] | `intel forums` |
//! | [`fields`] | `intel fields` |
//! | [`progress`] | Import progress on stderr |
//! | [`logging`] | Tracing subscriber setup |
//! | [`server`] | HTTP server |

pub mod config;
pub mod fields;
pub mod forums;
pub mod http_store;
pub mod import_cmd;
pub mod logging;
pub mod progress;
pub mod query_params;
pub mod search_cmd;
pub mod server;
