//! # Permit Lookup
//!
//! A small lookup service that searches for a person by name or document
//! number across two heterogeneous sources — a PostgreSQL `orders` table and
//! a set of Google Sheets worksheets — merging the results into one canonical
//! response shape and recording an audit entry for every query.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐
//! │  PostgreSQL  │   │ Google Sheets │
//! │   (orders)   │   │  (cached)     │
//! └──────┬───────┘   └──────┬────────┘
//!        │ source_db        │ source_sheets
//!        ▼                  ▼
//!   ┌─────────────────────────────┐
//!   │     search (merge + tag)    │
//!   └─────────────┬───────────────┘
//!                 ▼
//!   ┌─────────────────────────────┐       ┌──────────┐
//!   │   audit (historial table)   │       │   CLI    │
//!   └─────────────────────────────┘       │   HTTP   │
//!                                         └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! permitd init                    # create/upgrade the audit table
//! permitd search "Maria Lopez"    # one-shot search from the terminal
//! permitd serve                   # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`normalize`] | Field-name normalization and record standardization |
//! | [`source_db`] | Relational search adapter (PostgreSQL) |
//! | [`source_sheets`] | Spreadsheet search adapter (Google Sheets) |
//! | [`sheets`] | Google Sheets REST client and the `SheetSource` seam |
//! | [`cache`] | TTL + LRU cache for fetched sheet rows |
//! | [`search`] | Fan-out and result merging |
//! | [`audit`] | Search history persistence and reporting |
//! | [`server`] | HTTP boundary (axum) |
//! | [`status`] | Source connectivity probes |
//! | [`db`] | Database connection |
//! | [`migrate`] | Audit table schema migrations |

pub mod audit;
pub mod cache;
pub mod config;
pub mod db;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod search;
pub mod server;
pub mod sheets;
pub mod source_db;
pub mod source_sheets;
pub mod status;
