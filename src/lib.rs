//! # companyfacts
//!
//! Turns the SEC's bulk company-facts archive into compact per-filer
//! documents: one concept table is chosen per filer, each concept's facts are
//! de-duplicated by period end and filtered by date and form type, and filers
//! left with too little data are dropped.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────────────────┐   ┌──────────┐
//! │  acquire   │──▶│ batch → transform → reduce →     │──▶│  files   │
//! │ (zip/http) │   │         normalize (per fact)     │   │  SQLite  │
//! └────────────┘   └──────────────────────────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cfx init          # create database
//! cfx fetch         # download and extract the archive
//! cfx transform     # write filtered documents
//! cfx load          # store them in SQLite
//! cfx get 320193
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Raw and normalized document types |
//! | [`normalize`] | Per-fact inclusion rule |
//! | [`reduce`] | Per-concept de-duplication |
//! | [`transform`] | Per-document taxonomy selection and keep/drop |
//! | [`batch`] | Directory-level driver |
//! | [`acquire`] | Archive download and extraction |
//! | [`store`] | Storage trait with SQLite and in-memory backends |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod acquire;
pub mod batch;
pub mod config;
pub mod db;
pub mod error;
pub mod get;
pub mod load;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod reduce;
pub mod stats;
pub mod store;
pub mod transform;
