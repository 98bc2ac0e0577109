//! # Corpus Curator
//!
//! A staged curation pipeline for assembling a Tamil-language text dataset.
//!
//! Content moves through three sequential, human-curated stages: raw
//! collection, cleaning, and chunking. Every submission lands in a pending
//! queue; an admin approves it (making it visible to the next stage and
//! eligible for export) or rejects it (deleting it). Approved content is
//! pushed in bulk to an external dataset repository.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌───────────┐
//! │    Raw    │──▶│  Cleaning │──▶│  Chunking │
//! │  submit   │   │  submit   │   │  submit   │
//! └─────┬─────┘   └─────┬─────┘   └─────┬─────┘
//!       │  pending      │  pending      │  pending
//!       ▼               ▼               ▼
//!   ┌────────────────────────────────────────┐
//!   │       Admin review (approve/reject)    │
//!   └───────────────────┬────────────────────┘
//!                       │  approved
//!                       ▼
//!              ┌─────────────────┐
//!              │   Dataset hub   │
//!              └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! curator init                  # create the data directories
//! curator serve                 # start the HTTP server
//! curator stats                 # show queue counts
//! curator push all              # push approved content to the hub
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`store`] | File-backed content store |
//! | [`raw`] | Raw document submission |
//! | [`cleaning`] | Cleaning stage |
//! | [`chunking`] | Chunking stage |
//! | [`approval`] | Review actions and queue views |
//! | [`hub`] | Dataset hub client |
//! | [`export`] | Bulk export of approved content |
//! | [`server`] | Curation HTTP server |

pub mod approval;
pub mod chunking;
pub mod cleaning;
pub mod config;
pub mod error;
pub mod export;
pub mod hub;
pub mod models;
pub mod raw;
pub mod server;
pub mod store;
