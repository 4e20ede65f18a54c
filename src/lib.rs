//! # EcoMatch
//!
//! Eco product recommendations from free-text queries.
//!
//! The engine itself lives in [`ecomatch_core`]; this crate supplies the
//! native pieces around it: TOML configuration, SQLite / file / HTTP
//! catalog sources with a fetch timeout, schema setup and JSON import, and
//! the `ecomatch` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │   Sources    │──▶│ TimeoutSource │──▶│   Recommender    │
//! │ SQLite/File/ │   │               │   │ ArcSwap snapshot │
//! │ HTTP         │   └───────────────┘   └────────┬─────────┘
//! └──────────────┘                                │
//!                                                 ▼
//!                                   recommend / compare / catalog
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ecomatch init                         # create the SQLite schema
//! ecomatch import ./data/products.json  # load products
//! ecomatch recommend "recommend a small bottle"
//! ecomatch compare "EcoBag" "Plastic Bag" --json
//! ecomatch catalog --issues
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`import`] | JSON catalog import |
//! | [`decode`] | JSON payload decoding |
//! | [`source_sqlite`] | SQLite catalog source |
//! | [`source_file`] | File catalog source |
//! | [`source_http`] | HTTP catalog source |
//! | [`timeout`] | Fetch deadline adapter |
//! | [`sources`] | Source selection and status |
//! | [`recommend`] | `recommend` and `compare` commands |
//! | [`catalog`] | `catalog` command |

pub mod catalog;
pub mod config;
pub mod db;
pub mod decode;
pub mod import;
pub mod migrate;
pub mod recommend;
pub mod source_file;
pub mod source_http;
pub mod source_sqlite;
pub mod sources;
pub mod timeout;
