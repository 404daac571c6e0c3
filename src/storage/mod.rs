// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Relational source of truth.
//!
//! [`RelationalSource`] is the seam the batcher and the engine read rows
//! through. [`MemorySource`] backs tests; [`SqlSource`] reads MySQL or
//! SQLite via sqlx.

mod memory;
mod sql;
mod traits;

pub use memory::MemorySource;
pub use sql::SqlSource;
pub use traits::{validate_identifier, RelationalSource};
