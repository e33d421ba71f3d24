//! # Tessera Storage
//!
//! Crash-safe JSON document storage for Tessera.
//!
//! This crate is the lowest layer of project persistence. It stores
//! serializable documents at filesystem paths and knows nothing about
//! projects or transactions.
//!
//! ## Design Principles
//!
//! - A visible target file is only ever replaced by renaming a fully
//!   written temporary file over it
//! - Backups are written beside the original and never overwrite anything
//! - A missing file is a normal outcome of [`AtomicFileStore::load`], not an error
//! - Every I/O failure carries the path it happened on
//!
//! ## Example
//!
//! ```no_run
//! use tessera_storage::AtomicFileStore;
//! use std::path::Path;
//!
//! # async fn demo() -> tessera_storage::StoreResult<()> {
//! let store = AtomicFileStore::with_defaults();
//! let saved = store
//!     .save(Path::new("/tmp/projects"), "demo.json", &vec![1, 2, 3], false)
//!     .await?;
//! let loaded: Option<Vec<i32>> = store.load(&saved.path).await?;
//! assert_eq!(loaded, Some(vec![1, 2, 3]));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod file;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use file::{AtomicFileStore, SavedFile};
