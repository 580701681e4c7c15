//! Filesystem primitives for Stack Builder
//!
//! Provides the project file layout, atomic writes, change-aware writes,
//! content checksums and the per-project build lock.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod io;
pub mod lock;
pub mod store;

pub use checksum::{compute_content_checksum, compute_file_checksum};
pub use constants::ProjectPath;
pub use error::{Error, Result};
pub use io::{WriteStatus, read_text, write_atomic, write_if_changed};
pub use lock::ProjectLock;
pub use store::TomlStore;
