//! vigil-bfdd - BFD neighbor-liveness configuration core for vigil
//!
//! Builds and validates the in-memory BFD instance records every vigil
//! daemon role consumes at runtime. The monitor role owns the instances;
//! the redundancy and checker roles keep name-based references to them.
//! Role-specific keyword activation lives in [`install_bfd_keywords`];
//! most users only need [`load_config_str`] / [`load_config_path`].

mod context;
mod instance;
mod keywords;
mod registry;
mod types;

pub use context::{BfdData, CheckerData, ParseContext, VrrpData};
pub use keywords::{install_bfd_keywords, load_config_path, load_config_str};
pub use types::*;
