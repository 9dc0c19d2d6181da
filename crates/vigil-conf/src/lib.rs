//! Common configuration-file infrastructure for vigil daemons.
//!
//! Every vigil daemon reads the same block-structured configuration text
//! but is only interested in a subset of its keywords. This crate provides
//! the shared machinery the per-daemon keyword modules plug into:
//!
//! - [`tokenizer`]: turns configuration text into ordered token lines
//! - [`keywords`]: ordered registry mapping a keyword, at a given nesting
//!   level, to a handler function
//! - [`scanner`]: drives the handlers over the token stream, recursing
//!   into nested blocks and handling block-abort recovery
//! - [`error`]: error types for the parse mechanism
//!
//! # Architecture
//!
//! A daemon builds a [`KeywordTable`] at startup, installing the keyword
//! set for its role, and then calls [`process_stream`] with a mutable
//! context value. Handlers communicate failure by returning
//! [`HandlerAction::AbortBlock`], which makes the scanner consume the
//! remainder of the current block and suppress its end-of-block handler.
//! Problems with the configuration *content* are therefore never errors at
//! this layer; [`ConfError`] is reserved for damage to the parse mechanism
//! itself (unreadable file, unterminated quote, unbalanced braces).

pub mod error;
pub mod keywords;
pub mod scanner;
pub mod tokenizer;

// Re-export commonly used items at crate root
pub use error::{ConfError, ConfResult};
pub use keywords::{BlockEndHandler, HandlerAction, Keyword, KeywordHandler, KeywordTable};
pub use scanner::process_stream;
pub use tokenizer::{tokenize, Line};
