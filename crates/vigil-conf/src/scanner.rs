//! Block scanner.
//!
//! Consumes the token stream produced by the tokenizer, invokes the
//! matching handler for each line and recurses into nested blocks. The
//! only non-linear control transfer is block abort: when a handler
//! returns [`HandlerAction::AbortBlock`], the remaining lines of the
//! current block (including nested blocks) are consumed without dispatch
//! and the block's end-of-block handler is suppressed, so a rolled-back
//! record is never seen by later validation.

use tracing::warn;

use crate::error::{ConfError, ConfResult};
use crate::keywords::{HandlerAction, Keyword, KeywordTable};
use crate::tokenizer::Line;

/// How a block finished scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockOutcome {
    /// The closing brace was reached with no abort.
    Completed,
    /// A handler aborted the block; the rest of it has been consumed.
    Aborted,
}

/// Dispatches the whole token stream against `table`.
///
/// Owns no state across calls; a fresh context and table per load keep
/// configuration reloads fully independent.
pub fn process_stream<C>(table: &KeywordTable<C>, ctx: &mut C, lines: &[Line]) -> ConfResult<()> {
    let mut pos = 0;

    while pos < lines.len() {
        let line = &lines[pos];
        pos += 1;

        if line.closes_block() {
            warn!("Unexpected '}}' at line {}, ignoring", line.lineno());
            continue;
        }

        match table.find_root(line.keyword()) {
            Some(kw) => {
                // A root's abort has no enclosing block to propagate to.
                let _ = dispatch_keyword(kw, ctx, line, lines, &mut pos)?;
            }
            None => {
                warn!(
                    "Unknown keyword '{}' at line {}, ignoring",
                    line.keyword(),
                    line.lineno()
                );
                if line.opens_block() {
                    skip_block(lines, &mut pos, line.lineno())?;
                }
            }
        }
    }

    Ok(())
}

/// Handles one keyword occurrence at any nesting level.
///
/// The returned action is the line's effect on the *enclosing* block: an
/// abort raised inside a block this keyword itself opened is contained
/// here and not propagated.
fn dispatch_keyword<C>(
    kw: &Keyword<C>,
    ctx: &mut C,
    line: &Line,
    lines: &[Line],
    pos: &mut usize,
) -> ConfResult<HandlerAction> {
    if !kw.is_active() {
        if line.opens_block() {
            skip_block(lines, pos, line.lineno())?;
        }
        return Ok(HandlerAction::Continue);
    }

    let action = match kw.handler() {
        Some(handler) => handler(ctx, line),
        None => HandlerAction::Continue,
    };

    if line.opens_block() {
        match action {
            HandlerAction::AbortBlock => skip_block(lines, pos, line.lineno())?,
            HandlerAction::Continue => {
                if process_block(kw, ctx, lines, pos, line.lineno())? == BlockOutcome::Completed {
                    if let Some(end_handler) = kw.end_handler() {
                        end_handler(ctx);
                    }
                }
            }
        }
        Ok(HandlerAction::Continue)
    } else {
        // A block keyword written without a block is a complete, empty
        // block: validate it right away.
        if action == HandlerAction::Continue {
            if let Some(end_handler) = kw.end_handler() {
                end_handler(ctx);
            }
        }
        Ok(action)
    }
}

/// Scans the body of an open block until its closing brace.
fn process_block<C>(
    kw: &Keyword<C>,
    ctx: &mut C,
    lines: &[Line],
    pos: &mut usize,
    open_lineno: usize,
) -> ConfResult<BlockOutcome> {
    while *pos < lines.len() {
        let line = &lines[*pos];
        *pos += 1;

        if line.closes_block() {
            return Ok(BlockOutcome::Completed);
        }

        match kw.find_child(line.keyword()) {
            Some(child) => {
                if dispatch_keyword(child, ctx, line, lines, pos)? == HandlerAction::AbortBlock {
                    skip_block(lines, pos, line.lineno())?;
                    return Ok(BlockOutcome::Aborted);
                }
            }
            None => {
                warn!(
                    "Unknown keyword '{}' at line {}, ignoring",
                    line.keyword(),
                    line.lineno()
                );
                if line.opens_block() {
                    skip_block(lines, pos, line.lineno())?;
                }
            }
        }
    }

    Err(ConfError::UnclosedBlock { line: open_lineno })
}

/// Consumes lines up to and including the closing brace of the block that
/// is currently open, tracking nested blocks.
fn skip_block(lines: &[Line], pos: &mut usize, open_lineno: usize) -> ConfResult<()> {
    let mut depth = 1usize;

    while *pos < lines.len() {
        let line = &lines[*pos];
        *pos += 1;

        if line.closes_block() {
            depth -= 1;
            if depth == 0 {
                return Ok(());
            }
        } else if line.opens_block() {
            depth += 1;
        }
    }

    Err(ConfError::UnclosedBlock { line: open_lineno })
}
