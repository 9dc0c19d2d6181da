//! Keyword registry.
//!
//! An ordered registry mapping a keyword string, at a given nesting level,
//! to a handler. Root keywords open a block of child keywords; children
//! can nest further sublevels. The table is generic over the context type
//! threaded through every handler, so each daemon supplies its own
//! per-load state without any process-wide globals.

use crate::tokenizer::Line;

/// What a keyword handler asks the scanner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAction {
    /// Keep scanning the current block.
    Continue,
    /// Discard the remainder of the current block and suppress its
    /// end-of-block handler. Any partial state must already have been
    /// rolled back by the handler returning this.
    AbortBlock,
}

/// Handler invoked for one occurrence of a keyword line.
pub type KeywordHandler<C> = fn(&mut C, &Line) -> HandlerAction;

/// Handler invoked when a block closes normally.
pub type BlockEndHandler<C> = fn(&mut C);

/// One registered keyword and the block scoped under it.
pub struct Keyword<C> {
    name: &'static str,
    handler: Option<KeywordHandler<C>>,
    end_handler: Option<BlockEndHandler<C>>,
    active: bool,
    children: Vec<Keyword<C>>,
}

impl<C> std::fmt::Debug for Keyword<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyword")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("has_handler", &self.handler.is_some())
            .field("has_end_handler", &self.end_handler.is_some())
            .field("children", &self.children)
            .finish()
    }
}

impl<C> Keyword<C> {
    fn new(name: &'static str, handler: Option<KeywordHandler<C>>, active: bool) -> Self {
        Self {
            name,
            handler,
            end_handler: None,
            active,
            children: Vec::new(),
        }
    }

    /// Keyword string this entry matches.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// False if the whole block under this keyword is to be skipped
    /// without dispatching any handler.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Handler for the keyword line itself; `None` means the keyword is
    /// accepted but ignored.
    pub fn handler(&self) -> Option<KeywordHandler<C>> {
        self.handler
    }

    /// Handler to run when this keyword's block closes normally.
    pub fn end_handler(&self) -> Option<BlockEndHandler<C>> {
        self.end_handler
    }

    /// Looks up a child keyword of this block by name.
    pub fn find_child(&self, name: &str) -> Option<&Keyword<C>> {
        self.children.iter().find(|k| k.name == name)
    }
}

/// Ordered keyword registry for one configuration load.
///
/// Installation mirrors the classic stateful style: [`install_root`]
/// starts a new root-level block which subsequent [`install_keyword`]
/// calls populate; [`install_sublevel`] / [`install_sublevel_end`] descend
/// into and out of the most recently installed child.
///
/// [`install_root`]: KeywordTable::install_root
/// [`install_keyword`]: KeywordTable::install_keyword
/// [`install_sublevel`]: KeywordTable::install_sublevel
/// [`install_sublevel_end`]: KeywordTable::install_sublevel_end
pub struct KeywordTable<C> {
    roots: Vec<Keyword<C>>,
    // Path of child indices from the current root to the install level.
    cursor: Vec<usize>,
}

impl<C> KeywordTable<C> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            cursor: Vec::new(),
        }
    }

    fn current_mut(&mut self) -> Option<&mut Keyword<C>> {
        let mut indices = self.cursor.iter();
        let mut kw = self.roots.get_mut(*indices.next()?)?;
        for &i in indices {
            kw = kw.children.get_mut(i)?;
        }
        Some(kw)
    }

    /// Installs a root keyword and makes its block the install level.
    ///
    /// An inactive root keeps the keyword recognized (so shared
    /// configuration text parses identically for every daemon) while its
    /// whole block is skipped without dispatch.
    pub fn install_root(&mut self, name: &'static str, handler: KeywordHandler<C>, active: bool) {
        self.roots.push(Keyword::new(name, Some(handler), active));
        self.cursor = vec![self.roots.len() - 1];
    }

    /// Installs a keyword in the block at the current install level.
    pub fn install_keyword(&mut self, name: &'static str, handler: KeywordHandler<C>) {
        self.install(name, Some(handler));
    }

    /// Installs `handler` when `want_handler`, otherwise the keyword is
    /// accepted but ignored.
    pub fn install_keyword_conditional(
        &mut self,
        name: &'static str,
        handler: KeywordHandler<C>,
        want_handler: bool,
    ) {
        self.install(name, want_handler.then_some(handler));
    }

    fn install(&mut self, name: &'static str, handler: Option<KeywordHandler<C>>) {
        debug_assert!(!self.cursor.is_empty(), "no root keyword installed");
        if let Some(kw) = self.current_mut() {
            kw.children.push(Keyword::new(name, handler, true));
        }
    }

    /// Descends into the most recently installed keyword's block.
    pub fn install_sublevel(&mut self) {
        let child_count = match self.current_mut() {
            Some(kw) => kw.children.len(),
            None => return,
        };
        if child_count > 0 {
            self.cursor.push(child_count - 1);
        }
    }

    /// Returns to the parent block.
    pub fn install_sublevel_end(&mut self) {
        if self.cursor.len() > 1 {
            self.cursor.pop();
        }
    }

    /// Sets the end-of-block handler for the current install level.
    pub fn install_end_handler(&mut self, handler: BlockEndHandler<C>) {
        if let Some(kw) = self.current_mut() {
            kw.end_handler = Some(handler);
        }
    }

    /// Looks up a root keyword by name.
    pub fn find_root(&self, name: &str) -> Option<&Keyword<C>> {
        self.roots.iter().find(|k| k.name == name)
    }
}

impl<C> Default for KeywordTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for KeywordTable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordTable")
            .field("roots", &self.roots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(ctx: &mut u32, _line: &Line) -> HandlerAction {
        *ctx += 1;
        HandlerAction::Continue
    }

    fn close(ctx: &mut u32) {
        *ctx += 100;
    }

    #[test]
    fn test_root_and_children() {
        let mut table: KeywordTable<u32> = KeywordTable::new();
        table.install_root("outer", touch, true);
        table.install_keyword("child", touch);
        table.install_keyword_conditional("ignored", touch, false);
        table.install_end_handler(close);

        let root = table.find_root("outer").unwrap();
        assert!(root.is_active());
        assert!(root.handler().is_some());
        assert!(root.end_handler().is_some());
        assert!(root.find_child("child").unwrap().handler().is_some());
        assert!(root.find_child("ignored").unwrap().handler().is_none());
        assert!(root.find_child("missing").is_none());
    }

    #[test]
    fn test_sublevel_install() {
        let mut table: KeywordTable<u32> = KeywordTable::new();
        table.install_root("outer", touch, true);
        table.install_keyword("mid", touch);
        table.install_sublevel();
        table.install_keyword("leaf", touch);
        table.install_end_handler(close);
        table.install_sublevel_end();
        table.install_keyword("sibling", touch);

        let root = table.find_root("outer").unwrap();
        let mid = root.find_child("mid").unwrap();
        assert!(mid.find_child("leaf").is_some());
        assert!(mid.end_handler().is_some());
        assert!(root.find_child("sibling").is_some());
        assert!(root.find_child("leaf").is_none());
    }

    #[test]
    fn test_inactive_root() {
        let mut table: KeywordTable<u32> = KeywordTable::new();
        table.install_root("outer", touch, false);
        assert!(!table.find_root("outer").unwrap().is_active());
    }

    #[test]
    fn test_new_root_resets_install_level() {
        let mut table: KeywordTable<u32> = KeywordTable::new();
        table.install_root("first", touch, true);
        table.install_keyword("a", touch);
        table.install_root("second", touch, true);
        table.install_keyword("b", touch);

        assert!(table.find_root("first").unwrap().find_child("b").is_none());
        assert!(table.find_root("second").unwrap().find_child("b").is_some());
    }
}
