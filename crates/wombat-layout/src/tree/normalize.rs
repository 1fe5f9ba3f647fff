//! Box-tree fix-ups run once after construction.
//!
//! [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
//!
//! "if a block container box has a block-level box inside it, then we force
//! it to have only block-level boxes inside it."

use super::{BoxId, BoxTree};
use crate::error::TreeError;
use crate::style::DisplayKind;

impl BoxTree {
    /// Normalize the subtree under `id`, children first.
    ///
    /// - inline boxes holding block-level children become blocks
    /// - whitespace-only text among block siblings is dropped
    /// - runs of inline children next to block siblings are wrapped in
    ///   anonymous blocks
    pub fn normalize(&mut self, id: BoxId) -> Result<(), TreeError> {
        for child in self.children(id).to_vec() {
            self.normalize(child)?;
        }

        let display = self[id].style.display;
        if display.is_inline() && self.has_block_children(id) {
            self[id].style.display = DisplayKind::Block;
        }

        let display = self[id].style.display;
        let table_structure = display.is_table()
            || matches!(
                display,
                DisplayKind::TableRow
                    | DisplayKind::TableRowGroup
                    | DisplayKind::TableHeaderGroup
                    | DisplayKind::TableFooterGroup
                    | DisplayKind::TableColumnGroup
            );

        if table_structure || self.has_block_children(id) {
            self.remove_whitespace_boxes(id)?;
        }
        if !table_structure && self.has_block_children(id) {
            self.wrap_inline_runs(id)?;
        }
        Ok(())
    }

    fn has_block_children(&self, id: BoxId) -> bool {
        self.children(id).iter().any(|&c| {
            let display = self[c].style.display;
            !display.is_inline() && display != DisplayKind::None
        })
    }

    fn remove_whitespace_boxes(&mut self, id: BoxId) -> Result<(), TreeError> {
        let blank: Vec<BoxId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|&c| {
                let node = &self[c];
                node.children().is_empty()
                    && !node.style.white_space.preserves_spaces()
                    && node
                        .text()
                        .is_some_and(|t| t.chars().all(char::is_whitespace))
            })
            .collect();
        for child in blank {
            self.remove(child)?;
        }
        Ok(())
    }

    fn wrap_inline_runs(&mut self, id: BoxId) -> Result<(), TreeError> {
        let children = self.children(id).to_vec();
        let mut run: Vec<BoxId> = Vec::new();
        for child in children.into_iter().map(Some).chain(std::iter::once(None)) {
            let is_inline = child.is_some_and(|c| self[c].style.display.is_inline());
            if is_inline {
                if let Some(c) = child {
                    run.push(c);
                }
                continue;
            }
            if let Some(&first) = run.first() {
                let block = self.create_anonymous_block(id, Some(first))?;
                for inline in run.drain(..) {
                    self.set_parent(inline, block)?;
                }
            }
        }
        Ok(())
    }
}
