// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pretty printers for run summaries and deferred warnings.

use std::{borrow::Cow, sync::Mutex};

type Block = Vec<Cow<'static, str>>;

lazy_static::lazy_static! {
    static ref WARNINGS: Mutex<Vec<Block>> = Mutex::new(vec![]);
}

/// Prefix each line of each block with a box-drawing symbol; the first line of
/// a block gets a branch, the very last block's single line gets a corner.
fn tree_lines(blocks: &[Block]) -> impl Iterator<Item = String> + '_ {
    let num_blocks = blocks.len();
    blocks.iter().enumerate().flat_map(move |(i_block, block)| {
        let last_block = i_block + 1 == num_blocks;
        let num_lines = block.len();
        block.iter().enumerate().map(move |(i_line, line)| {
            let symbol = match i_line {
                0 if num_lines == 1 && last_block => '└',
                0 => '├',
                _ => '│',
            };
            format!("{symbol} {line}")
        })
    })
}

/// A titled summary of parsed parameters, written at info level.
pub(crate) struct InfoPrinter {
    title: Cow<'static, str>,
    blocks: Vec<Block>,
}

impl InfoPrinter {
    pub(crate) fn new(title: Cow<'static, str>) -> Self {
        Self {
            title,
            blocks: vec![],
        }
    }

    pub(crate) fn push_line(&mut self, line: Cow<'static, str>) {
        self.blocks.push(vec![line]);
    }

    pub(crate) fn push_block(&mut self, block: Block) {
        if !block.is_empty() {
            self.blocks.push(block);
        }
    }

    pub(crate) fn display(self) {
        log::info!("{}", console::style(self.title).bold());
        for line in tree_lines(&self.blocks) {
            log::info!("{line}");
        }
        log::info!("");
    }
}

/// Something that can be deferred to the warnings block.
pub(crate) trait Warn {
    fn warn(self);
}

fn push_warning(block: Block) {
    match WARNINGS.lock() {
        Ok(mut warnings) => warnings.push(block),
        // Don't lose a warning because another thread panicked.
        Err(poisoned) => poisoned.into_inner().push(block),
    }
}

impl Warn for &'static str {
    fn warn(self) {
        push_warning(vec![self.into()]);
    }
}

impl Warn for String {
    fn warn(self) {
        push_warning(vec![self.into()]);
    }
}

impl Warn for Cow<'static, str> {
    fn warn(self) {
        push_warning(vec![self]);
    }
}

impl Warn for Vec<Cow<'static, str>> {
    fn warn(self) {
        push_warning(self);
    }
}

impl<const N: usize> Warn for [Cow<'static, str>; N] {
    fn warn(self) {
        push_warning(self.to_vec());
    }
}

fn take_blocks() -> Vec<Block> {
    match WARNINGS.lock() {
        Ok(mut warnings) => std::mem::take(&mut *warnings),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    }
}

/// Print out (and forget) any warnings collected so far as one block.
pub(crate) fn display_warnings() {
    let blocks = take_blocks();
    log::debug!("Displaying {} warnings", blocks.len());
    if blocks.is_empty() {
        return;
    }

    log::warn!("{}", console::style("Warnings").bold());
    for line in tree_lines(&blocks) {
        log::warn!("{line}");
    }
    log::warn!("");
}

/// Drain the collected warnings without printing them.
#[cfg(test)]
pub(crate) fn take_warnings() -> Vec<Block> {
    take_blocks()
}
