//! Page Composer
//!
//! Splits a flat result list into fixed-size pages.

use crate::models::Paper;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Contiguous pages of at most `page_size` papers. No papers, no pages.
pub fn paginate(papers: &[Paper], page_size: usize) -> Vec<&[Paper]> {
    papers.chunks(page_size.max(1)).collect()
}

/// Cursor over the pages of a result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    total: usize,
    index: usize,
}

impl Pager {
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            total,
            index: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    /// Zero-based index of the current page
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.page_count() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Papers on the current page
    pub fn current<'a>(&self, papers: &'a [Paper]) -> &'a [Paper] {
        paginate(papers, self.page_size)
            .get(self.index)
            .copied()
            .unwrap_or(&[])
    }

    /// Position of the first paper of the current page in the full list
    pub fn offset(&self) -> usize {
        self.index * self.page_size
    }

    pub fn label(&self) -> String {
        if self.page_count() == 0 {
            "No results".to_string()
        } else {
            format!("Page {} of {}", self.index + 1, self.page_count())
        }
    }
}
