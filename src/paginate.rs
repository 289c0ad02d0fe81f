//! Page slicing for listings.
//!
//! An out-of-range page on a non-empty listing is not an empty page: it is
//! reported as [`Paginated::Redirect`] to the nearest valid page so the
//! caller can send the visitor there.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn prev_page(&self) -> Option<usize> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    pub fn next_page(&self) -> Option<usize> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paginated<T> {
    Page(Page<T>),
    Redirect { page: usize },
}

/// `max(1, ceil(len / page_size))`. A zero page size is treated as one.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Slice `items` into page `requested` (1-based).
pub fn paginate<T: Clone>(items: &[T], page_size: usize, requested: usize) -> Paginated<T> {
    let page_size = page_size.max(1);
    let total = total_pages(items.len(), page_size);

    if items.is_empty() {
        return Paginated::Page(Page {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            total_items: 0,
        });
    }

    if requested < 1 || requested > total {
        return Paginated::Redirect {
            page: requested.clamp(1, total),
        };
    }

    let start = (requested - 1) * page_size;
    let end = (start + page_size).min(items.len());
    Paginated::Page(Page {
        items: items[start..end].to_vec(),
        current_page: requested,
        total_pages: total,
        total_items: items.len(),
    })
}
