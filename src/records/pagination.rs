//! Page arithmetic for record listings.
//!
//! Pages are zero-based. A store fetches `size + 1` rows for a page and hands
//! them to [`Page::from_overfetch`], which trims the extra row and decides
//! whether a next page exists.

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// zero-based page index
    pub page: u32,
    /// items per page, already clamped
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: clamp_page_size(size),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Rows a store should fetch to detect a following page.
    pub fn fetch_limit(&self) -> u64 {
        u64::from(self.size) + 1
    }
}

pub fn clamp_page_size(size: u32) -> u32 {
    size.clamp(1, MAX_PAGE_SIZE)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn from_overfetch(mut rows: Vec<T>, req: PageRequest) -> Self {
        let size = req.size as usize;
        let next_page = if rows.len() > size {
            rows.truncate(size);
            req.page.checked_add(1)
        } else {
            None
        };
        Self {
            items: rows,
            next_page,
        }
    }
}
