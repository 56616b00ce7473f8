//! Bounded-width page windows over an entry count.
//!
//! # Invariants
//! - Page numbers are 1-based.
//! - Windows for fewer than 18 pages list every page.
//! - A `Gap` never starts or ends a window and never sits between adjacent pages.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Page counts below this are shown in full.
const FULL_WINDOW_LIMIT: u32 = 18;
const EDGE_WIDTH: u32 = 4;
const LEADING_ZONE_LIMIT: u32 = 10;
const TRAILING_ZONE_SPAN: u32 = 9;
const PAGES_BEFORE_CURRENT: u32 = 4;
const PAGES_AFTER_CURRENT: u32 = 3;

/// One slot of a rendered page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSlot {
    Page(u32),
    /// Ellipsis between non-adjacent zones.
    Gap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    ZeroPageSize,
    PageOutOfRange { page: u32, total_pages: u32 },
}

impl Display for PaginationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroPageSize => write!(f, "page size must be greater than zero"),
            Self::PageOutOfRange { page, total_pages } => {
                write!(f, "page {page} is outside 1..={total_pages}")
            }
        }
    }
}

impl Error for PaginationError {}

/// `max(1, ceil(entry_count / page_size))`.
pub fn total_pages(entry_count: u64, page_size: u32) -> Result<u32, PaginationError> {
    if page_size == 0 {
        return Err(PaginationError::ZeroPageSize);
    }
    let pages = entry_count.div_ceil(u64::from(page_size)).max(1);
    Ok(u32::try_from(pages).unwrap_or(u32::MAX))
}

/// Splits `1..=total` into the zones shown around `current`.
///
/// # Errors
/// - `PageOutOfRange` when `current` is 0 or greater than `total`.
pub fn split_pages(current: u32, total: u32) -> Result<Vec<RangeInclusive<u32>>, PaginationError> {
    if current == 0 || current > total {
        return Err(PaginationError::PageOutOfRange {
            page: current,
            total_pages: total,
        });
    }

    if total < FULL_WINDOW_LIMIT {
        return Ok(vec![1..=total]);
    }

    let head = 1..=EDGE_WIDTH;
    let tail = total - (EDGE_WIDTH - 1)..=total;
    let zones = if current <= LEADING_ZONE_LIMIT {
        vec![1..=current + PAGES_AFTER_CURRENT, tail]
    } else if current > total - TRAILING_ZONE_SPAN {
        vec![head, current - PAGES_BEFORE_CURRENT..=total]
    } else {
        vec![
            head,
            current - PAGES_BEFORE_CURRENT..=current + PAGES_AFTER_CURRENT,
            tail,
        ]
    };
    Ok(zones)
}

/// Flattens zones into slots, merging touching zones and marking the rest with `Gap`.
pub fn unpack_window(zones: &[RangeInclusive<u32>]) -> Vec<PageSlot> {
    let mut slots = Vec::new();
    let mut last_page: Option<u32> = None;

    for zone in zones {
        for page in zone.clone() {
            match last_page {
                Some(last) if page <= last => continue,
                Some(last) if page > last + 1 => slots.push(PageSlot::Gap),
                _ => {}
            }
            slots.push(PageSlot::Page(page));
            last_page = Some(page);
        }
    }
    slots
}

/// `unpack_window(split_pages(current, total))`.
pub fn page_window(current: u32, total: u32) -> Result<Vec<PageSlot>, PaginationError> {
    Ok(unpack_window(&split_pages(current, total)?))
}
