use std::fmt;

use shared::protocol::View;

/// Pages kept on each side of the current page in the rendered control.
const PAGE_WINDOW: u32 = 2;

pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Backend view for a 1-indexed page. Page 0 is treated as page 1.
pub fn page_view(page: u32, page_size: u32) -> View {
    View {
        offset: u64::from(page.max(1) - 1) * u64::from(page_size),
        count: page_size,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// Compact pagination control for `current` out of `total_pages`.
///
/// Always lists the first and last page and every page within two of the
/// current one; any run of omitted pages collapses into one ellipsis. Empty
/// when there is at most one page.
pub fn pagination_range(current: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let window_start = current.saturating_sub(PAGE_WINDOW).max(1);
    let window_end = current.saturating_add(PAGE_WINDOW).min(total_pages);

    let mut items = Vec::new();
    let mut last_shown = 0;
    let pages = std::iter::once(1)
        .chain(window_start..=window_end)
        .chain(std::iter::once(total_pages));
    for page in pages {
        if page <= last_shown {
            continue;
        }
        if page > last_shown + 1 && last_shown != 0 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(page));
        last_shown = page;
    }
    items
}

pub fn has_prev_page(current: u32) -> bool {
    current > 1
}

pub fn has_next_page(current: u32, total_pages: u32) -> bool {
    current < total_pages
}
