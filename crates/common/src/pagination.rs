use crate::models::RecordPage;

/// How many pages either side of the current one stay visible.
const WINDOW: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Previous { target: u32, enabled: bool },
    Page { number: u32, current: bool },
    Gap,
    Next { target: u32, enabled: bool },
}

/// Builds the pagination strip for `page` of `pages`.
///
/// The current page is shown with up to two neighbours on each side. The
/// first and last pages are always reachable; a [`PageLink::Gap`] is only
/// inserted when the window stops more than one page short of them.
/// A single page (or none) produces an empty strip.
pub fn page_strip(page: u32, pages: u32) -> Vec<PageLink> {
    if pages <= 1 {
        return vec![];
    }
    let page = page.clamp(1, pages);
    let start = page.saturating_sub(WINDOW).max(1);
    let end = (page + WINDOW).min(pages);

    let mut strip = vec![PageLink::Previous {
        target: page.saturating_sub(1).max(1),
        enabled: page > 1,
    }];

    if start > 1 {
        strip.push(PageLink::Page {
            number: 1,
            current: false,
        });
        if start > 2 {
            strip.push(PageLink::Gap);
        }
    }

    strip.extend((start..=end).map(|number| PageLink::Page {
        number,
        current: number == page,
    }));

    if end < pages {
        if end < pages - 1 {
            strip.push(PageLink::Gap);
        }
        strip.push(PageLink::Page {
            number: pages,
            current: false,
        });
    }

    strip.push(PageLink::Next {
        target: (page + 1).min(pages),
        enabled: page < pages,
    });
    strip
}

/// "Showing 21-40 of 57" style summary for a fetched page.
pub fn pagination_info(page: &RecordPage) -> String {
    if page.total == 0 {
        return String::from("Showing 0 of 0");
    }
    let per_page = u64::from(page.per_page);
    let start = u64::from(page.page.saturating_sub(1)) * per_page + 1;
    let end = (u64::from(page.page) * per_page).min(page.total);
    format!("Showing {start}-{end} of {}", page.total)
}
