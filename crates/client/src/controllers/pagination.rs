//! Page-link generation for the roster table.

use std::str::FromStr;

use crate::state::RosterMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaginationStyle {
    /// Window plus first/last links.
    Simple,
    /// Window plus first/last links with `...` across gaps.
    Ellipsis,
}

impl FromStr for PaginationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(PaginationStyle::Simple),
            "ellipsis" => Ok(PaginationStyle::Ellipsis),
            other => Err(format!("Unknown pagination style: {other}")),
        }
    }
}

/// Page position, normalised so that `1 <= current_page <= total_pages`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    total_pages: u32,
    current_page: u32,
}

impl Pagination {
    pub fn new(total_pages: u32, current_page: u32) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            total_pages,
            current_page: current_page.clamp(1, total_pages),
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// First and last page of the visible window, centred on the current page.
    pub fn window(&self, width: u32) -> (u32, u32) {
        let width = width.clamp(1, self.total_pages);
        let mut start = self.current_page.saturating_sub(width / 2).max(1);
        let end = start.saturating_add(width - 1).min(self.total_pages);
        if end - start + 1 < width {
            start = (end + 1).saturating_sub(width).max(1);
        }
        (start, end)
    }

    pub fn links(&self, width: u32, style: PaginationStyle) -> Vec<PageLink> {
        let (start, end) = self.window(width);
        let total = self.total_pages;
        let current = self.current_page;
        let mut links = Vec::new();

        links.push(PageLink::Previous {
            target: (current > 1).then(|| current - 1),
        });

        if start > 1 {
            links.push(PageLink::Page {
                number: 1,
                active: false,
            });
            if style == PaginationStyle::Ellipsis && start > 2 {
                links.push(PageLink::Ellipsis);
            }
        }

        for number in start..=end {
            links.push(PageLink::Page {
                number,
                active: number == current,
            });
        }

        if end < total {
            if style == PaginationStyle::Ellipsis && end + 1 < total {
                links.push(PageLink::Ellipsis);
            }
            links.push(PageLink::Page {
                number: total,
                active: false,
            });
        }

        links.push(PageLink::Next {
            target: (current < total).then(|| current + 1),
        });

        links
    }
}

/// A rendered pagination control. `target: None` means disabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageLink {
    Previous { target: Option<u32> },
    Page { number: u32, active: bool },
    Ellipsis,
    Next { target: Option<u32> },
}

impl PageLink {
    /// Page a click on this link requests, if it is clickable.
    pub fn target(&self) -> Option<u32> {
        match self {
            PageLink::Previous { target } | PageLink::Next { target } => *target,
            PageLink::Page { number, .. } => Some(*number),
            PageLink::Ellipsis => None,
        }
    }
}

/// Pagination control tagged with the query mode its links re-issue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationBar {
    pub mode: RosterMode,
    pub pagination: Pagination,
    pub links: Vec<PageLink>,
}

impl PaginationBar {
    pub fn new(mode: RosterMode, pagination: Pagination, width: u32, style: PaginationStyle) -> Self {
        Self {
            links: pagination.links(width, style),
            mode,
            pagination,
        }
    }

    pub fn active_pages(&self) -> Vec<u32> {
        self.links
            .iter()
            .filter_map(|l| match l {
                PageLink::Page { number, active: true } => Some(*number),
                _ => None,
            })
            .collect()
    }
}
