//! Pagination window calculator
//!
//! Produces a pager of at most about seven page links split into three
//! groups (lead, middle, tail) with ellipses between non-empty groups.

use serde::{Deserialize, Serialize};

/// Pagers up to this many pages list every page
pub const MAX_ENTRIES: usize = 7;

/// Current pages below this keep the lead group expanded
const LEAD_EXPANDED_BELOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationPlan {
    pub lead: Vec<usize>,
    pub middle: Vec<usize>,
    pub tail: Vec<usize>,
    pub current_page: usize,
    pub total_pages: usize,
}

/// One rendered pager element, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagerEntry {
    Previous { enabled: bool },
    Page { number: usize, is_current: bool },
    Ellipsis,
    Next { enabled: bool },
}

impl PaginationPlan {
    /// Compute the pager for `current_page` of `total_pages`
    ///
    /// `current_page` is not checked against `total_pages`; a page past the end
    /// still yields a plan. Page 0 is treated as page 1.
    pub fn compute(total_pages: usize, current_page: usize) -> Self {
        let current_page = current_page.max(1);

        if total_pages <= MAX_ENTRIES {
            return Self {
                lead: (1..=total_pages).collect(),
                middle: Vec::new(),
                tail: Vec::new(),
                current_page,
                total_pages,
            };
        }

        let mut lead: Vec<usize> = if current_page < LEAD_EXPANDED_BELOW {
            (1..=total_pages.min(4)).collect()
        } else {
            vec![1, 2]
        };

        let mut middle: Vec<usize> =
            if current_page >= LEAD_EXPANDED_BELOW && current_page < total_pages {
                (current_page - 1..=(current_page + 1).min(total_pages)).collect()
            } else {
                Vec::new()
            };

        let tail: Vec<usize> = if current_page + 2 < total_pages {
            vec![total_pages - 1, total_pages]
        } else {
            Vec::new()
        };

        // Fill toward MAX_ENTRIES so pagers near the end are not sparse
        let mut deficit = MAX_ENTRIES.saturating_sub(lead.len() + middle.len() + tail.len());
        if tail.is_empty() {
            if middle.is_empty() {
                middle.push(current_page);
                deficit = deficit.saturating_sub(1);
            }
            let first = middle[0];
            let fill = deficit.min(first.saturating_sub(1));
            let prefix: Vec<usize> = (first - fill..first).collect();
            middle.splice(0..0, prefix);
        } else if middle.is_empty() {
            let last = lead.len();
            lead.extend(last + 1..=last + deficit);
        }

        Self {
            lead,
            middle,
            tail,
            current_page,
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Page numbers of all groups, left to right
    pub fn pages(&self) -> Vec<usize> {
        self.groups().flatten().copied().collect()
    }

    fn groups(&self) -> impl Iterator<Item = &Vec<usize>> {
        [&self.lead, &self.middle, &self.tail].into_iter()
    }

    /// Render contract: previous control, groups with an ellipsis between any
    /// two adjacent non-empty groups, next control
    pub fn entries(&self) -> Vec<PagerEntry> {
        let mut entries = vec![PagerEntry::Previous {
            enabled: self.current_page != 1,
        }];

        let mut emitted_group = false;
        for group in self.groups().filter(|g| !g.is_empty()) {
            if emitted_group {
                entries.push(PagerEntry::Ellipsis);
            }
            entries.extend(group.iter().map(|&number| PagerEntry::Page {
                number,
                is_current: number == self.current_page,
            }));
            emitted_group = true;
        }

        entries.push(PagerEntry::Next {
            enabled: self.current_page != self.total_pages,
        });
        entries
    }
}

/// `ceil(total_results / page_size)`
pub fn total_pages(total_results: u64, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_results.div_ceil(page_size as u64) as usize
}
