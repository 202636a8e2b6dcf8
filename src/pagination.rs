use crate::errors::AppResult;
use crate::models::{DerivedPage, FilterSet, PageState};

/// Derives the rendered page from the full record set.
///
/// Records are filtered by a case-insensitive substring match of `search`
/// against any projected field, then the slice for the clamped page is taken.
pub fn derive_page<'a, T, F>(
    records: &'a [T],
    page: PageState,
    search: Option<&str>,
    project: F,
) -> DerivedPage<'a, T>
where
    F: Fn(&T) -> Vec<String>,
{
    // Only a blank term disables filtering; surrounding spaces are part of the match.
    let needle = search
        .filter(|value| !value.trim().is_empty())
        .map(str::to_lowercase);

    let filtered = records
        .iter()
        .filter(|record| match needle.as_deref() {
            Some(needle) => project(record)
                .iter()
                .any(|field| field.to_lowercase().contains(needle)),
            None => true,
        })
        .collect::<Vec<_>>();

    let filtered_count = filtered.len();
    let total_pages = page.total_pages(filtered_count);
    let effective_page = page.effective_page(filtered_count);
    let start = (effective_page - 1) * page.items_per_page();
    let slice = filtered
        .into_iter()
        .skip(start)
        .take(page.items_per_page())
        .collect();

    DerivedPage {
        slice,
        effective_page,
        total_pages,
        filtered_count,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Prev,
    Next,
    Last,
    To(usize),
}

/// Page, search term and filter set owned by one list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    page: PageState,
    search: String,
    filters: FilterSet,
}

impl ListQuery {
    pub fn new(items_per_page: usize) -> AppResult<Self> {
        Ok(Self {
            page: PageState::new(items_per_page)?,
            search: String::new(),
            filters: FilterSet::new(),
        })
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn current_page(&self) -> usize {
        self.page.current_page()
    }

    pub fn search(&self) -> Option<&str> {
        if self.search.trim().is_empty() {
            None
        } else {
            Some(self.search.as_str())
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
        self.page.set_current_page(1);
    }

    /// Replaces every filter at once and returns to the first page.
    pub fn set_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
        self.page.set_current_page(1);
    }

    pub fn clear(&mut self) {
        self.search.clear();
        self.filters = FilterSet::new();
        self.page.set_current_page(1);
    }

    pub fn derive<'a, T, F>(&self, records: &'a [T], project: F) -> DerivedPage<'a, T>
    where
        F: Fn(&T) -> Vec<String>,
    {
        derive_page(records, self.page, self.search(), project)
    }

    /// Applies a navigation against the current page count. Returns whether
    /// the page changed; boundary moves are no-ops.
    pub fn navigate(&mut self, navigation: Navigation, total_pages: usize) -> bool {
        let current = if total_pages == 0 {
            1
        } else {
            self.page.current_page().clamp(1, total_pages)
        };
        let target = match navigation {
            Navigation::First | Navigation::Prev if current <= 1 => return false,
            Navigation::Next | Navigation::Last if current >= total_pages => return false,
            Navigation::First => 1,
            Navigation::Prev => current - 1,
            Navigation::Next => current + 1,
            Navigation::Last => total_pages,
            Navigation::To(page) => {
                if total_pages == 0 {
                    return false;
                }
                page.clamp(1, total_pages)
            }
        };
        if target == self.page.current_page() {
            return false;
        }
        self.page.set_current_page(target);
        true
    }
}

pub fn can_go_back(effective_page: usize) -> bool {
    effective_page > 1
}

pub fn can_go_forward(effective_page: usize, total_pages: usize) -> bool {
    effective_page < total_pages
}
