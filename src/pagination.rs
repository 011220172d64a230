//! Splits an ordered result set into fixed-size pages.
//!
//! Page lookup is forgiving: a missing or non-numeric page number gives the
//! first page, and a number outside `1..=num_pages` gives the last page.

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u32,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: u32,
    pub next_page_number: u32,
}

impl Paginator {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// An empty result still has one (empty) page.
    pub fn num_pages(&self, count: i64) -> u32 {
        if count <= 0 {
            return 1;
        }
        let per_page = i64::from(self.per_page);
        ((count + per_page - 1) / per_page) as u32
    }

    pub fn page_number(&self, raw: Option<&str>, count: i64) -> u32 {
        let last = self.num_pages(count);
        match raw.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(number)) if number >= 1 && number <= i64::from(last) => number as u32,
            Some(Ok(_)) => last,
            _ => 1,
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self, number: u32) -> i64 {
        i64::from(number.saturating_sub(1)) * i64::from(self.per_page)
    }

    pub fn page<T>(&self, items: Vec<T>, number: u32, count: i64) -> Page<T> {
        let num_pages = self.num_pages(count);
        Page {
            items,
            number,
            num_pages,
            count,
            has_previous: number > 1,
            has_next: number < num_pages,
            previous_page_number: number.saturating_sub(1).max(1),
            next_page_number: (number + 1).min(num_pages),
        }
    }
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_previous || self.has_next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_make_two_pages() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.num_pages(13), 2);
        assert_eq!(paginator.offset(1), 0);
        assert_eq!(paginator.offset(2), 10);

        let page = paginator.page((10..13).collect::<Vec<_>>(), 2, 13);
        assert_eq!(page.len(), 3);
        assert!(page.has_previous);
        assert!(!page.has_next);
        assert_eq!(page.previous_page_number, 1);
    }

    #[test]
    fn empty_result_has_one_page() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.num_pages(0), 1);
        let page = paginator.page(Vec::<i64>::new(), 1, 0);
        assert!(page.is_empty());
        assert!(!page.has_other_pages());
    }

    #[test]
    fn page_number_is_forgiving() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.page_number(None, 25), 1);
        assert_eq!(paginator.page_number(Some("abc"), 25), 1);
        assert_eq!(paginator.page_number(Some("2"), 25), 2);
        assert_eq!(paginator.page_number(Some(" 3 "), 25), 3);
        assert_eq!(paginator.page_number(Some("99"), 25), 3);
        assert_eq!(paginator.page_number(Some("0"), 25), 3);
        assert_eq!(paginator.page_number(Some("-4"), 25), 3);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.num_pages(20), 2);
        assert_eq!(paginator.num_pages(21), 3);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(Paginator::new(0).per_page(), 1);
    }
}
