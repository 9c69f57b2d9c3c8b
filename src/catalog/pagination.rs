use serde::Serialize;

/// Prev/next state for an offset/limit page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl Pagination {
    pub fn compute(current_page: u32, limit: u32, total: u64) -> Self {
        let total_pages = total_pages(total, limit);
        Self {
            current_page,
            total_pages,
            prev_disabled: current_page <= 1,
            next_disabled: u64::from(current_page) >= total_pages,
        }
    }
}

/// The "showing X–Y of Z" window.
///
/// `start` is `offset + 1` and `end` is `min(page * limit, total)`. An empty
/// result set reports `0–0` instead of the inverted `1–0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl DisplayRange {
    pub fn compute(current_page: u32, limit: u32, total: u64) -> Self {
        let offset = page_offset(current_page, limit);
        let end = (u64::from(current_page) * u64::from(limit)).min(total);
        let start = if total == 0 { 0 } else { offset + 1 };
        Self { start, end, total }
    }
}

pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

pub fn page_offset(current_page: u32, limit: u32) -> u64 {
    u64::from(current_page.saturating_sub(1)) * u64::from(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_partial_page() {
        let p = Pagination::compute(3, 12, 25);
        assert_eq!(p.total_pages, 3);
        assert!(!p.prev_disabled);
        assert!(p.next_disabled);

        let r = DisplayRange::compute(3, 12, 25);
        assert_eq!((r.start, r.end, r.total), (25, 25, 25));
    }

    #[test]
    fn first_page_disables_prev_only() {
        let p = Pagination::compute(1, 12, 25);
        assert!(p.prev_disabled);
        assert!(!p.next_disabled);
        let r = DisplayRange::compute(1, 12, 25);
        assert_eq!((r.start, r.end), (1, 12));
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        assert_eq!(total_pages(24, 12), 2);
        assert_eq!(total_pages(25, 12), 3);
        assert_eq!(total_pages(1, 12), 1);
        assert_eq!(total_pages(0, 12), 0);
    }

    #[test]
    fn empty_results_disable_both_controls() {
        let p = Pagination::compute(1, 12, 0);
        assert!(p.prev_disabled);
        assert!(p.next_disabled);
        let r = DisplayRange::compute(1, 12, 0);
        assert_eq!((r.start, r.end, r.total), (0, 0, 0));
    }

    #[test]
    fn range_matches_formula_for_every_valid_page() {
        for limit in [1u32, 5, 12, 100] {
            for total in [1u64, 11, 12, 13, 99, 250] {
                for page in 1..=total_pages(total, limit) as u32 {
                    let r = DisplayRange::compute(page, limit, total);
                    let offset = u64::from(page - 1) * u64::from(limit);
                    assert_eq!(r.start, offset + 1);
                    assert_eq!(r.end, (u64::from(page) * u64::from(limit)).min(total));
                    assert!(r.start <= r.end);
                }
            }
        }
    }
}
