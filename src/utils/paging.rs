//! Half-open `[start, end)` paging over ordered lists

/// Slice `items` to `[start, end)`, clamped to the list length
///
/// Out-of-range bounds yield an empty page instead of an error.
pub fn page<T: Clone>(items: &[T], start: usize, end: usize) -> Vec<T> {
    let start = start.min(items.len());
    let end = end.clamp(start, items.len());
    items[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(page(&items, 0, 2), vec![1, 2]);
        assert_eq!(page(&items, 3, 100), vec![4, 5]);
        assert!(page(&items, 9, 12).is_empty());
        assert!(page(&items, 4, 1).is_empty());
        assert!(page::<i32>(&[], 0, 10).is_empty());
    }
}
