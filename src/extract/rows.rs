//! Pairing of the title-row and date-row element sequences.
//!
//! Many sources render dates and titles as independently-queried node sets
//! that are not 1:1 by index — decorative wrappers around dates only, or a
//! date column shorter than the title column. The enumerator tolerates that
//! misalignment: a row past the end of the date sequence simply has no date
//! row, and the pipeline searches the title row itself instead. No sorting,
//! no deduplication; document order is preserved.

use crate::scope::ElementHandle;

/// One aligned listing row.
#[derive(Debug, Clone, Copy)]
pub struct RowPair<'a> {
    pub index: usize,
    pub title_row: ElementHandle<'a>,
    /// The date-bearing element for this row, when the date sequence
    /// reaches this far. `None` means the date must be searched within
    /// `title_row`.
    pub date_row: Option<ElementHandle<'a>>,
}

/// Pair the two sequences up to `min(title_rows, max_items)` rows.
pub fn paired_rows<'a>(
    title_rows: &[ElementHandle<'a>],
    date_rows: &[ElementHandle<'a>],
    max_items: usize,
) -> Vec<RowPair<'a>> {
    let row_count = title_rows.len().min(max_items);
    (0..row_count)
        .map(|i| RowPair {
            index: i,
            title_row: title_rows[i],
            date_row: date_rows.get(i).copied(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::DocumentScope;

    const MISALIGNED: &str = r#"
        <ul class="titles">
          <li>t0</li><li>t1</li><li>t2</li><li>t3</li><li>t4</li>
        </ul>
        <ul class="dates">
          <li>d0</li><li>d1</li><li>d2</li>
        </ul>
    "#;

    #[test]
    fn test_misaligned_sequences_pair_by_index() {
        let scope = DocumentScope::root(MISALIGNED);
        let titles = scope.locate("ul.titles li").unwrap();
        let dates = scope.locate("ul.dates li").unwrap();

        let rows = paired_rows(&titles, &dates, 10);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2].date_row.unwrap().text(), "d2");
        assert!(rows[3].date_row.is_none());
        assert!(rows[4].date_row.is_none());
    }

    #[test]
    fn test_max_items_caps_row_count() {
        let scope = DocumentScope::root(MISALIGNED);
        let titles = scope.locate("ul.titles li").unwrap();
        let dates = scope.locate("ul.dates li").unwrap();

        let rows = paired_rows(&titles, &dates, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].title_row.text(), "t1");
    }

    #[test]
    fn test_empty_date_sequence() {
        let scope = DocumentScope::root(MISALIGNED);
        let titles = scope.locate("ul.titles li").unwrap();

        let rows = paired_rows(&titles, &[], 10);
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.date_row.is_none()));
    }
}
