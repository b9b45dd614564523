//! Label-based partitioning with a "miscellaneous" bucket for rare labels.

use crate::palette::{self, NamedColor, MISC_COLOR};
use std::collections::HashMap;

/// Display name prefix of the merged group
pub const MISC_LABEL: &str = "miscellaneous";

/// Rows sharing one label (or the merged rare labels)
#[derive(Debug, Clone, PartialEq)]
pub struct LabelGroup {
    /// Label value, `None` for the miscellaneous group
    pub label: Option<String>,
    /// `"<label> (<count>)"`
    pub name: String,
    /// Row indices into the dataset the labels came from
    pub rows: Vec<usize>,
    pub color: NamedColor,
}

/// Intermediate result of folding over distinct labels
#[derive(Default)]
struct GroupingFold {
    kept: Vec<LabelGroup>,
    misc_rows: Vec<usize>,
    merged_labels: usize,
}

/// Distinct non-null labels in first-appearance order, with their rows
fn distinct_labels(labels: &[Option<String>]) -> Vec<(String, Vec<usize>)> {
    let mut order: Vec<(String, Vec<usize>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (row, label) in labels.iter().enumerate() {
        let Some(label) = label else { continue };
        match index.get(label.as_str()) {
            Some(&i) => order[i].1.push(row),
            None => {
                index.insert(label.as_str(), order.len());
                order.push((label.clone(), vec![row]));
            }
        }
    }
    order
}

/// Partition rows by label, merging labels with fewer than
/// `cutoff_ratio * total_rows` rows into one miscellaneous group.
///
/// `labels` holds one entry per dataset row; rows with a `None` label are not
/// part of any group. The `i`-th distinct label is paired with palette color
/// `i`, whether or not it survives the cutoff.
pub fn group_by_label(labels: &[Option<String>], total_rows: usize, cutoff_ratio: f64) -> Vec<LabelGroup> {
    let threshold = cutoff_ratio * total_rows as f64;

    let fold = distinct_labels(labels).into_iter().enumerate().fold(
        GroupingFold::default(),
        |mut acc, (i, (label, rows))| {
            if (rows.len() as f64) < threshold {
                acc.misc_rows.extend(rows);
                acc.merged_labels += 1;
            } else {
                acc.kept.push(LabelGroup {
                    name: format!("{} ({})", label, rows.len()),
                    label: Some(label),
                    rows,
                    color: palette::label_color(i),
                });
            }
            acc
        },
    );

    let GroupingFold {
        mut kept,
        misc_rows,
        merged_labels,
    } = fold;

    if merged_labels > 0 {
        kept.push(LabelGroup {
            label: None,
            name: format!("{} ({})", MISC_LABEL, misc_rows.len()),
            rows: misc_rows,
            color: MISC_COLOR,
        });
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels_from_counts(counts: &[(&str, usize)]) -> Vec<Option<String>> {
        counts
            .iter()
            .flat_map(|(label, n)| std::iter::repeat(Some(label.to_string())).take(*n))
            .collect()
    }

    fn names(groups: &[LabelGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_rare_labels_are_merged() {
        let labels = labels_from_counts(&[("A", 9000), ("B", 950), ("C", 50)]);
        let groups = group_by_label(&labels, labels.len(), 0.1);
        assert_eq!(names(&groups), vec!["A (9000)", "miscellaneous (1000)"]);
        assert_eq!(groups[1].color, MISC_COLOR);
        assert!(groups[1].label.is_none());
    }

    #[test]
    fn test_boundary_count_is_not_merged() {
        // threshold = 0.25 * 8 = 2
        let labels = labels_from_counts(&[("A", 5), ("B", 2), ("C", 1)]);
        let groups = group_by_label(&labels, labels.len(), 0.25);
        assert_eq!(names(&groups), vec!["A (5)", "B (2)", "miscellaneous (1)"]);
    }

    #[test]
    fn test_no_misc_group_when_nothing_is_rare() {
        let labels = labels_from_counts(&[("x", 3), ("y", 3)]);
        let groups = group_by_label(&labels, labels.len(), 0.5);
        assert_eq!(names(&groups), vec!["x (3)", "y (3)"]);
        assert!(groups.iter().all(|g| g.label.is_some()));
    }

    #[test]
    fn test_four_row_example() {
        let labels = labels_from_counts(&[("common", 3), ("rare", 1)]);
        let groups = group_by_label(&labels, 4, 0.5);
        assert_eq!(names(&groups), vec!["common (3)", "miscellaneous (1)"]);
        assert_eq!(groups[1].rows, vec![3]);
    }

    #[test]
    fn test_groups_partition_labeled_rows() {
        let labels: Vec<Option<String>> = (0..500)
            .map(|i| match i % 7 {
                0 => None,
                k => Some(format!("l{}", (i * k) % 13)),
            })
            .collect();
        let groups = group_by_label(&labels, labels.len(), 0.05);

        let mut seen: Vec<usize> = groups.iter().flat_map(|g| g.rows.iter().copied()).collect();
        seen.sort_unstable();
        let expected: Vec<usize> = (0..labels.len()).filter(|&r| labels[r].is_some()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_colors_follow_label_order() {
        let labels = labels_from_counts(&[("a", 1), ("b", 10), ("c", 10)]);
        let groups = group_by_label(&labels, labels.len(), 0.1);
        // "a" is merged but still consumes the first palette slot
        assert_eq!(groups[0].color, palette::label_color(1));
        assert_eq!(groups[1].color, palette::label_color(2));
    }

    #[test]
    fn test_zero_cutoff_keeps_everything() {
        let labels = labels_from_counts(&[("a", 1), ("b", 1)]);
        let groups = group_by_label(&labels, 2, 0.0);
        assert_eq!(groups.len(), 2);
    }
}
