// Alignment of raw annotations onto the chart's time series.
// Filters to the visible window and breakdown selection, expands one copy
// per breakdown value, then snaps each copy forward to the next data point.

use crate::error::AnnotationError;
use crate::ir::{Annotation, GraphModel, GraphPoint, RawAnnotation, TOTAL};
use chrono::NaiveDate;
use log::{debug, trace};

/// Breakdown selection currently shown on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSelection {
    pub key: String,
    pub split_values: Vec<String>,
}

impl ActiveSelection {
    pub fn total() -> Self {
        Self {
            key: TOTAL.to_string(),
            split_values: Vec::new(),
        }
    }

    pub fn from_model(model: &GraphModel) -> Self {
        match model.splitting_dimension() {
            Some(dimension) => Self {
                key: dimension.key.clone(),
                split_values: dimension
                    .values
                    .iter()
                    .filter(|v| v.on)
                    .map(|v| v.key.clone())
                    .collect(),
            },
            None => Self::total(),
        }
    }

    pub fn is_total(&self) -> bool {
        self.key == TOTAL
    }

    pub fn admits(&self, annotation: &Annotation) -> bool {
        is_in_active_breakdown(
            &self.key,
            &self.split_values,
            &annotation.breakdown,
            &annotation.split_value,
        )
    }
}

/// `active_key == "total" || (active_key == breakdown && split_value is active)`.
///
/// With no splitting dimension every copy passes, including copies scoped to
/// a breakdown; those align against the `total` map and usually get no value.
pub fn is_in_active_breakdown(
    active_key: &str,
    active_split_values: &[String],
    breakdown: &str,
    split_value: &str,
) -> bool {
    active_key == TOTAL
        || (active_key == breakdown && active_split_values.iter().any(|v| v == split_value))
}

/// Checks the series is non-empty and strictly ascending, returning its window.
pub fn validate_graph_data(
    graph_data: &[GraphPoint],
) -> Result<(NaiveDate, NaiveDate), AnnotationError> {
    let (first, last) = match (graph_data.first(), graph_data.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AnnotationError::EmptyGraphData),
    };
    for (index, pair) in graph_data.windows(2).enumerate() {
        if pair[1].month <= pair[0].month {
            return Err(AnnotationError::UnsortedGraphData {
                index: index + 1,
                previous: pair[0].month,
                month: pair[1].month,
            });
        }
    }
    Ok((first.month, last.month))
}

/// Appends one working copy per breakdown value of `raw`, or a single
/// `total` copy when it names no breakdowns.
pub fn expand_by_breakdown(raw: &RawAnnotation, date: NaiveDate, out: &mut Vec<Annotation>) {
    let note = raw.note.clone().unwrap_or_default();
    let copy = |breakdown: &str, split_value: &str| Annotation {
        date,
        note: note.clone(),
        breakdown: breakdown.to_string(),
        split_value: split_value.to_string(),
        value: None,
        group_size: 1,
        x: None,
    };
    match &raw.relevant_breakdowns {
        Some(breakdowns) => {
            for breakdown in breakdowns {
                for value in &breakdown.values {
                    out.push(copy(&breakdown.dimension, value));
                }
            }
        }
        None => out.push(copy(TOTAL, TOTAL)),
    }
}

/// Two-pointer merge: every annotation dated at or before a point, and not
/// yet assigned, takes that point's month and value. Both sides must be
/// sorted ascending.
pub fn set_values(annotations: &mut [Annotation], graph_data: &[GraphPoint]) {
    let mut pending = annotations.iter_mut().peekable();
    for point in graph_data {
        while let Some(annotation) = pending.next_if(|a| a.date <= point.month) {
            annotation.value = point.total.get(&annotation.split_value).copied();
            annotation.date = point.month;
        }
    }
    let unassigned = pending.count();
    if unassigned > 0 {
        debug!("{unassigned} annotation(s) fall after the last data point");
    }
}

/// Filters, expands and aligns `annotations` against `model`.
pub fn process_raw_annotations(
    annotations: &[RawAnnotation],
    model: &GraphModel,
) -> Result<Vec<Annotation>, AnnotationError> {
    let (start, end) = validate_graph_data(&model.graph_data)?;
    let selection = ActiveSelection::from_model(model);

    let mut expanded = Vec::new();
    let mut kept = 0usize;
    for raw in annotations {
        if raw.label().is_empty() {
            trace!("dropping annotation without label: {:?}", raw.note);
            continue;
        }
        let Some(date) = raw.date else {
            trace!("dropping undated annotation: {:?}", raw.note);
            continue;
        };
        if date < start || date > end {
            trace!("dropping annotation on {date} outside {start}..={end}");
            continue;
        }
        kept += 1;
        expand_by_breakdown(raw, date, &mut expanded);
    }

    let before_selection = expanded.len();
    expanded.retain(|a| selection.admits(a));

    // Stable, so already-sorted input keeps its expansion order.
    expanded.sort_by_key(|a| a.date);
    set_values(&mut expanded, &model.graph_data);

    debug!(
        "aligned {} of {} raw annotation(s) into {} marker(s) for breakdown {:?} ({} filtered by selection)",
        kept,
        annotations.len(),
        expanded.len(),
        selection.key,
        before_selection - expanded.len()
    );
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Dimension, Note};

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, m, 1).unwrap()
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, m, d).unwrap()
    }

    fn total_series() -> GraphModel {
        GraphModel {
            graph_data: vec![
                GraphPoint::new(month(1), &[("total", 10.0)]),
                GraphPoint::new(month(4), &[("total", 20.0)]),
                GraphPoint::new(month(6), &[("total", 30.0)]),
            ],
            dimensions: None,
        }
    }

    fn split_series(on: &[(&str, bool)]) -> GraphModel {
        GraphModel {
            graph_data: vec![
                GraphPoint::new(month(1), &[("mobile", 1.0), ("desktop", 2.0)]),
                GraphPoint::new(month(2), &[("mobile", 3.0), ("desktop", 4.0)]),
            ],
            dimensions: Some(vec![
                Dimension::new("agent", false, &[("user", true)]),
                Dimension::new("device", true, on),
            ]),
        }
    }

    #[test]
    fn snaps_forward_to_next_data_point() {
        let raw = vec![
            RawAnnotation::new(month(3), "A", "x"),
            RawAnnotation::new(month(5), "B", "y"),
        ];
        let out = process_raw_annotations(&raw, &total_series()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, month(4));
        assert_eq!(out[0].value, Some(20.0));
        assert_eq!(out[1].date, month(6));
        assert_eq!(out[1].value, Some(30.0));
        for a in &out {
            assert_eq!(a.breakdown, TOTAL);
            assert_eq!(a.split_value, TOTAL);
            assert_eq!(a.group_size, 1);
            assert_eq!(a.x, None);
        }
    }

    #[test]
    fn annotation_on_a_data_point_keeps_its_date() {
        let raw = vec![RawAnnotation::new(month(4), "A", "x")];
        let out = process_raw_annotations(&raw, &total_series()).unwrap();
        assert_eq!(out[0].date, month(4));
        assert_eq!(out[0].value, Some(20.0));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let raw = vec![
            RawAnnotation::new(month(1), "first", "a"),
            RawAnnotation::new(month(6), "last", "b"),
            RawAnnotation::new(day(6, 2), "after", "c"),
            RawAnnotation::new(NaiveDate::from_ymd_opt(2015, 12, 31).unwrap(), "before", "d"),
        ];
        let out = process_raw_annotations(&raw, &total_series()).unwrap();
        let titles: Vec<&str> = out.iter().map(|a| a.note.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "last"]);
    }

    #[test]
    fn drops_unlabelled_and_undated_annotations() {
        let raw = vec![
            RawAnnotation::new(month(2), "no label", ""),
            RawAnnotation {
                date: Some(month(2)),
                note: None,
                relevant_breakdowns: None,
            },
            RawAnnotation {
                date: None,
                note: Some(Note::new("undated", "z")),
                relevant_breakdowns: None,
            },
            RawAnnotation::new(month(2), "kept", "k"),
        ];
        let out = process_raw_annotations(&raw, &total_series()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].note.title, "kept");
    }

    #[test]
    fn empty_annotations_give_empty_output() {
        let out = process_raw_annotations(&[], &total_series()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn empty_graph_data_is_rejected() {
        let raw = vec![RawAnnotation::new(month(2), "A", "x")];
        let err = process_raw_annotations(&raw, &GraphModel::default()).unwrap_err();
        assert_eq!(err, AnnotationError::EmptyGraphData);
    }

    #[test]
    fn unsorted_graph_data_is_rejected() {
        let model = GraphModel {
            graph_data: vec![
                GraphPoint::new(month(3), &[("total", 1.0)]),
                GraphPoint::new(month(2), &[("total", 2.0)]),
            ],
            dimensions: None,
        };
        let err = process_raw_annotations(&[], &model).unwrap_err();
        assert!(matches!(err, AnnotationError::UnsortedGraphData { index: 1, .. }));
    }

    #[test]
    fn single_point_series_aligns_everything_to_it() {
        let model = GraphModel {
            graph_data: vec![GraphPoint::new(month(5), &[("total", 7.0)])],
            dimensions: None,
        };
        let raw = vec![
            RawAnnotation::new(month(5), "A", "x"),
            RawAnnotation::new(month(5), "B", "y"),
        ];
        let out = process_raw_annotations(&raw, &model).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|a| a.date == month(5) && a.value == Some(7.0)));
    }

    #[test]
    fn expands_one_copy_per_breakdown_value() {
        let raw = RawAnnotation::new(month(1), "A", "x")
            .with_breakdown("device", &["mobile", "desktop"]);
        let mut out = Vec::new();
        expand_by_breakdown(&raw, month(1), &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].breakdown, "device");
        assert_eq!(out[0].split_value, "mobile");
        assert_eq!(out[1].split_value, "desktop");
        assert_eq!(out[0].note, out[1].note);
    }

    #[test]
    fn expands_across_nested_dimensions() {
        let raw = RawAnnotation::new(month(1), "A", "x")
            .with_breakdown("device", &["mobile", "desktop"])
            .with_breakdown("agent", &["user"]);
        let mut out = Vec::new();
        expand_by_breakdown(&raw, month(1), &mut out);
        let pairs: Vec<(&str, &str)> = out
            .iter()
            .map(|a| (a.breakdown.as_str(), a.split_value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("device", "mobile"), ("device", "desktop"), ("agent", "user")]
        );
    }

    #[test]
    fn empty_breakdown_list_expands_to_nothing() {
        let raw = RawAnnotation {
            relevant_breakdowns: Some(Vec::new()),
            ..RawAnnotation::new(month(1), "A", "x")
        };
        let mut out = Vec::new();
        expand_by_breakdown(&raw, month(1), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn active_breakdown_predicate_truth_table() {
        let on = vec!["mobile".to_string()];
        // Total view admits everything.
        assert!(is_in_active_breakdown(TOTAL, &[], TOTAL, TOTAL));
        assert!(is_in_active_breakdown(TOTAL, &[], "device", "mobile"));
        assert!(is_in_active_breakdown(TOTAL, &on, "agent", "bot"));
        // Split view needs matching dimension and an active value.
        assert!(is_in_active_breakdown("device", &on, "device", "mobile"));
        assert!(!is_in_active_breakdown("device", &on, "device", "desktop"));
        assert!(!is_in_active_breakdown("device", &on, "agent", "mobile"));
        assert!(!is_in_active_breakdown("device", &on, TOTAL, TOTAL));
        assert!(!is_in_active_breakdown("device", &[], "device", "mobile"));
    }

    #[test]
    fn split_view_keeps_only_active_values() {
        let model = split_series(&[("mobile", true), ("desktop", false)]);
        let raw = vec![
            RawAnnotation::new(day(1, 15), "A", "x")
                .with_breakdown("device", &["mobile", "desktop"]),
            RawAnnotation::new(day(1, 20), "B", "y"),
        ];
        let out = process_raw_annotations(&raw, &model).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].split_value, "mobile");
        assert_eq!(out[0].date, month(2));
        assert_eq!(out[0].value, Some(3.0));
    }

    #[test]
    fn total_view_keeps_breakdown_copies_without_values() {
        let raw = vec![
            RawAnnotation::new(month(4), "A", "x").with_breakdown("device", &["mobile"]),
        ];
        let out = process_raw_annotations(&raw, &total_series()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].breakdown, "device");
        assert_eq!(out[0].date, month(4));
        assert_eq!(out[0].value, None);
    }

    #[test]
    fn same_date_annotations_are_aligned_independently() {
        let raw = vec![
            RawAnnotation::new(month(2), "A", "x"),
            RawAnnotation::new(month(2), "B", "y"),
        ];
        let out = process_raw_annotations(&raw, &total_series()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|a| a.date == month(4) && a.group_size == 1));
    }

    #[test]
    fn unsorted_annotations_are_ordered_by_date_before_alignment() {
        let raw = vec![
            RawAnnotation::new(month(5), "late", "y"),
            RawAnnotation::new(month(2), "early", "x"),
        ];
        let out = process_raw_annotations(&raw, &total_series()).unwrap();
        assert_eq!(out[0].note.title, "early");
        assert_eq!(out[0].value, Some(20.0));
        assert_eq!(out[1].note.title, "late");
        assert_eq!(out[1].value, Some(30.0));
    }

    #[test]
    fn set_values_leaves_annotations_past_the_series_untouched() {
        let series = total_series().graph_data;
        let mut annotations = Vec::new();
        expand_by_breakdown(&RawAnnotation::new(month(9), "A", "x"), month(9), &mut annotations);
        set_values(&mut annotations, &series);
        assert_eq!(annotations[0].date, month(9));
        assert_eq!(annotations[0].value, None);
    }

    #[test]
    fn selection_from_model_without_splitting_is_total() {
        assert!(ActiveSelection::from_model(&total_series()).is_total());
        let split = ActiveSelection::from_model(&split_series(&[
            ("mobile", true),
            ("desktop", true),
        ]));
        assert_eq!(split.key, "device");
        assert_eq!(split.split_values, vec!["mobile", "desktop"]);
    }
}
