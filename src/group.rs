// Overlap grouping for positioned annotation markers.
// Markers closer than the spacing threshold collapse into the first marker
// of their run. Grouping is per split value, so lines never share a marker.

use crate::error::AnnotationError;
use crate::ir::Annotation;
use indexmap::IndexMap;
use log::debug;

pub const GROUP_LABEL_SEPARATOR: &str = " *** ";

fn merge_into(accepted: &mut Annotation, other: &Annotation) {
    accepted.note.label.push_str(&format!(
        "{GROUP_LABEL_SEPARATOR}{}: {}",
        other.note.title, other.note.label
    ));
    accepted.group_size += 1;
}

fn finish_title(marker: &mut Annotation) {
    if marker.group_size > 1 {
        marker
            .note
            .title
            .push_str(&format!(" (+{} others)", marker.group_size - 1));
    }
}

/// Merges markers whose `x` lies less than `space_per_annotation` past the
/// last accepted marker of the same split value.
///
/// Input must be ascending in `x` within each split value. Output keeps the
/// first-seen order of split values. A non-positive threshold disables merging.
pub fn group_if_overlapping(
    annotations: Vec<Annotation>,
    space_per_annotation: f64,
) -> Result<Vec<Annotation>, AnnotationError> {
    let merging = space_per_annotation > 0.0;
    let total = annotations.len();
    let mut groups: IndexMap<String, Vec<Annotation>> = IndexMap::new();

    for mut annotation in annotations {
        let Some(x) = annotation.x else {
            return Err(AnnotationError::MissingPosition {
                title: annotation.note.title,
                date: annotation.date,
            });
        };
        let group = groups.entry(annotation.split_value.clone()).or_default();
        if merging {
            if let Some(last) = group.last_mut() {
                let last_x = last.x.unwrap_or(x);
                if x - last_x < space_per_annotation {
                    merge_into(last, &annotation);
                    continue;
                }
            }
        }
        annotation.group_size = 1;
        group.push(annotation);
    }

    let markers: Vec<Annotation> = groups
        .into_values()
        .flat_map(|mut group| {
            group.iter_mut().for_each(finish_title);
            group
        })
        .collect();

    debug!(
        "grouped {total} annotation(s) into {} marker(s) with spacing {space_per_annotation}",
        markers.len()
    );
    Ok(markers)
}
