use crate::align::process_raw_annotations;
use crate::config::MarkerConfig;
use crate::error::AnnotationError;
use crate::group::group_if_overlapping;
use crate::ir::{Annotation, GraphModel, RawAnnotation};
use crate::scale::{TimeScale, assign_positions};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerOptions {
    pub space_per_annotation: f64,
    pub plot_start: f64,
    pub plot_end: f64,
}

impl MarkerOptions {
    pub fn from_config(config: &MarkerConfig) -> Self {
        let (plot_start, plot_end) = config.plot_range();
        Self {
            space_per_annotation: config.space_per_annotation,
            plot_start,
            plot_end,
        }
    }
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self::from_config(&MarkerConfig::default())
    }
}

/// Aligns, positions and groups `annotations` for drawing over `model`.
pub fn build_markers(
    annotations: &[RawAnnotation],
    model: &GraphModel,
    options: &MarkerOptions,
) -> Result<Vec<Annotation>, AnnotationError> {
    let mut aligned = process_raw_annotations(annotations, model)?;
    let scale = TimeScale::from_graph(model, (options.plot_start, options.plot_end))
        .ok_or(AnnotationError::EmptyGraphData)?;
    assign_positions(&mut aligned, &scale);
    group_if_overlapping(aligned, options.space_per_annotation)
}
