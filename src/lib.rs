pub mod align;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod group;
pub mod ir;
pub mod pipeline;
pub mod scale;

pub use align::{ActiveSelection, is_in_active_breakdown, process_raw_annotations};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, MarkerConfig, load_config};
pub use error::AnnotationError;
pub use group::group_if_overlapping;
pub use ir::{
    Annotation, Dimension, DimensionValue, GraphModel, GraphPoint, Note, RawAnnotation,
    RelevantBreakdown, TOTAL,
};
pub use pipeline::{MarkerOptions, build_markers};
pub use scale::{TimeScale, assign_positions};
