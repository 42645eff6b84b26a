use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationError {
    #[error("graph data is empty; at least one point is required to align annotations")]
    EmptyGraphData,
    #[error("graph data is not strictly ascending at index {index} ({previous} then {month})")]
    UnsortedGraphData {
        index: usize,
        previous: NaiveDate,
        month: NaiveDate,
    },
    #[error("annotation {title:?} on {date} has no x position")]
    MissingPosition { title: String, date: NaiveDate },
}
