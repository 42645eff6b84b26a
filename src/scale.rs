use crate::ir::{Annotation, GraphModel};
use chrono::NaiveDate;

/// Linear mapping from calendar dates to horizontal pixel positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain_start: NaiveDate,
    domain_end: NaiveDate,
    range_start: f64,
    range_end: f64,
}

impl TimeScale {
    pub fn new(domain_start: NaiveDate, domain_end: NaiveDate, range_start: f64, range_end: f64) -> Self {
        Self {
            domain_start,
            domain_end,
            range_start,
            range_end,
        }
    }

    /// Scale spanning the model's first to last month, or `None` when the
    /// model has no data.
    pub fn from_graph(model: &GraphModel, range: (f64, f64)) -> Option<Self> {
        let (start, end) = model.window()?;
        Some(Self::new(start, end, range.0, range.1))
    }

    pub fn x(&self, date: NaiveDate) -> f64 {
        let span = (self.domain_end - self.domain_start).num_days();
        if span == 0 {
            return (self.range_start + self.range_end) / 2.0;
        }
        let offset = (date - self.domain_start).num_days();
        let t = offset as f64 / span as f64;
        self.range_start + t * (self.range_end - self.range_start)
    }
}

pub fn assign_positions(annotations: &mut [Annotation], scale: &TimeScale) {
    for annotation in annotations {
        annotation.x = Some(scale.x(annotation.date));
    }
}
