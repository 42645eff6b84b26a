use crate::align::ActiveSelection;
use crate::ir::{Annotation, GraphModel};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDump {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub active_breakdown: String,
    pub active_split_values: Vec<String>,
    pub markers: Vec<MarkerEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerEntry {
    pub date: NaiveDate,
    pub title: String,
    pub label: String,
    pub breakdown: String,
    pub split_value: String,
    pub value: Option<f64>,
    pub group_size: usize,
    pub x: Option<f64>,
}

impl From<&Annotation> for MarkerEntry {
    fn from(annotation: &Annotation) -> Self {
        Self {
            date: annotation.date,
            title: annotation.note.title.clone(),
            label: annotation.note.label.clone(),
            breakdown: annotation.breakdown.clone(),
            split_value: annotation.split_value.clone(),
            value: annotation.value,
            group_size: annotation.group_size,
            x: annotation.x,
        }
    }
}

impl MarkerDump {
    pub fn from_markers(markers: &[Annotation], model: &GraphModel) -> Self {
        let selection = ActiveSelection::from_model(model);
        let window = model.window();
        MarkerDump {
            start: window.map(|(start, _)| start),
            end: window.map(|(_, end)| end),
            active_breakdown: selection.key,
            active_split_values: selection.split_values,
            markers: markers.iter().map(MarkerEntry::from).collect(),
        }
    }
}

pub fn write_marker_dump(
    output: Option<&Path>,
    markers: &[Annotation],
    model: &GraphModel,
) -> anyhow::Result<()> {
    let dump = MarkerDump::from_markers(markers, model);
    match output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &dump)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
