use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use core_types::{OutputData, SeriesOutput};
use engine::OutputFormatter;

/// Renders a result as a terminal table.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableFormatter;

impl OutputFormatter for TableFormatter {
    type Output = String;

    fn format(&self, data: &OutputData) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);

        match data {
            OutputData::Single { value } => {
                table.set_header(vec!["value"]);
                table.add_row(vec![value.to_string()]);
            }
            OutputData::Series(series) => {
                table.set_header(vec!["#", "value"]);
                for (i, value) in series.values.iter().enumerate() {
                    table.add_row(vec![i.to_string(), value.to_string()]);
                }
            }
            OutputData::MultiSeries { series } => {
                table.set_header(vec!["key", "#", "value"]);
                for keyed in series {
                    for (i, value) in keyed.values.values.iter().enumerate() {
                        table.add_row(vec![keyed.key.clone(), i.to_string(), value.to_string()]);
                    }
                }
            }
        }

        let mut rendered = table.to_string();
        if let Some(note) = metadata_note(data) {
            rendered.push('\n');
            rendered.push_str(&note);
        }
        rendered
    }
}

// Metadata is not index-aligned with the values, so it is listed below the table.
fn metadata_note(data: &OutputData) -> Option<String> {
    let lines: Vec<String> = match data {
        OutputData::Single { .. } => return None,
        OutputData::Series(series) => metadata_lines(None, series),
        OutputData::MultiSeries { series } => series
            .iter()
            .flat_map(|keyed| metadata_lines(Some(&keyed.key), &keyed.values))
            .collect(),
    };

    if lines.is_empty() {
        None
    } else {
        Some(format!("metadata:\n{}", lines.join("\n")))
    }
}

fn metadata_lines(key: Option<&str>, series: &SeriesOutput) -> Vec<String> {
    series
        .metadata
        .iter()
        .map(|m| match key {
            Some(key) => format!("  {key}: {m}"),
            None => format!("  {m}"),
        })
        .collect()
}
