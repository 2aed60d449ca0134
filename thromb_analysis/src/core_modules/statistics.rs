// THEORY:
// The statistics table is the tabular summary handed to downstream tooling
// (spreadsheets, R scripts). One row per component in ascending id order,
// semicolon-delimited, with a fixed header.

use crate::core_modules::component::Component;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Column names, in output order.
pub const STATISTICS_HEADER: [&str; 5] = [
    "corePixels",
    "tailPixels",
    "boundaryPixels",
    "brightComponents",
    "darkComponents",
];

pub const STATISTICS_DELIMITER: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsRow {
    pub core_pixels: usize,
    pub tail_pixels: usize,
    pub boundary_pixels: usize,
    pub bright_components: usize,
    pub dark_components: usize,
}

impl StatisticsRow {
    fn values(&self) -> [usize; 5] {
        [
            self.core_pixels,
            self.tail_pixels,
            self.boundary_pixels,
            self.bright_components,
            self.dark_components,
        ]
    }
}

impl From<&Component> for StatisticsRow {
    fn from(component: &Component) -> Self {
        Self {
            core_pixels: component.core_pixels,
            tail_pixels: component.tail_pixels,
            boundary_pixels: component.boundary_pixels,
            bright_components: component.bright_components,
            dark_components: component.dark_components,
        }
    }
}

/// Per-component statistics in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatisticsTable {
    rows: Vec<StatisticsRow>,
}

impl StatisticsTable {
    pub fn from_components(components: &[Component]) -> Self {
        let mut ordered: Vec<&Component> = components.iter().collect();
        ordered.sort_by_key(|c| c.id);
        Self {
            rows: ordered.into_iter().map(StatisticsRow::from).collect(),
        }
    }

    pub fn rows(&self) -> &[StatisticsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of core and tail pixels over all rows, i.e. the foreground area.
    pub fn foreground_pixels(&self) -> usize {
        self.rows.iter().map(|r| r.core_pixels + r.tail_pixels).sum()
    }

    /// Header line followed by one line per row, without line terminators.
    pub fn lines(&self, delimiter: char) -> impl Iterator<Item = String> + '_ {
        let separator = delimiter.to_string();
        let header = STATISTICS_HEADER.join(&separator);
        std::iter::once(header).chain(self.rows.iter().map(move |row| {
            let values: Vec<String> = row.values().iter().map(ToString::to_string).collect();
            values.join(&separator)
        }))
    }

    /// Writes the header and one line per row.
    pub fn write_delimited<W: Write>(&self, mut out: W, delimiter: char) -> io::Result<()> {
        for line in self.lines(delimiter) {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }

    pub fn to_delimited_string(&self) -> String {
        self.lines(STATISTICS_DELIMITER)
            .map(|line| line + "\n")
            .collect()
    }

    /// Writes the semicolon-delimited table to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_delimited(BufWriter::new(file), STATISTICS_DELIMITER)
    }
}
