//! CSV export of the training table. Column names and order are a contract:
//! the base columns are exactly the gate's model input.

use super::TrainingTable;
use crate::error::CorpusError;
use crate::features::{FEATURE_COLUMNS, KINEMATIC_COLUMNS};
use crate::gate::LabelMapping;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Numeric label encoding, shared with the serving gate
    pub mapping: LabelMapping,
    pub include_kinematics: bool,
}

pub fn header(opts: &ExportOptions) -> Vec<&'static str> {
    let mut cols = vec!["session_id"];
    cols.extend(FEATURE_COLUMNS);
    if opts.include_kinematics {
        cols.extend(KINEMATIC_COLUMNS);
    }
    cols.push("label");
    cols
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_csv<W: Write>(table: &TrainingTable, w: W, opts: &ExportOptions) -> io::Result<()> {
    let mut w = BufWriter::new(w);
    writeln!(w, "{}", header(opts).join(","))?;
    for row in &table.rows {
        let base = &row.features.base;
        write!(
            w,
            "{},{},{},{},{},{}",
            escape(&base.session_id),
            base.total_events,
            base.mouse_distance,
            base.session_duration_ms,
            base.avg_velocity,
            base.click_count
        )?;
        if opts.include_kinematics {
            for v in row.features.extra_columns() {
                write!(w, ",{}", v)?;
            }
        }
        writeln!(w, ",{}", opts.mapping.class(row.label))?;
    }
    w.flush()
}

/// Writes the table to `path`, creating its directory.
pub fn write_csv_file(table: &TrainingTable, path: &Path, opts: &ExportOptions) -> Result<(), CorpusError> {
    let io_err = |source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    write_csv(table, file, opts).map_err(io_err)
}
