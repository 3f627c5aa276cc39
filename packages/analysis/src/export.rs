//! CSV export of the flat facilities table.
//!
//! Output is UTF-8 with a byte order mark so Excel opens the Chinese
//! category and place names correctly.

use std::io::Write;
use std::path::Path;

use house_map_analysis_models::FacilityRow;

use crate::ExportError;

/// UTF-8 byte order mark.
const BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADER: &[&str] = &[
    "house",
    "category",
    "subtype",
    "name",
    "distance_m",
    "latitude",
    "longitude",
    "place_id",
    "address",
];

/// Writes `rows` as CSV, BOM first, to `writer`.
///
/// # Errors
///
/// Returns [`ExportError`] if writing or encoding fails.
pub fn write_facilities_csv<W: Write>(
    mut writer: W,
    rows: &[FacilityRow],
) -> Result<(), ExportError> {
    writer.write_all(BOM)?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for row in rows {
        let distance = row.distance_m.to_string();
        let latitude = format!("{:.6}", row.latitude);
        let longitude = format!("{:.6}", row.longitude);

        csv_writer.write_record([
            row.house.as_str(),
            row.category.as_str(),
            row.subtype.as_str(),
            row.name.as_str(),
            distance.as_str(),
            latitude.as_str(),
            longitude.as_str(),
            row.place_id.as_str(),
            row.address.as_deref().unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes `rows` to a CSV file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn export_facilities_csv(path: &Path, rows: &[FacilityRow]) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_facilities_csv(std::io::BufWriter::new(file), rows)?;
    log::info!("Exported {} facility rows to {}", rows.len(), path.display());
    Ok(())
}
