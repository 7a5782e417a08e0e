use crate::sat::catalogs::model::{HeaderSet, Record, Row};

/// Maps data rows onto the header set.
///
/// Cells past the header width are dropped, missing cells become `null`, and
/// records left without any key are discarded.
pub fn materialize(headers: &HeaderSet, rows: &[Row]) -> Vec<Record> {
    rows.iter()
        .map(|row| materialize_row(headers, row))
        .filter(|record| !record.is_empty())
        .collect()
}

fn materialize_row(headers: &HeaderSet, row: &Row) -> Record {
    let mut record = Record::new();
    for (index, column) in headers.columns().iter().enumerate() {
        let value = row
            .get(index)
            .map_or(serde_json::Value::Null, |cell| cell.to_json());
        record.insert(column.clone(), value);
    }
    record
}
