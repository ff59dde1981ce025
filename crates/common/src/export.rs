use std::{io, path::Path};

use anyhow::Result;
use csv::Writer;

use crate::models::{InventoryRecord, RECORD_COLUMNS};

pub fn export_records_to_csv(path: &Path, records: &[InventoryRecord]) -> Result<()> {
    let wtr = Writer::from_path(path)?;
    write_records(wtr, records)
}

pub fn write_records<W: io::Write>(mut wtr: Writer<W>, records: &[InventoryRecord]) -> Result<()> {
    wtr.write_record(RECORD_COLUMNS)?;
    for record in records {
        wtr.write_record(record.cells())?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_placeholder_cells() {
        let records = vec![InventoryRecord {
            id: 1,
            date: Some("2025-08-20".into()),
            sku: Some("A1".into()),
            remarks: Some("damaged, returned".into()),
            ..Default::default()
        }];
        let mut buf = vec![];
        write_records(Writer::from_writer(&mut buf), &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("ID,Date,SKU,Product,Inbound,Outbound,Balance,Supplier,Operator,Remarks")
        );
        assert_eq!(
            lines.next(),
            Some("1,2025-08-20,A1,-,0,0,0,-,-,\"damaged, returned\"")
        );
    }

    #[test]
    fn exports_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.csv");
        export_records_to_csv(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
