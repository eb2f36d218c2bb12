use survey_fits::{CellValue, FitsFile, TableWriter};

#[test]
fn written_table_reads_back_through_the_file_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("VPHAS_strategy.fits");

    TableWriter::new()
        .extname("STRATEGY")
        .text_column("Field", 8)
        .float_column("RA")
        .float_column("Dec")
        .int_column("Priority")
        .row(vec![
            CellValue::Text("0001".into()),
            CellValue::Float(210.75),
            CellValue::Float(-61.5),
            CellValue::Int(1),
        ])
        .row(vec![
            CellValue::Text("0002".into()),
            CellValue::Float(211.25),
            CellValue::Float(-61.0),
            CellValue::Int(2),
        ])
        .write_to(&path)
        .unwrap();

    let mut fits = FitsFile::open(&path).unwrap();
    assert_eq!(fits.num_hdus(), 2);

    let table = fits.first_table().unwrap();
    assert_eq!(table.num_rows(), 2);
    let names: Vec<_> = table.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Field", "RA", "Dec", "Priority"]);
    assert_eq!(table.text(0, "Field").unwrap(), "0001");
    assert_eq!(table.value(0, "RA").unwrap().as_float(), Some(210.75));
    assert_eq!(table.value(1, "Priority").unwrap().as_int(), Some(2));
}
