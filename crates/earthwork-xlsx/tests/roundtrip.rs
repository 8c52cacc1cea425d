//! Write a workbook and read it back through the public API.

use std::io::{Cursor, Read, Write};

use earthwork_core::{CellError, CellValue, Workbook};
use earthwork_xlsx::{XlsxReader, XlsxWriter};
use pretty_assertions::assert_eq;

fn survey_workbook() -> Workbook {
    let mut workbook = Workbook::new();
    workbook.add_worksheet_with_name("Notes & Checks").unwrap();

    let ws = workbook.worksheet_mut(0).unwrap();
    ws.set_cell_value("E8", 2).unwrap();
    ws.set_cell_value("E9", 3).unwrap();
    ws.set_cell_value("J8", 5.0).unwrap();
    ws.set_cell_value("C14", "A1").unwrap();
    ws.set_cell_value("D14", 101.25).unwrap();
    ws.set_cell_value("R14", true).unwrap();
    ws.set_cell_value("Q14", CellError::Na).unwrap();
    ws.set_cell_formula(
        "O14",
        r#"=LET(existing, M14, proposed, N14, IFS(AND(existing = "", proposed = ""), "", existing > proposed, existing - proposed, TRUE, "-"))"#,
    )
    .unwrap();
    ws.set_cell_value_at(
        13,
        12,
        CellValue::Formula {
            text: "=IF(SUM(D14:G14)=0, \"\", AVERAGE(D14:G14))".into(),
            cached_value: Some(Box::new(CellValue::Number(101.25))),
        },
    )
    .unwrap();

    workbook
}

#[test]
fn test_roundtrip_in_memory() {
    let workbook = survey_workbook();

    let mut buf = Vec::new();
    XlsxWriter::write(&workbook, Cursor::new(&mut buf)).unwrap();
    let read = XlsxReader::read(Cursor::new(buf)).unwrap();

    assert_eq!(read.sheet_count(), 2);
    assert_eq!(read.worksheet(1).unwrap().name(), "Notes & Checks");

    let ws = read.worksheet(0).unwrap();
    assert_eq!(ws.get_value("E8").unwrap(), CellValue::Number(2.0));
    assert_eq!(ws.get_value("C14").unwrap().as_string(), Some("A1"));
    assert_eq!(ws.get_value("D14").unwrap().as_number(), Some(101.25));
    assert_eq!(ws.get_value("R14").unwrap(), CellValue::Boolean(true));
    assert_eq!(ws.get_value("Q14").unwrap(), CellValue::Error(CellError::Na));

    // Display form survives the forward-compatibility markers
    let original = workbook.worksheet(0).unwrap();
    assert_eq!(
        ws.get_formula("O14").unwrap(),
        original.get_formula("O14").unwrap()
    );
    assert_eq!(ws.get_value("M14").unwrap().as_number(), Some(101.25));
    assert_eq!(ws.cell_count(), original.cell_count());
}

#[test]
fn test_roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.xlsx");

    XlsxWriter::write_file(&survey_workbook(), &path).unwrap();
    let read = XlsxReader::read_file(&path).unwrap();

    assert_eq!(
        read.worksheet(0).unwrap().get_value("J8").unwrap(),
        CellValue::Number(5.0)
    );
}

/// A one-sheet package with the given worksheet XML
fn package(sheet_xml: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        let parts = [
            ("[Content_Types].xml", r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#),
            ("xl/workbook.xml", r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Survey" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
            ("xl/_rels/workbook.xml.rels", r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#),
            ("xl/worksheets/sheet1.xml", sheet_xml),
        ];
        for (name, content) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

fn rewrite(workbook: &Workbook) -> (Workbook, String) {
    let mut buf = Vec::new();
    XlsxWriter::write(workbook, Cursor::new(&mut buf)).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(buf.clone())).unwrap();
    let mut xml = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();

    (XlsxReader::read(Cursor::new(buf)).unwrap(), xml)
}

#[test]
fn test_shared_formula_survives_rewrite() {
    let source = package(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
        <row r="14"><c r="K14"><v>40</v></c><c r="L14"><f t="shared" ref="L14:L16" si="0">K14/100</f><v>0.4</v></c></row>
        <row r="15"><c r="K15"><v>50</v></c><c r="L15"><f t="shared" si="0"/><v>0.5</v></c></row>
        <row r="16"><c r="K16"><v>60</v></c><c r="L16"><f t="shared" si="0"/><v>0.6</v></c></row>
        </sheetData></worksheet>"#,
    );
    let workbook = XlsxReader::read(Cursor::new(source)).unwrap();

    let (reread, xml) = rewrite(&workbook);
    let ws = reread.worksheet(0).unwrap();

    assert!(xml.contains("<f>K15/100</f>"), "{xml}");
    assert_eq!(ws.get_formula("L15").unwrap().as_deref(), Some("=K15/100"));
    assert_eq!(ws.get_formula("L16").unwrap().as_deref(), Some("=K16/100"));
    assert_eq!(ws.get_value("L15").unwrap().as_number(), Some(0.5));
}

#[test]
fn test_future_function_markers_survive_rewrite() {
    let source = package(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
        <row r="14"><c r="P14"><f>_xlfn.STDEV.S(D14:G14)+_xlfn.AGGREGATE(9,6,D14:G14)+_xlfn.FORECAST.LINEAR(1,D14:G14,D13:G13)</f><v>0</v></c></row>
        </sheetData></worksheet>"#,
    );
    let workbook = XlsxReader::read(Cursor::new(source)).unwrap();
    assert_eq!(
        workbook.worksheet(0).unwrap().get_formula("P14").unwrap().as_deref(),
        Some("=STDEV.S(D14:G14)+AGGREGATE(9,6,D14:G14)+FORECAST.LINEAR(1,D14:G14,D13:G13)")
    );

    let (_, xml) = rewrite(&workbook);

    assert!(xml.contains("_xlfn.STDEV.S("), "{xml}");
    assert!(xml.contains("_xlfn.AGGREGATE("), "{xml}");
    assert!(xml.contains("_xlfn.FORECAST.LINEAR("), "{xml}");
}

#[test]
fn test_string_whitespace_survives_rewrite() {
    let mut workbook = Workbook::new();
    let ws = workbook.worksheet_mut(0).unwrap();
    ws.set_cell_value("C14", "  A1 ").unwrap();
    ws.set_cell_value("C15", "   ").unwrap();

    let (reread, _) = rewrite(&workbook);
    let ws = reread.worksheet(0).unwrap();

    assert_eq!(ws.get_value("C14").unwrap().as_string(), Some("  A1 "));
    assert_eq!(ws.get_value("C15").unwrap().as_string(), Some("   "));
}
