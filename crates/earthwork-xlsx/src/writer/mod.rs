//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use crate::error::{XlsxError, XlsxResult};
use crate::future_functions::add_future_prefixes;
use earthwork_core::{CellAddress, CellValue, Workbook, Worksheet};

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "a workbook needs at least one worksheet".into(),
            ));
        }

        let mut zip = zip::ZipWriter::new(writer);

        Self::write_content_types(&mut zip, workbook)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook)?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            Self::write_worksheet(&mut zip, sheet, i)?;
        }

        zip.finish()?;
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        content.push_str(&format!(
            "\n    <bookViews>\n        <workbookView activeTab=\"{}\"/>\n    </bookViews>\n    <sheets>",
            workbook.active_sheet()
        ));

        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                Self::escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }

        // Ask the host application to recalculate every formula on open
        content.push_str(
            r#"
    </sheets>
    <calcPr fullCalcOnLoad="1"/>
</workbook>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        content.push_str("\n</Relationships>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        index: usize,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if let Some(used) = sheet.used_range() {
            content.push_str(&format!("\n    <dimension ref=\"{}\"/>", used));
        }
        content.push_str("\n    <sheetData>");

        // Write cell data (sparse, row-major)
        let mut current_row: Option<u32> = None;
        for (row, col, value) in sheet.iter_cells() {
            if current_row != Some(row) {
                if current_row.is_some() {
                    content.push_str("\n        </row>");
                }
                content.push_str(&format!("\n        <row r=\"{}\">", row + 1));
                current_row = Some(row);
            }

            let cell_ref = CellAddress::new(row, col).to_a1_string();
            Self::write_cell(&mut content, &cell_ref, value);
        }

        if current_row.is_some() {
            content.push_str("\n        </row>");
        }

        content.push_str("\n    </sheetData>\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_cell(content: &mut String, cell_ref: &str, value: &CellValue) {
        match value {
            CellValue::Number(n) => {
                content.push_str(&format!("\n            <c r=\"{}\"><v>{}</v></c>", cell_ref, n));
            }
            CellValue::String(s) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                    cell_ref,
                    Self::escape_xml(s.as_str())
                ));
            }
            CellValue::Boolean(b) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\" t=\"b\"><v>{}</v></c>",
                    cell_ref,
                    u8::from(*b)
                ));
            }
            CellValue::Error(e) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\" t=\"e\"><v>{}</v></c>",
                    cell_ref,
                    Self::escape_xml(e.as_str())
                ));
            }
            CellValue::Formula { text, cached_value } => {
                let stored = add_future_prefixes(text.strip_prefix('=').unwrap_or(text));
                let formula = Self::escape_xml(&stored);

                // Cached results are written back so the file reads the same before recalculation
                match cached_value.as_deref() {
                    Some(CellValue::Number(n)) => content.push_str(&format!(
                        "\n            <c r=\"{}\"><f>{}</f><v>{}</v></c>",
                        cell_ref, formula, n
                    )),
                    Some(CellValue::String(s)) => content.push_str(&format!(
                        "\n            <c r=\"{}\" t=\"str\"><f>{}</f><v>{}</v></c>",
                        cell_ref,
                        formula,
                        Self::escape_xml(s.as_str())
                    )),
                    Some(CellValue::Boolean(b)) => content.push_str(&format!(
                        "\n            <c r=\"{}\" t=\"b\"><f>{}</f><v>{}</v></c>",
                        cell_ref,
                        formula,
                        u8::from(*b)
                    )),
                    Some(CellValue::Error(e)) => content.push_str(&format!(
                        "\n            <c r=\"{}\" t=\"e\"><f>{}</f><v>{}</v></c>",
                        cell_ref,
                        formula,
                        Self::escape_xml(e.as_str())
                    )),
                    _ => content.push_str(&format!(
                        "\n            <c r=\"{}\"><f>{}</f></c>",
                        cell_ref, formula
                    )),
                }
            }
            // Storage never holds empty cells
            CellValue::Empty => {}
        }
    }

    fn escape_xml(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn sheet_part(bytes: Vec<u8>, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            XlsxWriter::escape_xml(r#"IF(A1<>"", 'x' & B1)"#),
            "IF(A1&lt;&gt;&quot;&quot;, &apos;x&apos; &amp; B1)"
        );
    }

    #[test]
    fn test_formula_is_stored_with_future_markers() {
        let mut workbook = Workbook::new();
        let ws = workbook.worksheet_mut(0).unwrap();
        ws.set_cell_formula("O14", "=LET(existing, M14, existing * 2)")
            .unwrap();
        ws.set_cell_value("C14", "A1").unwrap();

        let mut buf = Vec::new();
        XlsxWriter::write(&workbook, Cursor::new(&mut buf)).unwrap();
        let xml = sheet_part(buf, "xl/worksheets/sheet1.xml");

        assert!(xml.contains("<dimension ref=\"C14:O14\"/>"));
        assert!(xml.contains(
            "<c r=\"O14\"><f>_xlfn.LET(_xlpm.existing, M14, _xlpm.existing * 2)</f></c>"
        ));
        assert!(xml.contains("<c r=\"C14\" t=\"inlineStr\">"));
    }

    #[test]
    fn test_empty_workbook_is_rejected() {
        let result = XlsxWriter::write(&Workbook::empty(), Cursor::new(Vec::new()));
        assert!(matches!(result, Err(XlsxError::InvalidFormat(_))));
    }
}
