//! XLSX reader

mod unsupported;

pub use unsupported::UnsupportedContent;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::future_functions::strip_future_prefixes;
use crate::shared_formula::shift_formula;
use earthwork_core::{CellAddress, CellError, CellValue, Workbook, Worksheet};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Text collected for one `<c>` element
#[derive(Debug, Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    value: Option<String>,
    formula: Option<String>,
    /// `si` of a `t="shared"` formula
    shared_index: Option<u32>,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>) -> Self {
        let mut cell = PendingCell::default();
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => {
                    cell.reference = attr.unescape_value().ok().map(|s| s.to_string());
                }
                b"t" => {
                    cell.cell_type = attr.unescape_value().ok().map(|s| s.to_string());
                }
                _ => {}
            }
        }
        cell
    }
}

/// The `si` of a `<f t="shared" si="..">` element
fn shared_index(e: &BytesStart<'_>) -> Option<u32> {
    let mut shared = false;
    let mut index = None;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"t" => shared = attr.value.as_ref() == b"shared",
            b"si" => {
                index = attr
                    .unescape_value()
                    .ok()
                    .and_then(|v| v.trim().parse::<u32>().ok());
            }
            _ => {}
        }
    }
    index.filter(|_| shared)
}

/// Anchor cell of a shared formula group
#[derive(Debug)]
struct SharedAnchor {
    row: u32,
    col: u16,
    /// Display text without the leading `=`
    formula: String,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let (workbook, unsupported) = Self::read_with_report(reader)?;
        if !unsupported.is_empty() {
            log::debug!("Not reproduced on write: {}", unsupported);
        }
        Ok(workbook)
    }

    /// Read a workbook from a file path, together with the content a save would lose
    pub fn read_file_with_report<P: AsRef<Path>>(
        path: P,
    ) -> XlsxResult<(Workbook, UnsupportedContent)> {
        let file = File::open(path)?;
        Self::read_with_report(file)
    }

    /// Read a workbook, together with the content [`XlsxWriter`](crate::XlsxWriter) would
    /// not write back: styles, layout parts, drawings and the like
    pub fn read_with_report<R: Read + Seek>(
        reader: R,
    ) -> XlsxResult<(Workbook, UnsupportedContent)> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let mut unsupported = UnsupportedContent::default();
        let shared_strings = Self::read_shared_strings(&mut archive)?;

        // Sheet names with their relationship ids, then rel id -> part path
        let sheet_info = Self::read_workbook_xml(&mut archive, &mut unsupported)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        let mut read_parts = Vec::new();

        for (name, r_id) in &sheet_info {
            let Some(path) = sheet_paths.get(r_id) else {
                log::warn!("Sheet '{}' has no worksheet relationship ({}); skipped", name, r_id);
                continue;
            };

            let mut worksheet = Worksheet::new(name.as_str());
            Self::read_worksheet(
                &mut archive,
                path,
                &mut worksheet,
                &shared_strings,
                &mut unsupported,
            )?;
            workbook.add_existing_worksheet(worksheet)?;
            read_parts.push(path.clone());
        }

        let parts: Vec<String> = archive.file_names().map(str::to_string).collect();
        for part in &parts {
            unsupported.note_part(part, &read_parts);
        }

        // Ensure at least one sheet exists
        if workbook.is_empty() {
            workbook.add_worksheet()?;
        }

        Ok((workbook, unsupported))
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        // Leading and trailing spaces are part of the string
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => {
                        in_t = true;
                    }
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => {
                        in_t = false;
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current_string.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        unsupported: &mut UnsupportedContent,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut r_id = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                name = attr.unescape_value().ok().map(|s| s.to_string());
                            }
                            b"r:id" => {
                                r_id = attr.unescape_value().ok().map(|s| s.to_string());
                            }
                            _ => {}
                        }
                    }

                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Start(e)) if e.name().as_ref() == b"definedName" => {
                    unsupported.note_workbook("defined names");
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = attr.unescape_value().ok().map(|s| s.to_string()),
                            b"Target" => {
                                target = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            b"Type" => {
                                rel_type = attr.unescape_value().ok().map(|s| s.to_string())
                            }
                            _ => {}
                        }
                    }

                    // Only worksheet relationships matter here
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to the xl/ folder unless rooted
                            let full_path = match target.strip_prefix('/') {
                                Some(rooted) => rooted.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet's cells from the archive
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        unsupported: &mut UnsupportedContent,
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        // Text is only taken from <v>, <f> and <t>; inline strings keep their spaces
        xml_reader.trim_text(false);

        let sheet_name = worksheet.name().to_string();
        let mut buf = Vec::new();

        let mut current: Option<PendingCell> = None;
        let mut anchors: HashMap<u32, SharedAnchor> = HashMap::new();
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    unsupported.note_sheet_element(&sheet_name, &e);
                    match e.name().as_ref() {
                        b"c" => current = Some(PendingCell::from_start(&e)),
                        b"v" if current.is_some() => in_value = true,
                        b"f" => {
                            if let Some(cell) = current.as_mut() {
                                in_formula = true;
                                cell.shared_index = shared_index(&e);
                            }
                        }
                        b"is" if current.is_some() => in_inline_str = true,
                        b"rPh" if in_inline_str => in_phonetic = true,
                        b"t" if in_inline_str && !in_phonetic => in_inline_text = true,
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(cell) = current.take() {
                            Self::process_cell(worksheet, cell, shared_strings, &mut anchors)?;
                        }
                    }
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"is" => in_inline_str = false,
                    b"rPh" => in_phonetic = false,
                    b"t" if in_inline_str => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(cell) = current.as_mut() {
                        // Text may arrive in several runs
                        let target = if in_value {
                            Some(&mut cell.value)
                        } else if in_formula {
                            Some(&mut cell.formula)
                        } else if in_inline_text {
                            cell.cell_type = Some("inlineStr".to_string());
                            Some(&mut cell.value)
                        } else {
                            None
                        };
                        if let (Some(target), Ok(text)) = (target, e.unescape()) {
                            target.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    unsupported.note_sheet_element(&sheet_name, &e);
                    match e.name().as_ref() {
                        // A self-closing <c/> carries no content
                        b"c" => {}
                        // Shared formula follower: <f t="shared" si="0"/>
                        b"f" => {
                            if let Some(cell) = current.as_mut() {
                                cell.shared_index = shared_index(&e);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    /// Convert a collected cell into a [`CellValue`] and store it
    fn process_cell(
        worksheet: &mut Worksheet,
        cell: PendingCell,
        shared_strings: &[String],
        anchors: &mut HashMap<u32, SharedAnchor>,
    ) -> XlsxResult<()> {
        let Some(cell_ref) = cell.reference else {
            log::warn!("Cell without a reference skipped");
            return Ok(());
        };
        let addr = CellAddress::parse(&cell_ref).map_err(|e| {
            XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell_ref, e))
        })?;

        let cell_type = cell.cell_type.as_deref();
        let written = cell.formula.filter(|f| !f.trim().is_empty());

        let formula = match (written, cell.shared_index) {
            (Some(f), index) => {
                let display = strip_future_prefixes(f.trim_start_matches('='));
                if let Some(index) = index {
                    anchors.insert(
                        index,
                        SharedAnchor {
                            row: addr.row,
                            col: addr.col,
                            formula: display.clone(),
                        },
                    );
                }
                Some(display)
            }
            (None, Some(index)) => match anchors.get(&index) {
                Some(anchor) => Some(shift_formula(
                    &anchor.formula,
                    i64::from(addr.row) - i64::from(anchor.row),
                    i64::from(addr.col) - i64::from(anchor.col),
                )),
                None => {
                    log::warn!(
                        "Shared formula {} at {} has no anchor cell; keeping cached value",
                        index,
                        cell_ref
                    );
                    None
                }
            },
            (None, None) => None,
        };

        if let Some(formula) = formula {
            // A formula's cached result is advisory; unreadable caches are dropped
            let cached = cell
                .value
                .as_deref()
                .and_then(|v| Self::parse_value(cell_type, v, shared_strings).ok());

            worksheet.set_cell_value_at(
                addr.row,
                addr.col,
                CellValue::Formula {
                    text: format!("={}", formula),
                    cached_value: cached.map(Box::new),
                },
            )?;
        } else if let Some(value) = cell.value {
            let value = Self::parse_value(cell_type, &value, shared_strings)?;
            worksheet.set_cell_value_at(addr.row, addr.col, value)?;
        }

        Ok(())
    }

    fn parse_value(
        cell_type: Option<&str>,
        value: &str,
        shared_strings: &[String],
    ) -> XlsxResult<CellValue> {
        let cell_value = match cell_type {
            // Shared string
            Some("s") => {
                let idx: usize = value.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", value))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::string(s.as_str())
            }

            Some("b") => {
                let value = value.trim();
                CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true"))
            }

            Some("e") => CellError::from_str(value.trim())
                .map(CellValue::Error)
                .unwrap_or_else(|| CellValue::string(value)),

            Some("inlineStr") | Some("str") => CellValue::string(decode_excel_escapes(value)),

            // Number (default type or explicit "n")
            None | Some("n") => match value.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::string(value),
            },

            Some(other) => {
                log::warn!("Unknown cell type '{}'; reading value as text", other);
                CellValue::string(value)
            }
        };

        Ok(cell_value)
    }
}
