//! XLSX document reader.
//!
//! Values, cached formula results and formula text come from calamine.
//! Number formats and comments are not exposed by calamine, so they are
//! read from the archive directly (see [`crate::xlsx_styles`] and
//! [`crate::xlsx_comments`]).

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Instant;

use calamine::{Data, Range, Reader, Xlsx};
use quick_xml::events::Event;
use sheetcheck_engine::{
    CellAddress, CellValue, ComputedValue, DocumentError, Sheet, Workbook,
};
use zip::ZipArchive;

use crate::xlsx_comments::{comment_targets, parse_comments_xml};
use crate::xlsx_styles::{attr_value, parse_sheet_cells, parse_styles_xml, StyleTable};

/// Open an XLSX file.
pub fn open(path: &Path) -> Result<Workbook, DocumentError> {
    let bytes = std::fs::read(path).map_err(|e| DocumentError::Open {
        source: path.display().to_string(),
        message: e.to_string(),
    })?;
    load(&bytes)
}

/// Read an XLSX document held in memory.
pub fn open_bytes(bytes: &[u8]) -> Result<Workbook, DocumentError> {
    load(bytes)
}

fn load(bytes: &[u8]) -> Result<Workbook, DocumentError> {
    let start_time = Instant::now();

    let mut xlsx: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| DocumentError::Corrupt(e.to_string()))?;
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| DocumentError::Corrupt(e.to_string()))?;

    let sheet_names: Vec<String> = xlsx.sheet_names().to_vec();

    let styles = match read_zip_file(&mut archive, "xl/styles.xml") {
        Ok(xml) => parse_styles_xml(&xml),
        Err(_) => StyleTable::default(),
    };
    let workbook_xml = read_zip_file(&mut archive, "xl/workbook.xml").unwrap_or_default();
    let rels_xml = read_zip_file(&mut archive, "xl/_rels/workbook.xml.rels").unwrap_or_default();
    let worksheet_paths = resolve_worksheet_paths(&workbook_xml, &rels_xml, &sheet_names);

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for (name, part) in sheet_names.iter().zip(worksheet_paths) {
        let mut sheet = Sheet::new(name);
        import_values(&mut xlsx, name, &mut sheet)?;
        match part {
            Some(part) => import_parts(&mut archive, &part, &styles, &mut sheet),
            None => log::warn!("no worksheet part found for sheet '{name}'"),
        }
        sheets.push(sheet);
    }

    log::debug!(
        "loaded {} sheet(s) in {} ms",
        sheets.len(),
        start_time.elapsed().as_millis()
    );
    Ok(Workbook::from_sheets(sheets))
}

/// Literal values first, then formulas over them with the literal as their
/// cached result.
fn import_values<RS: Read + Seek>(
    xlsx: &mut Xlsx<RS>,
    name: &str,
    sheet: &mut Sheet,
) -> Result<(), DocumentError> {
    let range = xlsx
        .worksheet_range(name)
        .map_err(|e| DocumentError::Corrupt(format!("sheet '{name}': {e}")))?;

    for (address, data) in cells(&range) {
        if !matches!(data, Data::Empty) {
            sheet.set_cell_value(address, CellValue::from(computed_value(data)));
        }
    }

    let formulas = match xlsx.worksheet_formula(name) {
        Ok(formulas) => formulas,
        Err(e) => {
            log::warn!("formulas of sheet '{name}' unavailable: {e}");
            return Ok(());
        }
    };
    for (address, formula) in cells(&formulas) {
        if formula.is_empty() {
            continue;
        }
        let source = formula.strip_prefix('=').unwrap_or(formula);
        let cached = constant_error(source).unwrap_or_else(|| {
            range
                .get_value((address.row as u32, address.col as u32))
                .map(computed_value)
                .unwrap_or(ComputedValue::Blank)
        });
        sheet.set_cell_value(address, CellValue::formula(source, cached));
    }
    Ok(())
}

/// Cells of a calamine range with absolute addresses.
fn cells<T>(range: &Range<T>) -> impl Iterator<Item = (CellAddress, &T)> + '_
where
    T: calamine::CellType,
{
    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    range.rows().enumerate().flat_map(move |(r, row)| {
        row.iter().enumerate().map(move |(c, value)| {
            let address = CellAddress::new(start_row as usize + r, start_col as usize + c);
            (address, value)
        })
    })
}

fn computed_value(data: &Data) -> ComputedValue {
    match data {
        Data::Empty => ComputedValue::Blank,
        Data::String(s) => ComputedValue::Text(s.clone()),
        Data::Float(n) => ComputedValue::Number(*n),
        Data::Int(n) => ComputedValue::Number(*n as f64),
        Data::Bool(b) => ComputedValue::Boolean(*b),
        Data::Error(e) => ComputedValue::Error(e.to_string()),
        // 1900 date system serial
        Data::DateTime(dt) => ComputedValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => ComputedValue::Text(s.clone()),
    }
}

const ERROR_CODES: [&str; 8] = [
    "#NULL!",
    "#DIV/0!",
    "#VALUE!",
    "#REF!",
    "#NAME?",
    "#NUM!",
    "#N/A",
    "#GETTING_DATA",
];

/// A formula made of a single error constant computes that error, whatever
/// was cached with it (writers commonly cache it as a string).
fn constant_error(source: &str) -> Option<ComputedValue> {
    let source = source.trim();
    ERROR_CODES
        .iter()
        .find(|code| code.eq_ignore_ascii_case(source))
        .map(|code| ComputedValue::Error(code.to_string()))
}

/// Number formats and comments of one worksheet part.
fn import_parts<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    styles: &StyleTable,
    sheet: &mut Sheet,
) {
    match read_zip_file(archive, part) {
        Ok(xml) => {
            for (address, style_id) in parse_sheet_cells(&xml) {
                // Styled blanks exist as BLANK cells.
                let cell = sheet.cell_mut(address);
                if let Some(format) = styles.get(style_id) {
                    cell.format = Some(format.clone());
                }
            }
        }
        Err(e) => log::warn!("{e}"),
    }

    let (dir, file) = part.rsplit_once('/').unwrap_or(("", part));
    let rels_path = format!("{dir}/_rels/{file}.rels");
    let Ok(rels_xml) = read_zip_file(archive, &rels_path) else {
        return;
    };
    for target in comment_targets(&rels_xml) {
        let comments_path = resolve_part_path(dir, &target);
        match read_zip_file(archive, &comments_path) {
            Ok(xml) => {
                for (address, text) in parse_comments_xml(&xml) {
                    sheet.set_comment(address, text);
                }
            }
            Err(e) => log::warn!("{e}"),
        }
    }
}

// =============================================================================
// Package helpers
// =============================================================================

/// Read a file from a ZIP archive.
fn read_zip_file<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String, String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| format!("File '{}' not found in XLSX: {}", path, e))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(content)
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_part_path(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Worksheet part of each sheet, in the order of `sheet_names`.
fn resolve_worksheet_paths(
    workbook_xml: &str,
    rels_xml: &str,
    sheet_names: &[String],
) -> Vec<Option<String>> {
    // (name, rId) pairs from workbook.xml
    let mut name_to_rid: HashMap<String, String> = HashMap::new();
    let mut reader = quick_xml::Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"sheet" =>
            {
                if let (Some(name), Some(rid)) = (attr_value(e, b"name"), attr_value(e, b"r:id")) {
                    name_to_rid.insert(crate::xlsx_styles::unescape_xml(&name), rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    // rId → target from the workbook relationships
    let mut rid_to_target: HashMap<String, String> = HashMap::new();
    let mut reader = quick_xml::Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr_value(e, b"Id"), attr_value(e, b"Target")) {
                    rid_to_target.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    sheet_names
        .iter()
        .map(|name| {
            name_to_rid
                .get(name)
                .and_then(|rid| rid_to_target.get(rid))
                .map(|target| resolve_part_path("xl", target))
        })
        .collect()
}
