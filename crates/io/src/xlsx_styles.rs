//! XLSX style parser: number formats from styles.xml and the cells (with
//! their style index) declared in worksheet XML.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use sheetcheck_engine::{CellAddress, NumberFormat};

/// First id available to workbook-defined number formats.
const FIRST_CUSTOM_FORMAT_ID: u16 = 164;

// =============================================================================
// Public types
// =============================================================================

/// Number format per `cellXfs` index.
#[derive(Debug, Clone, Default)]
pub struct StyleTable {
    formats: Vec<NumberFormat>,
}

impl StyleTable {
    pub fn get(&self, id: usize) -> Option<&NumberFormat> {
        self.formats.get(id)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

// =============================================================================
// XML entity unescaping
// =============================================================================

/// Unescape the 5 predefined XML entities: &amp; &lt; &gt; &quot; &apos;
pub(crate) fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// =============================================================================
// Built-in number formats
// =============================================================================

/// Canonical code of a built-in number format id. Ids 5-8 and 41-44 are
/// locale dependent; the en-US codes are used.
pub fn builtin_format_code(id: u16) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "\"$\"#,##0_);(\"$\"#,##0)",
        6 => "\"$\"#,##0_);[Red](\"$\"#,##0)",
        7 => "\"$\"#,##0.00_);(\"$\"#,##0.00)",
        8 => "\"$\"#,##0.00_);[Red](\"$\"#,##0.00)",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0_);(#,##0)",
        38 => "#,##0_);[Red](#,##0)",
        39 => "#,##0.00_);(#,##0.00)",
        40 => "#,##0.00_);[Red](#,##0.00)",
        41 => "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)",
        42 => "_(\"$\"* #,##0_);_(\"$\"* (#,##0);_(\"$\"* \"-\"_);_(@_)",
        43 => "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)",
        44 => "_(\"$\"* #,##0.00_);_(\"$\"* (#,##0.00);_(\"$\"* \"-\"??_);_(@_)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mm:ss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Resolve a `numFmtId` against the workbook's own `numFmts`.
fn resolve_number_format(id: u16, custom: &HashMap<u16, String>) -> NumberFormat {
    match (custom.get(&id), builtin_format_code(id)) {
        (Some(code), _) if id >= FIRST_CUSTOM_FORMAT_ID => NumberFormat::new(code.clone()),
        (Some(code), _) => NumberFormat::builtin(id, code.clone()),
        (None, Some(code)) => NumberFormat::builtin(id, code),
        (None, None) => {
            log::debug!("unknown number format id {id}, using General");
            NumberFormat::general()
        }
    }
}

// =============================================================================
// styles.xml parser
// =============================================================================

/// Parse styles.xml content into a StyleTable.
pub fn parse_styles_xml(xml: &str) -> StyleTable {
    let custom_num_fmts = parse_num_fmts(xml);
    let formats = parse_cell_xfs(xml)
        .into_iter()
        .map(|id| resolve_number_format(id, &custom_num_fmts))
        .collect();
    StyleTable { formats }
}

/// Parse <numFmts> section → HashMap<formatId, formatCode>
fn parse_num_fmts(xml: &str) -> HashMap<u16, String> {
    let mut map = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_num_fmts = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"numFmts" => {
                in_num_fmts = true;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"numFmts" => {
                break;
            }
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if in_num_fmts && e.name().as_ref() == b"numFmt" =>
            {
                let id: Option<u16> = attr_value(e, b"numFmtId").and_then(|s| s.parse().ok());
                // formatCode is stored escaped, e.g. &quot;$&quot;#,##0
                let code = attr_value(e, b"formatCode").map(|raw| unescape_xml(&raw));
                if let (Some(id), Some(code)) = (id, code) {
                    map.insert(id, code);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("malformed numFmts in styles.xml: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    map
}

/// `numFmtId` of every `<xf>` inside `<cellXfs>`, in index order.
fn parse_cell_xfs(xml: &str) -> Vec<u16> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"cellXfs" => {
                in_cell_xfs = true;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"cellXfs" => {
                break;
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if in_cell_xfs && e.name().as_ref() == b"xf" =>
            {
                let id = attr_value(e, b"numFmtId")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0);
                ids.push(id);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("malformed cellXfs in styles.xml: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    ids
}

// =============================================================================
// Worksheet XML parser
// =============================================================================

/// Every `<c>` element of a worksheet with its style index (0 when absent).
pub fn parse_sheet_cells(xml: &str) -> Vec<(CellAddress, usize)> {
    let mut cells = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"c" => {
                let style_id = attr_value(e, b"s")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0);
                match attr_value(e, b"r").map(|r| CellAddress::parse(&r)) {
                    Some(Ok(address)) => cells.push((address, style_id)),
                    Some(Err(err)) => log::warn!("skipping cell: {err}"),
                    None => log::warn!("skipping cell without reference"),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("malformed worksheet XML: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    cells
}

// =============================================================================
// Helpers
// =============================================================================

pub(crate) fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

// =============================================================================
// Tests
// =============================================================================
