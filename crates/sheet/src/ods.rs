//! OpenDocument spreadsheet adapter (`ods`, `odf`).

use crate::cell::{CellValue, Grid, Row};
use crate::coerce::{from_float, ods_cell_for, OdsCell};
use crate::error::{Result, SheetError};
use crate::source::{Input, SeekableInput};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Largest column count an OpenDocument sheet can hold
pub const MAX_COLS: usize = 16_384;
/// Largest row count an OpenDocument sheet can hold
pub const MAX_ROWS: usize = 1_048_576;
/// Largest run a single `text:s` element may stand for
const MAX_SPACE_RUN: usize = 65_535;

const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

/// Paragraph style applied to every written cell paragraph
const CONTENTS_STYLE: &str = "Table_20_Contents";

/// Options for reading OpenDocument spreadsheets
#[derive(Debug, Clone, Default)]
pub struct OdsReadOptions {
    /// Return numeric and boolean cells from their typed value attributes
    /// instead of their displayed paragraph text
    pub typed_values: bool,
}

impl OdsReadOptions {
    #[must_use]
    pub fn with_typed_values(mut self, typed_values: bool) -> Self {
        self.typed_values = typed_values;
        self
    }
}

/// Options for writing OpenDocument spreadsheets
#[derive(Debug, Clone)]
pub struct OdsWriteOptions {
    pub sheet_name: String,
}

impl Default for OdsWriteOptions {
    fn default() -> Self {
        OdsWriteOptions {
            sheet_name: "Sheet 1".to_string(),
        }
    }
}

impl OdsWriteOptions {
    #[must_use]
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = name.to_string();
        self
    }
}

/// Read the first table of an OpenDocument spreadsheet
pub fn read(input: Input<'_>, options: &OdsReadOptions) -> Result<Grid> {
    let mut archive = ZipArchive::new(SeekableInput::open(input)?)?;
    let mut content = String::new();
    archive
        .by_name("content.xml")
        .map_err(|_| SheetError::Ods("package has no content.xml".to_string()))?
        .read_to_string(&mut content)?;

    parse_content(&content, options)
}

/// Typed attributes of the cell being read
#[derive(Debug, Default)]
struct CellAttrs {
    repeat: usize,
    value_type: Option<String>,
    value: Option<String>,
    boolean_value: Option<String>,
}

impl CellAttrs {
    fn from_element(e: &BytesStart<'_>) -> Result<Self> {
        let mut attrs = CellAttrs {
            repeat: 1,
            ..Default::default()
        };
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            match attr.key.as_ref() {
                b"table:number-columns-repeated" => {
                    attrs.repeat = parse_count(&attr_value(&attr)?, MAX_COLS)?;
                }
                b"office:value-type" => attrs.value_type = Some(attr_value(&attr)?),
                b"office:value" => attrs.value = Some(attr_value(&attr)?),
                b"office:boolean-value" => attrs.boolean_value = Some(attr_value(&attr)?),
                _ => {}
            }
        }
        Ok(attrs)
    }

    fn typed_value(&self) -> Option<CellValue> {
        match self.value_type.as_deref()? {
            "float" | "percentage" | "currency" => {
                let value: f64 = self.value.as_deref()?.trim().parse().ok()?;
                Some(from_float(value, true))
            }
            "boolean" => Some(CellValue::from(self.boolean_value.as_deref()? == "true")),
            _ => None,
        }
    }
}

/// Attribute text with entity references resolved
fn attr_value(attr: &Attribute<'_>) -> Result<String> {
    let raw = std::str::from_utf8(&attr.value).map_err(quick_xml::Error::from)?;
    let value = unescape(raw).map_err(quick_xml::Error::from)?;
    Ok(value.into_owned())
}

/// A repeat count between 1 and `max`
fn parse_count(raw: &str, max: usize) -> Result<usize> {
    let count = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| SheetError::Ods(format!("invalid repeat count '{raw}'")))?;
    if count > max {
        return Err(SheetError::Ods(format!(
            "repeat count {count} exceeds the limit of {max}"
        )));
    }
    Ok(count.max(1))
}

fn row_repeat(e: &BytesStart<'_>) -> Result<usize> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"table:number-rows-repeated" {
            return parse_count(&attr_value(&attr)?, MAX_ROWS);
        }
    }
    Ok(1)
}

fn space_count(e: &BytesStart<'_>) -> Result<usize> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"text:c" {
            return parse_count(&attr_value(&attr)?, MAX_SPACE_RUN);
        }
    }
    Ok(1)
}

/// Builds the grid while walking the first table. Null cells and empty
/// repeated rows are held back until something non-empty follows them, so
/// trailing ones never materialize.
#[derive(Debug, Default)]
struct GridBuilder {
    grid: Grid,
    row: Row,
    pending_nulls: usize,
    pending_empty_rows: usize,
}

impl GridBuilder {
    fn push_cell(&mut self, value: CellValue, repeat: usize) -> Result<()> {
        if value.is_null() {
            self.pending_nulls = self.pending_nulls.saturating_add(repeat);
            return Ok(());
        }
        let width = self
            .row
            .len()
            .saturating_add(self.pending_nulls)
            .saturating_add(repeat);
        if width > MAX_COLS {
            return Err(SheetError::Ods(format!(
                "row {} is wider than {MAX_COLS} columns",
                self.grid.len() + self.pending_empty_rows
            )));
        }
        self.row
            .extend(std::iter::repeat(CellValue::Null).take(self.pending_nulls));
        self.pending_nulls = 0;
        self.row.extend(std::iter::repeat(value).take(repeat));
        Ok(())
    }

    fn finish_row(&mut self, repeat: usize) -> Result<()> {
        let row = std::mem::take(&mut self.row);
        self.pending_nulls = 0;

        if row.is_empty() && repeat > 1 {
            self.pending_empty_rows = self.pending_empty_rows.saturating_add(repeat);
            return Ok(());
        }
        let height = self
            .grid
            .len()
            .saturating_add(self.pending_empty_rows)
            .saturating_add(repeat);
        if height > MAX_ROWS {
            return Err(SheetError::Ods(format!(
                "table is taller than {MAX_ROWS} rows"
            )));
        }
        self.grid
            .extend(std::iter::repeat_with(Row::new).take(self.pending_empty_rows));
        self.pending_empty_rows = 0;
        for _ in 1..repeat {
            self.grid.push(row.clone());
        }
        self.grid.push(row);
        Ok(())
    }

    fn finish(self) -> Grid {
        if self.pending_empty_rows > 0 {
            debug!(
                rows = self.pending_empty_rows,
                "dropped trailing repeated empty rows"
            );
        }
        self.grid
    }
}

fn parse_content(xml: &str, options: &OdsReadOptions) -> Result<Grid> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut builder = GridBuilder::default();
    let mut seen_table = false;
    let mut in_table = false;
    // tables nested inside cells are skipped
    let mut nested_tables = 0usize;
    let mut row_repeat_count = 1;
    let mut cell: Option<CellAttrs> = None;
    let mut text: Option<String> = None;
    let mut capturing = false;
    let mut annotation_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"table:table" if !seen_table => {
                    seen_table = true;
                    in_table = true;
                }
                b"table:table" if in_table => nested_tables += 1,
                _ if !in_table || nested_tables > 0 => {}
                b"table:table-row" => row_repeat_count = row_repeat(&e)?,
                b"table:table-cell" | b"table:covered-table-cell" => {
                    cell = Some(CellAttrs::from_element(&e)?);
                    text = None;
                }
                b"office:annotation" => annotation_depth += 1,
                b"text:p" if cell.is_some() && annotation_depth == 0 && text.is_none() => {
                    text = Some(String::new());
                    capturing = true;
                }
                b"text:s" if capturing => push_spaces(&mut text, space_count(&e)?),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                _ if !in_table || nested_tables > 0 => {}
                b"table:table-row" => builder.finish_row(row_repeat(&e)?)?,
                b"table:table-cell" | b"table:covered-table-cell" => {
                    let attrs = CellAttrs::from_element(&e)?;
                    let value = if options.typed_values {
                        attrs.typed_value().unwrap_or(CellValue::Null)
                    } else {
                        CellValue::Null
                    };
                    builder.push_cell(value, attrs.repeat)?;
                }
                b"text:p" if cell.is_some() && annotation_depth == 0 && text.is_none() => {
                    text = Some(String::new());
                }
                b"text:s" if capturing => push_spaces(&mut text, space_count(&e)?),
                b"text:tab" if capturing => push_text(&mut text, "\t"),
                b"text:line-break" if capturing => push_text(&mut text, "\n"),
                _ => {}
            },
            Event::Text(t) if capturing => push_text(&mut text, &t.unescape()?),
            Event::CData(t) if capturing => {
                push_text(&mut text, &String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(e) => match e.name().as_ref() {
                b"table:table" if nested_tables > 0 => nested_tables -= 1,
                b"table:table" if in_table => break,
                _ if !in_table || nested_tables > 0 => {}
                b"table:table-row" => {
                    builder.finish_row(row_repeat_count)?;
                    row_repeat_count = 1;
                }
                b"table:table-cell" | b"table:covered-table-cell" => {
                    if let Some(attrs) = cell.take() {
                        let typed = if options.typed_values {
                            attrs.typed_value()
                        } else {
                            None
                        };
                        let value = typed
                            .or_else(|| text.take().map(CellValue::String))
                            .unwrap_or(CellValue::Null);
                        builder.push_cell(value, attrs.repeat)?;
                    }
                    text = None;
                    capturing = false;
                }
                b"office:annotation" => annotation_depth = annotation_depth.saturating_sub(1),
                b"text:p" => capturing = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

fn push_text(text: &mut Option<String>, s: &str) {
    if let Some(text) = text {
        text.push_str(s);
    }
}

fn push_spaces(text: &mut Option<String>, count: usize) {
    if let Some(text) = text {
        text.extend(std::iter::repeat(' ').take(count));
    }
}

/// Write a grid as a single-table OpenDocument spreadsheet
pub fn write(grid: &[Row], options: &OdsWriteOptions) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    // mimetype must be the first entry and stored uncompressed
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file("mimetype", stored)?;
    zip.write_all(MIMETYPE.as_bytes())?;

    let deflated = SimpleFileOptions::default();
    zip.start_file("META-INF/manifest.xml", deflated)?;
    zip.write_all(manifest_xml().as_bytes())?;

    zip.start_file("styles.xml", deflated)?;
    zip.write_all(styles_xml().as_bytes())?;

    zip.start_file("content.xml", deflated)?;
    zip.write_all(content_xml(grid, &options.sheet_name).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

fn manifest_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
 <manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="{MIMETYPE}"/>
 <manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
</manifest:manifest>
"#
    )
}

fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.2">
 <office:styles>
  <style:style style:name="{CONTENTS_STYLE}" style:display-name="Table Contents" style:family="paragraph">
   <style:paragraph-properties text:number-lines="false" text:line-number="0"/>
   <style:text-properties fo:font-weight="bold"/>
  </style:style>
 </office:styles>
</office:document-styles>
"#
    )
}

fn content_xml(grid: &[Row], sheet_name: &str) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" xmlns:of="urn:oasis:names:tc:opendocument:xmlns:of:1.2" office:version="1.2">
<office:body>
<office:spreadsheet>
"#,
    );
    xml.push_str(&format!(
        "<table:table table:name=\"{}\">\n",
        escape(sheet_name)
    ));

    let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
    if cols > 0 {
        xml.push_str(&format!(
            "<table:table-column table:number-columns-repeated=\"{cols}\"/>\n"
        ));
    }

    for row in grid {
        xml.push_str("<table:table-row>");
        if row.is_empty() {
            // a row needs at least one cell
            xml.push_str("<table:table-cell/>");
        }
        for value in row {
            write_cell(&mut xml, value);
        }
        xml.push_str("</table:table-row>\n");
    }

    xml.push_str("</table:table>\n</office:spreadsheet>\n</office:body>\n</office:document-content>\n");
    xml
}

fn write_cell(xml: &mut String, value: &CellValue) {
    match ods_cell_for(value) {
        OdsCell::Formula(body) => xml.push_str(&format!(
            "<table:table-cell office:value-type=\"float\" table:formula=\"{}\"/>",
            escape(body.as_str())
        )),
        OdsCell::Float { value, text } => xml.push_str(&format!(
            "<table:table-cell office:value-type=\"float\" office:value=\"{}\">{}</table:table-cell>",
            escape(value.as_str()),
            paragraph(&text)
        )),
        OdsCell::Text(text) => xml.push_str(&format!(
            "<table:table-cell office:value-type=\"string\">{}</table:table-cell>",
            paragraph(&text)
        )),
        OdsCell::Empty => xml.push_str("<table:table-cell office:value-type=\"string\"/>"),
    }
}

/// A `text:p` element. Tabs, line breaks and space runs that XML would
/// collapse are written as their ODF elements.
fn paragraph(text: &str) -> String {
    let mut out = format!("<text:p text:style-name=\"{CONTENTS_STYLE}\">");
    let mut plain = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\t' => flush_with(&mut out, &mut plain, "<text:tab/>"),
            '\n' => flush_with(&mut out, &mut plain, "<text:line-break/>"),
            ' ' => {
                let mut run = 1;
                while chars.peek() == Some(&' ') {
                    chars.next();
                    run += 1;
                }
                // one literal space survives only right after ordinary text
                if !plain.is_empty() {
                    plain.push(' ');
                    run -= 1;
                }
                if run > 0 {
                    flush_with(&mut out, &mut plain, &format!("<text:s text:c=\"{run}\"/>"));
                }
            }
            _ => plain.push(ch),
        }
    }
    out.push_str(&escape(plain.as_str()));
    out.push_str("</text:p>");
    out
}

fn flush_with(out: &mut String, plain: &mut String, element: &str) {
    out.push_str(&escape(plain.as_str()));
    plain.clear();
    out.push_str(element);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_grid(body: &str, options: &OdsReadOptions) -> Grid {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="o" xmlns:table="t" xmlns:text="x"><office:body><office:spreadsheet>{body}</office:spreadsheet></office:body></office:document-content>"#
        );
        parse_content(&xml, options).unwrap()
    }

    fn roundtrip(grid: &[Row]) -> Grid {
        let bytes = write(grid, &OdsWriteOptions::default()).unwrap();
        read(Input::Bytes(&bytes), &OdsReadOptions::default()).unwrap()
    }

    fn strings(row: &[&str]) -> Row {
        row.iter().map(|s| CellValue::from(*s)).collect()
    }

    #[test]
    fn test_roundtrip_is_textual() {
        let grid = vec![
            vec![CellValue::from("name"), CellValue::from("qty")],
            vec![CellValue::from("bolt"), CellValue::Int(12), CellValue::Float(0.5)],
        ];
        assert_eq!(
            roundtrip(&grid),
            vec![strings(&["name", "qty"]), strings(&["bolt", "12", "0.5"])]
        );
    }

    #[test]
    fn test_trailing_nulls_are_trimmed() {
        let grid = vec![vec![
            CellValue::from("x"),
            CellValue::from("y"),
            CellValue::Null,
            CellValue::Null,
        ]];
        assert_eq!(roundtrip(&grid), vec![strings(&["x", "y"])]);
    }

    #[test]
    fn test_all_null_row_is_empty() {
        let grid = vec![
            vec![CellValue::Null, CellValue::Null],
            vec![CellValue::from("after")],
        ];
        assert_eq!(roundtrip(&grid), vec![vec![], strings(&["after"])]);

        let last = vec![vec![CellValue::from("a")], vec![CellValue::Null]];
        assert_eq!(roundtrip(&last), vec![strings(&["a"]), vec![]]);
    }

    #[test]
    fn test_interior_nulls_are_kept() {
        let grid = vec![vec![CellValue::Null, CellValue::from("b"), CellValue::Null, CellValue::from("d")]];
        assert_eq!(roundtrip(&grid), grid);
    }

    #[test]
    fn test_whitespace_survives() {
        let grid = vec![vec![
            CellValue::from("  two leading"),
            CellValue::from("a   b"),
            CellValue::from("tab\there"),
            CellValue::from("line\nbreak"),
            CellValue::from("<&\"'>"),
        ]];
        assert_eq!(roundtrip(&grid), grid);
    }

    #[test]
    fn test_formula_cells_have_no_paragraph() {
        let grid = vec![vec![CellValue::from("a"), CellValue::formula("of:=[.A1]")]];
        let bytes = write(&grid, &OdsWriteOptions::default()).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
        let mut content = String::new();
        archive
            .by_name("content.xml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.contains(r#"table:formula="of:=[.A1]""#));

        let restored = read(Input::Bytes(&bytes), &OdsReadOptions::default()).unwrap();
        assert_eq!(restored, vec![strings(&["a"])]);
    }

    #[test]
    fn test_package_layout() {
        let bytes = write(&[vec![CellValue::from("x")]], &OdsWriteOptions::default()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        drop(first);

        let mut styles = String::new();
        archive
            .by_name("styles.xml")
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        assert!(styles.contains(r#"style:display-name="Table Contents""#));
        assert!(archive.by_name("META-INF/manifest.xml").is_ok());
    }

    #[test]
    fn test_repeats_are_expanded() {
        let grid = content_grid(
            r#"<table:table table:name="S">
<table:table-row table:number-rows-repeated="2"><table:table-cell table:number-columns-repeated="2"><text:p>r</text:p></table:table-cell><table:table-cell table:number-columns-repeated="1020"/></table:table-row>
<table:table-row table:number-rows-repeated="1048574"><table:table-cell table:number-columns-repeated="1024"/></table:table-row>
</table:table>"#,
            &OdsReadOptions::default(),
        );
        assert_eq!(grid, vec![strings(&["r", "r"]), strings(&["r", "r"])]);
    }

    #[test]
    fn test_repeated_empty_rows_between_data_are_kept() {
        let grid = content_grid(
            r#"<table:table table:name="S">
<table:table-row><table:table-cell><text:p>a</text:p></table:table-cell></table:table-row>
<table:table-row table:number-rows-repeated="2"><table:table-cell/></table:table-row>
<table:table-row><table:covered-table-cell/><table:table-cell><text:p>b</text:p></table:table-cell></table:table-row>
</table:table>"#,
            &OdsReadOptions::default(),
        );
        assert_eq!(
            grid,
            vec![
                strings(&["a"]),
                vec![],
                vec![],
                vec![CellValue::Null, CellValue::from("b")]
            ]
        );
    }

    #[test]
    fn test_first_paragraph_only() {
        let grid = content_grid(
            r#"<table:table table:name="S"><table:table-row><table:table-cell>
<office:annotation><text:p>note</text:p></office:annotation>
<text:p>one<text:s text:c="2"/><text:span>span</text:span></text:p><text:p>two</text:p>
</table:table-cell><table:table-cell><text:p/></table:table-cell><table:table-cell><text:p>z</text:p></table:table-cell></table:table-row></table:table>"#,
            &OdsReadOptions::default(),
        );
        assert_eq!(grid, vec![strings(&["one  span", "", "z"])]);
    }

    #[test]
    fn test_only_first_table() {
        let grid = content_grid(
            r#"<table:table table:name="A"><table:table-row><table:table-cell><text:p>1</text:p></table:table-cell></table:table-row></table:table>
<table:table table:name="B"><table:table-row><table:table-cell><text:p>2</text:p></table:table-cell></table:table-row></table:table>"#,
            &OdsReadOptions::default(),
        );
        assert_eq!(grid, vec![strings(&["1"])]);
    }

    #[test]
    fn test_typed_values() {
        let body = r#"<table:table table:name="S"><table:table-row>
<table:table-cell office:value-type="float" office:value="3"><text:p>3.00</text:p></table:table-cell>
<table:table-cell office:value-type="percentage" office:value="0.25"><text:p>25%</text:p></table:table-cell>
<table:table-cell office:value-type="boolean" office:boolean-value="true"><text:p>TRUE</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>s</text:p></table:table-cell>
</table:table-row></table:table>"#;

        let plain = content_grid(body, &OdsReadOptions::default());
        assert_eq!(plain, vec![strings(&["3.00", "25%", "TRUE", "s"])]);

        let typed = content_grid(body, &OdsReadOptions::default().with_typed_values(true));
        assert_eq!(
            typed,
            vec![vec![
                CellValue::Int(3),
                CellValue::Float(0.25),
                CellValue::Int(1),
                CellValue::from("s")
            ]]
        );
    }

    #[test]
    fn test_attribute_entities_are_resolved() {
        let grid = content_grid(
            r#"<table:table table:name="S"><table:table-row>
<table:table-cell office:value-type="boolean" office:boolean-value="tru&#101;"><text:p>x</text:p></table:table-cell>
<table:table-cell table:number-columns-repeated="&#50;"><text:p>r</text:p></table:table-cell>
</table:table-row></table:table>"#,
            &OdsReadOptions::default().with_typed_values(true),
        );
        assert_eq!(
            grid,
            vec![vec![CellValue::Int(1), CellValue::from("r"), CellValue::from("r")]]
        );
    }

    #[test]
    fn test_oversized_repeat_counts_are_rejected() {
        let huge_empty = format!(
            r#"<office:document-content><table:table table:name="S"><table:table-row>
<table:table-cell table:number-columns-repeated="{}"/><table:table-cell table:number-columns-repeated="2"/>
</table:table-row></table:table></office:document-content>"#,
            usize::MAX
        );
        let err = parse_content(&huge_empty, &OdsReadOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::Ods(_)));

        let huge_rows = r#"<table:table table:name="S">
<table:table-row table:number-rows-repeated="99999999999"><table:table-cell><text:p>x</text:p></table:table-cell></table:table-row>
</table:table>"#;
        let err = parse_content(huge_rows, &OdsReadOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::Ods(_)));
    }

    #[test]
    fn test_repeated_values_past_sheet_width_are_rejected() {
        let xml = r#"<table:table table:name="S"><table:table-row>
<table:table-cell table:number-columns-repeated="16000"/>
<table:table-cell table:number-columns-repeated="1000"><text:p>v</text:p></table:table-cell>
</table:table-row></table:table>"#;
        let err = parse_content(xml, &OdsReadOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::Ods(_)));
    }

    #[test]
    fn test_no_table_is_empty() {
        assert!(content_grid("", &OdsReadOptions::default()).is_empty());
    }

    #[test]
    fn test_missing_content() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("mimetype", SimpleFileOptions::default()).unwrap();
        zip.write_all(MIMETYPE.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = read(Input::Bytes(&bytes), &OdsReadOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::Ods(_)));
    }

    #[test]
    fn test_not_a_zip() {
        let err = read(Input::Bytes(b"plain text"), &OdsReadOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::Zip(_)));
    }
}
