//! Minimal Office Open XML (`.xlsx`) workbook writer.
//!
//! Produces one worksheet per [`Sheet`], every cell stored as an inline
//! string and the header row in bold. That is all the audit report needs,
//! and it keeps the archive readable by Excel, LibreOffice and pandas.

use crate::utils::error::{Result, TrustkitError};
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const HEADER_STYLE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn push_row<I, T>(&mut self, cells: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rows.len() * 128);
        xml.push_str(XML_DECL);
        xml.push_str(&format!(r#"<worksheet xmlns="{}"><sheetData>"#, MAIN_NS));

        let header = self.headers.iter().map(String::as_str);
        write_row(&mut xml, 1, header, Some(HEADER_STYLE));

        for (index, row) in self.rows.iter().enumerate() {
            write_row(&mut xml, index + 2, row.iter().map(String::as_str), None);
        }

        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn add_sheet<I, T>(&mut self, name: &str, headers: I) -> Result<&mut Sheet>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        validate_sheet_name(name)?;
        if self
            .sheets
            .iter()
            .any(|sheet| sheet.name.eq_ignore_ascii_case(name))
        {
            return Err(TrustkitError::ProcessingError {
                message: format!("Duplicate sheet name: {}", name),
            });
        }

        self.sheets.push(Sheet {
            name: name.to_string(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        });
        let last = self.sheets.len() - 1;
        Ok(&mut self.sheets[last])
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.sheets.is_empty() {
            return Err(TrustkitError::ProcessingError {
                message: "A workbook needs at least one sheet".to_string(),
            });
        }

        let options = SimpleFileOptions::default();
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(root_rels().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(self.workbook_rels().as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(styles_xml().as_bytes())?;

        for (index, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;
            zip.write_all(sheet.to_xml().as_bytes())?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
        for index in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                index
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(&format!(
            r#"<workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
            MAIN_NS, REL_NS
        ));
        for (index, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(&sheet.name),
                index + 1,
                index + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, PKG_REL_NS));
        for index in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                index, REL_NS, index
            ));
        }
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
            self.sheets.len() + 1,
            REL_NS
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

fn root_rels() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        XML_DECL, PKG_REL_NS, REL_NS
    )
}

fn styles_xml() -> String {
    format!(
        concat!(
            "{}<styleSheet xmlns=\"{}\">",
            "<fonts count=\"2\">",
            "<font><sz val=\"11\"/><name val=\"Calibri\"/></font>",
            "<font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font>",
            "</fonts>",
            "<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill>",
            "<fill><patternFill patternType=\"gray125\"/></fill></fills>",
            "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>",
            "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
            "<cellXfs count=\"2\">",
            "<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>",
            "<xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/>",
            "</cellXfs>",
            "</styleSheet>"
        ),
        XML_DECL, MAIN_NS
    )
}

fn write_row<'a>(
    xml: &mut String,
    row_number: usize,
    cells: impl Iterator<Item = &'a str>,
    style: Option<u32>,
) {
    xml.push_str(&format!(r#"<row r="{}">"#, row_number));
    for (col, value) in cells.enumerate() {
        // 空值不寫入儲存格
        if value.is_empty() {
            continue;
        }
        let reference = format!("{}{}", column_name(col), row_number);
        let style_attr = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
        let space_attr = if value.trim() != value {
            r#" xml:space="preserve""#
        } else {
            ""
        };
        xml.push_str(&format!(
            r#"<c r="{}" t="inlineStr"{}><is><t{}>{}</t></is></c>"#,
            reference,
            style_attr,
            space_attr,
            escape_xml(value)
        ));
    }
    xml.push_str("</row>");
}

/// Zero-based column index to its spreadsheet letter (0 → A, 26 → AA).
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(ch),
            // XML 1.0 不允許其他控制字元
            c if (c as u32) < 0x20 => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn validate_sheet_name(name: &str) -> Result<()> {
    let length = name.chars().count();
    if length == 0 || length > 31 {
        return Err(TrustkitError::ProcessingError {
            message: format!("Sheet name must be 1-31 characters: '{}'", name),
        });
    }
    if let Some(bad) = name.chars().find(|c| "[]:*?/\\".contains(*c)) {
        return Err(TrustkitError::ProcessingError {
            message: format!("Sheet name '{}' contains invalid character '{}'", name, bad),
        });
    }
    Ok(())
}
