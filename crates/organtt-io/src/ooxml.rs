//! Raw access to the parts of an XLSX package.
//!
//! calamine exposes values only, so formatting is read straight from the
//! package: `xl/workbook.xml` and its relationships locate a sheet's part, and
//! [`walk`] drives a small visitor over each XML document.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::IngestError;

/// Callbacks for [`walk`]. Empty elements get an `open` followed by a `close`.
pub(crate) trait XmlVisitor {
    fn open(&mut self, element: &BytesStart<'_>);

    fn close(&mut self, _name: &[u8]) {}
}

/// Stream `xml` through `visitor`; `part` names the document in errors.
pub(crate) fn walk<V: XmlVisitor>(xml: &str, part: &str, visitor: &mut V) -> Result<(), IngestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf: Vec<u8> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => visitor.open(&e),
            Ok(Event::Empty(e)) => {
                visitor.open(&e);
                visitor.close(e.local_name().as_ref());
            }
            Ok(Event::End(e)) => visitor.close(e.local_name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::Package(format!("failed to parse {part}: {e}"))),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Unescaped value of the attribute with local name `name`
pub(crate) fn attr(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

pub(crate) fn attr_parse<T: std::str::FromStr>(element: &BytesStart<'_>, name: &[u8]) -> Option<T> {
    attr(element, name).and_then(|value| value.trim().parse().ok())
}

/// OOXML boolean: absent means `default`, `"0"`/`"false"` mean false.
pub(crate) fn attr_flag(element: &BytesStart<'_>, name: &[u8], default: bool) -> bool {
    match attr(element, name) {
        Some(value) => !matches!(value.as_str(), "0" | "false"),
        None => default,
    }
}

/// Resolve a relationship target against the `xl/` directory.
pub(crate) fn join_target(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

struct SheetEntries {
    sheets: Vec<(String, String)>,
}

impl XmlVisitor for SheetEntries {
    fn open(&mut self, element: &BytesStart<'_>) {
        if element.local_name().as_ref() == b"sheet" {
            if let (Some(name), Some(rid)) = (attr(element, b"name"), attr(element, b"id")) {
                self.sheets.push((name, rid));
            }
        }
    }
}

struct Relationships {
    targets: Vec<(String, String)>,
}

impl XmlVisitor for Relationships {
    fn open(&mut self, element: &BytesStart<'_>) {
        if element.local_name().as_ref() == b"Relationship" {
            if let (Some(id), Some(target)) = (attr(element, b"Id"), attr(element, b"Target")) {
                self.targets.push((id, target));
            }
        }
    }
}

/// An opened XLSX zip package
pub struct Package<R> {
    archive: ZipArchive<R>,
}

impl Package<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> Package<R> {
    pub fn new(reader: R) -> Result<Self, IngestError> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| IngestError::Package(format!("failed to read zip: {e}")))?;
        Ok(Self { archive })
    }

    /// Content of a part, `None` when the package has no such part
    pub fn read_part(&mut self, name: &str) -> Result<Option<String>, IngestError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(IngestError::Package(format!("{name}: {e}"))),
        };
        let mut xml = String::new();
        file.read_to_string(&mut xml)?;
        Ok(Some(xml))
    }

    fn require_part(&mut self, name: &str) -> Result<String, IngestError> {
        self.read_part(name)?
            .ok_or_else(|| IngestError::Package(format!("missing part {name}")))
    }

    /// Part name of the worksheet called `sheet`
    pub fn sheet_part(&mut self, sheet: &str) -> Result<Option<String>, IngestError> {
        let workbook_xml = self.require_part("xl/workbook.xml")?;
        let rels_xml = self.require_part("xl/_rels/workbook.xml.rels")?;

        let mut entries = SheetEntries { sheets: Vec::new() };
        walk(&workbook_xml, "xl/workbook.xml", &mut entries)?;
        let mut rels = Relationships { targets: Vec::new() };
        walk(&rels_xml, "xl/_rels/workbook.xml.rels", &mut rels)?;

        let Some((_, rid)) = entries.sheets.iter().find(|(name, _)| name == sheet) else {
            return Ok(None);
        };
        Ok(rels
            .targets
            .iter()
            .find(|(id, _)| id == rid)
            .map(|(_, target)| join_target("xl/", target)))
    }
}
