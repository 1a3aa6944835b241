//! OOXML word-processor templates.
//!
//! A `.docx` file is a zip package; the body text lives in
//! `word/document.xml` as `<w:p>` paragraphs made of `<w:r>` runs whose
//! visible text sits in `<w:t>` elements. Word frequently splits a single
//! word across several runs, so a paragraph's text is the concatenation of
//! all of its `<w:t>` contents, with `<w:tab/>` read as `\t` and
//! `<w:br/>`/`<w:cr/>` as `\n`.
//!
//! When a paragraph's text changes, the whole new text is written into the
//! paragraph's first text run and the remaining runs are emptied. This keeps
//! the first run's formatting and guarantees that a placeholder broken up by
//! run boundaries is still replaced. Tabs and breaks of a rewritten paragraph
//! move into that run at their new positions in the text. Paragraphs whose
//! text is unchanged are written back untouched.

use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::{DocfillError, Result};

pub const DOCUMENT_PART: &str = "word/document.xml";

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PackagePart {
    name: String,
    data: Vec<u8>,
}

/// An OOXML package with its body paragraphs decoded.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<PackagePart>,
    document_part: usize,
    source_paragraphs: Vec<String>,
    paragraphs: Vec<String>,
}

impl DocxPackage {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(file)
    }

    pub fn read_from<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push(PackagePart {
                name: entry.name().to_string(),
                data,
            });
        }

        Self::from_parts(parts)
    }

    /// Build a minimal package with one single-run paragraph per entry.
    pub fn from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Result<Self> {
        let runs: Vec<Vec<&str>> = paragraphs.iter().map(|p| vec![p.as_ref()]).collect();
        Self::from_runs(&runs)
    }

    /// Build a minimal package where each paragraph is given as its text runs.
    /// A `\t` or `\n` in a run becomes a `<w:tab/>` or `<w:br/>`.
    pub fn from_runs<S: AsRef<str>>(paragraphs: &[Vec<S>]) -> Result<Self> {
        let mut body = String::new();
        for runs in paragraphs {
            body.push_str("<w:p>");
            for run in runs {
                body.push_str(r#"<w:r><w:t xml:space="preserve">"#);
                let text = escape(run.as_ref())
                    .replace('\t', r#"</w:t><w:tab/><w:t xml:space="preserve">"#)
                    .replace('\n', r#"</w:t><w:br/><w:t xml:space="preserve">"#);
                body.push_str(&text);
                body.push_str("</w:t></w:r>");
            }
            body.push_str("</w:p>");
        }
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WORDML_NS}"><w:body>{body}</w:body></w:document>"#
        );

        Self::from_parts(vec![
            PackagePart {
                name: "[Content_Types].xml".to_string(),
                data: CONTENT_TYPES_XML.as_bytes().to_vec(),
            },
            PackagePart {
                name: "_rels/.rels".to_string(),
                data: ROOT_RELS_XML.as_bytes().to_vec(),
            },
            PackagePart {
                name: DOCUMENT_PART.to_string(),
                data: document.into_bytes(),
            },
        ])
    }

    fn from_parts(parts: Vec<PackagePart>) -> Result<Self> {
        let document_part = parts
            .iter()
            .position(|part| part.name == DOCUMENT_PART)
            .ok_or_else(|| DocfillError::Document(format!("package has no {}", DOCUMENT_PART)))?;

        let xml = std::str::from_utf8(&parts[document_part].data).map_err(DocfillError::document)?;
        let paragraphs = read_paragraphs(xml)?;

        Ok(Self {
            parts,
            document_part,
            source_paragraphs: paragraphs.clone(),
            paragraphs,
        })
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    pub fn is_modified(&self) -> bool {
        self.paragraphs != self.source_paragraphs
    }

    pub fn map_paragraphs<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        Self {
            parts: self.parts.clone(),
            document_part: self.document_part,
            source_paragraphs: self.source_paragraphs.clone(),
            paragraphs: self.paragraphs.iter().map(|p| f(p)).collect(),
        }
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let document = if self.is_modified() {
            let xml = std::str::from_utf8(&self.parts[self.document_part].data)
                .map_err(DocfillError::document)?;
            Some(rewrite_paragraphs(xml, &self.source_paragraphs, &self.paragraphs)?)
        } else {
            None
        };

        let mut zip = ZipWriter::new(writer);
        for (i, part) in self.parts.iter().enumerate() {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file(part.name.as_str(), options)?;
            match (&document, i == self.document_part) {
                (Some(xml), true) => zip.write_all(xml.as_bytes())?,
                _ => zip.write_all(&part.data)?,
            }
        }
        zip.finish()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    ParagraphStart,
    ParagraphEmpty,
    ParagraphEnd,
    RunStart,
    RunEnd,
    TextStart,
    TextEnd,
    /// `<w:tab/>`, `<w:br/>` or `<w:cr/>`, carrying the character it reads as.
    Break(char),
    BreakEnd,
    Content,
    Other,
}

fn break_char(name: &[u8]) -> Option<char> {
    match name {
        b"w:tab" => Some('\t'),
        b"w:br" | b"w:cr" => Some('\n'),
        _ => None,
    }
}

fn classify(event: &Event<'_>) -> Tag {
    match event {
        Event::Start(e) if e.name().as_ref() == b"w:p" => Tag::ParagraphStart,
        Event::Empty(e) if e.name().as_ref() == b"w:p" => Tag::ParagraphEmpty,
        Event::End(e) if e.name().as_ref() == b"w:p" => Tag::ParagraphEnd,
        Event::Start(e) if e.name().as_ref() == b"w:r" => Tag::RunStart,
        Event::End(e) if e.name().as_ref() == b"w:r" => Tag::RunEnd,
        Event::Start(e) if e.name().as_ref() == b"w:t" => Tag::TextStart,
        Event::End(e) if e.name().as_ref() == b"w:t" => Tag::TextEnd,
        Event::Start(e) | Event::Empty(e) => break_char(e.name().as_ref()).map_or(Tag::Other, Tag::Break),
        Event::End(e) if break_char(e.name().as_ref()).is_some() => Tag::BreakEnd,
        Event::Text(_) | Event::CData(_) => Tag::Content,
        _ => Tag::Other,
    }
}

fn decode_content(event: &Event<'_>) -> Result<String> {
    match event {
        Event::Text(text) => Ok(text.unescape().map_err(DocfillError::document)?.into_owned()),
        Event::CData(data) => Ok(String::from_utf8_lossy(data).into_owned()),
        _ => Ok(String::new()),
    }
}

/// Tracks which paragraph and how many runs deep the reader currently is.
///
/// A `<w:tab/>` only counts as text inside a run of the current paragraph;
/// the ones under `<w:pPr><w:tabs>` define tab stops.
#[derive(Debug, Default)]
struct Position {
    open: Vec<(usize, usize)>,
    runs: usize,
    next: usize,
}

impl Position {
    fn enter_paragraph(&mut self) {
        self.open.push((self.next, self.runs));
        self.next += 1;
    }

    fn skip_paragraph(&mut self) {
        self.next += 1;
    }

    fn leave_paragraph(&mut self) {
        self.open.pop();
    }

    fn enter_run(&mut self) {
        self.runs += 1;
    }

    fn leave_run(&mut self) {
        self.runs = self.runs.saturating_sub(1);
    }

    fn paragraph(&self) -> Option<usize> {
        self.open.last().map(|&(idx, _)| idx)
    }

    fn in_run(&self) -> bool {
        self.open.last().is_some_and(|&(_, depth)| self.runs > depth)
    }
}

/// A paragraph's text plus the tab and line-break elements it was read from,
/// in document order, so a rewrite can put them back with their attributes.
#[derive(Debug, Default)]
struct ParagraphScan {
    text: String,
    tabs: VecDeque<BytesStart<'static>>,
    line_breaks: VecDeque<BytesStart<'static>>,
}

impl ParagraphScan {
    fn next_break(&mut self, c: char) -> BytesStart<'static> {
        if c == '\t' {
            self.tabs.pop_front().unwrap_or_else(|| BytesStart::new("w:tab"))
        } else {
            self.line_breaks.pop_front().unwrap_or_else(|| BytesStart::new("w:br"))
        }
    }
}

/// Paragraphs in document order. Nested paragraphs (text boxes) get their
/// own entry and their text is not folded into the outer paragraph.
fn scan_paragraphs(xml: &str) -> Result<Vec<ParagraphScan>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<ParagraphScan> = Vec::new();
    let mut position = Position::default();
    let mut in_text = false;

    loop {
        let event = reader.read_event().map_err(DocfillError::document)?;
        if let Event::Eof = event {
            break;
        }
        match classify(&event) {
            Tag::ParagraphStart => {
                position.enter_paragraph();
                paragraphs.push(ParagraphScan::default());
            }
            Tag::ParagraphEmpty => {
                position.skip_paragraph();
                paragraphs.push(ParagraphScan::default());
            }
            Tag::ParagraphEnd => position.leave_paragraph(),
            Tag::RunStart => position.enter_run(),
            Tag::RunEnd => position.leave_run(),
            Tag::TextStart => in_text = true,
            Tag::TextEnd => in_text = false,
            Tag::Break(c) if position.in_run() => {
                if let (Some(idx), Event::Start(e) | Event::Empty(e)) = (position.paragraph(), &event) {
                    let paragraph = &mut paragraphs[idx];
                    paragraph.text.push(c);
                    let element = e.clone().into_owned();
                    if c == '\t' {
                        paragraph.tabs.push_back(element);
                    } else {
                        paragraph.line_breaks.push_back(element);
                    }
                }
            }
            Tag::Content if in_text => {
                if let Some(idx) = position.paragraph() {
                    paragraphs[idx].text.push_str(&decode_content(&event)?);
                }
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn read_paragraphs(xml: &str) -> Result<Vec<String>> {
    Ok(scan_paragraphs(xml)?.into_iter().map(|p| p.text).collect())
}

enum RunText {
    Keep,
    Replace {
        paragraph: usize,
        emitted: bool,
        text_start: BytesStart<'static>,
    },
    Clear,
}

/// Write `text` into the open `<w:t>`, closing and reopening it around each
/// tab or line break so those become `<w:tab/>`/`<w:br/>` siblings again.
fn write_segmented(
    writer: &mut Writer<Vec<u8>>,
    text: &str,
    text_start: &BytesStart<'static>,
    scan: &mut ParagraphScan,
) -> Result<()> {
    let mut segment_start = 0;
    for (i, c) in text.char_indices().filter(|&(_, c)| c == '\t' || c == '\n') {
        writer
            .write_event(Event::Text(BytesText::new(&text[segment_start..i])))
            .map_err(DocfillError::document)?;
        writer
            .write_event(Event::End(BytesEnd::new("w:t")))
            .map_err(DocfillError::document)?;
        writer
            .write_event(Event::Empty(scan.next_break(c)))
            .map_err(DocfillError::document)?;
        writer
            .write_event(Event::Start(text_start.clone()))
            .map_err(DocfillError::document)?;
        segment_start = i + c.len_utf8();
    }
    writer
        .write_event(Event::Text(BytesText::new(&text[segment_start..])))
        .map_err(DocfillError::document)?;
    Ok(())
}

fn rewrite_paragraphs(xml: &str, source: &[String], updated: &[String]) -> Result<String> {
    let mut scans = scan_paragraphs(xml)?;
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut position = Position::default();
    let mut claimed = vec![false; updated.len()];
    let mut run: Option<RunText> = None;

    let changed = |idx: usize| source.get(idx) != updated.get(idx);

    loop {
        let event = reader.read_event().map_err(DocfillError::document)?;
        if let Event::Eof = event {
            break;
        }

        match classify(&event) {
            Tag::ParagraphStart => position.enter_paragraph(),
            Tag::ParagraphEmpty => position.skip_paragraph(),
            Tag::ParagraphEnd => position.leave_paragraph(),
            Tag::RunStart => position.enter_run(),
            Tag::RunEnd => position.leave_run(),
            Tag::TextStart => {
                let target = position.paragraph().filter(|&idx| changed(idx));
                run = Some(match (target, &event) {
                    (Some(idx), Event::Start(start)) if !claimed[idx] => {
                        claimed[idx] = true;
                        let text_start = preserve_space(start);
                        writer
                            .write_event(Event::Start(text_start.clone()))
                            .map_err(DocfillError::document)?;
                        RunText::Replace {
                            paragraph: idx,
                            emitted: false,
                            text_start,
                        }
                    }
                    (Some(_), _) => RunText::Clear,
                    (None, _) => RunText::Keep,
                });
                if matches!(run, Some(RunText::Replace { .. })) {
                    continue;
                }
            }
            Tag::TextEnd => {
                if let Some(RunText::Replace {
                    paragraph,
                    emitted: false,
                    text_start,
                }) = &run
                {
                    write_segmented(&mut writer, &updated[*paragraph], text_start, &mut scans[*paragraph])?;
                }
                run = None;
            }
            // Breaks of a changed paragraph are regenerated inside its text.
            Tag::Break(_) | Tag::BreakEnd
                if position.in_run() && position.paragraph().is_some_and(|idx| changed(idx)) =>
            {
                continue;
            }
            Tag::Content => match run.as_mut() {
                Some(RunText::Replace {
                    paragraph,
                    emitted,
                    text_start,
                }) => {
                    if !*emitted {
                        write_segmented(&mut writer, &updated[*paragraph], text_start, &mut scans[*paragraph])?;
                        *emitted = true;
                    }
                    continue;
                }
                Some(RunText::Clear) => continue,
                Some(RunText::Keep) | None => {}
            },
            _ => {}
        }

        writer.write_event(event).map_err(DocfillError::document)?;
    }

    String::from_utf8(writer.into_inner()).map_err(DocfillError::document)
}

fn preserve_space(start: &BytesStart<'_>) -> BytesStart<'static> {
    let mut owned = start.clone().into_owned();
    let has_space_attr = start
        .attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == b"xml:space");
    if !has_space_attr {
        owned.push_attribute(("xml:space", "preserve"));
    }
    owned
}
