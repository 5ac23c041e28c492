//! PowerPoint (.pptx) text extraction
//!
//! A .pptx file is a zip package of XML parts. Slide order comes from the
//! `p:sldIdLst` in `ppt/presentation.xml`, resolved through the package
//! relationships. Within a slide, the top-level shapes of `p:spTree` are
//! visited in document order and every shape with a text body contributes
//! its text followed by a line break.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::types::FileType;

use super::extractor::TextExtractor;

const PLACEHOLDER_NAME: &str = "presentation.pptx";
const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// Extracts shape text from every slide
#[derive(Debug, Clone, Default)]
pub struct PresentationExtractor;

impl PresentationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PresentationExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pptx
    }

    fn extract_bytes(&self, data: &[u8]) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::extraction(PLACEHOLDER_NAME, format!("Not a valid OOXML package: {}", e)))?;

        let presentation = read_part(&mut archive, PRESENTATION_PART)?;
        let rels = read_part(&mut archive, PRESENTATION_RELS_PART)?;

        let slide_ids = parse_slide_ids(&presentation)?;
        let targets = parse_relationships(&rels)?;

        let mut text = String::new();
        for (index, rel_id) in slide_ids.iter().enumerate() {
            let target = targets.get(rel_id).ok_or_else(|| {
                Error::extraction(
                    PLACEHOLDER_NAME,
                    format!("Slide {} references unknown relationship {}", index + 1, rel_id),
                )
            })?;
            let part_name = resolve_target("ppt", target);
            let slide_xml = read_part(&mut archive, &part_name)?;

            for shape_text in slide_shape_texts(&part_name, &slide_xml)? {
                text.push_str(&shape_text);
                text.push('\n');
            }
        }

        Ok(text)
    }
}

fn read_part<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut part = archive.by_name(name).map_err(|e| {
        Error::extraction(PLACEHOLDER_NAME, format!("Missing part {}: {}", name, e))
    })?;

    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(|e| {
        Error::extraction(PLACEHOLDER_NAME, format!("Cannot read part {}: {}", name, e))
    })?;
    Ok(xml)
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> Error {
    Error::extraction(PLACEHOLDER_NAME, format!("Malformed XML in {}: {}", part, err))
}

/// Relationship ids of `p:sldId` entries, in presentation order
fn parse_slide_ids(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if e.local_name().as_ref() == b"sldId" {
                    ids.extend(prefixed_attribute(&e, b"id"));
                }
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sldId" => {
                ids.extend(prefixed_attribute(&e, b"id"));
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(PRESENTATION_PART, e)),
            _ => {}
        }
    }

    ensure_closed(PRESENTATION_PART, depth)?;
    Ok(ids)
}

/// `Id -> Target` for every relationship in a .rels part
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut targets = HashMap::new();

    loop {
        let relationship = match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                (e.local_name().as_ref() == b"Relationship").then(|| relationship_entry(&e))
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                Some(relationship_entry(&e))
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                None
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(PRESENTATION_RELS_PART, e)),
            _ => None,
        };

        if let Some((Some(id), Some(target))) = relationship {
            targets.insert(id, target);
        }
    }

    ensure_closed(PRESENTATION_RELS_PART, depth)?;
    Ok(targets)
}

fn relationship_entry(e: &BytesStart<'_>) -> (Option<String>, Option<String>) {
    (plain_attribute(e, b"Id"), plain_attribute(e, b"Target"))
}

/// quick-xml stops at end of input without reporting elements left open
fn ensure_closed(part: &str, open_elements: usize) -> Result<()> {
    if open_elements > 0 {
        return Err(xml_error(part, "unexpected end of document"));
    }
    Ok(())
}

/// Namespaced attribute such as `r:id` (the unprefixed `id` is a different attribute)
fn prefixed_attribute(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn plain_attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Resolve a relationship target against the directory of its source part
fn resolve_target(base_dir: &str, target: &str) -> String {
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

/// Text of one shape being collected
#[derive(Default)]
struct ShapeState {
    /// Stack depth at which the `p:sp` element opened
    depth: usize,
    has_body: bool,
    in_body: bool,
    paragraphs: Vec<String>,
    paragraph: Option<String>,
    in_run_text: bool,
}

/// Text of each top-level text-bearing shape on a slide, in document order.
///
/// Paragraphs inside a shape are joined with `\n`; `a:br` becomes `\n`.
/// Shapes nested in group shapes are not visited.
fn slide_shape_texts(part: &str, xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape: Option<ShapeState> = None;
    let mut texts = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error(part, e))?;

        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();

                if shape.is_none()
                    && name == b"sp"
                    && stack.last().map(|p| p.as_slice()) == Some(b"spTree".as_slice())
                {
                    shape = Some(ShapeState {
                        depth: stack.len(),
                        ..Default::default()
                    });
                } else if let Some(state) = shape.as_mut() {
                    match name.as_slice() {
                        b"txBody" => {
                            state.has_body = true;
                            state.in_body = true;
                        }
                        b"p" if state.in_body => state.paragraph = Some(String::new()),
                        b"t" if state.paragraph.is_some() => state.in_run_text = true,
                        b"br" => {
                            if let Some(p) = state.paragraph.as_mut() {
                                p.push('\n');
                            }
                        }
                        _ => {}
                    }
                }

                stack.push(name);
            }
            Event::Empty(e) => {
                if let Some(state) = shape.as_mut() {
                    match e.local_name().as_ref() {
                        b"txBody" => state.has_body = true,
                        b"p" if state.in_body => state.paragraphs.push(String::new()),
                        b"br" => {
                            if let Some(p) = state.paragraph.as_mut() {
                                p.push('\n');
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(e) => {
                if let Some(state) = shape.as_mut().filter(|s| s.in_run_text) {
                    let text = e.unescape().map_err(|err| xml_error(part, err))?;
                    if let Some(p) = state.paragraph.as_mut() {
                        p.push_str(&text);
                    }
                }
            }
            Event::CData(e) => {
                if let Some(state) = shape.as_mut().filter(|s| s.in_run_text) {
                    if let Some(p) = state.paragraph.as_mut() {
                        p.push_str(&String::from_utf8_lossy(&e));
                    }
                }
            }
            Event::End(e) => {
                stack.pop();

                let mut shape_closed = false;
                if let Some(state) = shape.as_mut() {
                    match e.local_name().as_ref() {
                        b"t" => state.in_run_text = false,
                        b"p" if state.in_body => {
                            if let Some(p) = state.paragraph.take() {
                                state.paragraphs.push(p);
                            }
                        }
                        b"txBody" => state.in_body = false,
                        b"sp" if stack.len() == state.depth => shape_closed = true,
                        _ => {}
                    }
                }

                if shape_closed {
                    if let Some(done) = shape.take().filter(|s| s.has_body) {
                        texts.push(done.paragraphs.join("\n"));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    ensure_closed(part, stack.len())?;
    Ok(texts)
}
