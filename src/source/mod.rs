//! Streaming document source.
//!
//! Reads Wikipedia-style `<page><title>/<text></page>` XML with `xml-rs`'s
//! pull parser on a dedicated thread and hands decoded pages to the
//! indexer over a bounded channel — the same single-producer,
//! single-consumer shape the original system used between its own XML
//! decoder goroutine and the indexer.

use crate::error::{Result, WikidexError};
use crate::model::Document;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread::{self, JoinHandle};
use xml::reader::{EventReader, XmlEvent};

#[derive(Default)]
struct PageBuilder {
    title: String,
    text: String,
}

/// Reads a MediaWiki XML dump, one document per `<page>` element, on a
/// background thread. `limit` bounds how many pages are produced before
/// the reader stops early; `None` reads to EOF.
pub struct WikiSource {
    receiver: crossbeam::channel::Receiver<Result<Document>>,
    handle: Option<JoinHandle<()>>,
}

impl WikiSource {
    pub fn open<P: AsRef<Path>>(path: P, limit: Option<usize>) -> Result<Self> {
        let file = File::open(path)?;
        let (tx, rx) = crossbeam::channel::bounded(16);

        let handle = thread::spawn(move || {
            let parser = EventReader::new(BufReader::new(file));
            let mut remaining = limit;
            let mut current_page: Option<PageBuilder> = None;
            let mut current_field: Option<&'static str> = None;

            for event in parser {
                match event {
                    Ok(XmlEvent::StartElement { name, .. }) => match name.local_name.as_str() {
                        "page" => current_page = Some(PageBuilder::default()),
                        "title" => current_field = Some("title"),
                        "text" => current_field = Some("text"),
                        _ => {}
                    },
                    Ok(XmlEvent::Characters(data)) | Ok(XmlEvent::CData(data)) => {
                        if let (Some(page), Some(field)) = (current_page.as_mut(), current_field) {
                            match field {
                                "title" => page.title.push_str(&data),
                                "text" => page.text.push_str(&data),
                                _ => {}
                            }
                        }
                    }
                    Ok(XmlEvent::EndElement { name }) => match name.local_name.as_str() {
                        "title" | "text" => current_field = None,
                        "page" => {
                            if let Some(page) = current_page.take() {
                                let doc = Document::new("wiki")
                                    .with_field("Title", page.title)
                                    .with_field("Text", page.text);
                                if tx.send(Ok(doc)).is_err() {
                                    return;
                                }
                                if let Some(r) = remaining.as_mut() {
                                    *r -= 1;
                                    if *r == 0 {
                                        return;
                                    }
                                }
                            }
                        }
                        _ => {}
                    },
                    Err(e) => {
                        let _ = tx.send(Err(WikidexError::SourceFailed(e.to_string())));
                        return;
                    }
                    _ => {}
                }
            }
        });

        Ok(Self { receiver: rx, handle: Some(handle) })
    }

    /// Iterates pages as they arrive. A `SourceFailed` error ends the
    /// stream; it is not retried.
    pub fn iter(&self) -> impl Iterator<Item = Result<Document>> + '_ {
        self.receiver.iter()
    }
}

impl Drop for WikiSource {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
