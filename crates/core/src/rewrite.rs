//! Driving the engine from raw HTML.
//!
//! [`LabelRewriter`] feeds byte chunks to a `lol_html` tokenizer, turns what
//! it reports into [`Event`]s and hands them to a [`LabelEngine`]. Every
//! element, text node, comment and doctype is removed from the tokenizer's
//! own output, so what is left of it is markup no handler saw (end tags with
//! no open element), which reaches the engine as [`Event::Raw`]. The engine
//! renders the document.
//!
//! # Example
//!
//! ```rust
//! use rolemark_core::label_html;
//!
//! let labeled = label_html("<body><nav id=menu>Home</nav></body>")?;
//! assert!(labeled.html.contains(r#"<nav id="menu" data-mobile-role="navigational">"#));
//! assert_eq!(labeled.summary.ids.navigational, vec!["menu".to_string()]);
//! # Ok::<(), rolemark_core::RolemarkError>(())
//! ```

use crate::config::LabelConfig;
use crate::engine::{LabelEngine, LabelSummary};
use crate::event::{Attribute, Event, StartTag};
use crate::stats::{LabelStats, StatsSink};
use crate::Result;
use lol_html::html_content::{Doctype, EndTag};
use lol_html::{HtmlRewriter, OutputSink};
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

/// Events reported by the tokenizer and not yet handed to the engine.
#[derive(Default)]
struct EventQueue {
    events: Vec<Event>,
    text: String,
}

/// Sink for the tokenizer's own output: markup that reached no handler.
struct Leftover(Rc<RefCell<EventQueue>>);

impl OutputSink for Leftover {
    fn handle_chunk(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        let raw = String::from_utf8_lossy(chunk).into_owned();
        trace!(%raw, "markup passed through");
        self.0.borrow_mut().events.push(Event::Raw(raw));
    }
}

/// Streaming HTML labeler writing to `W`.
///
/// Every [`flush`](LabelRewriter::flush) writes whatever the engine has
/// rendered so far; that output is final. A text node the tokenizer has only
/// partly reported is held back until it ends, so it is measured and written
/// as one piece.
pub struct LabelRewriter<W: Write> {
    rewriter: HtmlRewriter<'static, Leftover>,
    queue: Rc<RefCell<EventQueue>>,
    engine: LabelEngine,
    out: W,
}

impl<W: Write> LabelRewriter<W> {
    pub fn new(engine: LabelEngine, out: W) -> Self {
        let queue = Rc::new(RefCell::new(EventQueue::default()));

        let elements = Rc::clone(&queue);
        let texts = Rc::clone(&queue);
        let comments = Rc::clone(&queue);
        let doctypes = Rc::clone(&queue);
        let leftover = Leftover(Rc::clone(&queue));

        let rewriter = HtmlRewriter::new(
            lol_html::Settings {
                element_content_handlers: vec![lol_html::element!("*", move |el| {
                    let mut start = StartTag::new(el.tag_name_preserve_case());
                    for attribute in el.attributes() {
                        start.attributes.push(Attribute::new(attribute.name_preserve_case(), attribute.value()));
                    }
                    start.self_closing = el.is_self_closing();

                    el.remove_and_keep_content();
                    let end_handlers = el.end_tag_handlers();
                    start.void = end_handlers.is_none();
                    elements.borrow_mut().events.push(Event::OpenTag(start));

                    if let Some(handlers) = end_handlers {
                        let queue = Rc::clone(&elements);
                        let handler: lol_html::EndTagHandler<'static> = Box::new(move |end: &mut EndTag<'_>| {
                            end.remove();
                            queue.borrow_mut().events.push(Event::CloseTag(end.name_preserve_case()));
                            Ok(())
                        });
                        handlers.push(handler);
                    }
                    Ok(())
                })],
                document_content_handlers: vec![
                    lol_html::doc_text!(move |chunk| {
                        let mut queue = texts.borrow_mut();
                        queue.text.push_str(chunk.as_str());
                        chunk.remove();
                        if chunk.last_in_text_node() && !queue.text.is_empty() {
                            let text = std::mem::take(&mut queue.text);
                            queue.events.push(Event::Text(text));
                        }
                        Ok(())
                    }),
                    lol_html::doc_comments!(move |comment| {
                        comments.borrow_mut().events.push(Event::Comment(comment.text()));
                        comment.remove();
                        Ok(())
                    }),
                    lol_html::doctype!(move |doctype| {
                        doctypes.borrow_mut().events.push(Event::Doctype(render_doctype(doctype)));
                        doctype.remove();
                        Ok(())
                    }),
                ],
                strict: false,
                ..Default::default()
            },
            leftover,
        );

        Self { rewriter, queue, engine, out }
    }

    /// Feeds a chunk of the document.
    pub fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.rewriter.write(chunk)?;
        self.drain();
        Ok(())
    }

    /// Renders everything received so far, apart from a text node still in
    /// progress, and writes it out.
    pub fn flush(&mut self) -> Result<()> {
        self.drain();
        self.engine.flush();
        self.out.write_all(self.engine.take_output().as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    /// Ends the document and returns the writer with the labeling summary.
    pub fn end(self) -> Result<(W, LabelSummary)> {
        let LabelRewriter { rewriter, queue, mut engine, mut out } = self;
        rewriter.end()?;

        let (events, tail) = {
            let mut pending = queue.borrow_mut();
            (std::mem::take(&mut pending.events), std::mem::take(&mut pending.text))
        };
        for event in events {
            engine.handle(event);
        }
        if !tail.is_empty() {
            engine.text(&tail);
        }

        let summary = engine.finish();
        out.write_all(engine.take_output().as_bytes())?;
        out.flush()?;
        Ok((out, summary))
    }

    fn drain(&mut self) {
        let events = std::mem::take(&mut self.queue.borrow_mut().events);
        trace!(count = events.len(), "tokenizer events");
        for event in events {
            self.engine.handle(event);
        }
    }
}

fn render_doctype(doctype: &Doctype<'_>) -> String {
    let mut out = String::from("<!DOCTYPE");
    if let Some(name) = doctype.name() {
        out.push(' ');
        out.push_str(&name);
    }
    match (doctype.public_id(), doctype.system_id()) {
        (Some(public), Some(system)) => out.push_str(&format!(" PUBLIC \"{public}\" \"{system}\"")),
        (Some(public), None) => out.push_str(&format!(" PUBLIC \"{public}\"")),
        (None, Some(system)) => out.push_str(&format!(" SYSTEM \"{system}\"")),
        (None, None) => {}
    }
    out.push('>');
    out
}

/// A labeled document.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledDocument {
    pub html: String,
    pub summary: LabelSummary,
}

/// Labels a complete document with the default configuration.
pub fn label_html(html: &str) -> Result<LabeledDocument> {
    label_html_with_config(html, &LabelConfig::default())
}

/// Labels a complete document.
pub fn label_html_with_config(html: &str, config: &LabelConfig) -> Result<LabeledDocument> {
    label_html_with_stats(html, config, Arc::new(LabelStats::new()))
}

/// Labels a complete document, reporting counters to `stats`.
pub fn label_html_with_stats(
    html: &str, config: &LabelConfig, stats: Arc<dyn StatsSink>,
) -> Result<LabeledDocument> {
    let engine = LabelEngine::new(config.clone(), stats);
    let mut rewriter = LabelRewriter::new(engine, Vec::with_capacity(html.len() + 256));
    rewriter.write(html.as_bytes())?;
    let (bytes, summary) = rewriter.end()?;
    debug!(bytes = bytes.len(), labeled = summary.labeled, "document labeled");

    let html = String::from_utf8(bytes).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(LabeledDocument { html, summary })
}
