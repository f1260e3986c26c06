//! Parse stage.
//!
//! Folds the pulldown-cmark event stream into a [`DocumentTree`].

use std::iter::Peekable;

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::build::pipeline::document::{
    Alignment, Block, CodeBlock, DocumentTree, Heading, Inline, List, ListItem, Table,
};
use crate::build::pipeline::{ParseError, PipelineContext, PipelineError, Stage};

/// Stage that parses raw markdown into a document tree.
pub struct ParseStage;

impl<'a> Stage<&'a str, DocumentTree> for ParseStage {
    fn name(&self) -> &'static str {
        "parse"
    }

    fn process(&self, input: &'a str, ctx: &PipelineContext) -> Result<DocumentTree, PipelineError> {
        let mut builder = TreeBuilder::new(Parser::new_ext(input, ctx.options));
        let blocks = builder.blocks_until(None)?;
        Ok(DocumentTree { blocks })
    }
}

struct TreeBuilder<'a, I: Iterator<Item = Event<'a>>> {
    events: Peekable<I>,
    /// Task marker seen in the list item currently being built
    task_marker: Option<bool>,
}

impl<'a, I: Iterator<Item = Event<'a>>> TreeBuilder<'a, I> {
    fn new(events: I) -> Self {
        Self {
            events: events.peekable(),
            task_marker: None,
        }
    }

    /// Collect blocks until `end` is consumed (or the stream ends, for the root).
    fn blocks_until(&mut self, end: Option<TagEnd>) -> Result<Vec<Block>, ParseError> {
        let mut blocks = Vec::new();
        loop {
            let Some(event) = self.events.peek() else {
                return match end {
                    None => Ok(blocks),
                    Some(end) => Err(ParseError::UnexpectedEnd(format!("{end:?}"))),
                };
            };

            match event {
                Event::End(found) => {
                    let found = *found;
                    self.events.next();
                    return match end {
                        Some(expected) if expected == found => Ok(blocks),
                        _ => Err(unbalanced(end, found)),
                    };
                }
                Event::Start(tag) if is_block_tag(tag) => {
                    let Some(Event::Start(tag)) = self.events.next() else {
                        return Err(ParseError::UnexpectedEnd("block".to_string()));
                    };
                    blocks.push(self.block(tag)?);
                }
                Event::Rule => {
                    self.events.next();
                    blocks.push(Block::ThematicBreak);
                }
                Event::Html(_) => {
                    let mut html = String::new();
                    while let Some(Event::Html(chunk)) = self.events.peek() {
                        html.push_str(chunk);
                        self.events.next();
                    }
                    blocks.push(Block::Html(html));
                }
                _ => {
                    // Inline content directly inside a container (tight list items)
                    let inlines = self.inlines_until(None)?;
                    if !inlines.is_empty() {
                        blocks.push(Block::Plain(inlines));
                    }
                }
            }
        }
    }

    fn block(&mut self, tag: Tag<'a>) -> Result<Block, ParseError> {
        let end = tag.to_end();
        match tag {
            Tag::Paragraph => Ok(Block::Paragraph(self.inlines_until(Some(end))?)),
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                if !attrs.is_empty() {
                    let names: Vec<&str> = attrs.iter().map(|(name, _)| &**name).collect();
                    tracing::debug!(?names, "ignoring heading attributes other than id and class");
                }
                Ok(Block::Heading(Heading {
                    level: level as u8,
                    id: id.map(|id| id.to_string()),
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                    children: self.inlines_until(Some(end))?,
                }))
            }
            Tag::BlockQuote(_) => Ok(Block::BlockQuote(self.blocks_until(Some(end))?)),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                let code = self.text_until(end)?;
                Ok(Block::CodeBlock(CodeBlock { lang, code }))
            }
            Tag::HtmlBlock => Ok(Block::Html(self.text_until(end)?)),
            Tag::List(start) => Ok(Block::List(self.list(start, end)?)),
            Tag::Table(alignments) => Ok(Block::Table(self.table(&alignments, end)?)),
            other => Err(ParseError::Unsupported(format!("{other:?}"))),
        }
    }

    fn list(&mut self, start: Option<u64>, end: TagEnd) -> Result<List, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.events.next() {
                Some(Event::Start(Tag::Item)) => {
                    // A nested item must not see the enclosing item's marker
                    let enclosing = self.task_marker.take();
                    let children = self.blocks_until(Some(TagEnd::Item))?;
                    let checked = self.task_marker.take();
                    self.task_marker = enclosing;
                    items.push(ListItem { checked, children });
                }
                Some(Event::End(found)) if found == end => {
                    return Ok(List {
                        start,
                        items,
                        classes: Vec::new(),
                    });
                }
                Some(other) => return Err(unexpected(end, &other)),
                None => return Err(ParseError::UnexpectedEnd(format!("{end:?}"))),
            }
        }
    }

    fn table(
        &mut self,
        alignments: &[pulldown_cmark::Alignment],
        end: TagEnd,
    ) -> Result<Table, ParseError> {
        let mut table = Table {
            alignments: alignments.iter().map(|a| convert_alignment(*a)).collect(),
            head: Vec::new(),
            rows: Vec::new(),
        };
        loop {
            match self.events.next() {
                Some(Event::Start(Tag::TableHead)) => {
                    table.head = self.table_cells(TagEnd::TableHead)?;
                }
                Some(Event::Start(Tag::TableRow)) => {
                    let row = self.table_cells(TagEnd::TableRow)?;
                    table.rows.push(row);
                }
                Some(Event::End(found)) if found == end => return Ok(table),
                Some(other) => return Err(unexpected(end, &other)),
                None => return Err(ParseError::UnexpectedEnd(format!("{end:?}"))),
            }
        }
    }

    fn table_cells(&mut self, end: TagEnd) -> Result<Vec<Vec<Inline>>, ParseError> {
        let mut cells = Vec::new();
        loop {
            match self.events.next() {
                Some(Event::Start(Tag::TableCell)) => {
                    cells.push(self.inlines_until(Some(TagEnd::TableCell))?);
                }
                Some(Event::End(found)) if found == end => return Ok(cells),
                Some(other) => return Err(unexpected(end, &other)),
                None => return Err(ParseError::UnexpectedEnd(format!("{end:?}"))),
            }
        }
    }

    /// Concatenate text events up to `end` (code blocks, HTML blocks).
    fn text_until(&mut self, end: TagEnd) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            match self.events.next() {
                Some(Event::Text(chunk)) | Some(Event::Html(chunk)) => text.push_str(&chunk),
                Some(Event::End(found)) if found == end => return Ok(text),
                Some(other) => return Err(unexpected(end, &other)),
                None => return Err(ParseError::UnexpectedEnd(format!("{end:?}"))),
            }
        }
    }

    /// Collect inline nodes until `end` is consumed.
    ///
    /// With `end == None` the run stops, without consuming, at the first
    /// block-level event or closing tag.
    fn inlines_until(&mut self, end: Option<TagEnd>) -> Result<Vec<Inline>, ParseError> {
        let mut inlines = Vec::new();
        loop {
            let Some(event) = self.events.peek() else {
                return match end {
                    None => Ok(inlines),
                    Some(end) => Err(ParseError::UnexpectedEnd(format!("{end:?}"))),
                };
            };

            let stops_run = match event {
                Event::End(_) | Event::Rule | Event::Html(_) => true,
                Event::Start(tag) => is_block_tag(tag),
                _ => false,
            };
            if end.is_none() && stops_run {
                return Ok(inlines);
            }

            let Some(event) = self.events.next() else {
                return Ok(inlines);
            };
            match event {
                Event::End(found) => {
                    return match end {
                        Some(expected) if expected == found => Ok(inlines),
                        _ => Err(unbalanced(end, found)),
                    };
                }
                Event::Text(text) => push_text(&mut inlines, &text),
                Event::Code(code) => inlines.push(Inline::Code(code.to_string())),
                Event::InlineHtml(html) => inlines.push(Inline::Html(html.to_string())),
                Event::SoftBreak => inlines.push(Inline::SoftBreak),
                Event::HardBreak => inlines.push(Inline::HardBreak),
                Event::TaskListMarker(checked) => self.task_marker = Some(checked),
                Event::Start(tag) => inlines.push(self.inline(tag)?),
                other => return Err(ParseError::Unsupported(format!("{other:?}"))),
            }
        }
    }

    fn inline(&mut self, tag: Tag<'a>) -> Result<Inline, ParseError> {
        let end = tag.to_end();
        match tag {
            Tag::Emphasis => Ok(Inline::Emphasis(self.inlines_until(Some(end))?)),
            Tag::Strong => Ok(Inline::Strong(self.inlines_until(Some(end))?)),
            Tag::Strikethrough => Ok(Inline::Strikethrough(self.inlines_until(Some(end))?)),
            Tag::Link {
                dest_url, title, ..
            } => Ok(Inline::Link {
                url: dest_url.to_string(),
                title: title.to_string(),
                children: self.inlines_until(Some(end))?,
            }),
            Tag::Image {
                dest_url, title, ..
            } => Ok(Inline::Image {
                url: dest_url.to_string(),
                title: title.to_string(),
                alt: self.inlines_until(Some(end))?,
            }),
            other => Err(ParseError::Unsupported(format!("{other:?}"))),
        }
    }
}

/// Merge adjacent text events; pulldown-cmark splits text at entity and
/// escape boundaries.
fn push_text(inlines: &mut Vec<Inline>, text: &str) {
    if let Some(Inline::Text(previous)) = inlines.last_mut() {
        previous.push_str(text);
    } else {
        inlines.push(Inline::Text(text.to_string()));
    }
}

fn is_block_tag(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::Heading { .. }
            | Tag::BlockQuote(_)
            | Tag::CodeBlock(_)
            | Tag::HtmlBlock
            | Tag::List(_)
            | Tag::Item
            | Tag::Table(_)
            | Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::MetadataBlock(_)
    )
}

fn convert_alignment(alignment: pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

fn unbalanced(expected: Option<TagEnd>, found: TagEnd) -> ParseError {
    ParseError::Unbalanced {
        expected: expected.map_or_else(|| "document".to_string(), |e| format!("{e:?}")),
        found: format!("{found:?}"),
    }
}

fn unexpected(expected: TagEnd, found: &Event) -> ParseError {
    ParseError::Unbalanced {
        expected: format!("{expected:?}"),
        found: format!("{found:?}"),
    }
}
