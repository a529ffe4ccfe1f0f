//! Generic markup parser built on the html5ever tokenizer
//!
//! html5ever's tree builder implements the HTML content model: it moves a
//! `<td>` out of a `<body>`, drops a second `<body>`, foster-parents table
//! content and so on. A safelist check run on such a repaired tree would no
//! longer see what the author actually wrote, so it is not used here.
//!
//! Instead the tokenizer feeds a small generic tree builder with XML-like
//! rules:
//!
//! - every start tag becomes an element appended to the current node, and
//!   becomes the current node itself unless it is self-closing
//! - an end tag closes the nearest open element with the same name, along
//!   with everything opened after it; an end tag with no open match is
//!   ignored
//! - text, comments and doctypes are appended to the current node
//! - `<?...?>` becomes a processing instruction node; the tokenizer reports
//!   it as a comment beginning with `?`, so `<!--?...-->` is read the same way
//! - no elements are implied, moved or dropped, and `<script>`/`<style>`
//!   bodies are tokenized as markup rather than raw text
//!
//! Parsing never fails. Tokenizer errors are counted and otherwise ignored.
//!
//! # Examples
//!
//! ```rust
//! use safe_html_validator::parser::parse_fragment;
//! use markup5ever_rcdom::NodeData;
//!
//! let dom = parse_fragment("<td>cell</td><tr>row");
//! let top_level = dom.document.children.borrow();
//! assert_eq!(top_level.len(), 2);
//! assert!(matches!(top_level[0].data, NodeData::Element { .. }));
//! ```

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::{Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parse `input` as a markup fragment
///
/// The returned document node's children are the top-level nodes of the
/// fragment, in source order.
pub fn parse_fragment(input: &str) -> RcDom {
    let dom = RcDom::default();
    if input.is_empty() {
        return dom;
    }

    let builder = GenericTreeBuilder::new(dom.document.clone());
    let tokenizer = Tokenizer::new(builder, TokenizerOpts::default());
    let queue = BufferQueue::default();
    queue.push_back(StrTendril::from_slice(input));
    let _ = tokenizer.feed(&queue);
    tokenizer.end();

    let errors = tokenizer.sink.errors.get();
    if errors > 0 {
        tracing::trace!(errors, "tokenizer recovered from malformed markup");
    }

    dom
}

/// Tree builder without a content model
struct GenericTreeBuilder {
    document: Handle,
    open_elements: RefCell<Vec<Handle>>,
    errors: Cell<usize>,
}

impl GenericTreeBuilder {
    fn new(document: Handle) -> Self {
        Self {
            document,
            open_elements: RefCell::new(Vec::new()),
            errors: Cell::new(0),
        }
    }

    fn current_node(&self) -> Handle {
        self.open_elements
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| self.document.clone())
    }

    fn insert_element(&self, tag: Tag) {
        let element = Node::new(NodeData::Element {
            name: QualName::new(None, Namespace::from(HTML_NAMESPACE), tag.name),
            attrs: RefCell::new(tag.attrs),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: false,
        });
        append(&self.current_node(), element.clone());
        if !tag.self_closing {
            self.open_elements.borrow_mut().push(element);
        }
    }

    fn close_element(&self, tag: &Tag) {
        let mut open = self.open_elements.borrow_mut();
        let position = open.iter().rposition(|node| match node.data {
            NodeData::Element { ref name, .. } => name.local == tag.name,
            _ => false,
        });
        match position {
            Some(index) => open.truncate(index),
            None => self.errors.set(self.errors.get() + 1),
        }
    }

    fn insert_text(&self, text: &str) {
        let parent = self.current_node();
        if let Some(last) = parent.children.borrow().last()
            && let NodeData::Text { ref contents } = last.data
        {
            contents.borrow_mut().push_slice(text);
            return;
        }

        append(
            &parent,
            Node::new(NodeData::Text {
                contents: RefCell::new(StrTendril::from_slice(text)),
            }),
        );
    }
}

impl TokenSink for GenericTreeBuilder {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => self.insert_element(tag),
                TagKind::EndTag => self.close_element(&tag),
            },
            Token::CharacterTokens(text) => self.insert_text(&text),
            Token::NullCharacterToken => self.insert_text("\u{FFFD}"),
            Token::CommentToken(contents) => {
                let data = processing_instruction(&contents)
                    .unwrap_or(NodeData::Comment { contents });
                append(&self.current_node(), Node::new(data));
            }
            Token::DoctypeToken(doctype) => {
                append(
                    &self.current_node(),
                    Node::new(NodeData::Doctype {
                        name: doctype.name.unwrap_or_default(),
                        public_id: doctype.public_id.unwrap_or_default(),
                        system_id: doctype.system_id.unwrap_or_default(),
                    }),
                );
            }
            Token::ParseError(_) => self.errors.set(self.errors.get() + 1),
            Token::EOFToken => self.open_elements.borrow_mut().clear(),
        }
        TokenSinkResult::Continue
    }
}

/// `<?target data?>` arrives from the tokenizer as a bogus comment whose
/// text starts with `?`
fn processing_instruction(comment: &str) -> Option<NodeData> {
    let body = comment.strip_prefix('?')?;
    let body = body.strip_suffix('?').unwrap_or(body);
    let (target, data) = body
        .split_once(|c: char| c.is_ascii_whitespace())
        .unwrap_or((body, ""));
    Some(NodeData::ProcessingInstruction {
        target: StrTendril::from_slice(target),
        contents: StrTendril::from_slice(data.trim()),
    })
}

fn append(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}
