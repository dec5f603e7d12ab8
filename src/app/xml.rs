use quick_xml::escape::escape;

pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const STANDALONE_DECLARATION: &str =
	r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Node {
	Element(Element),
	Text(String),
}

/// A tree of XML nodes. Children are rendered in insertion order, which lets callers
/// reproduce the exact element ordering speaker firmware expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
	name: &'static str,
	attributes: Vec<(&'static str, String)>,
	children: Vec<Node>,
}

impl Element {
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Element holding a single text node. Empty text still renders an open/close pair.
	pub fn leaf<T: Into<String>>(name: &'static str, text: T) -> Self {
		Self::new(name).text(text)
	}

	pub fn attr<T: Into<String>>(mut self, key: &'static str, value: T) -> Self {
		self.attributes.push((key, value.into()));
		self
	}

	pub fn attr_if_not_empty(self, key: &'static str, value: &str) -> Self {
		if value.is_empty() {
			self
		} else {
			self.attr(key, value)
		}
	}

	pub fn text<T: Into<String>>(mut self, text: T) -> Self {
		self.children.push(Node::Text(text.into()));
		self
	}

	pub fn child(mut self, child: Element) -> Self {
		self.children.push(Node::Element(child));
		self
	}

	pub fn children<I: IntoIterator<Item = Element>>(mut self, children: I) -> Self {
		self.children
			.extend(children.into_iter().map(Node::Element));
		self
	}

	fn has_element_children(&self) -> bool {
		self.children
			.iter()
			.any(|c| matches!(c, Node::Element(_)))
	}

	fn write(&self, out: &mut String, indent: Option<&str>, depth: usize) {
		out.push('<');
		out.push_str(self.name);
		for (key, value) in &self.attributes {
			out.push(' ');
			out.push_str(key);
			out.push_str("=\"");
			out.push_str(&escape(value.as_str()));
			out.push('"');
		}

		if self.children.is_empty() {
			out.push_str("/>");
			return;
		}
		out.push('>');

		// Mixed content is never indented, whitespace would become part of the text.
		let indent = indent.filter(|_| {
			self.has_element_children()
				&& self.children.iter().all(|c| matches!(c, Node::Element(_)))
		});

		for child in &self.children {
			if let Some(indent) = indent {
				out.push('\n');
				out.push_str(&indent.repeat(depth + 1));
			}
			match child {
				Node::Element(e) => e.write(out, indent, depth + 1),
				Node::Text(t) => write_text(out, t),
			}
		}

		if let Some(indent) = indent {
			out.push('\n');
			out.push_str(&indent.repeat(depth));
		}
		out.push_str("</");
		out.push_str(self.name);
		out.push('>');
	}

	/// Renders this element alone, without any XML declaration.
	pub fn render(&self) -> String {
		let mut out = String::new();
		self.write(&mut out, None, 0);
		out
	}
}

fn is_xml_whitespace(c: char) -> bool {
	matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn push_character_references(out: &mut String, whitespace: &str) {
	for c in whitespace.chars() {
		out.push_str(&format!("&#{};", c as u32));
	}
}

/// Leading and trailing whitespace is written as character references, parsers trim it otherwise.
fn write_text(out: &mut String, text: &str) {
	let trimmed = text.trim_start_matches(is_xml_whitespace);
	let leading = &text[..text.len() - trimmed.len()];
	let content = trimmed.trim_end_matches(is_xml_whitespace);
	let trailing = &trimmed[content.len()..];

	push_character_references(out, leading);
	out.push_str(&escape(content));
	push_character_references(out, trailing);
}

#[derive(Clone, Debug)]
pub struct Document {
	declaration: &'static str,
	indent: Option<&'static str>,
	root: Element,
}

impl Document {
	/// Compact document with a standalone declaration, the shape served to speakers.
	pub fn new(root: Element) -> Self {
		Self {
			declaration: STANDALONE_DECLARATION,
			indent: None,
			root,
		}
	}

	pub fn declaration(mut self, declaration: &'static str) -> Self {
		self.declaration = declaration;
		self
	}

	pub fn indent(mut self, indent: &'static str) -> Self {
		self.indent = Some(indent);
		self
	}

	pub fn render(&self) -> String {
		let mut out = String::from(self.declaration);
		if self.indent.is_some() {
			out.push('\n');
		}
		self.root.write(&mut out, self.indent, 0);
		out
	}
}
