//! Minimal SVG element tree handed over by the host plotting library.
//!
//! The host builds the figure's root `<svg>` once per render; plugins append
//! their overlay group to a clone of it when exporting.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SvgNode {
    pub name: String,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub children: Vec<SvgNode>,
    #[serde(default)]
    pub text: Option<String>,
}

impl SvgNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: SvgNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|candidate| candidate == class)
    }

    /// Visits every node depth-first together with the classes of its ancestors.
    pub fn visit_mut<F>(&mut self, visitor: &mut F)
    where
        F: FnMut(&mut SvgNode, &[String]),
    {
        let mut ancestors = Vec::new();
        self.visit_inner(&mut ancestors, visitor);
    }

    fn visit_inner<F>(&mut self, ancestors: &mut Vec<String>, visitor: &mut F)
    where
        F: FnMut(&mut SvgNode, &[String]),
    {
        visitor(self, ancestors.as_slice());
        let pushed: Vec<String> = self.classes().map(str::to_owned).collect();
        let depth = ancestors.len();
        ancestors.extend(pushed);
        for child in &mut self.children {
            child.visit_inner(ancestors, visitor);
        }
        ancestors.truncate(depth);
    }

    /// Collects references to every node (self included) matching `predicate`.
    pub fn find_all<'a, P>(&'a self, predicate: &P) -> Vec<&'a SvgNode>
    where
        P: Fn(&SvgNode) -> bool,
    {
        let mut found = Vec::new();
        self.find_inner(predicate, &mut found);
        found
    }

    fn find_inner<'a, P>(&'a self, predicate: &P, found: &mut Vec<&'a SvgNode>)
    where
        P: Fn(&SvgNode) -> bool,
    {
        if predicate(self) {
            found.push(self);
        }
        for child in &self.children {
            child.find_inner(predicate, found);
        }
    }

    /// Serializes the subtree as XML markup.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
        }
        if self.children.is_empty() && self.text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_text(text));
        }
        for child in &self.children {
            child.write_markup(out);
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::SvgNode;

    #[test]
    fn markup_escapes_text_and_attributes() {
        let node = SvgNode::new("text")
            .with_attr("data-label", "a \"quoted\" <b>")
            .with_text("x < y & z");
        assert_eq!(
            node.to_markup(),
            "<text data-label=\"a &quot;quoted&quot; &lt;b&gt;\">x &lt; y &amp; z</text>"
        );
    }

    #[test]
    fn empty_elements_self_close() {
        let node = SvgNode::new("g").with_child(SvgNode::new("line").with_attr("x1", "0"));
        assert_eq!(node.to_markup(), "<g><line x1=\"0\"/></g>");
    }

    #[test]
    fn visitor_sees_ancestor_classes() {
        let mut root = SvgNode::new("g")
            .with_attr("class", "mpld3-xaxis outer")
            .with_child(SvgNode::new("g").with_child(SvgNode::new("path")));
        let mut seen = Vec::new();
        root.visit_mut(&mut |node, ancestors| {
            if node.name == "path" {
                seen = ancestors.to_vec();
            }
        });
        assert_eq!(seen, vec!["mpld3-xaxis".to_owned(), "outer".to_owned()]);
    }
}
