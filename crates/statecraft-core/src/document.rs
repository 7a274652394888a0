//! Generic attributed document tree.
//!
//! A [`Document`] is produced by the parser and consumed by the metadata
//! manager, the layout solver and the editing commands. The tree is plain
//! owned data: every [`Element`] is owned by its parent and the document owns
//! the root. Transitions refer to states by identifier only, so the tree never
//! needs back-references even though state machines are cyclic.
//!
//! Comments, processing instructions, CDATA and whitespace are kept as
//! [`Node`]s so that content the tool does not interpret is written back
//! unchanged.

pub mod escape;
mod writer;

use indexmap::IndexMap;

/// Attribute map of an element, in source order.
pub type Attributes = IndexMap<String, String>;

/// A child of an element, or a top-level item of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Character data with entity references already decoded.
    Text(String),
    /// Raw content of a `<![CDATA[ ... ]]>` section.
    CData(String),
    /// Raw content of a `<!-- ... -->` comment.
    Comment(String),
    /// Raw content between `<?` and `?>`, including the target name.
    ProcessingInstruction(String),
    /// Raw content between `<!` and `>` of a declaration such as `DOCTYPE`.
    Declaration(String),
}

impl Node {
    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the element mutably if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns `true` for text nodes made only of whitespace.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Node::Text(text) if text.chars().all(char::is_whitespace))
    }
}

/// One tag of the document with its attributes and children.
#[derive(Debug, Clone)]
pub struct Element {
    kind: String,
    attributes: Attributes,
    children: Vec<Node>,
    /// Byte offset of the start tag in the parsed source, if any.
    offset: Option<usize>,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.attributes == other.attributes
            && self.children == other.children
    }
}

impl Element {
    /// Create an element of the given kind with no attributes or children.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
            offset: None,
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style child setter.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Record the source offset of the start tag.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns the tag name.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Change the tag name, keeping attributes and children.
    pub fn set_kind(&mut self, kind: impl Into<String>) {
        self.kind = kind.into();
    }

    /// Returns the byte offset of the start tag in the source it was parsed from.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Returns the value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns all attributes in order.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Set an attribute. An existing attribute keeps its position.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute, preserving the order of the remaining ones.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Keep only the attributes for which `keep` returns `true`.
    pub fn retain_attributes(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.attributes.retain(|name, value| keep(name, value));
    }

    /// Returns the `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Returns all child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns the child nodes for direct manipulation.
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Iterate over child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Iterate mutably over child elements.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    /// Iterate over child elements of the given kind.
    pub fn elements_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |element| element.kind == kind)
    }

    /// Returns the concatenated text and CDATA content of the direct children,
    /// or `None` if the element has neither.
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for child in &self.children {
            if let Node::Text(content) | Node::CData(content) = child {
                text.get_or_insert_with(String::new).push_str(content);
            }
        }
        text
    }

    /// Walk this element and all descendant elements in document order.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Visit this element and all descendants mutably, parents before children.
    pub fn visit_mut(&mut self, visitor: &mut impl FnMut(&mut Element)) {
        visitor(self);
        for child in self.elements_mut() {
            child.visit_mut(visitor);
        }
    }

    /// Find the first element (self included) carrying the given `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.walk().find(|element| element.id() == Some(id))
    }

    /// Remove the child node at `index` (which must be an element), together
    /// with the whitespace node immediately preceding it.
    pub fn remove_child_element(&mut self, index: usize) -> Option<Element> {
        if !matches!(self.children.get(index), Some(Node::Element(_))) {
            return None;
        }
        let removed = self.children.remove(index);
        if index > 0 && self.children[index - 1].is_whitespace() {
            self.children.remove(index - 1);
        }
        match removed {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Append a child element, reusing the indentation of existing children.
    ///
    /// When the element already has indented children, the new child is placed
    /// after the last element on its own line, before the closing indentation.
    pub fn append_element(&mut self, element: Element) {
        let last_element = self
            .children
            .iter()
            .rposition(|node| matches!(node, Node::Element(_)));

        let indent = last_element
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| match &self.children[index] {
                Node::Text(text) if self.children[index].is_whitespace() => Some(text.clone()),
                _ => None,
            });

        let insert_at = match self.children.last() {
            Some(node) if node.is_whitespace() => self.children.len() - 1,
            _ => self.children.len(),
        };

        let mut new_nodes = Vec::with_capacity(2);
        if let Some(indent) = indent {
            new_nodes.push(Node::Text(indent));
        }
        new_nodes.push(Node::Element(element));
        self.children.splice(insert_at..insert_at, new_nodes);
    }
}

/// Pre-order iterator over an element and its descendant elements.
pub struct Walk<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        let children: Vec<&Element> = element.elements().collect();
        self.stack.extend(children.into_iter().rev());
        Some(element)
    }
}

/// A parsed document: one root element plus surrounding top-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    /// Create a document with only a root element.
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Create a document with the nodes found before and after the root.
    pub fn with_surroundings(prolog: Vec<Node>, root: Element, epilog: Vec<Node>) -> Self {
        Self {
            prolog,
            root,
            epilog,
        }
    }

    /// Returns the root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Returns the root element mutably.
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Returns the nodes that precede the root (declaration, comments, ...).
    pub fn prolog(&self) -> &[Node] {
        &self.prolog
    }

    /// Returns the nodes that follow the root.
    pub fn epilog(&self) -> &[Node] {
        &self.epilog
    }

    /// Walk every element of the document in document order.
    pub fn walk(&self) -> Walk<'_> {
        self.root.walk()
    }

    /// Find the first element carrying the given `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.root.find_by_id(id)
    }

    /// Serialize the document back to markup.
    pub fn to_xml(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("scxml")
            .with_child(Node::Text("\n  ".to_string()))
            .with_child(Node::Element(
                Element::new("state")
                    .with_attribute("id", "a")
                    .with_child(Node::Text("\n    ".to_string()))
                    .with_child(Node::Element(
                        Element::new("state").with_attribute("id", "a1"),
                    ))
                    .with_child(Node::Text("\n  ".to_string())),
            ))
            .with_child(Node::Text("\n".to_string()))
    }

    #[test]
    fn test_walk_is_preorder() {
        let root = sample();
        let ids: Vec<_> = root.walk().map(|el| el.id().unwrap_or("-")).collect();
        assert_eq!(ids, vec!["-", "a", "a1"]);
    }

    #[test]
    fn test_find_by_id() {
        let root = sample();
        assert_eq!(root.find_by_id("a1").map(Element::kind), Some("state"));
        assert!(root.find_by_id("missing").is_none());
    }

    #[test]
    fn test_attribute_order_is_preserved() {
        let mut element = Element::new("state")
            .with_attribute("id", "s")
            .with_attribute("initial", "x")
            .with_attribute("foo", "bar");

        element.set_attribute("id", "t");
        element.remove_attribute("initial");

        let names: Vec<_> = element.attributes().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "foo"]);
        assert_eq!(element.id(), Some("t"));
    }

    #[test]
    fn test_equality_ignores_offset() {
        let a = Element::new("state").with_attribute("id", "s").with_offset(10);
        let b = Element::new("state").with_attribute("id", "s").with_offset(99);
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove_child_element_drops_indentation() {
        let mut root = sample();
        let a = root.elements_mut().next().expect("a exists");
        assert!(a.remove_child_element(0).is_none());
        let removed = a.remove_child_element(1).expect("a1 removed");
        assert_eq!(removed.id(), Some("a1"));

        let a = root.find_by_id("a").expect("a exists");
        assert_eq!(a.children(), &[Node::Text("\n  ".to_string())]);
    }

    #[test]
    fn test_append_element_reuses_indentation() {
        let mut root = sample();
        let a = root.elements_mut().next().expect("a exists");
        a.append_element(Element::new("transition").with_attribute("target", "b"));

        let kinds: Vec<_> = a
            .children()
            .iter()
            .map(|node| match node {
                Node::Text(text) => text.clone(),
                Node::Element(el) => el.kind().to_string(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["\n    ", "state", "\n    ", "transition", "\n  "]
        );
    }

    #[test]
    fn test_append_element_to_empty() {
        let mut state = Element::new("state");
        state.append_element(Element::new("transition"));
        assert_eq!(state.elements().count(), 1);
    }

    #[test]
    fn test_text_concatenates_text_and_cdata() {
        let element = Element::new("script")
            .with_child(Node::Text("a < ".to_string()))
            .with_child(Node::Comment(" skip ".to_string()))
            .with_child(Node::CData("b".to_string()));
        assert_eq!(element.text().as_deref(), Some("a < b"));
        assert_eq!(Element::new("state").text(), None);
    }
}
