//! Markup output for documents.
//!
//! Writing is deterministic: attributes keep their map order, elements with
//! no children use the self-closing form, and non-element nodes are emitted
//! from their raw content.

use std::fmt::{self, Display, Write};

use super::{Document, Element, Node, escape};

impl Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.prolog {
            write_node(f, node)?;
        }
        write_element(f, &self.root)?;
        for node in &self.epilog {
            write_node(f, node)?;
        }
        Ok(())
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(f, self)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self)
    }
}

fn write_node(out: &mut impl Write, node: &Node) -> fmt::Result {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => out.write_str(&escape::escape_text(text)),
        Node::CData(content) => write!(out, "<![CDATA[{content}]]>"),
        Node::Comment(content) => write!(out, "<!--{content}-->"),
        Node::ProcessingInstruction(content) => write!(out, "<?{content}?>"),
        Node::Declaration(content) => write!(out, "<!{content}>"),
    }
}

fn write_element(out: &mut impl Write, element: &Element) -> fmt::Result {
    write!(out, "<{}", element.kind)?;
    for (name, value) in &element.attributes {
        write!(out, " {name}=\"{}\"", escape::escape_attribute(value))?;
    }

    if element.children.is_empty() {
        return out.write_str("/>");
    }

    out.write_char('>')?;
    for child in &element.children {
        write_node(out, child)?;
    }
    write!(out, "</{}>", element.kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_closing_element() {
        let element = Element::new("state").with_attribute("id", "idle");
        assert_eq!(element.to_string(), r#"<state id="idle"/>"#);
    }

    #[test]
    fn test_nested_with_text_and_comment() {
        let element = Element::new("scxml")
            .with_child(Node::Comment(" note ".to_string()))
            .with_child(Node::Element(
                Element::new("script").with_child(Node::Text("a < b".to_string())),
            ));
        assert_eq!(
            element.to_string(),
            "<scxml><!-- note --><script>a &lt; b</script></scxml>"
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let element = Element::new("transition").with_attribute("cond", "x < \"y\"");
        assert_eq!(
            element.to_string(),
            r#"<transition cond="x &lt; &quot;y&quot;"/>"#
        );
    }

    #[test]
    fn test_document_with_prolog_and_epilog() {
        let document = Document::with_surroundings(
            vec![
                Node::ProcessingInstruction("xml version=\"1.0\"".to_string()),
                Node::Text("\n".to_string()),
                Node::Declaration("DOCTYPE scxml".to_string()),
                Node::Text("\n".to_string()),
            ],
            Element::new("scxml").with_child(Node::CData("raw <b>".to_string())),
            vec![Node::Text("\n".to_string())],
        );
        assert_eq!(
            document.to_xml(),
            "<?xml version=\"1.0\"?>\n<!DOCTYPE scxml>\n<scxml><![CDATA[raw <b>]]></scxml>\n"
        );
    }
}
