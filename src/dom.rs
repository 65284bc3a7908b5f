use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The subset of CSS selectors the theme needs: a single tag, id or class.
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum Selector {
    Tag(String),
    Id(String),
    Class(String),
}

impl Selector {
    pub fn tag(name: &str) -> Self {
        Selector::Tag(name.to_string())
    }

    pub fn id(name: &str) -> Self {
        Selector::Id(name.to_string())
    }

    pub fn class(name: &str) -> Self {
        Selector::Class(name.to_string())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Selector::Tag(t) => write!(f, "{t}"),
            Selector::Id(i) => write!(f, "#{i}"),
            Selector::Class(c) => write!(f, ".{c}"),
        }
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let selector = match s.chars().next() {
            Some('#') => Selector::Id(s[1..].to_string()),
            Some('.') => Selector::Class(s[1..].to_string()),
            _ => Selector::Tag(s.to_ascii_lowercase()),
        };
        let name = match &selector {
            Selector::Tag(n) | Selector::Id(n) | Selector::Class(n) => n.as_str(),
        };
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(selector)
        } else {
            Err(Error::InvalidSelector(s.to_string()))
        }
    }
}

impl TryFrom<String> for Selector {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Element lookup and class mutation on a document.
pub trait Dom {
    type Element;

    fn select(&self, selector: &Selector) -> Result<Vec<Self::Element>>;
    fn add_class(&mut self, element: &Self::Element, class: &str) -> Result<()>;
    fn remove_class(&mut self, element: &Self::Element, class: &str) -> Result<()>;
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: BTreeSet<String>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Node {
            tag: tag.to_ascii_lowercase(),
            ..Node::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.insert(class.to_string());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Tag(t) => &self.tag == t,
            Selector::Id(i) => self.id.as_ref() == Some(i),
            Selector::Class(c) => self.has_class(c),
        }
    }
}

/// A flat document held in memory. Elements are addressed by their index in
/// document order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryDom {
    nodes: Vec<Node>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// First element matching `selector`.
    pub fn find(&self, selector: &Selector) -> Option<&Node> {
        self.nodes.iter().find(|n| n.matches(selector))
    }

    fn node_mut(&mut self, element: usize) -> Result<&mut Node> {
        self.nodes
            .get_mut(element)
            .ok_or_else(|| Error::Js(format!("element {element} is not in the document")))
    }
}

impl Dom for MemoryDom {
    type Element = usize;

    fn select(&self, selector: &Selector) -> Result<Vec<usize>> {
        Ok(self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.matches(selector))
            .map(|(i, _)| i)
            .collect())
    }

    fn add_class(&mut self, element: &usize, class: &str) -> Result<()> {
        self.node_mut(*element)?.classes.insert(class.to_string());
        Ok(())
    }

    fn remove_class(&mut self, element: &usize, class: &str) -> Result<()> {
        self.node_mut(*element)?.classes.remove(class);
        Ok(())
    }
}

#[cfg(test)]
use pretty_assertions::assert_eq;

#[test]
fn test_selector_parse() {
    assert_eq!("body".parse::<Selector>().unwrap(), Selector::tag("body"));
    assert_eq!("TABLE".parse::<Selector>().unwrap(), Selector::tag("table"));
    assert_eq!("#dark-on".parse::<Selector>().unwrap(), Selector::id("dark-on"));
    assert_eq!(
        ".dropdown-menu".parse::<Selector>().unwrap(),
        Selector::class("dropdown-menu"),
    );
    for bad in ["", "#", ".", "a b", "div > p", ".a.b"] {
        assert!(bad.parse::<Selector>().is_err(), "{bad:?} should not parse");
    }
    assert_eq!(Selector::class("dropdown-menu").to_string(), ".dropdown-menu");
    assert_eq!(Selector::id("dark-off").to_string(), "#dark-off");
}

#[test]
fn test_memory_dom() {
    let mut dom = MemoryDom::new()
        .with(Node::new("body"))
        .with(Node::new("table").class("striped"))
        .with(Node::new("ul").class("dropdown-menu"))
        .with(Node::new("span").id("dark-on"));

    assert_eq!(dom.select(&Selector::tag("table")).unwrap(), vec![1]);
    assert_eq!(dom.select(&Selector::class("dropdown-menu")).unwrap(), vec![2]);
    assert_eq!(dom.select(&Selector::id("dark-on")).unwrap(), vec![3]);
    assert_eq!(dom.select(&Selector::id("missing")).unwrap(), Vec::<usize>::new());

    dom.add_class(&1, "dark").unwrap();
    assert!(dom.nodes()[1].has_class("dark"));
    assert!(dom.nodes()[1].has_class("striped"));
    dom.remove_class(&1, "dark").unwrap();
    dom.remove_class(&1, "dark").unwrap();
    assert!(!dom.nodes()[1].has_class("dark"));

    assert!(dom.add_class(&9, "dark").is_err());
}
