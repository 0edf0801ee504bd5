use std::rc::Rc;

use crate::node::Node;

/// Persistent chain of bindings, newest first.
///
/// `define` never touches the receiver: it returns a new chain whose tail is
/// shared with the old one, so environments captured earlier keep seeing the
/// bindings they were built with.
#[derive(Clone, Default)]
pub struct Environment {
    head: Option<Rc<Frame>>,
}

struct Frame {
    name: String,
    value: Node,
    next: Option<Rc<Frame>>,
}

impl Environment {
    pub fn empty() -> Self {
        Self { head: None }
    }

    pub fn define(&self, name: impl Into<String>, value: Node) -> Environment {
        Environment {
            head: Some(Rc::new(Frame {
                name: name.into(),
                value,
                next: self.head.clone(),
            })),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Node> {
        self.iter()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value.clone())
    }

    pub fn iter(&self) -> Bindings<'_> {
        Bindings {
            frame: self.head.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// True when both environments are the same chain.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

// Unlinks uniquely owned frames one at a time so a long chain does not
// recurse once per frame when it is dropped.
impl Drop for Environment {
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(frame) = next {
            match Rc::try_unwrap(frame) {
                Ok(mut frame) => next = frame.next.take(),
                Err(_) => break,
            }
        }
    }
}

pub struct Bindings<'a> {
    frame: Option<&'a Frame>,
}

impl<'a> Iterator for Bindings<'a> {
    type Item = (&'a str, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frame?;
        self.frame = frame.next.as_deref();
        Some((frame.name.as_str(), &frame.value))
    }
}
