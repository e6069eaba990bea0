//! Breadcrumbs locating a node inside a value tree.
//!
//! Rendered as `$` followed by one suffix per step:
//! `.field`, `[index]`, `{entry}.key`, `{entry}.value`, `::Variant`, `?` (option payload).
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Key(usize),
    Value(usize),
    Variant(String),
    Some,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Run `f` one step deeper; the step is removed again whatever `f` returns.
    pub fn scoped<T>(&mut self, segment: Segment, f: impl FnOnce(&mut Path) -> T) -> T {
        self.push(segment);
        let out = f(self);
        self.pop();
        out
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, ".{name}"),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Key(i) => write!(f, "{{{i}}}.key"),
            Segment::Value(i) => write!(f, "{{{i}}}.value"),
            Segment::Variant(name) => write!(f, "::{name}"),
            Segment::Some => write!(f, "?"),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_segment_kind() {
        let mut path = Path::root();
        assert_eq!(path.to_string(), "$");
        path.push(Segment::Field("orders".into()));
        path.push(Segment::Value(1));
        path.push(Segment::Some);
        path.push(Segment::Variant("Rejected".into()));
        path.push(Segment::Index(0));
        assert_eq!(path.to_string(), "$.orders{1}.value?::Rejected[0]");
    }

    #[test]
    fn scoped_pops_even_on_error() {
        let mut path = Path::root();
        let out: Result<(), ()> = path.scoped(Segment::Key(3), |p| {
            assert_eq!(p.to_string(), "${3}.key");
            Err(())
        });
        assert!(out.is_err());
        assert!(path.is_root());
    }
}
