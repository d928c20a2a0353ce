use std::fmt;

/// A point in the source, tracked at byte, character and line/column
/// granularity at once.
///
/// `byte_pos` and `char_pos` are the primary data; `line` (1-based) and
/// `column` (0-based, in characters) are maintained incrementally by the
/// lexer so they never require a rescan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub byte_pos: usize,
    pub char_pos: usize,
    pub line: usize,
    pub column: usize,
}

/// A half-open source span `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    pub fn bytes(&self) -> usize {
        self.end.byte_pos - self.start.byte_pos
    }

    pub fn chars(&self) -> usize {
        self.end.char_pos - self.start.char_pos
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}...{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

const MAX_CHILDREN: usize = 32;

#[derive(Debug, Clone)]
struct Children {
    capacity: usize,
    entries: Vec<(&'static str, Option<Range>)>,
    required: u32,
}

/// Source range of an AST node, with an optional map of named child ranges
/// (e.g. a type alias records `keyword`, `name`, `type_params`, `eq`).
///
/// Child capacity is pre-declared at construction; entries are added in a
/// fixed order per node kind and marked required or optional. Required
/// entries always carry a range, optional entries may be unset. Exceeding the
/// declared capacity, adding a 33rd child, or re-adding a name is a
/// programming error and panics.
#[derive(Debug, Clone)]
pub struct Location {
    range: Range,
    children: Option<Box<Children>>,
}

impl Location {
    pub fn new(range: Range) -> Self {
        Location {
            range,
            children: None,
        }
    }

    pub fn with_children(range: Range, capacity: usize) -> Self {
        assert!(
            capacity <= MAX_CHILDREN,
            "child capacity {capacity} exceeds the maximum of {MAX_CHILDREN}"
        );
        Location {
            range,
            children: Some(Box::new(Children {
                capacity,
                entries: Vec::with_capacity(capacity),
                required: 0,
            })),
        }
    }

    pub fn range(&self) -> Range {
        self.range
    }

    fn push_child(&mut self, name: &'static str, range: Option<Range>, required: bool) {
        let children = self
            .children
            .as_mut()
            .expect("children must be pre-allocated with Location::with_children");
        assert!(
            children.entries.len() < children.capacity,
            "not enough child capacity was pre-allocated (capacity {})",
            children.capacity
        );
        assert!(
            children.entries.iter().all(|(n, _)| *n != name),
            "child `{name}` added twice"
        );
        if required {
            children.required |= 1 << children.entries.len();
        }
        children.entries.push((name, range));
    }

    pub(crate) fn add_required_child(&mut self, name: &'static str, range: Range) {
        self.push_child(name, Some(range), true);
    }

    pub(crate) fn add_optional_child(&mut self, name: &'static str, range: Option<Range>) {
        self.push_child(name, range, false);
    }

    /// Range of the named child, or `None` when the child is absent or an
    /// optional child was never set.
    pub fn child(&self, name: &str) -> Option<Range> {
        let children = self.children.as_ref()?;
        children
            .entries
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, range)| *range)
    }

    /// Whether the named child was declared as required.
    pub fn is_child_required(&self, name: &str) -> bool {
        let Some(children) = self.children.as_ref() else {
            return false;
        };
        children
            .entries
            .iter()
            .position(|(n, _)| *n == name)
            .is_some_and(|i| children.required & (1 << i) != 0)
    }

    /// Names of all declared children, in insertion order.
    pub fn child_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.children
            .iter()
            .flat_map(|c| c.entries.iter().map(|(n, _)| *n))
    }
}
