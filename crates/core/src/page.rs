use std::collections::BTreeMap;
use std::fmt;

//
// ─── ELEMENT TREE ──────────────────────────────────────────────────────────────
//

/// Handle into a [`Page`] element arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

/// Resolved display value for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    None,
    Block,
    Inline,
    InlineFlex,
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attrs: BTreeMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    inline_display: Option<Display>,
    interactive: bool,
    detached: bool,
}

impl ElementData {
    fn new(tag: &str, parent: Option<ElementId>) -> Self {
        Self {
            tag: tag.to_owned(),
            attrs: BTreeMap::new(),
            parent,
            children: Vec::new(),
            inline_display: None,
            interactive: true,
            detached: false,
        }
    }
}

/// A default-stylesheet rule: elements matching the attribute selector render
/// with `display` unless an inline value overrides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub attr: String,
    pub value: Option<String>,
    pub display: Display,
}

impl StyleRule {
    #[must_use]
    pub fn hide_attr(attr: &str, value: &str) -> Self {
        Self {
            attr: attr.to_owned(),
            value: Some(value.to_owned()),
            display: Display::None,
        }
    }

    fn matches(&self, attrs: &BTreeMap<String, String>) -> bool {
        match attrs.get(&self.attr) {
            Some(v) => self.value.as_deref().is_none_or(|want| want == v),
            None => false,
        }
    }
}

/// In-memory stand-in for the host page: an element tree with attributes,
/// inline display state, and a small default stylesheet.
///
/// Queries return elements in document order (depth-first over the root
/// elements), which the redirect scan relies on.
#[derive(Debug, Clone, Default)]
pub struct Page {
    elements: Vec<ElementData>,
    roots: Vec<ElementId>,
    rules: Vec<StyleRule>,
    stylesheet_markers: Vec<String>,
}

impl Page {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level element.
    pub fn create_root(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(ElementData::new(tag, None));
        self.roots.push(id);
        id
    }

    /// Adds a child element at the end of `parent`'s child list.
    pub fn append_child(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(ElementData::new(tag, Some(parent)));
        self.elements[parent.0].children.push(id);
        id
    }

    #[must_use]
    pub fn tag(&self, id: ElementId) -> &str {
        &self.elements[id.0].tag
    }

    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements[id.0].parent
    }

    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.elements[id.0].children
    }

    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) {
        self.elements[id.0]
            .attrs
            .insert(name.to_owned(), value.to_owned());
    }

    #[must_use]
    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements[id.0].attrs.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn has_attr_value(&self, id: ElementId, name: &str, value: &str) -> bool {
        self.attr(id, name) == Some(value)
    }

    //
    // ─── QUERIES (document order) ──────────────────────────────────────────
    //

    /// All elements carrying the attribute, page-wide.
    #[must_use]
    pub fn find_all(&self, attr: &str) -> Vec<ElementId> {
        self.collect(None, |data| data.attrs.contains_key(attr))
    }

    /// All elements carrying the attribute with the given value, page-wide.
    #[must_use]
    pub fn find_all_with_value(&self, attr: &str, value: &str) -> Vec<ElementId> {
        self.collect(None, |data| {
            data.attrs.get(attr).map(String::as_str) == Some(value)
        })
    }

    /// Descendants of `root` carrying the attribute (excludes `root` itself).
    #[must_use]
    pub fn find_within(&self, root: ElementId, attr: &str) -> Vec<ElementId> {
        self.collect(Some(root), |data| data.attrs.contains_key(attr))
    }

    /// Descendants of `root` with the given attribute value.
    #[must_use]
    pub fn find_within_value(&self, root: ElementId, attr: &str, value: &str) -> Vec<ElementId> {
        self.collect(Some(root), |data| {
            data.attrs.get(attr).map(String::as_str) == Some(value)
        })
    }

    /// First descendant of `root` with the given attribute value.
    #[must_use]
    pub fn first_within_value(&self, root: ElementId, attr: &str, value: &str) -> Option<ElementId> {
        self.find_within_value(root, attr, value).into_iter().next()
    }

    /// Descendants of `root` with the given tag name.
    #[must_use]
    pub fn find_tag_within(&self, root: ElementId, tag: &str) -> Vec<ElementId> {
        self.collect(Some(root), |data| data.tag == tag)
    }

    fn collect<F>(&self, root: Option<ElementId>, predicate: F) -> Vec<ElementId>
    where
        F: Fn(&ElementData) -> bool,
    {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = match root {
            Some(r) => self.elements[r.0].children.iter().rev().copied().collect(),
            None => self.roots.iter().rev().copied().collect(),
        };
        while let Some(id) = stack.pop() {
            let data = &self.elements[id.0];
            if predicate(data) {
                out.push(id);
            }
            stack.extend(data.children.iter().rev().copied());
        }
        out
    }

    //
    // ─── MUTATION ──────────────────────────────────────────────────────────
    //

    /// Replaces `old` in place with a fresh element of the given tag,
    /// preserving document position. `old`'s subtree leaves the tree.
    pub fn replace_with(&mut self, old: ElementId, tag: &str) -> ElementId {
        let parent = self.elements[old.0].parent;
        let id = ElementId(self.elements.len());
        self.elements.push(ElementData::new(tag, parent));

        match parent {
            Some(p) => {
                if let Some(slot) = self.elements[p.0].children.iter().position(|c| *c == old) {
                    self.elements[p.0].children[slot] = id;
                }
            }
            None => {
                if let Some(slot) = self.roots.iter().position(|r| *r == old) {
                    self.roots[slot] = id;
                }
            }
        }
        self.elements[old.0].parent = None;
        self.elements[old.0].detached = true;
        id
    }

    pub fn set_display(&mut self, id: ElementId, display: Display) {
        self.elements[id.0].inline_display = Some(display);
    }

    /// Removes the inline display value, falling back to the stylesheet.
    pub fn clear_display(&mut self, id: ElementId) {
        self.elements[id.0].inline_display = None;
    }

    /// Toggles the pointer-events/opacity pair of an affordance.
    pub fn set_interactive(&mut self, id: ElementId, interactive: bool) {
        self.elements[id.0].interactive = interactive;
    }

    #[must_use]
    pub fn is_interactive(&self, id: ElementId) -> bool {
        self.elements[id.0].interactive
    }

    //
    // ─── STYLESHEET ────────────────────────────────────────────────────────
    //

    /// Installs a named block of default rules once; returns false when a
    /// block with this marker is already present.
    pub fn install_stylesheet(&mut self, marker: &str, rules: &[StyleRule]) -> bool {
        if self.stylesheet_markers.iter().any(|m| m == marker) {
            return false;
        }
        self.stylesheet_markers.push(marker.to_owned());
        self.rules.extend_from_slice(rules);
        true
    }

    #[must_use]
    pub fn has_stylesheet(&self, marker: &str) -> bool {
        self.stylesheet_markers.iter().any(|m| m == marker)
    }

    //
    // ─── VISIBILITY ────────────────────────────────────────────────────────
    //

    /// The display the element renders with: inline value if set, else the
    /// first matching stylesheet rule, else `Block`.
    #[must_use]
    pub fn computed_display(&self, id: ElementId) -> Display {
        let data = &self.elements[id.0];
        if let Some(display) = data.inline_display {
            return display;
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(&data.attrs))
            .map_or(Display::Block, |rule| rule.display)
    }

    /// Whether the element is currently rendered: neither it nor any
    /// ancestor computes to `display: none`, and it is still in the tree.
    #[must_use]
    pub fn is_visible(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(el) = current {
            let data = &self.elements[el.0];
            if data.detached || self.computed_display(el) == Display::None {
                return false;
            }
            current = data.parent;
        }
        true
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
