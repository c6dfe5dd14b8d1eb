//! Headless page model.
//!
//! A [`Page`] is an arena of [`Element`]s rooted at a `<body>` element, plus a
//! [`Viewport`]. It models exactly the parts of a browser document the widget
//! touches: classes and attributes for lookup, a typed inline [`Style`],
//! document-relative [`Layout`] boxes for intersection checks, input values,
//! and container scrolling.
//!
//! Pages render back to HTML with [`Page::render`], so the same tree the
//! widget mutates is what the server sends to the browser.
//!
//! # Example
//!
//! ```rust
//! use study_chat_widget::dom::Page;
//!
//! let mut page = Page::new(800.0);
//! let list = page.create_element("div");
//! page.set_class(list, "space-y-4");
//! page.append_child(page.root(), list);
//!
//! let item = page.create_element("p");
//! page.set_text(item, "Olá <mundo>");
//! page.append_child(list, item);
//!
//! assert_eq!(page.text_content(list), "Olá <mundo>");
//! assert!(page.render(list).contains("Olá &lt;mundo&gt;"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::selector::Selector;

/// Elements rendered without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Handle to an element inside a [`Page`].
///
/// Ids are only meaningful for the page that created them; indexing a page
/// with a foreign id panics, the same way an out-of-range slice index does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// CSS `display` values the widget uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    None,
    Flex,
}

impl Display {
    fn as_css(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Flex => "flex",
        }
    }
}

/// Inline style properties set from code.
///
/// `None` means the property is not set inline and the stylesheet decides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub display: Option<Display>,
    pub opacity: Option<f64>,
    /// Vertical offset in px, rendered as `transform: translateY(..)`.
    pub translate_y: Option<f64>,
    pub transition: Option<String>,
}

impl Style {
    /// Whether no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display.is_none()
            && self.opacity.is_none()
            && self.translate_y.is_none()
            && self.transition.is_none()
    }

    /// Render as the value of a `style` attribute.
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut parts = Vec::new();
        if let Some(display) = self.display {
            parts.push(format!("display: {}", display.as_css()));
        }
        if let Some(opacity) = self.opacity {
            parts.push(format!("opacity: {opacity}"));
        }
        if let Some(offset) = self.translate_y {
            if offset == 0.0 {
                parts.push("transform: translateY(0)".to_string());
            } else {
                parts.push(format!("transform: translateY({offset}px)"));
            }
        }
        if let Some(transition) = &self.transition {
            parts.push(format!("transition: {transition}"));
        }
        parts.join("; ")
    }
}

/// Document-relative box, in CSS px.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Layout {
    pub top: f64,
    pub height: f64,
}

impl Layout {
    #[must_use]
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// The visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub height: f64,
    /// Window scroll offset (`window.scrollY`).
    pub scroll_y: f64,
}

/// A single node in the page.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    text: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: Style,
    layout: Layout,
    value: String,
    scroll_top: f64,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            text: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            style: Style::default(),
            layout: Layout::default(),
            value: String::new(),
            scroll_top: 0.0,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Own text, not including descendants.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Current value of a form control.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    #[must_use]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// An in-memory document.
#[derive(Debug, Clone)]
pub struct Page {
    elements: Vec<Element>,
    root: ElementId,
    viewport: Viewport,
}

impl Index<ElementId> for Page {
    type Output = Element;

    fn index(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }
}

impl IndexMut<ElementId> for Page {
    fn index_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }
}

impl Page {
    /// Create an empty page with a `<body>` root and the window at the top.
    #[must_use]
    pub fn new(viewport_height: f64) -> Self {
        Self {
            elements: vec![Element::new("body")],
            root: ElementId(0),
            viewport: Viewport {
                height: viewport_height,
                scroll_y: 0.0,
            },
        }
    }

    #[must_use]
    pub fn root(&self) -> ElementId {
        self.root
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of elements, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.elements.push(Element::new(tag));
        ElementId(self.elements.len() - 1)
    }

    /// Replace the class list, like assigning `className`.
    pub fn set_class(&mut self, id: ElementId, class_name: &str) {
        self[id].classes = class_name.split_whitespace().map(str::to_string).collect();
    }

    /// Set an attribute. `class` is routed to the class list.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        if name == "class" {
            self.set_class(id, value);
        } else {
            self[id]
                .attributes
                .insert(name.to_string(), value.to_string());
        }
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        self[id].text = Some(text.into());
    }

    pub fn set_value(&mut self, id: ElementId, value: impl Into<String>) {
        self[id].value = value.into();
    }

    pub fn set_layout(&mut self, id: ElementId, layout: Layout) {
        self[id].layout = layout;
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if let Some(old) = self[child].parent {
            self[old].children.retain(|&c| c != child);
        }
        self[child].parent = Some(parent);
        self[parent].children.push(child);
    }

    /// Walk `levels` parents up from `id`.
    #[must_use]
    pub fn ancestor(&self, id: ElementId, levels: usize) -> Option<ElementId> {
        let mut current = id;
        for _ in 0..levels {
            current = self[current].parent?;
        }
        Some(current)
    }

    /// Concatenated text of `id` and all its descendants, in document order.
    #[must_use]
    pub fn text_content(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        if let Some(text) = &self[id].text {
            out.push_str(text);
        }
        for &child in &self[id].children {
            self.collect_text(child, out);
        }
    }

    /// Descendants of `id` in pre-order, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self[next].children.iter().rev().copied());
        }
        out
    }

    /// First attached element matching `selector`, in document order.
    #[must_use]
    pub fn query_selector(&self, selector: &Selector) -> Option<ElementId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| selector.matches(self, id))
    }

    /// All attached elements matching `selector`, in document order.
    #[must_use]
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Geometry and scrolling
    // ─────────────────────────────────────────────────────────────────────

    /// Top of `id` relative to the viewport (`getBoundingClientRect().top`).
    #[must_use]
    pub fn bounding_top(&self, id: ElementId) -> f64 {
        self[id].layout.top - self.viewport.scroll_y
    }

    /// Lowest layout bottom edge of any element.
    #[must_use]
    pub fn document_height(&self) -> f64 {
        self.elements
            .iter()
            .map(|el| el.layout.bottom())
            .fold(0.0, f64::max)
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport.height = height.max(0.0);
        self.scroll_window_to(self.viewport.scroll_y);
    }

    /// Scroll the window, clamped to the document.
    pub fn scroll_window_to(&mut self, y: f64) {
        let max = (self.document_height() - self.viewport.height).max(0.0);
        self.viewport.scroll_y = y.clamp(0.0, max);
    }

    /// Visible height of a scroll container.
    #[must_use]
    pub fn client_height(&self, id: ElementId) -> f64 {
        self[id].layout.height
    }

    /// Sum of the children's heights, stacked as blocks.
    #[must_use]
    pub fn content_height(&self, id: ElementId) -> f64 {
        self[id]
            .children
            .iter()
            .map(|&child| self[child].layout.height)
            .sum()
    }

    /// Full content height of a scroll container.
    #[must_use]
    pub fn scroll_height(&self, id: ElementId) -> f64 {
        self.content_height(id).max(self.client_height(id))
    }

    /// Set `scrollTop`, clamped the way browsers clamp it.
    pub fn set_scroll_top(&mut self, id: ElementId, value: f64) {
        let max = self.scroll_height(id) - self.client_height(id);
        self[id].scroll_top = value.clamp(0.0, max.max(0.0));
    }

    /// `el.scrollTop = el.scrollHeight`.
    pub fn scroll_to_bottom(&mut self, id: ElementId) {
        let height = self.scroll_height(id);
        self.set_scroll_top(id, height);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    /// Outer HTML of `id` and its subtree.
    #[must_use]
    pub fn render(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: ElementId, out: &mut String) {
        let el = &self[id];
        out.push('<');
        out.push_str(&el.tag);

        if !el.classes.is_empty() {
            push_attribute(out, "class", &el.classes.join(" "));
        }
        for (name, value) in &el.attributes {
            push_attribute(out, name, value);
        }
        if el.tag == "input" && !el.value.is_empty() {
            push_attribute(out, "value", &el.value);
        }
        if el.scroll_top > 0.0 {
            push_attribute(out, "data-scroll-top", &el.scroll_top.to_string());
        }
        if !el.style.is_empty() {
            push_attribute(out, "style", &el.style.to_css());
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&el.tag.as_str()) {
            return;
        }

        if let Some(text) = &el.text {
            out.push_str(&escape_html(text));
        }
        for &child in &el.children {
            self.render_into(child, out);
        }

        out.push_str("</");
        out.push_str(&el.tag);
        out.push('>');
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_html(value));
    out.push('"');
}

/// Escape text for use in HTML content and quoted attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_page() -> (Page, ElementId) {
        let mut page = Page::new(600.0);
        let list = page.create_element("div");
        page.set_layout(list, Layout::new(0.0, 200.0));
        page.append_child(page.root(), list);
        (page, list)
    }

    #[test]
    fn test_append_and_text_content() {
        let (mut page, list) = list_page();
        for text in ["a", "b", "c"] {
            let p = page.create_element("p");
            page.set_text(p, text);
            page.append_child(list, p);
        }
        assert_eq!(page.text_content(list), "abc");
        assert_eq!(page[list].children().len(), 3);
    }

    #[test]
    fn test_append_reparents() {
        let (mut page, list) = list_page();
        let other = page.create_element("div");
        page.append_child(page.root(), other);
        let child = page.create_element("span");
        page.append_child(list, child);
        page.append_child(other, child);

        assert!(page[list].children().is_empty());
        assert_eq!(page[child].parent(), Some(other));
    }

    #[test]
    fn test_scroll_to_bottom_clamps() {
        let (mut page, list) = list_page();
        assert_eq!(page.scroll_height(list), 200.0);
        page.scroll_to_bottom(list);
        assert_eq!(page[list].scroll_top(), 0.0);

        for _ in 0..5 {
            let row = page.create_element("div");
            page.set_layout(row, Layout::new(0.0, 64.0));
            page.append_child(list, row);
        }
        assert_eq!(page.scroll_height(list), 320.0);
        page.scroll_to_bottom(list);
        assert_eq!(page[list].scroll_top(), 120.0);
    }

    #[test]
    fn test_render_carries_scroll_position() {
        let (mut page, list) = list_page();
        assert!(!page.render(list).contains("data-scroll-top"));

        for _ in 0..4 {
            let row = page.create_element("div");
            page.set_layout(row, Layout::new(0.0, 64.0));
            page.append_child(list, row);
        }
        page.scroll_to_bottom(list);
        assert!(page.render(list).starts_with(r#"<div data-scroll-top="56">"#));
    }

    #[test]
    fn test_bounding_top_follows_window_scroll() {
        let mut page = Page::new(500.0);
        let card = page.create_element("div");
        page.set_layout(card, Layout::new(900.0, 200.0));
        page.append_child(page.root(), card);

        assert_eq!(page.bounding_top(card), 900.0);
        page.scroll_window_to(400.0);
        assert_eq!(page.bounding_top(card), 500.0);

        // document is 1100 tall, so the window stops at 600
        page.scroll_window_to(5_000.0);
        assert_eq!(page.viewport().scroll_y, 600.0);
    }

    #[test]
    fn test_render_escapes_and_styles() {
        let mut page = Page::new(500.0);
        let input = page.create_element("input");
        page.set_attribute(input, "type", "text");
        page.set_value(input, "\"hi\"");
        page.append_child(page.root(), input);

        let div = page.create_element("div");
        page.set_class(div, "flex  justify-end");
        page[div].style_mut().display = Some(Display::None);
        page.set_text(div, "<b>x</b>");
        page.append_child(page.root(), div);

        assert_eq!(
            page.render(input),
            r#"<input type="text" value="&quot;hi&quot;">"#
        );
        assert_eq!(
            page.render(div),
            r#"<div class="flex justify-end" style="display: none">&lt;b&gt;x&lt;/b&gt;</div>"#
        );
    }

    #[test]
    fn test_style_css() {
        let style = Style {
            display: None,
            opacity: Some(0.0),
            translate_y: Some(20.0),
            transition: Some("opacity 0.5s ease".to_string()),
        };
        assert_eq!(
            style.to_css(),
            "opacity: 0; transform: translateY(20px); transition: opacity 0.5s ease"
        );

        let shown = Style {
            opacity: Some(1.0),
            translate_y: Some(0.0),
            ..Style::default()
        };
        assert_eq!(shown.to_css(), "opacity: 1; transform: translateY(0)");
    }
}
