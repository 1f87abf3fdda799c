use crate::errors::SchemaError;
use crate::html::{Element, RenderNode};
use crate::models::{AttrChoice, AttrValue, Attrs, Inline, Node, NodeType};

use super::selector::Selector;

/// Whether a node type holds inline content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Everything lives in attributes; the node never has children.
    BlockAtomic,
    /// The node holds inline content (text runs and hard breaks).
    BlockContainer,
}

/// Outcome of reading one attribute from stored markup.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrParse {
    /// Not present; the schema default applies.
    Missing,
    Value(AttrValue),
    /// Present but unusable; the schema default applies and the reason is
    /// recorded in the parse report.
    Invalid(String),
    /// Present and malformed, but a usable value was salvaged.
    Recovered { value: AttrValue, reason: String },
}

type ParseFn = Box<dyn Fn(&Element) -> AttrParse + Send + Sync>;
type RenderFn = Box<dyn Fn(&AttrValue) -> Vec<(String, String)> + Send + Sync>;

/// Declaration of one attribute: its default plus how it is read from and
/// written to the node's wrapper element.
pub struct AttributeSpec {
    name: &'static str,
    default: AttrValue,
    parse: ParseFn,
    render: RenderFn,
}

impl std::fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("name", &self.name)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

impl AttributeSpec {
    pub fn new(
        name: &'static str,
        default: impl Into<AttrValue>,
        parse: impl Fn(&Element) -> AttrParse + Send + Sync + 'static,
        render: impl Fn(&AttrValue) -> Vec<(String, String)> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            default: default.into(),
            parse: Box::new(parse),
            render: Box::new(render),
        }
    }

    /// Free text stored verbatim in `data_attr`.
    pub fn text(name: &'static str, data_attr: &'static str, default: &'static str) -> Self {
        Self::new(
            name,
            default,
            move |el| match el.attr(data_attr) {
                Some(raw) => AttrParse::Value(raw.into()),
                None => AttrParse::Missing,
            },
            move |value| render_text(data_attr, value),
        )
    }

    /// Text that may be absent; an empty stored value reads as absent.
    pub fn optional_text(name: &'static str, data_attr: &'static str) -> Self {
        Self::new(
            name,
            AttrValue::Null,
            move |el| match el.attr(data_attr) {
                Some(raw) if !raw.is_empty() => AttrParse::Value(raw.into()),
                Some(_) => AttrParse::Value(AttrValue::Null),
                None => AttrParse::Missing,
            },
            move |value| render_text(data_attr, value),
        )
    }

    /// Boolean stored as `"true"`/`"false"`. A bare attribute reads as true.
    pub fn flag(name: &'static str, data_attr: &'static str, default: bool) -> Self {
        Self::new(
            name,
            default,
            move |el| match el.attr(data_attr) {
                None => AttrParse::Missing,
                Some(raw) => match parse_flag(raw) {
                    Some(flag) => AttrParse::Value(flag.into()),
                    None => AttrParse::Invalid(format!("`{raw}` is not a boolean")),
                },
            },
            move |value| match value.as_bool() {
                Some(flag) => vec![(data_attr.to_string(), flag.to_string())],
                None => Vec::new(),
            },
        )
    }

    /// Positive finite number. `default` of `None` means "not set".
    pub fn number(name: &'static str, data_attr: &'static str, default: Option<f64>) -> Self {
        Self::new(
            name,
            default,
            move |el| match el.attr(data_attr) {
                None => AttrParse::Missing,
                Some(raw) => match parse_positive(raw) {
                    Some(n) => AttrParse::Value(n.into()),
                    None => AttrParse::Invalid(format!("`{raw}` is not a positive number")),
                },
            },
            move |value| render_number(data_attr, value),
        )
    }

    /// Whole number restricted to `min..=max`.
    pub fn integer(
        name: &'static str,
        data_attr: &'static str,
        default: u32,
        min: u32,
        max: u32,
    ) -> Self {
        Self::new(
            name,
            default,
            move |el| match el.attr(data_attr) {
                None => AttrParse::Missing,
                Some(raw) => match raw.trim().parse::<u32>() {
                    Ok(n) if (min..=max).contains(&n) => AttrParse::Value(n.into()),
                    _ => AttrParse::Invalid(format!("`{raw}` is not in {min}..={max}")),
                },
            },
            move |value| render_number(data_attr, value),
        )
    }

    /// One of a closed set of values, stored in canonical form.
    pub fn choice<E: AttrChoice>(name: &'static str, data_attr: &'static str) -> Self {
        Self::new(
            name,
            E::default().as_choice_str(),
            move |el| match el.attr(data_attr) {
                None => AttrParse::Missing,
                Some(raw) => match E::parse_choice(raw) {
                    Some(choice) => AttrParse::Value(choice.as_choice_str().into()),
                    None => AttrParse::Invalid(format!("unknown value `{raw}`")),
                },
            },
            move |value| render_text(data_attr, value),
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> &AttrValue {
        &self.default
    }

    pub fn parse(&self, element: &Element) -> AttrParse {
        (self.parse)(element)
    }

    pub fn render(&self, value: &AttrValue) -> Vec<(String, String)> {
        (self.render)(value)
    }
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

pub fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

pub fn render_text(data_attr: &str, value: &AttrValue) -> Vec<(String, String)> {
    match value.as_text() {
        Some(text) => vec![(data_attr.to_string(), text.to_string())],
        None => Vec::new(),
    }
}

pub fn render_number(data_attr: &str, value: &AttrValue) -> Vec<(String, String)> {
    match value.as_number() {
        Some(n) => vec![(data_attr.to_string(), n.to_string())],
        None => Vec::new(),
    }
}

/// Builds the stored element of a node from the node and the wrapper
/// attributes rendered by its attribute specs.
pub type ViewFn = fn(&Node, Vec<(String, String)>) -> RenderNode;

/// Reads a container's inline content from its matched element.
pub type ContentFn = fn(&Element) -> Vec<Inline>;

/// Everything the editor knows about one node type.
pub struct NodeSchema {
    containment: Containment,
    selectors: Vec<&'static str>,
    attributes: Vec<AttributeSpec>,
    content: Option<ContentFn>,
    view: ViewFn,
    discard_when: Option<fn(&Node) -> bool>,
}

impl std::fmt::Debug for NodeSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSchema")
            .field("containment", &self.containment)
            .field("selectors", &self.selectors)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

impl NodeSchema {
    pub fn atomic(view: ViewFn) -> Self {
        Self {
            containment: Containment::BlockAtomic,
            selectors: Vec::new(),
            attributes: Vec::new(),
            content: None,
            view,
            discard_when: None,
        }
    }

    pub fn container(content: ContentFn, view: ViewFn) -> Self {
        Self {
            containment: Containment::BlockContainer,
            content: Some(content),
            ..Self::atomic(view)
        }
    }

    /// Adds a selector; earlier selectors are tried first.
    pub fn selector(mut self, selector: &'static str) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn attribute(mut self, spec: AttributeSpec) -> Self {
        self.attributes.push(spec);
        self
    }

    /// Nodes for which `predicate` holds are dropped when loading.
    pub fn discard_when(mut self, predicate: fn(&Node) -> bool) -> Self {
        self.discard_when = Some(predicate);
        self
    }

    pub fn containment(&self) -> Containment {
        self.containment
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    pub fn attribute_spec(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|spec| spec.name == name)
    }

    pub fn defaults(&self) -> Attrs {
        let mut attrs = Attrs::new();
        for spec in &self.attributes {
            attrs.set(spec.name, spec.default.clone());
        }
        attrs
    }

    /// Reads every declared attribute from `element`.
    ///
    /// Returns the attributes plus `(attribute, reason)` for each value
    /// that had to be replaced or salvaged.
    pub fn parse_attrs(&self, element: &Element) -> (Attrs, Vec<(&'static str, String)>) {
        let mut attrs = Attrs::new();
        let mut problems = Vec::new();
        for spec in &self.attributes {
            let value = match spec.parse(element) {
                AttrParse::Missing => spec.default.clone(),
                AttrParse::Value(value) => value,
                AttrParse::Invalid(reason) => {
                    problems.push((spec.name, reason));
                    spec.default.clone()
                }
                AttrParse::Recovered { value, reason } => {
                    problems.push((spec.name, reason));
                    value
                }
            };
            attrs.set(spec.name, value);
        }
        (attrs, problems)
    }

    pub fn parse_content(&self, element: &Element) -> Vec<Inline> {
        self.content.map(|content| content(element)).unwrap_or_default()
    }

    pub fn render(&self, node: &Node) -> RenderNode {
        let mut wrapper_attrs = Vec::new();
        for spec in &self.attributes {
            let value = node.attrs.get(spec.name).unwrap_or(&spec.default);
            wrapper_attrs.extend(spec.render(value));
        }
        (self.view)(node, wrapper_attrs)
    }

    pub fn is_discarded(&self, node: &Node) -> bool {
        self.discard_when.is_some_and(|predicate| predicate(node))
    }
}

struct Entry {
    kind: NodeType,
    selectors: Vec<Selector>,
    schema: NodeSchema,
}

/// The single dispatch table pairing each node type with its schema.
///
/// Registration order is significant: when loading, an element is matched
/// against the selectors of each registered type in turn and the first
/// match wins.
#[derive(Default)]
pub struct SchemaRegistry {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.kind))
            .finish()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in node type.
    ///
    /// # Panics
    ///
    /// Panics if the built-in schemas are inconsistent, which is a
    /// programming error caught by the first test run.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for (kind, schema) in super::kinds::standard_schemas() {
            if let Err(e) = registry.register(kind, schema) {
                panic!("built-in schema registration failed: {e}");
            }
        }
        registry
    }

    pub fn register(&mut self, kind: NodeType, schema: NodeSchema) -> Result<(), SchemaError> {
        if self.get_schema(kind).is_some() {
            return Err(SchemaError::DuplicateType(kind));
        }
        let selectors = schema
            .selectors
            .iter()
            .map(|source| Selector::parse(source))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("registered node type {kind} with {} selectors", selectors.len());
        self.entries.push(Entry {
            kind,
            selectors,
            schema,
        });
        Ok(())
    }

    pub fn get_schema(&self, kind: NodeType) -> Option<&NodeSchema> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| &entry.schema)
    }

    pub fn schema(&self, kind: NodeType) -> Result<&NodeSchema, SchemaError> {
        self.get_schema(kind).ok_or(SchemaError::Unregistered(kind))
    }

    /// Registered types in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = NodeType> + '_ {
        self.entries.iter().map(|entry| entry.kind)
    }

    pub fn match_element(&self, element: &Element) -> Option<(NodeType, &NodeSchema)> {
        self.entries
            .iter()
            .find(|entry| entry.selectors.iter().any(|s| s.matches(element)))
            .map(|entry| (entry.kind, &entry.schema))
    }

    /// A new node of `kind` with every attribute at its default.
    pub fn instantiate(&self, kind: NodeType) -> Result<Node, SchemaError> {
        let schema = self.schema(kind)?;
        Ok(Node {
            kind,
            attrs: schema.defaults(),
            content: Vec::new(),
        })
    }

    /// Fills missing attributes with defaults, drops undeclared ones and
    /// clears content on atomic nodes.
    pub fn conform(&self, node: &mut Node) -> Result<(), SchemaError> {
        let schema = self.schema(node.kind)?;
        node.attrs
            .retain(|name| schema.attribute_spec(name).is_some());
        for spec in &schema.attributes {
            if !node.attrs.contains(spec.name) {
                node.attrs.set(spec.name, spec.default.clone());
            }
        }
        if schema.containment == Containment::BlockAtomic {
            node.content.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{DomNode, parse_fragment};
    use crate::models::Align;

    fn element(html: &str) -> Element {
        match parse_fragment(html).into_iter().next() {
            Some(DomNode::Element(el)) => el,
            other => panic!("expected an element, got {other:?}"),
        }
    }

    fn box_view(_: &Node, attrs: Vec<(String, String)>) -> RenderNode {
        RenderNode::element("div").attrs(attrs)
    }

    fn box_schema() -> NodeSchema {
        NodeSchema::atomic(box_view)
            .selector("div.box")
            .attribute(AttributeSpec::text("title", "data-title", "Untitled"))
            .attribute(AttributeSpec::integer("columns", "data-columns", 3, 1, 4))
            .attribute(AttributeSpec::choice::<Align>("align", "data-align"))
            .attribute(AttributeSpec::flag("open", "data-open", false))
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register(NodeType::Alert, box_schema()).unwrap();
        assert_eq!(
            registry.register(NodeType::Alert, box_schema()),
            Err(SchemaError::DuplicateType(NodeType::Alert))
        );
    }

    #[test]
    fn test_invalid_selector_is_a_registration_error() {
        let mut registry = SchemaRegistry::new();
        let schema = NodeSchema::atomic(box_view).selector("div[");
        assert!(matches!(
            registry.register(NodeType::Promo, schema),
            Err(SchemaError::InvalidSelector { .. })
        ));
        assert!(registry.get_schema(NodeType::Promo).is_none());
    }

    #[test]
    fn test_missing_attributes_get_defaults() {
        // Given an element carrying only one of four attributes
        let schema = box_schema();
        let el = element(r#"<div class="box" data-align="RIGHT"></div>"#);

        // When parsed
        let (attrs, problems) = schema.parse_attrs(&el);

        // Then every declared attribute is present
        assert!(problems.is_empty());
        assert_eq!(attrs.text("title"), "Untitled");
        assert_eq!(attrs.number("columns"), Some(3.0));
        assert_eq!(attrs.text("align"), "right");
        assert!(!attrs.flag("open"));
        assert_eq!(attrs.len(), 4);
    }

    #[test]
    fn test_invalid_values_fall_back_and_are_reported() {
        let schema = box_schema();
        let el = element(r#"<div class="box" data-columns="9" data-open="maybe"></div>"#);

        let (attrs, problems) = schema.parse_attrs(&el);

        assert_eq!(attrs.number("columns"), Some(3.0));
        assert!(!attrs.flag("open"));
        let names: Vec<_> = problems.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["columns", "open"]);
    }

    #[test]
    fn test_match_element_first_registration_wins() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(NodeType::Embed, NodeSchema::atomic(box_view).selector(r#"div[data-type="code-embed"]"#))
            .unwrap();
        registry
            .register(NodeType::Alert, NodeSchema::atomic(box_view).selector("div[data-type]"))
            .unwrap();

        let embed = element(r#"<div data-type="code-embed"></div>"#);
        let other = element(r#"<div data-type="INFO"></div>"#);
        assert_eq!(registry.match_element(&embed).map(|(k, _)| k), Some(NodeType::Embed));
        assert_eq!(registry.match_element(&other).map(|(k, _)| k), Some(NodeType::Alert));
        assert!(registry.match_element(&element("<span></span>")).is_none());
    }

    #[test]
    fn test_conform_fills_defaults_and_drops_unknown() {
        let mut registry = SchemaRegistry::new();
        registry.register(NodeType::Promo, box_schema()).unwrap();

        let mut node = Node::new(NodeType::Promo)
            .with_attr("title", "Hello")
            .with_attr("bogus", true)
            .with_text("stray");
        registry.conform(&mut node).unwrap();

        assert_eq!(node.attrs.text("title"), "Hello");
        assert!(!node.attrs.contains("bogus"));
        assert!(node.attrs.contains("columns"));
        assert!(node.content.is_empty());
    }

    #[test]
    fn test_unregistered_type() {
        let registry = SchemaRegistry::new();
        assert_eq!(
            registry.instantiate(NodeType::Image),
            Err(SchemaError::Unregistered(NodeType::Image))
        );
    }

    #[test]
    fn test_render_uses_defaults_for_absent_values() {
        let schema = box_schema();
        let html = schema.render(&Node::new(NodeType::Promo)).to_html();
        assert_eq!(
            html,
            r#"<div data-title="Untitled" data-columns="3" data-align="center" data-open="false"></div>"#
        );
    }
}
