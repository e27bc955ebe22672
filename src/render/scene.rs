use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::render::{
    CirclePrimitive, LinePrimitive, RectPrimitive, RenderFrame, TextMeasure, TextPrimitive,
};
use crate::svg::SvgNode;

/// Handle to one element inserted into an `OverlayScene`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line(LinePrimitive),
    Rect(RectPrimitive),
    Circle(CirclePrimitive),
    Text(TextPrimitive),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayElement {
    /// Space-separated class list, used by export to find plugin chrome.
    pub class: String,
    pub shape: Shape,
    pub visible: bool,
}

impl OverlayElement {
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.class.split_whitespace().any(|candidate| candidate == class)
    }
}

/// Retained set of plugin-owned elements drawn on top of the host chart.
pub struct OverlayScene {
    viewport: Viewport,
    measure: Rc<dyn TextMeasure>,
    elements: Vec<OverlayElement>,
}

impl std::fmt::Debug for OverlayScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayScene")
            .field("viewport", &self.viewport)
            .field("elements", &self.elements.len())
            .finish()
    }
}

impl OverlayScene {
    #[must_use]
    pub fn new(viewport: Viewport, measure: Rc<dyn TextMeasure>) -> Self {
        Self {
            viewport,
            measure,
            elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn insert(&mut self, class: impl Into<String>, shape: Shape) -> ElementId {
        self.elements.push(OverlayElement {
            class: class.into(),
            shape,
            visible: true,
        });
        ElementId(self.elements.len() - 1)
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&OverlayElement> {
        self.elements.get(id.0)
    }

    pub fn shape_mut(&mut self, id: ElementId) -> Option<&mut Shape> {
        self.elements.get_mut(id.0).map(|element| &mut element.shape)
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        if let Some(element) = self.elements.get_mut(id.0) {
            element.visible = visible;
        }
    }

    #[must_use]
    pub fn is_visible(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|element| element.visible)
    }

    pub fn rect_mut(&mut self, id: ElementId) -> Option<&mut RectPrimitive> {
        match self.shape_mut(id) {
            Some(Shape::Rect(rect)) => Some(rect),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: ElementId) -> Option<&mut TextPrimitive> {
        match self.shape_mut(id) {
            Some(Shape::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn line_mut(&mut self, id: ElementId) -> Option<&mut LinePrimitive> {
        match self.shape_mut(id) {
            Some(Shape::Line(line)) => Some(line),
            _ => None,
        }
    }

    pub fn circle_mut(&mut self, id: ElementId) -> Option<&mut CirclePrimitive> {
        match self.shape_mut(id) {
            Some(Shape::Circle(circle)) => Some(circle),
            _ => None,
        }
    }

    /// Width of an inserted text element as the host renders it.
    #[must_use]
    pub fn rendered_text_width(&self, id: ElementId) -> Option<f64> {
        match &self.get(id)?.shape {
            Shape::Text(text) => Some(self.measure.text_width(&text.text, text.font_size_px)),
            _ => None,
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &OverlayElement> {
        self.elements.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Flattens visible elements into a frame for a `Renderer`.
    #[must_use]
    pub fn to_render_frame(&self) -> RenderFrame {
        let mut frame = RenderFrame::new(self.viewport);
        for element in self.elements.iter().filter(|element| element.visible) {
            match &element.shape {
                Shape::Line(line) => frame.lines.push(*line),
                Shape::Rect(rect) => frame.rects.push(*rect),
                Shape::Circle(circle) => frame.circles.push(*circle),
                Shape::Text(text) => frame.texts.push(text.clone()),
            }
        }
        frame
    }

    /// Converts every element, hidden ones included, into an SVG group.
    #[must_use]
    pub fn to_svg_group(&self) -> SvgNode {
        let mut group = SvgNode::new("g").with_attr("class", "autoplot-overlay");
        for element in &self.elements {
            let mut node = shape_to_svg(&element.shape).with_attr("class", element.class.clone());
            if !element.visible {
                node.set_attr("visibility", "hidden");
            }
            group.children.push(node);
        }
        group
    }
}

fn shape_to_svg(shape: &Shape) -> SvgNode {
    match shape {
        Shape::Line(line) => SvgNode::new("line")
            .with_attr("x1", px(line.x1))
            .with_attr("y1", px(line.y1))
            .with_attr("x2", px(line.x2))
            .with_attr("y2", px(line.y2))
            .with_attr("stroke", line.color.to_css())
            .with_attr("stroke-opacity", px(line.color.alpha))
            .with_attr("stroke-width", px(line.stroke_width)),
        Shape::Rect(rect) => {
            let node = SvgNode::new("rect")
                .with_attr("x", px(rect.x))
                .with_attr("y", px(rect.y))
                .with_attr("width", px(rect.width))
                .with_attr("height", px(rect.height))
                .with_attr("stroke", rect.stroke.to_css())
                .with_attr("stroke-width", px(rect.stroke_width));
            match rect.fill {
                Some(fill) => node
                    .with_attr("fill", fill.to_css())
                    .with_attr("fill-opacity", px(fill.alpha)),
                None => node.with_attr("fill", "none"),
            }
        }
        Shape::Circle(circle) => SvgNode::new("circle")
            .with_attr("cx", px(circle.cx))
            .with_attr("cy", px(circle.cy))
            .with_attr("r", px(circle.radius))
            .with_attr("fill", circle.fill.to_css()),
        Shape::Text(text) => SvgNode::new("text")
            .with_attr("x", px(text.x))
            .with_attr("y", px(text.y))
            .with_attr("font-size", px(text.font_size_px))
            .with_attr("fill", text.color.to_css())
            .with_attr("text-anchor", text.h_align.svg_anchor())
            .with_text(text.text.clone()),
    }
}

fn px(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_owned() } else { text.to_owned() }
}
