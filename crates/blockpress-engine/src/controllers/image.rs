use std::collections::HashMap;

use crate::models::{Align, AttrValue, BlockId, Node};

use super::NodeOutcome;
use super::settings::{SettingsState, SurfaceEvent};

/// Size bounds for image blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageLimits {
    /// Widest an image is shown on first load.
    pub initial_max_width: f64,
    pub min_width: f64,
    pub max_width: f64,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            initial_max_width: 600.0,
            min_width: 50.0,
            max_width: 1200.0,
        }
    }
}

impl ImageLimits {
    pub fn clamp_width(&self, width: f64) -> f64 {
        width.clamp(self.min_width, self.max_width).round()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    /// Left-side handles grow the image when dragged left.
    fn direction(self) -> f64 {
        match self {
            ResizeHandle::Left | ResizeHandle::TopLeft | ResizeHandle::BottomLeft => -1.0,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePreset {
    Small,
    Medium,
    Large,
    Original,
}

impl SizePreset {
    pub fn width(self) -> Option<f64> {
        match self {
            SizePreset::Small => Some(300.0),
            SizePreset::Medium => Some(600.0),
            SizePreset::Large => Some(900.0),
            SizePreset::Original => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectPreset {
    Square,
    FourThree,
    SixteenNine,
    ThreeTwo,
    Original,
}

impl AspectPreset {
    /// Height over width.
    pub fn ratio(self) -> Option<f64> {
        match self {
            AspectPreset::Square => Some(1.0),
            AspectPreset::FourThree => Some(3.0 / 4.0),
            AspectPreset::SixteenNine => Some(9.0 / 16.0),
            AspectPreset::ThreeTwo => Some(2.0 / 3.0),
            AspectPreset::Original => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectPreset::Square => "1:1",
            AspectPreset::FourThree => "4:3",
            AspectPreset::SixteenNine => "16:9",
            AspectPreset::ThreeTwo => "3:2",
            AspectPreset::Original => "Original",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageCommand {
    /// The browser finished loading the image.
    Loaded {
        natural_width: f64,
        natural_height: f64,
    },
    BeginResize {
        handle: ResizeHandle,
        pointer_x: f64,
    },
    DragResize {
        pointer_x: f64,
    },
    EndResize,
    ApplySize(SizePreset),
    ApplyAspect(AspectPreset),
    SetAspectLocked(bool),
    SetAlign(Align),
    SetAlt(String),
    Settings(SurfaceEvent),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    handle: ResizeHandle,
    start_x: f64,
    start_width: f64,
    /// Height over width when the drag began.
    start_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default)]
struct ImageUi {
    natural: Option<(f64, f64)>,
    drag: Option<Drag>,
    settings: SettingsState,
}

/// Interactive sizing, alignment and aspect lock for image blocks.
#[derive(Debug, Default)]
pub struct ImageController {
    limits: ImageLimits,
    ui: HashMap<BlockId, ImageUi>,
}

pub fn round_ratio(ratio: f64) -> f64 {
    (ratio * 10_000.0).round() / 10_000.0
}

impl ImageController {
    pub fn new(limits: ImageLimits) -> Self {
        Self {
            limits,
            ui: HashMap::new(),
        }
    }

    pub fn limits(&self) -> ImageLimits {
        self.limits
    }

    pub fn is_resizing(&self, id: BlockId) -> bool {
        self.ui.get(&id).is_some_and(|ui| ui.drag.is_some())
    }

    pub fn settings(&self, id: BlockId) -> SettingsState {
        self.ui.get(&id).map(|ui| ui.settings).unwrap_or_default()
    }

    pub fn forget(&mut self, id: BlockId) {
        self.ui.remove(&id);
    }

    pub fn clear(&mut self) {
        self.ui.clear();
    }

    pub fn apply(&mut self, id: BlockId, node: &mut Node, command: ImageCommand) -> NodeOutcome {
        let limits = self.limits;
        let ui = self.ui.entry(id).or_default();
        let before = node.attrs.clone();

        match command {
            ImageCommand::Loaded {
                natural_width,
                natural_height,
            } => {
                if natural_width <= 0.0 || natural_height <= 0.0 {
                    log::debug!("{id}: ignoring load with empty natural size");
                    return NodeOutcome::Unchanged;
                }
                ui.natural = Some((natural_width, natural_height));
                let natural_ratio = round_ratio(natural_height / natural_width);
                let attrs = &mut node.attrs;
                if attrs.number("width").is_none() && attrs.number("height").is_none() {
                    let width = natural_width.min(limits.initial_max_width).round();
                    attrs.set("width", width);
                    attrs.set("height", (width * natural_height / natural_width).round());
                    attrs.set("aspectRatio", natural_ratio);
                } else if attrs.number("aspectRatio").is_none() {
                    attrs.set("aspectRatio", natural_ratio);
                }
            }
            ImageCommand::BeginResize { handle, pointer_x } => {
                let start_width = current_width(node, ui, limits);
                ui.drag = Some(Drag {
                    handle,
                    start_x: pointer_x,
                    start_width,
                    start_ratio: current_ratio(node, ui),
                });
            }
            ImageCommand::DragResize { pointer_x } => {
                let Some(drag) = ui.drag else {
                    return NodeOutcome::Unchanged;
                };
                let delta = (pointer_x - drag.start_x) * drag.handle.direction();
                let width = limits.clamp_width(drag.start_width + delta);
                let ratio = if node.attrs.flag("aspectLocked") {
                    locked_ratio(node, drag.start_ratio)
                } else {
                    drag.start_ratio
                };
                resize(node, width, ratio);
            }
            ImageCommand::EndResize => {
                ui.drag = None;
            }
            ImageCommand::ApplySize(preset) => {
                let Some(target) = preset.width().or(ui.natural.map(|(w, _)| w)) else {
                    log::debug!("{id}: original size unknown until the image loads");
                    return NodeOutcome::Unchanged;
                };
                let width = limits.clamp_width(target);
                let ratio = current_ratio(node, ui);
                let ratio = if node.attrs.flag("aspectLocked") {
                    locked_ratio(node, ratio)
                } else {
                    ratio
                };
                resize(node, width, ratio);
            }
            ImageCommand::ApplyAspect(preset) => {
                let natural_ratio = ui.natural.map(|(w, h)| h / w);
                let Some(ratio) = preset.ratio().or(natural_ratio) else {
                    return NodeOutcome::Unchanged;
                };
                let ratio = round_ratio(ratio);
                let width = current_width(node, ui, limits);
                node.attrs.set("aspectRatio", ratio);
                node.attrs.set("aspectLocked", true);
                resize(node, width, Some(ratio));
            }
            ImageCommand::SetAspectLocked(locked) => {
                node.attrs.set("aspectLocked", locked);
                if locked && let Some(ratio) = current_ratio(node, ui).map(round_ratio) {
                    node.attrs.set("aspectRatio", ratio);
                    if let Some(width) = node.attrs.number("width") {
                        resize(node, width, Some(ratio));
                    }
                }
            }
            ImageCommand::SetAlign(align) => node.attrs.set("align", align.as_str()),
            ImageCommand::SetAlt(alt) => node.attrs.set("alt", alt),
            ImageCommand::Settings(event) => {
                ui.settings.handle(event);
                return NodeOutcome::Unchanged;
            }
        }

        if node.attrs == before {
            NodeOutcome::Unchanged
        } else {
            NodeOutcome::Changed
        }
    }
}

fn current_width(node: &Node, ui: &ImageUi, limits: ImageLimits) -> f64 {
    node.attrs
        .number("width")
        .or(ui.natural.map(|(w, _)| w.min(limits.initial_max_width)))
        .unwrap_or(limits.initial_max_width)
}

/// Height over width as currently displayed.
fn current_ratio(node: &Node, ui: &ImageUi) -> Option<f64> {
    match (node.attrs.number("width"), node.attrs.number("height")) {
        (Some(w), Some(h)) => Some(h / w),
        _ => node
            .attrs
            .number("aspectRatio")
            .or(ui.natural.map(|(w, h)| h / w)),
    }
}

/// The stored ratio, capturing `fallback` into the node when none is set.
fn locked_ratio(node: &mut Node, fallback: Option<f64>) -> Option<f64> {
    if let Some(ratio) = node.attrs.number("aspectRatio") {
        return Some(ratio);
    }
    let ratio = fallback.map(round_ratio)?;
    node.attrs.set("aspectRatio", ratio);
    Some(ratio)
}

fn resize(node: &mut Node, width: f64, ratio: Option<f64>) {
    node.attrs.set("width", width);
    node.attrs.set(
        "height",
        ratio.map(|r| AttrValue::Number((width * r).round())),
    );
}
