use std::collections::HashMap;

use crate::errors::{SessionError, UploadError};
use crate::models::{Align, BlockId, GalleryAspect, GalleryGap, GalleryImage, Node};
use crate::upload::{UploadFile, UploadPolicy, Uploader, upload_all};

use super::NodeOutcome;
use super::settings::{SettingsState, SurfaceEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryCommand {
    /// Appends images in the given order.
    AddImages(Vec<GalleryImage>),
    /// Adds a single image by URL; only http(s) URLs are accepted.
    AddUrl {
        url: String,
        alt: String,
    },
    Remove {
        image_id: String,
    },
    BeginDrag {
        image_id: String,
    },
    DragOver {
        image_id: String,
    },
    /// Drops the dragged image onto `target_id`'s position.
    Drop {
        target_id: String,
    },
    CancelDrag,
    SetCaption {
        image_id: String,
        caption: String,
    },
    SetAlt {
        image_id: String,
        alt: String,
    },
    SetColumns(u32),
    SetGap(GalleryGap),
    SetAspect(GalleryAspect),
    SetAlign(Align),
    Settings(SurfaceEvent),
}

#[derive(Debug, Clone, Default)]
struct GalleryUi {
    dragging: Option<String>,
    drag_over: Option<String>,
    settings: SettingsState,
}

/// Image list editing and layout for gallery blocks.
#[derive(Debug, Default)]
pub struct GalleryController {
    ui: HashMap<BlockId, GalleryUi>,
}

/// Outcome of a bulk upload: images for the files that made it, in input
/// order, and a failure per file that did not.
#[derive(Debug, Default)]
pub struct BulkUpload {
    pub images: Vec<GalleryImage>,
    pub failures: Vec<(String, UploadError)>,
}

/// Uploads `files` concurrently and turns the successes into gallery
/// images, ordered as the files were picked.
pub async fn upload_images(
    uploader: &dyn Uploader,
    policy: &UploadPolicy,
    files: &[UploadFile],
) -> BulkUpload {
    let results = upload_all(uploader, policy, files).await;
    let mut bulk = BulkUpload::default();
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(url) => bulk.images.push(GalleryImage::new(url, alt_from_file_name(&file.name))),
            Err(e) => bulk.failures.push((file.name.clone(), e)),
        }
    }
    bulk
}

/// `summer-beach_2.jpg` becomes `summer beach 2`.
fn alt_from_file_name(name: &str) -> String {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    stem.replace(['-', '_'], " ").trim().to_string()
}

impl GalleryController {
    pub fn dragging(&self, id: BlockId) -> Option<&str> {
        self.ui.get(&id).and_then(|ui| ui.dragging.as_deref())
    }

    pub fn drag_over(&self, id: BlockId) -> Option<&str> {
        self.ui.get(&id).and_then(|ui| ui.drag_over.as_deref())
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

    pub fn apply(
        &mut self,
        id: BlockId,
        node: &mut Node,
        command: GalleryCommand,
    ) -> Result<NodeOutcome, SessionError> {
        let ui = self.ui.entry(id).or_default();
        let before = node.attrs.clone();

        match command {
            GalleryCommand::AddImages(images) => append(node, images),
            GalleryCommand::AddUrl { url, alt } => {
                let url = url.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(SessionError::Rejected(format!(
                        "image URL must start with http:// or https://, got `{url}`"
                    )));
                }
                append(node, vec![GalleryImage::new(url, alt)]);
            }
            GalleryCommand::Remove { image_id } => {
                let Some(images) = node.attrs.images_mut("images") else {
                    return Ok(NodeOutcome::Unchanged);
                };
                let Some(index) = images.iter().position(|img| img.id == image_id) else {
                    return Ok(NodeOutcome::Unchanged);
                };
                images.remove(index);
                if images.is_empty() {
                    log::debug!("{id}: last gallery image removed, removing gallery");
                    return Ok(NodeOutcome::Remove);
                }
            }
            GalleryCommand::BeginDrag { image_id } => {
                ui.dragging = Some(image_id);
                ui.drag_over = None;
            }
            GalleryCommand::DragOver { image_id } => {
                if ui.dragging.is_some() {
                    ui.drag_over = Some(image_id);
                }
            }
            GalleryCommand::Drop { target_id } => {
                ui.drag_over = None;
                let Some(dragged) = ui.dragging.take() else {
                    return Ok(NodeOutcome::Unchanged);
                };
                let Some(images) = node.attrs.images_mut("images") else {
                    return Ok(NodeOutcome::Unchanged);
                };
                let from = images.iter().position(|img| img.id == dragged);
                let to = images.iter().position(|img| img.id == target_id);
                if let (Some(from), Some(to)) = (from, to)
                    && from != to
                {
                    let image = images.remove(from);
                    images.insert(to, image);
                }
            }
            GalleryCommand::CancelDrag => {
                ui.dragging = None;
                ui.drag_over = None;
            }
            GalleryCommand::SetCaption { image_id, caption } => {
                if let Some(image) = find_image(node, &image_id) {
                    image.caption = caption;
                }
            }
            GalleryCommand::SetAlt { image_id, alt } => {
                if let Some(image) = find_image(node, &image_id) {
                    image.alt = alt;
                }
            }
            GalleryCommand::SetColumns(columns) => {
                if !(1..=4).contains(&columns) {
                    return Err(SessionError::Rejected(format!(
                        "gallery columns must be between 1 and 4, got {columns}"
                    )));
                }
                node.attrs.set("columns", columns);
            }
            GalleryCommand::SetGap(gap) => node.attrs.set("gap", gap.as_str()),
            GalleryCommand::SetAspect(aspect) => node.attrs.set("aspectRatio", aspect.as_str()),
            GalleryCommand::SetAlign(align) => node.attrs.set("align", align.as_str()),
            GalleryCommand::Settings(event) => {
                ui.settings.handle(event);
                return Ok(NodeOutcome::Unchanged);
            }
        }

        Ok(if node.attrs == before {
            NodeOutcome::Unchanged
        } else {
            NodeOutcome::Changed
        })
    }
}

fn append(node: &mut Node, new_images: Vec<GalleryImage>) {
    match node.attrs.images_mut("images") {
        Some(images) => images.extend(new_images),
        None => node.attrs.set("images", new_images),
    }
}

fn find_image<'n>(node: &'n mut Node, image_id: &str) -> Option<&'n mut GalleryImage> {
    node.attrs
        .images_mut("images")?
        .iter_mut()
        .find(|img| img.id == image_id)
}
