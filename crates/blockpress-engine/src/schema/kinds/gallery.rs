use crate::html::{Element, RenderNode};
use crate::models::values::new_image_id;
use crate::models::{Align, AttrValue, GalleryAspect, GalleryGap, GalleryImage, Node};
use crate::schema::registry::{AttrParse, AttributeSpec, NodeSchema};

pub const DEFAULT_COLUMNS: u32 = 3;

/// Galleries keep their image list as JSON in `data-images`. The rendered
/// grid is decoration, but when the JSON is damaged the list is salvaged
/// from the grid's `<img>` tags.
pub fn schema() -> NodeSchema {
    NodeSchema::atomic(view)
        .selector(r#"div[data-type="image-gallery"]"#)
        .attribute(AttributeSpec::new(
            "images",
            Vec::<GalleryImage>::new(),
            parse_images,
            |value| match value.as_images() {
                Some(images) => match serde_json::to_string(images) {
                    Ok(json) => vec![("data-images".to_string(), json)],
                    Err(e) => {
                        log::warn!("failed to encode gallery images: {e}");
                        Vec::new()
                    }
                },
                None => Vec::new(),
            },
        ))
        .attribute(AttributeSpec::integer(
            "columns",
            "data-columns",
            DEFAULT_COLUMNS,
            1,
            4,
        ))
        .attribute(AttributeSpec::choice::<GalleryGap>("gap", "data-gap"))
        .attribute(AttributeSpec::choice::<GalleryAspect>(
            "aspectRatio",
            "data-aspect-ratio",
        ))
        .attribute(AttributeSpec::choice::<Align>("align", "data-align"))
        .discard_when(|node| node.attrs.images("images").is_empty())
}

fn parse_images(el: &Element) -> AttrParse {
    let Some(raw) = el.attr("data-images") else {
        let salvaged = images_from_grid(el);
        return if salvaged.is_empty() {
            AttrParse::Missing
        } else {
            AttrParse::Recovered {
                value: salvaged.into(),
                reason: "missing data-images, rebuilt from grid".to_string(),
            }
        };
    };

    match serde_json::from_str::<Vec<GalleryImage>>(raw) {
        Ok(images) => {
            let total = images.len();
            let images: Vec<_> = images
                .into_iter()
                .filter(|image| !image.src.trim().is_empty())
                .collect();
            if images.len() == total {
                AttrParse::Value(images.into())
            } else {
                AttrParse::Recovered {
                    reason: format!("dropped {} images without a source", total - images.len()),
                    value: images.into(),
                }
            }
        }
        Err(e) => {
            let salvaged = images_from_grid(el);
            if salvaged.is_empty() {
                AttrParse::Invalid(format!("malformed image list: {e}"))
            } else {
                AttrParse::Recovered {
                    value: AttrValue::Images(salvaged),
                    reason: format!("malformed image list ({e}), rebuilt from grid"),
                }
            }
        }
    }
}

fn images_from_grid(el: &Element) -> Vec<GalleryImage> {
    let mut figures = Vec::new();
    el.find_all("figure", &mut figures);
    figures
        .into_iter()
        .filter_map(|figure| {
            let img = figure.find("img")?;
            let src = img.attr("src").filter(|s| !s.trim().is_empty())?;
            Some(GalleryImage {
                id: img
                    .attr("data-image-id")
                    .map_or_else(new_image_id, str::to_string),
                src: src.to_string(),
                alt: img.attr("alt").unwrap_or_default().to_string(),
                caption: figure
                    .find("figcaption")
                    .map(Element::text_content)
                    .unwrap_or_default(),
            })
        })
        .collect()
}

pub fn columns(node: &Node) -> u32 {
    node.attrs
        .number("columns")
        .map_or(DEFAULT_COLUMNS, |n| n.clamp(1.0, 4.0) as u32)
}

fn view(node: &Node, attrs: Vec<(String, String)>) -> RenderNode {
    let gap = GalleryGap::parse(node.attrs.text("gap")).unwrap_or_default();
    let aspect = GalleryAspect::parse(node.attrs.text("aspectRatio")).unwrap_or_default();
    let align = Align::parse(node.attrs.text("align")).unwrap_or_default();

    let tiles = node.attrs.images("images").iter().map(|image| {
        let img = RenderNode::element("img")
            .attr("src", image.src.clone())
            .attr("alt", image.alt.clone())
            .attr("data-image-id", image.id.clone())
            .attr("loading", "lazy")
            .attr_opt(
                "style",
                aspect
                    .css()
                    .map(|ratio| format!("aspect-ratio: {ratio}; object-fit: cover;")),
            );
        RenderNode::element("figure")
            .class("gallery-item")
            .child(img)
            .child_if(!image.caption.is_empty(), || {
                RenderNode::element("figcaption").child(RenderNode::text(image.caption.clone()))
            })
    });

    RenderNode::element("div")
        .attr("data-type", "image-gallery")
        .class(format!("image-gallery gallery-align-{align}"))
        .attrs(attrs)
        .child(
            RenderNode::element("div")
                .class("gallery-grid")
                .attr(
                    "style",
                    format!(
                        "display: grid; grid-template-columns: repeat({}, 1fr); gap: {};",
                        columns(node),
                        gap.css()
                    ),
                )
                .children(tiles),
        )
}
