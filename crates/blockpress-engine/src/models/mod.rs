pub mod attrs;
pub mod fragment_file;
pub mod inline;
pub mod node;
pub mod values;

pub use attrs::{AttrValue, Attrs};
pub use fragment_file::FragmentFile;
pub use inline::{Inline, Mark};
pub use node::{BlockId, Document, Node, NodeType};
pub use values::{
    AlertKind, Align, AttrChoice, CodeLanguage, EmbedType, GalleryAspect, GalleryGap, GalleryImage,
};
