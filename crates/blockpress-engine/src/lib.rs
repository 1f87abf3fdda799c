pub mod controllers;
pub mod editor;
pub mod errors;
pub mod html;
pub mod io;
pub mod models;
pub mod save;
pub mod schema;
pub mod script;
pub mod serialize;
pub mod session;
pub mod upload;


// Re-export key types for easier usage
pub use controllers::{Controllers, NodeCommand, NodeOutcome};
pub use editor::{EditorSettings, PostEditor};
pub use errors::*;
pub use io::*;
pub use models::{BlockId, Document, FragmentFile, Inline, Mark, Node, NodeType};
pub use save::{
    PostRecord, PostStore, SaveConfig, SaveCoordinator, SavePhase, SaveStatus,
};
pub use schema::SchemaRegistry;
pub use script::ScriptSettings;
pub use serialize::{ParseReport, parse_document, render_document};
pub use session::{ChangeEvent, EditCommand, EditorContext, EditorSession, SessionState, ViewProbe};
pub use upload::{UploadFile, UploadPolicy, Uploader};
