//! # Editor session
//!
//! Owns the document of one editor instance and drives its lifecycle:
//!
//! ```text
//! Uninitialized --mount--> Mounting --view verified--> Ready --destroy--> Destroyed
//! ```
//!
//! Edits are accepted only while `Ready`. They mark a change as pending;
//! the change event carrying the serialized HTML goes out at the next
//! [`EditorSession::flush`], so a burst of edits in one tick produces one
//! event.

pub mod context;

use std::sync::Arc;

use crate::controllers::{Controllers, NodeCommand, NodeOutcome};
use crate::errors::{SchemaError, SessionError};
use crate::models::{BlockId, Document, Inline, Node, NodeType};
use crate::models::inline::normalize_runs;
use crate::schema::{Containment, SchemaRegistry};
use crate::serialize::{ParseReport, parse_document, render_document};

pub use context::{ActionState, EditorContext, ToolbarAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Mounting,
    Ready,
    Destroyed,
}

/// Reports on the view the session is attached to.
pub trait ViewProbe {
    fn has_view(&self) -> bool;
    fn is_attached(&self) -> bool;
    fn has_render_tree(&self) -> bool;
}

/// Serialized content after one or more edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Counts emitted events, starting at 1.
    pub revision: u64,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    InsertBlock { index: usize, node: Node },
    /// Inserts a block of `kind` with default attributes.
    InsertDefault { index: usize, kind: NodeType },
    RemoveBlock(BlockId),
    MoveBlock { id: BlockId, to: usize },
    /// Replaces the inline content of a container block.
    SetContent { id: BlockId, content: Vec<Inline> },
    SetHeadingLevel { id: BlockId, level: u32 },
    Node { id: BlockId, command: NodeCommand },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Unchanged,
    Changed(BlockId),
    Inserted(BlockId),
    Removed(BlockId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Hydration {
    Applied(ParseReport),
    /// Content was already set during this mount.
    Skipped,
}

pub struct EditorSession {
    registry: Arc<SchemaRegistry>,
    state: SessionState,
    document: Document,
    controllers: Controllers,
    context: EditorContext,
    hydrated: bool,
    pending_change: bool,
    revision: u64,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("state", &self.state)
            .field("blocks", &self.document.len())
            .field("hydrated", &self.hydrated)
            .field("pending_change", &self.pending_change)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    pub fn new(registry: Arc<SchemaRegistry>, controllers: Controllers, context: EditorContext) -> Self {
        Self {
            registry,
            state: SessionState::Uninitialized,
            document: Document::new(),
            controllers,
            context,
            hydrated: false,
            pending_change: false,
            revision: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn controllers(&self) -> &Controllers {
        &self.controllers
    }

    pub fn context(&self) -> &EditorContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut EditorContext {
        &mut self.context
    }

    pub fn has_pending_change(&self) -> bool {
        self.pending_change
    }

    pub fn mount(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Uninitialized => {
                log::debug!("editor session mounting");
                self.state = SessionState::Mounting;
                Ok(())
            }
            SessionState::Destroyed => Err(SessionError::Destroyed),
            _ => Err(SessionError::AlreadyMounted),
        }
    }

    /// Moves to `Ready` once the view, its DOM attachment and its render
    /// tree are all present. Returns whether the session is ready.
    pub fn poll_ready(&mut self, probe: &dyn ViewProbe) -> Result<bool, SessionError> {
        match self.state {
            SessionState::Ready => Ok(true),
            SessionState::Mounting => {
                if probe.has_view() && probe.is_attached() && probe.has_render_tree() {
                    log::debug!("editor session ready with {} blocks", self.document.len());
                    self.state = SessionState::Ready;
                    self.context.set_ready(true);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            SessionState::Destroyed => Err(SessionError::Destroyed),
            state => Err(SessionError::NotReady(state)),
        }
    }

    /// Loads stored content into the editor, at most once per mount.
    ///
    /// Later calls are skipped so that content handed down again after the
    /// initial load cannot overwrite edits in progress. Hydration is not an
    /// edit and emits no change.
    pub fn hydrate(&mut self, html: &str) -> Result<Hydration, SessionError> {
        match self.state {
            SessionState::Mounting | SessionState::Ready => {}
            SessionState::Destroyed => return Err(SessionError::Destroyed),
            state => return Err(SessionError::NotReady(state)),
        }
        if self.hydrated {
            log::debug!("content already hydrated, skipping");
            return Ok(Hydration::Skipped);
        }

        let (document, report) = parse_document(&self.registry, html);
        self.controllers.clear();
        self.document = document;
        for (id, node) in self.document.iter() {
            self.controllers.mount(id, node);
        }
        self.hydrated = true;
        Ok(Hydration::Applied(report))
    }

    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome, SessionError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Destroyed => return Err(SessionError::Destroyed),
            state => return Err(SessionError::NotReady(state)),
        }

        let outcome = match command {
            EditCommand::InsertBlock { index, node } => self.insert(index, node)?,
            EditCommand::InsertDefault { index, kind } => {
                let node = self.registry.instantiate(kind)?;
                self.insert(index, node)?
            }
            EditCommand::RemoveBlock(id) => {
                self.document
                    .remove(id)
                    .ok_or(SessionError::UnknownBlock(id))?;
                self.controllers.forget(id);
                EditOutcome::Removed(id)
            }
            EditCommand::MoveBlock { id, to } => {
                if self.document.index_of(id).is_none() {
                    return Err(SessionError::UnknownBlock(id));
                }
                if self.document.move_block(id, to) {
                    EditOutcome::Changed(id)
                } else {
                    EditOutcome::Unchanged
                }
            }
            EditCommand::SetContent { id, content } => self.set_content(id, content)?,
            EditCommand::SetHeadingLevel { id, level } => {
                if !(1..=6).contains(&level) {
                    return Err(SessionError::Rejected(format!(
                        "heading level must be between 1 and 6, got {level}"
                    )));
                }
                let node = self.node_mut(id)?;
                if node.kind != NodeType::Heading {
                    return Err(SessionError::WrongNodeType {
                        expected: NodeType::Heading,
                        found: node.kind,
                    });
                }
                let before = node.attrs.number("level");
                node.attrs.set("level", level);
                if before == Some(f64::from(level)) {
                    EditOutcome::Unchanged
                } else {
                    EditOutcome::Changed(id)
                }
            }
            EditCommand::Node { id, command } => {
                let node = self
                    .document
                    .node_mut(id)
                    .ok_or(SessionError::UnknownBlock(id))?;
                match self.controllers.apply(id, node, command)? {
                    NodeOutcome::Changed => EditOutcome::Changed(id),
                    NodeOutcome::Unchanged => EditOutcome::Unchanged,
                    NodeOutcome::Remove => {
                        self.document.remove(id);
                        self.controllers.forget(id);
                        EditOutcome::Removed(id)
                    }
                }
            }
        };

        if outcome != EditOutcome::Unchanged {
            self.pending_change = true;
        }
        Ok(outcome)
    }

    /// Emits the pending change, if any.
    ///
    /// This is the deferred half of an edit: callers run it after the
    /// current batch of edits has finished.
    pub fn flush(&mut self) -> Result<Option<ChangeEvent>, SessionError> {
        if self.state != SessionState::Ready || !self.pending_change {
            return Ok(None);
        }
        self.pending_change = false;
        let html = self.html()?;
        self.revision += 1;
        log::debug!("emitting change revision {}", self.revision);
        Ok(Some(ChangeEvent {
            revision: self.revision,
            html,
        }))
    }

    /// Current content as stored HTML.
    pub fn html(&self) -> Result<String, SchemaError> {
        render_document(&self.registry, &self.document)
    }

    /// Ends the session. Pending emissions and all controller state are
    /// dropped; the session accepts nothing afterwards.
    pub fn destroy(&mut self) {
        if self.state == SessionState::Destroyed {
            return;
        }
        log::debug!("editor session destroyed");
        self.state = SessionState::Destroyed;
        self.pending_change = false;
        self.controllers.clear();
        self.context.set_ready(false);
    }

    fn node_mut(&mut self, id: BlockId) -> Result<&mut Node, SessionError> {
        self.document
            .node_mut(id)
            .ok_or(SessionError::UnknownBlock(id))
    }

    fn insert(&mut self, index: usize, mut node: Node) -> Result<EditOutcome, SessionError> {
        self.registry.conform(&mut node)?;
        let schema = self.registry.schema(node.kind)?;
        if schema.is_discarded(&node) {
            return Err(SessionError::Rejected(format!(
                "an empty {} block cannot be inserted",
                node.kind
            )));
        }
        if schema.containment() == Containment::BlockContainer {
            node.content = container_content(node.kind, node.content);
        }
        let id = self.document.insert(index, node);
        if let Some(node) = self.document.node(id) {
            self.controllers.mount(id, node);
        }
        Ok(EditOutcome::Inserted(id))
    }

    fn set_content(&mut self, id: BlockId, content: Vec<Inline>) -> Result<EditOutcome, SessionError> {
        let kind = self
            .document
            .node(id)
            .ok_or(SessionError::UnknownBlock(id))?
            .kind;
        if self.registry.schema(kind)?.containment() != Containment::BlockContainer {
            return Err(SessionError::NotAContainer(kind));
        }
        let content = container_content(kind, content);
        let node = self.node_mut(id)?;
        if node.content == content {
            return Ok(EditOutcome::Unchanged);
        }
        node.content = content;
        Ok(EditOutcome::Changed(id))
    }
}

/// Code blocks hold one unformatted run; other containers hold normalized
/// runs.
fn container_content(kind: NodeType, content: Vec<Inline>) -> Vec<Inline> {
    if kind == NodeType::CodeBlock {
        let text = crate::models::inline::plain_text(&content);
        if text.is_empty() {
            Vec::new()
        } else {
            vec![Inline::text(text)]
        }
    } else {
        normalize_runs(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::gallery::GalleryCommand;
    use crate::models::{GalleryImage, Mark};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    #[derive(Default)]
    struct Probe {
        view: Cell<bool>,
        attached: Cell<bool>,
        tree: Cell<bool>,
    }

    impl Probe {
        fn complete() -> Self {
            let probe = Self::default();
            probe.view.set(true);
            probe.attached.set(true);
            probe.tree.set(true);
            probe
        }
    }

    impl ViewProbe for Probe {
        fn has_view(&self) -> bool {
            self.view.get()
        }
        fn is_attached(&self) -> bool {
            self.attached.get()
        }
        fn has_render_tree(&self) -> bool {
            self.tree.get()
        }
    }

    fn session() -> EditorSession {
        EditorSession::new(
            Arc::new(SchemaRegistry::standard()),
            Controllers::default(),
            EditorContext::new("Draft"),
        )
    }

    fn ready_session(html: &str) -> EditorSession {
        let mut session = session();
        session.mount().unwrap();
        session.hydrate(html).unwrap();
        assert!(session.poll_ready(&Probe::complete()).unwrap());
        session
    }

    #[test]
    fn test_not_ready_until_view_fully_present() {
        // Given a mounted session whose view has no render tree yet
        let mut session = session();
        session.mount().unwrap();
        let probe = Probe::complete();
        probe.tree.set(false);

        // Then it stays mounting and rejects commands
        assert!(!session.poll_ready(&probe).unwrap());
        assert_eq!(session.state(), SessionState::Mounting);
        assert!(!session.context().is_ready());
        let err = session.apply(EditCommand::InsertDefault {
            index: 0,
            kind: NodeType::Paragraph,
        });
        assert_eq!(err, Err(SessionError::NotReady(SessionState::Mounting)));

        // When the render tree appears
        probe.tree.set(true);
        assert!(session.poll_ready(&probe).unwrap());
        assert!(session.context().is_ready());
    }

    #[test]
    fn test_commands_before_mount_are_rejected_not_queued() {
        let mut session = session();
        let err = session.apply(EditCommand::InsertDefault {
            index: 0,
            kind: NodeType::Paragraph,
        });
        assert_eq!(err, Err(SessionError::NotReady(SessionState::Uninitialized)));

        session.mount().unwrap();
        session.poll_ready(&Probe::complete()).unwrap();
        assert!(session.document().is_empty());
        assert_eq!(session.flush().unwrap(), None);
    }

    #[test]
    fn test_hydrate_only_once_per_mount() {
        let mut session = ready_session("<p>original</p>");
        let id = session.document().id_at(0).unwrap();
        session
            .apply(EditCommand::SetContent {
                id,
                content: vec![Inline::text("edited")],
            })
            .unwrap();

        // Parent re-renders with the stale content
        assert_eq!(session.hydrate("<p>original</p>").unwrap(), Hydration::Skipped);
        assert_eq!(session.document().nodes()[0].plain_text(), "edited");
    }

    #[test]
    fn test_hydrate_emits_no_change() {
        let mut session = ready_session("<p>a</p>");
        assert_eq!(session.flush().unwrap(), None);
    }

    #[test]
    fn test_several_edits_in_one_tick_emit_once() {
        let mut session = ready_session("<p>a</p>");
        let first = session.document().id_at(0).unwrap();

        session
            .apply(EditCommand::InsertDefault {
                index: 1,
                kind: NodeType::Heading,
            })
            .unwrap();
        session
            .apply(EditCommand::SetContent {
                id: first,
                content: vec![Inline::marked("bold", vec![Mark::Bold])],
            })
            .unwrap();

        let event = session.flush().unwrap().unwrap();
        assert_eq!(event.revision, 1);
        assert_eq!(event.html, "<p><strong>bold</strong></p>\n<h2></h2>");
        assert_eq!(session.flush().unwrap(), None);
    }

    #[test]
    fn test_unchanged_edit_emits_nothing() {
        let mut session = ready_session("<p>a</p>");
        let id = session.document().id_at(0).unwrap();
        let outcome = session
            .apply(EditCommand::SetContent {
                id,
                content: vec![Inline::text("a")],
            })
            .unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(session.flush().unwrap(), None);
    }

    #[test]
    fn test_gallery_removal_of_last_image_removes_block() {
        let html = r#"<p>x</p><div data-type="image-gallery" data-images='[{"id":"a","src":"/a.jpg"}]'></div>"#;
        let mut session = ready_session(html);
        let gallery = session.document().id_at(1).unwrap();

        let outcome = session
            .apply(EditCommand::Node {
                id: gallery,
                command: NodeCommand::Gallery(GalleryCommand::Remove {
                    image_id: "a".into(),
                }),
            })
            .unwrap();

        assert_eq!(outcome, EditOutcome::Removed(gallery));
        assert_eq!(session.document().len(), 1);
        assert_eq!(session.flush().unwrap().unwrap().html, "<p>x</p>");
    }

    #[test]
    fn test_inserting_empty_gallery_is_rejected() {
        let mut session = ready_session("");
        let err = session.apply(EditCommand::InsertDefault {
            index: 0,
            kind: NodeType::Gallery,
        });
        assert!(matches!(err, Err(SessionError::Rejected(_))));

        let node = Node::new(NodeType::Gallery)
            .with_attr("images", vec![GalleryImage::new("/a.png", "A")]);
        let outcome = session
            .apply(EditCommand::InsertBlock { index: 0, node })
            .unwrap();
        assert!(matches!(outcome, EditOutcome::Inserted(_)));
        assert_eq!(session.document().nodes()[0].attrs.number("columns"), Some(3.0));
    }

    #[test]
    fn test_set_content_on_atomic_block_is_rejected() {
        let mut session = ready_session(r#"<div class="alert" data-type="TIP"></div>"#);
        let id = session.document().id_at(0).unwrap();
        assert_eq!(
            session.apply(EditCommand::SetContent {
                id,
                content: vec![Inline::text("x")]
            }),
            Err(SessionError::NotAContainer(NodeType::Alert))
        );
    }

    #[test]
    fn test_code_block_content_is_plain_text() {
        let mut session = ready_session("<pre>x</pre>");
        let id = session.document().id_at(0).unwrap();
        session
            .apply(EditCommand::SetContent {
                id,
                content: vec![
                    Inline::marked("let ", vec![Mark::Bold]),
                    Inline::HardBreak,
                    Inline::text("x"),
                ],
            })
            .unwrap();
        assert_eq!(
            session.document().nodes()[0].content,
            vec![Inline::text("let \nx")]
        );
    }

    #[test]
    fn test_heading_level() {
        let mut session = ready_session("<h2>t</h2>");
        let id = session.document().id_at(0).unwrap();
        session
            .apply(EditCommand::SetHeadingLevel { id, level: 4 })
            .unwrap();
        assert!(session
            .apply(EditCommand::SetHeadingLevel { id, level: 7 })
            .is_err());
        assert_eq!(session.flush().unwrap().unwrap().html, "<h4>t</h4>");
    }

    #[test]
    fn test_destroy_drops_pending_change() {
        let mut session = ready_session("<p>a</p>");
        session
            .apply(EditCommand::InsertDefault {
                index: 0,
                kind: NodeType::Paragraph,
            })
            .unwrap();
        assert!(session.has_pending_change());

        session.destroy();

        assert!(!session.has_pending_change());
        assert_eq!(session.flush().unwrap(), None);
        assert_eq!(session.state(), SessionState::Destroyed);
        assert!(!session.context().is_ready());
        assert_eq!(
            session.apply(EditCommand::RemoveBlock(session.document().id_at(0).unwrap())),
            Err(SessionError::Destroyed)
        );
        assert_eq!(session.mount(), Err(SessionError::Destroyed));
    }

    #[test]
    fn test_unknown_block() {
        let mut session = ready_session("<p>a</p>");
        let id = session.document().id_at(0).unwrap();
        session.apply(EditCommand::RemoveBlock(id)).unwrap();
        assert_eq!(
            session.apply(EditCommand::RemoveBlock(id)),
            Err(SessionError::UnknownBlock(id))
        );
    }
}
