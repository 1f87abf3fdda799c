//! One open post: the editor session wired to the save coordinator.

use std::sync::Arc;

use crate::controllers::embed::ScriptRuntime;
use crate::controllers::gallery::{BulkUpload, GalleryCommand, upload_images};
use crate::controllers::image::ImageLimits;
use crate::controllers::{Controllers, NodeCommand};
use crate::errors::EditorError;
use crate::models::BlockId;
use crate::save::{PostRecord, PostStore, SaveConfig, SaveCoordinator, SaveResponse, slugify};
use crate::schema::SchemaRegistry;
use crate::script::ScriptSettings;
use crate::session::{
    ChangeEvent, EditCommand, EditOutcome, EditorContext, EditorSession, Hydration, ToolbarAction,
    ViewProbe,
};
use crate::upload::{UploadFile, UploadPolicy, Uploader};

/// Tunables of an editor instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorSettings {
    pub save: SaveConfig,
    pub upload: UploadPolicy,
    pub image: ImageLimits,
    pub scripts: ScriptSettings,
}

/// Keeps the save action disabled while alive.
struct SaveActionGuard<'a> {
    context: &'a mut EditorContext,
}

impl<'a> SaveActionGuard<'a> {
    fn disable(context: &'a mut EditorContext) -> Self {
        context.set_enabled(ToolbarAction::Save, false);
        Self { context }
    }
}

impl Drop for SaveActionGuard<'_> {
    fn drop(&mut self) {
        self.context.set_enabled(ToolbarAction::Save, true);
    }
}

#[derive(Debug)]
pub struct PostEditor {
    session: EditorSession,
    coordinator: SaveCoordinator,
    upload_policy: UploadPolicy,
}

impl PostEditor {
    /// Must be called inside a tokio runtime; autosaves are spawned on it.
    ///
    /// `runtime` overrides the script runtime built from `settings.scripts`.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        store: Arc<dyn PostStore>,
        record: PostRecord,
        settings: EditorSettings,
        runtime: Option<Arc<dyn ScriptRuntime>>,
    ) -> Self {
        let runtime = runtime.or_else(|| settings.scripts.runtime());
        let context = EditorContext::new(record.title.clone());
        let session = EditorSession::new(
            registry,
            Controllers::new(settings.image, runtime),
            context,
        );
        Self {
            session,
            coordinator: SaveCoordinator::new(store, settings.save, record),
            upload_policy: settings.upload,
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn coordinator(&self) -> &SaveCoordinator {
        &self.coordinator
    }

    pub fn context(&self) -> &EditorContext {
        self.session.context()
    }

    /// Mounts the session and loads the stored content into it.
    pub fn open(&mut self) -> Result<Hydration, EditorError> {
        self.session.mount()?;
        let content = self.coordinator.record().content;
        Ok(self.session.hydrate(&content)?)
    }

    pub fn poll_ready(&mut self, probe: &dyn ViewProbe) -> Result<bool, EditorError> {
        Ok(self.session.poll_ready(probe)?)
    }

    /// Applies one edit and lets the change event go out on the next tick.
    pub async fn edit(&mut self, command: EditCommand) -> Result<EditOutcome, EditorError> {
        let outcome = self.session.apply(command)?;
        tokio::task::yield_now().await;
        self.flush()?;
        Ok(outcome)
    }

    /// Applies several edits in one tick; they produce a single change event.
    pub async fn edit_all(
        &mut self,
        commands: impl IntoIterator<Item = EditCommand>,
    ) -> Result<Vec<EditOutcome>, EditorError> {
        let mut outcomes = Vec::new();
        for command in commands {
            outcomes.push(self.session.apply(command)?);
        }
        tokio::task::yield_now().await;
        self.flush()?;
        Ok(outcomes)
    }

    /// Forwards the pending change, if any, to the save coordinator.
    pub fn flush(&mut self) -> Result<Option<ChangeEvent>, EditorError> {
        let event = self.session.flush()?;
        if let Some(event) = &event {
            self.coordinator.content_changed(event.html.clone());
        }
        Ok(event)
    }

    /// Uploads images into a gallery. Files that fail are reported back;
    /// the rest are appended in the order they were picked.
    pub async fn upload_to_gallery(
        &mut self,
        gallery: BlockId,
        uploader: &dyn Uploader,
        files: &[UploadFile],
    ) -> Result<BulkUpload, EditorError> {
        let bulk = upload_images(uploader, &self.upload_policy, files).await;
        for (name, error) in &bulk.failures {
            log::warn!("upload of {name} failed: {error}");
        }
        if !bulk.images.is_empty() {
            self.session.apply(EditCommand::Node {
                id: gallery,
                command: NodeCommand::Gallery(GalleryCommand::AddImages(bulk.images.clone())),
            })?;
            self.flush()?;
        }
        Ok(bulk)
    }

    /// Updates the title in the record and the page header. An empty slug
    /// is derived from the title.
    pub fn set_title(&mut self, title: &str) {
        self.coordinator.update_record(|record| {
            record.title = title.to_string();
            if record.slug.is_empty() {
                record.slug = slugify(title);
            }
        });
        self.session.context_mut().set_title(title);
    }

    /// Saves now, with the save action disabled until the call settles or
    /// the returned future is dropped.
    pub async fn save(&mut self) -> Result<SaveResponse, EditorError> {
        self.flush()?;
        let _save_disabled = SaveActionGuard::disable(self.session.context_mut());
        self.coordinator.save().await
    }

    pub fn set_online(&self, online: bool) {
        self.coordinator.set_online(online);
    }

    /// Tears down the session and stops autosaving.
    pub fn close(&mut self) {
        self.session.destroy();
        self.coordinator.shutdown();
    }
}

impl Drop for PostEditor {
    fn drop(&mut self) {
        self.coordinator.shutdown();
    }
}
