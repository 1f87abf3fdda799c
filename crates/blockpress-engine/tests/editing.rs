use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blockpress_engine::controllers::gallery::GalleryCommand;
use blockpress_engine::controllers::image::ImageCommand;
use blockpress_engine::controllers::embed::EmbedCommand;
use blockpress_engine::save::{MutationResponse, SaveResponse};
use blockpress_engine::session::{EditOutcome, ToolbarAction};
use blockpress_engine::upload::UploadResponse;
use blockpress_engine::{
    EditCommand, EditorError, EditorSettings, NodeCommand, NodeType, PostEditor, PostRecord,
    PostStore, SavePhase, SaveStatus, SchemaRegistry, TransportError, UploadFile, Uploader,
    ViewProbe,
};
use pretty_assertions::assert_eq;

/// Store that answers every save after a fixed delay.
struct MemoryStore {
    delay: Duration,
    saves: Mutex<Vec<PostRecord>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            saves: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn max_concurrent_saves(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn saved_contents(&self) -> Vec<String> {
        self.saves
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.content.clone())
            .collect()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn save(&self, record: &PostRecord) -> Result<SaveResponse, TransportError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.saves.lock().unwrap().push(record.clone());
        Ok(SaveResponse::ok("Post saved"))
    }

    async fn delete(&self, _id: &str) -> Result<MutationResponse, TransportError> {
        Ok(MutationResponse::ok("Post deleted"))
    }

    async fn restore(&self, _id: &str) -> Result<MutationResponse, TransportError> {
        Ok(MutationResponse::ok("Post restored"))
    }
}

struct AttachedView;

impl ViewProbe for AttachedView {
    fn has_view(&self) -> bool {
        true
    }
    fn is_attached(&self) -> bool {
        true
    }
    fn has_render_tree(&self) -> bool {
        true
    }
}

/// Uploads `fail.*` files unsuccessfully, everything else to `/uploads/<name>`.
struct CdnUploader;

#[async_trait]
impl Uploader for CdnUploader {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, TransportError> {
        // Later files finish first
        let delay = 100u64.saturating_sub(file.bytes.len() as u64);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        if file.name.starts_with("fail") {
            Ok(UploadResponse::Error {
                error: "storage full".into(),
            })
        } else {
            Ok(UploadResponse::Url {
                url: format!("/uploads/{}", file.name),
            })
        }
    }
}

const STORED: &str = concat!(
    "<h2>Trip</h2>\n",
    r#"<figure data-type="image"><img src="/beach.jpg" alt="Beach"></figure>"#,
    "\n",
    r#"<div data-type="image-gallery" data-images='[{"id":"a","src":"/a.jpg"},{"id":"b","src":"/b.jpg"},{"id":"c","src":"/c.jpg"}]'></div>"#,
);

fn record() -> PostRecord {
    PostRecord {
        id: Some("post-7".into()),
        title: "Trip".into(),
        slug: "trip".into(),
        content: STORED.into(),
        date: "2024-06-01".into(),
        category_id: "travel".into(),
        author_id: "ana".into(),
        ..Default::default()
    }
}

fn open_editor(store: Arc<MemoryStore>) -> PostEditor {
    let mut editor = PostEditor::new(
        Arc::new(SchemaRegistry::standard()),
        store,
        record(),
        EditorSettings::default(),
        None,
    );
    editor.open().unwrap();
    assert!(editor.poll_ready(&AttachedView).unwrap());
    editor
}

fn block(editor: &PostEditor, kind: NodeType) -> blockpress_engine::BlockId {
    editor
        .session()
        .document()
        .iter()
        .find(|(_, node)| node.kind == kind)
        .map(|(id, _)| id)
        .unwrap()
}

async fn wait(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    tokio::task::yield_now().await;
}

#[tokio::test(start_paused = true)]
async fn test_loaded_image_is_sized_to_column() {
    let mut editor = open_editor(MemoryStore::new(Duration::ZERO));
    let image = block(&editor, NodeType::Image);

    editor
        .edit(EditCommand::Node {
            id: image,
            command: NodeCommand::Image(ImageCommand::Loaded {
                natural_width: 1200.0,
                natural_height: 800.0,
            }),
        })
        .await
        .unwrap();

    let attrs = &editor.session().document().node(image).unwrap().attrs;
    assert_eq!(attrs.number("width"), Some(600.0));
    assert_eq!(attrs.number("height"), Some(400.0));
    assert_eq!(attrs.number("aspectRatio"), Some(0.6667));
}

#[tokio::test(start_paused = true)]
async fn test_gallery_removals() {
    let mut editor = open_editor(MemoryStore::new(Duration::ZERO));
    let gallery = block(&editor, NodeType::Gallery);
    let remove = |image_id: &str| EditCommand::Node {
        id: gallery,
        command: NodeCommand::Gallery(GalleryCommand::Remove {
            image_id: image_id.into(),
        }),
    };

    editor.edit(remove("b")).await.unwrap();
    let ids: Vec<_> = editor
        .session()
        .document()
        .node(gallery)
        .unwrap()
        .attrs
        .images("images")
        .iter()
        .map(|i| i.id.clone())
        .collect();
    assert_eq!(ids, vec!["a", "c"]);

    editor.edit(remove("a")).await.unwrap();
    let outcome = editor.edit(remove("c")).await.unwrap();

    assert_eq!(outcome, EditOutcome::Removed(gallery));
    assert!(editor.session().document().node(gallery).is_none());
    assert_eq!(editor.session().document().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_edits_autosave_once_after_quiet_period() {
    let store = MemoryStore::new(Duration::from_millis(200));
    let mut editor = open_editor(store.clone());
    let heading = block(&editor, NodeType::Heading);

    for title in ["Trip to", "Trip to the", "Trip to the sea"] {
        editor
            .edit(EditCommand::SetContent {
                id: heading,
                content: vec![blockpress_engine::Inline::text(title)],
            })
            .await
            .unwrap();
        wait(1.0).await;
    }
    assert_eq!(editor.coordinator().phase(), SavePhase::PendingAutosave);

    wait(5.0).await;

    let saved = store.saved_contents();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].starts_with("<h2>Trip to the sea</h2>"));
    assert_eq!(editor.coordinator().status(), SaveStatus::Saved);
    assert!(!editor.coordinator().has_unsaved_changes());
}

#[tokio::test(start_paused = true)]
async fn test_autosaves_never_overlap_on_a_slow_store() {
    // Given a store slower than the debounce interval
    let store = MemoryStore::new(Duration::from_secs(8));
    let mut editor = open_editor(store.clone());
    let heading = block(&editor, NodeType::Heading);
    let set = |text: &str| EditCommand::SetContent {
        id: heading,
        content: vec![blockpress_engine::Inline::text(text)],
    };

    // When a second edit comes due while the first autosave is running
    editor.edit(set("First")).await.unwrap();
    wait(5.5).await;
    assert_eq!(editor.coordinator().phase(), SavePhase::Saving);
    editor.edit(set("Second")).await.unwrap();
    wait(6.0).await;

    // Then it waits for the running call instead of racing it
    assert!(store.saved_contents().is_empty());
    assert_eq!(store.max_concurrent_saves(), 1);

    wait(2.0).await;
    assert_eq!(store.saved_contents().len(), 1);
    assert!(editor.coordinator().has_unsaved_changes());

    wait(12.0).await;

    let saved = store.saved_contents();
    assert_eq!(store.max_concurrent_saves(), 1);
    assert_eq!(saved.len(), 2);
    assert!(saved[1].starts_with("<h2>Second</h2>"));
    assert!(!editor.coordinator().has_unsaved_changes());
}

#[tokio::test(start_paused = true)]
async fn test_reverted_edit_makes_no_autosave_call() {
    let store = MemoryStore::new(Duration::ZERO);
    let mut editor = open_editor(store.clone());
    let heading = block(&editor, NodeType::Heading);
    let set = |text: &str| EditCommand::SetContent {
        id: heading,
        content: vec![blockpress_engine::Inline::text(text)],
    };

    // A first autosave establishes the baseline
    editor.edit(set("Trip!")).await.unwrap();
    wait(6.0).await;
    assert_eq!(store.saved_contents().len(), 1);

    // Typing and undoing leaves the content as last saved
    editor.edit(set("Trip!?")).await.unwrap();
    editor.edit(set("Trip!")).await.unwrap();
    assert!(editor.coordinator().has_unsaved_changes());
    wait(6.0).await;

    assert_eq!(store.saved_contents().len(), 1);
    assert!(!editor.coordinator().has_unsaved_changes());
}

#[tokio::test(start_paused = true)]
async fn test_slow_manual_save_times_out() {
    let store = MemoryStore::new(Duration::from_secs(20));
    let mut editor = open_editor(store.clone());

    let err = editor.save().await.unwrap_err();

    assert!(matches!(err, EditorError::Timeout { .. }));
    assert_eq!(
        err.user_message(),
        "Save operation timed out. Please check your connection and try again."
    );
    assert_eq!(editor.coordinator().status(), SaveStatus::Error);
    assert!(editor.context().is_enabled(ToolbarAction::Save));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_save_reenables_save_action() {
    let store = MemoryStore::new(Duration::from_secs(10));
    let mut editor = open_editor(store.clone());

    // The caller gives up on the save before it settles
    let abandoned = tokio::time::timeout(Duration::from_secs(1), editor.save()).await;

    assert!(abandoned.is_err());
    assert!(editor.context().is_enabled(ToolbarAction::Save));
    assert!(!editor.coordinator().is_saving());
    editor.save().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_manual_save_supersedes_pending_autosave() {
    let store = MemoryStore::new(Duration::from_secs(1));
    let mut editor = open_editor(store.clone());
    let heading = block(&editor, NodeType::Heading);

    editor
        .edit(EditCommand::SetContent {
            id: heading,
            content: vec![blockpress_engine::Inline::text("Manual")],
        })
        .await
        .unwrap();
    editor.save().await.unwrap();
    wait(10.0).await;

    assert_eq!(store.saved_contents().len(), 1);
    assert_eq!(editor.coordinator().status(), SaveStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn test_bulk_upload_keeps_picked_order() {
    let mut editor = open_editor(MemoryStore::new(Duration::ZERO));
    let gallery = block(&editor, NodeType::Gallery);
    let files = vec![
        UploadFile::new("one.jpg", "image/jpeg", vec![0; 10]),
        UploadFile::new("fail.png", "image/png", vec![0; 20]),
        UploadFile::new("two.webp", "image/webp", vec![0; 30]),
        UploadFile::new("notes.pdf", "application/pdf", vec![0; 40]),
    ];

    let bulk = editor
        .upload_to_gallery(gallery, &CdnUploader, &files)
        .await
        .unwrap();

    let failed: Vec<_> = bulk.failures.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(failed, vec!["fail.png", "notes.pdf"]);
    let srcs: Vec<_> = editor
        .session()
        .document()
        .node(gallery)
        .unwrap()
        .attrs
        .images("images")
        .iter()
        .map(|i| i.src.clone())
        .collect();
    assert_eq!(
        srcs,
        vec!["/a.jpg", "/b.jpg", "/c.jpg", "/uploads/one.jpg", "/uploads/two.webp"]
    );
    assert!(editor.coordinator().has_unsaved_changes());
}

#[tokio::test(start_paused = true)]
async fn test_embed_detection_through_editor() {
    let mut editor = open_editor(MemoryStore::new(Duration::ZERO));
    let outcome = editor
        .edit(EditCommand::InsertDefault {
            index: 1,
            kind: NodeType::Embed,
        })
        .await
        .unwrap();
    let EditOutcome::Inserted(embed) = outcome else {
        panic!("expected an inserted block, got {outcome:?}");
    };

    editor
        .edit_all([
            EditCommand::Node {
                id: embed,
                command: NodeCommand::Embed(EmbedCommand::SetType(None)),
            },
            EditCommand::Node {
                id: embed,
                command: NodeCommand::Embed(EmbedCommand::SetCode(
                    r#"<iframe src="https://maps.test/embed?q=1"></iframe>"#.into(),
                )),
            },
        ])
        .await
        .unwrap();

    let attrs = &editor.session().document().node(embed).unwrap().attrs;
    assert_eq!(attrs.text("embedType"), "iframe");
    assert_eq!(attrs.text("url"), "https://maps.test/embed?q=1");
}

#[tokio::test(start_paused = true)]
async fn test_closed_editor_ignores_late_save() {
    let store = MemoryStore::new(Duration::from_secs(3));
    let mut editor = open_editor(store.clone());
    let heading = block(&editor, NodeType::Heading);
    editor
        .edit(EditCommand::SetContent {
            id: heading,
            content: vec![blockpress_engine::Inline::text("Late")],
        })
        .await
        .unwrap();

    // Autosave starts at 5s and is still running when the editor closes
    wait(6.0).await;
    assert_eq!(editor.coordinator().phase(), SavePhase::Saving);
    editor.close();
    wait(5.0).await;

    assert!(store.saved_contents().is_empty());
    assert!(editor.coordinator().has_unsaved_changes());
    assert!(matches!(
        editor.edit(EditCommand::RemoveBlock(heading)).await,
        Err(EditorError::Session(_))
    ));
}
