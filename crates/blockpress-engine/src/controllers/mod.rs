//! # Node controllers
//!
//! One controller per node type. Controllers mutate node attributes and
//! keep only transient UI state (hover, drag, console output) keyed by
//! [`BlockId`]; that state is dropped when the block goes away or the
//! session ends.

pub mod alert;
pub mod code_block;
pub mod embed;
pub mod gallery;
pub mod image;
pub mod promo;
pub mod settings;

use std::sync::Arc;

use crate::errors::SessionError;
use crate::models::{BlockId, Node, NodeType};

use alert::AlertCommand;
use code_block::{CodeBlockCommand, CodeBlockController};
use embed::{EmbedCommand, EmbedController, ScriptRuntime};
use gallery::{GalleryCommand, GalleryController};
use image::{ImageCommand, ImageController, ImageLimits};
use promo::PromoCommand;

/// What a controller command did to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    Changed,
    Unchanged,
    /// The node no longer makes sense and must be removed from the document.
    Remove,
}

/// A command addressed to the controller of one node type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeCommand {
    Image(ImageCommand),
    Gallery(GalleryCommand),
    CodeBlock(CodeBlockCommand),
    Embed(EmbedCommand),
    Alert(AlertCommand),
    Promo(PromoCommand),
}

impl NodeCommand {
    /// The node type this command applies to.
    pub fn target(&self) -> NodeType {
        match self {
            NodeCommand::Image(_) => NodeType::Image,
            NodeCommand::Gallery(_) => NodeType::Gallery,
            NodeCommand::CodeBlock(_) => NodeType::CodeBlock,
            NodeCommand::Embed(_) => NodeType::Embed,
            NodeCommand::Alert(_) => NodeType::Alert,
            NodeCommand::Promo(_) => NodeType::Promo,
        }
    }
}

/// All controllers of one editor session.
#[derive(Debug, Default)]
pub struct Controllers {
    pub image: ImageController,
    pub gallery: GalleryController,
    pub code_block: CodeBlockController,
    pub embed: EmbedController,
}

impl Controllers {
    pub fn new(limits: ImageLimits, runtime: Option<Arc<dyn ScriptRuntime>>) -> Self {
        Self {
            image: ImageController::new(limits),
            gallery: GalleryController::default(),
            code_block: CodeBlockController::default(),
            embed: EmbedController::new(runtime),
        }
    }

    pub fn apply(
        &mut self,
        id: BlockId,
        node: &mut Node,
        command: NodeCommand,
    ) -> Result<NodeOutcome, SessionError> {
        if command.target() != node.kind {
            return Err(SessionError::WrongNodeType {
                expected: command.target(),
                found: node.kind,
            });
        }
        match command {
            NodeCommand::Image(c) => Ok(self.image.apply(id, node, c)),
            NodeCommand::Gallery(c) => self.gallery.apply(id, node, c),
            NodeCommand::CodeBlock(c) => Ok(self.code_block.apply(id, node, c)),
            NodeCommand::Embed(c) => self.embed.apply(id, node, c),
            NodeCommand::Alert(c) => Ok(alert::apply(node, c)),
            NodeCommand::Promo(c) => Ok(promo::apply(node, c)),
        }
    }

    /// Called once a block is in a live document.
    pub fn mount(&mut self, id: BlockId, node: &Node) {
        if node.kind == NodeType::Embed {
            self.embed.mount(id, node);
        }
    }

    /// Drops the UI state of a removed block.
    pub fn forget(&mut self, id: BlockId) {
        self.image.forget(id);
        self.gallery.forget(id);
        self.code_block.forget(id);
        self.embed.forget(id);
    }

    pub fn clear(&mut self) {
        self.image.clear();
        self.gallery.clear();
        self.code_block.clear();
        self.embed.clear();
    }
}
