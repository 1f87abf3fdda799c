/// Visibility of a block's floating settings toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsSurface {
    #[default]
    Hidden,
    HoverVisible,
    MenuOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    PointerEnter,
    PointerLeave,
    OpenMenu,
    CloseMenu,
}

/// Hover/menu state machine shared by every controller with a toolbar.
///
/// While a menu is open, leaving the block does not hide the toolbar; the
/// pointer position is remembered so that closing the menu lands in the
/// right state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsState {
    surface: SettingsSurface,
    pointer_inside: bool,
}

impl SettingsState {
    pub fn surface(&self) -> SettingsSurface {
        self.surface
    }

    pub fn is_visible(&self) -> bool {
        self.surface != SettingsSurface::Hidden
    }

    pub fn handle(&mut self, event: SurfaceEvent) -> SettingsSurface {
        use SettingsSurface::*;
        use SurfaceEvent::*;

        match event {
            PointerEnter => self.pointer_inside = true,
            PointerLeave => self.pointer_inside = false,
            _ => {}
        }

        self.surface = match (self.surface, event) {
            (Hidden, PointerEnter) => HoverVisible,
            (HoverVisible, PointerLeave) => Hidden,
            (Hidden | HoverVisible, OpenMenu) => MenuOpen,
            (MenuOpen, CloseMenu) if self.pointer_inside => HoverVisible,
            (MenuOpen, CloseMenu) => Hidden,
            (surface, _) => surface,
        };
        self.surface
    }
}
