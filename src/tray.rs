/// System tray icon with Show / Hide / Exit menu, plus an optional
/// "Start with Windows" checkbox
///
/// Tray and menu callbacks fire outside the event loop callback, so they only
/// queue tasks for the UI thread.
use crate::autostart;
use crate::dispatch::{UiDispatcher, UiTask};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tray_icon::menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};

/// Icon resource id the build script embeds
const APP_ICON_RESOURCE: u16 = 1;

fn load_app_icon() -> Result<Icon> {
    match Icon::from_resource(APP_ICON_RESOURCE, None) {
        Ok(icon) => return Ok(icon),
        Err(e) => tracing::debug!("No embedded icon resource ({:?}), using fallback", e),
    }

    // Fallback: blue square
    let icon_rgba: Vec<u8> = (0..16 * 16)
        .flat_map(|_| [0x25, 0x63, 0xEB, 0xFF])
        .collect();
    Icon::from_rgba(icon_rgba, 16, 16)
        .map_err(|e| anyhow!("Failed to create fallback icon: {:?}", e))
}

#[derive(Debug, Clone)]
struct MenuIds {
    show: MenuId,
    hide: MenuId,
    auto_start: Option<MenuId>,
    exit: MenuId,
}

impl MenuIds {
    fn task_for(&self, id: &MenuId) -> Option<UiTask> {
        if *id == self.show {
            Some(UiTask::Present)
        } else if *id == self.hide {
            Some(UiTask::Hide)
        } else if *id == self.exit {
            Some(UiTask::Exit)
        } else if self.auto_start.as_ref() == Some(id) {
            Some(UiTask::ToggleAutoStart)
        } else {
            None
        }
    }
}

pub struct TrayManager {
    #[allow(dead_code)]
    tray_icon: TrayIcon,
    title: String,
    auto_start_item: Option<CheckMenuItem>,
}

impl TrayManager {
    pub fn new(title: &str, offer_auto_start: bool, dispatcher: Arc<dyn UiDispatcher>) -> Result<Self> {
        tracing::info!("Creating tray icon");

        let icon = load_app_icon()?;

        let menu = Menu::new();
        let show_item = MenuItem::new("Show", true, None);
        let hide_item = MenuItem::new("Hide", true, None);
        let separator = PredefinedMenuItem::separator();
        let exit_item = MenuItem::new("Exit", true, None);

        menu.append(&show_item)
            .map_err(|e| anyhow!("Failed to add show item: {}", e))?;
        menu.append(&hide_item)
            .map_err(|e| anyhow!("Failed to add hide item: {}", e))?;
        menu.append(&separator)
            .map_err(|e| anyhow!("Failed to add separator: {}", e))?;

        let auto_start_item = if offer_auto_start {
            let item = CheckMenuItem::new("Start with Windows", true, autostart::is_enabled(title), None);
            menu.append(&item)
                .map_err(|e| anyhow!("Failed to add auto-start item: {}", e))?;
            menu.append(&PredefinedMenuItem::separator())
                .map_err(|e| anyhow!("Failed to add separator: {}", e))?;
            Some(item)
        } else {
            None
        };

        menu.append(&exit_item)
            .map_err(|e| anyhow!("Failed to add exit item: {}", e))?;

        let ids = MenuIds {
            show: show_item.id().clone(),
            hide: hide_item.id().clone(),
            auto_start: auto_start_item.as_ref().map(|item| item.id().clone()),
            exit: exit_item.id().clone(),
        };

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(title)
            .with_icon(icon)
            .with_menu(Box::new(menu))
            .with_menu_on_left_click(false)
            .build()
            .map_err(|e| anyhow!("Failed to create tray icon: {}", e))?;

        let click_dispatcher = Arc::clone(&dispatcher);
        TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                tracing::debug!("Tray left click");
                click_dispatcher.dispatch(UiTask::Present);
            }
        }));

        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            tracing::debug!("Menu event: {:?}", event);
            if let Some(task) = ids.task_for(event.id()) {
                dispatcher.dispatch(task);
            }
        }));

        tracing::info!("Tray icon created");

        Ok(Self {
            tray_icon,
            title: title.to_string(),
            auto_start_item,
        })
    }

    /// Flip the Run entry and make the checkbox match what the registry says
    pub fn toggle_auto_start(&self) {
        let Some(item) = &self.auto_start_item else {
            return;
        };

        let enable = !autostart::is_enabled(&self.title);
        if let Err(e) = autostart::set_enabled(&self.title, enable) {
            tracing::error!("Failed to update start with Windows: {}", e);
        }
        item.set_checked(autostart::is_enabled(&self.title));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_ids_map_to_tasks() {
        let ids = MenuIds {
            show: MenuId::new("show"),
            hide: MenuId::new("hide"),
            auto_start: Some(MenuId::new("autostart")),
            exit: MenuId::new("exit"),
        };
        assert_eq!(ids.task_for(&MenuId::new("show")), Some(UiTask::Present));
        assert_eq!(ids.task_for(&MenuId::new("hide")), Some(UiTask::Hide));
        assert_eq!(ids.task_for(&MenuId::new("exit")), Some(UiTask::Exit));
        assert_eq!(ids.task_for(&MenuId::new("autostart")), Some(UiTask::ToggleAutoStart));
        assert_eq!(ids.task_for(&MenuId::new("other")), None);
    }
}
