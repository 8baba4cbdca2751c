/// System tray integration.
///
/// One icon, one context-menu entry (Quit). A left click on the icon is the
/// toggle gesture; everything it triggers lives in the binary, which drains
/// [`TrayManager::poll_events`] from its event loop.
use anyhow::{anyhow, Result};
use std::sync::mpsc::{self, Receiver};
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem};
use tray_icon::{
    Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent,
};

const ICON_SIZE: u32 = 32;

/// Events the tray surface hands to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    /// Left click on the icon: open or close Proton Mail.
    Toggle,
    /// Quit entry in the context menu.
    Quit,
}

/// Build the tray icon image in memory: a Proton-purple square with a white
/// envelope glyph. Avoids shipping an asset next to the binary.
fn build_icon() -> Result<Icon> {
    let size = ICON_SIZE as usize;
    let mut rgba = vec![0u8; size * size * 4];

    let background = [0x6d, 0x4a, 0xff, 0xff];
    let foreground = [0xff, 0xff, 0xff, 0xff];

    for y in 0..size {
        for x in 0..size {
            let inside_envelope = (8..24).contains(&y) && (5..27).contains(&x);
            // Upper flap: two diagonals meeting in the middle.
            let on_flap = inside_envelope && {
                let from_left = x.saturating_sub(5);
                let from_right = 26usize.saturating_sub(x);
                let depth = y - 8;
                depth == from_left.min(from_right) / 2 + 1
            };
            let on_border = inside_envelope && (y == 8 || y == 23 || x == 5 || x == 26);

            let pixel = if on_border || on_flap {
                foreground
            } else {
                background
            };
            rgba[(y * size + x) * 4..(y * size + x) * 4 + 4].copy_from_slice(&pixel);
        }
    }

    Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE)
        .map_err(|e| anyhow!("Failed to create tray icon image: {e}"))
}

/// Owns the tray icon and the channels its event handlers feed.
pub struct TrayManager {
    _tray_icon: TrayIcon,
    quit_id: MenuId,
    tray_rx: Receiver<TrayIconEvent>,
    menu_rx: Receiver<MenuEvent>,
}

impl TrayManager {
    pub fn new() -> Result<Self> {
        let icon = build_icon()?;

        let menu = Menu::new();
        let quit_item = MenuItem::new("Quit", true, None);
        menu.append(&quit_item)
            .map_err(|e| anyhow!("Failed to add quit item: {e}"))?;
        let quit_id = quit_item.id().clone();

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip("Proton Mail Tray")
            .with_icon(icon)
            .with_menu(Box::new(menu))
            .build()
            .map_err(|e| anyhow!("Failed to create tray icon: {e}"))?;

        let (tray_tx, tray_rx) = mpsc::channel();
        TrayIconEvent::set_event_handler(Some(move |event| {
            let _ = tray_tx.send(event);
        }));

        let (menu_tx, menu_rx) = mpsc::channel();
        MenuEvent::set_event_handler(Some(move |event| {
            let _ = menu_tx.send(event);
        }));

        Ok(TrayManager {
            _tray_icon: tray_icon,
            quit_id,
            tray_rx,
            menu_rx,
        })
    }

    /// Next pending tray event, if any. Non-blocking.
    pub fn poll_events(&self) -> Option<TrayEvent> {
        while let Ok(event) = self.menu_rx.try_recv() {
            if event.id == self.quit_id {
                return Some(TrayEvent::Quit);
            }
        }

        while let Ok(event) = self.tray_rx.try_recv() {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                return Some(TrayEvent::Toggle);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_image_has_expected_dimensions() {
        // Icon construction must not fail; a bad buffer length is the only
        // failure mode of from_rgba.
        assert!(build_icon().is_ok());
    }
}
