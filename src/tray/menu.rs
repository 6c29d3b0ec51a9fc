//! Context menu for the system tray.

use tray_icon::menu::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem};

pub const MENU_ID_START: &str = "start_monitoring";
pub const MENU_ID_STOP: &str = "stop_monitoring";
pub const MENU_ID_AUTOSTART: &str = "autostart";
pub const MENU_ID_EXIT: &str = "exit";

/// The tray context menu plus the items whose state changes at runtime.
pub struct TrayMenu {
    pub menu: Menu,
    pub autostart: CheckMenuItem,
}

/// Creates the context menu for the system tray.
///
/// `autostart_enabled` sets the initial check state of the auto-start item.
pub fn create_tray_menu(autostart_enabled: bool) -> TrayMenu {
    let menu = Menu::new();

    let status = MenuItem::new("Window Monitor", false, None);
    let start = MenuItem::with_id(MenuId::new(MENU_ID_START), "Start Monitoring", true, None);
    let stop = MenuItem::with_id(MenuId::new(MENU_ID_STOP), "Stop Monitoring", true, None);
    let autostart = CheckMenuItem::with_id(
        MenuId::new(MENU_ID_AUTOSTART),
        "Start with Windows",
        true,
        autostart_enabled,
        None,
    );
    let exit = MenuItem::with_id(MenuId::new(MENU_ID_EXIT), "Quit", true, None);

    let _ = menu.append(&status);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&start);
    let _ = menu.append(&stop);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&autostart);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&exit);

    TrayMenu { menu, autostart }
}
