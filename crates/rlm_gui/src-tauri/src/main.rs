// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    #[cfg(target_os = "linux")]
    sanitize_gtk_environment();

    rlm_gui_lib::run();
}

/// Strip GTK modules that trigger the Gdk-CRITICAL assertion
/// `gdk_wayland_window_set_dbus_properties_libgtk_only:
///  assertion 'GDK_IS_WAYLAND_WINDOW (window)' failed`.
///
/// The `appmenu-gtk-module` calls into windows that are not (yet) proper GDK
/// Wayland windows; removing it from `GTK_MODULES` before GTK initializes
/// avoids the assertion without losing functionality.
#[cfg(target_os = "linux")]
fn sanitize_gtk_environment() {
    use std::env;

    if let Ok(modules) = env::var("GTK_MODULES") {
        let filtered: Vec<&str> = modules
            .split(':')
            .filter(|m| !m.contains("appmenu-gtk-module"))
            .collect();
        if filtered.is_empty() {
            env::remove_var("GTK_MODULES");
        } else {
            env::set_var("GTK_MODULES", filtered.join(":"));
        }
    }

    if env::var_os("WEBKIT_DISABLE_DMABUF_RENDERER").is_none() {
        env::set_var("WEBKIT_DISABLE_DMABUF_RENDERER", "1");
    }
}
