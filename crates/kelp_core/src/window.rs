use std::ffi::{c_ulong, c_void};
use std::num::NonZeroIsize;
use std::ptr::{self, NonNull};

use raw_window_handle::{
    AppKitDisplayHandle, AppKitWindowHandle, RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle,
    WaylandWindowHandle, Win32WindowHandle, WindowsDisplayHandle, XlibDisplayHandle, XlibWindowHandle,
};

use crate::error::{KelpError, KelpResult};

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    Win32 = 0,
    Xlib = 1,
    Wayland = 2,
    AppKit = 3,
}

impl TryFrom<u32> for WindowType {
    type Error = KelpError;

    fn try_from(value: u32) -> KelpResult<Self> {
        match value {
            0 => Ok(WindowType::Win32),
            1 => Ok(WindowType::Xlib),
            2 => Ok(WindowType::Wayland),
            3 => Ok(WindowType::AppKit),
            other => Err(KelpError::invalid_input(format!("unknown window type {other}"))),
        }
    }
}

/// Platform window as described by the host.
///
/// | type    | `window_handle` | `second_handle`        |
/// |---------|-----------------|------------------------|
/// | Win32   | `HWND`          | `HINSTANCE` (optional) |
/// | Xlib    | `Window` XID    | `Display*` (optional)  |
/// | Wayland | `wl_surface*`   | `wl_display*`          |
/// | AppKit  | `NSView*`       | unused                 |
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WindowInfo {
    pub window_type: u32,
    pub window_handle: *mut c_void,
    pub second_handle: *mut c_void,
    pub width: u32,
    pub height: u32,
}

impl WindowInfo {
    /// Builds the ABI form from raw-window-handle values, e.g. from a winit window.
    pub fn from_raw_handles(
        window: RawWindowHandle,
        display: RawDisplayHandle,
        width: u32,
        height: u32,
    ) -> KelpResult<Self> {
        let (window_type, window_handle, second_handle) = match (window, display) {
            (RawWindowHandle::Win32(w), _) => (
                WindowType::Win32,
                w.hwnd.get() as *mut c_void,
                w.hinstance.map_or(ptr::null_mut(), |h| h.get() as *mut c_void),
            ),
            (RawWindowHandle::Xlib(w), RawDisplayHandle::Xlib(d)) => (
                WindowType::Xlib,
                w.window as usize as *mut c_void,
                d.display.map_or(ptr::null_mut(), NonNull::as_ptr),
            ),
            (RawWindowHandle::Wayland(w), RawDisplayHandle::Wayland(d)) => {
                (WindowType::Wayland, w.surface.as_ptr(), d.display.as_ptr())
            }
            (RawWindowHandle::AppKit(w), _) => (WindowType::AppKit, w.ns_view.as_ptr(), ptr::null_mut()),
            (other, _) => {
                return Err(KelpError::invalid_input(format!("unsupported window handle {other:?}")))
            }
        };
        Ok(Self {
            window_type: window_type as u32,
            window_handle,
            second_handle,
            width,
            height,
        })
    }

    pub fn native(&self) -> KelpResult<NativeWindow> {
        NativeWindow::try_from(self)
    }
}

/// Validated window handle, one variant per supported platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeWindow {
    Win32 {
        hwnd: NonZeroIsize,
        hinstance: Option<NonZeroIsize>,
    },
    Xlib {
        window: c_ulong,
        display: Option<NonNull<c_void>>,
    },
    Wayland {
        surface: NonNull<c_void>,
        display: NonNull<c_void>,
    },
    AppKit {
        ns_view: NonNull<c_void>,
    },
}

impl TryFrom<&WindowInfo> for NativeWindow {
    type Error = KelpError;

    fn try_from(info: &WindowInfo) -> KelpResult<Self> {
        let window_type = WindowType::try_from(info.window_type)?;
        let primary = NonNull::new(info.window_handle).ok_or(KelpError::Null("window handle"))?;
        let secondary = NonNull::new(info.second_handle);
        Ok(match window_type {
            WindowType::Win32 => NativeWindow::Win32 {
                hwnd: NonZeroIsize::new(primary.as_ptr() as isize).ok_or(KelpError::Null("hwnd"))?,
                hinstance: secondary.and_then(|h| NonZeroIsize::new(h.as_ptr() as isize)),
            },
            WindowType::Xlib => NativeWindow::Xlib {
                window: primary.as_ptr() as usize as c_ulong,
                display: secondary,
            },
            WindowType::Wayland => NativeWindow::Wayland {
                surface: primary,
                display: secondary.ok_or(KelpError::Null("wayland display"))?,
            },
            WindowType::AppKit => NativeWindow::AppKit { ns_view: primary },
        })
    }
}

impl NativeWindow {
    pub fn window_type(&self) -> WindowType {
        match self {
            NativeWindow::Win32 { .. } => WindowType::Win32,
            NativeWindow::Xlib { .. } => WindowType::Xlib,
            NativeWindow::Wayland { .. } => WindowType::Wayland,
            NativeWindow::AppKit { .. } => WindowType::AppKit,
        }
    }

    pub fn raw_handles(&self) -> (RawDisplayHandle, RawWindowHandle) {
        match *self {
            NativeWindow::Win32 { hwnd, hinstance } => {
                let mut handle = Win32WindowHandle::new(hwnd);
                handle.hinstance = hinstance;
                (
                    RawDisplayHandle::Windows(WindowsDisplayHandle::new()),
                    RawWindowHandle::Win32(handle),
                )
            }
            NativeWindow::Xlib { window, display } => (
                RawDisplayHandle::Xlib(XlibDisplayHandle::new(display, 0)),
                RawWindowHandle::Xlib(XlibWindowHandle::new(window)),
            ),
            NativeWindow::Wayland { surface, display } => (
                RawDisplayHandle::Wayland(WaylandDisplayHandle::new(display)),
                RawWindowHandle::Wayland(WaylandWindowHandle::new(surface)),
            ),
            NativeWindow::AppKit { ns_view } => (
                RawDisplayHandle::AppKit(AppKitDisplayHandle::new()),
                RawWindowHandle::AppKit(AppKitWindowHandle::new(ns_view)),
            ),
        }
    }
}
