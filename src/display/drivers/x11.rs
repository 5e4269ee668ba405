//! Minimal X11 DisplayDriver implementation using Xlib.
//!
//! Features:
//! - One top-level window, resizable
//! - Structure/expose/close events
//! - Framebuffer presentation via XPutImage (24-bit TrueColor, BGRX)

use crate::display::driver::DisplayDriver;
use crate::display::messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
use anyhow::{Context, Result};
use log::{debug, info, trace};
use std::ffi::CString;
use std::ptr;
use x11::xlib::*;

/// Size used until `Init` provides the configured one.
const PLACEHOLDER_SIZE_PX: u32 = 1;

pub struct X11DisplayDriver {
    display: *mut Display,
    window: Window,
    gc: GC,
    visual: *mut Visual,
    depth: u32,
    wm_delete_window: Atom,
    width_px: u32,
    height_px: u32,
}

impl DisplayDriver for X11DisplayDriver {
    fn new() -> Result<Self> {
        info!("X11DisplayDriver::new() - Opening X11 display");

        unsafe {
            let display = XOpenDisplay(ptr::null());
            if display.is_null() {
                return Err(anyhow::anyhow!("Failed to open X11 display. Is DISPLAY set?"));
            }

            let screen = XDefaultScreen(display);
            let root = XRootWindow(display, screen);
            let visual = XDefaultVisual(display, screen);
            let depth = XDefaultDepth(display, screen) as u32;

            let window = XCreateSimpleWindow(
                display,
                root,
                0,
                0,
                PLACEHOLDER_SIZE_PX,
                PLACEHOLDER_SIZE_PX,
                0,
                XBlackPixel(display, screen),
                XBlackPixel(display, screen),
            );
            if window == 0 {
                XCloseDisplay(display);
                return Err(anyhow::anyhow!("Failed to create X11 window"));
            }

            XSelectInput(display, window, ExposureMask | StructureNotifyMask);

            let gc = XCreateGC(display, window, 0, ptr::null_mut());

            let mut wm_delete_window =
                XInternAtom(display, c"WM_DELETE_WINDOW".as_ptr(), False);
            XSetWMProtocols(display, window, &mut wm_delete_window, 1);

            Ok(Self {
                display,
                window,
                gc,
                visual,
                depth,
                wm_delete_window,
                width_px: PLACEHOLDER_SIZE_PX,
                height_px: PLACEHOLDER_SIZE_PX,
            })
        }
    }

    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError> {
        match request {
            DriverRequest::Init(config) => Ok(self.handle_init(config)?),
            DriverRequest::PollEvents => Ok(self.handle_poll_events()),
            DriverRequest::Present(snapshot) => self.handle_present(snapshot),
            DriverRequest::SetTitle(title) => Ok(self.handle_set_title(&title)?),
        }
    }
}

impl X11DisplayDriver {
    fn handle_init(&mut self, config: DriverConfig) -> Result<DriverResponse> {
        self.width_px = config.width_px.max(1);
        self.height_px = config.height_px.max(1);
        self.handle_set_title(&config.title)?;

        unsafe {
            XResizeWindow(self.display, self.window, self.width_px, self.height_px);
            XMapWindow(self.display, self.window);
            XFlush(self.display);
        }

        info!(
            "X11DisplayDriver: Initialized {}x{} px (depth {})",
            self.width_px, self.height_px, self.depth
        );

        Ok(DriverResponse::InitComplete {
            width_px: self.width_px,
            height_px: self.height_px,
        })
    }

    fn handle_poll_events(&mut self) -> DriverResponse {
        let mut events = Vec::new();

        unsafe {
            while XPending(self.display) > 0 {
                let mut event: XEvent = std::mem::zeroed();
                XNextEvent(self.display, &mut event);

                if let Some(display_event) = self.convert_event(&event) {
                    events.push(display_event);
                }
            }
        }

        DriverResponse::Events(events)
    }

    fn convert_event(&mut self, event: &XEvent) -> Option<DisplayEvent> {
        unsafe {
            match event.get_type() {
                ConfigureNotify => {
                    let width_px = event.configure.width.max(1) as u32;
                    let height_px = event.configure.height.max(1) as u32;
                    if (width_px, height_px) == (self.width_px, self.height_px) {
                        return None;
                    }
                    debug!("X11DisplayDriver: Resized to {}x{}", width_px, height_px);
                    self.width_px = width_px;
                    self.height_px = height_px;
                    Some(DisplayEvent::Resize {
                        width_px,
                        height_px,
                    })
                }
                // Only the last expose of a series needs a redraw.
                Expose if event.expose.count == 0 => Some(DisplayEvent::Exposed),
                ClientMessage => {
                    let atom = event.client_message.data.get_long(0) as Atom;
                    (atom == self.wm_delete_window).then_some(DisplayEvent::CloseRequested)
                }
                _ => None,
            }
        }
    }

    fn handle_present(
        &mut self,
        snapshot: RenderSnapshot,
    ) -> std::result::Result<DriverResponse, DisplayError> {
        trace!(
            "X11DisplayDriver: Presenting {}x{}",
            snapshot.width_px,
            snapshot.height_px
        );

        unsafe {
            let image = XCreateImage(
                self.display,
                self.visual,
                self.depth,
                ZPixmap,
                0,
                snapshot.framebuffer.as_ptr() as *mut std::os::raw::c_char,
                snapshot.width_px,
                snapshot.height_px,
                32, // bitmap_pad
                0,  // bytes_per_line (auto-calculate)
            );

            if image.is_null() {
                return Err(DisplayError::PresentationFailed(
                    snapshot,
                    "Failed to create XImage".to_string(),
                ));
            }

            XPutImage(
                self.display,
                self.window,
                self.gc,
                image,
                0,
                0,
                0,
                0,
                snapshot.width_px,
                snapshot.height_px,
            );

            // The framebuffer stays ours; detach it before destroying the image.
            (*image).data = ptr::null_mut();
            XDestroyImage(image);

            XFlush(self.display);
        }

        Ok(DriverResponse::PresentComplete(snapshot))
    }

    fn handle_set_title(&mut self, title: &str) -> Result<DriverResponse> {
        let c_title = CString::new(title).context("Window title contains a NUL byte")?;
        unsafe {
            XStoreName(self.display, self.window, c_title.as_ptr());
            XFlush(self.display);
        }
        Ok(DriverResponse::TitleSet)
    }
}

impl Drop for X11DisplayDriver {
    fn drop(&mut self) {
        info!("X11DisplayDriver::drop() - Cleaning up");
        unsafe {
            if !self.gc.is_null() {
                XFreeGC(self.display, self.gc);
            }
            if self.window != 0 {
                XDestroyWindow(self.display, self.window);
            }
            if !self.display.is_null() {
                XCloseDisplay(self.display);
            }
        }
    }
}
