//! Browser bindings (wasm32)

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, Window,
};

use crate::backdrop::Backdrop;
use crate::error::SurfaceError;
use crate::nav_cue::NavCue;
use crate::renderer::color::Rgba;
use crate::reveal::{Rect, RevealObserver, TargetId};
use crate::scheduler::{FrameHost, FrameRequestId};
use crate::settings::FieldSettings;
use crate::surface::{DrawContext, SurfaceBackend, Transform, ViewportMetrics};

/// Attribute marking blocks for scroll reveal
pub const REVEAL_SELECTOR: &str = "[data-animate]";
/// Class applied once a block is revealed
pub const REVEALED_CLASS: &str = "in-view";
/// Nav links cycled by the attention cue
pub const NAV_LINK_IDS: [&str; 2] = ["len1", "len2"];
pub const NAV_CUE_CLASS: &str = "bounce";

const REVEAL_ID_ATTR: &str = "data-reveal-id";

fn window() -> Result<Window, SurfaceError> {
    web_sys::window().ok_or(SurfaceError::NoWindow)
}

fn document() -> Result<Document, SurfaceError> {
    window()?.document().ok_or(SurfaceError::NoDocument)
}

fn dom_err(e: JsValue) -> SurfaceError {
    SurfaceError::Dom(format!("{:?}", e))
}

/// Current viewport size and raw device pixel ratio
pub fn viewport_metrics(window: &Window) -> ViewportMetrics {
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    ViewportMetrics::new(
        width as f32,
        height as f32,
        window.device_pixel_ratio() as f32,
    )
}

// === Surface ===

/// Full-viewport `<canvas>` appended to `<body>`
#[derive(Default)]
pub struct CanvasBackdrop {
    canvas: Option<HtmlCanvasElement>,
}

impl CanvasBackdrop {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurfaceBackend for CanvasBackdrop {
    type Context = Canvas2d;

    fn attach(&mut self) -> Result<Canvas2d, SurfaceError> {
        let document = document()?;
        let body = document.body().ok_or(SurfaceError::NoDocument)?;

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(dom_err)?
            .dyn_into()
            .map_err(|_| SurfaceError::Dom("created element is not a canvas".into()))?;

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(dom_err)?
            .ok_or(SurfaceError::ContextUnavailable)?
            .dyn_into()
            .map_err(|_| SurfaceError::ContextUnavailable)?;

        // Out of flow, behind everything, never takes pointer input
        let style = canvas.style();
        for (prop, value) in [
            ("position", "fixed"),
            ("inset", "0"),
            ("width", "100vw"),
            ("height", "100vh"),
            ("z-index", "-1"),
            ("pointer-events", "none"),
        ] {
            style.set_property(prop, value).map_err(dom_err)?;
        }

        body.append_child(&canvas).map_err(dom_err)?;
        self.canvas = Some(canvas.clone());
        Ok(Canvas2d { canvas, ctx })
    }

    fn detach(&mut self) {
        if let Some(canvas) = self.canvas.take() {
            canvas.remove();
        }
    }
}

/// `CanvasRenderingContext2d` behind the [`DrawContext`] seam
pub struct Canvas2d {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl DrawContext for Canvas2d {
    fn resize_buffer(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn set_transform(&mut self, transform: Transform) {
        let s = f64::from(transform.scale);
        let _ = self.ctx.set_transform(s, 0.0, 0.0, s, 0.0, 0.0);
    }

    fn clear(&mut self) {
        self.ctx.save();
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
        self.ctx.restore();
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(f64::from(width));
        self.ctx.begin_path();
        self.ctx.move_to(f64::from(from.x), f64::from(from.y));
        self.ctx.line_to(f64::from(to.x), f64::from(to.y));
        self.ctx.stroke();
    }

    fn fill_radial(&mut self, center: Vec2, radius: f32, inner: Rgba, outer: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let (x, y, r) = (f64::from(center.x), f64::from(center.y), f64::from(radius));
        let Ok(gradient) = self.ctx.create_radial_gradient(x, y, 0.0, x, y, r) else {
            return;
        };
        let _ = gradient.add_color_stop(0.0, &inner.to_css());
        let _ = gradient.add_color_stop(1.0, &outer.to_css());
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.begin_path();
        if self.ctx.arc(x, y, r, 0.0, std::f64::consts::TAU).is_ok() {
            self.ctx.fill();
        }
    }
}

// === Frame host ===

type FrameCallback = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame` with one shared callback
pub struct RafHost {
    window: Window,
    callback: Rc<RefCell<Option<FrameCallback>>>,
}

impl RafHost {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            callback: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set_callback(&self, callback: FrameCallback) {
        *self.callback.borrow_mut() = Some(callback);
    }

    /// Drop the callback, breaking the closure -> state -> host cycle
    pub fn clear_callback(&self) {
        self.callback.borrow_mut().take();
    }
}

impl FrameHost for RafHost {
    fn request_frame(&mut self) -> FrameRequestId {
        let callback = self.callback.borrow();
        let Some(cb) = callback.as_ref() else {
            log::warn!("Frame requested with no callback installed");
            return FrameRequestId(0);
        };
        match self
            .window
            .request_animation_frame(cb.as_ref().unchecked_ref())
        {
            Ok(id) => FrameRequestId(id),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {:?}", e);
                FrameRequestId(0)
            }
        }
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        let _ = self.window.cancel_animation_frame(id.0);
    }
}

// === About page backdrop ===

struct PageState {
    backdrop: Option<Backdrop<CanvasBackdrop>>,
    host: RafHost,
}

type EventCallback = Closure<dyn FnMut(web_sys::Event)>;

/// Mounted about-page backdrop. Call [`unmount`](Self::unmount) when the page
/// goes away.
pub struct AboutPage {
    window: Window,
    document: Document,
    state: Rc<RefCell<PageState>>,
    on_resize: EventCallback,
    on_visibility: EventCallback,
    reveal: Option<RevealBinding>,
}

impl AboutPage {
    /// Mount the canvas backdrop, its listeners and the scroll reveal.
    ///
    /// A missing 2D context leaves the page without animation but still
    /// returns a handle.
    pub fn mount(settings: FieldSettings) -> Result<Self, SurfaceError> {
        let window = window()?;
        let document = window.document().ok_or(SurfaceError::NoDocument)?;
        let metrics = viewport_metrics(&window);
        let seed = js_sys::Date::now() as u64;
        let reveal_threshold = settings.reveal_threshold;

        let state = Rc::new(RefCell::new(PageState {
            backdrop: None,
            host: RafHost::new(window.clone()),
        }));

        // Listeners go in before the frame loop exists, so a failed
        // registration leaves nothing running
        let on_resize = {
            let state = state.clone();
            let window_for_resize = window.clone();
            Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let metrics = viewport_metrics(&window_for_resize);
                if let Some(backdrop) = state.borrow_mut().backdrop.as_mut() {
                    backdrop.on_resize(metrics);
                }
            })
        };
        window
            .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
            .map_err(dom_err)?;

        let on_visibility = {
            let state = state.clone();
            let document_for_visibility = document.clone();
            Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let visible =
                    document_for_visibility.visibility_state() == web_sys::VisibilityState::Visible;
                if let Some(backdrop) = state.borrow_mut().backdrop.as_mut() {
                    backdrop.set_visible(visible);
                }
            })
        };
        if let Err(e) = document.add_event_listener_with_callback(
            "visibilitychange",
            on_visibility.as_ref().unchecked_ref(),
        ) {
            let _ = window.remove_event_listener_with_callback(
                "resize",
                on_resize.as_ref().unchecked_ref(),
            );
            return Err(dom_err(e));
        }

        {
            let state_for_frame = state.clone();
            let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
                let mut s = state_for_frame.borrow_mut();
                let PageState { backdrop, host } = &mut *s;
                // Unmounted between request and fire: do nothing, reschedule nothing
                if let Some(backdrop) = backdrop {
                    let now = Duration::from_secs_f64(timestamp.max(0.0) / 1000.0);
                    backdrop.on_frame(host, now);
                }
            });
            state.borrow().host.set_callback(callback);
        }

        {
            let mut s = state.borrow_mut();
            let backdrop = Backdrop::mount(CanvasBackdrop::new(), metrics, settings, seed, &mut s.host);
            s.backdrop = Some(backdrop);
        }

        let reveal = match RevealBinding::bind(&document, reveal_threshold) {
            Ok(binding) => Some(binding),
            Err(e) => {
                log::warn!("Scroll reveal disabled: {}", e);
                None
            }
        };

        log::info!("About page mounted");
        Ok(Self {
            window,
            document,
            state,
            on_resize,
            on_visibility,
            reveal,
        })
    }

    /// Stop the frame loop, drop listeners and observers, remove the canvas
    pub fn unmount(self) {
        let _ = self.window.remove_event_listener_with_callback(
            "resize",
            self.on_resize.as_ref().unchecked_ref(),
        );
        let _ = self.document.remove_event_listener_with_callback(
            "visibilitychange",
            self.on_visibility.as_ref().unchecked_ref(),
        );
        if let Some(reveal) = self.reveal {
            reveal.unbind();
        }

        let mut s = self.state.borrow_mut();
        let PageState { backdrop, host } = &mut *s;
        if let Some(backdrop) = backdrop.take() {
            backdrop.unmount(host);
        }
        host.clear_callback();
        log::info!("About page unmounted");
    }
}

// === Scroll reveal ===

/// IntersectionObserver over every `[data-animate]` block
pub struct RevealBinding {
    io: IntersectionObserver,
    observer: Rc<RefCell<RevealObserver>>,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl RevealBinding {
    pub fn bind(document: &Document, threshold: f32) -> Result<Self, SurfaceError> {
        let observer = Rc::new(RefCell::new(RevealObserver::new(threshold)));

        let callback = {
            let observer = observer.clone();
            Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
                move |entries: js_sys::Array, io: IntersectionObserver| {
                    for entry in entries.iter() {
                        let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                            continue;
                        };
                        let target = entry.target();
                        let Some(id) = target
                            .get_attribute(REVEAL_ID_ATTR)
                            .and_then(|v| v.parse::<usize>().ok())
                        else {
                            continue;
                        };
                        let ratio = entry.intersection_ratio() as f32;
                        if observer.borrow_mut().on_intersection(TargetId(id), ratio) {
                            let _ = target.class_list().add_1(REVEALED_CLASS);
                            io.unobserve(&target);
                        }
                    }
                },
            )
        };

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(f64::from(threshold)));
        let io = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
            .map_err(dom_err)?;

        let nodes = document
            .query_selector_all(REVEAL_SELECTOR)
            .map_err(dom_err)?;
        for i in 0..nodes.length() {
            let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            // Layout rects are not needed on this path; the browser reports ratios
            let id = observer.borrow_mut().observe(Rect::new(0.0, 0.0, 0.0, 0.0));
            element
                .set_attribute(REVEAL_ID_ATTR, &id.0.to_string())
                .map_err(dom_err)?;
            io.observe(&element);
        }
        log::debug!("Observing {} reveal targets", observer.borrow().len());

        Ok(Self {
            io,
            observer,
            _callback: callback,
        })
    }

    pub fn unbind(self) {
        self.io.disconnect();
        self.observer.borrow_mut().disconnect();
    }
}

// === Nav cue ===

/// Interval timer bouncing the nav links
pub struct NavCueBinding {
    window: Window,
    interval_id: i32,
    cue: Rc<RefCell<NavCue>>,
    _tick: Closure<dyn FnMut()>,
}

impl NavCueBinding {
    pub fn bind(cue: NavCue) -> Result<Self, SurfaceError> {
        let window = window()?;
        let document = window.document().ok_or(SurfaceError::NoDocument)?;
        let links: Vec<Option<Element>> = NAV_LINK_IDS
            .iter()
            .map(|id| document.get_element_by_id(id))
            .collect();
        let interval = cue.interval().as_millis() as i32;
        let hold = cue.hold().as_millis() as i32;
        let cue = Rc::new(RefCell::new(cue));

        let tick = {
            let cue = cue.clone();
            let window = window.clone();
            Closure::<dyn FnMut()>::new(move || {
                let Some(idx) = cue.borrow_mut().next_link() else {
                    return;
                };
                let Some(Some(el)) = links.get(idx) else {
                    return;
                };
                let _ = el.class_list().add_1(NAV_CUE_CLASS);
                let el = el.clone();
                let clear = Closure::once_into_js(move || {
                    let _ = el.class_list().remove_1(NAV_CUE_CLASS);
                });
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    clear.unchecked_ref(),
                    hold,
                );
            })
        };

        let interval_id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                interval,
            )
            .map_err(dom_err)?;

        Ok(Self {
            window,
            interval_id,
            cue,
            _tick: tick,
        })
    }

    pub fn unbind(self) {
        self.cue.borrow_mut().cancel();
        self.window.clear_interval_with_handle(self.interval_id);
    }
}
