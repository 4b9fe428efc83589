//! Neural backdrop entry point
//!
//! On the web this mounts the about-page backdrop, the scroll reveal and the
//! nav cue. Natively it runs the same loop headless and logs what it drew.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use std::cell::RefCell;

    use neural_backdrop::nav_cue::NavCue;
    use neural_backdrop::platform::web::{AboutPage, NAV_LINK_IDS, NavCueBinding};
    use neural_backdrop::settings::{DensityPreset, FieldSettings};

    #[derive(Default)]
    struct Mounted {
        about: Option<AboutPage>,
        nav_cue: Option<NavCueBinding>,
    }

    thread_local! {
        static MOUNTED: RefCell<Mounted> = RefCell::new(Mounted::default());
    }

    pub fn run() {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document; nothing to mount");
            return;
        };

        let about = match document.query_selector(".about-page") {
            Ok(Some(_)) => match AboutPage::mount(FieldSettings::load()) {
                Ok(page) => Some(page),
                Err(e) => {
                    log::warn!("About page backdrop unavailable: {}", e);
                    None
                }
            },
            _ => None,
        };

        let nav_cue = if document.get_element_by_id(NAV_LINK_IDS[0]).is_some() {
            match NavCueBinding::bind(NavCue::default()) {
                Ok(binding) => Some(binding),
                Err(e) => {
                    log::warn!("Nav cue unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        MOUNTED.with(|m| {
            let mut m = m.borrow_mut();
            m.about = about;
            m.nav_cue = nav_cue;
        });
    }

    /// Store a density preset; it applies from the next mount
    pub fn set_density(name: &str) -> bool {
        let Some(preset) = DensityPreset::from_str(name) else {
            log::warn!("Unknown density preset: {}", name);
            return false;
        };
        let mut settings = FieldSettings::load();
        settings.apply_preset(preset);
        settings.save();
        true
    }

    pub fn unmount() {
        MOUNTED.with(|m| {
            let mut m = m.borrow_mut();
            if let Some(about) = m.about.take() {
                about.unmount();
            }
            if let Some(cue) = m.nav_cue.take() {
                cue.unbind();
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Neural backdrop starting");
    wasm_page::run();
}

/// Tear down everything mounted by `wasm_main`
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn unmount() {
    wasm_page::unmount();
}

/// Persist a density preset ("sparse", "standard" or "dense")
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn set_density(name: &str) -> bool {
    wasm_page::set_density(name)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let frames: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(120);
    log::info!("Neural backdrop (native) running {} headless frames", frames);

    if let Err(e) = headless::run(frames) {
        log::error!("Headless run failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::Duration;

    use neural_backdrop::backdrop::Backdrop;
    use neural_backdrop::scheduler::ManualFrameHost;
    use neural_backdrop::settings::FieldSettings;
    use neural_backdrop::surface::{HeadlessBackend, ViewportMetrics};
    use neural_backdrop::{ConfigError, SurfaceError};

    #[derive(Debug)]
    pub enum RunError {
        Config(ConfigError),
        Surface(SurfaceError),
    }

    impl std::fmt::Display for RunError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                RunError::Config(e) => write!(f, "{}", e),
                RunError::Surface(e) => write!(f, "{}", e),
            }
        }
    }

    impl From<ConfigError> for RunError {
        fn from(e: ConfigError) -> Self {
            RunError::Config(e)
        }
    }

    pub fn run(frames: u64) -> Result<(), RunError> {
        let settings = FieldSettings::load();
        settings.validate()?;

        let backend = HeadlessBackend::new();
        let recording = backend.recording();
        let mut host = ManualFrameHost::new();
        let metrics = ViewportMetrics::new(1280.0, 720.0, 2.0);
        let frame_interval = Duration::from_secs_f64(1.0 / 60.0);

        let mut backdrop = Backdrop::mount(backend, metrics, settings, 0x5eed, &mut host);
        if backdrop.is_degraded() {
            return Err(RunError::Surface(SurfaceError::ContextUnavailable));
        }

        let mut now = Duration::ZERO;
        for frame in 0..frames {
            if !host.fire() {
                break;
            }
            // Halfway through, pretend the window was resized
            if frame == frames / 2 {
                backdrop.on_resize(ViewportMetrics::new(1920.0, 1080.0, 1.5));
            }
            if let Some(stats) = backdrop.on_frame(&mut host, now) {
                log::trace!("frame {}: {} edges, {} glyphs", frame, stats.edges, stats.glyphs);
            }
            now += frame_interval;
        }

        log::info!(
            "Drew {} frames, {} draw calls, last frame {} edges / {} glyphs, buffer {:?}",
            backdrop.frames,
            recording.draw_calls(),
            backdrop.last_stats.edges,
            backdrop.last_stats.glyphs,
            recording.buffer_size()
        );
        backdrop.unmount(&mut host);
        Ok(())
    }
}
