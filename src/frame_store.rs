use std::{
    cell::{OnceCell, RefCell},
    rc::{Rc, Weak},
};

use js_sys::Math;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, HtmlCanvasElement, HtmlImageElement};

use crate::{
    frame_slots::{FrameSlots, LoadProgress, SharedSubstitute},
    frontend::{console_event, ConsoleLevel},
    sequence::SequenceConfig,
};

const PLACEHOLDER_WIDTH: u32 = 1280;
const PLACEHOLDER_HEIGHT: u32 = 720;
const PLACEHOLDER_DOTS: u32 = 90;

/// Generated stand-in for frames that failed to load. Its data URL is only
/// encoded when a background target first asks for it.
pub struct Placeholder {
    canvas: HtmlCanvasElement,
    data_url: OnceCell<String>,
}

impl Placeholder {
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn data_url(&self) -> Option<String> {
        if let Some(url) = self.data_url.get() {
            return Some(url.clone());
        }

        let url = self.canvas.to_data_url().ok()?;
        Some(self.data_url.get_or_init(|| url).clone())
    }
}

#[derive(Clone)]
pub enum FrameAsset {
    Image(HtmlImageElement),
    Placeholder(Rc<Placeholder>),
}

impl FrameAsset {
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            Self::Image(image) => (
                f64::from(image.natural_width()),
                f64::from(image.natural_height()),
            ),
            Self::Placeholder(placeholder) => (
                f64::from(placeholder.canvas.width()),
                f64::from(placeholder.canvas.height()),
            ),
        }
    }

    /// Value usable inside a CSS `url(...)`.
    pub fn css_source(&self) -> Option<String> {
        match self {
            Self::Image(image) => Some(image.src()),
            Self::Placeholder(placeholder) => placeholder.data_url(),
        }
    }
}

/// Called with the index of every frame that became renderable.
pub type FrameReady = Rc<dyn Fn(u32)>;

/// Keeps the load callbacks alive for as long as the store exists; they are
/// never dropped while the browser may still invoke them.
struct PendingLoad {
    image: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

pub struct FrameStore {
    slots: FrameSlots<FrameAsset>,
    placeholder_on_error: bool,
    placeholder: SharedSubstitute<Placeholder>,
    pending: Vec<PendingLoad>,
}

impl FrameStore {
    pub fn new(config: &SequenceConfig) -> Self {
        Self {
            slots: FrameSlots::new(config.frame_count),
            placeholder_on_error: config.placeholder_on_error,
            placeholder: SharedSubstitute::default(),
            pending: Vec::new(),
        }
    }

    pub fn get(&self, index: u32) -> Option<FrameAsset> {
        self.slots.get(index).cloned()
    }

    pub fn progress(&self) -> LoadProgress {
        self.slots.progress()
    }

    /// Starts loading every frame. Frames the server already reported missing
    /// are settled as failures without a request.
    pub fn load(
        store: &Rc<RefCell<Self>>,
        config: &SequenceConfig,
        known_missing: &[u32],
        on_ready: FrameReady,
    ) {
        let mut ready_now = Vec::new();

        for (index, path) in config.frame_paths() {
            if known_missing.contains(&index) {
                if store.borrow_mut().settle_failure(index, &path) {
                    ready_now.push(index);
                }
                continue;
            }

            match start_image_load(Rc::downgrade(store), index, path.clone(), on_ready.clone()) {
                Ok(pending) => store.borrow_mut().pending.push(pending),
                Err(_) => {
                    if store.borrow_mut().settle_failure(index, &path) {
                        ready_now.push(index);
                    }
                }
            }
        }

        if !known_missing.is_empty() {
            console_event(
                ConsoleLevel::Info,
                "frame_known_missing",
                serde_json::json!({ "count": known_missing.len() }),
            );
        }

        for index in ready_now {
            on_ready(index);
        }
    }

    fn settle_success(&mut self, index: u32, image: HtmlImageElement) {
        image.set_onload(None);
        image.set_onerror(None);
        self.slots.mark_loaded(index, FrameAsset::Image(image));
    }

    /// Returns whether the slot ended up renderable.
    fn settle_failure(&mut self, index: u32, path: &str) -> bool {
        console_event(
            ConsoleLevel::Warn,
            "frame_load_failed",
            serde_json::json!({ "frame": index, "path": path }),
        );

        let substitute = if self.placeholder_on_error {
            self.placeholder
                .get_or_build(|| match generate_placeholder() {
                    Ok(placeholder) => Some(placeholder),
                    Err(error) => {
                        console_event(
                            ConsoleLevel::Warn,
                            "frame_placeholder_failed",
                            serde_json::json!({
                                "frame": index,
                                "error": format!("{error:?}"),
                            }),
                        );
                        None
                    }
                })
                .map(FrameAsset::Placeholder)
        } else {
            None
        };

        let renderable = substitute.is_some();
        self.slots.mark_failed(index, substitute);
        renderable
    }
}

impl Drop for FrameStore {
    fn drop(&mut self) {
        for pending in &self.pending {
            pending.image.set_onload(None);
            pending.image.set_onerror(None);
        }
    }
}

fn start_image_load(
    store: Weak<RefCell<FrameStore>>,
    index: u32,
    path: String,
    on_ready: FrameReady,
) -> Result<PendingLoad, JsValue> {
    let image = HtmlImageElement::new()?;

    let onload = {
        let store = store.clone();
        let image = image.clone();
        let on_ready = on_ready.clone();
        Closure::<dyn FnMut()>::new(move || {
            let Some(store) = store.upgrade() else {
                return;
            };
            store.borrow_mut().settle_success(index, image.clone());
            on_ready(index);
        })
    };

    let onerror = {
        let path = path.clone();
        Closure::<dyn FnMut()>::new(move || {
            let Some(store) = store.upgrade() else {
                return;
            };
            let renderable = store.borrow_mut().settle_failure(index, &path);
            if renderable {
                on_ready(index);
            }
        })
    };

    image.set_onload(Some(onload.as_ref().unchecked_ref()));
    image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    image.set_src(&path);

    Ok(PendingLoad {
        image,
        _onload: onload,
        _onerror: onerror,
    })
}

/// Dark gradient with a scatter of translucent dots. Drawn once per store and
/// shared by every failed frame.
fn generate_placeholder() -> Result<Placeholder, JsValue> {
    let document = window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document unavailable"))?;
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_width(PLACEHOLDER_WIDTH);
    canvas.set_height(PLACEHOLDER_HEIGHT);

    let context = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<web_sys::CanvasRenderingContext2d>()?;

    let width = f64::from(PLACEHOLDER_WIDTH);
    let height = f64::from(PLACEHOLDER_HEIGHT);

    let gradient = context.create_linear_gradient(0.0, 0.0, width, height);
    gradient.add_color_stop(0.0, "#0f172a")?;
    gradient.add_color_stop(1.0, "#334155")?;
    context.set_fill_style_canvas_gradient(&gradient);
    context.fill_rect(0.0, 0.0, width, height);

    context.set_fill_style_str("rgba(148, 163, 184, 0.35)");
    for _ in 0..PLACEHOLDER_DOTS {
        let radius = 1.0 + Math::random() * 3.0;
        context.begin_path();
        context.arc(
            Math::random() * width,
            Math::random() * height,
            radius,
            0.0,
            std::f64::consts::TAU,
        )?;
        context.fill();
    }

    Ok(Placeholder {
        canvas,
        data_url: OnceCell::new(),
    })
}
