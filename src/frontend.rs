use gloo_net::http::Request;
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    window, Document, Element, Event, EventTarget, HtmlCanvasElement, HtmlElement,
    HtmlInputElement, HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry,
    KeyboardEvent, ScrollBehavior, ScrollToOptions, Window,
};
use yew::prelude::*;

use crate::{
    frame_slots::LoadProgress,
    frame_store::{FrameReady, FrameStore},
    page::{
        active_section, scroll_top_visible, section_scroll_target, skill_bar_width, ContactForm,
        SectionAnchors, HEADER_OFFSET,
    },
    playback::{frame_for_scroll, AnimationState, KeyCommand},
    render::Surface,
    sequence::{DrivingSignal, RenderTarget, SequenceConfig, SequenceResponse, SPEED_BOUNDS},
};

const SEQUENCE_ENDPOINT: &str = "/api/sequence";
const FALLBACK_VIEWPORT: (f64, f64) = (1280.0, 720.0);

static NAV_SECTIONS: [(&str, &str); 5] = [
    ("home", "Home"),
    ("about", "About"),
    ("projects", "Projects"),
    ("skills", "Skills"),
    ("contact", "Contact"),
];

static PROJECTS: [(&str, &str); 3] = [
    (
        "Frame Scrubber",
        "Scroll-driven image sequence playback on a 2D canvas.",
    ),
    (
        "Asset Auditor",
        "Server-side check that every numbered frame is actually deployed.",
    ),
    (
        "Motion Studies",
        "Timer-driven loops with keyboard speed control.",
    ),
];

static SKILLS: [(&str, u8); 5] = [
    ("Rust", 90),
    ("WebAssembly", 80),
    ("TypeScript", 75),
    ("Canvas & WebGL", 70),
    ("UI Motion", 65),
];

#[derive(Clone, Copy)]
pub enum ConsoleLevel {
    Info,
    Warn,
}

impl ConsoleLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }
}

/// One JSON line per event in the browser console.
pub fn console_event(level: ConsoleLevel, event: &str, fields: serde_json::Value) {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "level".to_string(),
        serde_json::Value::String(level.as_str().to_string()),
    );
    payload.insert("event".to_string(), serde_json::Value::String(event.to_string()));

    if let serde_json::Value::Object(extra) = fields {
        for (key, value) in extra {
            payload.insert(key, value);
        }
    }

    let line = JsValue::from_str(&serde_json::Value::Object(payload).to_string());
    match level {
        ConsoleLevel::Info => web_sys::console::info_1(&line),
        ConsoleLevel::Warn => web_sys::console::warn_1(&line),
    }
}

/// Removes its DOM listener when dropped.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn new(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;

        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            self.event,
            self.callback.as_ref().unchecked_ref(),
        );
    }
}

struct Interval {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Interval {
    fn new(interval_ms: u32, handler: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let win = window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
        let callback = Closure::<dyn FnMut()>::new(handler);
        let handle = win.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            i32::try_from(interval_ms).unwrap_or(i32::MAX),
        )?;

        Ok(Self {
            handle,
            _callback: callback,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(win) = window() {
            win.clear_interval_with_handle(self.handle);
        }
    }
}

struct Observer {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl Observer {
    fn new(
        elements: &[Element],
        mut handler: impl FnMut(IntersectionObserverEntry, &IntersectionObserver) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                        handler(entry, &observer);
                    }
                }
            },
        );
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;

        for element in elements {
            observer.observe(element);
        }

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn prefers_reduced_motion() -> bool {
    window()
        .and_then(|w| {
            w.match_media("(prefers-reduced-motion: reduce)")
                .ok()
                .flatten()
        })
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

fn viewport_size(win: &Window) -> (f64, f64) {
    let width = win
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(FALLBACK_VIEWPORT.0);
    let height = win
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(FALLBACK_VIEWPORT.1);

    (width, height)
}

fn scroll_y(win: &Window) -> f64 {
    win.scroll_y().unwrap_or(0.0)
}

fn scroll_window_to(top: f64) {
    let Some(win) = window() else {
        return;
    };

    let options = ScrollToOptions::new();
    options.set_top(top);
    options.set_behavior(if prefers_reduced_motion() {
        ScrollBehavior::Auto
    } else {
        ScrollBehavior::Smooth
    });
    win.scroll_to_with_scroll_to_options(&options);
}

type PageAnchors = SectionAnchors<Element>;

fn resolve_page_anchors(document: &Document) -> PageAnchors {
    SectionAnchors::resolve(NAV_SECTIONS.iter().map(|&(id, _)| id), |id| {
        document.get_element_by_id(id)
    })
}

fn viewport_top(element: &Element) -> f64 {
    element.get_bounding_client_rect().top()
}

fn is_typing_target(event: &KeyboardEvent) -> bool {
    event.target().is_some_and(|target| {
        target.dyn_ref::<HtmlInputElement>().is_some()
            || target.dyn_ref::<HtmlTextAreaElement>().is_some()
    })
}

async fn fetch_sequence() -> Option<SequenceResponse> {
    let response = Request::get(SEQUENCE_ENDPOINT).send().await.ok()?;
    if !response.ok() {
        return None;
    }

    let payload = response.json::<SequenceResponse>().await.ok()?;
    payload.ok.then_some(payload)
}

#[derive(Clone, PartialEq)]
struct PlayerSnapshot {
    frame: u32,
    frame_count: u32,
    playing: bool,
    speed: u8,
    progress: LoadProgress,
}

impl PlayerSnapshot {
    fn initial(config: &SequenceConfig) -> Self {
        Self {
            frame: 1,
            frame_count: config.frame_count,
            playing: false,
            speed: config.speed,
            progress: LoadProgress {
                total: config.frame_count,
                ..LoadProgress::default()
            },
        }
    }

    fn status_line(&self) -> String {
        let mut status = if self.progress.is_complete() {
            format!("Frame {} / {}", self.frame, self.frame_count)
        } else {
            format!(
                "Loading frames {} / {}",
                self.progress.settled(),
                self.progress.total
            )
        };

        if self.progress.failed > 0 {
            status.push_str(&format!(" · {} unavailable", self.progress.failed));
        }

        status
    }
}

/// Owns everything the hero sequence mutates. Only touched from UI-thread
/// callbacks through `Rc<RefCell<Player>>`.
struct Player {
    win: Window,
    scroll_root: Element,
    config: SequenceConfig,
    state: AnimationState,
    store: Rc<RefCell<FrameStore>>,
    surface: Surface,
    timer: Option<Interval>,
    timer_interval_ms: Option<u32>,
    redraw_pending: bool,
    on_change: Callback<PlayerSnapshot>,
}

impl Player {
    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            frame: self.state.frame(),
            frame_count: self.state.frame_count(),
            playing: self.state.is_playing(),
            speed: self.state.speed(),
            progress: self.store.borrow().progress(),
        }
    }

    /// Draws the current frame if it is available; absent frames are skipped.
    fn render_current(&self) {
        let frame = self.state.frame();
        let Some(asset) = self.store.borrow().get(frame) else {
            return;
        };

        if let Err(error) = self.surface.draw(&asset) {
            console_event(
                ConsoleLevel::Warn,
                "frame_draw_failed",
                serde_json::json!({ "frame": frame, "error": format!("{error:?}") }),
            );
        }
    }

    fn follow_scroll(&mut self) {
        let (_, viewport_height) = viewport_size(&self.win);
        let frame = frame_for_scroll(
            f64::from(self.scroll_root.scroll_top()),
            f64::from(self.scroll_root.scroll_height()),
            viewport_height,
            self.state.frame_count(),
        );
        self.state.seek(frame);
    }

    fn fit_viewport(&mut self) {
        let (width, height) = viewport_size(&self.win);
        self.surface.resize(width, height);
        if self.config.driving_signal == DrivingSignal::Scroll {
            self.follow_scroll();
        }
    }
}

fn notify(player: &Rc<RefCell<Player>>) {
    let (snapshot, on_change) = {
        let player = player.borrow();
        (player.snapshot(), player.on_change.clone())
    };
    on_change.emit(snapshot);
}

/// Coalesces redraws into the next animation frame; at most one is pending.
fn schedule_redraw(player: &Rc<RefCell<Player>>) {
    {
        let mut player = player.borrow_mut();
        if player.redraw_pending {
            return;
        }
        player.redraw_pending = true;
    }

    let weak = Rc::downgrade(player);
    let callback = Closure::once_into_js(move || {
        let Some(player) = weak.upgrade() else {
            return;
        };
        {
            let mut player = player.borrow_mut();
            player.redraw_pending = false;
            player.render_current();
        }
        notify(&player);
    });

    let requested = player
        .borrow()
        .win
        .request_animation_frame(callback.unchecked_ref());
    if requested.is_err() {
        {
            let mut player = player.borrow_mut();
            player.redraw_pending = false;
            player.render_current();
        }
        notify(player);
    }
}

/// Starts, stops, or restarts the playback interval so it matches the state.
fn sync_timer(player: &Rc<RefCell<Player>>) {
    let mut guard = player.borrow_mut();
    if guard.config.driving_signal != DrivingSignal::Timer {
        return;
    }

    let wanted = guard
        .state
        .should_tick()
        .then(|| guard.state.interval_ms());
    if wanted == guard.timer_interval_ms {
        return;
    }

    guard.timer = None;
    guard.timer_interval_ms = None;

    let Some(interval_ms) = wanted else {
        return;
    };

    let weak = Rc::downgrade(player);
    let interval = Interval::new(interval_ms, move || {
        let Some(player) = weak.upgrade() else {
            return;
        };
        {
            let mut player = player.borrow_mut();
            if !player.state.should_tick() {
                return;
            }
            player.state.advance();
            player.render_current();
        }
        notify(&player);
    });

    match interval {
        Ok(interval) => {
            guard.timer = Some(interval);
            guard.timer_interval_ms = Some(interval_ms);
        }
        Err(_) => console_event(
            ConsoleLevel::Warn,
            "timer_start_failed",
            serde_json::json!({ "interval_ms": interval_ms }),
        ),
    }
}

fn with_player(
    slot: &Rc<RefCell<Option<Rc<RefCell<Player>>>>>,
    action: impl FnOnce(&mut AnimationState),
) {
    let Some(player) = slot.borrow().clone() else {
        return;
    };

    action(&mut player.borrow_mut().state);
    sync_timer(&player);
    notify(&player);
}

/// Listeners and observers live exactly as long as this value.
struct HeroRuntime {
    player: Rc<RefCell<Player>>,
    _listeners: Vec<Listener>,
    _observer: Option<Observer>,
}

fn setup_hero(
    target: &NodeRef,
    config: &SequenceConfig,
    missing_frames: &[u32],
    on_change: Callback<PlayerSnapshot>,
) -> Result<HeroRuntime, JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let document = win
        .document()
        .ok_or_else(|| JsValue::from_str("document unavailable"))?;
    let scroll_root = document
        .document_element()
        .ok_or_else(|| JsValue::from_str("document element unavailable"))?;
    let element = target
        .cast::<Element>()
        .ok_or_else(|| JsValue::from_str("hero render target missing"))?;

    let surface = match config.render_target {
        RenderTarget::Canvas => {
            Surface::canvas(element.clone().dyn_into::<HtmlCanvasElement>()?)?
        }
        RenderTarget::Background => {
            Surface::background(element.clone().dyn_into::<HtmlElement>()?)?
        }
    };

    let mut state = AnimationState::from_config(config);
    if config.driving_signal == DrivingSignal::Timer {
        state.play();
        state.set_page_hidden(document.hidden());
    }

    let store = Rc::new(RefCell::new(FrameStore::new(config)));
    let player = Rc::new(RefCell::new(Player {
        win: win.clone(),
        scroll_root,
        config: config.clone(),
        state,
        store: store.clone(),
        surface,
        timer: None,
        timer_interval_ms: None,
        redraw_pending: false,
        on_change,
    }));

    player.borrow_mut().fit_viewport();

    let mut listeners = Vec::new();

    let weak = Rc::downgrade(&player);
    listeners.push(Listener::new(&win, "resize", move |_| {
        let Some(player) = weak.upgrade() else {
            return;
        };
        player.borrow_mut().fit_viewport();
        schedule_redraw(&player);
    })?);

    let observer = match config.driving_signal {
        DrivingSignal::Scroll => {
            let weak = Rc::downgrade(&player);
            listeners.push(Listener::new(&win, "scroll", move |_| {
                let Some(player) = weak.upgrade() else {
                    return;
                };
                player.borrow_mut().follow_scroll();
                schedule_redraw(&player);
            })?);
            None
        }
        DrivingSignal::Timer => {
            let weak = Rc::downgrade(&player);
            listeners.push(Listener::new(&win, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if is_typing_target(event) {
                    return;
                }
                let Some(command) = KeyCommand::from_key(&event.key()) else {
                    return;
                };
                event.prevent_default();

                let Some(player) = weak.upgrade() else {
                    return;
                };
                player.borrow_mut().state.apply(command);
                sync_timer(&player);
                notify(&player);
            })?);

            let weak = Rc::downgrade(&player);
            let visibility_document = document.clone();
            listeners.push(Listener::new(&document, "visibilitychange", move |_| {
                let Some(player) = weak.upgrade() else {
                    return;
                };
                player
                    .borrow_mut()
                    .state
                    .set_page_hidden(visibility_document.hidden());
                sync_timer(&player);
            })?);

            let weak = Rc::downgrade(&player);
            Some(Observer::new(&[element], move |entry, _| {
                let Some(player) = weak.upgrade() else {
                    return;
                };
                player
                    .borrow_mut()
                    .state
                    .set_offscreen(!entry.is_intersecting());
                sync_timer(&player);
            })?)
        }
    };

    let on_ready: FrameReady = {
        let weak = Rc::downgrade(&player);
        Rc::new(move |index| {
            let Some(player) = weak.upgrade() else {
                return;
            };
            if player.borrow().state.frame() == index {
                player.borrow().render_current();
            }
            notify(&player);
        })
    };
    FrameStore::load(&store, config, missing_frames, on_ready);

    sync_timer(&player);
    notify(&player);

    console_event(
        ConsoleLevel::Info,
        "hero_ready",
        serde_json::json!({
            "driving_signal": config.driving_signal.as_str(),
            "render_target": config.render_target.as_str(),
            "frame_count": config.frame_count,
        }),
    );

    Ok(HeroRuntime {
        player,
        _listeners: listeners,
        _observer: observer,
    })
}

#[derive(Properties, PartialEq)]
struct HeroSequenceProps {
    config: SequenceConfig,
    #[prop_or_default]
    missing_frames: Vec<u32>,
}

#[function_component(HeroSequence)]
fn hero_sequence(props: &HeroSequenceProps) -> Html {
    let target_ref = use_node_ref();
    let snapshot = use_state_eq(|| PlayerSnapshot::initial(&props.config));
    let player_slot = use_mut_ref(|| Option::<Rc<RefCell<Player>>>::None);

    {
        let target_ref = target_ref.clone();
        let snapshot = snapshot.clone();
        let player_slot = player_slot.clone();
        use_effect_with(
            (props.config.clone(), props.missing_frames.clone()),
            move |(config, missing_frames)| {
                let on_change = Callback::from(move |next: PlayerSnapshot| snapshot.set(next));
                let runtime = match setup_hero(&target_ref, config, missing_frames, on_change) {
                    Ok(runtime) => {
                        *player_slot.borrow_mut() = Some(runtime.player.clone());
                        Some(runtime)
                    }
                    Err(error) => {
                        console_event(
                            ConsoleLevel::Warn,
                            "hero_setup_failed",
                            serde_json::json!({ "error": format!("{error:?}") }),
                        );
                        None
                    }
                };

                move || {
                    player_slot.borrow_mut().take();
                    drop(runtime);
                }
            },
        );
    }

    let on_toggle = {
        let player_slot = player_slot.clone();
        Callback::from(move |_: MouseEvent| {
            with_player(&player_slot, |state| {
                state.toggle();
            });
        })
    };

    let on_speed = {
        let player_slot = player_slot.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            if let Ok(speed) = input.value().parse::<u8>() {
                with_player(&player_slot, |state| {
                    state.set_speed(speed);
                });
            }
        })
    };

    let is_timer = props.config.driving_signal == DrivingSignal::Timer;
    let target = match props.config.render_target {
        RenderTarget::Canvas => html! {
            <canvas ref={target_ref} class="hero-canvas" aria-hidden="true"></canvas>
        },
        RenderTarget::Background => html! {
            <div
                ref={target_ref}
                class="hero-background"
                role="img"
                aria-label="Animated image sequence"
            ></div>
        },
    };

    html! {
        <section
            id="home"
            class={classes!("hero", format!("hero--{}", props.config.driving_signal.as_str()))}
            aria-labelledby="hero-heading"
        >
            {target}
            <div class="hero-overlay">
                <h1 id="hero-heading">{"Frames in Motion"}</h1>
                <p class="hero-status" aria-live="polite">{snapshot.status_line()}</p>
                if is_timer {
                    <div class="hero-controls">
                        <button
                            type="button"
                            class="hero-toggle"
                            aria-pressed={snapshot.playing.to_string()}
                            onclick={on_toggle}
                        >
                            {if snapshot.playing { "Pause" } else { "Play" }}
                        </button>
                        <label class="hero-speed">
                            <span>{format!("Speed {}", snapshot.speed)}</span>
                            <input
                                type="range"
                                min={SPEED_BOUNDS.0.to_string()}
                                max={SPEED_BOUNDS.1.to_string()}
                                value={snapshot.speed.to_string()}
                                oninput={on_speed}
                            />
                        </label>
                        <p class="muted">{"Space toggles playback, arrow keys change speed."}</p>
                    </div>
                } else {
                    <p class="hero-hint muted">{"Scroll to scrub through the sequence."}</p>
                }
            </div>
        </section>
    }
}

fn input_value(event: &InputEvent) -> String {
    let Some(target) = event.target() else {
        return String::new();
    };

    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        return input.value();
    }

    target
        .dyn_ref::<HtmlTextAreaElement>()
        .map(HtmlTextAreaElement::value)
        .unwrap_or_default()
}

#[function_component(ContactSection)]
fn contact_section() -> Html {
    let form = use_state(ContactForm::default);
    let status = use_state(|| Option::<Result<String, &'static str>>::None);

    let bind = |assign: fn(&mut ContactForm, String)| {
        let form = form.clone();
        Callback::from(move |event: InputEvent| {
            let mut next = (*form).clone();
            assign(&mut next, input_value(&event));
            form.set(next);
        })
    };

    let on_name = bind(|form, value| form.name = value);
    let on_email = bind(|form, value| form.email = value);
    let on_subject = bind(|form, value| form.subject = value);
    let on_message = bind(|form, value| form.message = value);

    let on_submit = {
        let form = form.clone();
        let status = status.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            match form.validate() {
                Ok(()) => {
                    status.set(Some(Ok(form.confirmation())));
                    form.set(ContactForm::default());
                }
                Err(message) => status.set(Some(Err(message))),
            }
        })
    };

    let status_view = match (*status).clone() {
        Some(Ok(message)) => html! {
            <p class="form-status is-success" role="status">{message}</p>
        },
        Some(Err(message)) => html! {
            <p class="form-status is-error" role="alert">{message}</p>
        },
        None => html! {},
    };

    html! {
        <section id="contact" class="section-block reveal" aria-labelledby="contact-heading">
            <h2 id="contact-heading">{"Contact"}</h2>
            <form class="contact-form" onsubmit={on_submit} novalidate=true>
                <label>
                    <span>{"Name"}</span>
                    <input
                        name="name"
                        type="text"
                        required=true
                        value={form.name.clone()}
                        oninput={on_name}
                    />
                </label>
                <label>
                    <span>{"Email"}</span>
                    <input
                        name="email"
                        type="email"
                        required=true
                        value={form.email.clone()}
                        oninput={on_email}
                    />
                </label>
                <label>
                    <span>{"Subject"}</span>
                    <input
                        name="subject"
                        type="text"
                        required=true
                        value={form.subject.clone()}
                        oninput={on_subject}
                    />
                </label>
                <label>
                    <span>{"Message"}</span>
                    <textarea
                        name="message"
                        rows="5"
                        required=true
                        value={form.message.clone()}
                        oninput={on_message}
                    />
                </label>
                <button type="submit">{"Send"}</button>
                {status_view}
            </form>
        </section>
    }
}

fn refresh_page_scroll(
    win: &Window,
    anchors: &PageAnchors,
    active: &UseStateHandle<Option<&'static str>>,
    show_scroll_top: &UseStateHandle<bool>,
) {
    let position = scroll_y(win);
    let sections = anchors.tops(position, viewport_top);

    active.set(active_section(&sections, position, HEADER_OFFSET));
    show_scroll_top.set(scroll_top_visible(position));
}

fn reveal_elements() -> Vec<Element> {
    let Some(nodes) = window()
        .and_then(|w| w.document())
        .and_then(|d| d.query_selector_all(".reveal").ok())
    else {
        return Vec::new();
    };

    (0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Marks an element visible the first time it scrolls into view; skill bars
/// also grow to the width stored in `data-level`.
fn reveal(entry: IntersectionObserverEntry, observer: &IntersectionObserver) {
    if !entry.is_intersecting() {
        return;
    }

    let target = entry.target();
    let _ = target.class_list().add_1("is-visible");

    if let Some(level) = target
        .get_attribute("data-level")
        .and_then(|value| value.parse::<u8>().ok())
    {
        if let Some(bar) = target.dyn_ref::<HtmlElement>() {
            let _ = bar.style().set_property("width", &skill_bar_width(level));
        }
    }

    observer.unobserve(&target);
}

#[function_component(App)]
fn app() -> Html {
    let sequence = use_state(|| Option::<SequenceResponse>::None);
    let active = use_state_eq(|| Option::<&'static str>::None);
    let show_scroll_top = use_state_eq(|| false);
    let anchors = use_mut_ref(PageAnchors::default);

    {
        let sequence = sequence.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let resolved = fetch_sequence().await.unwrap_or_else(|| {
                    console_event(
                        ConsoleLevel::Info,
                        "sequence_config_fallback",
                        serde_json::json!({ "endpoint": SEQUENCE_ENDPOINT }),
                    );
                    SequenceResponse {
                        ok: true,
                        config: SequenceConfig::default(),
                        missing_frames: Vec::new(),
                        error: None,
                    }
                });

                sequence.set(Some(SequenceResponse {
                    config: resolved.config.normalized(),
                    ..resolved
                }));
            });
            || ()
        });
    }

    {
        let active = active.clone();
        let show_scroll_top = show_scroll_top.clone();
        let anchors = anchors.clone();
        // The hero section is replaced once the sequence arrives, so the
        // anchors are resolved again at that point.
        use_effect_with(sequence.is_some(), move |_| {
            let listener = window().and_then(|win| {
                let document = win.document()?;
                *anchors.borrow_mut() = resolve_page_anchors(&document);
                refresh_page_scroll(&win, &anchors.borrow(), &active, &show_scroll_top);

                let listener_win = win.clone();
                Listener::new(&win, "scroll", move |_| {
                    refresh_page_scroll(
                        &listener_win,
                        &anchors.borrow(),
                        &active,
                        &show_scroll_top,
                    );
                })
                .ok()
            });

            move || drop(listener)
        });
    }

    {
        use_effect_with((), move |_| {
            let observer = Observer::new(&reveal_elements(), reveal).ok();
            move || drop(observer)
        });
    }

    let on_scroll_top = Callback::from(|_: MouseEvent| scroll_window_to(0.0));

    let nav_links = NAV_SECTIONS.iter().map(|&(id, label)| {
        let anchors = anchors.clone();
        let onclick = Callback::from(move |event: MouseEvent| {
            event.prevent_default();
            let Some(win) = window() else {
                return;
            };
            let top = anchors.borrow().top_of(id, scroll_y(&win), viewport_top);
            if let Some(top) = top {
                scroll_window_to(section_scroll_target(top, HEADER_OFFSET));
            }
        });
        let is_active = *active == Some(id);

        html! {
            <li>
                <a
                    href={format!("#{id}")}
                    class={classes!("nav-link", is_active.then_some("is-active"))}
                    aria-current={is_active.then_some("true")}
                    onclick={onclick}
                >
                    {label}
                </a>
            </li>
        }
    });

    let hero = match (*sequence).as_ref() {
        Some(response) => html! {
            <HeroSequence
                config={response.config.clone()}
                missing_frames={response.missing_frames.clone()}
            />
        },
        None => html! {
            <section id="home" class="hero is-loading" aria-busy="true">
                <p class="hero-status">{"Preparing sequence…"}</p>
            </section>
        },
    };

    html! {
        <>
            <a class="skip-link" href="#content">{"Skip to main content"}</a>
            <header class="site-header">
                <nav aria-label="Sections">
                    <ul class="nav-list">{for nav_links}</ul>
                </nav>
            </header>

            <main id="content">
                {hero}

                <section id="about" class="section-block reveal" aria-labelledby="about-heading">
                    <h2 id="about-heading">{"About"}</h2>
                    <p>
                        {"I build interfaces where motion carries meaning, from \
                          scroll-scrubbed image sequences to small interactive studies."}
                    </p>
                </section>

                <section id="projects" class="section-block" aria-labelledby="projects-heading">
                    <h2 id="projects-heading">{"Projects"}</h2>
                    <ul class="card-grid">
                        {for PROJECTS.iter().map(|(title, description)| html! {
                            <li class="card reveal">
                                <h3>{*title}</h3>
                                <p class="muted">{*description}</p>
                            </li>
                        })}
                    </ul>
                </section>

                <section id="skills" class="section-block" aria-labelledby="skills-heading">
                    <h2 id="skills-heading">{"Skills"}</h2>
                    <ul class="skill-list">
                        {for SKILLS.iter().map(|(name, level)| html! {
                            <li class="skill">
                                <span class="skill-name">{*name}</span>
                                <span class="skill-track" aria-label={format!("{name}: {level}%")}>
                                    <span
                                        class="skill-fill reveal"
                                        data-level={level.to_string()}
                                        style="width: 0%"
                                    ></span>
                                </span>
                            </li>
                        })}
                    </ul>
                </section>

                <ContactSection />
            </main>

            <button
                type="button"
                class={classes!("scroll-top", (*show_scroll_top).then_some("is-visible"))}
                aria-label="Scroll to top"
                onclick={on_scroll_top}
            >
                {"↑"}
            </button>
        </>
    }
}

pub fn run() {
    yew::Renderer::<App>::with_root(
        window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("app"))
            .expect("missing #app mount point"),
    )
    .render();
}
