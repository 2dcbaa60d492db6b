use flock_core::{FlockError, FlockSimulation};
use flock_shared::{FlockSettings, FlockStats, SettingsError};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, MouseEvent, Window,
};

mod canvas;
pub use canvas::CanvasSurface;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

fn flock_err(err: FlockError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn settings_err(err: SettingsError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn window() -> Result<Window, JsValue> {
    Ok(web_sys::window().ok_or("no global window")?)
}

/// Size of the canvas's layout parent, at least 1x1 so a collapsed hero
/// section never produces an empty surface.
fn parent_size(canvas: &HtmlCanvasElement) -> (u32, u32) {
    let (width, height) = canvas
        .parent_element()
        .map(|parent| (parent.client_width(), parent.client_height()))
        .unwrap_or((canvas.width() as i32, canvas.height() as i32));
    (width.max(1) as u32, height.max(1) as u32)
}

/// Everything the frame callback and the event listeners share.
struct Scene {
    simulation: FlockSimulation,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    pending_frame: Option<i32>,
}

impl Scene {
    fn render_frame(&mut self) -> Result<(), JsValue> {
        self.simulation.tick();
        self.simulation.draw(&mut CanvasSurface::new(&self.context))
    }

    fn fit_to_parent(&mut self) -> Result<(), JsValue> {
        let (width, height) = parent_size(&self.canvas);
        self.resize(width, height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.simulation
            .resize(width as f32, height as f32)
            .map_err(flock_err)?;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        Ok(())
    }
}

/// An event listener that stays registered until `detach`.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: EventTarget,
        event: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<Self, JsValue> {
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target,
            event,
            callback,
        })
    }

    fn detach(&self) -> Result<(), JsValue> {
        self.target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn request_frame(callback: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    window()?.request_animation_frame(callback.as_ref().unchecked_ref())
}

/// Hero-section background: a flock on a canvas that scatters away from the
/// mouse.
#[wasm_bindgen]
pub struct HeroAnimation {
    scene: Rc<RefCell<Scene>>,
    frame_callback: FrameCallback,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl HeroAnimation {
    /// Sizes the canvas to its parent and scatters the flock over it.
    /// `settings_json` is an optional `FlockSettings` document.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, settings_json: Option<String>) -> Result<HeroAnimation, JsValue> {
        let settings = match settings_json {
            Some(json) => FlockSettings::from_json(&json).map_err(settings_err)?,
            None => FlockSettings::default(),
        };

        let document = window()?.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        let (width, height) = parent_size(&canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let context = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let simulation = settings
            .start(width as f32, height as f32)
            .map_err(settings_err)?;

        console_log!(
            "Hero animation ready: {} agents on {}x{}",
            simulation.agents().len(),
            width,
            height
        );

        Ok(HeroAnimation {
            scene: Rc::new(RefCell::new(Scene {
                simulation,
                canvas,
                context,
                pending_frame: None,
            })),
            frame_callback: Rc::new(RefCell::new(None)),
            listeners: Vec::new(),
        })
    }

    /// Hooks up pointer and resize listeners and starts the frame loop.
    /// Calling it again while running does nothing.
    pub fn start(&mut self) -> Result<(), JsValue> {
        if !self.scene.borrow().simulation.is_running() {
            return Err("animation was stopped".into());
        }
        if self.frame_callback.borrow().is_some() {
            return Ok(());
        }

        let window = window()?;
        let document = window.document().ok_or("no document")?;
        let root = document.document_element().ok_or("no document element")?;

        let scene = Rc::clone(&self.scene);
        let on_move: Closure<dyn FnMut(Event)> = Closure::new(move |event: Event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                scene
                    .borrow_mut()
                    .simulation
                    .set_pointer(mouse.client_x() as f32, mouse.client_y() as f32);
            }
        });
        self.listeners
            .push(Listener::attach(window.clone().into(), "mousemove", on_move)?);

        let scene = Rc::clone(&self.scene);
        let on_leave: Closure<dyn FnMut(Event)> = Closure::new(move |_: Event| {
            scene.borrow_mut().simulation.clear_pointer();
        });
        self.listeners
            .push(Listener::attach(root.into(), "mouseleave", on_leave)?);

        let scene = Rc::clone(&self.scene);
        let on_resize: Closure<dyn FnMut(Event)> = Closure::new(move |_: Event| {
            if let Err(err) = scene.borrow_mut().fit_to_parent() {
                console_log!("Resize failed: {:?}", err);
            }
        });
        self.listeners
            .push(Listener::attach(window.into(), "resize", on_resize)?);

        let scene = Rc::clone(&self.scene);
        let callback = Rc::clone(&self.frame_callback);
        *self.frame_callback.borrow_mut() = Some(Closure::new(move || {
            let mut scene = scene.borrow_mut();
            scene.pending_frame = None;
            if !scene.simulation.is_running() {
                return;
            }

            if let Err(err) = scene.render_frame() {
                console_log!("Frame failed: {:?}", err);
            }

            if let Some(next) = callback.borrow().as_ref() {
                match request_frame(next) {
                    Ok(id) => scene.pending_frame = Some(id),
                    Err(err) => console_log!("Could not schedule frame: {:?}", err),
                }
            }
        }));

        if let Some(first) = self.frame_callback.borrow().as_ref() {
            let id = request_frame(first)?;
            self.scene.borrow_mut().pending_frame = Some(id);
        }

        console_log!("Hero animation started");
        Ok(())
    }

    /// Halts the frame loop and removes every listener. Safe to call more
    /// than once. Teardown runs to completion; the first failure is
    /// returned afterwards.
    pub fn stop(&mut self) -> Result<(), JsValue> {
        let pending = {
            let mut scene = self.scene.borrow_mut();
            scene.simulation.stop();
            scene.pending_frame.take()
        };
        let mut first_error = None;
        if let Some(id) = pending {
            if let Err(err) = window().and_then(|window| window.cancel_animation_frame(id)) {
                first_error = first_error.or(Some(err));
            }
        }

        for listener in self.listeners.drain(..) {
            if let Err(err) = listener.detach() {
                console_log!("Could not detach {} listener: {:?}", listener.event, err);
                first_error = first_error.or(Some(err));
                // JS may still call it; leaking beats invalidating the closure
                listener.callback.forget();
            }
        }
        // the frame closure holds a handle to its own slot
        self.frame_callback.borrow_mut().take();

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs one tick and one draw outside the frame loop.
    pub fn frame(&mut self) -> Result<(), JsValue> {
        self.scene.borrow_mut().render_frame()
    }

    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.scene
            .borrow_mut()
            .simulation
            .set_pointer(x as f32, y as f32);
    }

    pub fn clear_pointer(&mut self) {
        self.scene.borrow_mut().simulation.clear_pointer();
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.scene.borrow_mut().resize(width, height)
    }

    pub fn agent_count(&self) -> usize {
        self.scene.borrow().simulation.agents().len()
    }

    pub fn is_running(&self) -> bool {
        self.scene.borrow().simulation.is_running()
    }

    pub fn stats_json(&self) -> Result<String, JsValue> {
        let stats = FlockStats::from_simulation(&self.scene.borrow().simulation);
        serde_json::to_string(&stats).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Drop for HeroAnimation {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            console_log!("Teardown failed: {:?}", err);
        }
    }
}
