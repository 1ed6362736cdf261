//! Floating UI bindings for dropdown positioning
//!
//! Typed interface to `@floating-ui/dom`'s `computePosition`, used to place
//! the dropdown content against its trigger. The library is expected on the
//! page as the `FloatingUIDOM` global.

use basic_dropdown_core::ContentPosition;
use wasm_bindgen_x::prelude::*;
use wasm_bindgen_x::JsCast;

/// Placement options matching floating-ui's placement values
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Placement {
    #[default]
    BottomStart,
    Bottom,
    BottomEnd,
    TopStart,
    Top,
    TopEnd,
}

impl Placement {
    fn as_str(&self) -> &'static str {
        match self {
            Self::BottomStart => "bottom-start",
            Self::Bottom => "bottom",
            Self::BottomEnd => "bottom-end",
            Self::TopStart => "top-start",
            Self::Top => "top",
            Self::TopEnd => "top-end",
        }
    }
}

/// Result of computePosition
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComputePositionResult {
    pub x: f64,
    pub y: f64,
}

impl ComputePositionResult {
    /// Inline position for the content element. With `match_width` the
    /// content takes the trigger's width.
    pub fn to_content_position(&self, match_width: Option<f64>) -> ContentPosition {
        ContentPosition {
            top: Some(format!("{}px", self.y)),
            left: Some(format!("{}px", self.x)),
            width: match_width.map(|width| format!("{width}px")),
            ..Default::default()
        }
    }
}

/// Options for computePosition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputePositionOptions {
    pub placement: Placement,
    pub offset: Option<f64>,
    pub flip: bool,
    pub shift: bool,
}

fn middleware(floating_ui: &JsValue, name: &str, arg: Option<f64>) -> Result<JsValue, JsValue> {
    let factory = js_sys_x::Reflect::get(floating_ui, &name.into())?;
    let func = factory
        .dyn_ref::<js_sys_x::Function>()
        .ok_or_else(|| JsValue::from_str(&format!("{name} not a function")))?;
    match arg {
        Some(value) => func.call1(&JsValue::NULL, &JsValue::from_f64(value)),
        None => func.call0(&JsValue::NULL),
    }
}

/// Compute the position of `floating` relative to `reference`.
///
/// Coordinates are relative to the floating element's offset parent, ready to
/// be applied as `top`/`left`.
pub async fn compute_position(
    reference: &web_sys_x::Element,
    floating: &web_sys_x::Element,
    options: ComputePositionOptions,
) -> Result<ComputePositionResult, JsValue> {
    let window = web_sys_x::window().ok_or("no window")?;
    let floating_ui = js_sys_x::Reflect::get(&window, &"FloatingUIDOM".into())?;

    let middlewares = js_sys_x::Array::new();
    if let Some(offset) = options.offset {
        middlewares.push(&middleware(&floating_ui, "offset", Some(offset))?);
    }
    if options.flip {
        middlewares.push(&middleware(&floating_ui, "flip", None)?);
    }
    if options.shift {
        middlewares.push(&middleware(&floating_ui, "shift", None)?);
    }

    let opts = js_sys_x::Object::new();
    js_sys_x::Reflect::set(
        &opts,
        &"placement".into(),
        &options.placement.as_str().into(),
    )?;
    js_sys_x::Reflect::set(&opts, &"middleware".into(), &middlewares)?;

    let compute_fn = js_sys_x::Reflect::get(&floating_ui, &"computePosition".into())?;
    let func = compute_fn
        .dyn_ref::<js_sys_x::Function>()
        .ok_or("computePosition not a function")?;

    let promise = func
        .call3(&JsValue::NULL, reference, floating, &opts)?
        .dyn_into::<js_sys_x::Promise>()?;

    let result = wasm_bindgen_futures_x::JsFuture::from(promise).await?;

    let x = js_sys_x::Reflect::get(&result, &"x".into())?
        .as_f64()
        .unwrap_or(0.0);
    let y = js_sys_x::Reflect::get(&result, &"y".into())?
        .as_f64()
        .unwrap_or(0.0);

    Ok(ComputePositionResult { x, y })
}
