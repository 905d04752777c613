use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement};

use crate::{frame_store::FrameAsset, playback::CoverFit};

pub enum Surface {
    Canvas {
        canvas: HtmlCanvasElement,
        context: CanvasRenderingContext2d,
    },
    Background(HtmlElement),
}

impl Surface {
    pub fn canvas(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self::Canvas { canvas, context })
    }

    pub fn background(element: HtmlElement) -> Result<Self, JsValue> {
        let style = element.style();
        style.set_property("background-size", "cover")?;
        style.set_property("background-position", "center")?;
        style.set_property("background-repeat", "no-repeat")?;

        Ok(Self::Background(element))
    }

    /// Canvas backing stores follow the viewport; background targets are sized
    /// by CSS and need nothing here.
    pub fn resize(&self, width: f64, height: f64) {
        if let Self::Canvas { canvas, .. } = self {
            canvas.set_width(width.max(1.0) as u32);
            canvas.set_height(height.max(1.0) as u32);
        }
    }

    pub fn draw(&self, asset: &FrameAsset) -> Result<(), JsValue> {
        match self {
            Self::Canvas { canvas, context } => draw_cover(canvas, context, asset),
            Self::Background(element) => {
                let Some(source) = asset.css_source() else {
                    return Ok(());
                };
                element
                    .style()
                    .set_property("background-image", &format!("url(\"{source}\")"))
            }
        }
    }
}

fn draw_cover(
    canvas: &HtmlCanvasElement,
    context: &CanvasRenderingContext2d,
    asset: &FrameAsset,
) -> Result<(), JsValue> {
    let canvas_width = f64::from(canvas.width());
    let canvas_height = f64::from(canvas.height());
    let (image_width, image_height) = asset.dimensions();

    let Some(fit) = CoverFit::compute(canvas_width, canvas_height, image_width, image_height)
    else {
        return Ok(());
    };

    context.clear_rect(0.0, 0.0, canvas_width, canvas_height);
    match asset {
        FrameAsset::Image(image) => context.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            fit.offset_x,
            fit.offset_y,
            fit.draw_width,
            fit.draw_height,
        ),
        FrameAsset::Placeholder(placeholder) => context
            .draw_image_with_html_canvas_element_and_dw_and_dh(
                placeholder.canvas(),
                fit.offset_x,
                fit.offset_y,
                fit.draw_width,
                fit.draw_height,
            ),
    }
}
