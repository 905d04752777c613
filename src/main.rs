#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod frame_slots;
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod page;
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod playback;
mod sequence;

#[cfg(not(target_arch = "wasm32"))]
mod backend;

#[cfg(target_arch = "wasm32")]
mod frame_store;
#[cfg(target_arch = "wasm32")]
mod frontend;
#[cfg(target_arch = "wasm32")]
mod render;

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    backend::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {
    frontend::run();
}
