/*!
# Prism GPU - Headless Backend

Host-memory implementation of the `prism_gpu` traits.

Resources live in ordinary memory and submitted frames are executed by a
worker thread standing in for the GPU. The backend enforces the full
construction-time validation of the core crate, checks SPIR-V with spirq,
caches pipeline state, and bounds the number of frames in flight, which
makes it suitable for tests and for running without a graphics driver.

```no_run
use prism_gpu::{Device, GpuConfig};
use prism_gpu_headless::{HeadlessConfig, HeadlessDevice};

let mut device = HeadlessDevice::new(GpuConfig::default(), HeadlessConfig::default())?;
device.frame_wait();
device.frame_finish();
device.wait_idle();
# Ok::<(), prism_gpu::Error>(())
```
*/

// Headless implementation modules
mod headless_buffer;
mod headless_canvas;
mod headless_context;
mod headless_device;
mod headless_pipeline;
mod headless_shader;
mod headless_texture;
mod headless_timeline;
mod registry;
mod texel;

pub use headless_buffer::{HeadlessBuffer, DISCARD_POISON};
pub use headless_canvas::HeadlessCanvas;
pub use headless_device::{HeadlessConfig, HeadlessDevice};
pub use headless_pipeline::HeadlessPipeline;
pub use headless_shader::HeadlessShader;
pub use headless_texture::HeadlessTexture;
