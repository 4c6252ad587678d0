/// Errors raised while acquiring a device or reading back a frame.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("readback buffer map failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),
    #[error("readback callback dropped before completion")]
    MapCallbackDropped,
    #[error("offscreen target must be non-empty, got {width}x{height}")]
    EmptyTarget { width: u32, height: u32 },
}
