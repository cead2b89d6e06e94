use std::path::Path;

use crate::shared::frame::Frame;

/// Load a still image to stand in for the camera when a frame must be sent
/// to the remote phrase service.
pub fn load_snapshot(path: &Path) -> Result<Frame, image::ImageError> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, 0))
}
