/// Resource-level 2D texture.
///
/// A `Texture` has fixed dimensions; its RGBA8 storage is allocated on the
/// device when it is created. Alongside the image store it keeps a staging
/// buffer of the same byte size, used by region uploads so the caller never
/// waits on a synchronous write into the image store.
///
/// Textures are shared between materials as `Rc<Texture>`. Their handles sit in
/// `Cell`s so a shared texture can still be destroyed by its owning manager.

use std::borrow::Cow;
use std::cell::Cell;
use std::fmt;

use image::{DynamicImage, RgbaImage};

use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferHandle, BufferTarget, BufferUsage, SamplerDesc, SharedDevice, TextureCopy, TextureHandle,
};

/// Bytes per RGBA8 texel
const BYTES_PER_PIXEL: usize = 4;

pub struct Texture {
    device: SharedDevice,
    name: String,
    width: u32,
    height: u32,
    handle: Cell<Option<TextureHandle>>,
    staging: Cell<Option<BufferHandle>>,
}

impl Texture {
    /// Create a texture with linear filtering and edge clamping on all axes
    ///
    /// Allocates the image store and a `width * height * 4` byte staging buffer.
    pub fn new(device: SharedDevice, name: impl Into<String>, width: u32, height: u32) -> Result<Self> {
        let name = name.into();
        let staging_size = width as usize * height as usize * BYTES_PER_PIXEL;

        let (handle, staging) = {
            let mut dev = device.borrow_mut();
            let handle = dev.create_texture(width, height, &SamplerDesc::default())?;
            match dev.allocate_buffer(BufferTarget::PixelUnpack, staging_size, BufferUsage::StreamDraw) {
                Ok(staging) => (handle, staging),
                Err(err) => {
                    dev.delete_texture(handle);
                    return Err(err);
                }
            }
        };

        Ok(Self {
            device,
            name,
            width,
            height,
            handle: Cell::new(Some(handle)),
            staging: Cell::new(Some(staging)),
        })
    }

    /// Create a texture sized to `image` and upload it at mip level 0
    pub fn from_image(device: SharedDevice, name: impl Into<String>, image: &DynamicImage) -> Result<Self> {
        let texture = Self::new(device, name, image.width(), image.height())?;
        // On failure the texture is dropped, which releases its storage
        texture.upload(image, 0)?;
        Ok(texture)
    }

    // ===== UPLOAD =====

    /// Replace the full content of `mip_level`
    ///
    /// Non-RGBA8 images are converted first.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` unless the image is `(width >> mip_level, height >> mip_level)`.
    pub fn upload(&self, image: &DynamicImage, mip_level: u32) -> Result<()> {
        self.upload_rgba(&as_rgba(image), mip_level)
    }

    /// [`Texture::upload`] for an image already in RGBA8 layout
    pub fn upload_rgba(&self, image: &RgbaImage, mip_level: u32) -> Result<()> {
        let expected = (self.width >> mip_level, self.height >> mip_level);
        let found = image.dimensions();
        if found != expected {
            return Err(Error::SizeMismatch {
                texture: self.name.clone(),
                expected,
                found,
                mip_level,
            });
        }

        let handle = self.live_handle()?;
        self.device
            .borrow_mut()
            .upload_texture(handle, mip_level, found.0, found.1, image.as_raw())
    }

    /// Replace the region of `mip_level` starting at `offset` with `image`
    ///
    /// # Errors
    ///
    /// `OutOfBounds` if `offset + image size` exceeds [`Texture::level_size`] of `mip_level`.
    pub fn upload_region(&self, image: &DynamicImage, offset: (u32, u32), mip_level: u32) -> Result<()> {
        let rgba = as_rgba(image);
        let (width, height) = rgba.dimensions();
        self.upload_rgba_region(
            rgba.as_raw(),
            width,
            height,
            width as usize * BYTES_PER_PIXEL,
            offset,
            mip_level,
        )
    }

    /// Region upload from raw RGBA8 rows of `row_stride` bytes
    ///
    /// The rows are written into the mapped staging buffer at the texture's
    /// own row stride, then copied on the device into the image store.
    pub fn upload_rgba_region(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        row_stride: usize,
        offset: (u32, u32),
        mip_level: u32,
    ) -> Result<()> {
        let bounds = self.level_size(mip_level);
        let fits_x = offset.0.checked_add(width).map_or(false, |end| end <= bounds.0);
        let fits_y = offset.1.checked_add(height).map_or(false, |end| end <= bounds.1);
        if !fits_x || !fits_y {
            return Err(Error::OutOfBounds {
                texture: self.name.clone(),
                offset,
                size: (width, height),
                bounds,
            });
        }
        if width == 0 || height == 0 {
            return Ok(());
        }

        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let required = (height as usize - 1) * row_stride + row_bytes;
        if row_stride < row_bytes || pixels.len() < required {
            return Err(Error::BackendError(format!(
                "Texture '{}': {} bytes of pixel data cannot hold a {}x{} region with row stride {}",
                self.name, pixels.len(), width, height, row_stride
            )));
        }

        let handle = self.live_handle()?;
        let staging = self.staging.get().ok_or_else(|| self.destroyed_error())?;
        let texture_stride = self.width as usize * BYTES_PER_PIXEL;
        let buffer_offset = offset.1 as usize * texture_stride + offset.0 as usize * BYTES_PER_PIXEL;

        let mut device = self.device.borrow_mut();
        {
            let mapped = device.map_buffer(staging)?;
            for row in 0..height as usize {
                let src = row * row_stride;
                let dst = buffer_offset + row * texture_stride;
                mapped[dst..dst + row_bytes].copy_from_slice(&pixels[src..src + row_bytes]);
            }
        }
        device.unmap_buffer(staging)?;

        device.copy_buffer_to_texture(
            handle,
            mip_level,
            staging,
            &TextureCopy {
                x: offset.0,
                y: offset.1,
                width,
                height,
                buffer_offset,
                buffer_row_pixels: self.width,
            },
        )
    }

    // ===== BINDING =====

    /// Bind to texture unit `unit`
    pub fn bind(&self, unit: u32) {
        self.device.borrow_mut().bind_texture(unit, self.handle.get());
    }

    /// Unbind texture unit `unit`
    pub fn release(&self, unit: u32) {
        self.device.borrow_mut().bind_texture(unit, None);
    }

    /// Release the image store and the staging buffer (no-op if already released)
    pub fn destroy(&self) {
        let handle = self.handle.take();
        let staging = self.staging.take();
        if handle.is_none() && staging.is_none() {
            return;
        }
        let mut device = self.device.borrow_mut();
        if let Some(handle) = handle {
            device.delete_texture(handle);
        }
        if let Some(staging) = staging {
            device.delete_buffer(staging);
        }
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of `mip_level`, never below 1x1
    pub fn level_size(&self, mip_level: u32) -> (u32, u32) {
        let shrink = |size: u32| size.checked_shr(mip_level).unwrap_or(0).max(1);
        (shrink(self.width), shrink(self.height))
    }

    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle.get()
    }

    pub fn staging_buffer(&self) -> Option<BufferHandle> {
        self.staging.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.handle.get().is_none()
    }

    fn live_handle(&self) -> Result<TextureHandle> {
        self.handle.get().ok_or_else(|| self.destroyed_error())
    }

    fn destroyed_error(&self) -> Error {
        Error::BackendError(format!("Texture '{}' has been destroyed", self.name))
    }
}

/// Borrow RGBA8 images as-is, convert anything else
fn as_rgba(image: &DynamicImage) -> Cow<'_, RgbaImage> {
    match image.as_rgba8() {
        Some(rgba) => Cow::Borrowed(rgba),
        None => Cow::Owned(image.to_rgba8()),
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        let handle = self.handle.take();
        let staging = self.staging.take();
        if let Ok(mut device) = self.device.try_borrow_mut() {
            if let Some(handle) = handle {
                device.delete_texture(handle);
            }
            if let Some(staging) = staging {
                device.delete_buffer(staging);
            }
        }
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("handle", &self.handle.get())
            .field("staging", &self.staging.get())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
