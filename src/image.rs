//! Embedding raster images and vector graphics as PDF XObjects.

use crate::error::ReportError;
use crate::refs::{ObjectReferences, RefType};
use image::{ColorType, DynamicImage, ImageFormat};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Pdf, Ref};
use std::collections::HashMap;
use std::path::Path;

/// Image data ready to be written to an image XObject
pub(crate) struct EncodedImage {
    filter: Filter,
    bytes: Vec<u8>,
    /// Deflated alpha channel, for images that have one
    mask: Option<Vec<u8>>,
    width: u32,
    height: u32,
}

impl EncodedImage {
    /// Read and encode the image at `path`. RGB JPEGs are embedded as they are;
    /// everything else is decoded and deflated.
    pub fn from_path(path: &Path) -> Result<EncodedImage, ReportError> {
        let data = std::fs::read(path)?;
        let format = match ImageFormat::from_path(path) {
            Ok(ImageFormat::Tga) => ImageFormat::Tga,
            _ => image::guess_format(&data)?,
        };
        let image = image::load_from_memory_with_format(&data, format)?;

        if format == ImageFormat::Jpeg && image.color() == ColorType::Rgb8 {
            return Ok(EncodedImage {
                filter: Filter::DctDecode,
                width: image.width(),
                height: image.height(),
                bytes: data,
                mask: None,
            });
        }
        Ok(EncodedImage::deflate(&image))
    }

    fn deflate(image: &DynamicImage) -> EncodedImage {
        let level = CompressionLevel::DefaultLevel as u8;
        let mask = image.color().has_alpha().then(|| {
            let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
            compress_to_vec_zlib(&alpha, level)
        });
        EncodedImage {
            filter: Filter::FlateDecode,
            bytes: compress_to_vec_zlib(image.to_rgb8().as_raw(), level),
            mask,
            width: image.width(),
            height: image.height(),
        }
    }

    /// Write the image (and its soft mask) as XObject number `index`
    pub fn write(&self, refs: &mut ObjectReferences, index: usize, writer: &mut Pdf) -> Ref {
        let id = refs.gen(RefType::Image(index));
        let mask_id = self.mask.as_ref().map(|_| refs.gen(RefType::ImageMask(index)));

        let mut image = writer.image_xobject(id, &self.bytes);
        image.filter(self.filter);
        image.width(self.width as i32);
        image.height(self.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        if let Some(mask_id) = mask_id {
            image.s_mask(mask_id);
        }
        image.finish();

        if let (Some(mask_id), Some(mask)) = (mask_id, &self.mask) {
            let mut s_mask = writer.image_xobject(mask_id, mask);
            s_mask.filter(Filter::FlateDecode);
            s_mask.width(self.width as i32);
            s_mask.height(self.height as i32);
            s_mask.color_space().device_gray();
            s_mask.bits_per_component(8);
        }
        id
    }
}

/// Convert an SVG into a form XObject covering the unit square, returning its
/// id
pub(crate) fn write_svg(
    tree: &usvg::Tree,
    refs: &mut ObjectReferences,
    writer: &mut Pdf,
) -> Result<Ref, ReportError> {
    let (chunk, root) = svg2pdf::to_chunk(tree, svg2pdf::ConversionOptions::default())
        .map_err(|e| ReportError::render(format!("failed to convert svg: {e}")))?;

    // the chunk numbers its objects from 1; move them into our id space
    let mut ids: HashMap<Ref, Ref> = HashMap::new();
    let chunk = chunk.renumber(|old| *ids.entry(old).or_insert_with(|| refs.bump()));
    writer.extend(&chunk);

    ids.get(&root)
        .copied()
        .ok_or_else(|| ReportError::render("converted svg has no root object"))
}
