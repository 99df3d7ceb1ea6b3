use fileward::UploadedFile;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Encode a solid-color PNG
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf.into_inner()
}

/// In-memory PNG upload
pub fn png_upload(name: &str) -> UploadedFile {
    UploadedFile::from_bytes(name, create_test_png(120, 80))
}

/// In-memory upload of arbitrary bytes
pub fn text_upload(name: &str, content: &str) -> UploadedFile {
    UploadedFile::from_bytes(name, content.as_bytes().to_vec())
}
