//! Mock classifiers and request helpers for API tests

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pokedex_classifier::{Classification, ImageClassifier};
use pokedex_core::{Error, LabelSet, Result};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub const BOUNDARY: &str = "pokedex-test-boundary";

/// Names an image by its dominant colour channel
pub struct ColorClassifier {
    labels: LabelSet,
    latency: Option<Duration>,
    call_count: AtomicU32,
}

impl ColorClassifier {
    pub fn new() -> Self {
        Self {
            labels: LabelSet::builtin(),
            latency: None,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl ImageClassifier for ColorClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Classification> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        let [r, g, b] = image.to_rgb8().get_pixel(0, 0).0;
        let label = if r >= g && r >= b {
            "004_charmander"
        } else if g >= b {
            "001_bulbasaur"
        } else {
            "009_blastoise"
        };

        let index = self
            .labels
            .position(label)
            .ok_or_else(|| Error::inference(format!("{} not in label set", label)))?;
        Ok(Classification::new(label, index, 0.9))
    }

    fn name(&self) -> &str {
        "color"
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

/// Fails every inference
pub struct FailingClassifier {
    labels: LabelSet,
}

impl FailingClassifier {
    pub fn new() -> Self {
        Self {
            labels: LabelSet::builtin(),
        }
    }
}

impl ImageClassifier for FailingClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Classification> {
        Err(Error::inference("tensor shape mismatch"))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

/// A small solid-colour image encoded as `format`
pub fn solid_image(color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb(color)));
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

/// One part of a multipart/form-data body
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "file",
            filename: Some("upload"),
            content_type: Some(content_type),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{}\"", filename));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
