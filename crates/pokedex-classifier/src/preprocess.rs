//! Image to tensor conversion

use candle_core::{DType, Device, Tensor};
use image::{imageops::FilterType, DynamicImage};

/// ImageNet channel means the backbone was pretrained with
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resize to `size`x`size` RGB and normalize into a `(3, size, size)` tensor.
pub fn image_to_tensor(image: &DynamicImage, size: usize, device: &Device) -> candle_core::Result<Tensor> {
    let side = size as u32;
    let rgb = image.resize_exact(side, side, FilterType::Triangle).to_rgb8();
    let data = rgb.into_raw();

    let pixels = Tensor::from_vec(data, (size, size, 3), device)?.permute((2, 0, 1))?;
    let mean = Tensor::new(&IMAGENET_MEAN, device)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&IMAGENET_STD, device)?.reshape((3, 1, 1))?;

    (pixels.to_dtype(DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)
}

/// Same as [`image_to_tensor`] with a leading batch dimension of one.
pub fn image_to_batch(image: &DynamicImage, size: usize, device: &Device) -> candle_core::Result<Tensor> {
    image_to_tensor(image, size, device)?.unsqueeze(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_shape_and_resize() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([0, 0, 0])));
        let tensor = image_to_batch(&image, 32, &Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[1, 3, 32, 32]);
    }

    #[test]
    fn test_normalization() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 0, 124])));
        let tensor = image_to_tensor(&image, 4, &Device::Cpu).unwrap();
        let values: Vec<Vec<Vec<f32>>> = tensor.to_vec3().unwrap();

        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!((values[0][0][0] - red).abs() < 1e-4);
        assert!((values[1][3][3] - green).abs() < 1e-4);
    }

    #[test]
    fn test_grayscale_is_expanded_to_rgb() {
        let image = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(5, 5, image::Luma([128])));
        let tensor = image_to_tensor(&image, 5, &Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[3, 5, 5]);
    }
}
