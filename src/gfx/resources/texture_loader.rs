//! Texture loading from disk
//!
//! Images are decoded with the `image` crate, flipped so that UV (0, 0) maps
//! to the bottom-left texel, and kept on the CPU until the material uploads
//! them. Missing files degrade to a neutral 1x1 texel so the scene still
//! builds without its asset folder.

use std::path::{Path, PathBuf};

use image::{imageops::FilterType, Rgba, Rgba32FImage, RgbaImage};

use crate::color::{linear_to_srgb, srgb_to_linear};
use crate::error::{HauntedError, Result};

/// How texel values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Colour maps authored in sRGB, decoded to linear by the sampler
    Srgb,
    /// Data maps (normals, roughness, AO...) read as-is
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

impl WrapMode {
    pub fn address_mode(self) -> wgpu::AddressMode {
        match self {
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
        }
    }
}

/// Addressing and UV scale shared by all maps of a material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSampling {
    pub wrap: WrapMode,
    pub repeat: [f32; 2],
}

impl Default for TextureSampling {
    fn default() -> Self {
        Self {
            wrap: WrapMode::ClampToEdge,
            repeat: [1.0, 1.0],
        }
    }
}

impl TextureSampling {
    pub fn repeating(x: f32, y: f32) -> Self {
        Self {
            wrap: WrapMode::Repeat,
            repeat: [x, y],
        }
    }
}

/// Neutral stand-ins for maps that could not be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    White,
    Black,
    FlatNormal,
}

impl Placeholder {
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Placeholder::White => [255, 255, 255, 255],
            Placeholder::Black => [0, 0, 0, 255],
            Placeholder::FlatNormal => [128, 128, 255, 255],
        }
    }
}

/// A decoded RGBA8 image waiting for upload
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub label: String,
    pub pixels: RgbaImage,
    pub color_space: ColorSpace,
}

impl TextureImage {
    pub fn solid(label: &str, rgba: [u8; 4], color_space: ColorSpace) -> Self {
        Self {
            label: label.to_string(),
            pixels: RgbaImage::from_pixel(1, 1, image::Rgba(rgba)),
            color_space,
        }
    }

    pub fn placeholder(label: &str, placeholder: Placeholder, color_space: ColorSpace) -> Self {
        Self::solid(label, placeholder.rgba(), color_space)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match self.color_space {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    pub fn mip_level_count(&self) -> u32 {
        32 - self.width().max(self.height()).max(1).leading_zeros()
    }

    /// Full mip chain, level 0 first, halving down to 1x1
    ///
    /// Colour maps are filtered in linear light and re-encoded per level.
    pub fn mip_chain(&self) -> Vec<RgbaImage> {
        let mut levels = Vec::with_capacity(self.mip_level_count() as usize);
        levels.push(self.pixels.clone());

        match self.color_space {
            ColorSpace::Linear => {
                for (w, h) in self.mip_sizes() {
                    let previous = levels.last().unwrap_or(&self.pixels);
                    let next = image::imageops::resize(previous, w, h, FilterType::Triangle);
                    levels.push(next);
                }
            }
            ColorSpace::Srgb => {
                let mut linear = decode_srgb(&self.pixels);
                for (w, h) in self.mip_sizes() {
                    linear = image::imageops::resize(&linear, w, h, FilterType::Triangle);
                    levels.push(encode_srgb(&linear));
                }
            }
        }

        levels
    }

    /// Sizes of every level below the base
    fn mip_sizes(&self) -> impl Iterator<Item = (u32, u32)> {
        let (mut w, mut h) = (self.width(), self.height());
        std::iter::from_fn(move || {
            if w <= 1 && h <= 1 {
                return None;
            }
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            Some((w, h))
        })
    }
}

fn decode_srgb(pixels: &RgbaImage) -> Rgba32FImage {
    Rgba32FImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [r, g, b, a] = pixels.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        Rgba([srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a])
    })
}

fn encode_srgb(linear: &Rgba32FImage) -> RgbaImage {
    let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    RgbaImage::from_fn(linear.width(), linear.height(), |x, y| {
        let [r, g, b, a] = linear.get_pixel(x, y).0;
        Rgba([
            quantize(linear_to_srgb(r)),
            quantize(linear_to_srgb(g)),
            quantize(linear_to_srgb(b)),
            quantize(a),
        ])
    })
}

/// Loads textures relative to a root directory
#[derive(Debug, Clone)]
pub struct TextureLoader {
    root: PathBuf,
}

impl TextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self, relative: &str, color_space: ColorSpace) -> Result<TextureImage> {
        let path = self.root.join(relative);
        if !path.is_file() {
            return Err(HauntedError::TextureMissing(path));
        }

        let decoded = image::open(&path).map_err(|source| HauntedError::TextureDecode {
            path: path.clone(),
            source,
        })?;

        let mut pixels = decoded.to_rgba8();
        image::imageops::flip_vertical_in_place(&mut pixels);

        log::debug!(
            "Loaded texture {} ({}x{}, {:?})",
            path.display(),
            pixels.width(),
            pixels.height(),
            color_space
        );

        Ok(TextureImage {
            label: relative.to_string(),
            pixels,
            color_space,
        })
    }

    /// Like [`TextureLoader::load`] but never fails
    pub fn load_or_placeholder(
        &self,
        relative: &str,
        color_space: ColorSpace,
        placeholder: Placeholder,
    ) -> TextureImage {
        match self.load(relative, color_space) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("{err}; using {placeholder:?} placeholder");
                TextureImage::placeholder(relative, placeholder, color_space)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("haunted-house-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_texture_is_an_error() {
        let loader = TextureLoader::new("no/such/root");
        let err = loader.load("door/color.jpg", ColorSpace::Srgb).unwrap_err();
        assert!(matches!(err, HauntedError::TextureMissing(_)));
    }

    #[test]
    fn missing_texture_falls_back_to_placeholder() {
        let loader = TextureLoader::new("no/such/root");
        let normal = loader.load_or_placeholder(
            "door/normal.jpg",
            ColorSpace::Linear,
            Placeholder::FlatNormal,
        );
        assert_eq!((normal.width(), normal.height()), (1, 1));
        assert_eq!(normal.pixels.get_pixel(0, 0).0, [128, 128, 255, 255]);
        assert_eq!(normal.format(), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn colour_maps_use_srgb_format() {
        let image = TextureImage::placeholder("c", Placeholder::White, ColorSpace::Srgb);
        assert_eq!(image.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn loads_and_flips_png() {
        let dir = temp_dir("flip");
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255])); // top-left red
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255])); // bottom-left blue
        img.save(dir.join("tile.png")).unwrap();

        let loaded = TextureLoader::new(&dir).load("tile.png", ColorSpace::Srgb).unwrap();
        // First row uploaded is now the bottom of the source image
        assert_eq!(loaded.pixels.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(loaded.pixels.get_pixel(0, 1).0, [255, 0, 0, 255]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn undecodable_file_is_a_decode_error() {
        let dir = temp_dir("garbage");
        std::fs::write(dir.join("bad.png"), b"not an image").unwrap();
        let err = TextureLoader::new(&dir).load("bad.png", ColorSpace::Linear).unwrap_err();
        assert!(matches!(err, HauntedError::TextureDecode { .. }));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn mip_chain_halves_to_one_texel() {
        let image = TextureImage {
            label: "grass".to_string(),
            pixels: RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255])),
            color_space: ColorSpace::Linear,
        };
        assert_eq!(image.mip_level_count(), 4);

        let chain = image.mip_chain();
        let sizes: Vec<_> = chain.iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
        // Uniform input stays uniform
        assert_eq!(chain[3].get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    fn black_and_white(color_space: ColorSpace) -> TextureImage {
        let mut pixels = RgbaImage::new(2, 1);
        pixels.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        pixels.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        TextureImage {
            label: "checker".to_string(),
            pixels,
            color_space,
        }
    }

    #[test]
    fn colour_mips_average_in_linear_light() {
        let chain = black_and_white(ColorSpace::Srgb).mip_chain();
        let [r, g, b, a] = chain[1].get_pixel(0, 0).0;
        // Half-intensity light encodes to ~188, not the gamma-space midpoint 128
        assert!((180..=195).contains(&r), "r = {r}");
        assert_eq!((r, a), (g, 255));
        assert_eq!(g, b);
    }

    #[test]
    fn data_mips_average_raw_values() {
        let chain = black_and_white(ColorSpace::Linear).mip_chain();
        let r = chain[1].get_pixel(0, 0).0[0];
        assert!((120..=135).contains(&r), "r = {r}");
    }

    #[test]
    fn srgb_mips_keep_uniform_colours() {
        let image = TextureImage {
            label: "roof".to_string(),
            pixels: RgbaImage::from_pixel(4, 4, Rgba([179, 95, 69, 255])),
            color_space: ColorSpace::Srgb,
        };
        let chain = image.mip_chain();
        assert_eq!(chain.len(), 3);
        for level in &chain {
            let texel = level.get_pixel(0, 0).0;
            for (c, expected) in texel.iter().zip([179u8, 95, 69, 255]) {
                assert!(c.abs_diff(expected) <= 1, "{texel:?}");
            }
        }
    }

    #[test]
    fn repeating_sampling() {
        let grass = TextureSampling::repeating(8.0, 8.0);
        assert_eq!(grass.wrap.address_mode(), wgpu::AddressMode::Repeat);
        assert_eq!(grass.repeat, [8.0, 8.0]);
        assert_eq!(TextureSampling::default().wrap, WrapMode::ClampToEdge);
    }
}
