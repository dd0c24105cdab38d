// Generated placeholder artworks: a diagonal two-tone gradient with a
// handful of translucent discs. The composition depends only on the seed,
// so the low and high resolution tiers show the same piece.

use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng, rngs::StdRng};

pub const LOW_RES: u32 = 256;
pub const HIGH_RES: u32 = 512;

struct Disc {
    // Centre and radius as fractions of the texture edge
    cx: f32,
    cy: f32,
    r: f32,
    alpha: f32,
    rgb: [f32; 3],
}

pub fn generate_artwork_texture(seed: u64, size: u32) -> RgbaImage {
    let size = size.max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let hue = rng.gen_range(0.0..360.0_f32);
    let start = hsl_to_rgb(hue, 0.7, 0.6);
    let end = hsl_to_rgb((hue + 40.0) % 360.0, 0.7, 0.4);

    let disc_count = rng.gen_range(6..12);
    let discs: Vec<Disc> = (0..disc_count)
        .map(|i| Disc {
            cx: rng.gen_range(0.0..1.0),
            cy: rng.gen_range(0.0..1.0),
            r: rng.gen_range(10.0..70.0) / 256.0,
            alpha: rng.gen_range(0.2..0.7),
            rgb: hsl_to_rgb((hue + i as f32 * 20.0) % 360.0, 0.8, (0.3 + i as f32 * 0.05).min(1.0)),
        })
        .collect();

    let edge = size as f32;
    RgbaImage::from_fn(size, size, |x, y| {
        let (fx, fy) = ((x as f32 + 0.5) / edge, (y as f32 + 0.5) / edge);
        let t = ((fx + fy) / 2.0).clamp(0.0, 1.0);
        let mut rgb = [0.0; 3];
        for c in 0..3 {
            rgb[c] = start[c] + (end[c] - start[c]) * t;
        }
        for disc in &discs {
            let (dx, dy) = (fx - disc.cx, fy - disc.cy);
            if dx * dx + dy * dy <= disc.r * disc.r {
                for c in 0..3 {
                    rgb[c] = rgb[c] * (1.0 - disc.alpha) + disc.rgb[c] * disc.alpha;
                }
            }
        }
        Rgba([to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), 255])
    })
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// h in degrees, s and l in [0, 1].
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h % 360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m]
}
