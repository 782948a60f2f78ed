use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const BACKGROUND: u8 = 40;
pub const PLATE: u8 = 220;
pub const INK: u8 = 30;

/// Axis-aligned plate `[x0, y0, x1, y1)` used by the generators below.
pub const PLATE_BOX: [u32; 4] = [170, 200, 470, 276];

fn fill(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, value: u8) {
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, Luma([value]));
        }
    }
}

fn plate_scene() -> GrayImage {
    let mut img = GrayImage::from_pixel(640, 480, Luma([BACKGROUND]));
    let [x0, y0, x1, y1] = PLATE_BOX;
    fill(&mut img, x0, y0, x1, y1, PLATE);
    img
}

/// Light 300x76 plate on a dark 640x480 background carrying five dark
/// 20x40 characters spaced 55 px apart.
pub fn plate_with_characters() -> GrayImage {
    let mut img = plate_scene();
    for i in 0..5 {
        let x = 185 + 55 * i;
        fill(&mut img, x, 218, x + 20, 258, INK);
    }
    img
}

/// Same plate covered with 4 px dark bars every 10 px: plenty of vertical
/// edges but nothing character-shaped.
pub fn plate_with_bars() -> GrayImage {
    let mut img = plate_scene();
    let mut x = 180;
    while x + 4 <= 466 {
        fill(&mut img, x, 208, x + 4, 268, INK);
        x += 10;
    }
    img
}

/// Random `cell`-sized blocks; a textured scene for feature matching.
pub fn random_blocks(width: u32, height: u32, cell: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let cols = width.div_ceil(cell);
    let rows = height.div_ceil(cell);
    let values: Vec<u8> = (0..cols * rows).map(|_| rng.gen_range(0..=255)).collect();
    GrayImage::from_fn(width, height, |x, y| {
        Luma([values[((y / cell) * cols + x / cell) as usize]])
    })
}
