//! Assertion helpers for tests.

use focusblur::rendering::{DiffusionTable, PixelImage};
use pretty_assertions::assert_eq;

/// Sum of every weight of the full kernel at `level`.
pub fn kernel_sum(table: &mut DiffusionTable, level: i32) -> f32 {
    let r = table.radius_int() as i32;
    let mut sum = 0.0;
    for y in -r..=r {
        for x in -r..=r {
            sum += table.get(level, 0, 0, x, y);
        }
    }
    sum
}

/// Assert the kernel at `level` keeps brightness.
pub fn assert_kernel_normalized(table: &mut DiffusionTable, level: i32) {
    let sum = kernel_sum(table, level);
    assert!(
        (sum - 1.0).abs() < 1e-3,
        "Kernel at level {level} sums to {sum}, expected 1"
    );
}

/// Assert the kernel at `level` is the same in every direction.
pub fn assert_kernel_symmetric(table: &mut DiffusionTable, level: i32) {
    let r = table.radius_int() as i32;
    for y in -r..=r {
        for x in -r..=r {
            let w = table.get(level, 0, 0, x, y);
            assert_eq!(w, table.get(level, 0, 0, -x, y), "x mirror at ({x}, {y})");
            assert_eq!(w, table.get(level, 0, 0, x, -y), "y mirror at ({x}, {y})");
        }
    }
}

/// Assert two images share size and layout.
pub fn assert_same_shape(a: &PixelImage, b: &PixelImage) {
    assert_eq!(
        (a.width(), a.height(), a.layout()),
        (b.width(), b.height(), b.layout()),
        "Image shapes differ"
    );
}

/// Assert every byte of `a` is within `tolerance` of `b`.
pub fn assert_images_close(a: &PixelImage, b: &PixelImage, tolerance: u8) {
    assert_same_shape(a, b);
    for (i, (&x, &y)) in a.data().iter().zip(b.data()).enumerate() {
        assert!(
            x.abs_diff(y) <= tolerance,
            "Byte {i} differs: {x} vs {y} (tolerance {tolerance})"
        );
    }
}

/// Mean of all bytes.
pub fn mean(image: &PixelImage) -> f64 {
    let data = image.data();
    data.iter().map(|&v| v as f64).sum::<f64>() / data.len().max(1) as f64
}
