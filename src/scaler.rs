use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Source row/column for every destination pixel, so flat-shaded spans stay
/// crisp when stretched to the window.
pub struct ScaleLut {
    src_x: Vec<usize>,
    src_row: Vec<usize>, // already multiplied by the source width
}

impl ScaleLut {
    pub fn empty() -> Self {
        Self {
            src_x: Vec::new(),
            src_row: Vec::new(),
        }
    }
}

fn nearest(dst: usize, dst_len: usize, src_len: usize) -> usize {
    // sample at pixel centers
    let f = (dst as f32 + 0.5) * src_len as f32 / dst_len as f32;
    (f as usize).min(src_len.saturating_sub(1))
}

pub fn build_scale_lut(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> ScaleLut {
    ScaleLut {
        src_x: (0..dst_w).map(|x| nearest(x, dst_w, src_w)).collect(),
        src_row: (0..dst_h).map(|y| nearest(y, dst_h, src_h) * src_w).collect(),
    }
}

/// Parallel nearest-neighbour stretch, one destination row per task.
pub fn blit_nearest_stretch(dst: &mut [u32], dw: usize, src: &[u32], lut: &ScaleLut) {
    dst.par_chunks_mut(dw)
        .zip(lut.src_row.par_iter())
        .for_each(|(dst_row, &row)| {
            for (out, &sx) in dst_row.iter_mut().zip(&lut.src_x) {
                *out = src[row + sx];
            }
        });
}

/// Internal framebuffer size for a window: fixed height, width following the
/// window's aspect, rounded up to even.
pub fn internal_size(dst_w: usize, dst_h: usize, target_h: usize) -> (usize, usize) {
    let aspect = if dst_h > 0 {
        dst_w as f32 / dst_h as f32
    } else {
        1.0
    };
    let mut w = ((target_h as f32 * aspect).round() as usize).max(160);
    if w % 2 != 0 {
        w += 1;
    }
    (w, target_h)
}
