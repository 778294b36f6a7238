use crate::{
    camera::Camera,
    raycaster::{CastSettings, Span, trace_frame},
    world::World,
};

pub const BACKGROUND: u32 = pack_rgb(0, 0, 0);

#[inline]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
    // Alpha at 0
}

/// Writes one span into column `x` of a row-major buffer.
#[inline]
pub fn draw_span(buf: &mut [u32], width: usize, x: usize, span: &Span) {
    let mut idx = span.top * width + x;
    for _y in span.top..span.bottom {
        buf[idx] = span.color;
        idx += width;
    }
}

/// Clears the frame and draws every column's spans in trace order, so later
/// portal hops paint over earlier ones. Returns the number of columns that hit
/// at least one wall.
pub fn render_frame(
    buf: &mut [u32],
    width: usize,
    height: usize,
    world: &World,
    camera: &Camera,
    settings: &CastSettings,
) -> usize {
    buf[..width * height].fill(BACKGROUND);

    if world.is_empty() {
        return 0;
    }

    let columns = trace_frame(world, camera, width, height, settings);

    let mut drawn = 0;
    for (x, column) in columns.iter().enumerate() {
        if column.hits.is_empty() {
            continue;
        }
        drawn += 1;
        for span in &column.spans {
            draw_span(buf, width, x, span);
        }
    }
    drawn
}
