//! Geopoint encoding.
//!
//! A (latitude, longitude) pair is packed into a single sortable u64 token:
//! each coordinate is quantized to 32 bits over its domain and the two are
//! bit-interleaved along a space-filling curve, latitude on the odd bits and
//! longitude on the even bits. Nearby points share long prefixes, so the
//! tokens index and compare cheaply.

const CELLS: f64 = 4_294_967_296.0; // 2^32

/// Encode a coordinate pair into a space-filling-curve point index.
/// Coordinates outside the valid domain are clamped to it.
pub fn encode(latitude: f64, longitude: f64) -> u64 {
    let lat = quantize(latitude, -90.0, 90.0);
    let lon = quantize(longitude, -180.0, 180.0);
    (spread(lat) << 1) | spread(lon)
}

/// Decode a point index back to the center of its quantization cell.
pub fn decode(point: u64) -> (f64, f64) {
    let lat = compact(point >> 1);
    let lon = compact(point);
    (
        dequantize(lat, -90.0, 90.0),
        dequantize(lon, -180.0, 180.0),
    )
}

fn quantize(value: f64, low: f64, high: f64) -> u32 {
    let scaled = (value.clamp(low, high) - low) / (high - low) * CELLS;
    if scaled >= CELLS { u32::MAX } else { scaled as u32 }
}

fn dequantize(cell: u32, low: f64, high: f64) -> f64 {
    low + (cell as f64 + 0.5) / CELLS * (high - low)
}

// Spread the 32 bits of x over the even bits of a u64
fn spread(x: u32) -> u64 {
    let mut x = x as u64;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

// Inverse of spread: gather the even bits of x into a u32
fn compact(x: u64) -> u32 {
    let mut x = x & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}
