//! Quantisation of a car's direction vector into sprite pitch, roll and yaw.
//!
//! All three use 16 steps per full turn. Pitch and yaw are classified with
//! two tangent thresholds per octant instead of trigonometry.

/// tan(11.25 degrees)
pub const TAN11_25: f64 = 0.198_912_367_379_658;
/// tan(33.75 degrees)
pub const TAN33_75: f64 = 0.668_178_637_919_298_9;

/// Sine of the 16 roll steps; the cosine is the same table offset by 4.
const SIN_COS: [f64; 20] = [
    0.00, 0.38, 0.71, 0.92, //
    1.00, 0.92, 0.71, 0.38, 0.00, -0.38, -0.71, -0.92, -1.00, -0.92, -0.71, -0.38, //
    0.00, 0.38, 0.71, 0.92,
];

/// Roll step of a bank angle: nearest step, wrapped into `0..16`.
pub fn roll_bucket(bank: f64) -> u8 {
    ((bank + 0.5).floor() as i64).rem_euclid(16) as u8
}

/// Rotate `(dy, dz)` around the x axis by `roll` steps into the frame the
/// car sprites are drawn in. Sideways motion on a bank turns into climb.
pub fn unroll(roll: u8, dy: i32, dz: i32) -> (i32, i32) {
    let step = usize::from(roll & 0xF);
    let (sin, cos) = (SIN_COS[step], SIN_COS[step + 4]);
    let (dy, dz) = (f64::from(dy), f64::from(dz));
    ((dy * cos - dz * sin) as i32, (dy * sin + dz * cos) as i32)
}

/// Pitch step of direction `(dx, dy, dz)`: 0 is level, 4 straight up,
/// 12 straight down.
pub fn pitch_bucket(dx: i32, dy: i32, dz: i32) -> u8 {
    let horizontal = f64::from(dx).hypot(f64::from(dy));
    let descending = dz < 0;
    let vertical = f64::from(dz).abs();

    let pitch = if horizontal < vertical {
        if horizontal < vertical * TAN11_25 {
            4
        } else if horizontal < vertical * TAN33_75 {
            3
        } else {
            2
        }
    } else if vertical < horizontal * TAN11_25 {
        0
    } else if vertical < horizontal * TAN33_75 {
        1
    } else {
        2
    };
    if descending {
        (16 - pitch) & 0xF
    } else {
        pitch
    }
}

/// Yaw step of horizontal direction `(dx, dy)`: 0 along -x, 4 along -y,
/// 8 along +x, 12 along +y.
pub fn yaw_bucket(dx: i32, dy: i32) -> u8 {
    // Fold into the quadrant where both components are non-positive.
    let flip_x = dx > 0;
    let flip_y = dy > 0;
    let x = -dx.abs();
    let y = -dy.abs();
    let (x, y) = (f64::from(x), f64::from(y));

    let yaw = if x < y {
        if x * TAN11_25 < y {
            0
        } else if x * TAN33_75 < y {
            1
        } else {
            2
        }
    } else if y * TAN11_25 < x {
        4
    } else if y * TAN33_75 < x {
        3
    } else {
        2
    };
    let yaw = if flip_x { 8 - yaw } else { yaw };
    if flip_y {
        (16 - yaw) & 0xF
    } else {
        yaw
    }
}
