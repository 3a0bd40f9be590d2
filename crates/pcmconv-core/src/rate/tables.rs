//! Constant tables for the rate converters

/// Half the polyphase filter length
pub const FILTER_HALF_LENGTH: usize = 64;

/// Taps per polyphase filter phase
pub const FILTER_LENGTH: usize = 2 * FILTER_HALF_LENGTH;

/// Samples per channel held by a rate conversion window
pub const WINDOW_CAPACITY: usize = 24 * FILTER_HALF_LENGTH;

/// Fractional bits of the polyphase coefficients
pub const COEFF_SHIFT: u32 = 14;

/// Fractional bits of the half-band coefficients
pub const HALF_BAND_SHIFT: u32 = 15;

/// Kaiser half window (beta = 7), unsigned 16-bit
///
/// Entry `k` is divided by `k + 1` before storage, so multiplying it back
/// by `k + 1` yields the amplitude ramp that shapes the filter edge.
pub const KAISER_HALF_WINDOW: [u16; FILTER_HALF_LENGTH] = [
    22930, 16292, 14648, 14288, 14470, 14945, 15608, 16404,
    17304, 18289, 19347, 20467, 21644, 22872, 24145, 25460,
    26812, 28198, 29612, 31052, 32513, 33991, 35482, 36983,
    38487, 39993, 41494, 42986, 44466, 45928, 47368, 48782,
    50165, 51513, 52821, 54086, 55302, 56466, 57575, 58624,
    59610, 60529, 61379, 62156, 62858, 63483, 64027, 64490,
    64870, 65165, 65375, 65498, 65535, 65484, 65347, 65124,
    64815, 64422, 63946, 63389, 62753, 62039, 61251, 60391,
];

/// Odd-indexed taps of a 63-tap half-band low-pass (Q15)
///
/// Entry `k` weighs the pair of samples `2k + 1` away from the centre.
/// The centre tap is 0.5 and every other even tap is zero. The entries sum
/// to 0.5 so the filter has unit DC gain.
pub const HALF_BAND: [i32; 16] = [
    20798, -6759, 3854, -2548, 1785, -1279, 920, -656,
    459, -314, 207, -130, 77, -42, 20, -8,
];

/// Rational approximation candidates `(numerator, denominator)`
///
/// Ordered by denominator. Together they cover `[31/64, 64/31]` finely
/// enough that the best candidate is typically within 0.2%.
pub const FRACTION_CANDIDATES: [(u32, u32); 81] = [
    (1, 1), (2, 1),
    (1, 2), (3, 2),
    (2, 3), (4, 3), (5, 3),
    (3, 4), (5, 4), (7, 4),
    (3, 5), (4, 5), (6, 5), (7, 5), (8, 5), (9, 5),
    (5, 6), (7, 6), (11, 6),
    (4, 7), (5, 7), (6, 7), (8, 7), (9, 7), (10, 7), (11, 7), (12, 7), (13, 7),
    (5, 8), (7, 8), (9, 8), (11, 8), (13, 8), (15, 8),
    (5, 9), (7, 9), (8, 9), (10, 9), (11, 9), (13, 9), (14, 9), (16, 9),
    (7, 10), (9, 10), (11, 10), (13, 10),
    (6, 11), (7, 11), (8, 11), (9, 11), (10, 11), (12, 11), (13, 11), (14, 11), (15, 11), (16, 11),
    (7, 12), (11, 12), (13, 12),
    (7, 13), (8, 13), (9, 13), (10, 13), (11, 13), (12, 13), (14, 13), (15, 13), (16, 13),
    (9, 14), (11, 14), (13, 14), (15, 14),
    (8, 15), (11, 15), (13, 15), (14, 15), (16, 15),
    (9, 16), (11, 16), (13, 16), (15, 16),
];
