//! Body and frame name resolution (NAIF ids)

use crate::error::{EphemerisError, EphemerisResult};
use crate::kernel_pool::KernelPool;

/// Built-in body names (NAIF integer codes)
const BODIES: &[(&str, i32)] = &[
    ("SOLAR SYSTEM BARYCENTER", 0),
    ("SSB", 0),
    ("MERCURY BARYCENTER", 1),
    ("VENUS BARYCENTER", 2),
    ("EARTH BARYCENTER", 3),
    ("EMB", 3),
    ("MARS BARYCENTER", 4),
    ("JUPITER BARYCENTER", 5),
    ("SATURN BARYCENTER", 6),
    ("URANUS BARYCENTER", 7),
    ("NEPTUNE BARYCENTER", 8),
    ("PLUTO BARYCENTER", 9),
    ("SUN", 10),
    ("MERCURY", 199),
    ("VENUS", 299),
    ("MOON", 301),
    ("EARTH", 399),
    ("PHOBOS", 401),
    ("DEIMOS", 402),
    ("MARS", 499),
    ("IO", 501),
    ("EUROPA", 502),
    ("GANYMEDE", 503),
    ("CALLISTO", 504),
    ("JUPITER", 599),
    ("ENCELADUS", 602),
    ("TITAN", 606),
    ("SATURN", 699),
    ("URANUS", 799),
    ("TRITON", 801),
    ("NEPTUNE", 899),
    ("CHARON", 901),
    ("PLUTO", 999),
    ("MARS EXPRESS", -41),
    ("MEX", -41),
    ("ROSETTA", -226),
    ("VENUS EXPRESS", -248),
    ("VEX", -248),
    ("JUICE", -28),
    ("67P/C-G", 1000012),
    ("CHURYUMOV-GERASIMENKO", 1000012),
];

/// Built-in inertial frames (ids as used by ANISE orientation data)
const FRAMES: &[(&str, i32)] = &[
    ("J2000", 1),
    ("B1950", 2),
    ("FK4", 3),
    ("GALACTIC", 13),
    ("MARSIAU", 16),
    ("ECLIPJ2000", 17),
    ("ECLIPB1950", 18),
    ("ITRF93", 3000),
];

/// Uppercase, trimmed, internal blanks collapsed
pub fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

/// Resolve a body (or instrument) name to its NAIF id.
///
/// Kernel pool `NAIF_BODY_NAME` / `NAIF_BODY_CODE` assignments take
/// precedence over the built-in table, the last assignment winning.
/// Integer strings are accepted as ids.
pub fn body_id(name: &str, pool: &KernelPool) -> EphemerisResult<i32> {
    let key = normalize(name);
    if let Ok(id) = key.parse::<i32>() {
        return Ok(id);
    }

    if let (Some(names), Some(codes)) = (pool.strings("NAIF_BODY_NAME"), pool.numbers("NAIF_BODY_CODE")) {
        if let Some((_, code)) = names
            .iter()
            .zip(codes.iter())
            .rev()
            .find(|(n, _)| normalize(n) == key)
        {
            return Ok(*code as i32);
        }
    }

    BODIES
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, id)| *id)
        .ok_or_else(|| EphemerisError::BodyNotFound(name.to_string()))
}

/// Resolve a reference frame name to a frame id.
///
/// Order: kernel pool `FRAME_<NAME>`, built-in inertial frames,
/// `IAU_<BODY>` (id of the body), integer literal.
pub fn frame_id(name: &str, pool: &KernelPool) -> EphemerisResult<i32> {
    let key = normalize(name);

    if let Some(id) = pool.first_number(&format!("FRAME_{}", key)) {
        return Ok(id as i32);
    }
    if let Some((_, id)) = FRAMES.iter().find(|(n, _)| *n == key) {
        return Ok(*id);
    }
    if let Some(body) = key.strip_prefix("IAU_") {
        return body_id(body, pool).map_err(|_| EphemerisError::FrameNotFound(name.to_string()));
    }
    key.parse::<i32>()
        .map_err(|_| EphemerisError::FrameNotFound(name.to_string()))
}
