//! Bitstream version constants.
//!
//! A few field layouts depend on the version a stream was written with, so
//! both sides need to agree on it.

/// Latest major version of the mesh bitstream.
pub const MESH_BITSTREAM_VERSION_MAJOR: u8 = 2;

/// Latest minor version of the mesh bitstream.
pub const MESH_BITSTREAM_VERSION_MINOR: u8 = 2;

/// Version written by default.
pub const DEFAULT_MESH_VERSION: (u8, u8) = (MESH_BITSTREAM_VERSION_MAJOR, MESH_BITSTREAM_VERSION_MINOR);

/// Oldest version still decodable.
pub const OLDEST_SUPPORTED_VERSION: (u8, u8) = (2, 0);

/// From this version on the plain octahedron transform no longer stores its
/// center value and the geometric normal scheme no longer stores its
/// prediction mode.
pub const VERSION_IMPLICIT_NORMAL_PARAMETERS: (u8, u8) = (2, 2);

#[inline]
pub const fn bitstream_version(major: u8, minor: u8) -> u16 {
    ((major as u16) << 8) | minor as u16
}

pub fn is_version_supported(major: u8, minor: u8) -> bool {
    let v = bitstream_version(major, minor);
    v >= bitstream_version(OLDEST_SUPPORTED_VERSION.0, OLDEST_SUPPORTED_VERSION.1)
        && v <= bitstream_version(DEFAULT_MESH_VERSION.0, DEFAULT_MESH_VERSION.1)
}

pub fn has_implicit_normal_parameters(version: u16) -> bool {
    version >= bitstream_version(VERSION_IMPLICIT_NORMAL_PARAMETERS.0, VERSION_IMPLICIT_NORMAL_PARAMETERS.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_range() {
        assert!(is_version_supported(2, 2));
        assert!(is_version_supported(2, 1));
        assert!(!is_version_supported(1, 3));
        assert!(!is_version_supported(2, 3));
        assert!(!has_implicit_normal_parameters(bitstream_version(2, 1)));
        assert!(has_implicit_normal_parameters(bitstream_version(2, 2)));
    }
}
