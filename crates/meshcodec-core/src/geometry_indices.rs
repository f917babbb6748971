//! Strongly typed indices used across the connectivity and attribute layers.
//!
//! All of them wrap a `u32`; `u32::MAX` is reserved as the invalid sentinel.

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident, $invalid:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        pub const $invalid: $name = $name(u32::MAX);

        impl $name {
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }

            #[inline]
            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v as u32)
            }
        }

        impl From<$name> for u32 {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl From<$name> for usize {
            fn from(v: $name) -> Self {
                v.0 as usize
            }
        }
    };
}

define_index!(
    /// Index of a unique value stored in a point attribute.
    AttributeValueIndex,
    INVALID_ATTRIBUTE_VALUE_INDEX
);
define_index!(
    /// Index of a point of a point cloud or mesh.
    PointIndex,
    INVALID_POINT_INDEX
);
define_index!(
    /// Index of a connectivity vertex of a corner table.
    VertexIndex,
    INVALID_VERTEX_INDEX
);
define_index!(
    /// Index of a corner, `face * 3 + local_index`.
    CornerIndex,
    INVALID_CORNER_INDEX
);
define_index!(
    /// Index of a triangle.
    FaceIndex,
    INVALID_FACE_INDEX
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinels() {
        assert!(!INVALID_CORNER_INDEX.is_valid());
        assert!(CornerIndex(0).is_valid());
        assert_eq!(usize::from(VertexIndex(7)), 7);
        assert_eq!(PointIndex::from(3usize), PointIndex(3));
    }
}
