/// Element topologies with a known node count.
///
/// The discriminants are the element type codes used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ElementType {
    Line = 1,
    Triangle = 2,
    Quadrangle = 3,
    Tetrahedron = 4,
    Hexahedron = 5,
    Prism = 6,
    Pyramid = 7,
    Line3 = 8,
    Triangle6 = 9,
    Quadrangle9 = 10,
    Tetrahedron10 = 11,
    Point = 15,
}

impl ElementType {
    pub const ALL: [ElementType; 12] = [
        Self::Line,
        Self::Triangle,
        Self::Quadrangle,
        Self::Tetrahedron,
        Self::Hexahedron,
        Self::Prism,
        Self::Pyramid,
        Self::Line3,
        Self::Triangle6,
        Self::Quadrangle9,
        Self::Tetrahedron10,
        Self::Point,
    ];

    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => Self::Line,
            2 => Self::Triangle,
            3 => Self::Quadrangle,
            4 => Self::Tetrahedron,
            5 => Self::Hexahedron,
            6 => Self::Prism,
            7 => Self::Pyramid,
            8 => Self::Line3,
            9 => Self::Triangle6,
            10 => Self::Quadrangle9,
            11 => Self::Tetrahedron10,
            15 => Self::Point,
            _ => return None,
        })
    }

    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Returns the number of nodes an element of this type references.
    pub const fn node_count(self) -> usize {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Triangle | Self::Line3 => 3,
            Self::Quadrangle | Self::Tetrahedron => 4,
            Self::Pyramid => 5,
            Self::Prism | Self::Triangle6 => 6,
            Self::Hexahedron => 8,
            Self::Quadrangle9 => 9,
            Self::Tetrahedron10 => 10,
        }
    }

    /// Topological dimension of the element.
    pub const fn dimension(self) -> u8 {
        match self {
            Self::Point => 0,
            Self::Line | Self::Line3 => 1,
            Self::Triangle
            | Self::Quadrangle
            | Self::Triangle6
            | Self::Quadrangle9 => 2,
            Self::Tetrahedron
            | Self::Hexahedron
            | Self::Prism
            | Self::Pyramid
            | Self::Tetrahedron10 => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_table() {
        for ty in ElementType::ALL {
            assert_eq!(ElementType::from_code(ty.code()), Some(ty));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        for code in [0, 12, 14, 16, -1] {
            assert_eq!(ElementType::from_code(code), None);
        }
    }

    #[test]
    fn node_counts() {
        assert_eq!(ElementType::Point.node_count(), 1);
        assert_eq!(ElementType::Triangle.node_count(), 3);
        assert_eq!(ElementType::Hexahedron.node_count(), 8);
        assert_eq!(ElementType::Tetrahedron10.node_count(), 10);
        assert_eq!(ElementType::Prism.dimension(), 3);
    }
}
