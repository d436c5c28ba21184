//! Coin type table.
//!
//! Every spawned coin picks one entry uniformly at random. Dimensions are in
//! metres and masses in kilograms, matching real-world coins.

/// Material tag of a coin, used by the presentation layer for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoinMaterial {
    Aluminum,
    Brass,
    Copper,
    Silver,
}

impl CoinMaterial {
    pub fn name(self) -> &'static str {
        match self {
            CoinMaterial::Aluminum => "aluminum",
            CoinMaterial::Brass => "brass",
            CoinMaterial::Copper => "copper",
            CoinMaterial::Silver => "silver",
        }
    }
}

/// Static description of one kind of coin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinType {
    /// Diameter (m)
    pub diameter: f32,
    /// Thickness (m)
    pub thickness: f32,
    /// Mass (kg) at the default mass parameter
    pub mass: f32,
    pub material: CoinMaterial,
}

impl CoinType {
    /// Collider radius.
    pub fn radius(&self) -> f32 {
        self.diameter * 0.5
    }

    /// Half height of the cylinder collider.
    pub fn half_thickness(&self) -> f32 {
        self.thickness * 0.5
    }
}

/// All coin kinds that can be spawned. Never empty.
pub const COIN_TYPES: [CoinType; 6] = [
    CoinType {
        diameter: 0.0200,
        thickness: 0.0015,
        mass: 0.001,
        material: CoinMaterial::Aluminum,
    },
    CoinType {
        diameter: 0.0220,
        thickness: 0.0015,
        mass: 0.00375,
        material: CoinMaterial::Brass,
    },
    CoinType {
        diameter: 0.0235,
        thickness: 0.0015,
        mass: 0.0045,
        material: CoinMaterial::Copper,
    },
    CoinType {
        diameter: 0.0210,
        thickness: 0.0017,
        mass: 0.004,
        material: CoinMaterial::Silver,
    },
    CoinType {
        diameter: 0.0226,
        thickness: 0.0017,
        mass: 0.0048,
        material: CoinMaterial::Silver,
    },
    CoinType {
        diameter: 0.0265,
        thickness: 0.0018,
        mass: 0.007,
        material: CoinMaterial::Silver,
    },
];

/// Look up a coin type by its table index.
pub fn coin_type(index: usize) -> Option<&'static CoinType> {
    COIN_TYPES.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_table_is_valid() {
        assert!(!COIN_TYPES.is_empty(), "coin table must not be empty");
        for coin in &COIN_TYPES {
            assert!(coin.diameter > 0.0, "diameter should be positive");
            assert!(coin.thickness > 0.0, "thickness should be positive");
            assert!(coin.mass > 0.0, "mass should be positive");
            assert!(
                coin.thickness < coin.diameter,
                "coins are thinner than they are wide"
            );
        }
    }

    #[test]
    fn test_radius_is_half_diameter() {
        let coin = COIN_TYPES[5];
        assert_eq!(coin.radius(), 0.01325);
        assert_eq!(coin.half_thickness(), 0.0009);
    }

    #[test]
    fn test_lookup_out_of_range() {
        assert!(coin_type(0).is_some());
        assert!(coin_type(COIN_TYPES.len()).is_none());
    }
}
