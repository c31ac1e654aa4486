//! The fixed product category set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A product category. The set is closed; anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fridge,
    Watch,
    Phone,
    Laptops,
    Clothes,
    Tshirts,
    Fan,
    Cooler,
    TV,
    AC,
    Bike,
    Car,
    Cycles,
}

/// Returned when a string does not name one of the known categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid category: {0}")]
pub struct InvalidCategory(pub String);

impl Category {
    /// Every category, in catalog display order.
    pub const ALL: [Category; 13] = [
        Category::Fridge,
        Category::Watch,
        Category::Phone,
        Category::Laptops,
        Category::Clothes,
        Category::Tshirts,
        Category::Fan,
        Category::Cooler,
        Category::TV,
        Category::AC,
        Category::Bike,
        Category::Car,
        Category::Cycles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fridge => "Fridge",
            Category::Watch => "Watch",
            Category::Phone => "Phone",
            Category::Laptops => "Laptops",
            Category::Clothes => "Clothes",
            Category::Tshirts => "Tshirts",
            Category::Fan => "Fan",
            Category::Cooler => "Cooler",
            Category::TV => "TV",
            Category::AC => "AC",
            Category::Bike => "Bike",
            Category::Car => "Car",
            Category::Cycles => "Cycles",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = InvalidCategory;

    // Matching is exact: "phone" is not "Phone".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| InvalidCategory(s.to_string()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_round_trips_through_its_name() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "Toaster".parse::<Category>(),
            Err(InvalidCategory("Toaster".to_string()))
        );
        assert!("phone".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn serializes_as_plain_name() {
        assert_eq!(serde_json::to_string(&Category::TV).unwrap(), "\"TV\"");
    }
}
