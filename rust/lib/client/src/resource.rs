//! Resource registry.
//!
//! Maps singular/plural resource names to REST collection paths.

use std::fmt;
use std::str::FromStr;

/// A named collection exposed through uniform REST endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Transporters,
    Materials,
    MaterialCategories,
    VehicleTypes,
    Edges,
    Shipments,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Transporters,
        Resource::Materials,
        Resource::MaterialCategories,
        Resource::VehicleTypes,
        Resource::Edges,
        Resource::Shipments,
    ];

    /// Collection name as it appears in the URL.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Transporters => "transporters",
            Resource::Materials => "materials",
            Resource::MaterialCategories => "material-categories",
            Resource::VehicleTypes => "vehicle-types",
            Resource::Edges => "edges",
            Resource::Shipments => "shipments",
        }
    }

    /// Singular noun, used in CLI output.
    pub fn singular(self) -> &'static str {
        match self {
            Resource::Transporters => "transporter",
            Resource::Materials => "material",
            Resource::MaterialCategories => "material-category",
            Resource::VehicleTypes => "vehicle-type",
            Resource::Edges => "edge",
            Resource::Shipments => "shipment",
        }
    }

    /// Collection path: `/{name}`.
    pub fn collection_path(self) -> String {
        format!("/{}", self.name())
    }

    /// Item path: `/{name}/{id}`.
    pub fn item_path(self, id: i64) -> String {
        format!("/{}/{}", self.name(), id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource type: {0}")]
pub struct UnknownResource(pub String);

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "transporter" | "transporters" => Ok(Resource::Transporters),
            "material" | "materials" => Ok(Resource::Materials),
            "material-category" | "material-categories" | "category" | "categories" => {
                Ok(Resource::MaterialCategories)
            }
            "vehicle-type" | "vehicle-types" | "vehicle" | "vehicles" => Ok(Resource::VehicleTypes),
            "edge" | "edges" | "location" | "locations" => Ok(Resource::Edges),
            "shipment" | "shipments" => Ok(Resource::Shipments),
            _ => Err(UnknownResource(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_singular_plural_and_underscores() {
        assert_eq!("materials".parse::<Resource>().unwrap(), Resource::Materials);
        assert_eq!("Material".parse::<Resource>().unwrap(), Resource::Materials);
        assert_eq!("vehicle_types".parse::<Resource>().unwrap(), Resource::VehicleTypes);
        assert_eq!("material-category".parse::<Resource>().unwrap(), Resource::MaterialCategories);
        assert!("widgets".parse::<Resource>().is_err());
    }

    #[test]
    fn paths() {
        assert_eq!(Resource::VehicleTypes.collection_path(), "/vehicle-types");
        assert_eq!(Resource::Shipments.item_path(42), "/shipments/42");
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for r in Resource::ALL {
            assert_eq!(r.name().parse::<Resource>().unwrap(), r);
        }
    }
}
