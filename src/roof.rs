//! Roof Description Module
//!
//! Strongly-typed roof record consumed by the calculation core, the loosely
//! typed record produced by the vision collaborator, and the conversion that
//! validates one into the other.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

// ===================== ENUMERATIONS =====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofShape {
    Rectangular,
    #[serde(alias = "L-shaped", alias = "l-shaped")]
    LShaped,
    Complex,
    Irregular,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofMaterial {
    AsphaltShingles,
    Tile,
    Metal,
    FlatMembrane,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Compass direction the main roof plane faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompassDirection {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl CompassDirection {
    /// Azimuth in degrees (0 = North, 90 = East, 180 = South)
    pub fn azimuth_deg(self) -> f64 {
        match self {
            CompassDirection::North => 0.0,
            CompassDirection::Northeast => 45.0,
            CompassDirection::East => 90.0,
            CompassDirection::Southeast => 135.0,
            CompassDirection::South => 180.0,
            CompassDirection::Southwest => 225.0,
            CompassDirection::West => 270.0,
            CompassDirection::Northwest => 315.0,
        }
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompassDirection::North => "north",
            CompassDirection::Northeast => "northeast",
            CompassDirection::East => "east",
            CompassDirection::Southeast => "southeast",
            CompassDirection::South => "south",
            CompassDirection::Southwest => "southwest",
            CompassDirection::West => "west",
            CompassDirection::Northwest => "northwest",
        };
        f.write_str(name)
    }
}

/// Overall shading on the roof, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingLevel {
    None,
    Minimal,
    #[serde(alias = "low")]
    Light,
    Moderate,
    #[serde(alias = "high", alias = "significant")]
    Heavy,
}

impl ShadingLevel {
    /// All levels from least to most severe
    pub const ALL: [ShadingLevel; 5] = [
        ShadingLevel::None,
        ShadingLevel::Minimal,
        ShadingLevel::Light,
        ShadingLevel::Moderate,
        ShadingLevel::Heavy,
    ];
}

impl fmt::Display for ShadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShadingLevel::None => "none",
            ShadingLevel::Minimal => "minimal",
            ShadingLevel::Light => "light",
            ShadingLevel::Moderate => "moderate",
            ShadingLevel::Heavy => "heavy",
        };
        f.write_str(name)
    }
}

// ===================== TYPED RECORD =====================

/// Obstruction counts on the roof surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObstructionCounts {
    pub chimneys: u32,
    pub vents: u32,
    pub skylights: u32,
    pub hvac_units: u32,
    pub satellite_dishes: u32,
    pub other: u32,
}

impl ObstructionCounts {
    pub fn total(&self) -> u32 {
        [self.chimneys, self.vents, self.skylights, self.hvac_units, self.satellite_dishes, self.other]
            .into_iter()
            .fold(0, u32::saturating_add)
    }
}

/// Structural description of a rooftop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoofDescription {
    /// Total roof area (m²)
    pub roof_area_sqm: f64,
    /// Area suitable for panels (m²), never above `roof_area_sqm`
    pub usable_area_sqm: f64,
    pub roof_shape: RoofShape,
    pub roof_material: RoofMaterial,
    pub roof_condition: RoofCondition,
    pub primary_direction: CompassDirection,
    /// Roof pitch from horizontal in degrees (0-90)
    pub tilt_degrees: f64,
    pub multiple_orientations: bool,
    pub obstructions: ObstructionCounts,
    pub shading_level: ShadingLevel,
}

impl RoofDescription {
    pub fn azimuth_deg(&self) -> f64 {
        self.primary_direction.azimuth_deg()
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in
            [("roof_area_sqm", self.roof_area_sqm), ("usable_area_sqm", self.usable_area_sqm)]
        {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::invalid(
                    format!("roof.{}", field),
                    value,
                    "must be a non-negative number",
                ));
            }
        }
        if self.usable_area_sqm > self.roof_area_sqm {
            return Err(AnalysisError::invalid(
                "roof.usable_area_sqm",
                self.usable_area_sqm,
                format!("exceeds total roof area {}", self.roof_area_sqm),
            ));
        }
        if !(0.0..=90.0).contains(&self.tilt_degrees) {
            return Err(AnalysisError::invalid(
                "roof.tilt_degrees",
                self.tilt_degrees,
                "must be between 0 and 90 degrees",
            ));
        }
        Ok(())
    }

    /// Fixed roof used for demos and whenever vision analysis is unavailable
    pub fn demo_fixture() -> Self {
        RoofDescription {
            roof_area_sqm: 180.0,
            usable_area_sqm: 153.0,
            roof_shape: RoofShape::Rectangular,
            roof_material: RoofMaterial::AsphaltShingles,
            roof_condition: RoofCondition::Good,
            primary_direction: CompassDirection::South,
            tilt_degrees: 25.0,
            multiple_orientations: false,
            obstructions: ObstructionCounts { chimneys: 1, vents: 3, hvac_units: 1, ..Default::default() },
            shading_level: ShadingLevel::Moderate,
        }
    }
}

// ===================== VISION RECORD =====================

/// Roof record as returned by the vision model (and accepted from files)
#[derive(Debug, Clone, Deserialize)]
pub struct VisionRoofRecord {
    pub roof_analysis: RawRoof,
    pub orientation_analysis: RawOrientation,
    #[serde(default)]
    pub obstructions: RawObstructions,
    pub shading_analysis: RawShading,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRoof {
    pub roof_area_sqm: f64,
    pub usable_area_sqm: f64,
    #[serde(default)]
    pub roof_shape: RoofShape,
    #[serde(default)]
    pub roof_material: RoofMaterial,
    pub roof_condition: RoofCondition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOrientation {
    pub primary_roof_direction: CompassDirection,
    pub roof_tilt_estimate: f64,
    #[serde(default)]
    pub multiple_orientations: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawObstructions {
    pub chimneys: i64,
    pub vents: i64,
    pub skylights: i64,
    pub hvac_units: i64,
    pub satellite_dishes: i64,
    pub other_obstructions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShading {
    pub overall_shading_impact: ShadingLevel,
}

/// Largest count accepted for any one obstruction kind
const MAX_OBSTRUCTIONS: u32 = 1000;

fn count<T>(field: &str, value: T) -> Result<u32>
where
    T: TryInto<u32> + ToString + Copy,
{
    match value.try_into() {
        Ok(n) if n <= MAX_OBSTRUCTIONS => Ok(n),
        _ => Err(AnalysisError::invalid(
            format!("obstructions.{}", field),
            value,
            format!("count must be between 0 and {}", MAX_OBSTRUCTIONS),
        )),
    }
}

impl TryFrom<VisionRoofRecord> for RoofDescription {
    type Error = AnalysisError;

    fn try_from(record: VisionRoofRecord) -> Result<Self> {
        let o = &record.obstructions;
        let obstructions = ObstructionCounts {
            chimneys: count("chimneys", o.chimneys)?,
            vents: count("vents", o.vents)?,
            skylights: count("skylights", o.skylights)?,
            hvac_units: count("hvac_units", o.hvac_units)?,
            satellite_dishes: count("satellite_dishes", o.satellite_dishes)?,
            other: count("other_obstructions", o.other_obstructions.len())?,
        };

        let roof = RoofDescription {
            roof_area_sqm: record.roof_analysis.roof_area_sqm,
            usable_area_sqm: record.roof_analysis.usable_area_sqm,
            roof_shape: record.roof_analysis.roof_shape,
            roof_material: record.roof_analysis.roof_material,
            roof_condition: record.roof_analysis.roof_condition,
            primary_direction: record.orientation_analysis.primary_roof_direction,
            tilt_degrees: record.orientation_analysis.roof_tilt_estimate,
            multiple_orientations: record.orientation_analysis.multiple_orientations,
            obstructions,
            shading_level: record.shading_analysis.overall_shading_impact,
        };
        roof.validate()?;
        Ok(roof)
    }
}

/// Parse and validate a vision-shaped JSON document
pub fn parse_roof_record(json: &str) -> Result<RoofDescription> {
    let record: VisionRoofRecord = serde_json::from_str(json)?;
    RoofDescription::try_from(record)
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "roof_analysis": {
            "roof_area_sqm": 140,
            "usable_area_sqm": 95.5,
            "roof_shape": "L-shaped",
            "roof_material": "clay",
            "roof_condition": "fair",
            "roof_age_estimate": "10-20_years"
        },
        "orientation_analysis": {
            "primary_roof_direction": "southwest",
            "roof_tilt_estimate": 32,
            "multiple_orientations": true,
            "optimal_sections": ["south_face"]
        },
        "obstructions": {
            "chimneys": 1,
            "vents": 2,
            "skylights": 0,
            "hvac_units": 0,
            "satellite_dishes": 1,
            "other_obstructions": ["antenna", "solar water heater"]
        },
        "shading_analysis": {
            "nearby_trees": "moderate",
            "overall_shading_impact": "low"
        },
        "solar_suitability": { "overall_rating": "good" }
    }"#;

    #[test]
    fn test_parse_vision_record() {
        let roof = parse_roof_record(SAMPLE).unwrap();
        assert_eq!(roof.roof_shape, RoofShape::LShaped);
        assert_eq!(roof.roof_material, RoofMaterial::Other);
        assert_eq!(roof.roof_condition, RoofCondition::Fair);
        assert_eq!(roof.azimuth_deg(), 225.0);
        assert!(roof.multiple_orientations);
        assert_eq!(roof.obstructions.other, 2);
        assert_eq!(roof.obstructions.total(), 6);
        // "low" is the vision model's word for light shading
        assert_eq!(roof.shading_level, ShadingLevel::Light);
    }

    #[test]
    fn test_usable_area_above_total_is_rejected() {
        let mut roof = RoofDescription::demo_fixture();
        roof.usable_area_sqm = roof.roof_area_sqm + 1.0;
        let err = roof.validate().unwrap_err();
        assert_eq!(err.field(), Some("roof.usable_area_sqm"));
    }

    #[test]
    fn test_negative_count_names_field() {
        let json = SAMPLE.replace("\"vents\": 2", "\"vents\": -1");
        let err = parse_roof_record(&json).unwrap_err();
        assert_eq!(err.field(), Some("obstructions.vents"));
    }

    #[test]
    fn test_tilt_out_of_range_is_rejected() {
        let mut roof = RoofDescription::demo_fixture();
        roof.tilt_degrees = 95.0;
        assert_eq!(roof.validate().unwrap_err().field(), Some("roof.tilt_degrees"));
        roof.tilt_degrees = f64::NAN;
        assert!(roof.validate().is_err());
    }

    #[test]
    fn test_unknown_direction_is_a_parse_error() {
        let json = SAMPLE.replace("southwest", "up");
        assert!(matches!(parse_roof_record(&json), Err(AnalysisError::Json(_))));
    }

    #[test]
    fn test_oversized_count_names_field() {
        let json = SAMPLE.replace("\"chimneys\": 1", "\"chimneys\": 4294967295");
        let err = parse_roof_record(&json).unwrap_err();
        assert_eq!(err.field(), Some("obstructions.chimneys"));

        let json = SAMPLE.replace("\"skylights\": 0", "\"skylights\": 1001");
        assert_eq!(parse_roof_record(&json).unwrap_err().field(), Some("obstructions.skylights"));
    }

    #[test]
    fn test_too_many_other_obstructions_is_rejected() {
        let mut record: VisionRoofRecord = serde_json::from_str(SAMPLE).unwrap();
        record.obstructions.other_obstructions = vec!["antenna".to_string(); 1001];
        let err = RoofDescription::try_from(record).unwrap_err();
        assert_eq!(err.field(), Some("obstructions.other_obstructions"));
    }

    #[test]
    fn test_total_saturates() {
        let counts = ObstructionCounts { chimneys: u32::MAX, vents: 1, hvac_units: 7, ..Default::default() };
        assert_eq!(counts.total(), u32::MAX);
    }

    #[test]
    fn test_demo_fixture_is_valid() {
        let roof = RoofDescription::demo_fixture();
        assert!(roof.validate().is_ok());
        assert_eq!(roof.obstructions.total(), 5);
    }

    #[test]
    fn test_shading_levels_ordered_by_severity() {
        assert!(ShadingLevel::ALL.windows(2).all(|w| w[0] < w[1]));
    }
}
