use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::types::*;
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    #[default]
    NairobiCentral,
    Coast,
    Western,
    Nyanza,
    Eastern,
    RiftValley,
    NorthEastern,
}

impl Region {
    /// Price level relative to central Nairobi
    pub fn multiplier(self) -> Decimal {
        match self {
            Region::NairobiCentral => dec!(1.0),
            Region::Coast => dec!(1.08),
            Region::Western => dec!(0.85),
            Region::Nyanza => dec!(0.82),
            Region::Eastern => dec!(0.88),
            Region::RiftValley => dec!(0.90),
            Region::NorthEastern => dec!(0.95),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStandard {
    Budget,
    #[default]
    Standard,
    Luxury,
}

impl BuildStandard {
    pub fn multiplier(self) -> Decimal {
        match self {
            BuildStandard::Budget => dec!(0.75),
            BuildStandard::Standard => dec!(1.0),
            BuildStandard::Luxury => dec!(1.8),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofingType {
    #[default]
    IronSheets,
    ClayTiles,
    ConcreteTiles,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlooringType {
    #[default]
    Tiles,
    Screed,
}

/// Unit prices before the regional multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPrices {
    /// per 50kg bag
    pub cement: Money,
    /// per cubic metre
    pub sand: Money,
    /// per cubic metre
    pub ballast: Money,
    /// per kg
    pub steel: Money,
    /// per foot
    pub timber: Money,
    /// per block
    pub blocks: Money,
    /// per sqm
    pub floor_tiles: Money,
    /// per sqm, for any flooring other than tiles
    pub screed: Money,
    /// per sheet
    pub iron_sheets: Money,
    /// per sqm
    pub clay_tiles: Money,
    /// per sqm
    pub concrete_tiles: Money,
    /// per litre
    pub paint: Money,
    pub door: Money,
    pub window: Money,
}

impl Default for MaterialPrices {
    fn default() -> Self {
        MaterialPrices {
            cement: dec!(780),
            sand: dec!(2500),
            ballast: dec!(3000),
            steel: dec!(130),
            timber: dec!(55),
            blocks: dec!(15),
            floor_tiles: dec!(1200),
            screed: dec!(500),
            iron_sheets: dec!(1100),
            clay_tiles: dec!(1600),
            concrete_tiles: dec!(1900),
            paint: dec!(800),
            door: dec!(8000),
            window: dec!(12000),
        }
    }
}

/// Daily rates for the trades charged per door and window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabourRates {
    pub carpenter: Money,
    pub electrician: Money,
    pub plumber: Money,
}

impl Default for LabourRates {
    fn default() -> Self {
        LabourRates {
            carpenter: dec!(1400),
            electrician: dec!(2000),
            plumber: dec!(1800),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomItem {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub unit_price: Money,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstructionInput {
    /// Built-up area; derived from `bedrooms` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_area_sqm: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub build_standard: BuildStandard,
    #[serde(default)]
    pub roofing: RoofingType,
    #[serde(default)]
    pub flooring: FlooringType,
    /// Contingency on the subtotal, in percent; 12 when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contingency_pct: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_prices: Option<MaterialPrices>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labour_rates: Option<LabourRates>,
    #[serde(default)]
    pub custom_items: Vec<CustomItem>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub item: String,
    pub quantity: Decimal,
    pub unit: String,
    /// At regional prices, before the build-standard multiplier
    pub cost: Money,
}

/// Indicative split of the total by construction stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBreakdown {
    pub foundation: Money,
    pub walling: Money,
    pub roofing: Money,
    pub finishing: Money,
    pub electrical: Money,
    pub plumbing: Money,
    pub permits: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionOutput {
    pub floor_area_sqm: Decimal,
    pub total_cost: Money,
    pub cost_per_sqm: Money,
    pub material_costs: Money,
    pub labour_costs: Money,
    pub permit_costs: Money,
    pub custom_items_cost: Money,
    pub contingency: Money,
    pub stage_breakdown: StageBreakdown,
    pub materials: Vec<MaterialLine>,
}

const DEFAULT_CONTINGENCY_PCT: Decimal = dec!(12);
const GENERAL_LABOUR_SHARE: Decimal = dec!(0.25);
const SPECIALIST_DAYS_PER_OPENING: Decimal = dec!(2);
const PERMIT_RATE: Decimal = dec!(0.005);
const ROOF_SLOPE_FACTOR: Decimal = dec!(1.3);
const SQM_PER_IRON_SHEET: Decimal = dec!(1.8);
const SQM_PER_PAINT_LITRE: Decimal = dec!(12);

/// Typical built-up area for a house with the given number of bedrooms.
pub fn area_for_bedrooms(bedrooms: u32) -> Option<Decimal> {
    match bedrooms {
        1 => Some(dec!(45)),
        2 => Some(dec!(80)),
        3 => Some(dec!(120)),
        4 => Some(dec!(160)),
        5 => Some(dec!(200)),
        _ => None,
    }
}

/// Estimate the cost of building a house from per-sqm material quantities.
pub fn estimate_construction(
    input: &ConstructionInput,
) -> CalcResult<ComputationOutput<ConstructionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let area = resolve_floor_area(input)?;
    let contingency_pct = input.contingency_pct.unwrap_or(DEFAULT_CONTINGENCY_PCT);
    validate_construction_input(input, contingency_pct)?;

    let regional = input.region.multiplier();
    let base_prices = input.material_prices.clone().unwrap_or_default();
    let base_labour = input.labour_rates.clone().unwrap_or_default();
    let price = |p: Money| p * regional;

    let roofing_area = area * ROOF_SLOPE_FACTOR;
    let paint_litres = area * dec!(4) / SQM_PER_PAINT_LITRE;
    let doors = (area / dec!(30)).ceil();
    let windows = (area / dec!(20)).ceil();

    let (roofing_quantity, roofing_unit, roofing_cost) = match input.roofing {
        RoofingType::IronSheets => {
            let sheets = roofing_area / SQM_PER_IRON_SHEET;
            (sheets, "sheet", sheets * price(base_prices.iron_sheets))
        }
        RoofingType::ClayTiles => (roofing_area, "sqm", roofing_area * price(base_prices.clay_tiles)),
        RoofingType::ConcreteTiles => (
            roofing_area,
            "sqm",
            roofing_area * price(base_prices.concrete_tiles),
        ),
    };
    let flooring_price = match input.flooring {
        FlooringType::Tiles => base_prices.floor_tiles,
        FlooringType::Screed => base_prices.screed,
    };

    let lines: Vec<(&str, Decimal, &str, Money)> = vec![
        ("cement", area * dec!(8), "50kg bag", base_prices.cement),
        ("sand", area * dec!(0.5), "cubic metre", base_prices.sand),
        ("ballast", area * dec!(0.3), "cubic metre", base_prices.ballast),
        ("steel", area * dec!(15), "kg", base_prices.steel),
        ("timber", area * dec!(25), "foot", base_prices.timber),
        ("blocks", area * dec!(45), "block", base_prices.blocks),
        ("flooring", area, "sqm", flooring_price),
        ("paint", paint_litres, "litre", base_prices.paint),
        ("doors", doors, "door", base_prices.door),
        ("windows", windows, "window", base_prices.window),
    ];

    let mut materials: Vec<MaterialLine> = lines
        .into_iter()
        .map(|(item, quantity, unit, unit_price)| MaterialLine {
            item: item.into(),
            quantity,
            unit: unit.into(),
            cost: quantity * price(unit_price),
        })
        .collect();
    materials.push(MaterialLine {
        item: "roofing".into(),
        quantity: roofing_quantity,
        unit: roofing_unit.into(),
        cost: roofing_cost,
    });

    let raw_material_costs: Money = materials.iter().map(|m| m.cost).sum();

    let trade_day_rate =
        price(base_labour.carpenter) + price(base_labour.electrician) + price(base_labour.plumber);
    let raw_labour_costs = raw_material_costs * GENERAL_LABOUR_SHARE
        + (doors + windows) * trade_day_rate * SPECIALIST_DAYS_PER_OPENING;

    let standard = input.build_standard.multiplier();
    let material_costs = raw_material_costs * standard;
    let labour_costs = raw_labour_costs * standard;

    let subtotal = material_costs + labour_costs;
    let permit_costs = subtotal * PERMIT_RATE;

    let custom_items_cost: Money = input
        .custom_items
        .iter()
        .map(|item| item.unit_price * item.quantity * regional)
        .sum();

    let contingency = (subtotal + custom_items_cost) * contingency_pct / dec!(100);
    let total_cost = subtotal + custom_items_cost + permit_costs + contingency;

    if contingency_pct < dec!(10) {
        warnings.push(format!(
            "Contingency of {contingency_pct}% is below the 10% typically held for price swings"
        ));
    }
    if input.floor_area_sqm.is_some() && input.bedrooms.is_some() {
        warnings.push("Both floor_area_sqm and bedrooms given; floor_area_sqm was used".into());
    }

    let output = ConstructionOutput {
        floor_area_sqm: area,
        total_cost,
        cost_per_sqm: total_cost / area,
        material_costs,
        labour_costs,
        permit_costs,
        custom_items_cost,
        contingency,
        stage_breakdown: StageBreakdown {
            foundation: total_cost * dec!(0.15),
            walling: total_cost * dec!(0.25),
            roofing: total_cost * dec!(0.20),
            finishing: total_cost * dec!(0.25),
            electrical: total_cost * dec!(0.08),
            plumbing: total_cost * dec!(0.07),
            permits: permit_costs,
        },
        materials,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Per-sqm material take-off with regional pricing, labour share and contingency",
        &serde_json::json!({
            "region": input.region,
            "regional_multiplier": regional.to_string(),
            "build_standard": input.build_standard,
            "standard_multiplier": standard.to_string(),
            "contingency_pct": contingency_pct.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn resolve_floor_area(input: &ConstructionInput) -> CalcResult<Decimal> {
    match (input.floor_area_sqm, input.bedrooms) {
        (Some(area), _) if area > Decimal::ZERO => Ok(area),
        (Some(_), _) => Err(CalcError::InvalidInput {
            field: "floor_area_sqm".into(),
            reason: "Floor area must be positive".into(),
        }),
        (None, Some(bedrooms)) => {
            area_for_bedrooms(bedrooms).ok_or_else(|| CalcError::InvalidInput {
                field: "bedrooms".into(),
                reason: format!("No standard size for {bedrooms} bedrooms; give floor_area_sqm"),
            })
        }
        (None, None) => Err(CalcError::InvalidInput {
            field: "floor_area_sqm".into(),
            reason: "Either floor_area_sqm or bedrooms is required".into(),
        }),
    }
}

fn validate_construction_input(input: &ConstructionInput, contingency_pct: Percent) -> CalcResult<()> {
    if contingency_pct < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "contingency_pct".into(),
            reason: "Contingency cannot be negative".into(),
        });
    }
    for item in &input.custom_items {
        if item.unit_price < Decimal::ZERO || item.quantity < Decimal::ZERO {
            return Err(CalcError::InvalidInput {
                field: "custom_items".into(),
                reason: format!("'{}' has a negative price or quantity", item.name),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn three_bedroom() -> ConstructionInput {
        ConstructionInput {
            bedrooms: Some(3),
            ..ConstructionInput::default()
        }
    }

    #[test]
    fn test_default_three_bedroom_estimate() {
        let out = estimate_construction(&three_bedroom()).unwrap().result;
        assert_eq!(out.floor_area_sqm, dec!(120));
        assert!((out.material_costs - dec!(1862133.33)).abs() < dec!(0.01), "got {}", out.material_costs);
        assert!((out.labour_costs - dec!(569533.33)).abs() < dec!(0.01));
        assert!((out.permit_costs - dec!(12158.33)).abs() < dec!(0.01));
        assert!((out.contingency - dec!(291800)).abs() < dec!(0.01));
        assert!((out.total_cost - dec!(2735625)).abs() < dec!(0.01));
        assert!((out.cost_per_sqm - dec!(22796.875)).abs() < dec!(0.001));
    }

    #[test]
    fn test_opening_counts_round_up() {
        let out = estimate_construction(&three_bedroom()).unwrap().result;
        let doors = out.materials.iter().find(|m| m.item == "doors").unwrap();
        let windows = out.materials.iter().find(|m| m.item == "windows").unwrap();
        assert_eq!(doors.quantity, dec!(4));
        assert_eq!(windows.quantity, dec!(6));

        let mut input = three_bedroom();
        input.floor_area_sqm = Some(dec!(121));
        input.bedrooms = None;
        let out = estimate_construction(&input).unwrap().result;
        let doors = out.materials.iter().find(|m| m.item == "doors").unwrap();
        assert_eq!(doors.quantity, dec!(5));
    }

    #[test]
    fn test_luxury_scales_materials_and_labour() {
        let standard = estimate_construction(&three_bedroom()).unwrap().result;
        let mut input = three_bedroom();
        input.build_standard = BuildStandard::Luxury;
        let luxury = estimate_construction(&input).unwrap().result;
        assert!((luxury.material_costs - standard.material_costs * dec!(1.8)).abs() < dec!(0.000001));
        assert!((luxury.labour_costs - standard.labour_costs * dec!(1.8)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_region_multiplier_applies_to_custom_items() {
        let mut input = three_bedroom();
        input.region = Region::Coast;
        input.custom_items.push(CustomItem {
            name: "water tank".into(),
            unit: "tank".into(),
            unit_price: dec!(25000),
            quantity: dec!(2),
        });
        let out = estimate_construction(&input).unwrap().result;
        assert_eq!(out.custom_items_cost, dec!(54000));
    }

    #[test]
    fn test_clay_tile_roof_priced_per_sqm() {
        let mut input = three_bedroom();
        input.roofing = RoofingType::ClayTiles;
        let out = estimate_construction(&input).unwrap().result;
        let roof = out.materials.iter().find(|m| m.item == "roofing").unwrap();
        assert_eq!(roof.quantity, dec!(156));
        assert_eq!(roof.cost, dec!(249600));
    }

    #[test]
    fn test_explicit_zero_contingency_is_honoured() {
        let mut input = three_bedroom();
        input.contingency_pct = Some(Decimal::ZERO);
        let out = estimate_construction(&input).unwrap();
        assert_eq!(out.result.contingency, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("Contingency")));
    }

    #[test]
    fn test_stage_breakdown_shares() {
        let out = estimate_construction(&three_bedroom()).unwrap().result;
        let s = &out.stage_breakdown;
        let stages = s.foundation + s.walling + s.roofing + s.finishing + s.electrical + s.plumbing;
        assert!((stages - out.total_cost).abs() < dec!(0.000001));
    }

    #[test]
    fn test_missing_size_rejected() {
        assert!(estimate_construction(&ConstructionInput::default()).is_err());
    }

    #[test]
    fn test_unknown_bedroom_count_rejected() {
        let input = ConstructionInput {
            bedrooms: Some(9),
            ..ConstructionInput::default()
        };
        assert!(estimate_construction(&input).is_err());
    }

    #[test]
    fn test_region_parses_kebab_case() {
        let input: ConstructionInput =
            serde_json::from_str(r#"{"bedrooms": 2, "region": "rift-valley", "roofing": "concrete_tiles"}"#)
                .unwrap();
        assert_eq!(input.region, Region::RiftValley);
        assert_eq!(input.roofing, RoofingType::ConcreteTiles);
    }
}
