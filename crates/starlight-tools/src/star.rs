//! Star tools.
//!
//! - `get_star_info`: look up a well-known star
//! - `classify_star`: spectral and luminosity class from temperature and
//!   luminosity

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use starlight_mcp::{
    parse_arguments, McpError, McpResult, Tool, ToolBuilder, ToolContent, ToolContext,
    ToolExecutor,
};
use std::fmt;
use tracing::debug;

/// Surface temperature of the Sun in kelvin.
const SUN_TEMPERATURE_K: f64 = 5778.0;

/// A catalogued star.
#[derive(Debug, Clone, Copy)]
pub struct StarRecord {
    pub name: &'static str,
    pub kind: &'static str,
    pub temperature: &'static str,
    pub luminosity: &'static str,
    pub description: &'static str,
}

pub const STAR_CATALOG: &[StarRecord] = &[
    StarRecord {
        name: "Sun",
        kind: "G-type main-sequence star",
        temperature: "5778K",
        luminosity: "1 L☉",
        description: "The star at the centre of our solar system, a typical yellow dwarf",
    },
    StarRecord {
        name: "Sirius",
        kind: "A-type main-sequence star",
        temperature: "9940K",
        luminosity: "25 L☉",
        description: "The brightest star in the night sky, a binary system",
    },
    StarRecord {
        name: "Betelgeuse",
        kind: "M-type supergiant",
        temperature: "3500K",
        luminosity: "100000 L☉",
        description: "The red supergiant in Orion, one of the largest known stars",
    },
    StarRecord {
        name: "Vega",
        kind: "A-type main-sequence star",
        temperature: "9602K",
        luminosity: "40 L☉",
        description: "The brightest star in Lyra, once the northern pole star",
    },
];

/// Case-insensitive catalog lookup.
pub fn find_star(name: &str) -> Option<&'static StarRecord> {
    let name = name.trim();
    STAR_CATALOG
        .iter()
        .find(|star| star.name.eq_ignore_ascii_case(name))
}

fn describe_star(star: &StarRecord) -> String {
    format!(
        "Star: {}\nType: {}\nTemperature: {}\nLuminosity: {}\nDescription: {}",
        star.name, star.kind, star.temperature, star.luminosity, star.description
    )
}

fn star_not_found(name: &str) -> String {
    let known: Vec<&str> = STAR_CATALOG.iter().map(|s| s.name).collect();
    format!(
        "Sorry, no information about '{name}' in the catalog.\nAvailable stars: {}",
        known.join(", ")
    )
}

#[derive(Debug, Deserialize)]
struct StarInfoArgs {
    star_name: String,
}

pub struct StarInfoTool;

#[async_trait]
impl ToolExecutor for StarInfoTool {
    async fn execute(&self, args: Value, _ctx: &ToolContext) -> McpResult<Vec<ToolContent>> {
        let args: StarInfoArgs = parse_arguments(args)?;
        // An unknown star is an answer, not a failure.
        let text = match find_star(&args.star_name) {
            Some(star) => describe_star(star),
            None => star_not_found(&args.star_name),
        };
        Ok(vec![ToolContent::text(text)])
    }
}

pub fn star_info_tool() -> Tool {
    ToolBuilder::new("get_star_info")
        .description("Get classification information about a well-known star")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "star_name": {
                    "type": "string",
                    "description": "Star name, e.g. Sirius"
                }
            },
            "required": ["star_name"]
        }))
        .build(StarInfoTool)
}

/// Harvard spectral class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralClass {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
}

impl SpectralClass {
    pub fn from_temperature(kelvin: f64) -> Self {
        match kelvin {
            t if t >= 30_000.0 => Self::O,
            t if t >= 10_000.0 => Self::B,
            t if t >= 7_500.0 => Self::A,
            t if t >= 6_000.0 => Self::F,
            t if t >= 5_200.0 => Self::G,
            t if t >= 3_700.0 => Self::K,
            _ => Self::M,
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            Self::O => "O",
            Self::B => "B",
            Self::A => "A",
            Self::F => "F",
            Self::G => "G",
            Self::K => "K",
            Self::M => "M",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::O => "blue",
            Self::B => "blue-white",
            Self::A => "white",
            Self::F => "yellow-white",
            Self::G => "yellow",
            Self::K => "orange",
            Self::M => "red",
        }
    }
}

impl fmt::Display for SpectralClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-type", self.letter())
    }
}

/// Coarse luminosity class, in solar luminosities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuminosityClass {
    Supergiant,
    BrightGiant,
    Giant,
    MainSequence,
    WhiteDwarf,
}

impl LuminosityClass {
    pub fn from_luminosity(solar: f64) -> Self {
        match solar {
            l if l >= 10_000.0 => Self::Supergiant,
            l if l >= 1_000.0 => Self::BrightGiant,
            l if l >= 100.0 => Self::Giant,
            l if l >= 0.1 => Self::MainSequence,
            _ => Self::WhiteDwarf,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supergiant => "supergiant",
            Self::BrightGiant => "bright giant",
            Self::Giant => "giant",
            Self::MainSequence => "main-sequence star",
            Self::WhiteDwarf => "white dwarf",
        }
    }
}

/// Render a classification report.
pub fn classify(temperature: f64, luminosity: f64) -> String {
    let spectral = SpectralClass::from_temperature(temperature);
    let class = LuminosityClass::from_luminosity(luminosity);

    let mut report = format!(
        "Star classification:\nTemperature: {temperature}K\nLuminosity: {luminosity} L☉\n\
         Spectral class: {spectral}\nColor: {}\nType: {}\n",
        spectral.color(),
        class.as_str()
    );

    if temperature > SUN_TEMPERATURE_K {
        report.push_str(&format!(
            "\nHotter than the Sun ({:.1}x)",
            temperature / SUN_TEMPERATURE_K
        ));
    } else {
        report.push_str(&format!(
            "\nCooler than the Sun ({:.1}x)",
            SUN_TEMPERATURE_K / temperature
        ));
    }

    if luminosity > 1.0 {
        report.push_str(&format!("\nBrighter than the Sun ({luminosity:.1}x)"));
    } else {
        report.push_str(&format!("\nDimmer than the Sun ({:.1}x)", 1.0 / luminosity));
    }

    report
}

#[derive(Debug, Deserialize)]
struct ClassifyArgs {
    temperature: f64,
    luminosity: f64,
}

pub struct ClassifyStarTool;

#[async_trait]
impl ToolExecutor for ClassifyStarTool {
    async fn execute(&self, args: Value, _ctx: &ToolContext) -> McpResult<Vec<ToolContent>> {
        let args: ClassifyArgs = parse_arguments(args)?;
        if args.temperature <= 0.0 {
            return Err(McpError::invalid_params("temperature must be positive"));
        }
        if args.luminosity <= 0.0 {
            return Err(McpError::invalid_params("luminosity must be positive"));
        }

        debug!(
            temperature = args.temperature,
            luminosity = args.luminosity,
            "Classifying star"
        );
        Ok(vec![ToolContent::text(classify(
            args.temperature,
            args.luminosity,
        ))])
    }
}

pub fn classify_tool() -> Tool {
    ToolBuilder::new("classify_star")
        .description("Classify a star from its surface temperature and luminosity")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "temperature": {
                    "type": "number",
                    "description": "Surface temperature in kelvin"
                },
                "luminosity": {
                    "type": "number",
                    "description": "Luminosity in multiples of the Sun's"
                }
            },
            "required": ["temperature", "luminosity"]
        }))
        .build(ClassifyStarTool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_star_case_insensitive() {
        assert_eq!(find_star("sirius").unwrap().name, "Sirius");
        assert_eq!(find_star(" VEGA ").unwrap().name, "Vega");
        assert!(find_star("Polaris").is_none());
    }

    #[tokio::test]
    async fn test_star_info() {
        let content = StarInfoTool
            .execute(json!({"star_name": "Betelgeuse"}), &ToolContext::default())
            .await
            .unwrap();
        let text = content[0].as_text().unwrap();
        assert!(text.starts_with("Star: Betelgeuse\n"));
        assert!(text.contains("M-type supergiant"));
    }

    #[tokio::test]
    async fn test_star_info_unknown_lists_catalog() {
        let content = StarInfoTool
            .execute(json!({"star_name": "Polaris"}), &ToolContext::default())
            .await
            .unwrap();
        let text = content[0].as_text().unwrap();
        assert!(text.contains("'Polaris'"));
        assert!(text.contains("Sun, Sirius, Betelgeuse, Vega"));
    }

    #[test]
    fn test_spectral_thresholds() {
        assert_eq!(SpectralClass::from_temperature(30_000.0), SpectralClass::O);
        assert_eq!(SpectralClass::from_temperature(29_999.0), SpectralClass::B);
        assert_eq!(SpectralClass::from_temperature(9_940.0), SpectralClass::A);
        assert_eq!(SpectralClass::from_temperature(6_000.0), SpectralClass::F);
        assert_eq!(SpectralClass::from_temperature(5_778.0), SpectralClass::G);
        assert_eq!(SpectralClass::from_temperature(3_700.0), SpectralClass::K);
        assert_eq!(SpectralClass::from_temperature(3_500.0), SpectralClass::M);
        assert_eq!(SpectralClass::M.color(), "red");
    }

    #[test]
    fn test_luminosity_thresholds() {
        assert_eq!(
            LuminosityClass::from_luminosity(100_000.0),
            LuminosityClass::Supergiant
        );
        assert_eq!(
            LuminosityClass::from_luminosity(1_000.0),
            LuminosityClass::BrightGiant
        );
        assert_eq!(LuminosityClass::from_luminosity(150.0), LuminosityClass::Giant);
        assert_eq!(LuminosityClass::from_luminosity(1.0), LuminosityClass::MainSequence);
        assert_eq!(LuminosityClass::from_luminosity(0.01), LuminosityClass::WhiteDwarf);
    }

    #[test]
    fn test_classify_sun() {
        let report = classify(5778.0, 1.0);
        assert!(report.contains("Spectral class: G-type"));
        assert!(report.contains("Color: yellow"));
        assert!(report.contains("Type: main-sequence star"));
        assert!(report.contains("Cooler than the Sun (1.0x)"));
        assert!(report.contains("Dimmer than the Sun (1.0x)"));
    }

    #[test]
    fn test_classify_hot_bright() {
        let report = classify(11_556.0, 25.0);
        assert!(report.contains("Spectral class: B-type"));
        assert!(report.contains("Hotter than the Sun (2.0x)"));
        assert!(report.contains("Brighter than the Sun (25.0x)"));
    }

    #[tokio::test]
    async fn test_classify_rejects_non_positive() {
        let result = ClassifyStarTool
            .execute(
                json!({"temperature": 0, "luminosity": 1}),
                &ToolContext::default(),
            )
            .await;
        assert!(matches!(result, Err(McpError::InvalidParams(_))));

        let result = ClassifyStarTool
            .execute(
                json!({"temperature": 5000, "luminosity": -1}),
                &ToolContext::default(),
            )
            .await;
        assert!(result.is_err());
    }
}
