use anyhow::{Context, Result};
use clap::Parser;
use color_census::naming::{NamedColor, NamingClient, NamingConfig};
use color_census::pipeline::{Census, CensusConfig, CensusPipeline};
use std::path::PathBuf;
use std::time::Duration;

/// Detect the dominant colors of an image and name them.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image to analyze
    image: PathBuf,

    /// Number of dominant colors to detect, 2 through 19
    #[arg(short = 'k', long = "clusters", default_value_t = 5)]
    clusters: usize,

    /// Fixed clustering seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the naming service lookups
    #[arg(long)]
    offline: bool,

    /// Print the census as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Naming service timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // --- 1. Pipeline Run ---
    eprintln!("Analyzing {} (k = {})...", args.image.display(), args.clusters);
    let pipeline = CensusPipeline::new(CensusConfig {
        cluster_count: args.clusters,
        seed: args.seed,
        ..CensusConfig::default()
    });
    let census = pipeline
        .analyze_file(&args.image)
        .with_context(|| format!("analyzing {}", args.image.display()))?;

    // --- 2. Naming Lookups ---
    let named = if args.offline {
        None
    } else {
        eprintln!("Naming {} detected colors...", census.colors.len());
        let client = NamingClient::new(&NamingConfig {
            timeout: Duration::from_secs(args.timeout_secs),
            ..NamingConfig::default()
        })
        .context("building the naming client")?;
        let hexes: Vec<String> = census.colors.iter().map(|color| color.hex.clone()).collect();
        Some(
            client
                .lookup_all(&hexes)
                .await
                .context("naming the detected colors")?,
        )
    };

    // --- 3. Report ---
    if args.json {
        print_json(&census, named.as_deref())?;
    } else {
        print_plain(&census, named.as_deref());
    }

    Ok(())
}

fn print_plain(census: &Census, named: Option<&[NamedColor]>) {
    println!(
        "File {} ({}x{}), {} dominant colors",
        census.file,
        census.width,
        census.height,
        census.colors.len()
    );
    for (index, color) in census.colors.iter().enumerate() {
        let share = color.share * 100.0;
        match named.and_then(|names| names.get(index)) {
            Some(name) => {
                // '=' marks an exact name, '~' the closest named color.
                let marker = if name.name.exact_match_name { "=" } else { "~" };
                println!(
                    "{:>2}. {}  {:>5.1}%  {} ({} {})",
                    index + 1,
                    color.hex,
                    share,
                    name.name.value,
                    marker,
                    name.name.closest_named_hex
                );
                println!(
                    "      {} | {} | {}",
                    name.rgb.value, name.hsl.value, name.hsv.value
                );
            }
            None => {
                println!(
                    "{:>2}. {}  {:>5.1}%  rgb({}, {}, {})",
                    index + 1,
                    color.hex,
                    share,
                    color.rgb.red,
                    color.rgb.green,
                    color.rgb.blue
                );
            }
        }
    }
}

fn print_json(census: &Census, named: Option<&[NamedColor]>) -> Result<()> {
    let document = census_document(census, named);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Everything the plain report shows, folded into one JSON document.
fn census_document(census: &Census, named: Option<&[NamedColor]>) -> serde_json::Value {
    let colors: Vec<serde_json::Value> = census
        .colors
        .iter()
        .enumerate()
        .map(|(index, color)| {
            let mut value = serde_json::json!({
                "hex": color.hex,
                "rgb": [color.rgb.red, color.rgb.green, color.rgb.blue],
                "share": color.share,
            });
            if let Some(name) = named.and_then(|names| names.get(index)) {
                value["name"] = serde_json::json!({
                    "value": name.name.value,
                    "closest_named_hex": name.name.closest_named_hex,
                    "exact_match": name.name.exact_match_name,
                    "rgb_value": name.rgb.value,
                    "hsl_value": name.hsl.value,
                    "hsv_value": name.hsv.value,
                    "swatch": name.image.bare,
                });
            }
            value
        })
        .collect();

    serde_json::json!({
        "file": census.file,
        "width": census.width,
        "height": census.height,
        "colors": colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_census::naming::{ColorName, ColorValue, Swatch};
    use color_census::pipeline::DetectedColor;
    use palette::Srgb;

    fn cerulean_census() -> Census {
        Census {
            file: "beach.png".to_string(),
            width: 4,
            height: 2,
            colors: vec![DetectedColor {
                rgb: Srgb::new(2u8, 164, 211),
                hex: "#02a4d3".to_string(),
                share: 0.75,
            }],
        }
    }

    fn cerulean_named() -> NamedColor {
        NamedColor {
            name: ColorName {
                value: "Cerulean".to_string(),
                closest_named_hex: "#02A4D3".to_string(),
                exact_match_name: true,
            },
            rgb: ColorValue {
                value: "rgb(2, 164, 211)".to_string(),
            },
            hsl: ColorValue {
                value: "hsl(193, 98%, 42%)".to_string(),
            },
            hsv: ColorValue {
                value: "hsv(193, 99%, 83%)".to_string(),
            },
            image: Swatch {
                bare: "https://www.thecolorapi.com/id?format=svg&named=false&hex=02A4D3"
                    .to_string(),
            },
        }
    }

    #[test]
    fn json_document_carries_everything_the_plain_report_shows() {
        let document = census_document(&cerulean_census(), Some(&[cerulean_named()]));

        assert_eq!(document["file"], "beach.png");
        assert_eq!(document["width"], 4);
        let entry = &document["colors"][0];
        assert_eq!(entry["hex"], "#02a4d3");
        assert_eq!(entry["rgb"], serde_json::json!([2, 164, 211]));
        assert_eq!(entry["name"]["value"], "Cerulean");
        assert_eq!(entry["name"]["exact_match"], true);
        assert_eq!(entry["name"]["rgb_value"], "rgb(2, 164, 211)");
        assert_eq!(entry["name"]["hsl_value"], "hsl(193, 98%, 42%)");
        assert_eq!(entry["name"]["hsv_value"], "hsv(193, 99%, 83%)");
        assert_eq!(
            entry["name"]["swatch"],
            "https://www.thecolorapi.com/id?format=svg&named=false&hex=02A4D3"
        );
    }

    #[test]
    fn offline_json_document_has_no_name_block() {
        let document = census_document(&cerulean_census(), None);
        let entry = &document["colors"][0];
        assert_eq!(entry["hex"], "#02a4d3");
        assert!(entry.get("name").is_none());
    }
}
