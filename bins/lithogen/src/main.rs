use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lithodesign::block::Block;
use lithodesign::components::*;
use lithodesign::context::Context;
use lithodesign::pdk::Pdk;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let pdk = match &args.pdk {
        Some(path) => Pdk::from_toml_file(path)
            .with_context(|| format!("Failed to load PDK from {:?}.", path))?,
        None => Pdk::demo(),
    };
    tracing::info!(pdk = %pdk.name(), "loaded PDK");
    let ctx = Context::new(pdk);

    match args.component {
        ComponentKind::OptimalStep => lithogen::<OptimalStep>(&ctx, &args),
        ComponentKind::Rectangle => lithogen::<Rectangle>(&ctx, &args),
        ComponentKind::Straight => lithogen::<Straight>(&ctx, &args),
        ComponentKind::Cross => lithogen::<Cross>(&ctx, &args),
        ComponentKind::Taper => lithogen::<Taper>(&ctx, &args),
        ComponentKind::HyperTaper => lithogen::<HyperTaper>(&ctx, &args),
        ComponentKind::SineTaper => lithogen::<SineTaper>(&ctx, &args),
        ComponentKind::AngledTaper => lithogen::<AngledTaper>(&ctx, &args),
        ComponentKind::GratingCouplerTraditional => {
            lithogen::<GratingCouplerTraditional>(&ctx, &args)
        }
        ComponentKind::GratingCouplerArray => lithogen::<GratingCouplerArray>(&ctx, &args),
        ComponentKind::GratingCouplerCluster => lithogen::<GratingCouplerCluster>(&ctx, &args),
        ComponentKind::EblMarkerCorners => lithogen::<EblMarkerCorners>(&ctx, &args),
        ComponentKind::EblMarker => lithogen::<EblMarker>(&ctx, &args),
        ComponentKind::Pad => lithogen::<Pad>(&ctx, &args),
        ComponentKind::PadArray => lithogen::<PadArray>(&ctx, &args),
        ComponentKind::SpotConstriction => lithogen::<SpotConstriction>(&ctx, &args),
        ComponentKind::VariableLengthConstriction => {
            lithogen::<VariableLengthConstriction>(&ctx, &args)
        }
        ComponentKind::StraightSnspd => lithogen::<StraightSnspd>(&ctx, &args),
        ComponentKind::ResistorMeander => lithogen::<ResistorMeander>(&ctx, &args),
        ComponentKind::Ring => lithogen::<Ring>(&ctx, &args),
        ComponentKind::RingSingle => lithogen::<RingSingle>(&ctx, &args),
    }
}

/// Components that can be generated from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ComponentKind {
    OptimalStep,
    Rectangle,
    Straight,
    Cross,
    Taper,
    HyperTaper,
    SineTaper,
    AngledTaper,
    GratingCouplerTraditional,
    GratingCouplerArray,
    GratingCouplerCluster,
    EblMarkerCorners,
    EblMarker,
    Pad,
    PadArray,
    SpotConstriction,
    VariableLengthConstriction,
    StraightSnspd,
    ResistorMeander,
    Ring,
    RingSingle,
}

/// Arguments to [`lithogen`].
#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "Generate a parametric layout component and write it to a GDS file"
)]
struct Args {
    /// A TOML file describing the PDK.
    ///
    /// If unspecified, the built-in demo PDK is used.
    #[arg(long)]
    pdk: Option<PathBuf>,
    /// Log debug messages.
    #[arg(short, long)]
    verbose: bool,
    /// The component to generate.
    #[arg(value_enum)]
    component: ComponentKind,
    /// A TOML file of component parameters.
    ///
    /// Parameters missing from the file take their default values.
    #[arg(long)]
    params: Option<PathBuf>,
    /// The path where the GDS file should be saved.
    ///
    /// The file and its parent directories will be created if necessary.
    /// If the file already exists, it will be overwritten.
    #[arg(short, long)]
    out: PathBuf,
}

fn read_params<B: DeserializeOwned + Default>(path: Option<&Path>) -> anyhow::Result<B> {
    let Some(path) = path else {
        return Ok(B::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file {:?}.", path))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse parameters in {:?}.", path))
}

/// Generates one component, prints a summary, and writes it to GDS.
fn lithogen<B: Block + DeserializeOwned + Default>(ctx: &Context, args: &Args) -> anyhow::Result<()> {
    let block: B = read_params(args.params.as_deref())?;
    let component = ctx
        .generate_layout(&block)
        .with_context(|| format!("Failed to generate {}.", B::id()))?;

    println!("cell: {}", component.name());
    if component.ports().next().is_some() {
        println!("ports:");
        println!(
            "  {:<6} {:>12} {:>12} {:>10} {:>8}  layer",
            "name", "x", "y", "width", "angle"
        );
        for (name, port) in component.ports() {
            println!(
                "  {:<6} {:>12.4} {:>12.4} {:>10.4} {:>8.1}  {}",
                name,
                port.center().x,
                port.center().y,
                port.width(),
                port.orientation(),
                port.layer(),
            );
        }
    }
    if !component.info_map().is_empty() {
        println!("info:");
        for (key, value) in component.info_map() {
            println!("  {key} = {value}");
        }
    }

    ctx.write_gds(&block, &args.out)
        .with_context(|| format!("Failed to write GDS to {:?}.", args.out))?;
    println!("wrote {:?}", args.out);
    Ok(())
}
