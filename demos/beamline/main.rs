//! Beamline demo: builds a shielded block with a pipe leaving its exit
//! face and prints the resulting cell and surface tables.
//!
//! Usage:
//! ```text
//! cargo run --example beamline
//! RUST_LOG=beamcsg=debug cargo run --example beamline   # stage-by-stage log
//! ```

use beamcsg::component::{Component, FixedComp};
use beamcsg::components::{ShieldBlock, VacuumPipe};
use beamcsg::config::{BuildConfig, FuncDataBase};
use beamcsg::model::BuildContext;
use beamcsg::BeamgeomError;
use tracing::info;

fn variables() -> FuncDataBase {
    let mut vars = FuncDataBase::new();
    vars.add_material("Stainless304", 3);
    vars.add_material("Concrete", 49);
    vars.add_material("Aluminium", 5);

    vars.add_variable("bunkerYStep", 100.0);
    vars.add_variable("bunkerLength", 200.0);
    vars.add_variable("bunkerWidth", 80.0);
    vars.add_variable("bunkerHeight", 80.0);
    vars.add_variable("bunkerNLayers", 2_i64);
    vars.add_variable("bunkerLayerThick0", 2.0);
    vars.add_variable("bunkerLayerThick1", 30.0);
    vars.add_variable("bunkerLayerMat0", "Stainless304");
    vars.add_variable("bunkerWallMat", "Concrete");

    vars.add_variable("pipeALength", 150.0);
    vars.add_variable("pipeARadius", 4.0);
    vars.add_variable("pipeAWallThick", 0.3);
    vars.add_variable("pipeAWallMat", "Aluminium");
    vars
}

fn main() -> Result<(), BeamgeomError> {
    // Default: WARN for everything, INFO for beamcsg.
    // Override with RUST_LOG env var (e.g. RUST_LOG=beamcsg=trace).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("beamline=info".parse().unwrap_or_default())
        .add_directive("beamcsg=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut ctx = BuildContext::new(BuildConfig::default(), variables());
    let world_cell = ctx.create_world()?;
    let world = FixedComp::new("World", 0);

    let mut bunker = ShieldBlock::new("bunker");
    bunker.add_insert_cell(world_cell);
    bunker.create_all(&mut ctx, &world, 0)?;

    let mut pipe = VacuumPipe::new("pipeA");
    pipe.add_insert_cell(world_cell);
    let exit = bunker.fixed().find_link("back")?;
    pipe.create_all(&mut ctx, bunker.fixed(), exit)?;

    info!(
        surfaces = ctx.surfaces().len(),
        cells = ctx.cells().count(),
        "model built"
    );

    println!("c --- cells");
    for cell in ctx.cells() {
        let owner = ctx.find_group_of_cell(cell.number()).unwrap_or("-");
        println!(
            "{:<6} {:>3} {:<40} $ {owner}",
            cell.number(),
            cell.material(),
            cell.rule().display()
        );
    }
    println!("c --- surfaces");
    for (id, surface) in ctx.surfaces().iter() {
        println!("{id:<6} {surface}");
    }
    println!("c --- outer boundary: {}", ctx.outer_boundary());
    Ok(())
}
