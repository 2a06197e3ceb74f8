use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use scene_asset::{
    loader::ImportParams,
    manager::AssetManager,
    metadata::AssetType,
    model::Model,
    prefab::Prefab,
    registry::JsonRegistryFile,
};

#[derive(Parser)]
#[command(name = "scene-import")]
#[command(about = "Import a glTF scene and print what it contains")]
struct Cli {
    /// glTF or GLB file
    path: PathBuf,
    /// Keep the asset registry in this JSON file, reusing handles between runs
    #[arg(long)]
    registry: Option<PathBuf>,
    /// Scene of the file to build instead of the default one
    #[arg(long)]
    scene: Option<usize>,
    /// Import KHR_materials_unlit materials as metallic-roughness
    #[arg(long)]
    disable_unlit: bool,
    /// Interpolate rotations along the shortest arc
    #[arg(long)]
    shortest_path: bool,
    /// Evaluate the animation with this index
    #[arg(long)]
    animate: Option<usize>,
    /// Time in seconds at which the animation is evaluated
    #[arg(long, default_value_t = 0.0)]
    time: f32,
}

fn print_model(model: &Model) {
    println!(
        "  nodes: {} ({} roots)",
        model.nodes.len(),
        model.roots.len()
    );
    println!(
        "  vertices: {} ({} bytes), indices: {} ({} bytes)",
        model.vertex_count(),
        model.vertex_bytes().len(),
        model.index_count(),
        model.index_bytes().len()
    );
    println!("  skins: {}", model.skins.len());
    for (index, animation) in model.animations.iter().enumerate() {
        println!(
            "  animation #{} {}: {:.3}s, {} channels",
            index,
            animation.name,
            animation.duration(),
            animation.channels.len()
        );
    }
    if model.dimensions.valid {
        println!(
            "  dimensions: {} .. {}",
            model.dimensions.min, model.dimensions.max
        );
    }
    if !model.report.extensions_used.is_empty() {
        println!(
            "  extensions: {}",
            model.report.extensions_used.join(", ")
        );
    }
    for warning in &model.report.warnings {
        println!("  warning: {}", warning);
    }
}

fn print_prefab(prefab: &Prefab) {
    println!("Prefab {} ({})", prefab.name, prefab.handle);
    print_model(&prefab.model);
    for (handle, texture) in &prefab.textures {
        println!(
            "  texture {} {}: {}x{}{}",
            handle,
            texture.name,
            texture.size.0,
            texture.size.1,
            if texture.data.is_ktx2() { " (KTX2)" } else { "" }
        );
    }
    for (handle, material) in &prefab.materials {
        println!("  material {} {}", handle, material.name);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let asset_root = cli
        .path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = PathBuf::from(
        cli.path
            .file_name()
            .with_context(|| format!("{} is not a file", cli.path.display()))?,
    );
    let params = ImportParams {
        asset_root,
        disable_unlit: cli.disable_unlit,
        shortest_path_rotation: cli.shortest_path,
        scene: cli.scene,
        ..Default::default()
    };

    let mut manager = AssetManager::new(params);
    if let Some(registry) = &cli.registry {
        manager = manager.with_persistence(JsonRegistryFile::new(registry));
        manager
            .load_registry()
            .with_context(|| format!("Failed to load registry {}", registry.display()))?;
    }

    let registered = manager
        .registry()
        .iter()
        .find(|(_, metadata)| {
            metadata.asset_type == AssetType::Prefab && metadata.path == file_name
        })
        .map(|(handle, _)| handle);
    let prefab = match registered {
        Some(handle) => manager
            .import(handle)?
            .as_prefab()
            .cloned()
            .context("Registered asset is not a prefab")?,
        None => manager.import_prefab(file_name)?,
    };
    print_prefab(&prefab);

    if let Some(index) = cli.animate {
        let mut model = (*prefab.model).clone();
        if model.update_animation(index, cli.time) {
            println!("Animation #{} at {:.3}s", index, cli.time);
            println!(
                "  dimensions: {} .. {}",
                model.dimensions.min, model.dimensions.max
            );
        } else {
            warn!("Animation #{} has no keyframes around {}s", index, cli.time);
        }
    }
    Ok(())
}
