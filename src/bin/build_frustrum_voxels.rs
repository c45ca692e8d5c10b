//! Frustum voxel dataset builder binary.
//!
//! Usage: cargo run --release --bin build_frustrum_voxels -- [OPTIONS]
//!
//! Options:
//!   --root <DIR>        Dataset root directory (default: "data")
//!   --voxel-id <ID>     Voxel config identifier (default: "base_64")
//!   --voxel-dim <N>     Source voxel grid side length (default: 64)
//!   --out-dim <N>       Frustum grid side length (default: 32)
//!   --renderings <N>    Renderings per object (default: 8)
//!   --cat <ID>          Category id to process (required, repeatable)
//!   --concat            Write the concatenated final layout instead of
//!                       the fixed-width one
//!
//! Output structure:
//!   <root>/frustrum_voxels/<voxel-id>/v<out-dim>/
//!     temp_<cat>.fvx          # resumable intermediate store
//!     <cat>.fvx               # final store

use std::process::ExitCode;

use fruvox::config::{RenderManager, RenderParams, VoxelConfig};
use fruvox::pipeline::{create_frustrum_voxels_with_layout, FinalLayout};
use fruvox::store::frustrum_voxels_dir;

fn main() -> ExitCode {
    fruvox::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let root = parse_str_arg(&args, "--root").unwrap_or_else(|| "data".to_string());
    let voxel_id = parse_str_arg(&args, "--voxel-id").unwrap_or_else(|| "base_64".to_string());
    let voxel_dim = parse_usize_arg(&args, "--voxel-dim").unwrap_or(64);
    let out_dim = parse_usize_arg(&args, "--out-dim").unwrap_or(32);
    let n_renderings = parse_usize_arg(&args, "--renderings").unwrap_or(8);
    let cats = parse_str_args(&args, "--cat");
    let concat = args.iter().any(|a| a == "--concat");

    if cats.is_empty() {
        eprintln!("No categories given; pass at least one --cat <ID>");
        return ExitCode::FAILURE;
    }

    let voxel_config = VoxelConfig::new(voxel_id, voxel_dim);
    let manager = RenderManager::new(&root, RenderParams { n_renderings });
    let layout = if concat {
        FinalLayout::Concat
    } else {
        FinalLayout::Fixed
    };

    println!("=== Frustum Voxel Builder ===");
    println!("Root:       {}", root);
    println!("Voxels:     {} (dim {})", voxel_config.voxel_id, voxel_dim);
    println!("Out dim:    {}", out_dim);
    println!("Renderings: {}", n_renderings);
    println!("Categories: {}", cats.join(", "));
    println!();

    for cat_id in &cats {
        if let Err(e) =
            create_frustrum_voxels_with_layout(&manager, &voxel_config, out_dim, cat_id, layout)
        {
            log::error!("category {}: {}", cat_id, e);
            return ExitCode::FAILURE;
        }
    }

    let manifest = serde_json::json!({
        "voxel_id": voxel_config.voxel_id,
        "voxel_dim": voxel_dim,
        "out_dim": out_dim,
        "n_renderings": n_renderings,
        "layout": if concat { "concat" } else { "fixed" },
        "categories": cats,
    });
    let manifest_path =
        frustrum_voxels_dir(manager.root_dir(), &voxel_config, out_dim).join("manifest.json");
    if let Err(e) = std::fs::write(
        &manifest_path,
        serde_json::to_string_pretty(&manifest).expect("manifest serialization"),
    ) {
        log::error!("writing manifest: {}", e);
        return ExitCode::FAILURE;
    }

    println!();
    println!("=== Build Complete ===");
    println!("Categories: {}", cats.len());
    println!("Manifest:   {}", manifest_path.display());
    ExitCode::SUCCESS
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.clone())
}

fn parse_str_args(args: &[String], flag: &str) -> Vec<String> {
    args.iter()
        .enumerate()
        .filter(|(_, a)| *a == flag)
        .filter_map(|(i, _)| args.get(i + 1))
        .cloned()
        .collect()
}
