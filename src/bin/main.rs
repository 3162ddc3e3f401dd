//! Chunk Mesher CLI
//!
//! Stitch manifests, inspect fragment batches and preview Draco quantization.

use chunk_mesher::export::frags;
use chunk_mesher::quantization::ChunkGeometry;
use chunk_mesher::{
    covering_prefixes, BinSizeDivisor, Compression, DracoSettings, LocalStorage, ManifestTask,
};
use clap::{Parser, Subcommand, ValueEnum};
use glam::{DVec3, I64Vec3};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "chunk-mesher")]
#[command(author, version, about = "Mesh fragment tooling for labeled volumes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write per-object manifests from the fragments already in a layer
    Manifest {
        /// Layer directory (holds `info` and the mesh directory)
        #[arg(short, long)]
        layer: PathBuf,

        /// Id prefixes to aggregate; defaults to a set covering every id
        #[arg(short, long)]
        prefix: Vec<String>,

        /// Prefix length used when no prefix is given
        #[arg(long, default_value = "1")]
        digits: u32,

        /// Detail level
        #[arg(long, default_value = "0")]
        lod: u32,

        /// Mesh directory, overriding the layer's `info`
        #[arg(long)]
        mesh_dir: Option<String>,
    },

    /// Print the Draco settings a chunk would be encoded with
    Quantization {
        /// Chunk shape in voxels, e.g. "448,448,448"
        #[arg(long, value_parser = parse_triple::<i64>)]
        shape: [i64; 3],

        /// Voxel resolution, e.g. "8,8,40"
        #[arg(long, value_parser = parse_triple::<f64>)]
        resolution: [f64; 3],

        /// Chunk offset in voxels
        #[arg(long, value_parser = parse_triple::<i64>, default_value = "0,0,0")]
        offset: [i64; 3],

        #[arg(long, default_value = "0")]
        low_padding: u32,

        #[arg(long, default_value = "1")]
        high_padding: u32,

        /// Divisor for the maximum bin size
        #[arg(long, value_enum, default_value = "sqrt2")]
        divisor: Divisor,
    },

    /// List the objects in a `.frags` batch file
    Frags {
        /// Batch file; a `.deflate` suffix is inflated first
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Divisor {
    /// Finest resolution over the square root of two
    Sqrt2,
    /// Finest resolution over two
    Two,
}

impl From<Divisor> for BinSizeDivisor {
    fn from(d: Divisor) -> Self {
        match d {
            Divisor::Sqrt2 => BinSizeDivisor::Sqrt2,
            Divisor::Two => BinSizeDivisor::Two,
        }
    }
}

fn parse_triple<T: FromStr + Default + Copy>(s: &str) -> Result<[T; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("Invalid triple: '{}'. Use x,y,z", s));
    }
    let mut out = [T::default(); 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("Invalid number '{}' in '{}'", part, s))?;
    }
    Ok(out)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Manifest {
            layer,
            prefix,
            digits,
            lod,
            mesh_dir,
        } => {
            run_manifests(layer, prefix, digits, lod, mesh_dir)?;
        }
        Commands::Quantization {
            shape,
            resolution,
            offset,
            low_padding,
            high_padding,
            divisor,
        } => {
            let geometry = ChunkGeometry {
                shape: I64Vec3::from(shape),
                offset: I64Vec3::from(offset),
                overlap: (low_padding + high_padding) as i64,
                resolution: DVec3::from(resolution),
                divisor: divisor.into(),
            };
            let settings = DracoSettings::for_chunk(&geometry, 1, false);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::Frags { input } => {
            list_frags(&input)?;
        }
    }

    Ok(())
}

fn run_manifests(
    layer: PathBuf,
    prefixes: Vec<String>,
    digits: u32,
    lod: u32,
    mesh_dir: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = LocalStorage::new(layer);
    let prefixes = if prefixes.is_empty() {
        covering_prefixes(digits)
    } else {
        prefixes
    };

    let mut manifests = 0;
    let mut fragments = 0;
    for prefix in prefixes {
        let mut task = ManifestTask::new(prefix, lod);
        if let Some(dir) = &mesh_dir {
            task = task.with_mesh_dir(dir.clone());
        }
        let report = task.execute(&storage)?;
        manifests += report.manifests;
        fragments += report.fragments;
    }

    println!("Wrote {} manifests covering {} fragments", manifests, fragments);
    Ok(())
}

fn list_frags(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw = fs::read(path)?;
    let data = if path.extension().is_some_and(|e| e == "deflate") {
        Compression::Deflate.decompress(&path.display().to_string(), &raw)?
    } else {
        raw
    };

    let batch = frags::read_batch(&data)?;
    println!("{} objects in {:?}", batch.len(), path);
    for (id, bytes) in &batch {
        println!("  {:>20}  {:>10} bytes", id, bytes.len());
    }

    Ok(())
}
