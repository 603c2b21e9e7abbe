//! `meshport`: list supported formats, inspect files and convert between them

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use meshport_io::{
    formats_for, sniff::resolve_tag, Kind, ReadOptions, ReadPointCloudOptions, WriteGeometryOptions,
    WriteImageOptions, WriteOptions, WriteTriangleMeshOptions, AUTO, DEFAULT_QUALITY,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "meshport", version, about = "Read, inspect and convert 3D data files")]
struct Cli {
    /// Log format detection, ignored options and filtering
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the formats registered for each kind
    Formats {
        /// Only list formats of this kind
        #[arg(long, value_parser = parse_kind)]
        kind: Option<Kind>,
    },
    /// Read a file and print a summary of its contents
    Info {
        #[arg(value_parser = parse_kind)]
        kind: Kind,
        file: PathBuf,
        /// Format tag, or `auto` to use the file extension
        #[arg(long, default_value = AUTO)]
        format: String,
    },
    /// Read a file and write it back out, usually in another format
    Convert(ConvertArgs),
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(value_parser = parse_kind)]
    kind: Kind,
    input: PathBuf,
    output: PathBuf,
    #[arg(long, default_value = AUTO)]
    input_format: String,
    #[arg(long, default_value = AUTO)]
    output_format: String,
    /// Prefer the text encoding where the format has one
    #[arg(long)]
    ascii: bool,
    /// Compress where the format supports it
    #[arg(long)]
    compressed: bool,
    /// Leave mesh vertex normals out of the output
    #[arg(long)]
    no_normals: bool,
    /// Leave mesh vertex colors out of the output
    #[arg(long)]
    no_colors: bool,
    /// Keep points with NaN coordinates
    #[arg(long)]
    keep_nan: bool,
    /// Keep points with infinite coordinates
    #[arg(long)]
    keep_infinite: bool,
    /// JPEG quality, 1 to 100
    #[arg(long, default_value_t = DEFAULT_QUALITY)]
    quality: i32,
}

impl ConvertArgs {
    fn read_options(&self) -> ReadOptions {
        ReadOptions::with_format(self.input_format.as_str())
    }

    fn read_point_cloud_options(&self) -> ReadPointCloudOptions {
        ReadPointCloudOptions {
            format: self.input_format.clone(),
            remove_nan_points: !self.keep_nan,
            remove_infinite_points: !self.keep_infinite,
        }
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions::with_format(self.output_format.as_str())
    }

    fn geometry_options(&self) -> WriteGeometryOptions {
        WriteGeometryOptions {
            format: self.output_format.clone(),
            write_ascii: self.ascii,
            compressed: self.compressed,
        }
    }

    fn mesh_options(&self) -> WriteTriangleMeshOptions {
        WriteTriangleMeshOptions {
            format: self.output_format.clone(),
            write_ascii: self.ascii,
            compressed: self.compressed,
            write_vertex_normals: !self.no_normals,
            write_vertex_colors: !self.no_colors,
        }
    }

    fn image_options(&self) -> WriteImageOptions {
        WriteImageOptions {
            format: self.output_format.clone(),
            quality: self.quality,
        }
    }
}

fn parse_kind(name: &str) -> std::result::Result<Kind, String> {
    Kind::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = Kind::ALL.iter().map(|k| k.name()).collect();
        format!("unknown kind '{}', expected one of: {}", name, known.join(", "))
    })
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_formats(kind: Option<Kind>) {
    let kinds: Vec<Kind> = match kind {
        Some(kind) => vec![kind],
        None => Kind::ALL.to_vec(),
    };
    for kind in kinds {
        println!("{}", kind);
        for entry in formats_for(kind) {
            let default = if entry.format == kind.default_format() { " (default)" } else { "" };
            let aliases = if entry.aliases.is_empty() {
                String::new()
            } else {
                format!(" [{}]", entry.aliases.join(", "))
            };
            let flags: Vec<&str> = entry.honours.iter().map(|f| f.name()).collect();
            println!("  {}{}{}: {}", entry.tag(), aliases, default, entry.precision);
            if !flags.is_empty() {
                println!("      honours {}", flags.join(", "));
            }
        }
    }
}

/// Human-readable summary lines for the entity stored in `file`
fn describe(kind: Kind, file: &Path, format: &str) -> Result<Vec<String>> {
    let options = ReadOptions::with_format(format);
    let lines = match kind {
        Kind::PointCloud => {
            let options = ReadPointCloudOptions::unfiltered().with_format(format);
            let cloud = meshport_io::try_read_point_cloud(file, &options)?;
            vec![
                format!("points: {}", cloud.len()),
                format!("normals: {}", cloud.has_normals()),
                format!("colors: {}", cloud.has_colors()),
            ]
        }
        Kind::TriangleMesh => {
            let mesh = meshport_io::try_read_triangle_mesh(file, &options)?;
            vec![
                format!("vertices: {}", mesh.vertex_count()),
                format!("triangles: {}", mesh.face_count()),
                format!("normals: {}", mesh.has_normals()),
                format!("colors: {}", mesh.has_colors()),
            ]
        }
        Kind::LineSet => {
            let lines = meshport_io::try_read_line_set(file, &options)?;
            vec![
                format!("points: {}", lines.points.len()),
                format!("lines: {}", lines.lines.len()),
                format!("colors: {}", lines.has_colors()),
            ]
        }
        Kind::VoxelGrid => {
            let grid = meshport_io::try_read_voxel_grid(file, &options)?;
            vec![
                format!("voxels: {}", grid.len()),
                format!("voxel size: {}", grid.voxel_size),
                format!("origin: {} {} {}", grid.origin.x, grid.origin.y, grid.origin.z),
                format!("colors: {}", grid.has_colors()),
            ]
        }
        Kind::Image => {
            let image = meshport_io::try_read_image(file, &options)?;
            vec![
                format!("size: {}x{}", image.width, image.height),
                format!("channels: {}", image.num_of_channels),
                format!("bytes per channel: {}", image.bytes_per_channel),
            ]
        }
        Kind::PinholeCameraIntrinsic => {
            let intrinsic = meshport_io::try_read_pinhole_camera_intrinsic(file, &options)?;
            vec![
                format!("size: {}x{}", intrinsic.width, intrinsic.height),
                format!("focal length: {} {}", intrinsic.fx(), intrinsic.fy()),
                format!("principal point: {} {}", intrinsic.cx(), intrinsic.cy()),
                format!("skew: {}", intrinsic.skew()),
                format!("valid: {}", intrinsic.is_valid()),
            ]
        }
        Kind::PinholeCameraParameters => {
            let parameters = meshport_io::try_read_pinhole_camera_parameters(file, &options)?;
            let t = parameters.extrinsic.fixed_view::<3, 1>(0, 3);
            vec![
                format!("image size: {}x{}", parameters.intrinsic.width, parameters.intrinsic.height),
                format!("extrinsic translation: {} {} {}", t[0], t[1], t[2]),
            ]
        }
        Kind::PinholeCameraTrajectory => {
            let trajectory = meshport_io::try_read_pinhole_camera_trajectory(file, &options)?;
            vec![format!("frames: {}", trajectory.len())]
        }
        Kind::Feature => {
            let feature = meshport_io::try_read_feature(file, &options)?;
            vec![
                format!("keypoints: {}", feature.num_keypoints()),
                format!("dimension: {}", feature.dimension()),
            ]
        }
        Kind::PoseGraph => {
            let graph = meshport_io::try_read_pose_graph(file, &options)?;
            vec![
                format!("nodes: {}", graph.nodes.len()),
                format!("edges: {}", graph.edges.len()),
                format!("uncertain edges: {}", graph.edges.iter().filter(|e| e.uncertain).count()),
            ]
        }
    };
    Ok(lines)
}

fn convert(args: &ConvertArgs) -> Result<()> {
    let (input, output) = (args.input.as_path(), args.output.as_path());
    let reading = || format!("failed to read {} from {}", args.kind, input.display());
    let writing = || format!("failed to write {} to {}", args.kind, output.display());

    match args.kind {
        Kind::PointCloud => {
            let cloud = meshport_io::try_read_point_cloud(input, &args.read_point_cloud_options())
                .with_context(reading)?;
            meshport_io::try_write_point_cloud(output, &cloud, &args.geometry_options())
                .with_context(writing)?;
        }
        Kind::TriangleMesh => {
            let mesh = meshport_io::try_read_triangle_mesh(input, &args.read_options()).with_context(reading)?;
            meshport_io::try_write_triangle_mesh(output, &mesh, &args.mesh_options()).with_context(writing)?;
        }
        Kind::LineSet => {
            let lines = meshport_io::try_read_line_set(input, &args.read_options()).with_context(reading)?;
            meshport_io::try_write_line_set(output, &lines, &args.geometry_options()).with_context(writing)?;
        }
        Kind::VoxelGrid => {
            let grid = meshport_io::try_read_voxel_grid(input, &args.read_options()).with_context(reading)?;
            meshport_io::try_write_voxel_grid(output, &grid, &args.geometry_options()).with_context(writing)?;
        }
        Kind::Image => {
            let image = meshport_io::try_read_image(input, &args.read_options()).with_context(reading)?;
            meshport_io::try_write_image(output, &image, &args.image_options()).with_context(writing)?;
        }
        Kind::PinholeCameraIntrinsic => {
            let intrinsic = meshport_io::try_read_pinhole_camera_intrinsic(input, &args.read_options())
                .with_context(reading)?;
            meshport_io::try_write_pinhole_camera_intrinsic(output, &intrinsic, &args.write_options())
                .with_context(writing)?;
        }
        Kind::PinholeCameraParameters => {
            let parameters = meshport_io::try_read_pinhole_camera_parameters(input, &args.read_options())
                .with_context(reading)?;
            meshport_io::try_write_pinhole_camera_parameters(output, &parameters, &args.write_options())
                .with_context(writing)?;
        }
        Kind::PinholeCameraTrajectory => {
            let trajectory = meshport_io::try_read_pinhole_camera_trajectory(input, &args.read_options())
                .with_context(reading)?;
            meshport_io::try_write_pinhole_camera_trajectory(output, &trajectory, &args.write_options())
                .with_context(writing)?;
        }
        Kind::Feature => {
            let feature = meshport_io::try_read_feature(input, &args.read_options()).with_context(reading)?;
            meshport_io::try_write_feature(output, &feature, &args.write_options()).with_context(writing)?;
        }
        Kind::PoseGraph => {
            let graph = meshport_io::try_read_pose_graph(input, &args.read_options()).with_context(reading)?;
            meshport_io::try_write_pose_graph(output, &graph, &args.write_options()).with_context(writing)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Formats { kind } => print_formats(kind),
        Command::Info { kind, file, format } => {
            let tag = resolve_tag(kind, &file, &format).to_ascii_lowercase();
            let lines = describe(kind, &file, &format)
                .with_context(|| format!("failed to read {} from {}", kind, file.display()))?;
            println!("{} ({} as {})", file.display(), kind, tag);
            for line in lines {
                println!("  {}", line);
            }
        }
        Command::Convert(args) => {
            convert(&args)?;
            log::info!("wrote {}", args.output.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_flags_map_to_options() {
        let cli = Cli::parse_from([
            "meshport", "convert", "triangle_mesh", "in.obj", "out.ply", "--ascii", "--no-colors",
        ]);
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        let options = args.mesh_options();
        assert!(options.write_ascii);
        assert!(options.write_vertex_normals);
        assert!(!options.write_vertex_colors);
        assert_eq!(options.format, AUTO);
        assert!(args.read_point_cloud_options().remove_nan_points);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(parse_kind("mesh").is_err());
        assert_eq!(parse_kind("POINT_CLOUD"), Ok(Kind::PointCloud));
    }
}
