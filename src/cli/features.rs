use clap::Parser;
use staccato::{
    get_features, load_structure, structure_from_pdb, write_df_to_file, DataFrameFileType,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Path to the PDB or mmCIF file to be analyzed
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Name of the output file
    #[arg(short = 'f', long = "filename", default_value_t = String::from("features"))]
    filename: String,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,
}

pub(crate) fn run(args: &Args) {
    trace!("{args:?}");

    // Make sure `input` exists
    let input_path = match Path::new(&args.input).canonicalize() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to retrieve input file: {}", e);
            return;
        }
    };
    let output_path = match std::path::absolute(&args.output) {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to resolve the output directory: {}", e);
            return;
        }
    };
    let input_file: String = input_path.to_str().unwrap().parse().unwrap();

    // Load file as complex structure
    let (pdb, pdb_warnings) = match load_structure(&input_file) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    if !pdb_warnings.is_empty() {
        for e in &pdb_warnings {
            match e.level() {
                pdbtbx::ErrorLevel::BreakingError => error!("{e}"),
                pdbtbx::ErrorLevel::InvalidatingError => error!("{e}"),
                _ => warn!("{e}"),
            }
        }
    }

    let structure = structure_from_pdb(&pdb);
    let mut df_features = get_features(&structure);
    info!("Found {} features", df_features.height());

    // Prepare output directory
    let _ = std::fs::create_dir_all(output_path.clone());
    let output_file = output_path
        .join(args.filename.clone())
        .with_extension(args.output_format.to_string());

    // Save results to the requested format
    if let Err(e) = write_df_to_file(&mut df_features, &output_file, args.output_format) {
        error!("Failed to write results: {e}");
        return;
    }
    let output_file_str = output_file.to_str().unwrap();
    info!("Results saved to {output_file_str}");
}
