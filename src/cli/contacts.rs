use clap::Parser;
use pdbtbx::*;
use rayon::prelude::*;
use staccato::{
    get_contacts, load_structure, run_with_threads, structure_from_pdb, write_df_to_file,
    ContactParams, DataFrameFileType,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

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
    #[arg(short = 'f', long = "filename", default_value_t = String::from("contacts"))]
    filename: String,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,

    /// Distance cutoff for hydrophobic contacts
    #[arg(long, default_value_t = 4.5)]
    max_hydrophobic_dist: f64,

    /// Donor-acceptor distance cutoff for hydrogen bonds
    #[arg(long, default_value_t = 3.5)]
    max_hbond_dist: f64,

    /// Distance cutoff for ionic interactions
    #[arg(long, default_value_t = 5.0)]
    max_ionic_dist: f64,

    /// Ring center distance cutoff for pi-stacking
    #[arg(long, default_value_t = 5.5)]
    max_pi_stacking_dist: f64,

    /// Cation to ring center distance cutoff for cation-pi interactions
    #[arg(long, default_value_t = 6.0)]
    max_cation_pi_dist: f64,

    /// Halogen to acceptor distance cutoff for halogen bonds
    #[arg(long, default_value_t = 4.0)]
    max_halogen_bond_dist: f64,

    /// Metal to partner distance cutoff for coordination
    #[arg(long, default_value_t = 3.0)]
    max_metal_dist: f64,

    /// Scale factor for the line of sight occlusion spheres
    #[arg(long = "los-factor", default_value_t = 1.0)]
    line_of_sight_dist_factor: f64,

    /// Keep every ionic interaction instead of the best one per charged atom
    #[arg(long, default_value_t = false)]
    no_refine_salt_bridges: bool,

    /// Zero-based index of the model all other models are compared
    /// against. Without it models are isolated from each other
    #[arg(short = 'm', long = "master-model")]
    master_model: Option<u32>,

    /// Number of threads to use for parallel processing. One thread should be sufficient unless the system is very large
    #[arg(short = 'j', long = "num-threads", default_value_t = 1)]
    num_threads: usize,
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

    let hydrogen_count = pdb
        .par_atoms()
        .filter(|a| a.element() == Some(&Element::H))
        .count();
    if hydrogen_count > 0 {
        debug!("Merging {hydrogen_count} explicit hydrogen atoms into the donor counts");
    }

    let structure = structure_from_pdb(&pdb);
    let params = ContactParams {
        max_hydrophobic_dist: args.max_hydrophobic_dist,
        max_hbond_dist: args.max_hbond_dist,
        max_ionic_dist: args.max_ionic_dist,
        max_pi_stacking_dist: args.max_pi_stacking_dist,
        max_cation_pi_dist: args.max_cation_pi_dist,
        max_halogen_bond_dist: args.max_halogen_bond_dist,
        max_metal_dist: args.max_metal_dist,
        line_of_sight_dist_factor: args.line_of_sight_dist_factor,
        refine_salt_bridges: !args.no_refine_salt_bridges,
        master_model_index: args.master_model,
        ..Default::default()
    };

    // Use the library function
    let mut df_contacts = match run_with_threads(args.num_threads, || {
        debug!("Using {} thread(s)", rayon::current_num_threads());
        get_contacts(&structure, &params)
    }) {
        Ok(df) => df,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    info!("Found {} contacts", df_contacts.height());

    // Prepare output directory
    let _ = std::fs::create_dir_all(output_path.clone());
    let output_file = output_path
        .join(args.filename.clone())
        .with_extension(args.output_format.to_string());

    // Save results to the requested format
    if let Err(e) = write_df_to_file(&mut df_contacts, &output_file, args.output_format) {
        error!("Failed to write results: {e}");
        return;
    }
    let output_file_str = output_file.to_str().unwrap();
    info!("Results saved to {output_file_str}");
}
