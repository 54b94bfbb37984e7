#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

//! # Staccato Library
//!
//! This library detects non-covalent contacts in PDB and mmCIF files. It
//! derives chemical features from the heavy atoms of a structure, pairs
//! them into typed contacts such as hydrogen bonds, salt bridges, pi
//! stacking and metal coordination, and prunes occluded or redundant
//! pairs with geometric refinement passes.
//!
//! Results are available as plain structs or as Polars DataFrames, which
//! can be written to CSV, Parquet or NDJSON files.

mod geometry;
mod interactions;
mod structure;
mod utils;

// Re-export key public types
pub use geometry::{AdjacencyList, BitArray, SpatialHash};
pub use interactions::{
    calculate_contacts, calculate_features, contact_entries, get_contact_data, ContactData,
    ContactDataParams, ContactEntry, ContactError, ContactParams, ContactStore, ContactType,
    FeatureGroup, FeatureType, Features, FrozenContacts, InteractingAtom,
};
pub use structure::{
    load_structure, structure_from_pdb, AtomGeometry, AtomView, Element, ResidueView, Structure,
    StructureBuilder, StructureError,
};
pub use utils::{run_with_threads, write_df_to_file, DataFrameFileType};

use polars::prelude::*;
use tracing::debug;

/// Calculate non-covalent contacts in a structure.
///
/// # Arguments
///
/// * `structure` - Reference to a parsed structure
/// * `params` - Detection thresholds, usually [`ContactParams::default`]
///
/// # Returns
///
/// A Polars DataFrame containing the active contacts with columns:
/// - contact, distance
/// - from_model, from_chain, from_resn, from_resi, from_insertion, from_altloc, from_atomn, from_atomi
/// - to_model, to_chain, to_resn, to_resi, to_insertion, to_altloc, to_atomn, to_atomi
///
/// # Example
///
/// ```no_run
/// use staccato::{get_contacts, load_structure, structure_from_pdb, ContactParams};
///
/// let input_file = "path/to/structure.pdb".to_string();
/// let (pdb, _errors) = load_structure(&input_file).unwrap();
/// let structure = structure_from_pdb(&pdb);
/// let contacts_df = get_contacts(&structure, &ContactParams::default()).unwrap();
/// println!("Found {} contacts", contacts_df.height());
/// ```
pub fn get_contacts(
    structure: &Structure,
    params: &ContactParams,
) -> Result<DataFrame, ContactError> {
    let contacts = calculate_contacts(structure, params)?;
    let entries = contact_entries(structure, &contacts);
    debug!("Flattened {} active contacts", entries.len());

    let df = entries_to_df(&entries)
        .lazy()
        .sort(
            [
                "from_model",
                "from_chain",
                "to_chain",
                "from_resi",
                "from_altloc",
                "from_atomi",
                "to_resi",
                "to_altloc",
                "to_atomi",
                "contact",
            ],
            Default::default(),
        )
        .collect()
        .unwrap();
    Ok(df)
}

/// Derive the chemical features of a structure without pairing them up.
///
/// # Arguments
///
/// * `structure` - Reference to a parsed structure
///
/// # Returns
///
/// A Polars DataFrame with one row per feature, annotated with its key
/// atom, and columns:
/// - feature, group
/// - model, chain, resn, resi, insertion, altloc, atomn, atomi
/// - x, y, z, atom_count
///
/// # Example
///
/// ```no_run
/// use staccato::{get_features, load_structure, structure_from_pdb};
///
/// let input_file = "path/to/structure.pdb".to_string();
/// let (pdb, _errors) = load_structure(&input_file).unwrap();
/// let structure = structure_from_pdb(&pdb);
/// let features_df = get_features(&structure);
/// println!("Found {} features", features_df.height());
/// ```
pub fn get_features(structure: &Structure) -> DataFrame {
    let features = calculate_features(structure);
    let atoms = (0..features.len())
        .map(|i| InteractingAtom::from_atom(structure.atom(features.key_atom(i))))
        .collect::<Vec<InteractingAtom>>();

    df!(
        "feature" => (0..features.len()).map(|i| features.feature_type(i).to_string()).collect::<Vec<String>>(),
        "group" => (0..features.len()).map(|i| features.group(i).to_string()).collect::<Vec<String>>(),
        "model" => atoms.iter().map(|x| x.model as u32).collect::<Vec<u32>>(),
        "chain" => atoms.iter().map(|x| x.chain.to_owned()).collect::<Vec<String>>(),
        "resn" => atoms.iter().map(|x| x.resn.to_owned()).collect::<Vec<String>>(),
        "resi" => atoms.iter().map(|x| x.resi as i32).collect::<Vec<i32>>(),
        "insertion" => atoms.iter().map(|x| x.insertion.to_owned()).collect::<Vec<String>>(),
        "altloc" => atoms.iter().map(|x| x.altloc.to_owned()).collect::<Vec<String>>(),
        "atomn" => atoms.iter().map(|x| x.atomn.to_owned()).collect::<Vec<String>>(),
        "atomi" => atoms.iter().map(|x| x.atomi as i32).collect::<Vec<i32>>(),
        "x" => (0..features.len()).map(|i| features.center(i).x as f32).collect::<Vec<f32>>(),
        "y" => (0..features.len()).map(|i| features.center(i).y as f32).collect::<Vec<f32>>(),
        "z" => (0..features.len()).map(|i| features.center(i).z as f32).collect::<Vec<f32>>(),
        "atom_count" => (0..features.len()).map(|i| features.atom_set(i).len() as u32).collect::<Vec<u32>>(),
    )
    .unwrap()
    .sort(
        ["model", "chain", "resi", "altloc", "atomi", "feature"],
        Default::default(),
    )
    .unwrap()
}

// Helper functions (kept private)

fn entries_to_df(res: &[ContactEntry]) -> DataFrame {
    df!(
        "contact" => res.iter().map(|x| x.contact.to_string()).collect::<Vec<String>>(),
        "distance" => res.iter().map(|x| x.distance as f32).collect::<Vec<f32>>(),
        "from_model" => res.iter().map(|x| x.from.model as u32).collect::<Vec<u32>>(),
        "from_chain" => res.iter().map(|x| x.from.chain.to_owned()).collect::<Vec<String>>(),
        "from_resn" => res.iter().map(|x| x.from.resn.to_owned()).collect::<Vec<String>>(),
        "from_resi" => res.iter().map(|x| x.from.resi as i32).collect::<Vec<i32>>(),
        "from_insertion" => res.iter().map(|x| x.from.insertion.to_owned()).collect::<Vec<String>>(),
        "from_altloc" => res.iter().map(|x| x.from.altloc.to_owned()).collect::<Vec<String>>(),
        "from_atomn" => res.iter().map(|x| x.from.atomn.to_owned()).collect::<Vec<String>>(),
        "from_atomi" => res.iter().map(|x| x.from.atomi as i32).collect::<Vec<i32>>(),
        "to_model" => res.iter().map(|x| x.to.model as u32).collect::<Vec<u32>>(),
        "to_chain" => res.iter().map(|x| x.to.chain.to_owned()).collect::<Vec<String>>(),
        "to_resn" => res.iter().map(|x| x.to.resn.to_owned()).collect::<Vec<String>>(),
        "to_resi" => res.iter().map(|x| x.to.resi as i32).collect::<Vec<i32>>(),
        "to_insertion" => res.iter().map(|x| x.to.insertion.to_owned()).collect::<Vec<String>>(),
        "to_altloc" => res.iter().map(|x| x.to.altloc.to_owned()).collect::<Vec<String>>(),
        "to_atomn" => res.iter().map(|x| x.to.atomn.to_owned()).collect::<Vec<String>>(),
        "to_atomi" => res.iter().map(|x| x.to.atomi as i32).collect::<Vec<i32>>(),
    )
    .unwrap()
}
