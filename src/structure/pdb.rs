use pdbtbx::{PDBError, PDB};
use thiserror::Error;
use tracing::warn;

use super::{AtomRecord, Structure, StructureBuilder};

/// Errors raised while loading a structure from a file.
#[derive(Debug, Error)]
pub enum StructureError {
    /// The file could not be parsed.
    #[error("failed to read structure from '{path}': {details}")]
    Read {
        /// Path of the offending file.
        path: String,
        /// Concatenated parser errors.
        details: String,
    },
}

/// Read a PDB or mmCIF file in loose mode, keeping only atomic
/// coordinates. Returns the parsed file together with any non-fatal
/// parser diagnostics so the caller can log them.
pub fn load_structure(path: &str) -> Result<(PDB, Vec<PDBError>), StructureError> {
    pdbtbx::ReadOptions::default()
        .set_only_atomic_coords(true)
        .set_level(pdbtbx::StrictnessLevel::Loose)
        .read(path)
        .map_err(|errors| StructureError::Read {
            path: path.to_string(),
            details: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })
}

/// Convert a parsed file into a [`Structure`], deriving bonds, rings and
/// valences along the way.
///
/// Alternate conformers of a residue are merged into a single residue
/// with per-atom alternate location codes, so exclusion rules that
/// compare residues see them as one. Atoms without a recognized element
/// are skipped.
pub fn structure_from_pdb(pdb: &PDB) -> Structure {
    let mut builder = StructureBuilder::new();
    for model in pdb.models() {
        builder.start_model(model.serial_number());
        for chain in model.chains() {
            builder.start_chain(chain.id());
            for residue in chain.residues() {
                let (number, insertion) = residue.id();
                let mut conformers = residue.conformers();
                let Some(first) = conformers.next() else {
                    continue;
                };
                builder.start_residue(first.name(), number, insertion.unwrap_or(""));
                for conformer in std::iter::once(first).chain(conformers) {
                    let alt_loc = conformer.alternative_location().unwrap_or("");
                    for atom in conformer.atoms() {
                        let Some(element) = atom.element() else {
                            warn!(
                                "Skipping atom {} {} without a recognized element",
                                atom.serial_number(),
                                atom.name()
                            );
                            continue;
                        };
                        let (x, y, z) = atom.pos();
                        builder.add_atom_with(&AtomRecord {
                            name: atom.name(),
                            element: *element,
                            position: (x, y, z),
                            serial_number: atom.serial_number(),
                            alt_loc,
                            formal_charge: atom.charge() as i8,
                        });
                    }
                }
            }
        }
    }
    builder.finish()
}
