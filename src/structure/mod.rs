//! Columnar model of a molecular structure with derived topology.
//!
//! [`Structure`] keeps atoms, residues, chains and models in parallel
//! arrays. Covalent bonds, aromatic rings and per-atom valence data
//! (formal charge, implied hydrogens, ideal geometry) are derived once at
//! build time, so the interaction detection code can treat them as plain
//! lookups. [`AtomView`] and [`ResidueView`] are cheap copyable views into
//! those arrays.

use std::collections::HashSet;

use nalgebra as na;
use tracing::warn;

use crate::geometry::{create_adjacency_list, AdjacencyList, EdgeList, Plane, SpatialHash};

mod element;
mod pdb;
mod valence;

pub use element::{
    covalent_radius, is_halogen, is_halogen_bond_donor, is_ionic_type_metal, is_metal,
    is_transition_metal, vdw_radius, DEFAULT_VDW_RADIUS,
};
pub use pdb::{load_structure, structure_from_pdb, StructureError};
pub use pdbtbx::Element;
pub use valence::{assign_geometry, ideal_angle, AtomGeometry};

/// Additive tolerance on the sum of covalent radii when perceiving bonds.
const BOND_TOLERANCE: f64 = 0.45;
/// Pairs closer than this are overlapping records, not bonds.
const MIN_BOND_DIST: f64 = 0.4;
/// Neighbor search radius covering any plausible covalent pair.
const BOND_QUERY_RADIUS: f64 = 3.0;
/// Maximum out-of-plane deviation for a perceived aromatic ring.
const RING_PLANARITY_TOLERANCE: f64 = 0.1;

/// The twenty standard amino acids plus the common variants
/// selenomethionine, selenocysteine and pyrrolysine.
pub fn is_standard_amino_acid(resn: &str) -> bool {
    matches!(
        resn,
        "ALA" | "ARG"
            | "ASN"
            | "ASP"
            | "CYS"
            | "GLN"
            | "GLU"
            | "GLY"
            | "HIS"
            | "ILE"
            | "LEU"
            | "LYS"
            | "MET"
            | "PHE"
            | "PRO"
            | "SER"
            | "THR"
            | "TRP"
            | "TYR"
            | "VAL"
            | "MSE"
            | "SEC"
            | "PYL"
    )
}

/// Standard ribo- and deoxyribonucleotide residue names.
pub fn is_standard_nucleic(resn: &str) -> bool {
    matches!(
        resn,
        "A" | "C" | "G" | "U" | "I" | "T" | "DA" | "DC" | "DG" | "DT" | "DU" | "DI"
    )
}

/// Common water residue names.
pub fn is_water(resn: &str) -> bool {
    matches!(
        resn,
        "HOH" | "WAT" | "H2O" | "SOL" | "DOD" | "TIP" | "TIP3" | "TIP4" | "SPC" | "W"
    )
}

/// A molecular structure in structure-of-arrays layout.
///
/// Atoms are grouped contiguously by residue, residues by chain, chains by
/// model. Build one with [`StructureBuilder`] or convert a parsed file
/// with [`structure_from_pdb`].
#[derive(Debug, Clone)]
pub struct Structure {
    pub(crate) atom_names: Vec<String>,
    pub(crate) elements: Vec<Element>,
    pub(crate) positions: Vec<na::Point3<f64>>,
    pub(crate) serial_numbers: Vec<usize>,
    pub(crate) alt_locs: Vec<String>,
    pub(crate) formal_charges: Vec<i8>,
    pub(crate) implicit_h: Vec<u8>,
    pub(crate) total_h: Vec<u8>,
    pub(crate) geometry: Vec<AtomGeometry>,
    pub(crate) atom_aromatic: Vec<bool>,
    pub(crate) residue_of_atom: Vec<u32>,

    pub(crate) residue_names: Vec<String>,
    pub(crate) residue_numbers: Vec<isize>,
    pub(crate) insertion_codes: Vec<String>,
    pub(crate) chain_of_residue: Vec<u32>,
    pub(crate) residue_atom_offsets: Vec<u32>,

    pub(crate) chain_names: Vec<String>,
    pub(crate) model_of_chain: Vec<u32>,
    pub(crate) model_serials: Vec<usize>,

    pub(crate) bonds: AdjacencyList,
    pub(crate) aromatic_rings: Vec<Vec<u32>>,
}

impl Structure {
    /// Number of atoms.
    pub fn atom_count(&self) -> usize {
        self.atom_names.len()
    }

    /// Number of residues.
    pub fn residue_count(&self) -> usize {
        self.residue_names.len()
    }

    /// Number of chains.
    pub fn chain_count(&self) -> usize {
        self.chain_names.len()
    }

    /// Number of models.
    pub fn model_count(&self) -> usize {
        self.model_serials.len()
    }

    /// View of the atom at `index`. Panics if the index is out of range.
    pub fn atom(&self, index: u32) -> AtomView<'_> {
        assert!(
            (index as usize) < self.atom_names.len(),
            "atom index {index} out of range"
        );
        AtomView {
            structure: self,
            index,
        }
    }

    /// View of the residue at `index`. Panics if the index is out of range.
    pub fn residue(&self, index: u32) -> ResidueView<'_> {
        assert!(
            (index as usize) < self.residue_names.len(),
            "residue index {index} out of range"
        );
        ResidueView {
            structure: self,
            index,
        }
    }

    /// Iterate over all atoms.
    pub fn atoms(&self) -> impl Iterator<Item = AtomView<'_>> {
        (0..self.atom_names.len() as u32).map(move |index| AtomView {
            structure: self,
            index,
        })
    }

    /// Iterate over all residues.
    pub fn residues(&self) -> impl Iterator<Item = ResidueView<'_>> {
        (0..self.residue_names.len() as u32).map(move |index| ResidueView {
            structure: self,
            index,
        })
    }

    /// All atom positions, indexed by atom.
    pub fn positions(&self) -> &[na::Point3<f64>] {
        &self.positions
    }

    /// The covalent bond graph.
    pub fn bonds(&self) -> &AdjacencyList {
        &self.bonds
    }

    /// Perceived aromatic rings as lists of atom indices.
    pub fn aromatic_rings(&self) -> &[Vec<u32>] {
        &self.aromatic_rings
    }
}

/// A borrowed view of one atom.
#[derive(Debug, Clone, Copy)]
pub struct AtomView<'a> {
    structure: &'a Structure,
    index: u32,
}

impl<'a> AtomView<'a> {
    /// Index of this atom in the structure.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Atom name, e.g. `CA` or `OD1`.
    pub fn name(&self) -> &'a str {
        &self.structure.atom_names[self.index as usize]
    }

    /// Chemical element.
    pub fn element(&self) -> Element {
        self.structure.elements[self.index as usize]
    }

    /// Position in angstroms.
    pub fn position(&self) -> na::Point3<f64> {
        self.structure.positions[self.index as usize]
    }

    /// Serial number from the source file.
    pub fn serial_number(&self) -> usize {
        self.structure.serial_numbers[self.index as usize]
    }

    /// Alternate location identifier, empty when absent.
    pub fn alt_loc(&self) -> &'a str {
        &self.structure.alt_locs[self.index as usize]
    }

    /// Formal charge after valence assignment.
    pub fn formal_charge(&self) -> i8 {
        self.structure.formal_charges[self.index as usize]
    }

    /// Hydrogens implied by the valence model but absent from the file.
    pub fn implicit_h_count(&self) -> u8 {
        self.structure.implicit_h[self.index as usize]
    }

    /// Implied plus explicit hydrogens on this atom.
    pub fn total_h_count(&self) -> u8 {
        self.structure.total_h[self.index as usize]
    }

    /// Ideal coordination geometry.
    pub fn geometry(&self) -> AtomGeometry {
        self.structure.geometry[self.index as usize]
    }

    /// Whether the atom is part of an aromatic ring.
    pub fn is_aromatic(&self) -> bool {
        self.structure.atom_aromatic[self.index as usize]
    }

    /// The residue this atom belongs to.
    pub fn residue(&self) -> ResidueView<'a> {
        ResidueView {
            structure: self.structure,
            index: self.structure.residue_of_atom[self.index as usize],
        }
    }

    /// Index of the model this atom belongs to.
    pub fn model_index(&self) -> u32 {
        self.residue().model_index()
    }

    /// Indices of all covalently bonded atoms.
    pub fn bonded_atoms(&self) -> &'a [u32] {
        self.structure.bonds.neighbors(self.index)
    }

    /// Views of all covalently bonded atoms.
    pub fn bonded(&self) -> impl Iterator<Item = AtomView<'a>> + 'a {
        let structure = self.structure;
        structure
            .bonds
            .neighbors(self.index)
            .iter()
            .map(move |&j| structure.atom(j))
    }

    /// Indices of bonded atoms that are not hydrogen.
    pub fn bonded_heavy_atoms(&self) -> impl Iterator<Item = u32> + 'a {
        let structure = self.structure;
        structure
            .bonds
            .neighbors(self.index)
            .iter()
            .copied()
            .filter(move |&j| structure.elements[j as usize] != Element::H)
    }

    /// Number of bonded atoms of the given element.
    pub fn bonded_element_count(&self, element: Element) -> usize {
        self.bonded_atoms()
            .iter()
            .filter(|&&j| self.structure.elements[j as usize] == element)
            .count()
    }

    /// Whether this atom is covalently bonded to `other`.
    pub fn is_bonded_to(&self, other: u32) -> bool {
        self.bonded_atoms().contains(&other)
    }

    /// Whether this atom belongs to the protein or nucleic acid backbone.
    pub fn is_backbone(&self) -> bool {
        let residue = self.residue();
        if residue.is_amino_acid() {
            matches!(self.name(), "N" | "CA" | "C" | "O" | "OXT")
        } else if residue.is_nucleic() {
            matches!(
                self.name(),
                "P" | "OP1"
                    | "OP2"
                    | "OP3"
                    | "O5'"
                    | "C5'"
                    | "C4'"
                    | "O4'"
                    | "C3'"
                    | "O3'"
                    | "C1'"
                    | "C2'"
            )
        } else {
            false
        }
    }

    /// Whether this atom is a heavy side chain atom of a polymer residue.
    pub fn is_sidechain(&self) -> bool {
        let residue = self.residue();
        (residue.is_amino_acid() || residue.is_nucleic())
            && self.element() != Element::H
            && !self.is_backbone()
    }

    /// Whether the parent residue is a water.
    pub fn is_water(&self) -> bool {
        self.residue().is_water()
    }
}

/// A borrowed view of one residue.
#[derive(Debug, Clone, Copy)]
pub struct ResidueView<'a> {
    structure: &'a Structure,
    index: u32,
}

impl<'a> ResidueView<'a> {
    /// Index of this residue in the structure.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Residue name, e.g. `ARG` or `HOH`.
    pub fn name(&self) -> &'a str {
        &self.structure.residue_names[self.index as usize]
    }

    /// Residue sequence number.
    pub fn number(&self) -> isize {
        self.structure.residue_numbers[self.index as usize]
    }

    /// Insertion code, empty when absent.
    pub fn insertion_code(&self) -> &'a str {
        &self.structure.insertion_codes[self.index as usize]
    }

    /// Name of the chain this residue belongs to.
    pub fn chain_name(&self) -> &'a str {
        let chain = self.structure.chain_of_residue[self.index as usize];
        &self.structure.chain_names[chain as usize]
    }

    /// Index of the model this residue belongs to.
    pub fn model_index(&self) -> u32 {
        let chain = self.structure.chain_of_residue[self.index as usize];
        self.structure.model_of_chain[chain as usize]
    }

    /// Serial number of the model this residue belongs to.
    pub fn model_serial(&self) -> usize {
        self.structure.model_serials[self.model_index() as usize]
    }

    /// The range of atom indices covering this residue.
    pub fn atom_indices(&self) -> std::ops::Range<u32> {
        let start = self.structure.residue_atom_offsets[self.index as usize];
        let end = self.structure.residue_atom_offsets[self.index as usize + 1];
        start..end
    }

    /// Number of atoms in this residue.
    pub fn atom_count(&self) -> usize {
        self.atom_indices().len()
    }

    /// Iterate over the atoms of this residue.
    pub fn atoms(&self) -> impl Iterator<Item = AtomView<'a>> + 'a {
        let structure = self.structure;
        self.atom_indices().map(move |index| AtomView { structure, index })
    }

    /// Find an atom of this residue by name.
    pub fn find_atom(&self, name: &str) -> Option<AtomView<'a>> {
        self.atoms().find(|atom| atom.name() == name)
    }

    /// Whether this is a standard amino acid.
    pub fn is_amino_acid(&self) -> bool {
        is_standard_amino_acid(self.name())
    }

    /// Whether this is a standard nucleotide.
    pub fn is_nucleic(&self) -> bool {
        is_standard_nucleic(self.name())
    }

    /// Whether this is a water.
    pub fn is_water(&self) -> bool {
        is_water(self.name())
    }

    /// Whether this residue is neither polymer nor water.
    pub fn is_hetero(&self) -> bool {
        !self.is_amino_acid() && !self.is_nucleic() && !self.is_water()
    }
}

/// Atom description for [`StructureBuilder::add_atom_with`].
#[derive(Debug, Clone)]
pub struct AtomRecord<'a> {
    /// Atom name.
    pub name: &'a str,
    /// Chemical element.
    pub element: Element,
    /// Position in angstroms.
    pub position: (f64, f64, f64),
    /// Serial number.
    pub serial_number: usize,
    /// Alternate location identifier, empty when absent.
    pub alt_loc: &'a str,
    /// Formal charge from the source file, 0 when absent.
    pub formal_charge: i8,
}

/// Incremental [`Structure`] builder.
///
/// Call [`start_model`](Self::start_model),
/// [`start_chain`](Self::start_chain) and
/// [`start_residue`](Self::start_residue) to open each level of the
/// hierarchy, then add atoms to the current residue. [`finish`](Self::finish)
/// perceives bonds from interatomic distances, finds aromatic rings and
/// assigns valences. Bonds and rings known up front can be declared with
/// [`add_bond`](Self::add_bond) and
/// [`add_aromatic_ring`](Self::add_aromatic_ring).
#[derive(Debug, Default)]
pub struct StructureBuilder {
    atom_names: Vec<String>,
    elements: Vec<Element>,
    positions: Vec<na::Point3<f64>>,
    serial_numbers: Vec<usize>,
    alt_locs: Vec<String>,
    formal_charges: Vec<i8>,
    residue_of_atom: Vec<u32>,

    residue_names: Vec<String>,
    residue_numbers: Vec<isize>,
    insertion_codes: Vec<String>,
    chain_of_residue: Vec<u32>,
    residue_atom_offsets: Vec<u32>,

    chain_names: Vec<String>,
    model_of_chain: Vec<u32>,
    model_serials: Vec<usize>,

    explicit_bonds: Vec<(u32, u32)>,
    explicit_rings: Vec<Vec<u32>>,
}

impl StructureBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new model.
    pub fn start_model(&mut self, serial_number: usize) -> &mut Self {
        self.model_serials.push(serial_number);
        self
    }

    /// Open a new chain in the current model.
    pub fn start_chain(&mut self, name: &str) -> &mut Self {
        assert!(
            !self.model_serials.is_empty(),
            "start_model must be called before start_chain"
        );
        self.chain_names.push(name.to_string());
        self.model_of_chain.push(self.model_serials.len() as u32 - 1);
        self
    }

    /// Open a new residue in the current chain.
    pub fn start_residue(&mut self, name: &str, number: isize, insertion_code: &str) -> &mut Self {
        assert!(
            !self.chain_names.is_empty(),
            "start_chain must be called before start_residue"
        );
        self.residue_names.push(name.to_string());
        self.residue_numbers.push(number);
        self.insertion_codes.push(insertion_code.to_string());
        self.chain_of_residue.push(self.chain_names.len() as u32 - 1);
        self.residue_atom_offsets.push(self.atom_names.len() as u32);
        self
    }

    /// Add an atom to the current residue with an auto-assigned serial
    /// number, no alternate location and no formal charge. Returns its
    /// index.
    pub fn add_atom(&mut self, name: &str, element: Element, position: (f64, f64, f64)) -> u32 {
        let serial_number = self.atom_names.len() + 1;
        self.add_atom_with(&AtomRecord {
            name,
            element,
            position,
            serial_number,
            alt_loc: "",
            formal_charge: 0,
        })
    }

    /// Add a fully described atom to the current residue. Returns its index.
    pub fn add_atom_with(&mut self, record: &AtomRecord) -> u32 {
        assert!(
            !self.residue_names.is_empty(),
            "start_residue must be called before add_atom"
        );
        let index = self.atom_names.len() as u32;
        self.atom_names.push(record.name.to_string());
        self.elements.push(record.element);
        let (x, y, z) = record.position;
        self.positions.push(na::Point3::new(x, y, z));
        self.serial_numbers.push(record.serial_number);
        self.alt_locs.push(record.alt_loc.to_string());
        self.formal_charges.push(record.formal_charge);
        self.residue_of_atom.push(self.residue_names.len() as u32 - 1);
        index
    }

    /// Declare a covalent bond between two atoms already added.
    pub fn add_bond(&mut self, atom1: u32, atom2: u32) -> &mut Self {
        self.explicit_bonds.push((atom1, atom2));
        self
    }

    /// Declare an aromatic ring over atoms already added, bypassing ring
    /// perception for them.
    pub fn add_aromatic_ring(&mut self, atoms: &[u32]) -> &mut Self {
        self.explicit_rings.push(atoms.to_vec());
        self
    }

    /// Derive the topology and produce the finished [`Structure`].
    pub fn finish(mut self) -> Structure {
        self.residue_atom_offsets.push(self.atom_names.len() as u32);

        let model_of_atom: Vec<u32> = self
            .residue_of_atom
            .iter()
            .map(|&r| self.model_of_chain[self.chain_of_residue[r as usize] as usize])
            .collect();
        let bonds = perceive_bonds(
            &self.positions,
            &self.elements,
            &self.alt_locs,
            &model_of_atom,
            &self.explicit_bonds,
        );

        let atom_count = self.atom_names.len();
        let mut structure = Structure {
            atom_names: self.atom_names,
            elements: self.elements,
            positions: self.positions,
            serial_numbers: self.serial_numbers,
            alt_locs: self.alt_locs,
            formal_charges: self.formal_charges,
            implicit_h: vec![0; atom_count],
            total_h: vec![0; atom_count],
            geometry: vec![AtomGeometry::Unknown; atom_count],
            atom_aromatic: vec![false; atom_count],
            residue_of_atom: self.residue_of_atom,
            residue_names: self.residue_names,
            residue_numbers: self.residue_numbers,
            insertion_codes: self.insertion_codes,
            chain_of_residue: self.chain_of_residue,
            residue_atom_offsets: self.residue_atom_offsets,
            chain_names: self.chain_names,
            model_of_chain: self.model_of_chain,
            model_serials: self.model_serials,
            bonds,
            aromatic_rings: Vec::new(),
        };

        let rings = perceive_rings(&structure, &self.explicit_rings);
        for ring in &rings {
            for &atom in ring {
                structure.atom_aromatic[atom as usize] = true;
            }
        }
        structure.aromatic_rings = rings;

        valence::assign_valences(&mut structure);
        structure
    }
}

/// Perceive covalent bonds from interatomic distances against the sum of
/// covalent radii. Metals never bond covalently here; their contacts are
/// handled as coordination. Atoms in different models or with conflicting
/// alternate locations are never bonded.
fn perceive_bonds(
    positions: &[na::Point3<f64>],
    elements: &[Element],
    alt_locs: &[String],
    model_of_atom: &[u32],
    explicit: &[(u32, u32)],
) -> AdjacencyList {
    let atom_count = positions.len() as u32;
    let mut pairs: Vec<(u32, u32)> = explicit
        .iter()
        .filter(|&&(a, b)| {
            if a >= atom_count || b >= atom_count {
                warn!("Ignoring declared bond with out-of-range atom indices");
                return false;
            }
            a != b
        })
        .map(|&(a, b)| if a <= b { (a, b) } else { (b, a) })
        .collect();

    let hash = SpatialHash::new(positions);
    let mut candidates: Vec<(u32, f64)> = Vec::new();
    for i in 0..positions.len() as u32 {
        let element1 = elements[i as usize];
        if element::is_metal(element1) {
            continue;
        }
        candidates.clear();
        hash.each_within(&positions[i as usize], BOND_QUERY_RADIUS, |j, dist_sq| {
            if j > i {
                candidates.push((j, dist_sq));
            }
        });
        for &(j, dist_sq) in &candidates {
            let element2 = elements[j as usize];
            if element::is_metal(element2) {
                continue;
            }
            if element1 == Element::H && element2 == Element::H {
                continue;
            }
            if model_of_atom[i as usize] != model_of_atom[j as usize] {
                continue;
            }
            let alt1 = &alt_locs[i as usize];
            let alt2 = &alt_locs[j as usize];
            if !alt1.is_empty() && !alt2.is_empty() && alt1 != alt2 {
                continue;
            }
            let max_dist =
                element::covalent_radius(element1) + element::covalent_radius(element2) + BOND_TOLERANCE;
            if dist_sq > max_dist * max_dist || dist_sq < MIN_BOND_DIST * MIN_BOND_DIST {
                continue;
            }
            pairs.push((i, j));
        }
    }

    pairs.sort_unstable();
    pairs.dedup();
    let node1: Vec<u32> = pairs.iter().map(|p| p.0).collect();
    let node2: Vec<u32> = pairs.iter().map(|p| p.1).collect();
    create_adjacency_list(&EdgeList {
        node1: &node1,
        node2: &node2,
        edge_count: pairs.len(),
        node_count: positions.len(),
    })
}

/// Aromatic ring atom names for standard residues.
fn template_ring_names(resn: &str) -> &'static [&'static [&'static str]] {
    match resn {
        "HIS" => &[&["CG", "ND1", "CE1", "NE2", "CD2"]],
        "PHE" | "TYR" => &[&["CG", "CD1", "CE1", "CZ", "CE2", "CD2"]],
        "TRP" => &[
            &["CG", "CD1", "NE1", "CE2", "CD2"],
            &["CD2", "CE2", "CZ2", "CH2", "CZ3", "CE3"],
        ],
        "A" | "DA" | "G" | "DG" | "I" | "DI" => &[
            &["N1", "C2", "N3", "C4", "C5", "C6"],
            &["C4", "C5", "N7", "C8", "N9"],
        ],
        "C" | "DC" | "U" | "DU" | "T" | "DT" => &[&["N1", "C2", "N3", "C4", "C5", "C6"]],
        _ => &[],
    }
}

/// Collect aromatic rings: declared ones first, then residue templates,
/// then a bounded cycle search through hetero residues.
fn perceive_rings(structure: &Structure, explicit: &[Vec<u32>]) -> Vec<Vec<u32>> {
    let mut rings: Vec<Vec<u32>> = Vec::new();
    let mut seen: HashSet<Vec<u32>> = HashSet::new();

    for ring in explicit {
        if ring.len() < 3 {
            warn!("Ignoring declared aromatic ring with fewer than three atoms");
            continue;
        }
        if ring
            .iter()
            .any(|&atom| atom as usize >= structure.atom_count())
        {
            warn!("Ignoring declared aromatic ring with out-of-range atom indices");
            continue;
        }
        let mut key = ring.clone();
        key.sort_unstable();
        if seen.insert(key) {
            rings.push(ring.clone());
        }
    }

    for index in 0..structure.residue_count() as u32 {
        let residue = structure.residue(index);
        let resn = residue.name();
        for template in template_ring_names(resn) {
            let mut atoms = Vec::with_capacity(template.len());
            for name in *template {
                if let Some(atom) = residue.find_atom(name) {
                    atoms.push(atom.index());
                }
            }
            if atoms.len() == template.len() {
                let mut key = atoms.clone();
                key.sort_unstable();
                if seen.insert(key) {
                    rings.push(atoms);
                }
            } else if !atoms.is_empty() {
                warn!(
                    "Incomplete aromatic ring in residue {} {}{}",
                    resn,
                    residue.number(),
                    residue.insertion_code()
                );
            }
        }
        if residue.is_hetero() {
            find_rings_in_residue(structure, &residue, &mut seen, &mut rings);
        }
    }
    rings
}

/// Search a hetero residue for planar 5- and 6-cycles of C/N/O/S atoms.
fn find_rings_in_residue(
    structure: &Structure,
    residue: &ResidueView,
    seen: &mut HashSet<Vec<u32>>,
    rings: &mut Vec<Vec<u32>>,
) {
    let eligible: HashSet<u32> = residue
        .atom_indices()
        .filter(|&i| {
            matches!(
                structure.elements[i as usize],
                Element::C | Element::N | Element::O | Element::S
            ) && heavy_degree(structure, i) <= 3
        })
        .collect();
    if eligible.len() < 5 {
        return;
    }

    let mut start_atoms: Vec<u32> = eligible.iter().copied().collect();
    start_atoms.sort_unstable();
    for &start in &start_atoms {
        let mut path = vec![start];
        extend_ring_path(structure, &eligible, start, &mut path, seen, rings);
    }
}

fn extend_ring_path(
    structure: &Structure,
    eligible: &HashSet<u32>,
    start: u32,
    path: &mut Vec<u32>,
    seen: &mut HashSet<Vec<u32>>,
    rings: &mut Vec<Vec<u32>>,
) {
    let Some(&last) = path.last() else {
        return;
    };
    for &next in structure.bonds.neighbors(last) {
        if next == start && (path.len() == 5 || path.len() == 6) {
            push_planar_ring(structure, path, seen, rings);
        } else if next > start
            && path.len() < 6
            && eligible.contains(&next)
            && !path.contains(&next)
        {
            path.push(next);
            extend_ring_path(structure, eligible, start, path, seen, rings);
            path.pop();
        }
    }
}

fn push_planar_ring(
    structure: &Structure,
    path: &[u32],
    seen: &mut HashSet<Vec<u32>>,
    rings: &mut Vec<Vec<u32>>,
) {
    let points: Vec<na::Point3<f64>> = path
        .iter()
        .map(|&atom| structure.positions[atom as usize])
        .collect();
    let Some(plane) = Plane::from_points(&points) else {
        return;
    };
    if points
        .iter()
        .any(|p| plane.point_plane_dist(p) > RING_PLANARITY_TOLERANCE)
    {
        return;
    }
    let mut key = path.to_vec();
    key.sort_unstable();
    if seen.insert(key) {
        rings.push(path.to_vec());
    }
}

fn heavy_degree(structure: &Structure, atom: u32) -> usize {
    structure
        .bonds
        .neighbors(atom)
        .iter()
        .filter(|&&j| structure.elements[j as usize] != Element::H)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One ASP residue with idealized coordinates, all bond lengths within
    /// covalent range and every non-bonded pair outside it.
    fn asp_fragment(builder: &mut StructureBuilder) -> Vec<u32> {
        builder
            .start_model(1)
            .start_chain("A")
            .start_residue("ASP", 1, "");
        vec![
            builder.add_atom("N", Element::N, (-2.4, 1.62, 0.0)),
            builder.add_atom("CA", Element::C, (-1.46, 0.55, 0.0)),
            builder.add_atom("C", Element::C, (-2.2, -0.71, 0.0)),
            builder.add_atom("O", Element::O, (-3.4, -0.75, 0.0)),
            builder.add_atom("CB", Element::C, (0.0, 0.0, 0.0)),
            builder.add_atom("CG", Element::C, (1.52, 0.0, 0.0)),
            builder.add_atom("OD1", Element::O, (2.116, 1.098, 0.0)),
            builder.add_atom("OD2", Element::O, (2.116, -1.098, 0.0)),
        ]
    }

    fn hexagon(radius: f64, z: f64) -> Vec<(f64, f64, f64)> {
        (0..6)
            .map(|k| {
                let angle = std::f64::consts::PI / 3.0 * k as f64;
                (radius * angle.cos(), radius * angle.sin(), z)
            })
            .collect()
    }

    #[test]
    fn test_builder_hierarchy() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("GLY", 1, "");
        builder.add_atom("N", Element::N, (0.0, 0.0, 0.0));
        builder.add_atom("CA", Element::C, (1.47, 0.0, 0.0));
        builder.start_chain("B").start_residue("HOH", 101, "");
        builder.add_atom("O", Element::O, (20.0, 0.0, 0.0));
        let structure = builder.finish();

        assert_eq!(structure.atom_count(), 3);
        assert_eq!(structure.residue_count(), 2);
        assert_eq!(structure.chain_count(), 2);
        assert_eq!(structure.model_count(), 1);

        let ca = structure.atom(1);
        assert_eq!(ca.name(), "CA");
        assert_eq!(ca.serial_number(), 2);
        assert_eq!(ca.residue().name(), "GLY");
        assert_eq!(ca.residue().chain_name(), "A");
        assert_eq!(ca.model_index(), 0);

        let water = structure.residue(1);
        assert_eq!(water.number(), 101);
        assert!(water.is_water());
        assert!(!water.is_hetero());
        assert_eq!(water.atom_count(), 1);
        assert_eq!(water.chain_name(), "B");
    }

    #[test]
    fn test_bond_perception() {
        let mut builder = StructureBuilder::new();
        let atoms = asp_fragment(&mut builder);
        let structure = builder.finish();

        let [n, ca, c, o, cb, cg, od1, od2] = atoms[..] else {
            panic!("unexpected atom count")
        };
        assert_eq!(structure.bonds().degree(n), 1);
        assert_eq!(structure.bonds().degree(ca), 3);
        assert_eq!(structure.bonds().degree(c), 2);
        assert_eq!(structure.bonds().degree(o), 1);
        assert_eq!(structure.bonds().degree(cb), 2);
        assert_eq!(structure.bonds().degree(cg), 3);
        assert_eq!(structure.bonds().degree(od1), 1);
        assert_eq!(structure.bonds().degree(od2), 1);
        assert!(structure.atom(ca).is_bonded_to(n));
        assert!(structure.atom(cg).is_bonded_to(od1));
        assert!(structure.atom(cg).is_bonded_to(od2));
        assert!(!structure.atom(od1).is_bonded_to(od2));
    }

    #[test]
    fn test_no_bonds_to_metals() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("HOH", 1, "");
        let o = builder.add_atom("O", Element::O, (0.0, 0.0, 0.0));
        builder.start_residue("NA", 2, "");
        let na = builder.add_atom("NA", Element::Na, (2.3, 0.0, 0.0));
        let structure = builder.finish();

        assert_eq!(structure.bonds().degree(na), 0);
        assert_eq!(structure.bonds().degree(o), 0);
        assert_eq!(structure.atom(na).formal_charge(), 1);
        assert_eq!(structure.atom(na).geometry(), AtomGeometry::Spherical);
    }

    #[test]
    fn test_no_bonds_across_models() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("HOH", 1, "");
        builder.add_atom("O", Element::O, (0.0, 0.0, 0.0));
        builder.start_model(2).start_chain("A").start_residue("HOH", 1, "");
        builder.add_atom("O", Element::O, (1.4, 0.0, 0.0));
        let structure = builder.finish();

        assert_eq!(structure.bonds().degree(0), 0);
        assert_eq!(structure.bonds().degree(1), 0);
        assert_eq!(structure.atom(1).model_index(), 1);
    }

    #[test]
    fn test_no_bonds_between_alternate_conformations() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("LIG", 1, "");
        builder.add_atom_with(&AtomRecord {
            name: "C1",
            element: Element::C,
            position: (0.0, 0.0, 0.0),
            serial_number: 1,
            alt_loc: "A",
            formal_charge: 0,
        });
        builder.add_atom_with(&AtomRecord {
            name: "C1",
            element: Element::C,
            position: (1.5, 0.0, 0.0),
            serial_number: 2,
            alt_loc: "B",
            formal_charge: 0,
        });
        builder.add_atom_with(&AtomRecord {
            name: "C2",
            element: Element::C,
            position: (-1.5, 0.0, 0.0),
            serial_number: 3,
            alt_loc: "",
            formal_charge: 0,
        });
        let structure = builder.finish();

        // A-B conflict, but the blank alt loc bonds to conformer A
        assert!(!structure.atom(0).is_bonded_to(1));
        assert!(structure.atom(0).is_bonded_to(2));
    }

    #[test]
    fn test_template_ring_histidine() {
        let r = 1.166;
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("HIS", 42, "");
        let ring_names = ["CG", "ND1", "CE1", "NE2", "CD2"];
        for (k, name) in ring_names.iter().enumerate() {
            let angle = 2.0 * std::f64::consts::PI / 5.0 * k as f64;
            let element = if name.starts_with('N') {
                Element::N
            } else {
                Element::C
            };
            builder.add_atom(name, element, (r * angle.cos(), r * angle.sin(), 0.0));
        }
        let cb = builder.add_atom("CB", Element::C, (2.69, 0.0, 0.0));
        let structure = builder.finish();

        assert_eq!(structure.aromatic_rings().len(), 1);
        assert_eq!(structure.aromatic_rings()[0].len(), 5);
        assert!(structure.atom(0).is_aromatic());
        assert!(!structure.atom(cb).is_aromatic());
    }

    #[test]
    fn test_generic_ring_in_hetero_residue() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("BNZ", 1, "");
        for (k, pos) in hexagon(1.39, 0.0).into_iter().enumerate() {
            builder.add_atom(&format!("C{}", k + 1), Element::C, pos);
        }
        let structure = builder.finish();

        assert_eq!(structure.aromatic_rings().len(), 1);
        assert_eq!(structure.aromatic_rings()[0].len(), 6);
        assert!(structure.atoms().all(|a| a.is_aromatic()));
    }

    #[test]
    fn test_puckered_ring_rejected() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("CHX", 1, "");
        for (k, (x, y, _)) in hexagon(1.39, 0.0).into_iter().enumerate() {
            let z = if k % 2 == 0 { 0.25 } else { -0.25 };
            builder.add_atom(&format!("C{}", k + 1), Element::C, (x, y, z));
        }
        let structure = builder.finish();

        // All six bonds perceived, but the ring is not planar
        assert!(structure.atoms().all(|a| a.bonded_atoms().len() == 2));
        assert!(structure.aromatic_rings().is_empty());
    }

    #[test]
    fn test_pyridine_nitrogen() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("PYD", 1, "");
        for (k, pos) in hexagon(1.39, 0.0).into_iter().enumerate() {
            if k == 0 {
                builder.add_atom("N1", Element::N, pos);
            } else {
                builder.add_atom(&format!("C{k}"), Element::C, pos);
            }
        }
        let structure = builder.finish();

        assert_eq!(structure.aromatic_rings().len(), 1);
        let n1 = structure.atom(0);
        assert!(n1.is_aromatic());
        assert_eq!(n1.total_h_count(), 0);
        assert_eq!(n1.formal_charge(), 0);
        assert_eq!(n1.geometry(), AtomGeometry::Trigonal);
        // Ring carbons each carry one aromatic hydrogen
        assert_eq!(structure.atom(1).total_h_count(), 1);
    }

    #[test]
    fn test_valences_in_aspartate() {
        let mut builder = StructureBuilder::new();
        let atoms = asp_fragment(&mut builder);
        let structure = builder.finish();

        let [n, ca, _c, o, cb, cg, od1, od2] = atoms[..] else {
            panic!("unexpected atom count")
        };
        // Amide nitrogen keeps one proton, the carbonyl oxygen none
        assert_eq!(structure.atom(n).total_h_count(), 1);
        assert_eq!(structure.atom(o).total_h_count(), 0);
        // Carboxylate charge sits on OD2 by convention
        assert_eq!(structure.atom(od1).formal_charge(), 0);
        assert_eq!(structure.atom(od2).formal_charge(), -1);
        assert_eq!(structure.atom(od1).total_h_count(), 0);
        assert_eq!(structure.atom(od2).total_h_count(), 0);
        // Aliphatic hydrogens from electron counting
        assert_eq!(structure.atom(ca).total_h_count(), 1);
        assert_eq!(structure.atom(cb).total_h_count(), 2);
        // The carboxylate carbon is sp2 and carries none
        assert_eq!(structure.atom(cg).total_h_count(), 0);
        assert_eq!(structure.atom(cg).geometry(), AtomGeometry::Trigonal);
    }

    #[test]
    fn test_valences_in_ligand_carboxylate() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("LIG", 1, "");
        let c1 = builder.add_atom("C1", Element::C, (0.0, 0.0, 0.0));
        let c2 = builder.add_atom("C2", Element::C, (1.52, 0.0, 0.0));
        let o1 = builder.add_atom("O1", Element::O, (2.116, 1.098, 0.0));
        let o2 = builder.add_atom("O2", Element::O, (2.116, -1.098, 0.0));
        let structure = builder.finish();

        // The lowest-index terminal oxygen keeps its proton
        assert_eq!(structure.atom(o1).formal_charge(), 0);
        assert_eq!(structure.atom(o1).total_h_count(), 1);
        assert_eq!(structure.atom(o2).formal_charge(), -1);
        assert_eq!(structure.atom(o2).total_h_count(), 0);
        assert_eq!(structure.atom(c2).total_h_count(), 0);
        assert_eq!(structure.atom(c1).total_h_count(), 3);
        assert_eq!(structure.atom(c1).geometry(), AtomGeometry::Tetrahedral);
        assert!(!structure.atom(c1).is_bonded_to(o1));
        assert!(structure.atom(c2).is_bonded_to(o1));
    }

    #[test]
    fn test_water_valence() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("W").start_residue("HOH", 1, "");
        builder.add_atom("O", Element::O, (0.0, 0.0, 0.0));
        let structure = builder.finish();

        let o = structure.atom(0);
        assert_eq!(o.formal_charge(), 0);
        assert_eq!(o.total_h_count(), 2);
        assert_eq!(o.geometry(), AtomGeometry::Tetrahedral);
    }

    #[test]
    fn test_backbone_classification() {
        let mut builder = StructureBuilder::new();
        let atoms = asp_fragment(&mut builder);
        let structure = builder.finish();

        let [n, ca, c, o, cb, cg, od1, _od2] = atoms[..] else {
            panic!("unexpected atom count")
        };
        for atom in [n, ca, c, o] {
            assert!(structure.atom(atom).is_backbone());
            assert!(!structure.atom(atom).is_sidechain());
        }
        for atom in [cb, cg, od1] {
            assert!(!structure.atom(atom).is_backbone());
            assert!(structure.atom(atom).is_sidechain());
        }
    }

    #[test]
    fn test_explicit_bonds_and_rings() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1).start_chain("A").start_residue("XYZ", 1, "");
        let a = builder.add_atom("C1", Element::C, (0.0, 0.0, 0.0));
        let b = builder.add_atom("C2", Element::C, (4.0, 0.0, 0.0));
        let c = builder.add_atom("C3", Element::C, (0.0, 4.0, 0.0));
        builder.add_bond(a, b);
        builder.add_aromatic_ring(&[a, b, c]);
        builder.add_aromatic_ring(&[a, 99]);
        let structure = builder.finish();

        assert!(structure.atom(a).is_bonded_to(b));
        assert!(!structure.atom(a).is_bonded_to(c));
        assert_eq!(structure.aromatic_rings().len(), 1);
        assert!(structure.atom(c).is_aromatic());
    }
}
