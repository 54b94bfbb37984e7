use std::fmt;

use nalgebra as na;
use tracing::warn;

use crate::structure::{AtomView, Structure};

use super::charged::{add_aromatic_rings, add_negative_charges, add_positive_charges};
use super::halogen_bonds::{add_halogen_acceptors, add_halogen_donors};
use super::hydrogen_bonds::{
    add_hydrogen_acceptors, add_hydrogen_donors, add_weak_hydrogen_donors,
};
use super::hydrophobic::add_hydrophobic;
use super::metal_binding::{add_metal_binding, add_metals};

/// Chemical role a feature can play in a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    PositiveCharge,
    NegativeCharge,
    AromaticRing,
    HydrogenDonor,
    HydrogenAcceptor,
    HalogenDonor,
    HalogenAcceptor,
    Hydrophobic,
    WeakHydrogenDonor,
    IonicTypePartner,
    DativeBondPartner,
    TransitionMetal,
    IonicTypeMetal,
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Finer chemical classification of a charged feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureGroup {
    Unknown,
    QuaternaryAmine,
    TertiaryAmine,
    Sulfonium,
    SulfonicAcid,
    Sulfate,
    Phosphate,
    Halocarbon,
    Guanidine,
    Acetamidine,
    Carboxylate,
}

impl FeatureGroup {
    /// Rank used to break ties between competing salt-bridge partners.
    /// Delocalized groups outrank localized single-atom charges.
    pub fn priority(self) -> u8 {
        match self {
            FeatureGroup::Guanidine => 7,
            FeatureGroup::Carboxylate => 6,
            FeatureGroup::QuaternaryAmine => 5,
            FeatureGroup::Phosphate => 4,
            FeatureGroup::Sulfate => 3,
            FeatureGroup::SulfonicAcid => 2,
            FeatureGroup::Acetamidine | FeatureGroup::TertiaryAmine | FeatureGroup::Sulfonium => 1,
            FeatureGroup::Halocarbon | FeatureGroup::Unknown => 0,
        }
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Accumulator for one feature while its member atoms are collected.
#[derive(Debug, Clone)]
pub(crate) struct FeatureState {
    pub feature_type: FeatureType,
    pub group: FeatureGroup,
    x: f64,
    y: f64,
    z: f64,
    atom_set: Vec<u32>,
}

impl FeatureState {
    pub fn new(feature_type: FeatureType) -> Self {
        Self::with_group(feature_type, FeatureGroup::Unknown)
    }

    pub fn with_group(feature_type: FeatureType, group: FeatureGroup) -> Self {
        Self {
            feature_type,
            group,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            atom_set: Vec::new(),
        }
    }

    pub fn add_atom(&mut self, atom: AtomView<'_>) {
        let pos = atom.position();
        self.x += pos.x;
        self.y += pos.y;
        self.z += pos.z;
        self.atom_set.push(atom.index());
    }
}

/// Chemical features of a structure, stored column-wise. The center of a
/// feature is the mean position of its member atoms and the first member
/// atom acts as its key atom in reported contacts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    types: Vec<FeatureType>,
    groups: Vec<FeatureGroup>,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    atom_sets: Vec<Vec<u32>>,
}

impl Features {
    /// Number of features.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// `true` if no features were detected.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The type of the feature at `index`.
    pub fn feature_type(&self, index: usize) -> FeatureType {
        self.types[index]
    }

    /// The chemical group of the feature at `index`.
    pub fn group(&self, index: usize) -> FeatureGroup {
        self.groups[index]
    }

    /// Mean position of the member atoms of the feature at `index`.
    pub fn center(&self, index: usize) -> na::Point3<f64> {
        na::Point3::new(self.x[index], self.y[index], self.z[index])
    }

    /// Atom indices participating in the feature at `index`.
    pub fn atom_set(&self, index: usize) -> &[u32] {
        &self.atom_sets[index]
    }

    /// The atom representing the feature at `index` in contact records.
    pub fn key_atom(&self, index: usize) -> u32 {
        self.atom_sets[index][0]
    }

    pub(crate) fn centers(&self) -> Vec<na::Point3<f64>> {
        (0..self.len()).map(|i| self.center(i)).collect()
    }

    pub(crate) fn add(&mut self, state: FeatureState) {
        let n = state.atom_set.len();
        if n == 0 {
            warn!("Skipping {} feature without atoms", state.feature_type);
            return;
        }
        let n = n as f64;
        self.types.push(state.feature_type);
        self.groups.push(state.group);
        self.x.push(state.x / n);
        self.y.push(state.y / n);
        self.z.push(state.z / n);
        self.atom_sets.push(state.atom_set);
    }
}

/// Detect all chemical features of `structure`.
pub fn calculate_features(structure: &Structure) -> Features {
    let mut features = Features::default();

    add_positive_charges(structure, &mut features);
    add_negative_charges(structure, &mut features);
    add_aromatic_rings(structure, &mut features);

    add_hydrogen_acceptors(structure, &mut features);
    add_hydrogen_donors(structure, &mut features);
    add_weak_hydrogen_donors(structure, &mut features);

    add_metal_binding(structure, &mut features);
    add_metals(structure, &mut features);

    add_hydrophobic(structure, &mut features);

    add_halogen_acceptors(structure, &mut features);
    add_halogen_donors(structure, &mut features);

    features
}
