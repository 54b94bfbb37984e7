//! The contact detection pipeline: feature extraction, pairwise
//! classification across a spatial index and refinement of the result.

use std::collections::HashSet;
use std::fmt;

use nalgebra as na;
use thiserror::Error;
use tracing::debug;

use crate::geometry::{create_adjacency_list, AdjacencyList, BitArray, EdgeList, SpatialHash};
use crate::structure::{AtomView, Structure};

use super::charged::add_charged_contacts;
use super::contact_store::ContactStore;
use super::features::{calculate_features, Features};
use super::halogen_bonds::add_halogen_bonds;
use super::hydrogen_bonds::add_hydrogen_bonds;
use super::hydrophobic::add_hydrophobic_contacts;
use super::metal_binding::add_metal_contacts;
use super::refine::{
    refine_hydrophobic_contacts, refine_line_of_sight, refine_pi_stacking, refine_salt_bridges,
};

/// Category of a detected non-covalent interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactType {
    /// Placeholder for contacts of no recognized category.
    Unknown,
    /// Salt bridge between opposite formal charges.
    IonicInteraction,
    /// Positive charge over an aromatic ring face.
    CationPi,
    /// Two stacked aromatic rings, parallel or T-shaped.
    PiStacking,
    /// Classic donor-acceptor hydrogen bond.
    HydrogenBond,
    /// Halogen sigma-hole bond to an electron donor.
    HalogenBond,
    /// Apolar carbon-carbon or carbon-fluorine packing.
    Hydrophobic,
    /// Coordination of a partner atom to a metal center.
    MetalCoordination,
    /// Hydrogen bond donated by a polarized carbon.
    WeakHydrogenBond,
    /// Hydrogen bond with a water on either end.
    WaterHydrogenBond,
    /// Hydrogen bond between two backbone atoms.
    BackboneHydrogenBond,
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Errors of the contact detection API.
#[derive(Debug, Error)]
pub enum ContactError {
    /// A threshold is negative or not a number.
    #[error("invalid contact parameter {name}: {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Thresholds and switches for contact detection. Distances are in
/// angstroms, angles in degrees.
#[derive(Debug, Clone)]
pub struct ContactParams {
    /// Maximum distance between hydrophobic atoms.
    pub max_hydrophobic_dist: f64,
    /// Maximum donor-acceptor distance of a hydrogen bond.
    pub max_hbond_dist: f64,
    /// Maximum donor-acceptor distance when either atom is sulfur.
    pub max_hbond_sulfur_dist: f64,
    /// Allowed deviation from the ideal angle at the acceptor.
    pub max_hbond_acc_angle: f64,
    /// Allowed deviation from the ideal angle at the donor.
    pub max_hbond_don_angle: f64,
    /// Allowed out-of-plane angle at a trigonal acceptor.
    pub max_hbond_acc_plane_angle: f64,
    /// Allowed out-of-plane angle at a trigonal donor.
    pub max_hbond_don_plane_angle: f64,
    /// Maximum distance between stacked ring centers.
    pub max_pi_stacking_dist: f64,
    /// Maximum in-plane offset of stacked ring centers.
    pub max_pi_stacking_offset: f64,
    /// Allowed deviation from parallel or perpendicular ring normals.
    pub max_pi_stacking_angle: f64,
    /// Maximum distance between a cation and a ring center.
    pub max_cation_pi_dist: f64,
    /// Maximum in-plane offset of a cation over a ring.
    pub max_cation_pi_offset: f64,
    /// Maximum distance between opposite charge centers.
    pub max_ionic_dist: f64,
    /// Maximum halogen-acceptor distance.
    pub max_halogen_bond_dist: f64,
    /// Allowed deviation from the ideal halogen bond angles.
    pub max_halogen_bond_angle: f64,
    /// Maximum metal-partner distance.
    pub max_metal_dist: f64,
    /// Keep only the best ionic partner per charged atom and drop
    /// hydrogen bonds that duplicate a salt bridge.
    pub refine_salt_bridges: bool,
    /// When set, only contacts with at least one atom in this model are
    /// kept and cross-model pairs are allowed.
    pub master_model_index: Option<u32>,
    /// Scale on van der Waals radii in the line-of-sight occlusion test.
    pub line_of_sight_dist_factor: f64,
}

impl Default for ContactParams {
    fn default() -> Self {
        Self {
            max_hydrophobic_dist: 4.5,
            max_hbond_dist: 3.5,
            max_hbond_sulfur_dist: 4.1,
            max_hbond_acc_angle: 45.0,
            max_hbond_don_angle: 45.0,
            max_hbond_acc_plane_angle: 90.0,
            max_hbond_don_plane_angle: 30.0,
            max_pi_stacking_dist: 5.5,
            max_pi_stacking_offset: 2.0,
            max_pi_stacking_angle: 30.0,
            max_cation_pi_dist: 6.0,
            max_cation_pi_offset: 2.0,
            max_ionic_dist: 5.0,
            max_halogen_bond_dist: 4.0,
            max_halogen_bond_angle: 30.0,
            max_metal_dist: 3.0,
            refine_salt_bridges: true,
            master_model_index: None,
            line_of_sight_dist_factor: 1.0,
        }
    }
}

impl ContactParams {
    /// Reject negative or non-finite thresholds.
    pub fn validate(&self) -> Result<(), ContactError> {
        let checks = [
            ("max_hydrophobic_dist", self.max_hydrophobic_dist),
            ("max_hbond_dist", self.max_hbond_dist),
            ("max_hbond_sulfur_dist", self.max_hbond_sulfur_dist),
            ("max_hbond_acc_angle", self.max_hbond_acc_angle),
            ("max_hbond_don_angle", self.max_hbond_don_angle),
            ("max_hbond_acc_plane_angle", self.max_hbond_acc_plane_angle),
            ("max_hbond_don_plane_angle", self.max_hbond_don_plane_angle),
            ("max_pi_stacking_dist", self.max_pi_stacking_dist),
            ("max_pi_stacking_offset", self.max_pi_stacking_offset),
            ("max_pi_stacking_angle", self.max_pi_stacking_angle),
            ("max_cation_pi_dist", self.max_cation_pi_dist),
            ("max_cation_pi_offset", self.max_cation_pi_offset),
            ("max_ionic_dist", self.max_ionic_dist),
            ("max_halogen_bond_dist", self.max_halogen_bond_dist),
            ("max_halogen_bond_angle", self.max_halogen_bond_angle),
            ("max_metal_dist", self.max_metal_dist),
            ("line_of_sight_dist_factor", self.line_of_sight_dist_factor),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(ContactError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Mutable working set shared by the classifiers while contacts
/// accumulate.
pub(crate) struct Contacts<'a> {
    pub structure: &'a Structure,
    pub features: Features,
    pub spatial_hash: SpatialHash,
    pub store: ContactStore,
    pub feature_set: BitArray,
    seen: HashSet<(u32, u32, ContactType)>,
    master_model_index: Option<u32>,
}

impl<'a> Contacts<'a> {
    pub fn new(
        structure: &'a Structure,
        features: Features,
        master_model_index: Option<u32>,
    ) -> Self {
        let spatial_hash = SpatialHash::new(&features.centers());
        let feature_set = BitArray::new(features.len());
        Self {
            structure,
            features,
            spatial_hash,
            store: ContactStore::new(),
            feature_set,
            seen: HashSet::new(),
            master_model_index,
        }
    }

    /// Record a contact between the key atoms of two features. Repeats of
    /// the same unordered atom pair and type are dropped.
    pub fn add_contact(&mut self, feature1: usize, feature2: usize, contact_type: ContactType) {
        let atom1 = self.features.key_atom(feature1);
        let atom2 = self.features.key_atom(feature2);
        if atom1 == atom2 {
            return;
        }
        let key = if atom1 < atom2 {
            (atom1, atom2, contact_type)
        } else {
            (atom2, atom1, contact_type)
        };
        if !self.seen.insert(key) {
            return;
        }
        self.store.add_contact(atom1, atom2, contact_type);
        self.feature_set.set(feature1);
        self.feature_set.set(feature2);
    }

    /// Shared exclusion rules. A pair is invalid when the atoms share a
    /// residue, sit on conflicting alternate locations, are covalently
    /// bonded, or fall outside the model selection: without a master
    /// model both atoms must share a model, with one set at least one
    /// atom must belong to it.
    pub fn invalid_atom_contact(&self, atom1: AtomView<'_>, atom2: AtomView<'_>) -> bool {
        match self.master_model_index {
            Some(master) => {
                if atom1.model_index() != master && atom2.model_index() != master {
                    return true;
                }
            }
            None => {
                if atom1.model_index() != atom2.model_index() {
                    return true;
                }
            }
        }
        atom1.residue().index() == atom2.residue().index()
            || (!atom1.alt_loc().is_empty()
                && !atom2.alt_loc().is_empty()
                && atom1.alt_loc() != atom2.alt_loc())
            || atom1.is_bonded_to(atom2.index())
    }

    /// Features within `radius` of `feature` with a larger index, with
    /// squared distances. Upper-triangle iteration keeps every pair
    /// considered once.
    pub fn pairs_above(&self, feature: usize, radius: f64) -> Vec<(usize, f64)> {
        let mut pairs = Vec::new();
        let center = self.features.center(feature);
        self.spatial_hash.each_within(&center, radius, |j, d_sq| {
            if j as usize > feature {
                pairs.push((j as usize, d_sq));
            }
        });
        pairs
    }

    pub fn atom(&self, index: u32) -> AtomView<'a> {
        self.structure.atom(index)
    }

    /// View of the key atom of a feature.
    pub fn key_atom_view(&self, feature: usize) -> AtomView<'a> {
        self.structure.atom(self.features.key_atom(feature))
    }
}

/// Completed analysis: features, the contact store and graph, and the
/// bitset of contacts that survived refinement.
#[derive(Debug, Clone)]
pub struct FrozenContacts {
    features: Features,
    spatial_hash: SpatialHash,
    store: ContactStore,
    feature_set: BitArray,
    contact_set: BitArray,
    adjacency: AdjacencyList,
}

impl FrozenContacts {
    /// All stored contacts, including ones deactivated by refinement.
    pub fn store(&self) -> &ContactStore {
        &self.store
    }

    /// The features the contacts were classified from.
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Spatial index over the feature centers.
    pub fn spatial_hash(&self) -> &SpatialHash {
        &self.spatial_hash
    }

    /// Flags of features participating in at least one stored contact.
    pub fn feature_set(&self) -> &BitArray {
        &self.feature_set
    }

    /// Flags of contacts that survived refinement.
    pub fn contact_set(&self) -> &BitArray {
        &self.contact_set
    }

    /// Contact graph over atoms; the neighbors of an atom are its contact
    /// partners across all stored contacts.
    pub fn adjacency(&self) -> &AdjacencyList {
        &self.adjacency
    }

    /// Number of contacts surviving refinement.
    pub fn active_count(&self) -> usize {
        self.contact_set.count_set()
    }

    /// Indices into the store of contacts surviving refinement.
    pub fn active_contacts(&self) -> impl Iterator<Item = usize> + '_ {
        self.contact_set.iter_set()
    }

    pub(crate) fn contact_set_mut(&mut self) -> &mut BitArray {
        &mut self.contact_set
    }
}

pub(crate) fn create_frozen_contacts(contacts: Contacts<'_>) -> FrozenContacts {
    let adjacency = create_adjacency_list(&EdgeList {
        node1: contacts.store.index1(),
        node2: contacts.store.index2(),
        edge_count: contacts.store.len(),
        node_count: contacts.structure.atom_count(),
    });
    let contact_set = BitArray::with_all_set(contacts.store.len());
    FrozenContacts {
        features: contacts.features,
        spatial_hash: contacts.spatial_hash,
        store: contacts.store,
        feature_set: contacts.feature_set,
        contact_set,
        adjacency,
    }
}

/// Detect all non-covalent contacts of `structure`.
pub fn calculate_contacts(
    structure: &Structure,
    params: &ContactParams,
) -> Result<FrozenContacts, ContactError> {
    params.validate()?;

    let features = calculate_features(structure);
    debug!("Classifying contacts over {} features", features.len());
    let mut contacts = Contacts::new(structure, features, params.master_model_index);

    add_charged_contacts(&mut contacts, params);
    add_hydrogen_bonds(&mut contacts, params);
    add_metal_contacts(&mut contacts, params);
    add_hydrophobic_contacts(&mut contacts, params);
    add_halogen_bonds(&mut contacts, params);

    let mut frozen = create_frozen_contacts(contacts);

    refine_line_of_sight(structure, &mut frozen, params);
    refine_hydrophobic_contacts(structure, &mut frozen);
    if params.refine_salt_bridges {
        refine_salt_bridges(structure, &mut frozen);
    }
    refine_pi_stacking(structure, &mut frozen);

    debug!(
        "{} of {} contacts active after refinement",
        frozen.active_count(),
        frozen.store().len()
    );
    Ok(frozen)
}

/// Category switches and display radius for [`get_contact_data`]. The
/// weak and water hydrogen bond variants are off by default.
#[derive(Debug, Clone)]
pub struct ContactDataParams {
    /// Include plain hydrogen bonds.
    pub hydrogen_bond: bool,
    /// Include carbon-donated hydrogen bonds.
    pub weak_hydrogen_bond: bool,
    /// Include hydrogen bonds involving water.
    pub water_hydrogen_bond: bool,
    /// Include backbone-backbone hydrogen bonds.
    pub backbone_hydrogen_bond: bool,
    /// Include hydrophobic contacts.
    pub hydrophobic: bool,
    /// Include halogen bonds.
    pub halogen_bond: bool,
    /// Include ionic interactions.
    pub ionic_interaction: bool,
    /// Include metal coordination.
    pub metal_coordination: bool,
    /// Include cation-pi interactions.
    pub cation_pi: bool,
    /// Include pi-stacking.
    pub pi_stacking: bool,
    /// Display radius attached to every selected contact.
    pub radius: f64,
}

impl Default for ContactDataParams {
    fn default() -> Self {
        Self {
            hydrogen_bond: true,
            weak_hydrogen_bond: false,
            water_hydrogen_bond: false,
            backbone_hydrogen_bond: false,
            hydrophobic: true,
            halogen_bond: true,
            ionic_interaction: true,
            metal_coordination: true,
            cation_pi: true,
            pi_stacking: true,
            radius: 1.0,
        }
    }
}

impl ContactDataParams {
    fn includes(&self, contact_type: ContactType) -> bool {
        match contact_type {
            ContactType::HydrogenBond => self.hydrogen_bond,
            ContactType::WeakHydrogenBond => self.weak_hydrogen_bond,
            ContactType::WaterHydrogenBond => self.water_hydrogen_bond,
            ContactType::BackboneHydrogenBond => self.backbone_hydrogen_bond,
            ContactType::Hydrophobic => self.hydrophobic,
            ContactType::HalogenBond => self.halogen_bond,
            ContactType::IonicInteraction => self.ionic_interaction,
            ContactType::MetalCoordination => self.metal_coordination,
            ContactType::CationPi => self.cation_pi,
            ContactType::PiStacking => self.pi_stacking,
            ContactType::Unknown => false,
        }
    }
}

/// Endpoint positions of selected active contacts, for downstream display
/// or labeling. Color and radius mapping beyond the constant radius is
/// left to the consumer.
#[derive(Debug, Clone, Default)]
pub struct ContactData {
    /// First endpoint of each selected contact.
    pub position1: Vec<na::Point3<f64>>,
    /// Second endpoint of each selected contact.
    pub position2: Vec<na::Point3<f64>>,
    /// Display radius per selected contact.
    pub radius: Vec<f64>,
    /// Index of each selected contact in the store.
    pub contact_indices: Vec<usize>,
}

/// Collect endpoint data of the active contacts selected by `params`.
pub fn get_contact_data(
    contacts: &FrozenContacts,
    structure: &Structure,
    params: &ContactDataParams,
) -> ContactData {
    let mut data = ContactData::default();
    for i in contacts.active_contacts() {
        let contact_type = contacts.store().contact_type(i);
        if !params.includes(contact_type) {
            continue;
        }
        let (atom1, atom2) = contacts.store().atom_indices(i);
        data.position1.push(structure.atom(atom1).position());
        data.position2.push(structure.atom(atom2).position());
        data.radius.push(params.radius);
        data.contact_indices.push(i);
    }
    data
}

/// One endpoint of a reported contact.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct InteractingAtom {
    /// Model serial number.
    pub model: usize,
    /// Chain identifier.
    pub chain: String,
    /// Residue name.
    pub resn: String,
    /// Residue sequence number.
    pub resi: isize,
    /// Insertion code, empty when absent.
    pub insertion: String,
    /// Alternate location, empty when absent.
    pub altloc: String,
    /// Atom name.
    pub atomn: String,
    /// Atom serial number.
    pub atomi: usize,
}

impl InteractingAtom {
    pub(crate) fn from_atom(atom: AtomView<'_>) -> Self {
        let residue = atom.residue();
        Self {
            model: residue.model_serial(),
            chain: residue.chain_name().to_string(),
            resn: residue.name().to_string(),
            resi: residue.number(),
            insertion: residue.insertion_code().to_string(),
            altloc: atom.alt_loc().to_string(),
            atomn: atom.name().to_string(),
            atomi: atom.serial_number(),
        }
    }
}

impl fmt::Display for InteractingAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Model {model}, Chain {chain}, Residue {resn} {resi}{insertion}{altloc}, Atom {atom_name} {atom_idx}",
            model = self.model,
            chain = self.chain,
            resn = self.resn,
            resi = self.resi,
            insertion = self.insertion,
            altloc = self.altloc,
            atom_name = self.atomn,
            atom_idx = self.atomi
        )
    }
}

/// A reported contact between two atoms.
#[derive(Debug, Clone)]
pub struct ContactEntry {
    /// Interaction category.
    pub contact: ContactType,
    /// Distance between the two atoms in angstroms.
    pub distance: f64,
    /// First endpoint.
    pub from: InteractingAtom,
    /// Second endpoint.
    pub to: InteractingAtom,
}

impl fmt::Display for ContactEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{from}] has {contact} with [{to}]",
            from = self.from,
            contact = self.contact,
            to = self.to
        )
    }
}

/// Flatten the active contacts into one report entry per contact.
pub fn contact_entries(structure: &Structure, contacts: &FrozenContacts) -> Vec<ContactEntry> {
    contacts
        .active_contacts()
        .map(|i| {
            let (atom1, atom2) = contacts.store().atom_indices(i);
            let from = structure.atom(atom1);
            let to = structure.atom(atom2);
            ContactEntry {
                contact: contacts.store().contact_type(i),
                distance: (to.position() - from.position()).norm(),
                from: InteractingAtom::from_atom(from),
                to: InteractingAtom::from_atom(to),
            }
        })
        .collect()
}
