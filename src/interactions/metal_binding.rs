//! Metal atoms, their coordination partners and the complexation
//! classifier.
//!
//! Transition metals form dative bonds with lone pair donors while the
//! alkali and alkaline earth metals bind their partners electrostatically,
//! so the two kinds of metal pair with separate partner features.

use pdbtbx::Element;

use crate::structure::{
    is_halogen, is_ionic_type_metal, is_transition_metal, AtomView, Structure,
};

use super::contacts::{ContactParams, ContactType, Contacts};
use super::features::{FeatureState, FeatureType, Features};

const OXYGEN_BINDING_RESIDUES: [&str; 7] = ["ASP", "GLU", "SER", "THR", "TYR", "ASN", "GLN"];
const DATIVE_BASE_NITROGENS: [&str; 3] = ["N3", "N4", "N7"];
const IONIC_BASE_OXYGENS: [&str; 3] = ["O2", "O4", "O6"];

/// Whether the atom can coordinate a metal, as (dative, ionic) roles.
fn partner_roles(atom: AtomView<'_>) -> (bool, bool) {
    let residue = atom.residue();
    if residue.is_amino_acid() {
        match atom.element() {
            Element::O => {
                let sidechain_oxygen = OXYGEN_BINDING_RESIDUES.contains(&residue.name())
                    && atom.is_sidechain();
                let binds = sidechain_oxygen || atom.is_backbone();
                (binds, binds)
            }
            Element::S if residue.name() == "CYS" => (true, true),
            Element::N => (residue.name() == "HIS" && atom.is_sidechain(), false),
            _ => (false, false),
        }
    } else if residue.is_nucleic() {
        if atom.element() == Element::O && atom.is_backbone() {
            (true, true)
        } else if DATIVE_BASE_NITROGENS.contains(&atom.name()) {
            (true, false)
        } else if IONIC_BASE_OXYGENS.contains(&atom.name()) {
            (true, true)
        } else {
            (false, false)
        }
    } else {
        // water and other hetero groups
        if is_halogen(atom.element()) || matches!(atom.element(), Element::O | Element::S) {
            (true, true)
        } else {
            (atom.element() == Element::N, false)
        }
    }
}

pub(crate) fn add_metal_binding(structure: &Structure, features: &mut Features) {
    for atom in structure.atoms() {
        let (dative, ionic) = partner_roles(atom);
        if dative {
            let mut state = FeatureState::new(FeatureType::DativeBondPartner);
            state.add_atom(atom);
            features.add(state);
        }
        if ionic {
            let mut state = FeatureState::new(FeatureType::IonicTypePartner);
            state.add_atom(atom);
            features.add(state);
        }
    }
}

pub(crate) fn add_metals(structure: &Structure, features: &mut Features) {
    for atom in structure.atoms() {
        let feature_type = if is_transition_metal(atom.element()) {
            FeatureType::TransitionMetal
        } else if is_ionic_type_metal(atom.element()) {
            FeatureType::IonicTypeMetal
        } else {
            continue;
        };
        let mut state = FeatureState::new(feature_type);
        state.add_atom(atom);
        features.add(state);
    }
}

fn is_metal_complex(t1: FeatureType, t2: FeatureType) -> bool {
    match t1 {
        FeatureType::TransitionMetal => matches!(
            t2,
            FeatureType::DativeBondPartner | FeatureType::TransitionMetal
        ),
        FeatureType::IonicTypeMetal => t2 == FeatureType::IonicTypePartner,
        _ => false,
    }
}

/// Classify metal coordination on distance alone; the geometry of the
/// coordination sphere is not checked.
pub(crate) fn add_metal_contacts(contacts: &mut Contacts<'_>, params: &ContactParams) {
    for i in 0..contacts.features.len() {
        for (j, _) in contacts.pairs_above(i, params.max_metal_dist) {
            let atom1 = contacts.key_atom_view(i);
            let atom2 = contacts.key_atom_view(j);
            if contacts.invalid_atom_contact(atom1, atom2) {
                continue;
            }
            let ti = contacts.features.feature_type(i);
            let tj = contacts.features.feature_type(j);
            if !is_metal_complex(ti, tj) && !is_metal_complex(tj, ti) {
                continue;
            }
            contacts.add_contact(i, j, ContactType::MetalCoordination);
        }
    }
}
