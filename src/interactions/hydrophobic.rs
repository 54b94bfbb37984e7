//! Hydrophobic atoms and the distance based contacts between them.

use pdbtbx::Element;

use crate::structure::Structure;

use super::contacts::{ContactParams, ContactType, Contacts};
use super::features::{FeatureState, FeatureType, Features};

/// Hydrophobic atoms are carbons bonded to nothing but carbon and
/// hydrogen, and any fluorine.
pub(crate) fn add_hydrophobic(structure: &Structure, features: &mut Features) {
    for atom in structure.atoms() {
        let hydrophobic = match atom.element() {
            Element::C => atom
                .bonded()
                .all(|neighbor| matches!(neighbor.element(), Element::C | Element::H)),
            Element::F => true,
            _ => false,
        };
        if hydrophobic {
            let mut state = FeatureState::new(FeatureType::Hydrophobic);
            state.add_atom(atom);
            features.add(state);
        }
    }
}

pub(crate) fn add_hydrophobic_contacts(contacts: &mut Contacts<'_>, params: &ContactParams) {
    for i in 0..contacts.features.len() {
        for (j, _) in contacts.pairs_above(i, params.max_hydrophobic_dist) {
            if contacts.features.feature_type(i) != FeatureType::Hydrophobic
                || contacts.features.feature_type(j) != FeatureType::Hydrophobic
            {
                continue;
            }
            let atom1 = contacts.key_atom_view(i);
            let atom2 = contacts.key_atom_view(j);
            if contacts.invalid_atom_contact(atom1, atom2) {
                continue;
            }
            // no fluorine-fluorine contacts
            if atom1.element() == Element::F && atom2.element() == Element::F {
                continue;
            }
            contacts.add_contact(i, j, ContactType::Hydrophobic);
        }
    }
}
