//! Halogen bond donors (the sigma hole of carbon bound halogens),
//! acceptors and the directional classifier between them.

use pdbtbx::Element;

use crate::structure::{is_halogen_bond_donor, Structure};

use super::contacts::{ContactParams, ContactType, Contacts};
use super::features::{FeatureGroup, FeatureState, FeatureType, Features};
use super::functional_groups::is_halocarbon;
use super::geometry::calc_angles;

// Sigma hole geometry after Auffinger et al., PNAS 101 (2004)
const OPTIMAL_HALOGEN_ANGLE: f64 = 180.0;
const OPTIMAL_ACCEPTOR_ANGLE: f64 = 120.0;

/// Chlorine and heavier halogens bound to exactly one carbon develop a
/// sigma hole; fluorine never does.
pub(crate) fn add_halogen_donors(structure: &Structure, features: &mut Features) {
    for atom in structure.atoms() {
        if is_halocarbon(atom) && is_halogen_bond_donor(atom.element()) {
            let mut state =
                FeatureState::with_group(FeatureType::HalogenDonor, FeatureGroup::Halocarbon);
            state.add_atom(atom);
            features.add(state);
        }
    }
}

/// Nitrogen, oxygen or sulfur attached to carbon, nitrogen, phosphorus or
/// sulfur can accept into the sigma hole.
pub(crate) fn add_halogen_acceptors(structure: &Structure, features: &mut Features) {
    for atom in structure.atoms() {
        if !matches!(atom.element(), Element::N | Element::O | Element::S) {
            continue;
        }
        let attached = atom.bonded().any(|neighbor| {
            matches!(
                neighbor.element(),
                Element::C | Element::N | Element::P | Element::S
            )
        });
        if attached {
            let mut state = FeatureState::new(FeatureType::HalogenAcceptor);
            state.add_atom(atom);
            features.add(state);
        }
    }
}

fn is_halogen_bond_pair(t1: FeatureType, t2: FeatureType) -> bool {
    matches!(
        (t1, t2),
        (FeatureType::HalogenAcceptor, FeatureType::HalogenDonor)
            | (FeatureType::HalogenDonor, FeatureType::HalogenAcceptor)
    )
}

/// Classify halogen bonds. The halogen must approach head-on along its
/// carbon bond and the acceptor must keep all its bonds near the optimal
/// 120 degrees. Both angle tests are one sided, deviations past the
/// optimum are not penalized.
pub(crate) fn add_halogen_bonds(contacts: &mut Contacts<'_>, params: &ContactParams) {
    for i in 0..contacts.features.len() {
        for (j, _) in contacts.pairs_above(i, params.max_halogen_bond_dist) {
            let ti = contacts.features.feature_type(i);
            let tj = contacts.features.feature_type(j);
            if !is_halogen_bond_pair(ti, tj) {
                continue;
            }

            let (halogen_feature, acceptor_feature) = if ti == FeatureType::HalogenDonor {
                (i, j)
            } else {
                (j, i)
            };
            let halogen = contacts.key_atom_view(halogen_feature);
            let acceptor = contacts.key_atom_view(acceptor_feature);
            if contacts.invalid_atom_contact(halogen, acceptor) {
                continue;
            }

            let Some(halogen_angles) = calc_angles(halogen, acceptor) else {
                continue;
            };
            // singly bonded halogens only
            if halogen_angles.len() != 1 {
                continue;
            }
            if OPTIMAL_HALOGEN_ANGLE - halogen_angles[0] > params.max_halogen_bond_angle {
                continue;
            }

            let Some(acceptor_angles) = calc_angles(acceptor, halogen) else {
                continue;
            };
            // an acceptor without bonded partners, e.g. water, is excluded
            if acceptor_angles.is_empty() {
                continue;
            }
            if acceptor_angles
                .iter()
                .any(|angle| OPTIMAL_ACCEPTOR_ANGLE - angle > params.max_halogen_bond_angle)
            {
                continue;
            }

            contacts.add_contact(i, j, ContactType::HalogenBond);
        }
    }
}
