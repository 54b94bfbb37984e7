//! Charged groups, aromatic rings and the contacts between them: salt
//! bridges, pi-stacking and cation-pi interactions.

use std::collections::HashSet;

use nalgebra as na;
use pdbtbx::Element;
use tracing::warn;

use crate::geometry::Plane;
use crate::structure::{is_metal, Structure};

use super::contacts::{ContactParams, ContactType, Contacts};
use super::features::{FeatureGroup, FeatureState, FeatureType, Features};
use super::functional_groups::{
    is_acetamidine, is_carboxylate, is_guanidine, is_phosphate, is_quaternary_amine, is_sulfate,
    is_sulfonic_acid, is_sulfonium, is_tertiary_amine,
};

const POSITIVELY_CHARGED_RESIDUES: [&str; 3] = ["ARG", "HIS", "LYS"];
const NEGATIVELY_CHARGED_RESIDUES: [&str; 2] = ["GLU", "ASP"];

/// Positive charge features: one group feature per basic residue built
/// from its side chain nitrogens, recognized cationic groups of other
/// residues, and single atoms the valence model marks positive.
pub(crate) fn add_positive_charges(structure: &Structure, features: &mut Features) {
    let mut grouped: HashSet<u32> = HashSet::new();

    for residue in structure.residues() {
        if POSITIVELY_CHARGED_RESIDUES.contains(&residue.name()) {
            let mut state = FeatureState::new(FeatureType::PositiveCharge);
            for atom in residue.atoms() {
                if atom.element() == Element::N && atom.is_sidechain() {
                    state.add_atom(atom);
                }
            }
            features.add(state);
        } else if !residue.is_amino_acid() && !residue.is_nucleic() {
            for atom in residue.atoms() {
                let group = if is_guanidine(atom) {
                    FeatureGroup::Guanidine
                } else if is_acetamidine(atom) {
                    FeatureGroup::Acetamidine
                } else {
                    continue;
                };
                let mut state = FeatureState::with_group(FeatureType::PositiveCharge, group);
                for neighbor in atom.bonded() {
                    if neighbor.element() == Element::N {
                        grouped.insert(neighbor.index());
                        state.add_atom(neighbor);
                    }
                }
                features.add(state);
            }
            for atom in residue.atoms() {
                if atom.formal_charge() <= 0
                    || is_metal(atom.element())
                    || grouped.contains(&atom.index())
                {
                    continue;
                }
                let group = if is_quaternary_amine(atom) {
                    FeatureGroup::QuaternaryAmine
                } else if is_tertiary_amine(atom) {
                    FeatureGroup::TertiaryAmine
                } else if is_sulfonium(atom) {
                    FeatureGroup::Sulfonium
                } else {
                    FeatureGroup::Unknown
                };
                let mut state = FeatureState::with_group(FeatureType::PositiveCharge, group);
                state.add_atom(atom);
                features.add(state);
            }
        }
    }
}

/// Negative charge features, mirroring [`add_positive_charges`]: acidic
/// residue side chain oxygens as one group, recognized anionic groups,
/// and single atoms with a negative formal charge.
pub(crate) fn add_negative_charges(structure: &Structure, features: &mut Features) {
    let mut grouped: HashSet<u32> = HashSet::new();

    for residue in structure.residues() {
        if NEGATIVELY_CHARGED_RESIDUES.contains(&residue.name()) {
            let mut state = FeatureState::new(FeatureType::NegativeCharge);
            for atom in residue.atoms() {
                if atom.element() == Element::O && atom.is_sidechain() {
                    state.add_atom(atom);
                }
            }
            features.add(state);
        } else if !residue.is_amino_acid() && !residue.is_nucleic() {
            for atom in residue.atoms() {
                let group = if is_sulfonic_acid(atom) {
                    FeatureGroup::SulfonicAcid
                } else if is_phosphate(atom) {
                    FeatureGroup::Phosphate
                } else if is_sulfate(atom) {
                    FeatureGroup::Sulfate
                } else if is_carboxylate(atom) {
                    FeatureGroup::Carboxylate
                } else {
                    continue;
                };
                let mut state = FeatureState::with_group(FeatureType::NegativeCharge, group);
                for neighbor in atom.bonded() {
                    if neighbor.element() == Element::O {
                        grouped.insert(neighbor.index());
                        state.add_atom(neighbor);
                    }
                }
                features.add(state);
            }
            for atom in residue.atoms() {
                if atom.formal_charge() >= 0
                    || is_metal(atom.element())
                    || grouped.contains(&atom.index())
                {
                    continue;
                }
                let mut state = FeatureState::new(FeatureType::NegativeCharge);
                state.add_atom(atom);
                features.add(state);
            }
        }
    }
}

/// One feature per perceived aromatic ring, centered on the ring.
pub(crate) fn add_aromatic_rings(structure: &Structure, features: &mut Features) {
    for ring in structure.aromatic_rings() {
        let mut state = FeatureState::new(FeatureType::AromaticRing);
        for &index in ring {
            state.add_atom(structure.atom(index));
        }
        features.add(state);
    }
}

fn is_ionic_pair(t1: FeatureType, t2: FeatureType) -> bool {
    matches!(
        (t1, t2),
        (FeatureType::NegativeCharge, FeatureType::PositiveCharge)
            | (FeatureType::PositiveCharge, FeatureType::NegativeCharge)
    )
}

fn is_pi_stacking_pair(t1: FeatureType, t2: FeatureType) -> bool {
    t1 == FeatureType::AromaticRing && t2 == FeatureType::AromaticRing
}

fn cation_pi_pair(t1: FeatureType, t2: FeatureType, i: usize, j: usize) -> Option<(usize, usize)> {
    match (t1, t2) {
        (FeatureType::AromaticRing, FeatureType::PositiveCharge) => Some((i, j)),
        (FeatureType::PositiveCharge, FeatureType::AromaticRing) => Some((j, i)),
        _ => None,
    }
}

fn ring_plane(contacts: &Contacts<'_>, feature: usize) -> Option<Plane> {
    let points: Vec<na::Point3<f64>> = contacts
        .features
        .atom_set(feature)
        .iter()
        .map(|&a| contacts.structure.positions()[a as usize])
        .collect();
    Plane::from_points(&points)
}

/// Classify ionic, pi-stacking and cation-pi contacts between charge and
/// ring features. Ionic pairs are tested on center distance alone; ring
/// pairs additionally on the plane angle (parallel or T-shaped) and the
/// in-plane offset of the centers; cation-pi on the cation's offset over
/// the ring plane.
pub(crate) fn add_charged_contacts(contacts: &mut Contacts<'_>, params: &ContactParams) {
    let query_radius = params
        .max_ionic_dist
        .max(params.max_pi_stacking_dist)
        .max(params.max_cation_pi_dist);
    let max_ionic_sq = params.max_ionic_dist * params.max_ionic_dist;
    let max_pi_stacking_sq = params.max_pi_stacking_dist * params.max_pi_stacking_dist;
    let max_cation_pi_sq = params.max_cation_pi_dist * params.max_cation_pi_dist;

    for i in 0..contacts.features.len() {
        for (j, d_sq) in contacts.pairs_above(i, query_radius) {
            let atom1 = contacts.key_atom_view(i);
            let atom2 = contacts.key_atom_view(j);
            if contacts.invalid_atom_contact(atom1, atom2) {
                continue;
            }
            let ti = contacts.features.feature_type(i);
            let tj = contacts.features.feature_type(j);

            if is_ionic_pair(ti, tj) {
                if d_sq <= max_ionic_sq {
                    contacts.add_contact(i, j, ContactType::IonicInteraction);
                }
            } else if is_pi_stacking_pair(ti, tj) {
                if d_sq > max_pi_stacking_sq {
                    continue;
                }
                let (Some(plane1), Some(plane2)) =
                    (ring_plane(contacts, i), ring_plane(contacts, j))
                else {
                    warn!("Skipping ring pair without a defined plane");
                    continue;
                };
                let offset = plane1
                    .point_offset(&contacts.features.center(j))
                    .min(plane2.point_offset(&contacts.features.center(i)));
                if offset > params.max_pi_stacking_offset {
                    continue;
                }
                // the dihedral is folded into [0, 90]; accept near-parallel
                // and near-perpendicular ring pairs
                let angle = plane1.dihedral(&plane2);
                if angle <= params.max_pi_stacking_angle
                    || angle >= 90.0 - params.max_pi_stacking_angle
                {
                    contacts.add_contact(i, j, ContactType::PiStacking);
                }
            } else if let Some((ring, cation)) = cation_pi_pair(ti, tj, i, j) {
                if d_sq > max_cation_pi_sq {
                    continue;
                }
                let Some(plane) = ring_plane(contacts, ring) else {
                    warn!("Skipping ring without a defined plane");
                    continue;
                };
                let offset = plane.point_offset(&contacts.features.center(cation));
                if offset <= params.max_cation_pi_offset {
                    contacts.add_contact(ring, cation, ContactType::CationPi);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::contacts::calculate_contacts;
    use crate::structure::StructureBuilder;

    fn add_benzene(builder: &mut StructureBuilder, resi: isize, shift: (f64, f64, f64)) {
        builder.start_residue("BNZ", resi, "");
        for k in 0..6 {
            let angle = std::f64::consts::FRAC_PI_3 * k as f64;
            builder.add_atom(
                &format!("C{}", k + 1),
                Element::C,
                (
                    1.39 * angle.cos() + shift.0,
                    1.39 * angle.sin() + shift.1,
                    shift.2,
                ),
            );
        }
    }

    fn add_tilted_benzene(builder: &mut StructureBuilder, resi: isize, tilt_deg: f64) {
        // ring centered at (0, 0, 4), rotated about the x axis
        let tilt = tilt_deg.to_radians();
        builder.start_residue("BNZ", resi, "");
        for k in 0..6 {
            let angle = std::f64::consts::FRAC_PI_3 * k as f64;
            let (x, y) = (1.39 * angle.cos(), 1.39 * angle.sin());
            builder.add_atom(
                &format!("C{}", k + 1),
                Element::C,
                (x, y * tilt.cos(), 4.0 + y * tilt.sin()),
            );
        }
    }

    fn arg_asp_fragment() -> Structure {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("ARG", 1, "");
        builder.add_atom("NE", Element::N, (0.0, 1.33, 0.0));
        builder.add_atom("NH1", Element::N, (1.15, -0.66, 0.0));
        builder.add_atom("NH2", Element::N, (-1.15, -0.66, 0.0));
        builder.add_atom("CZ", Element::C, (0.0, 0.0, 0.0));
        builder.add_atom("CD", Element::C, (1.24, 2.12, 0.0));
        builder.start_residue("ASP", 2, "");
        builder.add_atom("N", Element::N, (-4.516, -3.034, 0.0));
        builder.add_atom("CA", Element::C, (-3.576, -4.104, 0.0));
        builder.add_atom("C", Element::C, (-4.316, -5.364, 0.0));
        builder.add_atom("O", Element::O, (-5.516, -5.404, 0.0));
        builder.add_atom("CB", Element::C, (-2.116, -4.654, 0.0));
        builder.add_atom("CG", Element::C, (-0.596, -4.654, 0.0));
        builder.add_atom("OD1", Element::O, (0.0, -3.556, 0.0));
        builder.add_atom("OD2", Element::O, (0.0, -5.752, 0.0));
        builder.finish()
    }

    #[test]
    fn test_guanidinium_carboxylate_salt_bridge() {
        let structure = arg_asp_fragment();
        let params = ContactParams {
            refine_salt_bridges: false,
            ..Default::default()
        };
        let contacts = calculate_contacts(&structure, &params).unwrap();

        let mut active: Vec<(ContactType, (u32, u32))> = contacts
            .active_contacts()
            .map(|i| {
                (
                    contacts.store().contact_type(i),
                    contacts.store().atom_indices(i),
                )
            })
            .collect();
        active.sort_by_key(|(t, _)| format!("{t}"));

        // the guanidinium group center pairs with the carboxylate center,
        // and NH2 additionally donates a hydrogen bond to OD1
        assert_eq!(
            active,
            vec![
                (ContactType::HydrogenBond, (2, 11)),
                (ContactType::IonicInteraction, (0, 11)),
            ]
        );
    }

    #[test]
    fn test_charged_features_of_basic_and_acidic_residues() {
        let structure = arg_asp_fragment();
        let features = super::super::features::calculate_features(&structure);

        let positive: Vec<usize> = (0..features.len())
            .filter(|&i| features.feature_type(i) == FeatureType::PositiveCharge)
            .collect();
        let negative: Vec<usize> = (0..features.len())
            .filter(|&i| features.feature_type(i) == FeatureType::NegativeCharge)
            .collect();
        assert_eq!(positive.len(), 1);
        assert_eq!(negative.len(), 1);
        // ARG contributes NE, NH1, NH2 and ASP contributes OD1, OD2
        assert_eq!(features.atom_set(positive[0]), &[0, 1, 2]);
        assert_eq!(features.atom_set(negative[0]), &[11, 12]);
    }

    #[test]
    fn test_parallel_pi_stacking_masks_hydrophobic() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        add_benzene(&mut builder, 1, (0.0, 0.0, 0.0));
        add_benzene(&mut builder, 2, (0.5, 0.0, 4.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();

        let active: Vec<usize> = contacts.active_contacts().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(
            contacts.store().contact_type(active[0]),
            ContactType::PiStacking
        );
        assert_eq!(contacts.store().atom_indices(active[0]), (0, 6));
        // ring carbons within hydrophobic range were recorded, then masked
        assert!(contacts.store().len() > 1);
    }

    #[test]
    fn test_t_shaped_pi_stacking() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        add_benzene(&mut builder, 1, (0.0, 0.0, 0.0));
        add_tilted_benzene(&mut builder, 2, 90.0);
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        let pi: Vec<usize> = contacts
            .active_contacts()
            .filter(|&i| contacts.store().contact_type(i) == ContactType::PiStacking)
            .collect();
        assert_eq!(pi.len(), 1);
    }

    #[test]
    fn test_oblique_rings_do_not_stack() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        add_benzene(&mut builder, 1, (0.0, 0.0, 0.0));
        add_tilted_benzene(&mut builder, 2, 45.0);
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        let stored_types: Vec<ContactType> = (0..contacts.store().len())
            .map(|i| contacts.store().contact_type(i))
            .collect();
        assert!(!stored_types.contains(&ContactType::PiStacking));
    }

    #[test]
    fn test_distant_rings_do_not_stack() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        add_benzene(&mut builder, 1, (0.0, 0.0, 0.0));
        add_benzene(&mut builder, 2, (0.0, 0.0, 40.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(contacts.store().len(), 0);
    }

    #[test]
    fn test_cation_pi_over_ring_face() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        add_benzene(&mut builder, 1, (0.0, 0.0, 0.0));
        builder.start_residue("NH4", 2, "");
        builder.add_atom("N", Element::N, (0.3, 0.0, 4.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        let active: Vec<usize> = contacts.active_contacts().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(
            contacts.store().contact_type(active[0]),
            ContactType::CationPi
        );
        // the ring is reported first, the cation second
        assert_eq!(contacts.store().atom_indices(active[0]), (0, 6));
    }

    #[test]
    fn test_cation_beside_ring_is_rejected_by_offset() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        add_benzene(&mut builder, 1, (0.0, 0.0, 0.0));
        builder.start_residue("NH4", 2, "");
        builder.add_atom("N", Element::N, (3.0, 0.0, 4.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(contacts.store().len(), 0);
    }
}
