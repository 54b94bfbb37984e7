//! Hydrogen bond donors and acceptors plus the geometric classifier for
//! conventional, weak, water mediated and backbone hydrogen bonds.

use std::collections::HashSet;

use pdbtbx::Element;

use crate::structure::{ideal_angle, AtomGeometry, AtomView, Structure};

use super::contacts::{ContactParams, ContactType, Contacts};
use super::features::{FeatureState, FeatureType, Features};
use super::geometry::{calc_angles, calc_plane_angle};

/// Histidine ring nitrogens donate and accept in either tautomer because
/// their protonation assignment is usually ambiguous.
fn is_histidine_ring_nitrogen(atom: AtomView<'_>) -> bool {
    atom.element() == Element::N && atom.is_aromatic() && atom.residue().name() == "HIS"
}

/// A neutral nitrogen accepts while it still has a lone pair left over,
/// judged by comparing its substituent count against the ideal geometry.
fn is_nitrogen_acceptor(atom: AtomView<'_>) -> bool {
    if atom.formal_charge() >= 1 {
        return false;
    }
    let total_bonds = atom.bonded_heavy_atoms().count() + atom.total_h_count() as usize;
    match atom.geometry() {
        AtomGeometry::Tetrahedral => total_bonds < 4,
        AtomGeometry::Trigonal => total_bonds < 3,
        AtomGeometry::Linear => total_bonds < 2,
        _ => false,
    }
}

/// Thiolate and thioether sulfurs.
fn is_sulfur_acceptor(atom: AtomView<'_>) -> bool {
    let resn = atom.residue().name();
    resn == "CYS" || resn == "MET" || atom.formal_charge() == -1
}

/// Hydrogen bond acceptors: all oxygens, nitrogens with an available lone
/// pair and protein sulfur.
pub(crate) fn add_hydrogen_acceptors(structure: &Structure, features: &mut Features) {
    for atom in structure.atoms() {
        let accepts = match atom.element() {
            Element::O => true,
            Element::N => is_histidine_ring_nitrogen(atom) || is_nitrogen_acceptor(atom),
            Element::S => is_sulfur_acceptor(atom),
            _ => false,
        };
        if accepts {
            let mut state = FeatureState::new(FeatureType::HydrogenAcceptor);
            state.add_atom(atom);
            features.add(state);
        }
    }
}

/// Hydrogen bond donors: nitrogen, oxygen and sulfur atoms carrying at
/// least one explicit or inferred hydrogen.
pub(crate) fn add_hydrogen_donors(structure: &Structure, features: &mut Features) {
    for atom in structure.atoms() {
        let donates = is_histidine_ring_nitrogen(atom)
            || (matches!(atom.element(), Element::N | Element::O | Element::S)
                && atom.total_h_count() > 0);
        if donates {
            let mut state = FeatureState::new(FeatureType::HydrogenDonor);
            state.add_atom(atom);
            features.add(state);
        }
    }
}

/// Weak donors are carbons with a hydrogen that sit next to nitrogen or
/// oxygen, either directly bonded or through an aromatic ring.
pub(crate) fn add_weak_hydrogen_donors(structure: &Structure, features: &mut Features) {
    let mut hetero_ring_atoms: HashSet<u32> = HashSet::new();
    for ring in structure.aromatic_rings() {
        let has_hetero = ring
            .iter()
            .any(|&a| matches!(structure.atom(a).element(), Element::N | Element::O));
        if has_hetero {
            hetero_ring_atoms.extend(ring.iter().copied());
        }
    }

    for atom in structure.atoms() {
        if atom.element() != Element::C || atom.total_h_count() == 0 {
            continue;
        }
        if atom.bonded_element_count(Element::N) > 0
            || atom.bonded_element_count(Element::O) > 0
            || hetero_ring_atoms.contains(&atom.index())
        {
            let mut state = FeatureState::new(FeatureType::WeakHydrogenDonor);
            state.add_atom(atom);
            features.add(state);
        }
    }
}

fn is_hydrogen_bond_pair(t1: FeatureType, t2: FeatureType) -> bool {
    matches!(
        (t1, t2),
        (FeatureType::HydrogenAcceptor, FeatureType::HydrogenDonor)
            | (FeatureType::HydrogenDonor, FeatureType::HydrogenAcceptor)
    )
}

fn is_weak_hydrogen_bond_pair(t1: FeatureType, t2: FeatureType) -> bool {
    matches!(
        (t1, t2),
        (FeatureType::HydrogenAcceptor, FeatureType::WeakHydrogenDonor)
            | (FeatureType::WeakHydrogenDonor, FeatureType::HydrogenAcceptor)
    )
}

fn hydrogen_bond_type(donor: AtomView<'_>, acceptor: AtomView<'_>) -> ContactType {
    if donor.is_water() && acceptor.is_water() {
        ContactType::WaterHydrogenBond
    } else if donor.is_backbone()
        && donor.residue().is_amino_acid()
        && acceptor.is_backbone()
        && acceptor.residue().is_amino_acid()
    {
        ContactType::BackboneHydrogenBond
    } else {
        ContactType::HydrogenBond
    }
}

/// Classify hydrogen bonds between donor and acceptor features. Candidate
/// pairs pass a distance gate (longer for sulfur), then every bond angle
/// at the donor and at the acceptor must sit within the allowed deviation
/// from the ideal angle of the atom's geometry, and trigonal atoms must
/// additionally keep the partner close to their plane.
pub(crate) fn add_hydrogen_bonds(contacts: &mut Contacts<'_>, params: &ContactParams) {
    let query_radius = params.max_hbond_dist.max(params.max_hbond_sulfur_dist);
    let max_dist_sq = params.max_hbond_dist * params.max_hbond_dist;
    let max_sulfur_dist_sq = params.max_hbond_sulfur_dist * params.max_hbond_sulfur_dist;

    for i in 0..contacts.features.len() {
        for (j, d_sq) in contacts.pairs_above(i, query_radius) {
            let ti = contacts.features.feature_type(i);
            let tj = contacts.features.feature_type(j);

            let weak = is_weak_hydrogen_bond_pair(ti, tj);
            if !weak && !is_hydrogen_bond_pair(ti, tj) {
                continue;
            }

            let (donor_feature, acceptor_feature) = if tj == FeatureType::HydrogenAcceptor {
                (i, j)
            } else {
                (j, i)
            };
            let donor = contacts.key_atom_view(donor_feature);
            let acceptor = contacts.key_atom_view(acceptor_feature);

            if donor.index() == acceptor.index() {
                continue;
            }
            if contacts.invalid_atom_contact(donor, acceptor) {
                continue;
            }
            if donor.element() == Element::S || acceptor.element() == Element::S {
                if d_sq > max_sulfur_dist_sq {
                    continue;
                }
            } else if d_sq > max_dist_sq {
                continue;
            }

            let Some(donor_angles) = calc_angles(donor, acceptor) else {
                continue;
            };
            let ideal_donor = ideal_angle(donor.geometry());
            if donor_angles
                .iter()
                .any(|angle| (ideal_donor - angle).abs() > params.max_hbond_don_angle)
            {
                continue;
            }
            if donor.geometry() == AtomGeometry::Trigonal {
                if let Some(out_of_plane) = calc_plane_angle(donor, acceptor) {
                    if out_of_plane > params.max_hbond_don_plane_angle {
                        continue;
                    }
                }
            }

            let Some(acceptor_angles) = calc_angles(acceptor, donor) else {
                continue;
            };
            let ideal_acceptor = ideal_angle(acceptor.geometry());
            if acceptor_angles
                .iter()
                .any(|angle| (ideal_acceptor - angle).abs() > params.max_hbond_acc_angle)
            {
                continue;
            }
            if acceptor.geometry() == AtomGeometry::Trigonal {
                if let Some(out_of_plane) = calc_plane_angle(acceptor, donor) {
                    if out_of_plane > params.max_hbond_acc_plane_angle {
                        continue;
                    }
                }
            }

            let contact_type = if weak {
                ContactType::WeakHydrogenBond
            } else {
                hydrogen_bond_type(donor, acceptor)
            };
            contacts.add_contact(donor_feature, acceptor_feature, contact_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::contacts::calculate_contacts;
    use crate::structure::StructureBuilder;

    fn asp_with_water(water: (f64, f64, f64)) -> crate::structure::Structure {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("ASP", 1, "");
        builder.add_atom("N", Element::N, (-2.4, 1.62, 0.0));
        builder.add_atom("CA", Element::C, (-1.46, 0.55, 0.0));
        builder.add_atom("C", Element::C, (-2.2, -0.71, 0.0));
        builder.add_atom("O", Element::O, (-3.4, -0.75, 0.0));
        builder.add_atom("CB", Element::C, (0.0, 0.0, 0.0));
        builder.add_atom("CG", Element::C, (1.52, 0.0, 0.0));
        builder.add_atom("OD1", Element::O, (2.116, 1.098, 0.0));
        builder.add_atom("OD2", Element::O, (2.116, -1.098, 0.0));
        builder.start_residue("HOH", 2, "");
        builder.add_atom("O", Element::O, water);
        builder.finish()
    }

    fn contact_list(
        contacts: &crate::interactions::contacts::FrozenContacts,
    ) -> Vec<(ContactType, (u32, u32))> {
        contacts
            .active_contacts()
            .map(|i| {
                (
                    contacts.store().contact_type(i),
                    contacts.store().atom_indices(i),
                )
            })
            .collect()
    }

    #[test]
    fn test_water_donates_to_carboxylate() {
        let structure = asp_with_water((0.654, 3.486, 0.0));
        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(
            contact_list(&contacts),
            vec![(ContactType::HydrogenBond, (8, 6))]
        );
    }

    #[test]
    fn test_distant_water_makes_no_contact() {
        let structure = asp_with_water((0.654, 13.486, 0.0));
        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(contacts.store().len(), 0);
    }

    #[test]
    fn test_donor_and_acceptor_assignment() {
        let structure = asp_with_water((0.654, 3.486, 0.0));
        let features = super::super::features::calculate_features(&structure);

        let atoms_of = |ft: FeatureType| -> Vec<u32> {
            (0..features.len())
                .filter(|&i| features.feature_type(i) == ft)
                .map(|i| features.key_atom(i))
                .collect()
        };
        // backbone N, backbone O, OD1, OD2 and the water oxygen accept
        assert_eq!(atoms_of(FeatureType::HydrogenAcceptor), vec![0, 3, 6, 7, 8]);
        // only the amide nitrogen and the water carry hydrogens
        assert_eq!(atoms_of(FeatureType::HydrogenDonor), vec![0, 8]);
        // CA and C sit next to nitrogen or oxygen, CB and CG do not qualify
        assert_eq!(atoms_of(FeatureType::WeakHydrogenDonor), vec![1, 2]);
    }

    #[test]
    fn test_backbone_carbonyl_accepts_from_amide() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("GLY", 1, "");
        builder.add_atom("N", Element::N, (0.0, 0.0, 0.0));
        builder.add_atom("CA", Element::C, (1.47, 0.0, 0.0));
        builder.add_atom("C", Element::C, (2.03, 1.39, 0.0));
        builder.add_atom("O", Element::O, (3.25, 1.42, 0.0));
        builder.start_residue("GLY", 2, "");
        builder.add_atom("N", Element::N, (4.7, 3.931, 0.0));
        builder.add_atom("CA", Element::C, (3.965, 5.204, 0.0));
        builder.add_atom("C", Element::C, (4.525, 6.593, 0.0));
        builder.add_atom("O", Element::O, (5.745, 6.63, 0.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(
            contact_list(&contacts),
            vec![(ContactType::BackboneHydrogenBond, (4, 3))]
        );
    }

    #[test]
    fn test_water_pair_recorded_once() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("HOH", 1, "");
        builder.add_atom("O", Element::O, (0.0, 0.0, 0.0));
        builder.start_residue("HOH", 2, "");
        builder.add_atom("O", Element::O, (2.8, 0.0, 0.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        // both waters donate and accept, yet the pair appears exactly once
        assert_eq!(
            contact_list(&contacts),
            vec![(ContactType::WaterHydrogenBond, (1, 0))]
        );
    }

    #[test]
    fn test_histidine_ring_nitrogen_donates_without_hydrogens() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("HIS", 1, "");
        builder.add_atom("CG", Element::C, (1.166, 0.0, 0.0));
        builder.add_atom("ND1", Element::N, (0.3603, 1.1089, 0.0));
        builder.add_atom("CE1", Element::C, (-0.9433, 0.6854, 0.0));
        builder.add_atom("NE2", Element::N, (-0.9433, -0.6854, 0.0));
        builder.add_atom("CD2", Element::C, (0.3603, -1.1089, 0.0));
        builder.start_residue("HOH", 2, "");
        builder.add_atom("O", Element::O, (1.2255, 3.7718, 0.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        // ND1 has no proton in the tables yet still pairs with the water
        assert_eq!(
            contact_list(&contacts),
            vec![(ContactType::HydrogenBond, (5, 1))]
        );
    }

    fn sulfide_with_water(resn: &str, names: [&str; 3]) -> crate::structure::Structure {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue(resn, 1, "");
        builder.add_atom(names[0], Element::C, (-1.5, 1.0, 0.0));
        builder.add_atom(names[1], Element::S, (0.0, 0.0, 0.0));
        builder.add_atom(names[2], Element::C, (1.5, 1.0, 0.0));
        builder.start_residue("HOH", 2, "");
        builder.add_atom("O", Element::O, (0.0, -3.8, 0.0));
        builder.finish()
    }

    #[test]
    fn test_methionine_sulfur_accepts_past_the_oxygen_cutoff() {
        let structure = sulfide_with_water("MET", ["CG", "SD", "CE"]);
        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        // 3.8 A fails the default 3.5 A gate and passes the sulfur one
        assert_eq!(
            contact_list(&contacts),
            vec![(ContactType::HydrogenBond, (3, 1))]
        );
    }

    #[test]
    fn test_free_sulfide_does_not_accept() {
        let structure = sulfide_with_water("DMS", ["C1", "S1", "C2"]);
        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(contacts.store().len(), 0);
    }

    #[test]
    fn test_weak_donor_forms_weak_hydrogen_bond() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("MEA", 1, "");
        builder.add_atom("C1", Element::C, (0.0, 0.0, 0.0));
        builder.add_atom("N1", Element::N, (0.0, 1.47, 0.0));
        builder.start_residue("HOH", 2, "");
        builder.add_atom("O", Element::O, (3.017, -1.0667, 0.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(
            contact_list(&contacts),
            vec![(ContactType::WeakHydrogenBond, (0, 2))]
        );
    }

    #[test]
    fn test_linear_approach_to_carbonyl_is_rejected() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("LIG", 1, "");
        builder.add_atom("C1", Element::C, (0.0, 0.0, 0.0));
        builder.add_atom("O1", Element::O, (1.23, 0.0, 0.0));
        builder.start_residue("HOH", 2, "");
        builder.add_atom("O", Element::O, (4.03, 0.0, 0.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(contacts.store().len(), 0);
    }

    #[test]
    fn test_bent_approach_to_carbonyl_is_accepted() {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("LIG", 1, "");
        builder.add_atom("C1", Element::C, (0.0, 0.0, 0.0));
        builder.add_atom("O1", Element::O, (1.23, 0.0, 0.0));
        builder.start_residue("HOH", 2, "");
        builder.add_atom("O", Element::O, (2.63, 2.4249, 0.0));
        let structure = builder.finish();

        let contacts = calculate_contacts(&structure, &ContactParams::default()).unwrap();
        assert_eq!(
            contact_list(&contacts),
            vec![(ContactType::HydrogenBond, (2, 1))]
        );
    }
}
