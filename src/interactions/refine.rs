//! Refinement passes that deactivate frozen contacts. Only the contact
//! bit set changes here; the store itself stays append only.

use std::collections::{HashMap, HashSet};

use nalgebra as na;
use pdbtbx::Element;
use tracing::debug;

use crate::geometry::SpatialHash;
use crate::structure::{vdw_radius, Structure};

use super::contacts::{ContactParams, ContactType, FrozenContacts};
use super::features::{FeatureGroup, FeatureType};

fn is_hydrogen_bond_type(contact_type: ContactType) -> bool {
    matches!(
        contact_type,
        ContactType::HydrogenBond
            | ContactType::WaterHydrogenBond
            | ContactType::BackboneHydrogenBond
    )
}

/// Deactivate contacts whose midpoint lies inside the scaled van der
/// Waals sphere of a heavy atom from an uninvolved residue.
pub(crate) fn refine_line_of_sight(
    structure: &Structure,
    contacts: &mut FrozenContacts,
    params: &ContactParams,
) {
    let factor = params.line_of_sight_dist_factor;
    let positions = structure.positions();
    let hash = SpatialHash::new(positions);

    let active: Vec<usize> = contacts.active_contacts().collect();
    for i in active {
        let (a1, a2) = contacts.store().atom_indices(i);
        let residue1 = structure.atom(a1).residue().index();
        let residue2 = structure.atom(a2).residue().index();
        let midpoint = na::Point3::from(
            (positions[a1 as usize].coords + positions[a2 as usize].coords) * 0.5,
        );

        let mut occluded = false;
        hash.each_within(&midpoint, 3.0 * factor, |k, d_sq| {
            if occluded {
                return;
            }
            let atom = structure.atom(k);
            if atom.element() == Element::H {
                return;
            }
            let residue = atom.residue().index();
            if residue == residue1 || residue == residue2 {
                return;
            }
            let occlusion = vdw_radius(atom.element()) * factor;
            if d_sq < occlusion * occlusion {
                occluded = true;
            }
        });
        if occluded {
            debug!("Removing contact {i} with an occluded line of sight");
            contacts.contact_set_mut().clear(i);
        }
    }
}

/// Keep only the closest hydrophobic contact an atom makes with any one
/// residue, applied in both directions.
pub(crate) fn refine_hydrophobic_contacts(structure: &Structure, contacts: &mut FrozenContacts) {
    let mut best: HashMap<(u32, u32), (f64, usize)> = HashMap::new();
    let active: Vec<usize> = contacts.active_contacts().collect();

    for i in active {
        if contacts.store().contact_type(i) != ContactType::Hydrophobic {
            continue;
        }
        let (a1, a2) = contacts.store().atom_indices(i);
        let dist =
            (structure.positions()[a2 as usize] - structure.positions()[a1 as usize]).norm();
        let residue1 = structure.atom(a1).residue().index();
        let residue2 = structure.atom(a2).residue().index();
        keep_closest(contacts, &mut best, dist, i, (a1, residue2));
        keep_closest(contacts, &mut best, dist, i, (a2, residue1));
    }
}

fn keep_closest(
    contacts: &mut FrozenContacts,
    best: &mut HashMap<(u32, u32), (f64, usize)>,
    dist: f64,
    index: usize,
    key: (u32, u32),
) {
    match best.get_mut(&key) {
        Some((best_dist, best_index)) => {
            if dist < *best_dist {
                contacts.contact_set_mut().clear(*best_index);
                *best_dist = dist;
                *best_index = index;
            } else {
                contacts.contact_set_mut().clear(index);
            }
        }
        None => {
            best.insert(key, (dist, index));
        }
    }
}

/// Keep each charged atom's single best ionic interaction, then drop
/// hydrogen bonds that duplicate a surviving salt bridge between the
/// same charged groups.
pub(crate) fn refine_salt_bridges(structure: &Structure, contacts: &mut FrozenContacts) {
    // group and member atoms of every charged feature, by its key atom
    let mut group_of_atom: HashMap<u32, FeatureGroup> = HashMap::new();
    let mut atom_set_of_key: HashMap<u32, Vec<u32>> = HashMap::new();
    {
        let features = contacts.features();
        for f in 0..features.len() {
            if matches!(
                features.feature_type(f),
                FeatureType::PositiveCharge | FeatureType::NegativeCharge
            ) {
                let key = features.key_atom(f);
                group_of_atom.insert(key, features.group(f));
                atom_set_of_key.insert(key, features.atom_set(f).to_vec());
            }
        }
    }

    let ionic: Vec<usize> = contacts
        .active_contacts()
        .filter(|&i| contacts.store().contact_type(i) == ContactType::IonicInteraction)
        .collect();
    let mut by_atom: HashMap<u32, Vec<usize>> = HashMap::new();
    let mut dist_of: HashMap<usize, f64> = HashMap::new();
    for &i in &ionic {
        let (a1, a2) = contacts.store().atom_indices(i);
        let dist =
            (structure.positions()[a2 as usize] - structure.positions()[a1 as usize]).norm();
        dist_of.insert(i, dist);
        by_atom.entry(a1).or_default().push(i);
        by_atom.entry(a2).or_default().push(i);
    }

    let mut atoms: Vec<u32> = by_atom.keys().copied().collect();
    atoms.sort_unstable();
    for atom in atoms {
        let candidates: Vec<usize> = by_atom[&atom]
            .iter()
            .copied()
            .filter(|&c| contacts.contact_set().get(c))
            .collect();
        if candidates.len() < 2 {
            continue;
        }
        // closest first, higher priority partner group breaking ties,
        // then insertion order
        let best = candidates.iter().copied().min_by(|&a, &b| {
            let partner = |c: usize| {
                let (c1, c2) = contacts.store().atom_indices(c);
                if c1 == atom {
                    c2
                } else {
                    c1
                }
            };
            let priority_a = group_of_atom.get(&partner(a)).map_or(0, |g| g.priority());
            let priority_b = group_of_atom.get(&partner(b)).map_or(0, |g| g.priority());
            dist_of[&a]
                .total_cmp(&dist_of[&b])
                .then(priority_b.cmp(&priority_a))
                .then(a.cmp(&b))
        });
        let Some(best) = best else {
            continue;
        };
        for c in candidates {
            if c != best {
                debug!("Removing ionic contact {c} superseded by a closer salt bridge");
                contacts.contact_set_mut().clear(c);
            }
        }
    }

    // every atom pair bridged by a surviving salt bridge
    let mut bridged: HashSet<(u32, u32)> = HashSet::new();
    let surviving: Vec<usize> = contacts
        .active_contacts()
        .filter(|&i| contacts.store().contact_type(i) == ContactType::IonicInteraction)
        .collect();
    for i in surviving {
        let (a1, a2) = contacts.store().atom_indices(i);
        let (Some(set1), Some(set2)) = (atom_set_of_key.get(&a1), atom_set_of_key.get(&a2))
        else {
            continue;
        };
        for &m in set1 {
            for &n in set2 {
                bridged.insert((m.min(n), m.max(n)));
            }
        }
    }
    if bridged.is_empty() {
        return;
    }

    let hydrogen_bonds: Vec<usize> = contacts
        .active_contacts()
        .filter(|&i| is_hydrogen_bond_type(contacts.store().contact_type(i)))
        .collect();
    for i in hydrogen_bonds {
        let (a1, a2) = contacts.store().atom_indices(i);
        if bridged.contains(&(a1.min(a2), a1.max(a2))) {
            debug!("Removing hydrogen bond {i} duplicating a salt bridge");
            contacts.contact_set_mut().clear(i);
        }
    }
}

/// Drop hydrophobic and cation-pi contacts between residue pairs whose
/// rings already stack.
pub(crate) fn refine_pi_stacking(structure: &Structure, contacts: &mut FrozenContacts) {
    let mut stacked: HashSet<(u32, u32)> = HashSet::new();
    for i in contacts.active_contacts() {
        if contacts.store().contact_type(i) != ContactType::PiStacking {
            continue;
        }
        let (a1, a2) = contacts.store().atom_indices(i);
        let residue1 = structure.atom(a1).residue().index();
        let residue2 = structure.atom(a2).residue().index();
        stacked.insert((residue1.min(residue2), residue1.max(residue2)));
    }
    if stacked.is_empty() {
        return;
    }

    let candidates: Vec<usize> = contacts
        .active_contacts()
        .filter(|&i| {
            matches!(
                contacts.store().contact_type(i),
                ContactType::Hydrophobic | ContactType::CationPi
            )
        })
        .collect();
    for i in candidates {
        let (a1, a2) = contacts.store().atom_indices(i);
        let residue1 = structure.atom(a1).residue().index();
        let residue2 = structure.atom(a2).residue().index();
        if stacked.contains(&(residue1.min(residue2), residue1.max(residue2))) {
            contacts.contact_set_mut().clear(i);
        }
    }
}
