//! Angle measurements around bonded atoms, used by the directional
//! contact classifiers.

use nalgebra as na;
use pdbtbx::Element;

use crate::structure::AtomView;

/// Angle in degrees between two directions, `None` when either has zero
/// length.
fn angle_between(v1: &na::Vector3<f64>, v2: &na::Vector3<f64>) -> Option<f64> {
    let denom = v1.norm() * v2.norm();
    if denom == 0.0 {
        return None;
    }
    let cos = (v1.dot(v2) / denom).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Angles in degrees at `from` between the direction towards `to` and each
/// bonded heavy atom. An atom without heavy neighbors yields an empty list.
/// `None` when a direction degenerates to zero length.
pub(crate) fn calc_angles(from: AtomView<'_>, to: AtomView<'_>) -> Option<Vec<f64>> {
    let d1 = to.position() - from.position();
    let mut angles = Vec::new();
    for neighbor in from.bonded() {
        if neighbor.element() == Element::H {
            continue;
        }
        let d2 = neighbor.position() - from.position();
        angles.push(angle_between(&d1, &d2)?);
    }
    Some(angles)
}

/// Angle in degrees between the direction from `from` towards `to` and the
/// plane of the neighborhood of `from`. When only one heavy neighbor
/// exists the plane is completed through that neighbor's own bonds.
/// `None` when no plane is defined.
pub(crate) fn calc_plane_angle(from: AtomView<'_>, to: AtomView<'_>) -> Option<f64> {
    let origin = from.position();
    let mut spanning = [na::Vector3::zeros(), na::Vector3::zeros()];
    let mut count = 0;

    for neighbor in from.bonded() {
        if count == 2 {
            break;
        }
        if neighbor.element() == Element::H {
            continue;
        }
        spanning[count] = neighbor.position() - origin;
        count += 1;
    }
    if count == 1 {
        'extend: for neighbor in from.bonded() {
            let neighbor_pos = neighbor.position();
            for second in neighbor.bonded() {
                if second.element() == Element::H || second.index() == from.index() {
                    continue;
                }
                spanning[1] = second.position() - neighbor_pos;
                count += 1;
                break 'extend;
            }
        }
    }
    if count < 2 {
        return None;
    }

    let normal = spanning[0].cross(&spanning[1]);
    let d1 = to.position() - origin;
    angle_between(&normal, &d1).map(|angle| (90.0 - angle).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Structure, StructureBuilder};

    fn two_residues(
        first: &[(&str, Element, (f64, f64, f64))],
        second: &[(&str, Element, (f64, f64, f64))],
    ) -> Structure {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("LIG", 1, "");
        for &(name, element, position) in first {
            builder.add_atom(name, element, position);
        }
        builder.start_residue("LIG", 2, "");
        for &(name, element, position) in second {
            builder.add_atom(name, element, position);
        }
        builder.finish()
    }

    #[test]
    fn test_angles_without_heavy_neighbors_are_empty() {
        let structure = two_residues(
            &[("O", Element::O, (0.0, 0.0, 0.0))],
            &[("O", Element::O, (2.8, 0.0, 0.0))],
        );
        let angles = calc_angles(structure.atom(0), structure.atom(1));
        assert_eq!(angles, Some(Vec::new()));
    }

    #[test]
    fn test_angle_at_bonded_oxygen() {
        // partner placed at 120 degrees from the C-O bond direction
        let structure = two_residues(
            &[
                ("C1", Element::C, (-1.43, 0.0, 0.0)),
                ("O1", Element::O, (0.0, 0.0, 0.0)),
            ],
            &[("O2", Element::O, (1.4, 2.425, 0.0))],
        );
        let angles = calc_angles(structure.atom(1), structure.atom(2)).unwrap();
        assert_eq!(angles.len(), 1);
        assert!((angles[0] - 120.0).abs() < 0.1);
    }

    #[test]
    fn test_coincident_partner_has_no_angle() {
        let structure = two_residues(
            &[
                ("C1", Element::C, (-1.43, 0.0, 0.0)),
                ("O1", Element::O, (0.0, 0.0, 0.0)),
            ],
            &[("O2", Element::O, (0.0, 0.0, 0.0))],
        );
        assert_eq!(calc_angles(structure.atom(1), structure.atom(2)), None);
    }

    #[test]
    fn test_plane_angle_through_second_shell() {
        // carbonyl-like oxygen: the plane comes from C and its neighbor
        let structure = two_residues(
            &[
                ("CA", Element::C, (-2.03, -1.39, 0.0)),
                ("C", Element::C, (-1.23, 0.0, 0.0)),
                ("O", Element::O, (0.0, 0.0, 0.0)),
            ],
            &[
                ("N1", Element::N, (1.4, 2.425, 0.0)),
                ("N2", Element::N, (1.0, 1.0, 2.9)),
            ],
        );
        // in-plane partner
        let in_plane = calc_plane_angle(structure.atom(2), structure.atom(3)).unwrap();
        assert!(in_plane < 0.1);
        // partner well out of the carbonyl plane
        let out_of_plane = calc_plane_angle(structure.atom(2), structure.atom(4)).unwrap();
        assert!(out_of_plane > 55.0);
    }

    #[test]
    fn test_plane_angle_needs_two_directions() {
        let structure = two_residues(
            &[
                ("C1", Element::C, (-1.43, 0.0, 0.0)),
                ("O1", Element::O, (0.0, 0.0, 0.0)),
            ],
            &[("O2", Element::O, (2.8, 0.0, 0.0))],
        );
        // the single neighbor C1 has no further heavy atoms
        assert_eq!(calc_plane_angle(structure.atom(1), structure.atom(2)), None);
    }
}
