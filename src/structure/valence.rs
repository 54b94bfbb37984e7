use pdbtbx::Element;
use tracing::debug;

use super::element::{is_halogen, is_metal};
use super::{is_standard_amino_acid, is_standard_nucleic, is_water, Structure};

/// Idealized coordination geometry of an atom, derived from its bond count
/// plus inferred hydrogens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomGeometry {
    /// No neighbors at all, e.g. a free ion.
    Spherical,
    /// A single neighbor.
    Terminal,
    /// Two neighbors at 180 degrees.
    Linear,
    /// Three neighbors at 120 degrees.
    Trigonal,
    /// Four neighbors at 109.47 degrees.
    Tetrahedral,
    /// Six neighbors at 90 degrees.
    Octahedral,
    /// Anything the simple electron counting cannot place.
    Unknown,
}

/// Map a neighbor count (bonds plus inferred hydrogens) to a geometry.
pub fn assign_geometry(count: usize) -> AtomGeometry {
    match count {
        0 => AtomGeometry::Spherical,
        1 => AtomGeometry::Terminal,
        2 => AtomGeometry::Linear,
        3 => AtomGeometry::Trigonal,
        4 => AtomGeometry::Tetrahedral,
        _ => AtomGeometry::Unknown,
    }
}

/// Ideal angle in degrees between two substituents of an atom with the
/// given geometry.
pub fn ideal_angle(geometry: AtomGeometry) -> f64 {
    match geometry {
        AtomGeometry::Linear => 180.0,
        AtomGeometry::Trigonal => 120.0,
        AtomGeometry::Tetrahedral => 109.4721,
        AtomGeometry::Octahedral => 90.0,
        _ => 120.0,
    }
}

/// Assign formal charge, implicit hydrogen count, total hydrogen count and
/// ideal geometry to every atom. Standard residue atoms are looked up in
/// fixed tables keyed by atom name; everything else runs through electron
/// counting on the heavy-atom bond graph.
///
/// Must run after bond and ring perception.
pub(crate) fn assign_valences(structure: &mut Structure) {
    let n = structure.atom_names.len();
    let mut assigned = Vec::with_capacity(n);
    for i in 0..n as u32 {
        assigned.push(atom_valence(structure, i));
    }
    for (i, (charge, implicit_h, total_h, geometry)) in assigned.into_iter().enumerate() {
        structure.formal_charges[i] = charge;
        structure.implicit_h[i] = implicit_h;
        structure.total_h[i] = total_h;
        structure.geometry[i] = geometry;
    }
}

fn atom_valence(s: &Structure, i: u32) -> (i8, u8, u8, AtomGeometry) {
    let element = s.elements[i as usize];
    let bonds = s.bonds.neighbors(i);
    let degree = bonds.len();
    let hydrogen_count = bonds
        .iter()
        .filter(|&&j| s.elements[j as usize] == Element::H)
        .count();
    // Bond orders are not perceived, so the explicit valence equals the
    // bond count
    let valence = degree;

    if let Some((charge, table_h, geometry)) = standard_valence(s, i) {
        let implicit_h = if hydrogen_count > 0 { 0 } else { table_h };
        return (charge, implicit_h, implicit_h + hydrogen_count as u8, geometry);
    }

    let file_charge = s.formal_charges[i as usize];
    let assign_charge = file_charge == 0;
    let assign_h = hydrogen_count == 0;
    let aromatic = s.atom_aromatic[i as usize];

    match element {
        Element::H => {
            let charge = if degree == 0 { 1 } else { 0 };
            let geometry = if degree == 0 {
                AtomGeometry::Spherical
            } else {
                AtomGeometry::Terminal
            };
            (charge, 0, 0, geometry)
        }
        Element::C => {
            // Carbons with a terminal oxygen (carbonyl-like) or two or more
            // nitrogen neighbors (amidine, guanidine) are sp2
            let sp2_like = aromatic
                || terminal_oxygens(s, i, u32::MAX).next().is_some()
                || bonded_element_count(s, i, Element::N) >= 2;
            if sp2_like {
                let implicit_h = if assign_h {
                    (3i32 - valence as i32).max(0) as u8
                } else {
                    0
                };
                let total_h = implicit_h + hydrogen_count as u8;
                (file_charge, implicit_h, total_h, AtomGeometry::Trigonal)
            } else {
                let implicit_h = if assign_h {
                    (4i32 - valence as i32 - file_charge.abs() as i32).max(0) as u8
                } else {
                    0
                };
                let total_h = implicit_h + hydrogen_count as u8;
                let geometry = assign_geometry(
                    (degree as i32 + implicit_h as i32 + (-(file_charge as i32)).max(0)) as usize,
                );
                (file_charge, implicit_h, total_h, geometry)
            }
        }
        Element::N => {
            if aromatic && assign_h && assign_charge {
                // Without bond orders an unprotonated aromatic nitrogen is
                // indistinguishable from a pyrrole nitrogen; default to the
                // pyridine form
                return (0, 0, hydrogen_count as u8, AtomGeometry::Trigonal);
            }
            let conjugated = aromatic || is_conjugated(s, i);
            let mut charge = file_charge;
            if assign_charge {
                if !assign_h {
                    charge = valence as i8 - 3;
                } else if conjugated && valence < 4 {
                    charge =
                        if degree - hydrogen_count == 1 && valence - hydrogen_count == 2 {
                            1
                        } else {
                            0
                        };
                } else {
                    // Aliphatic amines are assumed protonated
                    charge = if bonded_to_sulfur_or_metal(s, i) { 0 } else { 1 };
                }
            }
            let implicit_h = if assign_h {
                (3i32 - valence as i32 + charge as i32).max(0) as u8
            } else {
                0
            };
            let total_h = implicit_h + hydrogen_count as u8;
            let count = if conjugated {
                degree as i32 + implicit_h as i32 - charge as i32
            } else {
                degree as i32 + implicit_h as i32 + 1 - charge as i32
            };
            (charge, implicit_h, total_h, assign_geometry(count.max(0) as usize))
        }
        Element::O => {
            let conjugated = aromatic || is_conjugated(s, i);
            let mut charge = file_charge;
            if assign_charge {
                if !assign_h {
                    charge = valence as i8 - 2;
                }
                if valence == 1 && is_charged_terminal_oxygen(s, i) {
                    charge = -1;
                }
            }
            let implicit_h = if assign_h {
                (2i32 - valence as i32 + charge as i32).max(0) as u8
            } else {
                0
            };
            let total_h = implicit_h + hydrogen_count as u8;
            let count = if conjugated {
                degree as i32 + implicit_h as i32 - charge as i32 + 1
            } else {
                degree as i32 + implicit_h as i32 - charge as i32 + 2
            };
            (charge, implicit_h, total_h, assign_geometry(count.max(0) as usize))
        }
        Element::S => {
            let mut charge = file_charge;
            if assign_charge && !assign_h {
                charge = if valence <= 3 && bonded_element_count(s, i, Element::O) == 0 {
                    valence as i8 - 2
                } else {
                    0
                };
            }
            let implicit_h = if assign_h && valence < 2 {
                (2i32 - valence as i32 + charge as i32).max(0) as u8
            } else {
                0
            };
            let total_h = implicit_h + hydrogen_count as u8;
            let geometry = if valence <= 3 {
                let count = degree as i32 + implicit_h as i32 - charge as i32 + 2;
                assign_geometry(count.max(0) as usize)
            } else {
                AtomGeometry::Unknown
            };
            (charge, implicit_h, total_h, geometry)
        }
        Element::P => (file_charge, 0, hydrogen_count as u8, assign_geometry(degree)),
        e if is_halogen(e) => {
            let charge = if assign_charge {
                valence as i8 - 1
            } else {
                file_charge
            };
            (charge, 0, hydrogen_count as u8, assign_geometry(degree))
        }
        Element::Li | Element::Na | Element::K | Element::Rb | Element::Cs | Element::Fr => {
            let charge = if assign_charge {
                1 - valence as i8
            } else {
                file_charge
            };
            (charge, 0, 0, assign_geometry(degree))
        }
        Element::Be
        | Element::Mg
        | Element::Ca
        | Element::Sr
        | Element::Ba
        | Element::Ra => {
            let charge = if assign_charge {
                2 - valence as i8
            } else {
                file_charge
            };
            (charge, 0, 0, assign_geometry(degree))
        }
        e if is_metal(e) => (file_charge, 0, 0, assign_geometry(degree)),
        e => {
            debug!(
                "No valence rules for element {e:?}, keeping the file charge for atom {}",
                s.atom_names[i as usize]
            );
            (file_charge, 0, hydrogen_count as u8, assign_geometry(degree))
        }
    }
}

/// Whether the atom sits in a conjugated environment: aromatic itself, or
/// an N/O next to an aromatic atom or to an sp2-like carbon (one carrying
/// a terminal oxygen or at least two nitrogens). Neighboring sulfur and
/// phosphorus groups do not count.
fn is_conjugated(s: &Structure, i: u32) -> bool {
    if s.atom_aromatic[i as usize] {
        return true;
    }
    let element = s.elements[i as usize];
    if element != Element::N && element != Element::O {
        return false;
    }
    let bonds = s.bonds.neighbors(i);
    if bonds.len() >= 4 {
        return false;
    }
    for &j in bonds {
        match s.elements[j as usize] {
            Element::C => {
                if s.atom_aromatic[j as usize]
                    || terminal_oxygens(s, j, i).next().is_some()
                    || bonded_element_count(s, j, Element::N) >= 2
                {
                    return true;
                }
            }
            Element::N => {
                if s.atom_aromatic[j as usize] {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// A terminal oxygen on a carbon, sulfur or phosphorus center that already
/// has another terminal oxygen with a lower atom index. One oxygen of the
/// group keeps its proton, the rest carry the negative charge.
fn is_charged_terminal_oxygen(s: &Structure, i: u32) -> bool {
    let bonds = s.bonds.neighbors(i);
    let Some(&parent) = bonds.first() else {
        return false;
    };
    if !matches!(
        s.elements[parent as usize],
        Element::C | Element::S | Element::P
    ) {
        return false;
    }
    let mut count = 0;
    let mut lowest = u32::MAX;
    for j in terminal_oxygens(s, parent, u32::MAX) {
        count += 1;
        lowest = lowest.min(j);
    }
    count >= 2 && i != lowest
}

/// Terminal oxygens bonded to `center`, excluding `skip`.
fn terminal_oxygens<'a>(
    s: &'a Structure,
    center: u32,
    skip: u32,
) -> impl Iterator<Item = u32> + 'a {
    s.bonds.neighbors(center).iter().copied().filter(move |&j| {
        j != skip && s.elements[j as usize] == Element::O && s.bonds.degree(j) == 1
    })
}

fn bonded_to_sulfur_or_metal(s: &Structure, i: u32) -> bool {
    s.bonds.neighbors(i).iter().any(|&j| {
        let e = s.elements[j as usize];
        e == Element::S || is_metal(e)
    })
}

fn bonded_element_count(s: &Structure, i: u32, element: Element) -> usize {
    s.bonds
        .neighbors(i)
        .iter()
        .filter(|&&j| s.elements[j as usize] == element)
        .count()
}

fn standard_valence(s: &Structure, i: u32) -> Option<(i8, u8, AtomGeometry)> {
    let residue = s.residue_of_atom[i as usize] as usize;
    let resn = s.residue_names[residue].as_str();
    let name = s.atom_names[i as usize].as_str();

    if is_water(resn) {
        return if s.elements[i as usize] == Element::O {
            Some((0, 2, AtomGeometry::Tetrahedral))
        } else {
            None
        };
    }
    if is_standard_amino_acid(resn) {
        return amino_acid_valence(resn, name);
    }
    if is_standard_nucleic(resn) {
        return nucleic_valence(resn, name);
    }
    None
}

/// Known protonation states of amino acid nitrogen, oxygen and sulfur
/// atoms at physiological pH. Carbons go through the generic path.
fn amino_acid_valence(resn: &str, name: &str) -> Option<(i8, u8, AtomGeometry)> {
    use AtomGeometry::*;
    match name {
        "N" => Some(if resn == "PRO" {
            (0, 0, Trigonal)
        } else {
            (0, 1, Trigonal)
        }),
        "O" => Some((0, 0, Trigonal)),
        "OXT" => Some((-1, 0, Trigonal)),
        _ => match (resn, name) {
            ("ARG", "NE") => Some((0, 1, Trigonal)),
            ("ARG", "NH1") => Some((0, 2, Trigonal)),
            ("ARG", "NH2") => Some((1, 2, Trigonal)),
            ("LYS", "NZ") => Some((1, 3, Tetrahedral)),
            ("HIS", "ND1") => Some((0, 0, Trigonal)),
            ("HIS", "NE2") => Some((0, 1, Trigonal)),
            ("ASP", "OD1") => Some((0, 0, Trigonal)),
            ("ASP", "OD2") => Some((-1, 0, Trigonal)),
            ("GLU", "OE1") => Some((0, 0, Trigonal)),
            ("GLU", "OE2") => Some((-1, 0, Trigonal)),
            ("ASN", "OD1") => Some((0, 0, Trigonal)),
            ("ASN", "ND2") => Some((0, 2, Trigonal)),
            ("GLN", "OE1") => Some((0, 0, Trigonal)),
            ("GLN", "NE2") => Some((0, 2, Trigonal)),
            ("SER", "OG") => Some((0, 1, Tetrahedral)),
            ("THR", "OG1") => Some((0, 1, Tetrahedral)),
            ("TYR", "OH") => Some((0, 1, Trigonal)),
            ("CYS", "SG") => Some((0, 1, Tetrahedral)),
            ("MET", "SD") => Some((0, 0, Tetrahedral)),
            ("MSE", "SE") => Some((0, 0, Tetrahedral)),
            ("SEC", "SE") => Some((0, 1, Tetrahedral)),
            ("TRP", "NE1") => Some((0, 1, Trigonal)),
            _ => None,
        },
    }
}

/// Known protonation states of nucleotide heteroatoms. The sugar oxygens
/// are genuinely sp3 and come out right from the generic path.
fn nucleic_valence(resn: &str, name: &str) -> Option<(i8, u8, AtomGeometry)> {
    use AtomGeometry::*;
    match name {
        "OP1" => return Some((0, 0, Trigonal)),
        "OP2" | "OP3" => return Some((-1, 0, Trigonal)),
        _ => {}
    }
    let base = resn.strip_prefix('D').unwrap_or(resn);
    match (base, name) {
        ("A", "N1" | "N3" | "N7" | "N9") => Some((0, 0, Trigonal)),
        ("A", "N6") => Some((0, 2, Trigonal)),
        ("G", "N1") => Some((0, 1, Trigonal)),
        ("G", "N2") => Some((0, 2, Trigonal)),
        ("G", "N3" | "N7" | "N9") => Some((0, 0, Trigonal)),
        ("G", "O6") => Some((0, 0, Trigonal)),
        ("C", "N1" | "N3") => Some((0, 0, Trigonal)),
        ("C", "N4") => Some((0, 2, Trigonal)),
        ("C", "O2") => Some((0, 0, Trigonal)),
        ("U" | "T", "N1") => Some((0, 0, Trigonal)),
        ("U" | "T", "N3") => Some((0, 1, Trigonal)),
        ("U" | "T", "O2" | "O4") => Some((0, 0, Trigonal)),
        ("I", "N1") => Some((0, 1, Trigonal)),
        ("I", "N3" | "N7" | "N9") => Some((0, 0, Trigonal)),
        ("I", "O6") => Some((0, 0, Trigonal)),
        _ => None,
    }
}
