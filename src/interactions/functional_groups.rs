//! Recognition of small charged and polar groups on the bond graph.

use pdbtbx::Element;

use crate::structure::{is_halogen, AtomView};

fn heavy_degree(atom: AtomView<'_>) -> usize {
    atom.bonded_heavy_atoms().count()
}

/// Nitrogen bonded to four heavy atoms.
pub fn is_quaternary_amine(atom: AtomView<'_>) -> bool {
    atom.element() == Element::N
        && atom.bonded_atoms().len() == 4
        && atom.bonded_element_count(Element::H) == 0
}

/// Nitrogen bonded to three heavy atoms and no explicit hydrogen.
pub fn is_tertiary_amine(atom: AtomView<'_>) -> bool {
    atom.element() == Element::N
        && heavy_degree(atom) == 3
        && atom.bonded_element_count(Element::H) == 0
}

/// Sulfur bonded to three heavy atoms, as in methionine sulfonium.
pub fn is_sulfonium(atom: AtomView<'_>) -> bool {
    atom.element() == Element::S
        && atom.bonded_atoms().len() == 3
        && atom.bonded_element_count(Element::H) == 0
}

/// Sulfur of a sulfonic acid or sulfonate group.
pub fn is_sulfonic_acid(atom: AtomView<'_>) -> bool {
    atom.element() == Element::S && atom.bonded_element_count(Element::O) == 3
}

/// Sulfur of a sulfate group.
pub fn is_sulfate(atom: AtomView<'_>) -> bool {
    atom.element() == Element::S && atom.bonded_element_count(Element::O) == 4
}

/// Phosphorus bonded exclusively to oxygen.
pub fn is_phosphate(atom: AtomView<'_>) -> bool {
    let degree = atom.bonded_atoms().len();
    atom.element() == Element::P && degree > 0 && atom.bonded_element_count(Element::O) == degree
}

/// Halogen with a single bond to carbon.
pub fn is_halocarbon(atom: AtomView<'_>) -> bool {
    is_halogen(atom.element()) && atom.bonded_element_count(Element::C) == 1
}

/// Carbon of a carboxylate or carboxylic acid group. Both oxygens must be
/// terminal so esters do not match.
pub fn is_carboxylate(atom: AtomView<'_>) -> bool {
    if atom.element() != Element::C
        || atom.bonded_element_count(Element::O) != 2
        || atom.bonded_element_count(Element::C) != 1
    {
        return false;
    }
    let terminal_oxygens = atom
        .bonded()
        .filter(|b| b.element() == Element::O && heavy_degree(*b) == 1)
        .count();
    terminal_oxygens == 2
}

/// Central carbon of a guanidine group with two terminal nitrogens.
pub fn is_guanidine(atom: AtomView<'_>) -> bool {
    if atom.element() != Element::C
        || atom.bonded_atoms().len() != 3
        || atom.bonded_element_count(Element::N) != 3
    {
        return false;
    }
    let terminal_nitrogens = atom
        .bonded()
        .filter(|b| heavy_degree(*b) == 1)
        .count();
    terminal_nitrogens == 2
}

/// Central carbon of an acetamidine group with two terminal nitrogens.
pub fn is_acetamidine(atom: AtomView<'_>) -> bool {
    if atom.element() != Element::C
        || atom.bonded_atoms().len() != 3
        || atom.bonded_element_count(Element::N) != 2
        || atom.bonded_element_count(Element::C) != 1
    {
        return false;
    }
    let terminal_nitrogens = atom
        .bonded()
        .filter(|b| b.element() == Element::N && heavy_degree(*b) == 1)
        .count();
    terminal_nitrogens == 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Structure, StructureBuilder};

    fn ligand(atoms: &[(&str, Element, (f64, f64, f64))]) -> Structure {
        let mut builder = StructureBuilder::new();
        builder.start_model(1);
        builder.start_chain("A");
        builder.start_residue("LIG", 1, "");
        for &(name, element, position) in atoms {
            builder.add_atom(name, element, position);
        }
        builder.finish()
    }

    #[test]
    fn test_carboxylate() {
        let structure = ligand(&[
            ("C1", Element::C, (-1.52, 0.0, 0.0)),
            ("C2", Element::C, (0.0, 0.0, 0.0)),
            ("O1", Element::O, (0.596, 1.098, 0.0)),
            ("O2", Element::O, (0.596, -1.098, 0.0)),
        ]);
        assert!(is_carboxylate(structure.atom(1)));
        assert!(!is_carboxylate(structure.atom(0)));
    }

    #[test]
    fn test_ester_is_not_carboxylate() {
        // the bridging oxygen carries a second carbon
        let structure = ligand(&[
            ("C1", Element::C, (-1.52, 0.0, 0.0)),
            ("C2", Element::C, (0.0, 0.0, 0.0)),
            ("O1", Element::O, (0.596, 1.098, 0.0)),
            ("O2", Element::O, (0.596, -1.098, 0.0)),
            ("C3", Element::C, (2.0, -1.32, 0.0)),
        ]);
        assert!(!is_carboxylate(structure.atom(1)));
    }

    #[test]
    fn test_guanidine() {
        let structure = ligand(&[
            ("CZ", Element::C, (0.0, 0.0, 0.0)),
            ("NE", Element::N, (0.0, 1.33, 0.0)),
            ("NH1", Element::N, (1.15, -0.66, 0.0)),
            ("NH2", Element::N, (-1.15, -0.66, 0.0)),
            ("CD", Element::C, (1.24, 2.12, 0.0)),
        ]);
        assert!(is_guanidine(structure.atom(0)));
        assert!(!is_acetamidine(structure.atom(0)));
    }

    #[test]
    fn test_phosphate_and_sulfate() {
        let phosphate = ligand(&[
            ("P", Element::P, (0.0, 0.0, 0.0)),
            ("O1", Element::O, (1.49, 0.0, 0.0)),
            ("O2", Element::O, (-0.5, 1.4, 0.0)),
            ("O3", Element::O, (-0.5, -0.7, 1.21)),
            ("O4", Element::O, (-0.5, -0.7, -1.21)),
        ]);
        assert!(is_phosphate(phosphate.atom(0)));
        assert!(!is_sulfate(phosphate.atom(0)));

        let sulfate = ligand(&[
            ("S", Element::S, (0.0, 0.0, 0.0)),
            ("O1", Element::O, (1.47, 0.0, 0.0)),
            ("O2", Element::O, (-0.49, 1.39, 0.0)),
            ("O3", Element::O, (-0.49, -0.69, 1.2)),
            ("O4", Element::O, (-0.49, -0.69, -1.2)),
        ]);
        assert!(is_sulfate(sulfate.atom(0)));
        assert!(!is_sulfonic_acid(sulfate.atom(0)));
    }

    #[test]
    fn test_halocarbon() {
        let structure = ligand(&[
            ("C1", Element::C, (0.0, 0.0, 0.0)),
            ("CL1", Element::Cl, (1.77, 0.0, 0.0)),
        ]);
        assert!(is_halocarbon(structure.atom(1)));
        assert!(!is_halocarbon(structure.atom(0)));
    }
}
