use pdbtbx::Element;

/// Fallback van der Waals radius in angstroms for elements the periodic
/// table data has no value for.
pub const DEFAULT_VDW_RADIUS: f64 = 2.0;

/// Van der Waals radius in angstroms.
pub fn vdw_radius(element: Element) -> f64 {
    element
        .atomic_radius()
        .van_der_waals
        .unwrap_or(DEFAULT_VDW_RADIUS)
}

/// Single-bond covalent radius in angstroms.
pub fn covalent_radius(element: Element) -> f64 {
    element.atomic_radius().covalent_single
}

/// All halogens.
pub fn is_halogen(element: Element) -> bool {
    matches!(
        element,
        Element::F | Element::Cl | Element::Br | Element::I | Element::At
    )
}

/// Halogens heavy enough to develop a sigma hole; fluorine does not.
pub fn is_halogen_bond_donor(element: Element) -> bool {
    matches!(
        element,
        Element::Cl | Element::Br | Element::I | Element::At
    )
}

/// Transition metals in the Sc-Cu, Y-Ag and Hf-Au blocks, plus the group
/// 12 metals Zn and Cd which coordinate the same way.
pub fn is_transition_metal(element: Element) -> bool {
    let n = element.atomic_number();
    (21..=29).contains(&n)
        || (39..=47).contains(&n)
        || (72..=79).contains(&n)
        || matches!(element, Element::Zn | Element::Cd)
}

/// Metals that bind their partners mostly electrostatically, without a
/// directional coordination sphere.
pub fn is_ionic_type_metal(element: Element) -> bool {
    matches!(
        element,
        Element::Li
            | Element::Na
            | Element::K
            | Element::Rb
            | Element::Cs
            | Element::Mg
            | Element::Ca
            | Element::Sr
            | Element::Ba
            | Element::Al
            | Element::Ga
            | Element::In
            | Element::Tl
            | Element::Sc
            | Element::Sn
            | Element::Pb
            | Element::Bi
            | Element::Sb
            | Element::Hg
    )
}

/// Any metal this crate treats as such: the ionic type metals and the
/// transition metal blocks, plus the remaining alkali and alkaline earth
/// elements.
pub fn is_metal(element: Element) -> bool {
    is_ionic_type_metal(element)
        || is_transition_metal(element)
        || matches!(element, Element::Be | Element::Fr | Element::Ra)
}
