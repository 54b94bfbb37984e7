mod charged;
mod contact_store;
mod functional_groups;
mod geometry;
mod halogen_bonds;
mod hydrogen_bonds;
mod hydrophobic;
mod metal_binding;
mod refine;

pub mod contacts;
pub mod features;

// Re-exports
pub use contact_store::ContactStore;
pub use contacts::{
    calculate_contacts, contact_entries, get_contact_data, ContactData, ContactDataParams,
    ContactEntry, ContactError, ContactParams, ContactType, FrozenContacts, InteractingAtom,
};
pub use features::{calculate_features, FeatureGroup, FeatureType, Features};
