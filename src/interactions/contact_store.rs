use super::contacts::ContactType;

/// Append-only columnar store of typed atom-pair contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactStore {
    index1: Vec<u32>,
    index2: Vec<u32>,
    types: Vec<ContactType>,
}

impl ContactStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored contacts.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// `true` if no contacts are stored.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Append a contact between two atoms.
    pub fn add_contact(&mut self, index1: u32, index2: u32, contact_type: ContactType) {
        self.index1.push(index1);
        self.index2.push(index2);
        self.types.push(contact_type);
    }

    /// First atom of each contact.
    pub fn index1(&self) -> &[u32] {
        &self.index1
    }

    /// Second atom of each contact.
    pub fn index2(&self) -> &[u32] {
        &self.index2
    }

    /// The atom pair of the contact at `index`.
    pub fn atom_indices(&self, index: usize) -> (u32, u32) {
        (self.index1[index], self.index2[index])
    }

    /// The type of the contact at `index`.
    pub fn contact_type(&self, index: usize) -> ContactType {
        self.types[index]
    }
}
