// ── Field domain type ──

use serde::{Deserialize, Serialize};

pub type FieldId = u32;

/// One physical competition area inside a field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
}

impl Field {
    pub fn new(id: FieldId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Locate a field by id. The first match wins when ids repeat.
///
/// Returns the field together with its 1-based position in `fields`.
pub fn find_field(fields: &[Field], id: FieldId) -> Option<(u32, &Field)> {
    fields
        .iter()
        .enumerate()
        .find(|(_, field)| field.id == id)
        .and_then(|(index, field)| Some((u32::try_from(index + 1).ok()?, field)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_duplicate_wins() {
        let fields = vec![Field::new(3, "A"), Field::new(3, "B")];
        let (seq, field) = find_field(&fields, 3).unwrap();
        assert_eq!(seq, 1);
        assert_eq!(field.name, "A");
        assert!(find_field(&fields, 4).is_none());
    }
}
