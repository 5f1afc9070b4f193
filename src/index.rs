//! Identifier indexes.
//!
//! The ledger has no scan primitive, so every entity kind keeps an
//! append-only list of its identifiers under a well-known key. The list is
//! re-read from the store on every access; an absent key is an empty index.

use crate::codec;
use crate::entity::EntityKind;
use crate::error::Result;
use crate::store::RecordStore;
use log::debug;

/// Reads the identifier index for `kind`.
pub fn read<S: RecordStore + ?Sized>(store: &S, kind: EntityKind) -> Result<Vec<String>> {
    match store.get(kind.index_key())? {
        Some(bytes) => codec::decode_index(kind, &bytes),
        None => Ok(Vec::new()),
    }
}

/// Appends `id` to the index for `kind`, returning the new index length.
pub fn append<S: RecordStore + ?Sized>(store: &mut S, kind: EntityKind, id: &str) -> Result<usize> {
    let mut ids = read(&*store, kind)?;
    ids.push(id.to_string());

    store.put(kind.index_key(), codec::encode_index(kind, &ids)?)?;

    debug!("Indexed {} {} ({} total)", kind, id, ids.len());
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoyaltyError;
    use crate::store::MemoryStore;

    #[test]
    fn test_absent_index_is_empty() {
        let store = MemoryStore::new();
        assert!(read(&store, EntityKind::Customer).unwrap().is_empty());
    }

    #[test]
    fn test_append_preserves_order_per_kind() {
        let mut store = MemoryStore::new();
        assert_eq!(append(&mut store, EntityKind::Customer, "CU0000002").unwrap(), 1);
        assert_eq!(append(&mut store, EntityKind::Customer, "CU0000001").unwrap(), 2);
        assert_eq!(append(&mut store, EntityKind::Item, "IT0000001").unwrap(), 1);

        assert_eq!(
            read(&store, EntityKind::Customer).unwrap(),
            vec!["CU0000002".to_string(), "CU0000001".to_string()]
        );
        assert_eq!(read(&store, EntityKind::Item).unwrap(), vec!["IT0000001".to_string()]);
        assert!(read(&store, EntityKind::PointOfSale).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_index_fails_append() {
        let mut store = MemoryStore::new();
        store.put("posIDs", b"[1,2,3]".to_vec()).unwrap();

        let err = append(&mut store, EntityKind::PointOfSale, "PS0000001").unwrap_err();
        assert!(matches!(err, LoyaltyError::CorruptRecord { ref key, .. } if key == "posIDs"));
        assert_eq!(store.get("posIDs").unwrap(), Some(b"[1,2,3]".to_vec()));
    }
}
