//! Run-time storage for binding cache slots.

use ember_core::{ObjectRef, RuntimeError};

/// One cell per cache slot of a unit.
///
/// A cell is empty until the first call through it constructs its object;
/// after that it keeps the object for as long as the owning instance lives.
#[derive(Debug, Default)]
pub struct SlotCells {
    cells: Vec<Option<ObjectRef>>,
}

impl SlotCells {
    /// Create `count` empty cells.
    pub fn new(count: usize) -> Self {
        Self {
            cells: vec![None; count],
        }
    }

    /// The object in a cell, if it has been constructed.
    pub fn get(&self, index: u16) -> Result<Option<&ObjectRef>, RuntimeError> {
        self.cells
            .get(index as usize)
            .map(Option::as_ref)
            .ok_or_else(|| RuntimeError::bytecode(format!("cache slot {index} out of range")))
    }

    /// Store a freshly constructed object.
    pub fn set(&mut self, index: u16, object: ObjectRef) -> Result<(), RuntimeError> {
        let cell = self
            .cells
            .get_mut(index as usize)
            .ok_or_else(|| RuntimeError::bytecode(format!("cache slot {index} out of range")))?;
        *cell = Some(object);
        Ok(())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells holding an object.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_start_empty() {
        let cells = SlotCells::new(2);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells.filled(), 0);
        assert!(cells.get(1).unwrap().is_none());
    }

    #[test]
    fn set_then_get_returns_same_object() {
        let mut cells = SlotCells::new(1);
        let object = ObjectRef::new(Box::new(5_i32));
        cells.set(0, object.clone()).unwrap();

        assert!(cells.get(0).unwrap().unwrap().ptr_eq(&object));
        assert_eq!(cells.filled(), 1);
    }

    #[test]
    fn out_of_range_is_bytecode_error() {
        let mut cells = SlotCells::new(1);
        assert!(matches!(
            cells.get(3),
            Err(RuntimeError::InvalidBytecode { .. })
        ));
        assert!(cells.set(1, ObjectRef::new(Box::new(()))).is_err());
    }
}
