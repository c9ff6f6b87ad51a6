//! The transaction primitive: produce the next document revision from the current one.
//!
//! Whoever owns replication supplies the implementation. The core never mutates a snapshot in place, it hands an
//! updater to [`Transact::change`] and forwards the resulting revision to the [`Store`](crate::store::Store).

use crate::document::DrawingDocument;

pub trait Transact: Send + Sync {
    /// Run `updater` against a mutable draft of `document`, returning the new revision.
    /// `document` itself is left untouched.
    fn change(
        &self,
        document: &DrawingDocument,
        updater: &mut dyn FnMut(&mut DrawingDocument),
    ) -> DrawingDocument;
}

/// In-process transactions: the draft is a plain clone.
#[derive(Copy, Clone, Debug, Default)]
pub struct LocalTransact;
impl Transact for LocalTransact {
    fn change(
        &self,
        document: &DrawingDocument,
        updater: &mut dyn FnMut(&mut DrawingDocument),
    ) -> DrawingDocument {
        let mut draft = document.clone();
        updater(&mut draft);
        draft
    }
}

#[cfg(test)]
mod test {
    use super::{LocalTransact, Transact};
    use crate::document::DrawingDocument;

    #[test]
    fn source_untouched() {
        let original = DrawingDocument::new([10, 10]);
        let changed = LocalTransact.change(&original, &mut |draft| draft.set_size([20, 20]));
        assert_eq!(original.size(), [10, 10]);
        assert_eq!(changed.size(), [20, 20]);
    }
}
