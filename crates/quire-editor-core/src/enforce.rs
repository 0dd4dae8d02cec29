//! Post-mutation constraint enforcement for embedded images.
//!
//! Every mutation is followed by this pass. It folds parsed pixel
//! attributes into style sizing, clamps sizes to the configured bounds, and
//! gives every image a stable interaction handle so it stays individually
//! selectable. Running the pass twice in a row is a no-op.

use crate::config::InsertLimits;
use crate::document::Document;

/// Issues interaction handles. Handles are never reused within a session;
/// opening a document resumes numbering above the highest handle it carries.
#[derive(Debug, Clone, Default)]
pub struct HandleAllocator {
    last: u32,
}

impl HandleAllocator {
    pub fn allocate(&mut self) -> u32 {
        self.last += 1;
        self.last
    }

    pub fn resume_above(&mut self, handle: u32) {
        self.last = self.last.max(handle);
    }
}

/// Normalize every image in the tree. Returns how many images changed.
pub fn enforce_constraints(
    doc: &mut Document,
    limits: &InsertLimits,
    handles: &mut HandleAllocator,
) -> usize {
    // Existing handles first, so fresh allocations never collide.
    doc.for_each_image(&mut |image| {
        if let Some(handle) = image.handle {
            handles.resume_above(handle);
        }
    });

    let mut changed = 0usize;
    doc.for_each_image_mut(&mut |image| {
        let before = image.clone();
        if image.width.is_none() {
            image.width = image.attr_width;
        }
        if image.height.is_none() {
            image.height = image.attr_height;
        }
        image.attr_width = None;
        image.attr_height = None;
        image.width = image
            .width
            .map(|w| w.clamp(limits.min_image_size, limits.max_image_width));
        image.height = image
            .height
            .map(|h| h.clamp(limits.min_image_size, limits.max_image_height));
        if image.handle.is_none() {
            image.handle = Some(handles.allocate());
        }
        if *image != before {
            changed += 1;
        }
    });
    changed
}
