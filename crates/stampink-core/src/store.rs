//! Session document: base image, overlay collections and selection.

use crate::elements::{
    Attribute, ElementId, ElementKind, ElementRef, ElementView, ImageHandle, TextElement,
    WatermarkElement,
};
use crate::error::{EditorError, EditorResult};
use kurbo::Size;

/// The uploaded photo everything is composited onto.
#[derive(Debug, Clone)]
pub struct BaseImage {
    /// Decoded bitmap at native resolution.
    pub bitmap: ImageHandle,
    /// Original encoded bytes, kept so export can re-decode at full fidelity.
    pub encoded: Vec<u8>,
    /// File name it was uploaded with.
    pub name: Option<String>,
}

impl BaseImage {
    pub fn new(bitmap: ImageHandle, encoded: Vec<u8>, name: Option<String>) -> Self {
        Self {
            bitmap,
            encoded,
            name,
        }
    }

    /// Native pixel size.
    pub fn size(&self) -> Size {
        self.bitmap.size()
    }
}

/// Holds the base image, all overlays in insertion order, and the active element.
///
/// Every mutation sets a dirty flag that the owner drains with
/// [`ElementStore::take_dirty`] to schedule a redraw.
#[derive(Debug, Default)]
pub struct ElementStore {
    base_image: Option<BaseImage>,
    watermarks: Vec<WatermarkElement>,
    texts: Vec<TextElement>,
    /// At most one active element across both kinds.
    active: Option<ElementRef>,
    next_watermark_id: ElementId,
    next_text_id: ElementId,
    /// Bumped on every base image change so renderers can cache derived pixels.
    base_generation: u64,
    dirty: bool,
}

impl ElementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_image(&self) -> Option<&BaseImage> {
        self.base_image.as_ref()
    }

    pub fn has_base_image(&self) -> bool {
        self.base_image.is_some()
    }

    /// Replace the base image. Clears all overlays, the selection and the id counters.
    pub fn set_base_image(&mut self, base: BaseImage) {
        log::info!(
            "Base image {:?} loaded ({}x{})",
            base.name.as_deref().unwrap_or("<unnamed>"),
            base.bitmap.width(),
            base.bitmap.height()
        );
        self.clear_elements();
        self.base_image = Some(base);
        self.base_generation += 1;
        self.dirty = true;
    }

    pub fn base_generation(&self) -> u64 {
        self.base_generation
    }

    /// Add a watermark with default placement and select it.
    pub fn add_watermark(
        &mut self,
        bitmap: ImageHandle,
        name: impl Into<String>,
    ) -> EditorResult<ElementId> {
        if !self.has_base_image() {
            log::warn!("Rejected watermark: no base image loaded");
            return Err(EditorError::NO_BASE_IMAGE);
        }
        let id = self.next_watermark_id;
        self.next_watermark_id += 1;
        let watermark = WatermarkElement::new(id, bitmap, name);
        log::info!("Added watermark #{id} ({:?})", watermark.name);
        self.watermarks.push(watermark);
        self.active = Some(ElementRef::watermark(id));
        self.dirty = true;
        Ok(id)
    }

    /// Add a text label with default styling and select it.
    pub fn add_text(&mut self, content: impl Into<String>) -> EditorResult<ElementId> {
        if !self.has_base_image() {
            log::warn!("Rejected text: no base image loaded");
            return Err(EditorError::NO_BASE_IMAGE);
        }
        let id = self.next_text_id;
        self.next_text_id += 1;
        self.texts.push(TextElement::new(id, content));
        log::info!("Added text #{id}");
        self.active = Some(ElementRef::text(id));
        self.dirty = true;
        Ok(id)
    }

    /// Edit an attribute of `target`.
    ///
    /// Only the active element can be edited; anything else (including a
    /// stale id) is a silent no-op. Returns `true` if the element changed.
    pub fn update_attribute(&mut self, target: ElementRef, attribute: Attribute) -> bool {
        if self.active != Some(target) {
            log::debug!("Ignored {} edit on inactive {target}", attribute.field());
            return false;
        }
        let changed = match target.kind {
            ElementKind::Watermark => self
                .watermarks
                .iter_mut()
                .find(|w| w.id == target.id)
                .is_some_and(|w| w.apply(&attribute)),
            ElementKind::Text => self
                .texts
                .iter_mut()
                .find(|t| t.id == target.id)
                .is_some_and(|t| t.apply(&attribute)),
        };
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Edit an attribute of whichever element is active.
    pub fn update_active(&mut self, attribute: Attribute) -> bool {
        match self.active {
            Some(target) => self.update_attribute(target, attribute),
            None => false,
        }
    }

    /// Remove an element. Clears the selection if it was active.
    ///
    /// The element's bitmap is dropped with it. Unknown ids are ignored.
    pub fn remove(&mut self, target: ElementRef) -> bool {
        let removed = match target.kind {
            ElementKind::Watermark => {
                let before = self.watermarks.len();
                self.watermarks.retain(|w| w.id != target.id);
                self.watermarks.len() != before
            }
            ElementKind::Text => {
                let before = self.texts.len();
                self.texts.retain(|t| t.id != target.id);
                self.texts.len() != before
            }
        };
        if removed {
            log::info!("Removed {target}");
            if self.active == Some(target) {
                self.active = None;
            }
            self.dirty = true;
        }
        removed
    }

    /// Remove the active element, if any.
    pub fn remove_active(&mut self) -> bool {
        match self.active {
            Some(target) => self.remove(target),
            None => false,
        }
    }

    /// Set or clear the active element.
    ///
    /// Selecting an element of one kind deselects the other kind. Selecting
    /// an element that does not exist leaves the selection unchanged.
    pub fn select(&mut self, target: Option<ElementRef>) -> bool {
        if let Some(r) = target {
            if self.get(r).is_none() {
                return false;
            }
        }
        if self.active != target {
            self.active = target;
            self.dirty = true;
        }
        true
    }

    /// Currently active element.
    pub fn active(&self) -> Option<ElementRef> {
        self.active
    }

    /// Read-only view of the active element.
    pub fn active_element(&self) -> Option<ElementView<'_>> {
        self.active.and_then(|r| self.get(r))
    }

    /// Look up an element of either kind.
    pub fn get(&self, target: ElementRef) -> Option<ElementView<'_>> {
        match target.kind {
            ElementKind::Watermark => self.watermark(target.id).map(ElementView::Watermark),
            ElementKind::Text => self.text(target.id).map(ElementView::Text),
        }
    }

    pub fn watermark(&self, id: ElementId) -> Option<&WatermarkElement> {
        self.watermarks.iter().find(|w| w.id == id)
    }

    pub fn text(&self, id: ElementId) -> Option<&TextElement> {
        self.texts.iter().find(|t| t.id == id)
    }

    /// Watermarks in insertion order.
    pub fn watermarks(&self) -> &[WatermarkElement] {
        &self.watermarks
    }

    /// Text labels in insertion order.
    pub fn texts(&self) -> &[TextElement] {
        &self.texts
    }

    /// Element references in render order (back to front): watermarks, then text.
    pub fn render_order(&self) -> impl Iterator<Item = ElementRef> + '_ {
        self.watermarks
            .iter()
            .map(|w| ElementRef::watermark(w.id))
            .chain(self.texts.iter().map(|t| ElementRef::text(t.id)))
    }

    pub fn element_count(&self) -> usize {
        self.watermarks.len() + self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Next id that will be assigned to a new element of `kind`.
    pub fn next_id(&self, kind: ElementKind) -> ElementId {
        match kind {
            ElementKind::Watermark => self.next_watermark_id,
            ElementKind::Text => self.next_text_id,
        }
    }

    /// Clear everything: base image, overlays, selection and id counters.
    pub fn reset(&mut self) {
        log::info!("Session reset");
        self.clear_elements();
        self.base_image = None;
        self.base_generation += 1;
        self.dirty = true;
    }

    /// Whether anything changed since the last call; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn clear_elements(&mut self) {
        self.watermarks.clear();
        self.texts.clear();
        self.active = None;
        self.next_watermark_id = 0;
        self.next_text_id = 0;
    }
}
