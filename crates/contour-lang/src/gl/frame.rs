use crate::context::{Activation, CallSite};
use crate::gl::context::GlContext;
use crate::gl::types::GlValue;

/// Activation record for one symbolic call. Slots hold typed values; the
/// parent link is the calling frame, so the frame tree mirrors the call tree.
pub struct GlFrame<'a> {
    slots: Vec<Option<GlValue>>,
    context: &'a GlContext,
    parent: Option<&'a GlFrame<'a>>,
    call_site: CallSite,
    depth: usize,
}

impl<'a> GlFrame<'a> {
    pub fn make(
        nslots: usize,
        context: &'a GlContext,
        parent: Option<&'a GlFrame<'a>>,
        call_site: CallSite,
    ) -> Self {
        let depth = parent.map_or(0, |p| p.depth + 1);
        Self { slots: vec![None; nslots], context, parent, call_site, depth }
    }

    /// Outermost frame of a compilation.
    pub fn root(nslots: usize, context: &'a GlContext) -> Self {
        Self::make(nslots, context, None, CallSite::default())
    }

    pub fn context(&self) -> &'a GlContext { self.context }
    pub fn parent(&self) -> Option<&'a GlFrame<'a>> { self.parent }
    pub fn depth(&self) -> usize { self.depth }
    pub fn len(&self) -> usize { self.slots.len() }
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn get(&self, slot: usize) -> Option<&GlValue> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn set(&mut self, slot: usize, value: GlValue) {
        self.slots[slot] = Some(value);
    }
}

impl Activation for GlFrame<'_> {
    fn call_site(&self) -> &CallSite { &self.call_site }
    fn caller(&self) -> Option<&Self> { self.parent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::types::GlType;
    use crate::options::Options;

    #[test]
    fn child_frames_count_depth_and_start_empty() {
        let cx = GlContext::new(Options::default());
        let root = GlFrame::root(1, &cx);
        let child = GlFrame::make(3, &cx, Some(&root), CallSite::default());
        assert_eq!(root.depth(), 0);
        assert_eq!(child.depth(), 1);
        assert_eq!(child.len(), 3);
        assert!((0..3).all(|i| child.get(i).is_none()));
    }

    #[test]
    fn sibling_frames_do_not_share_slots() {
        let cx = GlContext::new(Options::default());
        let root = GlFrame::root(0, &cx);
        let mut a = GlFrame::make(1, &cx, Some(&root), CallSite::default());
        let mut b = GlFrame::make(1, &cx, Some(&root), CallSite::default());
        a.set(0, GlValue::input(GlType::Vec2, "P"));
        b.set(0, GlValue::num(1.0));
        assert_eq!(a.get(0).map(|v| v.ty), Some(GlType::Vec2));
        assert_eq!(b.get(0).map(|v| v.ty), Some(GlType::Num));
    }
}
