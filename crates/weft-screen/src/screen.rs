#![forbid(unsafe_code)]

//! The screen context.
//!
//! A [`Screen`] owns everything one terminal session needs: the node tree,
//! the displayed/pending frame pair, the grapheme pool and the render
//! request state. Nothing is shared between screens, so independent
//! sessions can coexist in one process.
//!
//! # Render passes
//!
//! A pass runs the pre-render hook, composes into the pending grid, commits
//! resolved boxes, diffs against the displayed grid and swaps. If
//! composition fails the pass stops before the diff: the displayed grid and
//! every cached box stay as they were after the last successful pass.
//!
//! Render requests made through a [`RenderHandle`] while a pass is active
//! are deferred until it completes; repeated requests coalesce into one.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use weft_core::IRect;
use weft_layout::{ParentBox, PositionSpec, ResolvedBox};
use weft_render::buffer::Buffer;
use weft_render::diff::FrameDiff;
use weft_render::frame::FramePair;
use weft_render::grapheme_pool::GraphemePool;
use weft_render::presenter::{PresentStats, Presenter};
use weft_render::scroll::RowSpan;
use weft_render::sink::OutputSink;

use crate::compositor::{self, Composition};
use crate::config::ScreenConfig;
use crate::error::{ScreenError, StructuralReason};
use crate::node::{NodeFlags, NodeId, NodeKind, Tree};
use crate::style::NodeStyle;

/// Upper bound on passes run by one [`Screen::flush_renders`] call.
pub const MAX_FLUSH_PASSES: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
struct RenderState {
    active: bool,
    requested: bool,
    deferred: bool,
}

/// Cloneable handle for requesting renders of one screen.
#[derive(Debug, Clone, Default)]
pub struct RenderHandle {
    state: Rc<Cell<RenderState>>,
}

impl RenderHandle {
    /// Ask for a render. During an active pass the request is deferred until
    /// the pass completes; otherwise it coalesces with any pending request.
    pub fn request(&self) {
        let mut state = self.state.get();
        if state.active {
            if !state.deferred {
                tracing::trace!("render request deferred");
            }
            state.deferred = true;
        } else if state.requested {
            tracing::trace!("render request coalesced");
        } else {
            state.requested = true;
        }
        self.state.set(state);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.state.get().requested
    }

    /// Whether a pass is running.
    #[inline]
    pub fn is_rendering(&self) -> bool {
        self.state.get().active
    }

    fn begin(&self) {
        let mut state = self.state.get();
        debug_assert!(!state.active, "nested render pass");
        state.active = true;
        state.requested = false;
        self.state.set(state);
    }

    fn finish(&self) {
        let mut state = self.state.get();
        state.active = false;
        if state.deferred {
            state.deferred = false;
            state.requested = true;
        }
        self.state.set(state);
    }
}

type PrerenderHook = Box<dyn FnMut(&mut Tree, &RenderHandle)>;

/// One terminal session.
pub struct Screen {
    tree: Tree,
    frames: FramePair,
    pool: GraphemePool,
    config: ScreenConfig,
    /// Candidate spans registered by line operations since the last pass.
    pending_spans: Vec<RowSpan>,
    /// Visible boxes of the last successful pass, in paint order.
    paint_order: Vec<(NodeId, IRect)>,
    /// Next diff must rewrite every cell.
    repaint: bool,
    requests: RenderHandle,
    prerender: Option<PrerenderHook>,
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("nodes", &self.tree.len())
            .field("config", &self.config)
            .field("repaint", &self.repaint)
            .finish_non_exhaustive()
    }
}

impl Screen {
    pub fn new(width: u16, height: u16, config: ScreenConfig) -> Self {
        Self {
            tree: Tree::new(),
            frames: FramePair::new(width, height),
            pool: GraphemePool::new(),
            config,
            pending_spans: Vec::new(),
            paint_order: Vec::new(),
            repaint: true,
            requests: RenderHandle::default(),
            prerender: None,
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.frames.width()
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.frames.height()
    }

    #[inline]
    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Direct tree access. Position specs set this way are only checked
    /// when the next pass resolves them.
    #[inline]
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// What the terminal shows after the last successful pass.
    #[inline]
    pub fn displayed(&self) -> &Buffer {
        self.frames.displayed()
    }

    #[inline]
    pub fn pool(&self) -> &GraphemePool {
        &self.pool
    }

    /// Change the screen size. The next pass rewrites everything.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.frames.resize(width, height);
        self.paint_order.clear();
        self.pending_spans.clear();
        self.invalidate();
    }

    /// Forget what the terminal shows; the next pass rewrites every cell.
    pub fn invalidate(&mut self) {
        self.repaint = true;
    }

    // ── Node mutation ────────────────────────────────────────────────

    /// Replace a node's position spec after checking it for contradictions.
    pub fn set_position(&mut self, id: NodeId, spec: PositionSpec) -> Result<(), ScreenError> {
        let node = self.tree.node_mut(id)?;
        spec.validate(node.flags.contains(NodeFlags::SHRINK))
            .map_err(|source| ScreenError::Configuration { node: id, source })?;
        node.spec = spec;
        Ok(())
    }

    pub fn set_style(&mut self, id: NodeId, style: impl Into<Arc<NodeStyle>>) -> Result<(), ScreenError> {
        self.tree.node_mut(id)?.style = style.into();
        Ok(())
    }

    /// Replace a node's flags. Turning on `SHRINK` is rejected if it
    /// contradicts the node's current spec.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> Result<(), ScreenError> {
        let node = self.tree.node_mut(id)?;
        node.spec
            .validate(flags.contains(NodeFlags::SHRINK))
            .map_err(|source| ScreenError::Configuration { node: id, source })?;
        node.flags = flags;
        Ok(())
    }

    pub fn set_content(&mut self, id: NodeId, text: &str) -> Result<(), ScreenError> {
        self.tree.node_mut(id)?.set_content(text);
        Ok(())
    }

    /// Set the first visible line of a scrollable node, clamped to its
    /// content. Returns the new base.
    pub fn scroll_to(&mut self, id: NodeId, line: usize) -> Result<usize, ScreenError> {
        let node = self.tree.node_mut(id)?;
        let last = node.lines.len().saturating_sub(1);
        match &mut node.kind {
            NodeKind::ScrollableBox { base } => {
                *base = line.min(last);
                Ok(*base)
            }
            NodeKind::Box => Err(ScreenError::structural(id, StructuralReason::NotScrollable)),
        }
    }

    /// Move the scroll base by `delta` lines (negative scrolls back).
    pub fn scroll_by(&mut self, id: NodeId, delta: isize) -> Result<usize, ScreenError> {
        let base = self.tree.node(id)?.kind.scroll_base();
        self.scroll_to(id, base.saturating_add_signed(delta))
    }

    /// Insert a content line before `index` (clamped to the end).
    pub fn insert_line(&mut self, id: NodeId, index: usize, text: &str) -> Result<(), ScreenError> {
        let node = self.tree.node_mut(id)?;
        let index = index.min(node.lines.len());
        node.lines.insert(index, text.to_string());
        self.register_line_span(id, index);
        Ok(())
    }

    /// Delete content line `index`. Out-of-range indices are a no-op.
    pub fn delete_line(&mut self, id: NodeId, index: usize) -> Result<(), ScreenError> {
        let node = self.tree.node_mut(id)?;
        if index >= node.lines.len() {
            return Ok(());
        }
        node.lines.remove(index);
        if let NodeKind::ScrollableBox { base } = &mut node.kind {
            *base = (*base).min(node.lines.len().saturating_sub(1));
        }
        self.register_line_span(id, index);
        Ok(())
    }

    /// Register the rows from a line's current position to the bottom of the
    /// node's content box as a scroll candidate.
    fn register_line_span(&mut self, id: NodeId, index: usize) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        let Some(resolved) = node.last_box() else {
            return;
        };
        if resolved.clipped.x != 0 || resolved.clipped.width() != i32::from(self.width()) {
            return;
        }
        let content = resolved.content(node.style.insets());
        let visible = resolved.clipped.intersection(&content);
        let first = match node.kind {
            NodeKind::ScrollableBox { base } => index as i64 - base as i64,
            NodeKind::Box => index as i64,
        };
        let top = (i64::from(content.y) + first).max(i64::from(visible.y));
        let bottom = i64::from(visible.bottom()) - 1;
        if top < bottom {
            self.pending_spans.push(RowSpan::new(top as u16, bottom as u16));
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// A handle for requesting renders, usable from the pre-render hook.
    pub fn render_handle(&self) -> RenderHandle {
        self.requests.clone()
    }

    /// Install a hook run at the start of every pass, before composition.
    pub fn set_prerender_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&mut Tree, &RenderHandle) + 'static,
    {
        self.prerender = Some(Box::new(hook));
    }

    /// Run one pass and return the diff from the previous displayed frame.
    ///
    /// The diff may contain scroll operations; its cells are read from
    /// [`displayed`](Self::displayed), which is now the new frame.
    pub fn render(&mut self) -> Result<FrameDiff, ScreenError> {
        self.render_pass(true)
    }

    /// Run one pass and present it to `sink`.
    ///
    /// On an output error the presenter state is reset and the screen is
    /// invalidated, so the next pass repaints from scratch.
    pub fn render_to<S: OutputSink + ?Sized>(
        &mut self,
        presenter: &mut Presenter,
        sink: &mut S,
    ) -> Result<PresentStats, ScreenError> {
        let diff = self.render_pass(sink.supports_scroll())?;
        match presenter.present(&diff, self.frames.displayed(), &self.pool, sink) {
            Ok(stats) => Ok(stats),
            Err(err) => {
                tracing::warn!(error = %err, "present failed; screen invalidated");
                presenter.reset();
                self.invalidate();
                Err(ScreenError::Output(err))
            }
        }
    }

    /// Render while requests are outstanding, including requests deferred
    /// during a pass. Returns the number of passes run.
    ///
    /// At most [`MAX_FLUSH_PASSES`] passes run per call; a request still
    /// outstanding after that stays pending for the next call.
    pub fn flush_renders<S: OutputSink + ?Sized>(
        &mut self,
        presenter: &mut Presenter,
        sink: &mut S,
    ) -> Result<usize, ScreenError> {
        let mut passes = 0;
        while self.requests.is_requested() {
            if passes == MAX_FLUSH_PASSES {
                tracing::warn!(passes, "render requests still pending after flush limit");
                break;
            }
            self.render_to(presenter, sink)?;
            passes += 1;
        }
        Ok(passes)
    }

    fn render_pass(&mut self, scroll_allowed: bool) -> Result<FrameDiff, ScreenError> {
        let _span = tracing::debug_span!(
            "render_pass",
            width = self.width(),
            height = self.height(),
            nodes = self.tree.len()
        )
        .entered();

        self.requests.begin();
        let result = self.compose_and_diff(scroll_allowed);
        self.requests.finish();
        result
    }

    fn compose_and_diff(&mut self, scroll_allowed: bool) -> Result<FrameDiff, ScreenError> {
        if let Some(mut hook) = self.prerender.take() {
            hook(&mut self.tree, &self.requests);
            self.prerender = Some(hook);
        }

        let pending = self.frames.begin();
        let composition = match compositor::compose(&self.tree, &self.config, pending, &mut self.pool) {
            Ok(composition) => composition,
            Err(err) => {
                tracing::warn!(error = %err, "composition failed; displayed frame kept");
                return Err(err);
            }
        };
        let Composition { boxes, spans } = composition;

        self.tree.commit_boxes(&boxes);
        self.paint_order = boxes
            .iter()
            .filter(|(_, resolved)| !resolved.is_degenerate())
            .map(|(id, resolved)| (*id, resolved.clipped))
            .collect();

        let mut candidates = std::mem::take(&mut self.pending_spans);
        candidates.extend(spans);
        if self.config.full_screen_scroll && self.height() >= 2 {
            candidates.push(RowSpan::new(0, self.height() - 1));
        }
        let mut scroll = self.config.scroll;
        scroll.enabled &= scroll_allowed;

        let diff = if self.repaint {
            let mut blank = Buffer::new(self.width(), self.height());
            blank.fill(blank.bounds(), weft_render::cell::Cell::from_char('\0'));
            FrameDiff::compute(&blank, self.frames.pending())
        } else {
            let (displayed, pending) = self.frames.both();
            FrameDiff::compute_with_scroll(displayed, pending, &candidates, &scroll)
        };
        for op in diff.scrolls() {
            tracing::debug!(
                top = op.span.top,
                bottom = op.span.bottom,
                shift = ?op.shift,
                run = op.run,
                "scroll claimed"
            );
        }

        self.frames.swap();
        self.repaint = false;

        if self.pool.len() > self.config.pool_gc_threshold {
            let (displayed, pending) = self.frames.both();
            let freed = self.pool.gc([displayed, pending]);
            tracing::trace!(freed, remaining = self.pool.len(), "grapheme pool collected");
        }
        Ok(diff)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Topmost node whose last visible box contains the cell, or `None`
    /// outside the screen.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<NodeId> {
        let (x, y) = (i32::from(x), i32::from(y));
        self.paint_order
            .iter()
            .rev()
            .find(|(id, clipped)| clipped.contains(x, y) && self.resolved_box(*id).is_some())
            .map(|(id, _)| *id)
    }

    /// Box from the last successful pass.
    pub fn resolved_box(&self, id: NodeId) -> Option<ResolvedBox> {
        self.tree.get(id).and_then(|node| node.last_box().copied())
    }

    /// Resolve one node against the current tree without rendering.
    ///
    /// Sibling docking is not applied. Fails with a structural error for a
    /// node that is not attached to this screen's root.
    pub fn resolve_node(&self, id: NodeId) -> Result<ResolvedBox, ScreenError> {
        self.tree.node(id)?;
        if !self.tree.is_attached(id) {
            return Err(ScreenError::structural(id, StructuralReason::Detached));
        }

        let mut path = vec![id];
        let mut cursor = self.tree.parent(id);
        while let Some(ancestor) = cursor {
            path.push(ancestor);
            cursor = self.tree.parent(ancestor);
        }
        path.reverse();

        let mut parent = ParentBox::root(self.width(), self.height());
        for pair in path.windows(2) {
            let (ancestor, child) = (pair[0], pair[1]);
            let node = self.tree.node(ancestor)?;
            let resolved = compositor::resolve_one(&self.tree, &self.config, ancestor, node, &parent)?;
            let content = resolved.as_parent(node.style.insets());
            let fixed = self
                .tree
                .get(child)
                .is_some_and(|c| c.flags.contains(NodeFlags::FIXED));
            parent = if fixed {
                content
            } else {
                content.scrolled(node.kind.scroll_base() as i32)
            };
        }
        let node = self.tree.node(id)?;
        compositor::resolve_one(&self.tree, &self.config, id, node, &parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_layout::Dim;

    fn screen(w: u16, h: u16) -> Screen {
        Screen::new(w, h, ScreenConfig::default())
    }

    fn child(screen: &mut Screen, spec: PositionSpec, text: &str) -> NodeId {
        let root = screen.root();
        let tree = screen.tree_mut();
        let id = tree.create(NodeKind::Box);
        tree.append(root, id).expect("attach");
        screen.set_position(id, spec).expect("valid spec");
        screen.set_content(id, text).expect("live");
        id
    }

    #[test]
    fn first_pass_rewrites_everything() {
        let mut s = screen(4, 2);
        let diff = s.render().expect("render");
        assert_eq!(diff.regions().len(), 2);
        assert_eq!(diff.cell_count(), 8);

        let diff = s.render().expect("render");
        assert!(diff.is_empty());
    }

    #[test]
    fn set_position_rejects_contradictions() {
        let mut s = screen(10, 5);
        let id = child(&mut s, PositionSpec::new(), "");
        let bad = PositionSpec::new().width(Dim::percent(50.0)).left(0);
        s.set_flags(id, NodeFlags::SHRINK).expect("no size yet");
        let err = s.set_position(id, bad).expect_err("shrink + percent");
        assert!(matches!(err, ScreenError::Configuration { node, .. } if node == id));
    }

    #[test]
    fn set_flags_rejects_shrink_on_percent_axis() {
        let mut s = screen(10, 5);
        let id = child(&mut s, PositionSpec::new().width(Dim::percent(50.0)), "");
        assert!(s.set_flags(id, NodeFlags::SHRINK).is_err());
        assert!(s.set_flags(id, NodeFlags::NO_FILL).is_ok());
    }

    #[test]
    fn scroll_requires_scrollable() {
        let mut s = screen(10, 5);
        let id = child(&mut s, PositionSpec::new(), "a\nb\nc");
        let err = s.scroll_by(id, 1).expect_err("plain box");
        assert!(matches!(
            err,
            ScreenError::Structural { reason: StructuralReason::NotScrollable, .. }
        ));
    }

    #[test]
    fn scroll_base_is_clamped() {
        let mut s = screen(10, 5);
        let root = s.root();
        let id = s.tree_mut().create(NodeKind::scrollable());
        s.tree_mut().append(root, id).expect("attach");
        s.set_content(id, "a\nb\nc").expect("live");
        assert_eq!(s.scroll_to(id, 10).expect("scrollable"), 2);
        assert_eq!(s.scroll_by(id, -5).expect("scrollable"), 0);
    }

    #[test]
    fn render_handle_defers_during_pass() {
        let mut s = screen(4, 1);
        let handle = s.render_handle();
        handle.request();
        handle.request();
        assert!(handle.is_requested());

        s.set_prerender_hook(|_, h| {
            assert!(h.is_rendering());
            h.request();
        });
        s.render().expect("render");
        assert!(handle.is_requested(), "deferred request surfaces after the pass");
        assert!(!handle.is_rendering());
    }

    #[test]
    fn flush_is_bounded_when_hook_always_requests() {
        let mut s = screen(4, 1);
        let handle = s.render_handle();
        s.set_prerender_hook(|_, h| h.request());
        handle.request();

        let mut presenter = Presenter::new();
        let mut sink = weft_render::sink::RecordingSink::new();
        let passes = s.flush_renders(&mut presenter, &mut sink).expect("flush");
        assert_eq!(passes, MAX_FLUSH_PASSES);
        assert!(handle.is_requested(), "request left for the next flush");
    }

    #[test]
    fn detached_node_is_not_hit() {
        let mut s = screen(10, 4);
        let id = child(&mut s, PositionSpec::new().left(0).top(0).width(4).height(2), "x");
        s.render().expect("render");
        assert_eq!(s.hit_test(1, 1), Some(id));

        s.tree_mut().detach(id).expect("detach");
        assert!(s.resolved_box(id).is_none());
        assert_eq!(s.hit_test(1, 1), Some(s.root()));
    }

    #[test]
    fn resolve_node_walks_ancestors() {
        let mut s = screen(20, 10);
        let outer = child(&mut s, PositionSpec::new().left(2).top(1).width(10).height(5), "");
        let inner = s.tree_mut().create(NodeKind::Box);
        s.tree_mut().append(outer, inner).expect("attach");
        s.set_position(inner, PositionSpec::new().left(3).top(2).width(2).height(1))
            .expect("valid");
        let resolved = s.resolve_node(inner).expect("attached");
        assert_eq!(resolved.outer, IRect::new(5, 3, 2, 1));
        assert!(s.resolved_box(inner).is_none(), "not rendered yet");
    }

    #[test]
    fn resolve_node_rejects_orphans() {
        let mut s = screen(20, 10);
        let orphan = s.tree_mut().create(NodeKind::Box);
        let err = s.resolve_node(orphan).expect_err("detached");
        assert!(matches!(
            err,
            ScreenError::Structural { reason: StructuralReason::Detached, .. }
        ));
    }
}
