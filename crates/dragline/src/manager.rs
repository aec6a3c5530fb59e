//! The drag-and-drop coordinator.
//!
//! [`DragDropManager`] owns the viewport, the timers and every registered
//! drag source and drop target. The host feeds it pointer input, animation
//! frames, timer ticks and transition-end notifications; the manager routes
//! each one to the source it belongs to.
//!
//! # Example
//!
//! ```
//! use dragline::{
//!     DragDropManager, DragSource, DragSourceConfig, DropStrategy, DropTarget, DropTargetConfig,
//!     PointerInput, Point, Rect, Scene, Size, Viewport,
//! };
//!
//! let mut scene = Scene::new(Size::new(800.0, 600.0));
//! let body = scene.body();
//! let card = scene.add_element(body, "card", Rect::new(10.0, 10.0, 80.0, 40.0));
//! let list = scene.add_element(body, "list", Rect::new(200.0, 0.0, 200.0, 400.0));
//!
//! let mut manager = DragDropManager::new(scene);
//! let source = manager.add_source(DragSource::new(card, DragSourceConfig::default()));
//! let config = DropTargetConfig::default().with_strategy(DropStrategy::Append);
//! let target = manager.add_target(DropTarget::new(list, config)).unwrap();
//!
//! manager.pointer_down(&mut PointerInput::pointer(1, Point::new(20.0, 20.0)).with_target(card));
//! manager.pointer_move(&mut PointerInput::pointer(1, Point::new(250.0, 20.0)));
//! assert!(manager.target(target).unwrap().is_hovered());
//!
//! manager.pointer_up(&mut PointerInput::pointer(1, Point::new(250.0, 20.0)));
//! assert_eq!(manager.viewport().parent(card), Some(list));
//! assert_eq!(manager.location(source).unwrap(), manager.origin_location(source).unwrap());
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use dragline_core::logging::targets;
use dragline_core::{DirectDispatcher, TimerManager, UiDispatcher};
use slotmap::SlotMap;

use crate::animation::TransitionArgs;
use crate::broker::DropBroker;
use crate::drag::{DRAG_CLASS, DragContext, DragSource, SELECT_DISABLED_CLASS, SourceId, TransitionTarget};
use crate::drop::{DropTarget, TargetId};
use crate::error::{DragDropError, Result};
use crate::geometry::{DragLocation, Point};
use crate::hit_test;
use crate::input::PointerInput;
use crate::viewport::{ElementId, Viewport};

/// Coordinates drag sources and drop targets over one viewport.
#[derive(Debug)]
pub struct DragDropManager<V: Viewport> {
    viewport: V,
    timers: TimerManager,
    /// Runs every signal emission.
    dispatcher: Arc<dyn UiDispatcher>,
    sources: SlotMap<SourceId, DragSource>,
    broker: DropBroker,
}

impl<V: Viewport> DragDropManager<V> {
    /// Create a manager that emits signals on the calling thread.
    pub fn new(viewport: V) -> Self {
        Self::with_dispatcher(viewport, Arc::new(DirectDispatcher))
    }

    /// Create a manager that routes signal emission through `dispatcher`.
    pub fn with_dispatcher(viewport: V, dispatcher: Arc<dyn UiDispatcher>) -> Self {
        Self {
            viewport,
            timers: TimerManager::new(),
            dispatcher,
            sources: SlotMap::with_key(),
            broker: DropBroker::new(),
        }
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// Borrow the sources and, separately, everything a source acts on.
    fn split(&mut self) -> (&mut SlotMap<SourceId, DragSource>, DragContext<'_>) {
        (
            &mut self.sources,
            DragContext {
                viewport: &mut self.viewport,
                timers: &mut self.timers,
                broker: &mut self.broker,
                dispatcher: &*self.dispatcher,
            },
        )
    }

    /// Run `f` against one source, then any commands its slots queued.
    fn with_source<R>(
        &mut self,
        id: SourceId,
        f: impl FnOnce(&mut DragSource, &mut DragContext<'_>) -> R,
    ) -> Result<R> {
        let (sources, mut ctx) = self.split();
        let source = sources.get_mut(id).ok_or(DragDropError::UnknownSource(id))?;
        let result = f(source, &mut ctx);
        source.run_commands(&mut ctx);
        Ok(result)
    }

    /// [`with_source`](Self::with_source) for fire-and-forget input routing.
    fn route(&mut self, id: SourceId, f: impl FnOnce(&mut DragSource, &mut DragContext<'_>)) {
        if let Err(err) = self.with_source(id, f) {
            tracing::trace!(target: targets::DRAG, %err, "input routed to a removed source");
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a drag source and style its element for dragging.
    pub fn add_source(&mut self, source: DragSource) -> SourceId {
        let id = self.sources.insert(source);
        self.sources[id].attach(id, &mut self.viewport);
        tracing::debug!(target: targets::DRAG, ?id, element = ?self.sources[id].element(), "drag source registered");
        id
    }

    /// Unregister a drag source, tearing down any drag in progress.
    pub fn remove_source(&mut self, id: SourceId) -> Result<DragSource> {
        let mut source = self.sources.remove(id).ok_or(DragDropError::UnknownSource(id))?;
        let (_, mut ctx) = self.split();
        source.detach(&mut ctx);
        Ok(source)
    }

    pub fn source(&self, id: SourceId) -> Option<&DragSource> {
        self.sources.get(id)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Register a drop target and mark its element droppable.
    pub fn add_target(&mut self, target: DropTarget) -> Result<TargetId> {
        self.broker.register(target, &mut self.viewport)
    }

    pub fn remove_target(&mut self, id: TargetId) -> Result<DropTarget> {
        self.broker.unregister(id, &mut self.viewport)
    }

    pub fn target(&self, id: TargetId) -> Option<&DropTarget> {
        self.broker.get(id)
    }

    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut DropTarget> {
        self.broker.get_mut(id)
    }

    pub fn target_count(&self) -> usize {
        self.broker.len()
    }

    // =========================================================================
    // Input routing
    // =========================================================================

    /// Route a press to the source whose element or handle contains its
    /// target. Sets `current_target` to the grabbed element.
    pub fn pointer_down(&mut self, input: &mut PointerInput) -> Option<SourceId> {
        let hit = input.current_target.or(input.target)?;
        let (id, grabbed) = self.grabbing_source(hit)?;
        input.current_target = Some(grabbed);
        if input.target.is_none() {
            input.target = Some(hit);
        }

        self.with_source(id, |source, ctx| source.pointer_down(input, ctx))
            .ok()?;
        Some(id)
    }

    /// Route a move to the source listening on `current_target`, or to every
    /// pressed source when the host delivers it at window level.
    pub fn pointer_move(&mut self, input: &mut PointerInput) {
        for id in self.listeners(input.current_target) {
            self.route(id, |source, ctx| source.pointer_move(input, ctx));
        }
    }

    pub fn pointer_up(&mut self, input: &mut PointerInput) {
        for id in self.listeners(input.current_target) {
            self.route(id, |source, ctx| source.pointer_up(input, ctx));
        }
    }

    /// The pointer capture held by `input.current_target` was lost.
    pub fn pointer_lost(&mut self, input: &PointerInput) {
        let Some(element) = input.current_target else {
            return;
        };
        let ids: Vec<SourceId> = self
            .sources
            .iter()
            .filter(|(_, source)| source.receives_lost_capture(element))
            .map(|(id, _)| id)
            .collect();
        for id in ids {
            self.route(id, |source, ctx| source.pointer_lost(input, ctx));
        }
    }

    /// Release the per-frame move throttle. Call once per animation frame.
    pub fn frame(&mut self) {
        for source in self.sources.values_mut() {
            source.end_frame();
        }
    }

    /// Fire every timer due at `now`. Returns how many fired.
    pub fn process_timers(&mut self, now: Instant) -> usize {
        let fired = self.timers.process_expired(now);
        for &timer in &fired {
            let owner = self
                .sources
                .iter()
                .find(|(_, source)| source.owns_timer(timer))
                .map(|(id, _)| id);
            let Some(id) = owner else {
                tracing::trace!(target: targets::DRAG, ?timer, "timer has no owning source");
                continue;
            };
            self.route(id, |source, ctx| source.on_timer(timer, ctx));
        }
        fired.len()
    }

    /// Time until the next timer is due, for hosts that sleep between ticks.
    pub fn next_timer_in(&mut self, now: Instant) -> Option<Duration> {
        self.timers.time_until_next(now)
    }

    /// A CSS transition ended on `element`. Returns whether a source
    /// claimed it.
    pub fn transition_end(&mut self, element: ElementId) -> bool {
        let owner = self
            .sources
            .iter()
            .find(|(_, source)| source.element() == element || source.ghost_element() == Some(element))
            .map(|(id, _)| id);
        match owner {
            Some(id) => self
                .with_source(id, |source, ctx| source.transition_end(ctx))
                .is_ok(),
            None => false,
        }
    }

    fn grabbing_source(&self, hit: ElementId) -> Option<(SourceId, ElementId)> {
        let mut current = Some(hit);
        while let Some(element) = current {
            if let Some((id, _)) = self.sources.iter().find(|(_, source)| source.grabs_on(element)) {
                return Some((id, element));
            }
            current = self.viewport.parent(element);
        }
        None
    }

    fn listeners(&self, current_target: Option<ElementId>) -> Vec<SourceId> {
        self.sources
            .iter()
            .filter(|(_, source)| match current_target {
                Some(element) => source.listens_on(element),
                None => source.is_pressed(),
            })
            .map(|(id, _)| id)
            .collect()
    }

    // =========================================================================
    // Programmatic repositioning
    // =========================================================================

    /// Move a source's ghost (or element) so its top-left is at `location`.
    pub fn set_location(&mut self, id: SourceId, location: DragLocation) -> Result<()> {
        self.with_source(id, |source, ctx| source.set_location(location, ctx))
    }

    /// Animate a source to a location or onto another element.
    ///
    /// `start`, when given, is applied before the transition begins.
    pub fn transition_to(
        &mut self,
        id: SourceId,
        target: impl Into<TransitionTarget>,
        args: TransitionArgs,
        start: Option<DragLocation>,
    ) -> Result<()> {
        let target = target.into();
        self.with_source(id, |source, ctx| source.transition_to(target, args, start, ctx))
    }

    /// Animate a source back to where its element sits untranslated.
    pub fn transition_to_origin(
        &mut self,
        id: SourceId,
        args: TransitionArgs,
        start: Option<DragLocation>,
    ) -> Result<()> {
        self.with_source(id, |source, ctx| source.transition_to_origin(args, start, ctx))
    }

    pub fn location(&self, id: SourceId) -> Result<DragLocation> {
        let source = self.sources.get(id).ok_or(DragDropError::UnknownSource(id))?;
        Ok(source.location(&self.viewport))
    }

    pub fn origin_location(&self, id: SourceId) -> Result<DragLocation> {
        let source = self.sources.get(id).ok_or(DragDropError::UnknownSource(id))?;
        Ok(source.origin_location(&self.viewport))
    }

    /// Every element under a page point, shadow contents above their hosts.
    pub fn elements_at_point(&self, page: Point) -> Vec<ElementId> {
        hit_test::elements_at_point(&self.viewport, page)
    }
}
